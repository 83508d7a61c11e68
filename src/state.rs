use std::sync::Arc;

use crate::repository::ProductRepository;
use crate::templates::TemplateEngine;

#[derive(Clone)]
pub struct AppState {
    pub products: Arc<dyn ProductRepository>,
    pub templates: Arc<TemplateEngine>,
}

impl AppState {
    pub fn new(products: Arc<dyn ProductRepository>, templates: TemplateEngine) -> Self {
        AppState {
            products,
            templates: Arc::new(templates),
        }
    }
}
