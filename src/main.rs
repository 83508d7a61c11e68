mod catalog;
mod config;
mod error;
mod forms;
mod handlers;
mod models;
mod repository;
mod routes;
mod state;
mod templates;

use std::sync::Arc;

use actix_web::{web, App, HttpServer};
use config::{AppConfig, StoreKind};
use mongodb::Client;
use repository::{InMemoryProductRepository, MongoProductRepository, ProductRepository};
use state::AppState;
use templates::TemplateEngine;
use tracing::{error, info};
use tracing_actix_web::TracingLogger;
use tracing_subscriber::EnvFilter;

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,actix_web=info,market_catalog=debug"));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}

async fn connect_store(config: &AppConfig) -> error::Result<Arc<dyn ProductRepository>> {
    match config.store {
        StoreKind::MongoDb => {
            let client = Client::with_uri_str(&config.mongo_uri).await?;
            let database = client.database(&config.database_name);
            info!("MongoDB connection established");
            Ok(Arc::new(MongoProductRepository::new(&database)))
        }
        StoreKind::Memory => {
            info!("Using in-memory product store");
            Ok(Arc::new(InMemoryProductRepository::new()))
        }
    }
}

async fn build_state(config: &AppConfig) -> error::Result<AppState> {
    let products = connect_store(config).await?;
    let templates = TemplateEngine::new()?;
    Ok(AppState::new(products, templates))
}

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    init_tracing();

    info!("Starting market catalog server");

    let config = AppConfig::from_env().map_err(|e| {
        error!(error = %e, "Failed to load application configuration.");
        std::io::Error::new(std::io::ErrorKind::InvalidInput, e.to_string())
    })?;

    let app_state = build_state(&config).await.map_err(|e| {
        error!(error = %e, "Failed to initialise application state.");
        std::io::Error::new(std::io::ErrorKind::Other, e.to_string())
    })?;
    let state_data = web::Data::new(app_state);

    let address = config.bind_address();
    info!("Binding server to {}", address);

    HttpServer::new(move || {
        App::new()
            .wrap(TracingLogger::default())
            .app_data(state_data.clone())
            .configure(routes::configure_routes)
    })
    .bind(&address)?
    .run()
    .await
}
