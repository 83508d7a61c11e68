use actix_web::{http::StatusCode, HttpResponse, ResponseError};
use handlebars::html_escape;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("Resource Not Found: {0}")]
    NotFound(String),

    #[error("Configuration Error: {0}")]
    Config(String),

    #[error("Database Error: {0}")]
    Database(#[from] mongodb::error::Error),

    #[error("Template Error: {0}")]
    Template(String),
}

impl AppError {
    pub fn product_not_found(id: &str) -> Self {
        AppError::NotFound(format!("Product with ID {} not found.", id))
    }
}

impl ResponseError for AppError {
    fn status_code(&self) -> StatusCode {
        match self {
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let (title, detail) = match self {
            AppError::NotFound(m) => {
                tracing::debug!(application_error = %self, "Responding with not found");
                ("Not Found", html_escape(m))
            }
            _ => {
                tracing::error!(application_error = %self, "Responding with error");
                ("Server Error", "An internal error occurred.".to_string())
            }
        };

        HttpResponse::build(self.status_code())
            .content_type("text/html; charset=utf-8")
            .body(format!(
                "<!DOCTYPE html>\n<html><head><title>{title}</title></head>\
                 <body><h1>{title}</h1><p>{detail}</p><a href=\"/\">Back to catalog</a></body></html>\n"
            ))
    }
}

pub type Result<T, E = AppError> = std::result::Result<T, E>;
