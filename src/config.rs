use dotenv::dotenv;
use std::env;

use crate::error::{AppError, Result};

/// Which backend holds the product collection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreKind {
    MongoDb,
    Memory,
}

impl StoreKind {
    fn parse(value: &str) -> Result<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "mongodb" | "mongo" => Ok(StoreKind::MongoDb),
            "memory" => Ok(StoreKind::Memory),
            other => Err(AppError::Config(format!(
                "Invalid CATALOG_STORE '{}', expected 'mongodb' or 'memory'",
                other
            ))),
        }
    }
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub server_host: String,
    pub server_port: u16,
    pub store: StoreKind,
    pub mongo_uri: String,
    pub database_name: String,
}

impl AppConfig {
    pub fn from_env() -> Result<Self> {
        dotenv().ok();
        Self::from_lookup(|name| env::var(name).ok())
    }

    fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let server_host = lookup("SERVER_HOST").unwrap_or_else(|| "127.0.0.1".to_string());
        let server_port = lookup("SERVER_PORT")
            .unwrap_or_else(|| "8080".to_string())
            .parse::<u16>()
            .map_err(|e| AppError::Config(format!("Invalid SERVER_PORT: {}", e)))?;
        let store = StoreKind::parse(&lookup("CATALOG_STORE").unwrap_or_else(|| "mongodb".to_string()))?;
        let mongo_uri = lookup("MONGODB_URI").unwrap_or_else(|| "mongodb://localhost:27017".to_string());
        let database_name = lookup("DATABASE_NAME").unwrap_or_else(|| "products_db".to_string());

        Ok(AppConfig {
            server_host,
            server_port,
            store,
            mongo_uri,
            database_name,
        })
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.server_host, self.server_port)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config_from(pairs: &[(&str, &str)]) -> Result<AppConfig> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        AppConfig::from_lookup(|name| vars.get(name).cloned())
    }

    #[test]
    fn defaults_apply_when_nothing_is_set() {
        let config = config_from(&[]).unwrap();
        assert_eq!(config.bind_address(), "127.0.0.1:8080");
        assert_eq!(config.store, StoreKind::MongoDb);
        assert_eq!(config.mongo_uri, "mongodb://localhost:27017");
        assert_eq!(config.database_name, "products_db");
    }

    #[test]
    fn memory_store_is_selectable() {
        let config = config_from(&[("CATALOG_STORE", "Memory"), ("SERVER_PORT", "9000")]).unwrap();
        assert_eq!(config.store, StoreKind::Memory);
        assert_eq!(config.server_port, 9000);
    }

    #[test]
    fn invalid_values_are_config_errors() {
        assert!(matches!(config_from(&[("SERVER_PORT", "http")]), Err(AppError::Config(_))));
        assert!(matches!(config_from(&[("CATALOG_STORE", "redis")]), Err(AppError::Config(_))));
    }
}
