use serde::Deserialize;
use tracing::info;

use crate::catalog::PolicyCatalog;
use crate::error::{PolicyError, Result};

#[derive(Debug, Deserialize, Clone, Default)]
pub struct Config {
    #[serde(default)]
    pub catalog: CatalogConfig,
    #[serde(default)]
    pub database: DatabaseConfig,
}

#[derive(Debug, Deserialize, Clone, Default)]
pub struct CatalogConfig {
    /// TOML rule catalog. The builtin catalog is used when unset.
    pub path: Option<String>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DatabaseConfig {
    #[serde(default = "default_database_path")]
    pub path: String,
    /// Record every evaluation and refund plan made from the CLI.
    #[serde(default)]
    pub record: bool,
}

fn default_database_path() -> String {
    "returns.db".to_string()
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: default_database_path(),
            record: false,
        }
    }
}

impl Config {
    /// Layer the optional config file under `RETURNS_*` environment variables,
    /// e.g. `RETURNS_DATABASE__RECORD=true`.
    pub fn load(path: &str) -> anyhow::Result<Self> {
        dotenv::dotenv().ok();

        let config = config::Config::builder()
            .add_source(config::File::with_name(path).required(false))
            .add_source(config::Environment::with_prefix("RETURNS").separator("__"))
            .build()?;

        let config: Self = config.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.database.path.trim().is_empty() {
            return Err(PolicyError::Config("database.path must not be empty".to_string()));
        }
        if matches!(&self.catalog.path, Some(p) if p.trim().is_empty()) {
            return Err(PolicyError::Config("catalog.path must not be empty when set".to_string()));
        }
        Ok(())
    }

    pub fn load_catalog(&self) -> Result<PolicyCatalog> {
        match &self.catalog.path {
            Some(path) => PolicyCatalog::load(path),
            None => {
                info!("Using builtin policy catalog");
                PolicyCatalog::builtin()
            }
        }
    }
}
