//! Tabula configuration
//!
//! Engine defaults applied to tables built from schema files. Read from
//! `<config dir>/tabula/config.toml` when present.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::column::DEFAULT_MYSQL_VERSION;
use crate::error::{TabulaError, TabulaResult};
use crate::table::{DEFAULT_ENGINE, DefaultColumns, Table};

/// Main configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct TabulaConfig {
    /// Server version; decides charset and collation
    pub mysql_version: f32,

    /// Storage engine for new tables
    pub engine: String,

    /// Database name used to qualify tables
    pub schema: Option<String>,

    pub id_key: String,
    pub created_on_key: String,
    pub last_updated_key: String,
}

impl Default for TabulaConfig {
    fn default() -> Self {
        let keys = DefaultColumns::default();
        Self {
            mysql_version: DEFAULT_MYSQL_VERSION,
            engine: DEFAULT_ENGINE.to_string(),
            schema: None,
            id_key: keys.id_key,
            created_on_key: keys.created_on_key,
            last_updated_key: keys.last_updated_key,
        }
    }
}

impl TabulaConfig {
    pub fn builder() -> TabulaConfigBuilder {
        TabulaConfigBuilder::default()
    }

    /// `<config dir>/tabula/config.toml`
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("tabula").join("config.toml"))
    }

    pub fn from_toml(content: &str) -> TabulaResult<Self> {
        toml::from_str(content).map_err(|e| TabulaError::Config(e.to_string()))
    }

    pub fn load(path: &Path) -> TabulaResult<Self> {
        let content = std::fs::read_to_string(path)?;
        let config = Self::from_toml(&content)?;
        debug!("loaded config from {}", path.display());
        Ok(config)
    }

    /// Load from [`TabulaConfig::default_path`], or defaults if no file.
    pub fn load_default() -> TabulaResult<Self> {
        match Self::default_path() {
            Some(path) if path.exists() => Self::load(&path),
            _ => Ok(Self::default()),
        }
    }

    /// Default columns with the configured keys.
    pub fn default_columns(&self) -> DefaultColumns {
        DefaultColumns {
            id_key: self.id_key.clone(),
            created_on_key: self.created_on_key.clone(),
            last_updated_key: self.last_updated_key.clone(),
            ..DefaultColumns::default()
        }
    }

    /// Apply version and engine; the schema only when the table has none.
    pub fn apply(&self, table: &mut Table) -> TabulaResult<()> {
        table.set_mysql_version(self.mysql_version);
        table.set_engine(&self.engine)?;
        if table.schema().is_none() {
            table.set_schema(self.schema.as_deref())?;
        }
        Ok(())
    }
}

/// Builder for TabulaConfig
#[derive(Debug, Default)]
pub struct TabulaConfigBuilder {
    config: TabulaConfig,
}

impl TabulaConfigBuilder {
    pub fn mysql_version(mut self, version: f32) -> Self {
        self.config.mysql_version = version;
        self
    }

    pub fn engine(mut self, engine: impl Into<String>) -> Self {
        self.config.engine = engine.into();
        self
    }

    pub fn schema(mut self, schema: impl Into<String>) -> Self {
        self.config.schema = Some(schema.into());
        self
    }

    pub fn id_key(mut self, key: impl Into<String>) -> Self {
        self.config.id_key = key.into();
        self
    }

    pub fn build(self) -> TabulaConfig {
        self.config
    }
}
