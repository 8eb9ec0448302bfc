//! # Console Config
//!
//! Optional TOML file; every key has a default. `TDC_BASE_URL` and
//! `TDC_API_KEY` override the file.
//!
//! ```toml
//! [service]
//! base_url = "http://127.0.0.1:3001/api"
//! api_key = "..."
//!
//! [schema]
//! path = "schemas.json"
//!
//! [reports]
//! out_dir = "reports"
//! ```

use serde::Deserialize;
use std::path::{Path, PathBuf};

use tdc_core::SchemaRegistry;

use crate::ClientError;

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ClientConfig {
    #[serde(default)]
    pub service: ServiceConfig,
    #[serde(default)]
    pub schema: SchemaConfig,
    #[serde(default)]
    pub reports: ReportsConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServiceConfig {
    #[serde(default = "default_base_url")]
    pub base_url: String,
    /// Sent as a bearer token when set.
    #[serde(default)]
    pub api_key: Option<String>,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            api_key: None,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct SchemaConfig {
    /// JSON schema table replacing the built-in one.
    #[serde(default)]
    pub path: Option<PathBuf>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ReportsConfig {
    #[serde(default = "default_out_dir")]
    pub out_dir: PathBuf,
}

impl Default for ReportsConfig {
    fn default() -> Self {
        Self {
            out_dir: default_out_dir(),
        }
    }
}

fn default_base_url() -> String {
    "http://127.0.0.1:3001/api".to_string()
}

fn default_out_dir() -> PathBuf {
    PathBuf::from(".")
}

impl ClientConfig {
    pub fn from_toml_str(raw: &str) -> Result<Self, ClientError> {
        toml::from_str(raw).map_err(|e| ClientError::Config(e.to_string()))
    }

    /// Read `path` if it exists; a missing file means all defaults.
    pub fn load(path: &Path) -> Result<Self, ClientError> {
        if !path.exists() {
            tracing::debug!("no config at {}, using defaults", path.display());
            return Ok(Self::default());
        }
        let raw = std::fs::read_to_string(path).map_err(|source| ClientError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&raw)
    }

    /// Apply environment overrides through `lookup` (normally
    /// `std::env::var`).
    pub fn apply_env<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(url) = lookup("TDC_BASE_URL").filter(|v| !v.is_empty()) {
            self.service.base_url = url;
        }
        if let Some(key) = lookup("TDC_API_KEY").filter(|v| !v.is_empty()) {
            self.service.api_key = Some(key);
        }
    }

    /// The registry every component shares for the rest of the run.
    pub fn schema_registry(&self) -> Result<SchemaRegistry, ClientError> {
        match &self.schema.path {
            Some(path) => {
                let raw = std::fs::read_to_string(path).map_err(|source| ClientError::Io {
                    path: path.clone(),
                    source,
                })?;
                let registry = SchemaRegistry::from_json(&raw)?;
                tracing::info!(
                    "loaded {} collection schemas from {}",
                    registry.len(),
                    path.display()
                );
                Ok(registry)
            }
            None => Ok(SchemaRegistry::builtin()),
        }
    }
}
