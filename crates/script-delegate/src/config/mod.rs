//! Configuration loading and validation.

mod types;
mod validation;

pub use types::*;

use crate::error::{DelegateError, Result};
use std::path::Path;

impl Config {
    /// Load configuration from a YAML file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_yaml(&content)
    }

    /// Parse configuration from a YAML string.
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        let config: Config = serde_yaml::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<()> {
        validation::validate(self)
    }
}

impl TargetConfig {
    /// Database kind of this target.
    pub fn kind(&self) -> Result<DatabaseKind> {
        DatabaseKind::from_db_type(&self.r#type).ok_or_else(|| {
            DelegateError::Config(format!(
                "Unknown database type: '{}'. Supported types: postgres, mssql, mysql, cassandra",
                self.r#type
            ))
        })
    }

    /// Configured port, or the standard port of the database kind.
    pub fn effective_port(&self) -> Result<u16> {
        match self.port {
            Some(port) => Ok(port),
            None => Ok(self.kind()?.default_port()),
        }
    }

    /// `host:port` address of the target.
    pub fn address(&self) -> Result<String> {
        Ok(format!("{}:{}", self.host, self.effective_port()?))
    }
}

/// Load a pre-split script: a YAML sequence of statement strings.
pub fn load_script<P: AsRef<Path>>(path: P) -> Result<Vec<String>> {
    let content = std::fs::read_to_string(path)?;
    parse_script(&content)
}

/// Parse a pre-split script from YAML. An empty document is an empty script.
pub fn parse_script(yaml: &str) -> Result<Vec<String>> {
    if yaml.trim().is_empty() {
        return Ok(Vec::new());
    }
    Ok(serde_yaml::from_str(yaml)?)
}
