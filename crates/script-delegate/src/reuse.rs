//! Container reuse configuration.
//!
//! A validated value object consumed by whatever manages database containers.
//! It is only produced by [`ReuseConfigBuilder::build`], so a constructed
//! value always carries a non-blank container name.

use serde::{Deserialize, Serialize};

use crate::error::{DelegateError, Result};

/// What to do when a reusable container was started from a different image.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConflictBehaviour {
    /// Refuse to reuse the container.
    #[default]
    Fail,
    /// Remove the existing container and start a new one.
    Recreate,
    /// Reuse the existing container regardless of its image.
    KeepExisting,
}

/// Reuse settings for a named container.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawReuseConfig")]
pub struct ReuseConfig {
    container_name: String,
    conflict_behaviour: ConflictBehaviour,
    enabled: bool,
}

impl ReuseConfig {
    pub fn builder() -> ReuseConfigBuilder {
        ReuseConfigBuilder::default()
    }

    pub fn container_name(&self) -> &str {
        &self.container_name
    }

    pub fn conflict_behaviour(&self) -> ConflictBehaviour {
        self.conflict_behaviour
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }
}

/// Builder for [`ReuseConfig`]. Reuse is enabled and conflicts fail by default.
#[derive(Debug, Clone)]
pub struct ReuseConfigBuilder {
    container_name: Option<String>,
    conflict_behaviour: ConflictBehaviour,
    enabled: bool,
}

impl Default for ReuseConfigBuilder {
    fn default() -> Self {
        Self {
            container_name: None,
            conflict_behaviour: ConflictBehaviour::Fail,
            enabled: true,
        }
    }
}

impl ReuseConfigBuilder {
    pub fn container_name(mut self, name: impl Into<String>) -> Self {
        self.container_name = Some(name.into());
        self
    }

    pub fn conflict_behaviour(mut self, behaviour: ConflictBehaviour) -> Self {
        self.conflict_behaviour = behaviour;
        self
    }

    pub fn enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }

    /// Validate and build. Fails when the container name is missing or blank.
    pub fn build(self) -> Result<ReuseConfig> {
        let container_name = match self.container_name {
            Some(name) if !name.trim().is_empty() => name,
            _ => {
                return Err(DelegateError::Config(
                    "Container name must be specified with reuse mode".into(),
                ))
            }
        };
        Ok(ReuseConfig {
            container_name,
            conflict_behaviour: self.conflict_behaviour,
            enabled: self.enabled,
        })
    }
}

/// Unvalidated YAML form of [`ReuseConfig`].
#[derive(Deserialize)]
struct RawReuseConfig {
    #[serde(default)]
    container_name: Option<String>,
    #[serde(default)]
    conflict_behaviour: ConflictBehaviour,
    #[serde(default = "default_enabled")]
    enabled: bool,
}

fn default_enabled() -> bool {
    true
}

impl TryFrom<RawReuseConfig> for ReuseConfig {
    type Error = DelegateError;

    fn try_from(raw: RawReuseConfig) -> Result<Self> {
        let mut builder = ReuseConfig::builder()
            .conflict_behaviour(raw.conflict_behaviour)
            .enabled(raw.enabled);
        if let Some(name) = raw.container_name {
            builder = builder.container_name(name);
        }
        builder.build()
    }
}
