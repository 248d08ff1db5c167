use crate::errors::{ConnectorError, Result};
use serde::Deserialize;
use std::path::Path;

/// Tracing target for configuration resolution.
pub const TRACING_TARGET: &str = "pdl_connector::config";

/// Environment variable consulted when the connection config has no key.
pub const API_KEY_ENV: &str = "PDL_API_KEY";

/// Value type of a connection-config attribute.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttributeType {
    String,
}

/// One recognized attribute of the connection config.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Attribute {
    pub name: &'static str,
    pub ty: AttributeType,
    pub required: bool,
}

/// Where a resolved API key came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeySource {
    Config,
    Environment,
    None,
}

/// Per-connection configuration supplied by the host.
///
/// Built once when the connection is opened and never mutated afterwards.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ConnectionConfig {
    /// People Data Labs API key.
    #[serde(default)]
    pub api_key: Option<String>,
}

impl ConnectionConfig {
    /// Attributes the host may set on a connection.
    pub fn schema() -> &'static [Attribute] {
        &[Attribute {
            name: "api_key",
            ty: AttributeType::String,
            required: false,
        }]
    }

    /// Parses a host-supplied JSON config document.
    pub fn from_json(raw: &str) -> Result<Self> {
        serde_json::from_str(raw).map_err(|e| ConnectorError::InvalidConfig(e.to_string()))
    }

    /// Reads and parses a config file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|e| {
            ConnectorError::InvalidConfig(format!("cannot read {}: {}", path.display(), e))
        })?;

        let config = Self::from_json(&raw)?;
        tracing::info!(
            target: TRACING_TARGET,
            path = %path.display(),
            "Connection config loaded"
        );
        Ok(config)
    }

    /// Resolves the API key from this config, falling back to `PDL_API_KEY`.
    ///
    /// Returns an empty string when neither source has a value; the HTTP
    /// adapter is the one that rejects an empty key.
    pub fn api_key(&self) -> String {
        self.api_key_with(|name| std::env::var(name).ok())
    }

    /// Same as [`ConnectionConfig::api_key`] with an injected environment lookup.
    pub fn api_key_with<F>(&self, env: F) -> String
    where
        F: FnOnce(&str) -> Option<String>,
    {
        let (key, source) = self.resolve(env);
        tracing::debug!(target: TRACING_TARGET, source = ?source, "API key resolved");
        key
    }

    fn resolve<F>(&self, env: F) -> (String, KeySource)
    where
        F: FnOnce(&str) -> Option<String>,
    {
        if let Some(key) = self.api_key.as_deref().filter(|k| !k.is_empty()) {
            return (key.to_string(), KeySource::Config);
        }

        match env(API_KEY_ENV).filter(|k| !k.is_empty()) {
            Some(key) => (key, KeySource::Environment),
            None => (String::new(), KeySource::None),
        }
    }

    /// Reports which source [`ConnectionConfig::api_key_with`] would use.
    pub fn key_source_with<F>(&self, env: F) -> KeySource
    where
        F: FnOnce(&str) -> Option<String>,
    {
        self.resolve(env).1
    }
}
