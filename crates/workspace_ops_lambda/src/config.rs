//! Process-level configuration, read once before the Lambda runtime loop starts.

use thiserror::Error;

use crate::runtime::api_routes::api_base_url;

pub const HOSTNAME_VAR: &str = "SCALR_HOSTNAME";
pub const TOKEN_VAR: &str = "SCALR_TOKEN";
pub const TAGS_VAR: &str = "SCALR_TAGS";
pub const BUCKET_VAR: &str = "AWS_BUCKET";

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("{0} must be configured")]
    Missing(&'static str),
}

#[derive(Clone, PartialEq, Eq)]
pub struct ControlPlaneConfig {
    pub hostname: String,
    pub token: String,
}

impl ControlPlaneConfig {
    pub fn api_base_url(&self) -> String {
        api_base_url(&self.hostname)
    }

    fn from_lookup(lookup: &impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        Ok(Self {
            hostname: required(lookup, HOSTNAME_VAR)?,
            token: required(lookup, TOKEN_VAR)?,
        })
    }
}

// Keeps the token out of logs.
impl std::fmt::Debug for ControlPlaneConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ControlPlaneConfig")
            .field("hostname", &self.hostname)
            .field("token", &"<redacted>")
            .finish()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DispatcherConfig {
    pub control_plane: ControlPlaneConfig,
    /// Tag name, or comma-separated list of names, passed to the `in:` filter.
    pub tags: String,
}

impl DispatcherConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        Ok(Self {
            control_plane: ControlPlaneConfig::from_lookup(&lookup)?,
            tags: required(&lookup, TAGS_VAR)?,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArchiverConfig {
    pub control_plane: ControlPlaneConfig,
    pub bucket: String,
}

impl ArchiverConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        Ok(Self {
            control_plane: ControlPlaneConfig::from_lookup(&lookup)?,
            bucket: required(&lookup, BUCKET_VAR)?,
        })
    }
}

fn required(
    lookup: &impl Fn(&str) -> Option<String>,
    name: &'static str,
) -> Result<String, ConfigError> {
    lookup(name)
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
        .ok_or(ConfigError::Missing(name))
}
