use std::path::Path;

use anyhow::{Context, Result};
use serde::Deserialize;
use url::Url;

use crate::core::claims::REGION_KEY;

/// Connector settings for credential verification and policy evaluation.
#[derive(Deserialize, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub struct Config {
    pub participant_id: String,
    pub identity_hub_url: HubUrl,
    #[serde(default)]
    pub policy: PolicyConfig,
}

#[derive(Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct PolicyConfig {
    /// Left operand the region function is bound to, also the credential subject field it reads.
    #[serde(default = "default_region_key")]
    pub region_key: String,
}

impl Default for PolicyConfig {
    fn default() -> Self {
        Self {
            region_key: default_region_key(),
        }
    }
}

fn default_region_key() -> String {
    REGION_KEY.to_owned()
}

impl Config {
    pub fn from_json_str(json: &str) -> Result<Self> {
        serde_json::from_str(json).context("invalid configuration")
    }

    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path)
            .with_context(|| format!("unable to read configuration file {}", path.display()))?;
        Self::from_json_str(&json)
    }
}

/// An absolute http(s) url pointing at an identity hub.
#[derive(Deserialize, Debug, Clone, Hash, PartialEq, Eq)]
#[serde(try_from = "String")]
pub struct HubUrl(Url);

impl std::ops::Deref for HubUrl {
    type Target = Url;

    fn deref(&self) -> &Url {
        &self.0
    }
}

#[derive(Debug, thiserror::Error)]
pub enum HubUrlError {
    #[error(transparent)]
    Parse(#[from] url::ParseError),

    #[error("unsupported identity hub url scheme `{0}`")]
    UnsupportedScheme(String),
}

impl TryFrom<String> for HubUrl {
    type Error = HubUrlError;

    fn try_from(url: String) -> Result<Self, Self::Error> {
        let url: Url = url.parse()?;
        match url.scheme() {
            "http" | "https" => Ok(Self(url)),
            other => Err(HubUrlError::UnsupportedScheme(other.to_owned())),
        }
    }
}
