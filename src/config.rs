//! Configuration loaded from `hirewise.toml`.
//!
//! Every field has a default, so a missing file is not an error.
//! `HIREWISE_API_URL` and `HIREWISE_API_TOKEN` take precedence over the file.

use std::path::Path;

use serde::Deserialize;

use crate::error::HirewiseError;
use crate::workflow::{CANONICAL_STAGES, StageName};

pub const CONFIG_FILE: &str = "hirewise.toml";

#[derive(Debug, Clone, Deserialize)]
pub struct HirewiseConfig {
    /// Base URL of the applications backend, e.g. `https://ats.example.com/api`.
    #[serde(default = "default_api_base_url")]
    pub api_base_url: String,

    /// Bearer credential forwarded with every request.
    #[serde(default)]
    pub api_token: String,

    #[serde(default = "default_connect_timeout_secs")]
    pub connect_timeout_secs: u64,

    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,

    /// Stage order used for jobs that configure no workflow.
    #[serde(default = "default_fallback_stages")]
    pub fallback_stages: Vec<StageName>,
}

fn default_api_base_url() -> String {
    "http://localhost:8080/api".to_string()
}

fn default_connect_timeout_secs() -> u64 {
    10
}

fn default_request_timeout_secs() -> u64 {
    30
}

fn default_fallback_stages() -> Vec<StageName> {
    CANONICAL_STAGES.iter().map(StageName::new).collect()
}

impl Default for HirewiseConfig {
    fn default() -> Self {
        Self {
            api_base_url: default_api_base_url(),
            api_token: String::new(),
            connect_timeout_secs: default_connect_timeout_secs(),
            request_timeout_secs: default_request_timeout_secs(),
            fallback_stages: default_fallback_stages(),
        }
    }
}

impl HirewiseConfig {
    /// Loads `path`, or defaults when it does not exist, then applies
    /// environment overrides.
    pub fn load_from(path: &Path) -> Result<Self, HirewiseError> {
        let mut config = if path.exists() {
            let contents = std::fs::read_to_string(path)?;
            toml::from_str::<HirewiseConfig>(&contents)?
        } else {
            Self::default()
        };

        if let Ok(url) = std::env::var("HIREWISE_API_URL")
            && !url.is_empty()
        {
            config.api_base_url = url;
        }
        if let Ok(token) = std::env::var("HIREWISE_API_TOKEN")
            && !token.is_empty()
        {
            config.api_token = token;
        }

        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), HirewiseError> {
        if self.api_base_url.trim().is_empty() {
            return Err(HirewiseError::Config("api_base_url must not be empty".into()));
        }
        if self.connect_timeout_secs == 0 {
            return Err(HirewiseError::Config("connect_timeout_secs must be positive".into()));
        }
        if self.request_timeout_secs == 0 {
            return Err(HirewiseError::Config("request_timeout_secs must be positive".into()));
        }
        Ok(())
    }
}
