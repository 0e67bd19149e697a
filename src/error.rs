use thiserror::Error;

use crate::gateway::GatewayError;

#[derive(Debug, Error)]
pub enum HirewiseError {
    #[error("Config error: {0}")]
    Config(String),

    #[error("{0}")]
    Gateway(#[from] GatewayError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
}

/// Failures of the progression computation itself.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProgressionError {
    /// The job has neither a hiring workflow nor a usable fallback list.
    #[error("no stages configured for this job; configure a hiring workflow before moving applicants")]
    NoStagesConfigured,
}
