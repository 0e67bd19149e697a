//! Boundary to the applications backend.
//!
//! [`ApplicationGateway`] is the seam the pipeline talks through;
//! [`ApplicationClient`] is its HTTP implementation.

pub mod client;
pub mod error;
pub mod types;

pub use client::ApplicationClient;
pub use error::GatewayError;
pub use types::{ErrorBody, StageSnapshot};

use crate::workflow::{ApplicationState, TransitionRequest, WorkflowStage};

/// Persists stage transitions and serves the data progression is computed
/// from.
///
/// Implementations must not retry `apply_transition`: a duplicate accept
/// would advance an application twice.
#[allow(async_fn_in_trait)]
pub trait ApplicationGateway {
    /// Applies `request` to the application and returns the backend's
    /// authoritative stage and history.
    async fn apply_transition(
        &self,
        application_id: &str,
        request: &TransitionRequest,
    ) -> Result<StageSnapshot, GatewayError>;

    /// The job's configured workflow, empty when none is configured.
    async fn fetch_workflow(&self, job_id: &str) -> Result<Vec<WorkflowStage>, GatewayError>;

    async fn fetch_application(&self, application_id: &str) -> Result<ApplicationState, GatewayError>;
}
