//! Applicant pipeline controller.
//!
//! This is where operator actions (advance, reject) meet the progression
//! engine and the backend. It keeps one authoritative [`ApplicationState`]
//! per application, replaced wholesale from backend responses, and allows
//! at most one transition in flight per application.

use std::collections::{HashMap, HashSet};
use std::sync::Mutex;

use thiserror::Error;
use tracing::{info, warn};

use crate::error::ProgressionError;
use crate::gateway::{ApplicationGateway, GatewayError};
use crate::notice::Notice;
use crate::workflow::{
    Action, ApplicationState, Progression, StageName, StageProgressionEngine, TransitionRequest,
    WorkflowStage, WorkflowStages,
};

/// Why an operator action did not go through.
#[derive(Debug, Error)]
pub enum ActionError {
    #[error("application {0} is not loaded")]
    UnknownApplication(String),

    #[error(transparent)]
    Configuration(#[from] ProgressionError),

    #[error("application is closed as {stage}; no further stage changes are possible")]
    Closed { stage: StageName },

    #[error("a stage change for application {0} is already in progress")]
    InFlight(String),

    /// A previous stage change may have been applied but its result was
    /// never read back.
    #[error("the last stage change for application {0} may already have been applied; reload the application before acting again")]
    NeedsRefresh(String),

    #[error(transparent)]
    Gateway(#[from] GatewayError),
}

impl ActionError {
    /// Converts the failure into a notification for the operator.
    ///
    /// Backend refusals are shown with the server's message unchanged.
    pub fn notice(&self) -> Notice {
        match self {
            ActionError::Configuration(_) => Notice::error(self.to_string()),
            ActionError::Closed { .. } | ActionError::InFlight(_) => Notice::info(self.to_string()),
            ActionError::UnknownApplication(_) | ActionError::NeedsRefresh(_) => {
                Notice::warning(self.to_string())
            }
            ActionError::Gateway(e @ GatewayError::Network(_)) => {
                Notice::error(format!("Could not reach the server: {e}")).retryable()
            }
            ActionError::Gateway(e) if e.is_transient() => Notice::error(e.to_string()).retryable(),
            ActionError::Gateway(e @ GatewayError::OutcomeUnknown { .. }) => Notice::warning(e.to_string()),
            ActionError::Gateway(e) => Notice::error(e.to_string()),
        }
    }
}

/// Result of a transition the backend accepted.
#[derive(Debug, Clone)]
pub struct TransitionOutcome {
    pub request: TransitionRequest,
    /// Progression recomputed from the backend's response.
    pub progression: Progression,
    /// Confirmation text sent by the backend, if any.
    pub message: Option<String>,
}

impl TransitionOutcome {
    pub fn notice(&self) -> Notice {
        if let Some(message) = self.message.as_deref().filter(|m| !m.trim().is_empty()) {
            return Notice::success(message);
        }
        let text = match self.progression.closed_as() {
            Some(stage) if stage.is_hired() => "Candidate hired".to_string(),
            Some(stage) => format!("Application closed as {stage}"),
            None => format!("Application moved to {}", self.progression.current_stage),
        };
        Notice::success(text)
    }
}

struct Tracked {
    stages: WorkflowStages,
    state: ApplicationState,
    /// Set when a transition's outcome is unknown and could not be re-read.
    stale: bool,
}

/// Marks an application busy until dropped.
struct InFlightGuard<'a> {
    in_flight: &'a Mutex<HashSet<String>>,
    application_id: String,
}

impl Drop for InFlightGuard<'_> {
    fn drop(&mut self) {
        let mut set = self.in_flight.lock().unwrap_or_else(|e| e.into_inner());
        set.remove(&self.application_id);
    }
}

pub struct PipelineController<G> {
    gateway: G,
    fallback_stages: Vec<StageName>,
    applications: Mutex<HashMap<String, Tracked>>,
    in_flight: Mutex<HashSet<String>>,
}

impl<G: ApplicationGateway> PipelineController<G> {
    /// `fallback_stages` is used for jobs without a configured workflow.
    pub fn new(gateway: G, fallback_stages: Vec<StageName>) -> Self {
        Self {
            gateway,
            fallback_stages,
            applications: Mutex::new(HashMap::new()),
            in_flight: Mutex::new(HashSet::new()),
        }
    }

    pub fn gateway(&self) -> &G {
        &self.gateway
    }

    /// Starts tracking an application with its job's workflow, replacing
    /// anything tracked under the same id.
    pub fn track(&self, application_id: &str, workflow: &[WorkflowStage], state: ApplicationState) {
        let stages = WorkflowStages::from_workflow(workflow, &self.fallback_stages);
        let mut apps = self.applications.lock().unwrap_or_else(|e| e.into_inner());
        apps.insert(
            application_id.to_string(),
            Tracked {
                stages,
                state,
                stale: false,
            },
        );
    }

    /// Loads the job workflow and application from the backend and starts
    /// tracking it.
    pub async fn load(&self, job_id: &str, application_id: &str) -> Result<Progression, ActionError> {
        let workflow = self.gateway.fetch_workflow(job_id).await?;
        let state = self.gateway.fetch_application(application_id).await?;
        self.track(application_id, &workflow, state);
        self.progression(application_id)
    }

    pub fn state(&self, application_id: &str) -> Option<ApplicationState> {
        let apps = self.applications.lock().unwrap_or_else(|e| e.into_inner());
        apps.get(application_id).map(|t| t.state.clone())
    }

    pub fn stages(&self, application_id: &str) -> Option<WorkflowStages> {
        let apps = self.applications.lock().unwrap_or_else(|e| e.into_inner());
        apps.get(application_id).map(|t| t.stages.clone())
    }

    pub fn progression(&self, application_id: &str) -> Result<Progression, ActionError> {
        let (stages, state) = self.snapshot(application_id)?;
        Ok(StageProgressionEngine::evaluate(&stages, &state)?)
    }

    pub fn is_in_flight(&self, application_id: &str) -> bool {
        let set = self.in_flight.lock().unwrap_or_else(|e| e.into_inner());
        set.contains(application_id)
    }

    /// Clears the current stage, or hires the candidate at the final stage.
    pub async fn advance(&self, application_id: &str) -> Result<TransitionOutcome, ActionError> {
        self.transition(application_id, Action::Accept).await
    }

    pub async fn reject(&self, application_id: &str) -> Result<TransitionOutcome, ActionError> {
        self.transition(application_id, Action::Reject).await
    }

    async fn transition(&self, application_id: &str, action: Action) -> Result<TransitionOutcome, ActionError> {
        let _guard = self.begin(application_id)?;

        let (stages, state) = self.snapshot(application_id)?;
        if self.is_stale(application_id) {
            return Err(ActionError::NeedsRefresh(application_id.to_string()));
        }
        let progression = StageProgressionEngine::evaluate(&stages, &state)?;
        let request = match action {
            Action::Accept => progression.build_accept_request(),
            Action::Reject => progression.build_reject_request(),
        };
        let Some(request) = request else {
            let stage = progression
                .closed_as()
                .cloned()
                .unwrap_or_else(|| progression.current_stage.clone());
            return Err(ActionError::Closed { stage });
        };

        match self.gateway.apply_transition(application_id, &request).await {
            Ok(snapshot) => {
                let message = snapshot.message.clone();
                let state = snapshot.into_state();
                self.replace_state(application_id, state.clone());
                let progression = StageProgressionEngine::evaluate(&stages, &state)?;
                info!(
                    application_id,
                    action = %request.action,
                    stage = %request.stage_name,
                    now = %progression.current_stage,
                    "stage transition applied"
                );
                Ok(TransitionOutcome {
                    request,
                    progression,
                    message,
                })
            }
            Err(err @ GatewayError::InvalidTransition { .. }) => {
                warn!(application_id, error = %err, "stage transition refused, refreshing application");
                match self.gateway.fetch_application(application_id).await {
                    Ok(state) => self.replace_state(application_id, state),
                    Err(refresh) => warn!(application_id, error = %refresh, "refresh after refusal failed"),
                }
                Err(err.into())
            }
            Err(err @ GatewayError::OutcomeUnknown { .. }) => {
                warn!(application_id, error = %err, "stage transition outcome unknown, refreshing application");
                match self.gateway.fetch_application(application_id).await {
                    Ok(state) => self.replace_state(application_id, state),
                    Err(refresh) => {
                        warn!(application_id, error = %refresh, "refresh after unknown outcome failed");
                        self.mark_stale(application_id);
                    }
                }
                Err(err.into())
            }
            Err(err) => {
                warn!(application_id, error = %err, "stage transition failed");
                Err(err.into())
            }
        }
    }

    fn begin(&self, application_id: &str) -> Result<InFlightGuard<'_>, ActionError> {
        let mut set = self.in_flight.lock().unwrap_or_else(|e| e.into_inner());
        if !set.insert(application_id.to_string()) {
            return Err(ActionError::InFlight(application_id.to_string()));
        }
        Ok(InFlightGuard {
            in_flight: &self.in_flight,
            application_id: application_id.to_string(),
        })
    }

    fn snapshot(&self, application_id: &str) -> Result<(WorkflowStages, ApplicationState), ActionError> {
        let apps = self.applications.lock().unwrap_or_else(|e| e.into_inner());
        apps.get(application_id)
            .map(|t| (t.stages.clone(), t.state.clone()))
            .ok_or_else(|| ActionError::UnknownApplication(application_id.to_string()))
    }

    fn is_stale(&self, application_id: &str) -> bool {
        let apps = self.applications.lock().unwrap_or_else(|e| e.into_inner());
        apps.get(application_id).is_some_and(|t| t.stale)
    }

    fn mark_stale(&self, application_id: &str) {
        let mut apps = self.applications.lock().unwrap_or_else(|e| e.into_inner());
        if let Some(tracked) = apps.get_mut(application_id) {
            tracked.stale = true;
        }
    }

    fn replace_state(&self, application_id: &str, state: ApplicationState) {
        let mut apps = self.applications.lock().unwrap_or_else(|e| e.into_inner());
        if let Some(tracked) = apps.get_mut(application_id) {
            tracked.state = state;
            tracked.stale = false;
        }
    }
}
