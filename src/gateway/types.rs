//! Payloads exchanged with the applications backend.
//!
//! Field names follow the backend's camelCase JSON.

use serde::{Deserialize, Serialize};

use crate::workflow::{ApplicationState, StageName, StageTransitionRecord, WorkflowStage};

/// Response of `PUT /applications/{id}/stage`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StageSnapshot {
    pub current_stage: StageName,
    #[serde(rename = "stageDetails", default)]
    pub stage_history: Vec<StageTransitionRecord>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl StageSnapshot {
    /// The authoritative application state to replace the local copy with.
    pub fn into_state(self) -> ApplicationState {
        ApplicationState::new(Some(self.current_stage), self.stage_history)
    }
}

/// The slice of `GET /jobs/{id}` that carries the hiring workflow.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JobWorkflow {
    #[serde(default)]
    pub hiring_workflow: Option<HiringWorkflow>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct HiringWorkflow {
    #[serde(default)]
    pub stages: Vec<WorkflowStage>,
}

impl JobWorkflow {
    pub fn into_stages(self) -> Vec<WorkflowStage> {
        self.hiring_workflow.map(|w| w.stages).unwrap_or_default()
    }
}

/// Error body carried by non-2xx responses.
#[derive(Debug, Clone, Deserialize)]
pub struct ErrorBody {
    pub message: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::workflow::{Action, Status};

    #[test]
    fn snapshot_deserializes_from_api_format() {
        let json = r#"{
            "currentStage": "Technical_Interview",
            "stageDetails": [
                {"stageName": "applied", "action": "accept", "status": "completed", "timestamp": "2025-03-01T09:00:00Z"},
                {"stageName": "resume_shortlisted", "action": "accept", "status": "completed", "note": "strong CV", "timestamp": "2025-03-02T09:00:00Z"}
            ],
            "message": "Stage updated"
        }"#;
        let snapshot: StageSnapshot = serde_json::from_str(json).unwrap();
        assert_eq!(snapshot.current_stage.as_str(), "technical_interview");
        assert_eq!(snapshot.stage_history.len(), 2);
        assert_eq!(snapshot.stage_history[1].note.as_deref(), Some("strong CV"));
        assert_eq!(snapshot.stage_history[0].action, Action::Accept);
        assert_eq!(snapshot.stage_history[0].status, Status::Completed);
        assert_eq!(snapshot.message.as_deref(), Some("Stage updated"));
    }

    #[test]
    fn snapshot_into_state_keeps_reported_stage() {
        let snapshot = StageSnapshot {
            current_stage: StageName::rejected(),
            stage_history: Vec::new(),
            message: None,
        };
        let state = snapshot.into_state();
        assert_eq!(state.reported_stage(), Some(&StageName::rejected()));
    }

    #[test]
    fn job_workflow_stages() {
        let json = r#"{
            "title": "Backend Engineer",
            "hiringWorkflow": {"stages": [
                {"stage": "applied", "description": "Application received"},
                {"stage": "technical_interview", "description": ""}
            ]}
        }"#;
        let job: JobWorkflow = serde_json::from_str(json).unwrap();
        let stages = job.into_stages();
        assert_eq!(stages.len(), 2);
        assert_eq!(stages[1].name.as_str(), "technical_interview");
    }

    #[test]
    fn job_without_workflow_has_no_stages() {
        let job: JobWorkflow = serde_json::from_str(r#"{"title": "Designer"}"#).unwrap();
        assert!(job.into_stages().is_empty());
    }
}
