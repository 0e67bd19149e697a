use serde::{Deserialize, Serialize};
use tracing::warn;

use super::history::{Action, ApplicationState, last_accepted_stage, last_rejected_stage};
use super::stages::{StageName, WorkflowStages};
use crate::error::ProgressionError;

/// The body of a stage transition request: which stage to act on and how.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransitionRequest {
    pub stage_name: StageName,
    pub action: Action,
}

/// Where an application stands within its job's workflow.
#[derive(Debug, Clone, PartialEq)]
pub struct Progression {
    pub current_stage: StageName,
    pub current_index: usize,
    pub is_final_stage: bool,
    pub next_stage: Option<StageName>,
    /// `false` when the current stage is not part of the workflow and the
    /// index fell back to the first stage.
    pub stage_recognized: bool,
    /// Workflow stage that requests act on; differs from `current_stage`
    /// only when the latter is unrecognized.
    acting_stage: StageName,
    closed_as: Option<StageName>,
    rejected_at: Option<usize>,
}

impl Progression {
    /// `Some(hired)` or `Some(rejected)` once the application is closed.
    pub fn closed_as(&self) -> Option<&StageName> {
        self.closed_as.as_ref()
    }

    pub fn is_closed(&self) -> bool {
        self.closed_as.is_some()
    }

    /// Index of the workflow stage a rejected application was turned down
    /// at. Stages before it were cleared; stages after it were never reached.
    pub fn rejected_at(&self) -> Option<usize> {
        self.rejected_at
    }

    /// Clears the current stage. Accepting the final configured stage hires
    /// the candidate instead of moving to a further stage.
    pub fn build_accept_request(&self) -> Option<TransitionRequest> {
        if self.is_closed() {
            return None;
        }
        let stage_name = if self.is_final_stage {
            StageName::hired()
        } else {
            self.acting_stage.clone()
        };
        Some(TransitionRequest {
            stage_name,
            action: Action::Accept,
        })
    }

    pub fn build_reject_request(&self) -> Option<TransitionRequest> {
        if self.is_closed() {
            return None;
        }
        Some(TransitionRequest {
            stage_name: self.acting_stage.clone(),
            action: Action::Reject,
        })
    }
}

/// Computes an application's position in a workflow.
pub struct StageProgressionEngine;

impl StageProgressionEngine {
    /// Evaluate `application` against the ordered `stages`.
    ///
    /// The backend-reported stage is authoritative. Without one, the stage
    /// after the furthest accepted stage in the history is current; with no
    /// accepted history the first stage is. A stage name missing from the
    /// workflow resolves to index 0 and is flagged on the result.
    pub fn evaluate(
        stages: &WorkflowStages,
        application: &ApplicationState,
    ) -> Result<Progression, ProgressionError> {
        let first = stages.get(0).ok_or(ProgressionError::NoStagesConfigured)?;
        let last_index = stages.len() - 1;

        let (current_stage, mut closed_as) = match application.reported_stage() {
            Some(reported) => (reported.clone(), None),
            None => match last_accepted_stage(&application.stage_history, stages) {
                Some(cleared) => {
                    let cleared_index = stages.position(&cleared).unwrap_or(0);
                    if cleared_index == last_index {
                        (cleared, Some(StageName::hired()))
                    } else {
                        (stages.names()[cleared_index + 1].clone(), None)
                    }
                }
                None => (first.clone(), None),
            },
        };

        if current_stage.is_terminal() {
            closed_as = Some(current_stage.clone());
        }

        let position = stages.position(&current_stage);
        if position.is_none() && closed_as.is_none() {
            warn!(
                stage = %current_stage,
                "current stage is not part of the job workflow, treating it as the first stage"
            );
        }
        let current_index = position.unwrap_or(0);
        let is_final_stage = current_index == last_index;
        let next_stage = if is_final_stage {
            None
        } else {
            stages.get(current_index + 1).cloned()
        };

        let acting_stage = stages.names()[current_index].clone();
        let rejected_at = match &closed_as {
            Some(stage) if stage.is_rejected() => Some(Self::rejection_index(stages, application)),
            _ => None,
        };

        Ok(Progression {
            current_stage,
            current_index,
            is_final_stage,
            next_stage,
            stage_recognized: position.is_some(),
            acting_stage,
            closed_as,
            rejected_at,
        })
    }

    // The stage holding a completed rejection, else the one after the last
    // cleared stage.
    fn rejection_index(stages: &WorkflowStages, application: &ApplicationState) -> usize {
        let history = &application.stage_history;
        if let Some(index) = last_rejected_stage(history, stages).and_then(|s| stages.position(&s)) {
            return index;
        }
        last_accepted_stage(history, stages)
            .and_then(|s| stages.position(&s))
            .map_or(0, |cleared| (cleared + 1).min(stages.len() - 1))
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;

    use super::*;
    use crate::workflow::history::{StageTransitionRecord, Status};

    fn stages(list: &[&str]) -> WorkflowStages {
        WorkflowStages::resolve(list.iter(), Vec::<&str>::new())
    }

    fn accepted(stage: &str) -> StageTransitionRecord {
        StageTransitionRecord {
            stage_name: StageName::new(stage),
            action: Action::Accept,
            status: Status::Completed,
            note: None,
            timestamp: Utc::now(),
        }
    }

    fn reported(stage: &str) -> ApplicationState {
        ApplicationState::new(Some(StageName::new(stage)), Vec::new())
    }

    #[test]
    fn fresh_application_starts_at_first_stage() {
        let p = StageProgressionEngine::evaluate(
            &stages(&["applied", "screening_test", "hired"]),
            &ApplicationState::default(),
        )
        .unwrap();
        assert_eq!(p.current_stage, StageName::new("applied"));
        assert_eq!(p.current_index, 0);
        assert!(!p.is_final_stage);
        assert_eq!(p.next_stage, Some(StageName::new("screening_test")));
        assert!(p.stage_recognized);
    }

    #[test]
    fn cleared_stage_moves_to_following_stage() {
        let app = ApplicationState::new(None, vec![accepted("applied")]);
        let p = StageProgressionEngine::evaluate(&stages(&["applied", "screening_test"]), &app).unwrap();
        assert_eq!(p.current_stage, StageName::new("screening_test"));
        assert!(p.is_final_stage);
        assert_eq!(p.next_stage, None);

        let req = p.build_accept_request().unwrap();
        assert_eq!(req.stage_name, StageName::hired());
        assert_eq!(req.action, Action::Accept);
    }

    #[test]
    fn empty_workflow_is_a_configuration_error() {
        let err = StageProgressionEngine::evaluate(&stages(&[]), &ApplicationState::default()).unwrap_err();
        assert!(matches!(err, ProgressionError::NoStagesConfigured));
    }

    #[test]
    fn reported_stage_wins_over_history() {
        let app = ApplicationState::new(
            Some(StageName::new("Technical_Interview")),
            vec![accepted("applied")],
        );
        let p = StageProgressionEngine::evaluate(
            &stages(&["applied", "resume_shortlisted", "technical_interview", "hr_interview"]),
            &app,
        )
        .unwrap();
        assert_eq!(p.current_index, 2);
        assert_eq!(p.next_stage, Some(StageName::new("hr_interview")));
    }

    #[test]
    fn accept_targets_current_stage_before_final() {
        let p = StageProgressionEngine::evaluate(&stages(&["applied", "screening_test"]), &reported("applied"))
            .unwrap();
        let req = p.build_accept_request().unwrap();
        assert_eq!(req.stage_name, StageName::new("applied"));
    }

    #[test]
    fn final_stage_accept_always_targets_hired() {
        for list in [
            vec!["offer"],
            vec!["applied", "offer"],
            vec!["applied", "screening_test", "hired_pending", "offer"],
        ] {
            let workflow = stages(&list);
            let last = list[list.len() - 1];
            let p = StageProgressionEngine::evaluate(&workflow, &reported(last)).unwrap();
            assert!(p.is_final_stage);
            let req = p.build_accept_request().unwrap();
            assert!(req.stage_name.is_hired());
            assert_eq!(workflow.position(&req.stage_name), None);
        }
    }

    #[test]
    fn reject_targets_current_stage() {
        let p = StageProgressionEngine::evaluate(
            &stages(&["applied", "screening_test"]),
            &reported("screening_test"),
        )
        .unwrap();
        let req = p.build_reject_request().unwrap();
        assert_eq!(req.stage_name, StageName::new("screening_test"));
        assert_eq!(req.action, Action::Reject);
    }

    #[test]
    fn terminal_applications_offer_no_actions() {
        let workflow = stages(&["applied", "screening_test"]);
        for stage in ["rejected", "HIRED"] {
            let p = StageProgressionEngine::evaluate(&workflow, &reported(stage)).unwrap();
            assert!(p.is_closed());
            assert!(p.build_accept_request().is_none());
            assert!(p.build_reject_request().is_none());
        }
    }

    #[test]
    fn rejection_records_where_the_application_stopped() {
        let workflow = stages(&["applied", "screening_test", "technical_interview"]);
        let rejected_at_screening = StageTransitionRecord {
            action: Action::Reject,
            ..accepted("screening_test")
        };
        let app = ApplicationState::new(
            Some(StageName::rejected()),
            vec![accepted("applied"), rejected_at_screening],
        );
        let p = StageProgressionEngine::evaluate(&workflow, &app).unwrap();
        assert_eq!(p.rejected_at(), Some(1));

        // Without a rejection record, the stage after the last cleared one.
        let app = ApplicationState::new(Some(StageName::rejected()), vec![accepted("applied")]);
        let p = StageProgressionEngine::evaluate(&workflow, &app).unwrap();
        assert_eq!(p.rejected_at(), Some(1));

        let p = StageProgressionEngine::evaluate(&workflow, &reported("rejected")).unwrap();
        assert_eq!(p.rejected_at(), Some(0));

        let p = StageProgressionEngine::evaluate(&workflow, &reported("hired")).unwrap();
        assert_eq!(p.rejected_at(), None);
    }

    #[test]
    fn clearing_final_stage_in_history_closes_as_hired() {
        let app = ApplicationState::new(None, vec![accepted("applied"), accepted("screening_test")]);
        let p = StageProgressionEngine::evaluate(&stages(&["applied", "screening_test"]), &app).unwrap();
        assert_eq!(p.closed_as(), Some(&StageName::hired()));
        assert!(p.build_accept_request().is_none());
    }

    #[test]
    fn unknown_stage_falls_back_to_first_and_is_flagged() {
        let p = StageProgressionEngine::evaluate(
            &stages(&["applied", "screening_test"]),
            &reported("group_discussion"),
        )
        .unwrap();
        assert_eq!(p.current_index, 0);
        assert!(!p.stage_recognized);
        assert_eq!(p.current_stage, StageName::new("group_discussion"));
        assert_eq!(p.next_stage, Some(StageName::new("screening_test")));

        // Requests never name a stage outside the workflow.
        let req = p.build_reject_request().unwrap();
        assert_eq!(req.stage_name, StageName::new("applied"));
    }

    #[test]
    fn transition_request_wire_format() {
        let req = TransitionRequest {
            stage_name: StageName::new("Technical_Interview"),
            action: Action::Reject,
        };
        let json = serde_json::to_value(&req).unwrap();
        assert_eq!(json, serde_json::json!({"stageName": "technical_interview", "action": "reject"}));
    }
}
