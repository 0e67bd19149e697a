mod engine;
mod history;
mod stages;

pub use engine::{Progression, StageProgressionEngine, TransitionRequest};
pub use history::{Action, ApplicationState, StageTransitionRecord, Status, last_accepted_stage, last_rejected_stage};
pub use stages::{CANONICAL_STAGES, StageName, WorkflowStage, WorkflowStages, resolve_order};
