use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::stages::{StageName, WorkflowStages};

/// What was done to an application at a stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase", try_from = "String")]
pub enum Action {
    Accept,
    Reject,
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Action::Accept => write!(f, "accept"),
            Action::Reject => write!(f, "reject"),
        }
    }
}

impl FromStr for Action {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "accept" => Ok(Action::Accept),
            "reject" => Ok(Action::Reject),
            other => Err(format!("unknown action `{other}`")),
        }
    }
}

impl TryFrom<String> for Action {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

/// Outcome of a recorded transition.
///
/// Only `Completed` records count towards progression; `InReview` entries
/// are kept for audit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", try_from = "String")]
pub enum Status {
    Completed,
    InReview,
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Status::Completed => write!(f, "completed"),
            Status::InReview => write!(f, "in_review"),
        }
    }
}

impl FromStr for Status {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let folded: String = s
            .trim()
            .chars()
            .filter(|c| *c != '_' && *c != '-' && !c.is_whitespace())
            .collect::<String>()
            .to_lowercase();
        match folded.as_str() {
            "completed" => Ok(Status::Completed),
            "inreview" => Ok(Status::InReview),
            _ => Err(format!("unknown stage status `{}`", s.trim())),
        }
    }
}

impl TryFrom<String> for Status {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

/// One entry of an application's stage audit trail.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", try_from = "RawTransitionRecord")]
pub struct StageTransitionRecord {
    pub stage_name: StageName,
    pub action: Action,
    pub status: Status,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
    pub timestamp: DateTime<Utc>,
}

/// Record as older and newer backends send it. `stageName` wins over
/// `stage`, `timestamp` over `createdAt`, when both are present.
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawTransitionRecord {
    #[serde(default)]
    stage_name: Option<StageName>,
    #[serde(default)]
    stage: Option<StageName>,
    action: Action,
    status: Status,
    #[serde(default)]
    note: Option<String>,
    #[serde(default)]
    timestamp: Option<DateTime<Utc>>,
    #[serde(default)]
    created_at: Option<DateTime<Utc>>,
}

impl TryFrom<RawTransitionRecord> for StageTransitionRecord {
    type Error = String;

    fn try_from(raw: RawTransitionRecord) -> Result<Self, Self::Error> {
        let stage_name = raw
            .stage_name
            .or(raw.stage)
            .ok_or_else(|| "missing field `stageName`".to_string())?;
        let timestamp = raw
            .timestamp
            .or(raw.created_at)
            .ok_or_else(|| "missing field `timestamp`".to_string())?;
        Ok(Self {
            stage_name,
            action: raw.action,
            status: raw.status,
            note: raw.note,
            timestamp,
        })
    }
}

/// The part of an application the progression engine reads.
///
/// Owned by exactly one application and replaced wholesale whenever the
/// backend returns a new snapshot.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", from = "RawApplicationState")]
pub struct ApplicationState {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub current_stage: Option<StageName>,
    pub stage_history: Vec<StageTransitionRecord>,
}

/// Every spelling the backends use for an application. The first non-blank
/// of `currentStage`, `stage` is the reported stage; the first present of
/// `stageHistory`, `stageDetails`, `stageWiseStatus` is the history.
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawApplicationState {
    #[serde(default)]
    current_stage: Option<StageName>,
    #[serde(default)]
    stage: Option<StageName>,
    #[serde(default)]
    stage_history: Option<Vec<StageTransitionRecord>>,
    #[serde(default)]
    stage_details: Option<Vec<StageTransitionRecord>>,
    #[serde(default)]
    stage_wise_status: Option<Vec<StageTransitionRecord>>,
}

impl From<RawApplicationState> for ApplicationState {
    fn from(raw: RawApplicationState) -> Self {
        let current_stage = [raw.current_stage, raw.stage]
            .into_iter()
            .flatten()
            .find(|s| !s.is_empty());
        let stage_history = raw
            .stage_history
            .or(raw.stage_details)
            .or(raw.stage_wise_status)
            .unwrap_or_default();
        Self {
            current_stage,
            stage_history,
        }
    }
}

impl ApplicationState {
    pub fn new(current_stage: Option<StageName>, stage_history: Vec<StageTransitionRecord>) -> Self {
        Self {
            current_stage: current_stage.filter(|s| !s.is_empty()),
            stage_history,
        }
    }

    /// Backend-reported stage, ignoring blank values.
    pub fn reported_stage(&self) -> Option<&StageName> {
        self.current_stage.as_ref().filter(|s| !s.is_empty())
    }
}

/// Returns the furthest workflow stage that has an accepted, completed
/// record.
///
/// Workflow order wins over chronology: a late record for an earlier
/// stage does not move the result backwards. Records naming stages outside
/// the workflow are ignored.
pub fn last_accepted_stage(
    records: &[StageTransitionRecord],
    stages: &WorkflowStages,
) -> Option<StageName> {
    furthest_stage(records, stages, Action::Accept)
}

/// The furthest workflow stage with a completed rejection, if any.
pub fn last_rejected_stage(
    records: &[StageTransitionRecord],
    stages: &WorkflowStages,
) -> Option<StageName> {
    furthest_stage(records, stages, Action::Reject)
}

fn furthest_stage(
    records: &[StageTransitionRecord],
    stages: &WorkflowStages,
    action: Action,
) -> Option<StageName> {
    let matched: HashSet<&StageName> = records
        .iter()
        .filter(|r| r.status == Status::Completed && r.action == action)
        .map(|r| &r.stage_name)
        .collect();

    stages
        .names()
        .iter()
        .filter(|name| matched.contains(name))
        .next_back()
        .cloned()
}
