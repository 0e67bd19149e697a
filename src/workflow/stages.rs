use std::fmt;

use serde::{Deserialize, Serialize};

/// Stage names used when a job defines no hiring workflow of its own.
pub const CANONICAL_STAGES: &[&str] = &[
    "applied",
    "resume_shortlisted",
    "screening_test",
    "technical_interview",
    "hr_interview",
];

const HIRED: &str = "hired";
const REJECTED: &str = "rejected";

/// A case-insensitive stage identifier.
///
/// The name is trimmed and lower-cased on construction, so equality,
/// hashing and serialization all operate on the normalized form.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub struct StageName(String);

impl StageName {
    pub fn new(name: impl AsRef<str>) -> Self {
        Self(name.as_ref().trim().to_lowercase())
    }

    /// Terminal sentinel produced by accepting the final configured stage.
    pub fn hired() -> Self {
        Self(HIRED.to_string())
    }

    /// Terminal sentinel for a closed-out application.
    pub fn rejected() -> Self {
        Self(REJECTED.to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn is_hired(&self) -> bool {
        self.0 == HIRED
    }

    pub fn is_rejected(&self) -> bool {
        self.0 == REJECTED
    }

    /// `hired` and `rejected` close an application.
    pub fn is_terminal(&self) -> bool {
        self.is_hired() || self.is_rejected()
    }
}

impl fmt::Display for StageName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<String> for StageName {
    fn from(value: String) -> Self {
        Self::new(value)
    }
}

impl From<&str> for StageName {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<StageName> for String {
    fn from(value: StageName) -> Self {
        value.0
    }
}

impl PartialEq<str> for StageName {
    fn eq(&self, other: &str) -> bool {
        self.0 == other.trim().to_lowercase()
    }
}

impl PartialEq<&str> for StageName {
    fn eq(&self, other: &&str) -> bool {
        self == *other
    }
}

/// A single configured step of a job's hiring workflow.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawWorkflowStage")]
pub struct WorkflowStage {
    #[serde(rename = "stage")]
    pub name: StageName,
    #[serde(default)]
    pub description: String,
}

// Jobs spell the stage key `stage` or `name`; `stage` wins when both appear.
#[derive(Deserialize)]
struct RawWorkflowStage {
    #[serde(default)]
    stage: Option<StageName>,
    #[serde(default)]
    name: Option<StageName>,
    #[serde(default)]
    description: String,
}

impl TryFrom<RawWorkflowStage> for WorkflowStage {
    type Error = String;

    fn try_from(raw: RawWorkflowStage) -> Result<Self, Self::Error> {
        let name = raw.stage.or(raw.name).ok_or_else(|| "missing field `stage`".to_string())?;
        Ok(Self {
            name,
            description: raw.description,
        })
    }
}

/// The ordered, validated stage list of one job.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct WorkflowStages {
    names: Vec<StageName>,
}

impl WorkflowStages {
    /// Builds the ordered list from a job's configured stages, falling back
    /// to `fallback` when nothing usable is configured. Duplicates after
    /// normalization keep their first position.
    pub fn resolve<C, F>(configured: C, fallback: F) -> Self
    where
        C: IntoIterator,
        C::Item: AsRef<str>,
        F: IntoIterator,
        F::Item: AsRef<str>,
    {
        let configured: Vec<StageName> = configured.into_iter().map(StageName::new).collect();
        let fallback: Vec<StageName> = fallback.into_iter().map(StageName::new).collect();

        let mut names = Vec::new();
        for name in resolve_order(&configured, &fallback) {
            if !names.contains(name) {
                names.push(name.clone());
            }
        }
        Self { names }
    }

    pub fn from_workflow(stages: &[WorkflowStage], fallback: &[StageName]) -> Self {
        Self::resolve(
            stages.iter().map(|s| s.name.as_str()),
            fallback.iter().map(StageName::as_str),
        )
    }

    pub fn names(&self) -> &[StageName] {
        &self.names
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    /// Case-insensitive position of `name` in the workflow.
    pub fn position(&self, name: &StageName) -> Option<usize> {
        self.names.iter().position(|n| n == name)
    }

    pub fn get(&self, index: usize) -> Option<&StageName> {
        self.names.get(index)
    }
}

/// Returns `configured` without blank entries if anything remains,
/// otherwise `fallback` (also without blank entries).
///
/// An empty result means neither list is usable and must be reported as a
/// configuration error by the caller.
pub fn resolve_order<'a>(configured: &'a [StageName], fallback: &'a [StageName]) -> Vec<&'a StageName> {
    let usable: Vec<&StageName> = configured.iter().filter(|s| !s.is_empty()).collect();
    if !usable.is_empty() {
        return usable;
    }
    fallback.iter().filter(|s| !s.is_empty()).collect()
}
