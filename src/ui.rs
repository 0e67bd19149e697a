//! Terminal output: a spinner while a request is in flight, the stage
//! pipeline, and coloured notices.

use std::cmp::Ordering;
use std::time::Duration;

use console::Style;
use indicatif::{ProgressBar, ProgressStyle};

use hirewise::workflow::{Progression, WorkflowStages};
use hirewise::{Notice, NoticeLevel};

/// Spinner shown while waiting on the backend.
pub struct RequestSpinner {
    pb: ProgressBar,
}

impl RequestSpinner {
    pub fn start(message: &str) -> Self {
        let pb = ProgressBar::new_spinner();
        if let Ok(style) = ProgressStyle::default_spinner().template("{spinner:.cyan} {msg}") {
            pb.set_style(style);
        }
        pb.set_message(message.to_string());
        pb.enable_steady_tick(Duration::from_millis(100));
        Self { pb }
    }

    pub fn finish(self) {
        self.pb.finish_and_clear();
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Marker {
    Cleared,
    Current,
    Rejected,
    Pending,
}

fn stage_marker(progression: &Progression, index: usize) -> Marker {
    let (stop, at_stop) = match (progression.closed_as(), progression.rejected_at()) {
        (Some(stage), _) if stage.is_hired() => return Marker::Cleared,
        (Some(_), Some(at)) => (at, Marker::Rejected),
        (Some(_), None) => return Marker::Pending,
        (None, _) => (progression.current_index, Marker::Current),
    };
    match index.cmp(&stop) {
        Ordering::Less => Marker::Cleared,
        Ordering::Equal => at_stop,
        Ordering::Greater => Marker::Pending,
    }
}

/// Prints the workflow with the current stage highlighted.
pub fn print_progression(application_id: &str, stages: &WorkflowStages, progression: &Progression) {
    let bold = Style::new().bold();
    let current = Style::new().cyan().bold();
    let done = Style::new().green();
    let dim = Style::new().dim();
    let red = Style::new().red();

    println!("{}", bold.apply_to(format!("Application {application_id}")));
    for (index, name) in stages.names().iter().enumerate() {
        let line = match stage_marker(progression, index) {
            Marker::Cleared => format!("  {} {name}", done.apply_to("✓")),
            Marker::Current => format!("  {} {}", current.apply_to("▶"), current.apply_to(name)),
            Marker::Rejected => format!("  {} {}", red.apply_to("✗"), red.apply_to(name)),
            Marker::Pending => format!("  {} {}", dim.apply_to("·"), dim.apply_to(name)),
        };
        println!("{line}");
    }

    match progression.closed_as() {
        Some(stage) if stage.is_hired() => println!("  {}", done.apply_to("Hired")),
        Some(stage) => println!("  {}", Style::new().red().apply_to(format!("Closed: {stage}"))),
        None => {
            if !progression.stage_recognized {
                println!(
                    "  {}",
                    Style::new().yellow().apply_to(format!(
                        "Stage `{}` is not in this job's workflow; showing the first stage",
                        progression.current_stage
                    ))
                );
            }
            match &progression.next_stage {
                Some(next) => println!("  Next: {next}"),
                None => println!("  Final stage: advancing hires the candidate"),
            }
        }
    }
}

pub fn print_notice(notice: &Notice) {
    let (symbol, style) = match notice.level {
        NoticeLevel::Success => ("✓", Style::new().green().bold()),
        NoticeLevel::Info => ("•", Style::new().cyan()),
        NoticeLevel::Warning => ("!", Style::new().yellow()),
        NoticeLevel::Error => ("✗", Style::new().red().bold()),
    };
    println!("  {} {}", style.apply_to(symbol), notice.message);
    if notice.retryable {
        println!("  {}", Style::new().yellow().apply_to("↻ The action can be retried."));
    }
}

#[cfg(test)]
mod tests {
    use hirewise::workflow::{ApplicationState, StageName, StageProgressionEngine};

    use super::*;

    fn markers(state: ApplicationState) -> Vec<Marker> {
        let stages = WorkflowStages::resolve(
            ["applied", "screening_test", "technical_interview"],
            Vec::<&str>::new(),
        );
        let progression = StageProgressionEngine::evaluate(&stages, &state).unwrap();
        (0..stages.len()).map(|i| stage_marker(&progression, i)).collect()
    }

    #[test]
    fn open_application_marks_current_stage() {
        let state = ApplicationState::new(Some(StageName::new("screening_test")), Vec::new());
        assert_eq!(markers(state), [Marker::Cleared, Marker::Current, Marker::Pending]);
    }

    #[test]
    fn rejected_application_does_not_clear_later_stages() {
        let record = serde_json::json!({
            "stageName": "screening_test",
            "action": "reject",
            "status": "completed",
            "timestamp": "2025-03-01T10:00:00Z"
        });
        let state = ApplicationState::new(
            Some(StageName::rejected()),
            vec![serde_json::from_value(record).unwrap()],
        );
        assert_eq!(markers(state), [Marker::Cleared, Marker::Rejected, Marker::Pending]);
    }

    #[test]
    fn hired_application_clears_every_stage() {
        let state = ApplicationState::new(Some(StageName::hired()), Vec::new());
        assert_eq!(markers(state), [Marker::Cleared; 3]);
    }
}
