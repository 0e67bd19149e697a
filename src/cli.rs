//! Command line interface for the operator console.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use hirewise::config::CONFIG_FILE;

/// Move applicants through a job's hiring workflow.
#[derive(Debug, Parser)]
#[command(name = "hirewise", version, about)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Path to the configuration file.
    #[arg(long, global = true, default_value = CONFIG_FILE)]
    pub config: PathBuf,

    /// Backend base URL, overriding the configuration.
    #[arg(long, global = true)]
    pub api_url: Option<String>,

    /// Enable debug logging.
    #[arg(long, short, global = true, default_value_t = false)]
    pub verbose: bool,
}

/// Identifies one application within one job.
#[derive(Debug, Clone, Args)]
pub struct Target {
    /// Job whose hiring workflow applies.
    #[arg(long)]
    pub job: String,

    /// Application to act on.
    #[arg(long)]
    pub application: String,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Show the application's current and next stage.
    Status(Target),

    /// Clear the current stage (hires the candidate at the final stage).
    Advance(Target),

    /// Reject the application at its current stage.
    Reject(Target),

    /// Evaluate progression offline from exported JSON files.
    Preview {
        /// Job JSON containing `hiringWorkflow.stages`.
        #[arg(long)]
        workflow: PathBuf,

        /// Application JSON containing `stage` and `stageWiseStatus`.
        #[arg(long)]
        application: PathBuf,
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_parses_advance_subcommand() {
        let cli = Cli::parse_from(["hirewise", "advance", "--job", "j1", "--application", "a1"]);
        match cli.command {
            Command::Advance(target) => {
                assert_eq!(target.job, "j1");
                assert_eq!(target.application, "a1");
            }
            _ => panic!("expected Advance command"),
        }
    }

    #[test]
    fn cli_parses_global_flags() {
        let cli = Cli::parse_from([
            "hirewise",
            "--api-url",
            "https://ats.example.com/api",
            "--verbose",
            "status",
            "--job",
            "j1",
            "--application",
            "a1",
        ]);
        assert!(cli.verbose);
        assert_eq!(cli.api_url.as_deref(), Some("https://ats.example.com/api"));
        assert_eq!(cli.config, PathBuf::from("hirewise.toml"));
    }

    #[test]
    fn cli_parses_preview_subcommand() {
        let cli = Cli::parse_from([
            "hirewise",
            "preview",
            "--workflow",
            "job.json",
            "--application",
            "app.json",
        ]);
        match cli.command {
            Command::Preview { workflow, application } => {
                assert_eq!(workflow, PathBuf::from("job.json"));
                assert_eq!(application, PathBuf::from("app.json"));
            }
            _ => panic!("expected Preview command"),
        }
    }

    #[test]
    fn cli_requires_target() {
        assert!(Cli::try_parse_from(["hirewise", "reject", "--job", "j1"]).is_err());
    }

    #[test]
    fn cli_verify() {
        Cli::command().debug_assert();
    }
}
