mod cli;
mod ui;

use std::path::Path;
use std::process::ExitCode;

use anyhow::Context;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use cli::{Cli, Command, Target};
use hirewise::gateway::types::JobWorkflow;
use hirewise::workflow::{ApplicationState, StageProgressionEngine, WorkflowStages};
use hirewise::{ApplicationClient, HirewiseConfig, HirewiseError, PipelineController, SessionStore};
use ui::RequestSpinner;

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let mut config = HirewiseConfig::load_from(&cli.config)
        .with_context(|| format!("loading {}", cli.config.display()))?;
    if let Some(url) = &cli.api_url {
        config.api_base_url = url.clone();
    }

    let succeeded = match cli.command {
        Command::Preview { workflow, application } => preview(&config, &workflow, &application)?,
        Command::Status(target) => status(&config, &target).await?,
        Command::Advance(target) => act(&config, &target, Act::Advance).await?,
        Command::Reject(target) => act(&config, &target, Act::Reject).await?,
    };

    Ok(if succeeded { ExitCode::SUCCESS } else { ExitCode::FAILURE })
}

// RUST_LOG wins over --verbose.
fn init_tracing(verbose: bool) {
    let default = if verbose { "hirewise=debug" } else { "hirewise=warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

#[derive(Debug, Clone, Copy)]
enum Act {
    Advance,
    Reject,
}

fn connect(config: &HirewiseConfig) -> Result<PipelineController<ApplicationClient>, HirewiseError> {
    let session = SessionStore::global();
    if !config.api_token.is_empty() {
        session.set(config.api_token.as_str());
    }
    let client = ApplicationClient::from_config(config, session)?;
    Ok(PipelineController::new(client, config.fallback_stages.clone()))
}

async fn load(
    pipeline: &PipelineController<ApplicationClient>,
    target: &Target,
) -> Result<bool, HirewiseError> {
    let spinner = RequestSpinner::start(&format!("Loading application {}", target.application));
    let loaded = pipeline.load(&target.job, &target.application).await;
    spinner.finish();

    match loaded {
        Ok(progression) => {
            let stages = pipeline.stages(&target.application).unwrap_or_default();
            ui::print_progression(&target.application, &stages, &progression);
            Ok(true)
        }
        Err(err) => {
            ui::print_notice(&err.notice());
            Ok(false)
        }
    }
}

async fn status(config: &HirewiseConfig, target: &Target) -> Result<bool, HirewiseError> {
    let pipeline = connect(config)?;
    load(&pipeline, target).await
}

async fn act(config: &HirewiseConfig, target: &Target, act: Act) -> Result<bool, HirewiseError> {
    let pipeline = connect(config)?;
    if !load(&pipeline, target).await? {
        return Ok(false);
    }

    let verb = match act {
        Act::Advance => "Advancing",
        Act::Reject => "Rejecting",
    };
    let spinner = RequestSpinner::start(&format!("{verb} application {}", target.application));
    let result = match act {
        Act::Advance => pipeline.advance(&target.application).await,
        Act::Reject => pipeline.reject(&target.application).await,
    };
    spinner.finish();

    println!();
    match result {
        Ok(outcome) => {
            ui::print_notice(&outcome.notice());
            let stages = pipeline.stages(&target.application).unwrap_or_default();
            ui::print_progression(&target.application, &stages, &outcome.progression);
            Ok(true)
        }
        Err(err) => {
            ui::print_notice(&err.notice());
            // A refusal refreshes the application; show where it really stands.
            if let Ok(progression) = pipeline.progression(&target.application) {
                let stages = pipeline.stages(&target.application).unwrap_or_default();
                ui::print_progression(&target.application, &stages, &progression);
            }
            Ok(false)
        }
    }
}

fn preview(config: &HirewiseConfig, workflow: &Path, application: &Path) -> Result<bool, HirewiseError> {
    let job: JobWorkflow = serde_json::from_str(&std::fs::read_to_string(workflow)?)?;
    let state: ApplicationState = serde_json::from_str(&std::fs::read_to_string(application)?)?;
    let stages = WorkflowStages::from_workflow(&job.into_stages(), &config.fallback_stages);

    let name = application
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    match StageProgressionEngine::evaluate(&stages, &state) {
        Ok(progression) => {
            ui::print_progression(&name, &stages, &progression);
            Ok(true)
        }
        Err(err) => {
            ui::print_notice(&hirewise::Notice::error(err.to_string()));
            Ok(false)
        }
    }
}
