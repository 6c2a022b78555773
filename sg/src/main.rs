//! SongGen - lyrics to song workflow client
//!
//! CLI entry point for driving the generation workflow.

use std::fs;
use std::sync::Arc;

use clap::Parser;
use colored::*;
use eyre::{Context, Result, eyre};
use tracing::{debug, info};

use songgen::cli::{Cli, Command, get_log_path};
use songgen::config::Config;
use songgen::{
    FileStorage, HistoryManager, HistoryStore, HttpSongApi, PollOutcome, TerminalUi, ViewHandle, WorkflowController,
};

fn setup_logging(cli_log_level: Option<&str>, config_log_level: Option<&str>) -> Result<()> {
    // Note: Can't log params here since logging isn't initialized yet
    let log_path = get_log_path();
    if let Some(log_dir) = log_path.parent() {
        fs::create_dir_all(log_dir).context("Failed to create log directory")?;
    }

    // Determine log level with priority: CLI --log-level > config file > default (INFO)
    let level = match cli_log_level.or(config_log_level) {
        Some(s) => match s.to_uppercase().as_str() {
            "TRACE" => tracing::Level::TRACE,
            "DEBUG" => tracing::Level::DEBUG,
            "INFO" => tracing::Level::INFO,
            "WARN" | "WARNING" => tracing::Level::WARN,
            "ERROR" => tracing::Level::ERROR,
            _ => {
                eprintln!("Warning: Unknown log-level '{}', defaulting to INFO", s);
                tracing::Level::INFO
            }
        },
        None => tracing::Level::INFO,
    };

    let log_file = fs::File::create(&log_path).context("Failed to create log file")?;

    tracing_subscriber::fmt()
        .with_writer(log_file)
        .with_ansi(false)
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env().add_directive(level.into()))
        .init();

    info!("Logging initialized (level: {:?})", level);
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Load log level from config file early (before full config load)
    let config_log_level = Config::load_log_level(cli.config.as_ref());

    // Setup logging with priority: CLI > config > INFO default
    setup_logging(cli.log_level.as_deref(), config_log_level.as_deref()).context("Failed to setup logging")?;

    let config = Config::load(cli.config.as_ref()).context("Failed to load configuration")?;
    info!("SongGen loaded config: base-url={}", config.base_url);

    let mut controller = open_session(&config)?;

    debug!(command = ?cli.command, "main: dispatching command");
    let result = match cli.command {
        Command::Generate {
            prompt,
            genre,
            mood,
            approve,
            synthesize,
            save,
            wait,
        } => {
            debug!(%prompt, %genre, %mood, approve, synthesize, save, wait, "main: matched Generate command");
            let steps = GenerateSteps {
                approve: approve || synthesize || wait,
                synthesize: synthesize || wait,
                save,
                wait,
            };
            cmd_generate(&mut controller, &prompt, &genre, &mood, steps).await
        }
        Command::Poll { content_id } => {
            debug!(%content_id, "main: matched Poll command");
            cmd_poll(&mut controller, &content_id).await
        }
        Command::History => {
            debug!("main: matched History command");
            cmd_history(&controller).await
        }
        Command::Reapply { index } => {
            debug!(index, "main: matched Reapply command");
            cmd_reapply(&controller, index).await
        }
        Command::Status => {
            debug!("main: matched Status command");
            cmd_status(&controller).await
        }
        Command::Songs => {
            debug!("main: matched Songs command");
            cmd_songs(&controller).await
        }
        Command::Download { content_id, dir } => {
            debug!(%content_id, ?dir, "main: matched Download command");
            let dir = dir.unwrap_or_else(|| config.download_dir.clone());
            controller
                .download_content(&content_id, &dir)
                .await
                .map(|_| ())
                .map_err(Into::into)
        }
        Command::TestConnection => {
            debug!("main: matched TestConnection command");
            controller.test_connection().await.map_err(Into::into)
        }
    };

    controller.teardown().await;
    result
}

/// Build the controller with the terminal UI and file-backed history
fn open_session(config: &Config) -> Result<WorkflowController> {
    debug!(history_dir = ?config.history_dir, "open_session: called");
    let api = HttpSongApi::from_config(config).context("Failed to create HTTP client")?;
    let storage = FileStorage::open(&config.history_dir)
        .context(format!("Failed to open history at {}", config.history_dir.display()))?;
    let history = HistoryManager::spawn(HistoryStore::load(Box::new(storage)));

    let ui = Arc::new(TerminalUi::new());
    let view = ViewHandle::new(ui.clone(), ui);

    Ok(WorkflowController::new(
        Arc::new(api),
        history,
        view,
        config.poller_config(),
    ))
}

struct GenerateSteps {
    approve: bool,
    synthesize: bool,
    save: bool,
    wait: bool,
}

async fn cmd_generate(
    controller: &mut WorkflowController,
    prompt: &str,
    genre: &str,
    mood: &str,
    steps: GenerateSteps,
) -> Result<()> {
    debug!("cmd_generate: called");
    let generated = controller.submit_lyrics_request(prompt, genre, mood).await?;
    println!("content id: {}", generated.content_id.cyan());

    if steps.save {
        controller.save_lyrics().await?;
    }

    if !steps.approve {
        return Ok(());
    }
    controller.approve()?;

    if !steps.synthesize {
        return Ok(());
    }
    let task_id = controller.submit_synthesis().await?;

    if !steps.wait {
        println!(
            "task id: {} (run `sg poll {}` to wait for the song)",
            task_id.cyan(),
            generated.content_id
        );
        return Ok(());
    }

    await_outcome(controller).await
}

async fn cmd_poll(controller: &mut WorkflowController, content_id: &str) -> Result<()> {
    debug!(%content_id, "cmd_poll: called");
    let task_id = controller.resume_synthesis(content_id).await?;
    println!("task id: {}", task_id.cyan());
    await_outcome(controller).await
}

/// Block until the active synthesis poll ends
async fn await_outcome(controller: &WorkflowController) -> Result<()> {
    match controller.wait_for_completion().await {
        Some(PollOutcome::Completed { .. }) => Ok(()),
        Some(PollOutcome::Failed { message, .. }) => Err(eyre!("Synthesis failed: {}", message)),
        Some(PollOutcome::Cancelled) => Err(eyre!("Synthesis polling was cancelled")),
        None => Err(eyre!("Synthesis polling never started")),
    }
}

async fn cmd_history(controller: &WorkflowController) -> Result<()> {
    debug!("cmd_history: called");
    let records = controller.history().list().await?;
    controller.view().render_history(&records);
    Ok(())
}

async fn cmd_reapply(controller: &WorkflowController, index: usize) -> Result<()> {
    debug!(index, "cmd_reapply: called");
    let inputs = controller.reapply_from_history(index).await?;
    println!("prompt: {}", inputs.prompt);
    println!("genre:  {}", inputs.genre);
    println!("mood:   {}", inputs.mood);
    Ok(())
}

async fn cmd_status(controller: &WorkflowController) -> Result<()> {
    debug!("cmd_status: called");
    let summary = controller.check_api_status().await?;
    println!("lyrics service: {}", summary.lyrics_service);
    println!("audio service:  {}", summary.audio_service);
    if summary.audio_testable {
        println!("{}", "run `sg test-connection` to test the audio service".dimmed());
    }
    if summary.configuration_required {
        println!("{}", "CONFIGURATION REQUIRED".yellow());
    }
    Ok(())
}

async fn cmd_songs(controller: &WorkflowController) -> Result<()> {
    debug!("cmd_songs: called");
    let counts = controller.song_counts().await?;
    if counts.is_empty() {
        println!("No songs");
    }
    for (status, count) in counts {
        println!("{:<12} {}", status, count);
    }
    Ok(())
}
