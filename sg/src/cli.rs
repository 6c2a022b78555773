//! CLI command definitions and subcommands

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing::debug;

/// SongGen - lyrics to song workflow client
#[derive(Parser)]
#[command(
    name = "sg",
    about = "Generate lyrics, approve them and synthesize songs against a SongGen backend",
    version = env!("CARGO_PKG_VERSION"),
    after_help = generate_after_help(),
)]
pub struct Cli {
    /// Path to config file
    #[arg(short, long, global = true, help = "Path to config file")]
    pub config: Option<PathBuf>,

    /// Log level (TRACE, DEBUG, INFO, WARN, ERROR)
    #[arg(
        short = 'l',
        long = "log-level",
        global = true,
        help = "Log level (TRACE, DEBUG, INFO, WARN, ERROR)"
    )]
    pub log_level: Option<String>,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Command,
}

/// CLI subcommands
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Generate lyrics, optionally carrying them through synthesis
    Generate {
        /// What the song is about
        #[arg(short, long)]
        prompt: String,

        /// Musical genre
        #[arg(short, long)]
        genre: String,

        /// Mood of the song
        #[arg(short, long)]
        mood: String,

        /// Approve the generated lyrics
        #[arg(long)]
        approve: bool,

        /// Submit approved lyrics for audio synthesis (implies --approve)
        #[arg(long)]
        synthesize: bool,

        /// Ask the backend to save the lyrics
        #[arg(long)]
        save: bool,

        /// Wait for synthesis to finish (implies --synthesize)
        #[arg(short, long)]
        wait: bool,
    },

    /// Resume polling a synthesis submitted earlier and wait for it
    Poll {
        /// Content id of the submitted song
        content_id: String,
    },

    /// List recent generations, newest first
    History,

    /// Print the inputs of a past generation
    Reapply {
        /// Position in the history list (0 is newest)
        index: usize,
    },

    /// Show backend service status
    Status,

    /// Show backend song counts per status
    Songs,

    /// Download a finished song
    Download {
        /// Content id of the song
        content_id: String,

        /// Target directory (defaults to the configured download-dir)
        #[arg(short, long)]
        dir: Option<PathBuf>,
    },

    /// Test the audio service connection
    TestConnection,
}

/// Get the log file path
pub fn get_log_path() -> PathBuf {
    debug!("get_log_path: called");
    let path = dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("songgen")
        .join("logs")
        .join("songgen.log");
    debug!(?path, "get_log_path: returning path");
    path
}

/// Generate the after_help text
pub fn generate_after_help() -> String {
    format!("Logs are written to: {}", get_log_path().display())
}
