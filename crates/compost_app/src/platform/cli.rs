use std::path::PathBuf;

use clap::Parser;

use crate::platform::logging::LogDestination;

/// Replays ChatCompost against a saved sidebar snapshot.
#[derive(Debug, Parser)]
#[command(name = "chatcompost")]
#[command(about = "Multi-select and batch-delete conversations in a saved chat sidebar")]
#[command(version)]
pub struct Cli {
    /// HTML snapshot of the chat page
    #[arg(short, long)]
    pub snapshot: PathBuf,

    /// Built-in platform preset (chatgpt, gemini)
    #[arg(short, long)]
    pub platform: Option<String>,

    /// Host name used to detect the platform when no preset is named
    #[arg(long)]
    pub host: Option<String>,

    /// RON file with an adapter and timings
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Conversation identifiers to check before the batch runs
    #[arg(long = "select", value_name = "ID")]
    pub select: Vec<String>,

    /// Print the conversations found in the snapshot and exit
    #[arg(long)]
    pub list: bool,

    /// Backend base URL for direct deletion
    #[arg(long)]
    pub base_url: Option<String>,

    /// Cookie header sent with direct deletion requests
    #[arg(long)]
    pub cookie: Option<String>,

    /// Directory backing the session storage; in-memory when absent
    #[arg(long)]
    pub storage_dir: Option<PathBuf>,

    /// Write the page as it stands after the run
    #[arg(short, long)]
    pub out: Option<PathBuf>,

    /// Answer the confirmation with yes
    #[arg(short, long)]
    pub yes: bool,

    /// Where log output goes
    #[arg(long, value_enum, default_value_t = LogDestination::Terminal)]
    pub log: LogDestination,

    /// Log at debug level
    #[arg(short, long)]
    pub verbose: bool,
}
