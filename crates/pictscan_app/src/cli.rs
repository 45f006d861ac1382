use std::path::PathBuf;

use clap::{Parser, ValueEnum};
use pictscan_logging::LogDestination;

#[derive(Parser, Debug)]
#[command(
    name = "pictscan",
    about = "Find pages whose <picture> mixes unsized <source>s with a custom <img sizes>"
)]
pub struct Cli {
    /// JSON array of records with a `page` url field.
    #[arg(long, env = "PICTSCAN_INPUT", default_value = "pages.json")]
    pub input: PathBuf,

    /// Directory for pass-1-found.json and pass-1-errors.json.
    #[arg(long, env = "PICTSCAN_OUTPUT_DIR")]
    pub output_dir: Option<PathBuf>,

    /// Optional RON file overriding scan settings.
    #[arg(long, env = "PICTSCAN_CONFIG")]
    pub config: Option<PathBuf>,

    /// Number of work groups (concurrent workers).
    #[arg(long, env = "PICTSCAN_GROUPS")]
    pub groups: Option<usize>,

    /// Where log output goes.
    #[arg(long, value_enum, default_value_t = LogTarget::Terminal)]
    pub log: LogTarget,

    /// Log at debug level.
    #[arg(short, long, default_value_t = false)]
    pub verbose: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum LogTarget {
    Terminal,
    File,
    Both,
}

impl From<LogTarget> for LogDestination {
    fn from(target: LogTarget) -> Self {
        match target {
            LogTarget::Terminal => LogDestination::Terminal,
            LogTarget::File => LogDestination::File,
            LogTarget::Both => LogDestination::Both,
        }
    }
}
