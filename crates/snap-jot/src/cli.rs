use crate::config::PolicyKind;

use std::path::PathBuf;

use clap::Parser;

/// Record the default microphone as an ordered list of chunks.
#[derive(Parser, Debug, Default)]
#[command(name = "snap-jot", version, about)]
pub struct Cli {
    /// Config file to use instead of the per-user one
    #[arg(short, long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Chunking policy
    #[arg(short, long, value_enum)]
    pub policy: Option<PolicyKind>,

    /// Seconds between two captured slices
    #[arg(short = 'i', long, value_name = "SECS")]
    pub slice_interval: Option<f64>,

    /// Slices per segment for the grouped policy
    #[arg(short = 'n', long, value_name = "N")]
    pub slices_per_segment: Option<usize>,

    /// Write the effective configuration back to the config file
    #[arg(long)]
    pub save_config: bool,
}
