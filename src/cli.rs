use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Enable verbose logging
    #[arg(short, long)]
    pub verbose: bool,

    /// Configuration file path
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run the HTTP service: accept jobs, process them on the worker pool
    Serve {
        /// Override the configured bind address
        #[arg(short, long)]
        bind: Option<String>,
    },

    /// Process a single video URL and print the result manifest as JSON
    Process {
        /// Source video URL
        url: String,

        /// Target languages for translation (comma-separated)
        #[arg(short, long, default_value = "es")]
        languages: String,

        /// Generate subtitle files
        #[arg(long)]
        subtitles: bool,

        /// Generate dubbed video output
        #[arg(long)]
        dub: bool,

        /// Keep the original audio under the dub at reduced level
        #[arg(long)]
        preserve_original: bool,

        /// Output directory root (a job-id subdirectory is created inside)
        #[arg(short, long)]
        output_dir: Option<PathBuf>,
    },
}

impl Commands {
    /// Split a comma-separated language list into codes.
    pub fn parse_languages(raw: &str) -> Vec<String> {
        raw.split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect()
    }
}
