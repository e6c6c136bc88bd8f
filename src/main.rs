//! Polydub - Video Translation and Dubbing Pipeline
//!
//! This is the main entry point for the Polydub service, which fetches a
//! video, transcribes its audio, translates the transcript per target
//! language, and produces subtitle and dubbed-video artifacts using yt-dlp,
//! whisper, an LLM translation service, and ffmpeg.

use anyhow::Result;
use clap::Parser;
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};
use tracing_appender::{non_blocking, rolling};

use polydub::cli::{Args, Commands};
use polydub::config::Config;
use polydub::job::{Job, JobFlags, JobRequest};
use polydub::jobs::JobManager;
use polydub::server::{self, AppState};
use polydub::workflow::Pipeline;

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let _log_guard = setup_logging(args.verbose)?;

    // Load configuration: explicit path, then ./config.toml, then defaults.
    let mut config = match &args.config {
        Some(config_path) => Config::from_file(config_path)?,
        None => {
            if std::path::Path::new("config.toml").exists() {
                info!("Found config.toml in current directory, loading...");
                Config::from_file("config.toml")?
            } else {
                Config::default()
            }
        }
    };

    match args.command {
        Commands::Serve { bind } => {
            if let Some(bind) = bind {
                config.server.bind_addr = bind;
            }

            let pipeline = Pipeline::from_config(&config)?;
            let manager = Arc::new(JobManager::new(pipeline, &config.jobs));

            tokio::fs::create_dir_all(&config.jobs.output_root).await?;

            info!("Starting Polydub service");
            server::serve(&config.server, AppState { manager }).await?;
        }
        Commands::Process {
            url,
            languages,
            subtitles,
            dub,
            preserve_original,
            output_dir,
        } => {
            if let Some(dir) = output_dir {
                config.jobs.output_root = dir;
            }

            let request = JobRequest {
                source_url: url,
                languages: Commands::parse_languages(&languages),
                flags: JobFlags {
                    subtitles,
                    dubbed: dub,
                    preserve_original,
                },
            };

            let pipeline = Pipeline::from_config(&config)?;
            let job = Job::new(request, &config.jobs.output_root);

            info!("Processing job {} into {}", job.id, job.output_dir.display());
            let result = pipeline.run(&job).await?;

            println!("{}", serde_json::to_string_pretty(&result)?);
        }
    }

    Ok(())
}

/// Log to console and a daily rolling file under logs/.
fn setup_logging(verbose: bool) -> Result<non_blocking::WorkerGuard> {
    let file_appender = rolling::daily("logs", "polydub.log");
    let (file_writer, guard) = non_blocking(file_appender);

    let default_filter = if verbose { "debug" } else { "info" };
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt::layer())
        .with(fmt::layer().with_writer(file_writer).with_ansi(false))
        .try_init()?;

    Ok(guard)
}
