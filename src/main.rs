//! srtkit - Batch utilities for SRT subtitles
//!
//! Entry point: parses arguments, sets up logging, loads configuration
//! and runs the requested command over a directory of files.

use anyhow::Result;
use clap::Parser;
use std::path::{Path, PathBuf};
use tracing::{info, Level, Subscriber};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::{non_blocking, rolling};
use tracing_subscriber::registry::LookupSpan;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

use srtkit::cli::{Args, Commands};
use srtkit::config::Config;
use srtkit::error::SrtError;
use srtkit::workflow::Workflow;

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    let mut config = load_config(args.config.as_deref())?;

    // The merge command also keeps a log next to its output, so its input
    // has to be checked before that log is opened
    let command_log = match &args.command {
        Commands::Merge { input, output, dry_run, .. } => {
            let output = merge_output_dir(input, output.as_deref())?;
            (!dry_run).then_some(output)
        }
        _ => None,
    };

    let _guards = setup_logging(args.verbose, command_log.as_deref(), &config.media.log_file)?;

    match args.command {
        Commands::Strip { input, output, dry_run } => {
            info!("Stripping bracketed text: {} -> {}", input.display(), output.display());

            let workflow = Workflow::new(config);
            workflow.strip_directory(&input, &output, dry_run).await?;
        }
        Commands::Merge { input, output, charset, language, dry_run } => {
            if let Some(charset) = charset {
                config.media.charset = charset;
            }
            if let Some(language) = language {
                config.media.subtitle_language = language;
            }
            let output = merge_output_dir(&input, output.as_deref())?;

            let workflow = Workflow::new(config);
            workflow.merge_directory(&input, &output, dry_run).await?;
        }
        Commands::Translate { input, output, source_language, target_language, model, dry_run } => {
            if let Some(source_language) = source_language {
                config.translate.source_language = source_language;
            }
            if let Some(target_language) = target_language {
                config.translate.target_language = target_language;
            }
            if let Some(model) = model {
                config.translate.model = model;
            }
            info!(
                "Translating subtitles from {} to {} with {}",
                config.translate.source_language, config.translate.target_language, config.translate.model
            );

            let workflow = Workflow::new(config);
            workflow.translate_directory(&input, &output, dry_run).await?;
        }
    }

    Ok(())
}

/// Load the config given on the command line, else `srtkit.toml` in the
/// current directory, else the defaults
fn load_config(path: Option<&Path>) -> Result<Config> {
    let config = match path {
        Some(config_path) => Config::from_file(config_path)?,
        None => {
            let local = Path::new("srtkit.toml");
            if local.exists() {
                Config::from_file(local)?
            } else {
                Config::default()
            }
        }
    };
    Ok(config)
}

/// Output folder of a merge run. Defaults to the input folder, which must exist
fn merge_output_dir(input: &Path, output: Option<&Path>) -> Result<PathBuf> {
    if !input.is_dir() {
        return Err(SrtError::FileNotFound(format!(
            "Input directory '{}' not found or is not a directory",
            input.display()
        ))
        .into());
    }
    Ok(output.unwrap_or(input).to_path_buf())
}

/// Setup logging to the console, a daily log file and optionally a
/// per-command log file in `command_log_dir`.
///
/// The returned guards flush the file writers when dropped.
fn setup_logging(
    verbose: bool,
    command_log_dir: Option<&Path>,
    command_log_file: &str,
) -> Result<Vec<WorkerGuard>> {
    let log_dir = std::env::current_dir()?.join(".srtkit").join("log");
    std::fs::create_dir_all(&log_dir)?;

    let mut guards = Vec::new();
    let (non_blocking_file, guard) = non_blocking(rolling::daily(&log_dir, "srtkit.log"));
    guards.push(guard);

    let log_level = if verbose { Level::DEBUG } else { Level::INFO };

    let console_layer = fmt::layer()
        .with_target(false)
        .with_file(verbose)
        .with_line_number(verbose);

    let file_layer = fmt::layer()
        .with_writer(non_blocking_file)
        .with_target(false)
        .with_thread_ids(true)
        .with_file(true)
        .with_line_number(true)
        .with_ansi(false);

    let command_layer = match command_log_dir {
        Some(dir) => {
            let (layer, guard) = command_log_layer(dir, command_log_file)?;
            guards.push(guard);
            Some(layer)
        }
        None => None,
    };

    tracing_subscriber::registry()
        .with(EnvFilter::from_default_env().add_directive(log_level.into()))
        .with(console_layer)
        .with(file_layer)
        .with(command_layer)
        .try_init()
        .map_err(|e| anyhow::anyhow!("Failed to initialize logging: {}", e))?;

    let command_log: Option<PathBuf> = command_log_dir.map(|dir| dir.join(command_log_file));
    info!(
        "Logging initialized - console: {}, file: {}{}",
        log_level,
        log_dir.join("srtkit.log").display(),
        command_log
            .map(|p| format!(", command log: {}", p.display()))
            .unwrap_or_default()
    );

    Ok(guards)
}

/// Plain-text layer appending to `<dir>/<file_name>`, creating `dir` if needed
fn command_log_layer<S>(
    dir: &Path,
    file_name: &str,
) -> Result<(Box<dyn Layer<S> + Send + Sync>, WorkerGuard)>
where
    S: Subscriber + for<'a> LookupSpan<'a> + 'static,
{
    std::fs::create_dir_all(dir)?;
    let (writer, guard) = non_blocking(rolling::never(dir, file_name));
    let layer = fmt::layer()
        .with_writer(writer)
        .with_target(false)
        .with_ansi(false)
        .boxed();
    Ok((layer, guard))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;
    use tracing_subscriber::Registry;

    #[test]
    fn test_merge_output_defaults_to_input() {
        let temp = TempDir::new().unwrap();
        let output = merge_output_dir(temp.path(), None).unwrap();
        assert_eq!(output, temp.path());

        let explicit = temp.path().join("out");
        let output = merge_output_dir(temp.path(), Some(explicit.as_path())).unwrap();
        assert_eq!(output, explicit);
    }

    #[test]
    fn test_merge_missing_input_creates_nothing() {
        let temp = TempDir::new().unwrap();
        let typo = temp.path().join("typo_dir");

        let err = merge_output_dir(&typo, None).unwrap_err();
        assert!(matches!(err.downcast_ref::<SrtError>(), Some(SrtError::FileNotFound(_))));
        assert!(!typo.exists());
    }

    #[tokio::test]
    async fn test_merge_log_receives_completion_line() {
        let temp = TempDir::new().unwrap();
        let input = temp.path().join("videos");
        std::fs::create_dir(&input).unwrap();
        std::fs::write(input.join("ep1.mp4"), "").unwrap();
        let output = temp.path().join("merged");

        let mut config = Config::default();
        config.media.binary_path = temp.path().join("no-mkvmerge").display().to_string();

        let (layer, guard) =
            command_log_layer::<Registry>(&output, &config.media.log_file).unwrap();
        let subscriber = tracing_subscriber::registry().with(layer);
        let default = tracing::subscriber::set_default(subscriber);

        let log_path = output.join(&config.media.log_file);
        let summary = Workflow::new(config)
            .merge_directory(&input, &output, false)
            .await
            .unwrap();
        assert_eq!(summary.skipped, 1);

        drop(default);
        drop(guard);

        let log = std::fs::read_to_string(log_path).unwrap();
        assert!(log.contains("No corresponding SRT file found for: ep1.mp4"));
        assert!(log.contains("Subtitle merge process completed: 0 processed, 1 skipped, 0 failed"));
    }
}
