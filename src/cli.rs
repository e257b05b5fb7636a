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
    /// Remove lines that are wrapped in brackets or parentheses
    Strip {
        /// Input directory containing the SRT files
        #[arg(short, long, default_value = ".")]
        input: PathBuf,

        /// Output directory for the processed SRT files
        #[arg(short, long, default_value = "output")]
        output: PathBuf,

        /// Show what would be written without writing anything
        #[arg(long)]
        dry_run: bool,
    },

    /// Merge subtitle files with videos using mkvmerge
    Merge {
        /// Folder containing video and subtitle files
        #[arg(short, long, default_value = ".")]
        input: PathBuf,

        /// Folder to save merged output files (default: same as input)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Character encoding of subtitle files
        #[arg(long)]
        charset: Option<String>,

        /// Language tag for the subtitle track
        #[arg(short, long)]
        language: Option<String>,

        /// Log the mkvmerge commands without running them
        #[arg(long)]
        dry_run: bool,
    },

    /// Translate SRT subtitle files using a chat-completion API
    Translate {
        /// Input directory containing SRT files
        #[arg(short, long, default_value = ".")]
        input: PathBuf,

        /// Output directory for translated SRT files
        #[arg(short, long, default_value = "output")]
        output: PathBuf,

        /// Original language of the SRT files
        #[arg(long)]
        source_language: Option<String>,

        /// Desired language of the translated SRT files
        #[arg(long)]
        target_language: Option<String>,

        /// Model to use for translation
        #[arg(short, long)]
        model: Option<String>,

        /// Parse and chunk the files without calling the API
        #[arg(long)]
        dry_run: bool,
    },
}
