use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

use crate::error::{Result, SrtError};

// Default values for fields older config files may not carry
fn default_chunk_size() -> usize {
    50
}

fn default_output_suffix() -> String {
    "_out".to_string()
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub translate: TranslateConfig,
    pub media: MediaConfig,
    pub strip: StripConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TranslateConfig {
    /// Base URL of the chat-completion API (without `/chat/completions`)
    pub endpoint: String,
    /// Name of the environment variable holding the API key
    pub api_key_env: String,
    /// Model to use for translation
    pub model: String,
    /// Sampling temperature; kept low for deterministic output
    pub temperature: f32,
    /// Number of subtitle blocks sent per request
    #[serde(default = "default_chunk_size")]
    pub chunk_size: usize,
    /// Attempts per chunk before it is dropped
    pub max_retries: u32,
    /// Base delay between attempts, multiplied by the attempt number
    pub retry_delay_secs: u64,
    /// HTTP request timeout
    pub timeout_secs: u64,
    /// Upper bound on in-flight requests per file; unbounded when unset
    pub max_concurrent_requests: Option<usize>,
    /// Language the input subtitles are written in
    pub source_language: String,
    /// Language to translate into
    pub target_language: String,
    /// Appended to the input file stem to name the translated file
    #[serde(default = "default_output_suffix")]
    pub output_suffix: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MediaConfig {
    /// Path to mkvmerge binary
    pub binary_path: String,
    /// Video file extensions picked up by the merge command (case-insensitive)
    pub video_extensions: Vec<String>,
    /// Language tag written for the subtitle track
    pub subtitle_language: String,
    /// Character set of the subtitle files
    pub charset: String,
    /// Appended to the video file stem to name the merged file
    pub output_suffix: String,
    /// Log file written into the merge output folder
    pub log_file: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StripConfig {
    /// Regex matching the annotations to remove from caption text
    pub pattern: String,
}

impl Default for TranslateConfig {
    fn default() -> Self {
        Self {
            endpoint: "https://api.openai.com/v1".to_string(),
            api_key_env: "OPENAI_API_KEY".to_string(),
            model: "gpt-4o-mini".to_string(),
            temperature: 0.2,
            chunk_size: default_chunk_size(),
            max_retries: 3,
            retry_delay_secs: 5,
            timeout_secs: 300,
            max_concurrent_requests: None,
            source_language: "English".to_string(),
            target_language: "Romanian".to_string(),
            output_suffix: default_output_suffix(),
        }
    }
}

impl Default for MediaConfig {
    fn default() -> Self {
        Self {
            binary_path: "mkvmerge".to_string(),
            video_extensions: vec!["mp4".to_string(), "mkv".to_string()],
            subtitle_language: "ro".to_string(),
            charset: "UTF-8".to_string(),
            output_suffix: "-merged".to_string(),
            log_file: "merge_log.txt".to_string(),
        }
    }
}

impl Default for StripConfig {
    fn default() -> Self {
        Self {
            pattern: r"\[.*?\]|\(.*?\)".to_string(),
        }
    }
}

impl TranslateConfig {
    pub fn retry_delay(&self) -> Duration {
        Duration::from_secs(self.retry_delay_secs)
    }

    /// Read the API key from the configured environment variable
    pub fn api_key(&self) -> Result<String> {
        match std::env::var(&self.api_key_env) {
            Ok(key) if !key.trim().is_empty() => Ok(key),
            _ => Err(SrtError::Config(format!(
                "API key not found: set the {} environment variable",
                self.api_key_env
            ))),
        }
    }
}

impl Config {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| SrtError::Config(format!("Failed to read config file: {}", e)))?;

        Ok(toml::from_str(&content)?)
    }
}
