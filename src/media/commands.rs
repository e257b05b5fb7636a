use std::path::Path;
use tokio::process::Command;
use tracing::debug;

use crate::error::{Result, SrtError};

/// External muxing command representation
#[derive(Debug, Clone)]
pub struct MediaCommand {
    pub binary_path: String,
    pub args: Vec<String>,
    pub description: String,
}

impl MediaCommand {
    /// Create a new media processing command
    pub fn new<S1: Into<String>, S2: Into<String>>(binary_path: S1, description: S2) -> Self {
        Self {
            binary_path: binary_path.into(),
            args: Vec::new(),
            description: description.into(),
        }
    }

    /// Add an argument
    pub fn arg<S: Into<String>>(mut self, arg: S) -> Self {
        self.args.push(arg.into());
        self
    }

    /// Add a file path as a positional argument
    pub fn file<P: AsRef<Path>>(self, path: P) -> Self {
        self.arg(path.as_ref().to_string_lossy().to_string())
    }

    /// Set output file (`-o <path>`)
    pub fn output<P: AsRef<Path>>(self, path: P) -> Self {
        self.arg("-o").file(path)
    }

    /// Set the language of a track in the next input file
    pub fn track_language<S: AsRef<str>>(self, track_id: u32, language: S) -> Self {
        self.arg("--language")
            .arg(format!("{}:{}", track_id, language.as_ref()))
    }

    /// Set the character set of a subtitle track in the next input file
    pub fn sub_charset<S: AsRef<str>>(self, track_id: u32, charset: S) -> Self {
        self.arg("--sub-charset")
            .arg(format!("{}:{}", track_id, charset.as_ref()))
    }

    /// Render the command line for logging
    pub fn display_command(&self) -> String {
        std::iter::once(self.binary_path.as_str())
            .chain(self.args.iter().map(String::as_str))
            .map(|part| {
                if part.is_empty() || part.contains(char::is_whitespace) {
                    format!("\"{}\"", part)
                } else {
                    part.to_string()
                }
            })
            .collect::<Vec<_>>()
            .join(" ")
    }

    /// Execute the command
    pub async fn execute(&self) -> Result<()> {
        self.execute_with_output().await.map(|_| ())
    }

    /// Execute the command and return what it printed on stdout
    pub async fn execute_with_output(&self) -> Result<String> {
        debug!("Executing media command: {}", self.display_command());
        debug!("Description: {}", self.description);

        let output = Command::new(&self.binary_path)
            .args(&self.args)
            .output()
            .await
            .map_err(|e| SrtError::Media(format!("Failed to execute {}: {}", self.binary_path, e)))?;

        let stdout = String::from_utf8_lossy(&output.stdout);
        if !output.status.success() {
            // mkvmerge reports most errors on stdout
            let stderr = String::from_utf8_lossy(&output.stderr);
            let detail = if stderr.trim().is_empty() { &stdout } else { &stderr };
            return Err(SrtError::Media(format!(
                "{} failed ({}): {}",
                self.description,
                output.status,
                detail.trim()
            )));
        }

        Ok(stdout.into_owned())
    }
}

/// Builder for mkvmerge invocations
pub struct MkvMergeCommandBuilder {
    binary_path: String,
}

impl MkvMergeCommandBuilder {
    pub fn new<S: Into<String>>(binary_path: S) -> Self {
        Self {
            binary_path: binary_path.into(),
        }
    }

    /// Build the command muxing a video and one SRT file into a Matroska file.
    ///
    /// mkvmerge options apply to the file that follows them, so the subtitle
    /// track options come before the SRT path.
    pub fn merge_subtitles<P: AsRef<Path>>(
        &self,
        video_path: P,
        subtitle_path: P,
        output_path: P,
        language: &str,
        charset: &str,
    ) -> MediaCommand {
        MediaCommand::new(&self.binary_path, "Subtitle merge")
            .output(output_path)
            .file(video_path)
            .track_language(0, language)
            .sub_charset(0, charset)
            .file(subtitle_path)
    }

    /// Build version check command
    pub fn version_check(&self) -> MediaCommand {
        MediaCommand::new(&self.binary_path, "Version check").arg("--version")
    }
}
