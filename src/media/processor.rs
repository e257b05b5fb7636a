use async_trait::async_trait;
use std::path::Path;
use tracing::{debug, info};

use crate::config::MediaConfig;
use crate::error::{Result, SrtError};
use super::{MediaProcessorTrait, MkvMergeCommandBuilder};

/// mkvmerge-backed media processor
pub struct MediaProcessorImpl {
    config: MediaConfig,
    command_builder: MkvMergeCommandBuilder,
}

impl MediaProcessorImpl {
    pub fn new(config: MediaConfig) -> Self {
        let command_builder = MkvMergeCommandBuilder::new(&config.binary_path);

        Self {
            config,
            command_builder,
        }
    }
}

#[async_trait]
impl MediaProcessorTrait for MediaProcessorImpl {
    async fn merge_subtitles(
        &self,
        video_path: &Path,
        subtitle_path: &Path,
        output_path: &Path,
        language: &str,
        charset: &str,
    ) -> Result<()> {
        info!(
            "Merging {} with {} -> {}",
            video_path.display(),
            subtitle_path.display(),
            output_path.display()
        );

        self.command_builder
            .merge_subtitles(video_path, subtitle_path, output_path, language, charset)
            .execute()
            .await
    }

    async fn get_version_info(&self) -> Result<String> {
        debug!("Getting {} version information", self.config.binary_path);

        let stdout = self
            .command_builder
            .version_check()
            .execute_with_output()
            .await
            .map_err(|e| SrtError::Media(format!("{} not available: {}", self.config.binary_path, e)))?;

        Ok(stdout.lines().next().unwrap_or("Unknown version").trim().to_string())
    }
}
