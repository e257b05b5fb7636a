use futures::future::join_all;
use futures::stream::{self, StreamExt};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::fs;
use tracing::{error, info, warn};

use crate::config::TranslateConfig;
use crate::error::{Result, SrtError};
use crate::subtitle::{chunk_subtitles_as_text, parse_srt_file};
use super::{ChatCompletion, SYSTEM_PROMPT, build_translation_prompt, clean_translation_response, preview};

/// What happened to one input file
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FileOutcome {
    /// Output written; some chunks may have been dropped
    Written {
        path: PathBuf,
        translated_chunks: usize,
        total_chunks: usize,
    },
    /// The input held no valid subtitle blocks
    NoSubtitles,
    /// Every chunk failed, nothing was written
    AllChunksFailed { total_chunks: usize },
}

/// Chunked subtitle translation on top of a chat client
pub struct SubtitleTranslator {
    client: Arc<dyn ChatCompletion>,
    config: TranslateConfig,
}

impl SubtitleTranslator {
    pub fn new(client: Arc<dyn ChatCompletion>, config: TranslateConfig) -> Self {
        Self { client, config }
    }

    /// Translate one chunk, retrying transport and API errors with linear backoff.
    ///
    /// Returns `None` when the chunk could not be translated; the caller drops it.
    pub async fn translate_chunk(
        &self,
        chunk_text: &str,
        source_language: &str,
        target_language: &str,
    ) -> Option<String> {
        let prompt = build_translation_prompt(chunk_text, source_language, target_language);
        let attempts = self.config.max_retries.max(1);

        for attempt in 1..=attempts {
            match self.client.complete(SYSTEM_PROMPT, &prompt).await {
                Ok(raw) => match clean_translation_response(&raw) {
                    Some(translated) => return Some(translated),
                    None => {
                        warn!(
                            "Received malformed translation for chunk. Attempt {}/{}. Content: {}",
                            attempt,
                            attempts,
                            preview(&raw, 100)
                        );
                    }
                },
                Err(e) if e.is_retryable() => {
                    warn!("API error on attempt {}/{}: {}", attempt, attempts, e);
                    if attempt < attempts {
                        tokio::time::sleep(self.config.retry_delay() * attempt).await;
                    } else {
                        error!("Failed to translate chunk after {} attempts", attempts);
                    }
                }
                Err(e) => {
                    error!("Unexpected error during translation: {}", e);
                    return None;
                }
            }
        }

        None
    }

    /// Translate all chunks concurrently, keeping results in input order
    pub async fn translate_chunks(
        &self,
        chunks: &[String],
        source_language: &str,
        target_language: &str,
    ) -> Vec<Option<String>> {
        let tasks = chunks
            .iter()
            .map(|chunk| self.translate_chunk(chunk, source_language, target_language));

        match self.config.max_concurrent_requests {
            Some(limit) => stream::iter(tasks).buffered(limit.max(1)).collect().await,
            None => join_all(tasks).await,
        }
    }

    /// Path of the translated file for an input file
    pub fn output_path(&self, input: &Path, output_dir: &Path) -> PathBuf {
        let stem = input
            .file_stem()
            .map(|s| s.to_string_lossy().to_string())
            .unwrap_or_default();
        output_dir.join(format!("{}{}.srt", stem, self.config.output_suffix))
    }

    /// Parse, chunk, translate and write a single SRT file
    pub async fn translate_file(
        &self,
        input: &Path,
        output_dir: &Path,
        source_language: &str,
        target_language: &str,
    ) -> Result<FileOutcome> {
        if !input.exists() {
            return Err(SrtError::FileNotFound(input.display().to_string()));
        }

        info!("Processing SRT file: {}", input.display());
        let subtitles = parse_srt_file(input).await?;
        if subtitles.is_empty() {
            warn!("No valid subtitles found in {}. Skipping.", input.display());
            return Ok(FileOutcome::NoSubtitles);
        }

        let chunks = chunk_subtitles_as_text(&subtitles, self.config.chunk_size);
        let total_chunks = chunks.len();
        info!("Subtitle count: {}, Chunks: {}", subtitles.len(), total_chunks);

        let translated: Vec<String> = self
            .translate_chunks(&chunks, source_language, target_language)
            .await
            .into_iter()
            .flatten()
            .collect();

        if translated.is_empty() {
            error!(
                "No chunks were successfully translated for {}. Output file will not be created.",
                input.display()
            );
            return Ok(FileOutcome::AllChunksFailed { total_chunks });
        }

        if translated.len() != total_chunks {
            warn!(
                "File {}: Only {} out of {} chunks were successfully translated.",
                input.display(),
                translated.len(),
                total_chunks
            );
        }

        let mut content = translated.join("\n\n");
        if !content.ends_with('\n') {
            content.push('\n');
        }

        let output_path = self.output_path(input, output_dir);
        fs::write(&output_path, content).await?;
        info!("Successfully wrote translated subtitles to: {}", output_path.display());

        Ok(FileOutcome::Written {
            path: output_path,
            translated_chunks: translated.len(),
            total_chunks,
        })
    }
}
