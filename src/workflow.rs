use futures::future::join_all;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::fs;
use tracing::{error, info, warn};
use walkdir::WalkDir;

use crate::brackets::BracketStripper;
use crate::config::Config;
use crate::error::{Result, SrtError};
use crate::media::{MediaProcessorFactory, MediaProcessorTrait, MkvMergeCommandBuilder};
use crate::subtitle::{chunk_subtitles_as_text, parse_srt_file, write_srt};
use crate::translate::{ChatClientFactory, ChatCompletion, FileOutcome, SubtitleTranslator};

/// Per-run file counts
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub processed: usize,
    pub skipped: usize,
    pub failed: usize,
}

impl fmt::Display for RunSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} processed, {} skipped, {} failed",
            self.processed, self.skipped, self.failed
        )
    }
}

pub struct Workflow {
    config: Config,
    media: Box<dyn MediaProcessorTrait>,
    chat: Option<Arc<dyn ChatCompletion>>,
}

impl Workflow {
    pub fn new(config: Config) -> Self {
        let media = MediaProcessorFactory::create_processor(config.media.clone());

        Self {
            config,
            media,
            chat: None,
        }
    }

    /// Replace the media processor
    pub fn with_media_processor(mut self, media: Box<dyn MediaProcessorTrait>) -> Self {
        self.media = media;
        self
    }

    /// Use an existing chat client instead of building one from the environment
    pub fn with_chat_client(mut self, chat: Arc<dyn ChatCompletion>) -> Self {
        self.chat = Some(chat);
        self
    }

    /// Remove bracketed annotations from every SRT file in a directory
    pub async fn strip_directory<P: AsRef<Path>, Q: AsRef<Path>>(
        &self,
        input_dir: P,
        output_dir: Q,
        dry_run: bool,
    ) -> Result<RunSummary> {
        let input_dir = input_dir.as_ref();
        let output_dir = output_dir.as_ref();
        info!("Stripping annotations from SRT files in: {}", input_dir.display());

        let stripper = BracketStripper::new(&self.config.strip)?;
        let srt_files = list_files(input_dir, &["srt"])?;
        prepare_output_dir(output_dir, dry_run).await?;

        let mut summary = RunSummary::default();

        for input_path in srt_files {
            let subtitles = match parse_srt_file(&input_path).await {
                Ok(subtitles) => subtitles,
                Err(e) => {
                    error!("Error reading file {}: {}", input_path.display(), e);
                    summary.failed += 1;
                    continue;
                }
            };

            let total = subtitles.len();
            let stripped = stripper.strip_subtitles(subtitles);
            let kept = stripped.iter().filter(|s| !s.text.is_empty()).count();
            let output_path = output_dir.join(file_name(&input_path));

            if dry_run {
                info!(
                    "[dry-run] {}: {} of {} subtitles kept -> {}",
                    input_path.display(),
                    kept,
                    total,
                    output_path.display()
                );
                summary.processed += 1;
                continue;
            }

            match write_srt(&stripped, &output_path).await {
                Ok(()) => summary.processed += 1,
                Err(e) => {
                    error!("An error occurred while writing to '{}': {}", output_path.display(), e);
                    summary.failed += 1;
                }
            }
        }

        info!("Finished processing SRT files: {}", summary);
        Ok(summary)
    }

    /// Mux every video in a directory with its same-named SRT file
    pub async fn merge_directory<P: AsRef<Path>, Q: AsRef<Path>>(
        &self,
        input_dir: P,
        output_dir: Q,
        dry_run: bool,
    ) -> Result<RunSummary> {
        let input_dir = input_dir.as_ref();
        let output_dir = output_dir.as_ref();
        let media = &self.config.media;
        info!("Starting subtitle merge in: {}", input_dir.display());

        let extensions: Vec<&str> = media.video_extensions.iter().map(String::as_str).collect();
        let videos = list_files(input_dir, &extensions)?;
        prepare_output_dir(output_dir, dry_run).await?;

        if !dry_run {
            match self.media.get_version_info().await {
                Ok(version) => info!("Using {}", version),
                Err(e) => warn!("{}", e),
            }
        }

        let mut summary = RunSummary::default();

        for video_path in videos {
            let stem = file_stem(&video_path);
            let video_name = file_name(&video_path);
            let srt_name = format!("{}.srt", stem);
            let srt_path = input_dir.join(&srt_name);

            if !srt_path.is_file() {
                warn!("No corresponding SRT file found for: {}", video_name);
                summary.skipped += 1;
                continue;
            }

            let output_name = format!("{}{}.mkv", stem, media.output_suffix);
            let output_path = output_dir.join(&output_name);

            if dry_run {
                let command = MkvMergeCommandBuilder::new(&media.binary_path).merge_subtitles(
                    video_path.as_path(),
                    srt_path.as_path(),
                    output_path.as_path(),
                    &media.subtitle_language,
                    &media.charset,
                );
                info!("[dry-run] {}", command.display_command());
                summary.processed += 1;
                continue;
            }

            match self
                .media
                .merge_subtitles(&video_path, &srt_path, &output_path, &media.subtitle_language, &media.charset)
                .await
            {
                Ok(()) => {
                    info!("Successfully merged: {} with {} -> {}", video_name, srt_name, output_name);
                    summary.processed += 1;
                }
                Err(e) => {
                    error!("Failed to merge {} with {}. Error: {}", video_name, srt_name, e);
                    summary.failed += 1;
                }
            }
        }

        info!("Subtitle merge process completed: {}", summary);
        Ok(summary)
    }

    /// Translate every SRT file in a directory concurrently
    pub async fn translate_directory<P: AsRef<Path>, Q: AsRef<Path>>(
        &self,
        input_dir: P,
        output_dir: Q,
        dry_run: bool,
    ) -> Result<RunSummary> {
        let input_dir = input_dir.as_ref();
        let output_dir = output_dir.as_ref();
        let translate = &self.config.translate;

        let srt_files = list_files(input_dir, &["srt"])?;

        if srt_files.is_empty() {
            info!("No SRT files found in the input directory '{}'.", input_dir.display());
            return Ok(RunSummary::default());
        }

        info!("Found {} SRT files to process.", srt_files.len());

        if dry_run {
            return Ok(self.translate_dry_run(&srt_files).await);
        }

        // A missing API key is fatal before anything is written
        let chat = match &self.chat {
            Some(chat) => chat.clone(),
            None => ChatClientFactory::create_client(translate)?,
        };
        prepare_output_dir(output_dir, false).await?;

        let translator = SubtitleTranslator::new(chat, translate.clone());

        let tasks = srt_files.iter().map(|path| {
            translator.translate_file(path, output_dir, &translate.source_language, &translate.target_language)
        });
        let results = join_all(tasks).await;

        let mut summary = RunSummary::default();
        for (path, result) in srt_files.iter().zip(results) {
            match result {
                Ok(FileOutcome::Written { .. }) => summary.processed += 1,
                Ok(FileOutcome::NoSubtitles) => summary.skipped += 1,
                Ok(FileOutcome::AllChunksFailed { .. }) => summary.failed += 1,
                Err(e) => {
                    error!("Failed to translate {}: {}", path.display(), e);
                    summary.failed += 1;
                }
            }
        }

        info!("Processing complete: {}", summary);
        Ok(summary)
    }

    async fn translate_dry_run(&self, srt_files: &[PathBuf]) -> RunSummary {
        let translate = &self.config.translate;
        let mut summary = RunSummary::default();

        for path in srt_files {
            match parse_srt_file(path).await {
                Ok(subtitles) if subtitles.is_empty() => {
                    warn!("No valid subtitles found in {}. Skipping.", path.display());
                    summary.skipped += 1;
                }
                Ok(subtitles) => {
                    let chunks = chunk_subtitles_as_text(&subtitles, translate.chunk_size);
                    info!(
                        "[dry-run] {}: {} subtitles in {} chunks, {} -> {} with {}",
                        path.display(),
                        subtitles.len(),
                        chunks.len(),
                        translate.source_language,
                        translate.target_language,
                        translate.model
                    );
                    summary.processed += 1;
                }
                Err(e) => {
                    error!("Error reading file {}: {}", path.display(), e);
                    summary.failed += 1;
                }
            }
        }

        summary
    }
}

/// Regular files directly inside `dir` whose extension matches one of
/// `extensions` case-insensitively, sorted by file name
pub fn list_files(dir: &Path, extensions: &[&str]) -> Result<Vec<PathBuf>> {
    if !dir.is_dir() {
        return Err(SrtError::FileNotFound(format!(
            "Input directory '{}' not found or is not a directory",
            dir.display()
        )));
    }

    let mut files = Vec::new();
    for entry in WalkDir::new(dir)
        .min_depth(1)
        .max_depth(1)
        .follow_links(true)
        .sort_by_file_name()
    {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                warn!("Skipping unreadable entry in {}: {}", dir.display(), e);
                continue;
            }
        };

        if !entry.file_type().is_file() {
            continue;
        }

        let matches = entry
            .path()
            .extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| extensions.iter().any(|wanted| wanted.eq_ignore_ascii_case(ext)))
            .unwrap_or(false);

        if matches {
            files.push(entry.into_path());
        }
    }

    Ok(files)
}

async fn prepare_output_dir(output_dir: &Path, dry_run: bool) -> Result<()> {
    if output_dir.is_dir() || dry_run {
        return Ok(());
    }

    fs::create_dir_all(output_dir).await.map_err(|e| {
        SrtError::Config(format!(
            "Failed to create output directory '{}': {}",
            output_dir.display(),
            e
        ))
    })?;
    info!("Created output folder: {}", output_dir.display());
    Ok(())
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_default()
}

fn file_stem(path: &Path) -> String {
    path.file_stem()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockall::predicate::always;
    use crate::media::MockMediaProcessorTrait;
    use crate::subtitle::parse_srt;
    use crate::translate::MockChatCompletion;

    const ANNOTATED: &str = "1\n00:00:01,000 --> 00:00:02,000\n[MUSIC]\n\n\
                             2\n00:00:03,000 --> 00:00:04,000\n(whispers) Over here.\n\n\
                             3\n00:00:05,000 --> 00:00:06,000\nRun!\n";

    fn touch(dir: &Path, name: &str, content: &str) -> PathBuf {
        let path = dir.join(name);
        std::fs::write(&path, content).unwrap();
        path
    }

    fn fast_config() -> Config {
        let mut config = Config::default();
        config.translate.retry_delay_secs = 0;
        config
    }

    #[test]
    fn test_list_files_filters_and_sorts() {
        let dir = tempfile::tempdir().unwrap();
        touch(dir.path(), "b.srt", "");
        touch(dir.path(), "A.SRT", "");
        touch(dir.path(), "notes.txt", "");
        touch(dir.path(), "movie.Mp4", "");
        std::fs::create_dir(dir.path().join("nested.srt")).unwrap();
        touch(&dir.path().join("nested.srt"), "deep.srt", "");

        let srts = list_files(dir.path(), &["srt"]).unwrap();
        let names: Vec<String> = srts.iter().map(|p| file_name(p)).collect();
        assert_eq!(names, vec!["A.SRT", "b.srt"]);

        let videos = list_files(dir.path(), &["mp4", "mkv"]).unwrap();
        assert_eq!(videos.len(), 1);
    }

    #[test]
    fn test_list_files_missing_directory() {
        let dir = tempfile::tempdir().unwrap();
        let result = list_files(&dir.path().join("absent"), &["srt"]);
        assert!(matches!(result, Err(SrtError::FileNotFound(_))));
    }

    #[tokio::test]
    async fn test_strip_directory() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("in");
        std::fs::create_dir(&input).unwrap();
        touch(&input, "show.srt", ANNOTATED);
        touch(&input, "ignored.txt", ANNOTATED);
        let output = dir.path().join("out");

        let workflow = Workflow::new(Config::default());
        let summary = workflow.strip_directory(&input, &output, false).await.unwrap();
        assert_eq!(summary, RunSummary { processed: 1, skipped: 0, failed: 0 });

        let written = std::fs::read_to_string(output.join("show.srt")).unwrap();
        assert_eq!(
            written,
            "1\n00:00:03,000 --> 00:00:04,000\nOver here.\n\n\
             2\n00:00:05,000 --> 00:00:06,000\nRun!\n\n"
        );
        assert!(!output.join("ignored.txt").exists());
    }

    #[tokio::test]
    async fn test_strip_directory_dry_run_writes_nothing() {
        let dir = tempfile::tempdir().unwrap();
        touch(dir.path(), "show.srt", ANNOTATED);
        let output = dir.path().join("out");

        let workflow = Workflow::new(Config::default());
        let summary = workflow.strip_directory(dir.path(), &output, true).await.unwrap();
        assert_eq!(summary.processed, 1);
        assert!(!output.exists());
    }

    #[tokio::test]
    async fn test_strip_directory_missing_input_is_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let workflow = Workflow::new(Config::default());
        let result = workflow
            .strip_directory(dir.path().join("nope"), dir.path().join("out"), false)
            .await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_merge_directory() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().to_path_buf();
        let output = dir.path().join("merged");
        touch(&input, "ep1.mp4", "");
        touch(&input, "ep1.srt", ANNOTATED);
        touch(&input, "ep2.MKV", "");
        touch(&input, "ep3.avi", "");

        let expected_output = output.join("ep1-merged.mkv");
        let mut media = MockMediaProcessorTrait::new();
        media
            .expect_get_version_info()
            .times(1)
            .returning(|| Ok("mkvmerge v80.0".to_string()));
        media
            .expect_merge_subtitles()
            .withf(move |video, srt, out, language, charset| {
                video.ends_with("ep1.mp4")
                    && srt.ends_with("ep1.srt")
                    && out == expected_output.as_path()
                    && language == "ro"
                    && charset == "UTF-8"
            })
            .times(1)
            .returning(|_, _, _, _, _| Ok(()));

        let workflow = Workflow::new(Config::default()).with_media_processor(Box::new(media));
        let summary = workflow.merge_directory(&input, &output, false).await.unwrap();
        assert_eq!(summary, RunSummary { processed: 1, skipped: 1, failed: 0 });
        assert!(output.is_dir());
    }

    #[tokio::test]
    async fn test_merge_failure_is_counted_not_fatal() {
        let dir = tempfile::tempdir().unwrap();
        touch(dir.path(), "a.mkv", "");
        touch(dir.path(), "a.srt", ANNOTATED);
        touch(dir.path(), "b.mp4", "");
        touch(dir.path(), "b.srt", ANNOTATED);

        let mut media = MockMediaProcessorTrait::new();
        media
            .expect_get_version_info()
            .returning(|| Err(SrtError::Media("mkvmerge not available".to_string())));
        media
            .expect_merge_subtitles()
            .times(2)
            .returning(|video, _, _, _, _| {
                if video.ends_with("a.mkv") {
                    Err(SrtError::Media("exit status 2".to_string()))
                } else {
                    Ok(())
                }
            });

        let workflow = Workflow::new(Config::default()).with_media_processor(Box::new(media));
        let summary = workflow.merge_directory(dir.path(), dir.path(), false).await.unwrap();
        assert_eq!(summary, RunSummary { processed: 1, skipped: 0, failed: 1 });
    }

    #[tokio::test]
    async fn test_merge_dry_run_runs_nothing() {
        let dir = tempfile::tempdir().unwrap();
        touch(dir.path(), "a.mp4", "");
        touch(dir.path(), "a.srt", ANNOTATED);

        let mut media = MockMediaProcessorTrait::new();
        media.expect_get_version_info().never();
        media.expect_merge_subtitles().never();

        let workflow = Workflow::new(Config::default()).with_media_processor(Box::new(media));
        let summary = workflow
            .merge_directory(dir.path(), dir.path().join("out"), true)
            .await
            .unwrap();
        assert_eq!(summary.processed, 1);
        assert!(!dir.path().join("out").exists());
    }

    #[tokio::test]
    async fn test_translate_directory() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("in");
        std::fs::create_dir(&input).unwrap();
        touch(&input, "one.srt", ANNOTATED);
        touch(&input, "two.srt", "1\n00:00:01,000 --> 00:00:02,000\nBye\n");
        touch(&input, "junk.srt", "nothing here");
        let output = dir.path().join("out");

        let mut chat = MockChatCompletion::new();
        chat.expect_complete()
            .with(always(), always())
            .times(2)
            .returning(|_, user| {
                let chunk = user.split("```srt\n").nth(1).unwrap_or_default();
                Ok(format!("```srt\n{}\n```", chunk.replace("Bye", "Pa")))
            });

        let workflow = Workflow::new(fast_config()).with_chat_client(Arc::new(chat));
        let summary = workflow.translate_directory(&input, &output, false).await.unwrap();
        assert_eq!(summary, RunSummary { processed: 2, skipped: 1, failed: 0 });

        let two = std::fs::read_to_string(output.join("two_out.srt")).unwrap();
        assert_eq!(parse_srt(&two)[0].text, "Pa");
        assert_eq!(parse_srt(&std::fs::read_to_string(output.join("one_out.srt")).unwrap()).len(), 3);
        assert!(!output.join("junk_out.srt").exists());
    }

    #[tokio::test]
    async fn test_translate_directory_dry_run_needs_no_client() {
        let dir = tempfile::tempdir().unwrap();
        touch(dir.path(), "one.srt", ANNOTATED);

        let mut config = fast_config();
        config.translate.api_key_env = "SRTKIT_TEST_KEY_THAT_IS_NEVER_SET".to_string();

        let workflow = Workflow::new(config);
        let summary = workflow
            .translate_directory(dir.path(), dir.path().join("out"), true)
            .await
            .unwrap();
        assert_eq!(summary.processed, 1);
        assert!(!dir.path().join("out").exists());
    }

    #[tokio::test]
    async fn test_translate_directory_without_api_key_is_fatal() {
        let dir = tempfile::tempdir().unwrap();
        touch(dir.path(), "one.srt", ANNOTATED);

        let mut config = fast_config();
        config.translate.api_key_env = "SRTKIT_TEST_KEY_THAT_IS_NEVER_SET".to_string();

        let output = dir.path().join("out");
        let workflow = Workflow::new(config);
        let result = workflow.translate_directory(dir.path(), &output, false).await;
        assert!(matches!(result, Err(SrtError::Config(_))));
        assert!(!output.exists());
    }

    #[tokio::test]
    async fn test_translate_directory_without_srt_files() {
        let dir = tempfile::tempdir().unwrap();
        touch(dir.path(), "readme.md", "");

        let workflow = Workflow::new(fast_config());
        let summary = workflow
            .translate_directory(dir.path(), dir.path(), false)
            .await
            .unwrap();
        assert_eq!(summary, RunSummary::default());
    }
}
