use regex::Regex;
use std::fmt;
use std::path::Path;
use std::sync::LazyLock;
use tokio::fs;
use tracing::{debug, info, warn};

use crate::error::Result;

static BLOCK_SEPARATOR: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\n\s*\n").expect("block separator regex is valid")
});

/// One SRT block: sequence number, timestamp range and caption text
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Subtitle {
    /// Sequence number as read; renumbered on write
    pub id: String,
    /// Timestamp range, kept as opaque text
    pub timestamps: String,
    /// Caption text, possibly spanning several lines
    pub text: String,
}

impl Subtitle {
    pub fn new<S1, S2, S3>(id: S1, timestamps: S2, text: S3) -> Self
    where
        S1: Into<String>,
        S2: Into<String>,
        S3: Into<String>,
    {
        Self {
            id: id.into(),
            timestamps: timestamps.into(),
            text: text.into(),
        }
    }
}

impl fmt::Display for Subtitle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}\n{}\n{}", self.id, self.timestamps, self.text)
    }
}

/// Parse SRT content into subtitles, skipping malformed blocks
pub fn parse_srt(content: &str) -> Vec<Subtitle> {
    let normalized = content
        .trim_start_matches('\u{feff}')
        .replace("\r\n", "\n")
        .replace('\r', "\n");

    let mut subtitles = Vec::new();

    for block in BLOCK_SEPARATOR.split(normalized.trim()) {
        let block = block.trim();
        if block.is_empty() {
            continue;
        }

        let lines: Vec<&str> = block.split('\n').collect();
        if lines.len() < 3 {
            warn!("Skipping incomplete subtitle block: {}", block);
            continue;
        }

        let id = lines[0].trim();
        let timestamps = lines[1].trim();
        let text = lines[2..].join("\n").trim().to_string();

        if is_sequence_number(id) && timestamps.contains("-->") {
            subtitles.push(Subtitle::new(id, timestamps, text));
        } else {
            warn!(
                "Skipping invalid subtitle block fragment: ID='{}', Timestamp='{}'",
                id, timestamps
            );
        }
    }

    subtitles
}

fn is_sequence_number(s: &str) -> bool {
    !s.is_empty() && s.chars().all(|c| c.is_ascii_digit())
}

/// Read and parse an SRT file
pub async fn parse_srt_file<P: AsRef<Path>>(path: P) -> Result<Vec<Subtitle>> {
    let path = path.as_ref();
    let content = fs::read_to_string(path).await?;
    let subtitles = parse_srt(&content);
    debug!("Parsed {} subtitles from {}", subtitles.len(), path.display());
    Ok(subtitles)
}

/// Serialize subtitles, dropping empty captions and renumbering from 1
pub fn render_renumbered(subtitles: &[Subtitle]) -> String {
    let mut out = String::new();
    let mut counter = 1;

    for subtitle in subtitles.iter().filter(|s| !s.text.is_empty()) {
        out.push_str(&format!(
            "{}\n{}\n{}\n\n",
            counter, subtitle.timestamps, subtitle.text
        ));
        counter += 1;
    }

    out
}

/// Write subtitles to an SRT file, dropping empty captions and renumbering
pub async fn write_srt<P: AsRef<Path>>(subtitles: &[Subtitle], output_path: P) -> Result<()> {
    let output_path = output_path.as_ref();
    fs::write(output_path, render_renumbered(subtitles)).await?;
    info!("Processed and saved: {}", output_path.display());
    Ok(())
}

/// Split subtitles into fixed-size groups, each rendered as SRT text
pub fn chunk_subtitles_as_text(subtitles: &[Subtitle], chunk_size: usize) -> Vec<String> {
    subtitles
        .chunks(chunk_size.max(1))
        .map(|chunk| {
            chunk
                .iter()
                .map(Subtitle::to_string)
                .collect::<Vec<_>>()
                .join("\n\n")
        })
        .collect()
}
