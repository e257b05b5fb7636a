//! Removal of bracketed and parenthesized annotations such as `[MUSIC]`
//! or `(laughs)` from caption text.

use regex::Regex;
use std::sync::LazyLock;

use crate::config::StripConfig;
use crate::error::{Result, SrtError};
use crate::subtitle::Subtitle;

static ANNOTATION: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\[.*?\]|\(.*?\)").expect("annotation regex is valid")
});

/// Remove `[...]` and `(...)` spans from the text and trim the result.
///
/// Matches never cross a line break, so an annotation opened on one line
/// and closed on the next is left untouched.
pub fn remove_bracketed_text(text: &str) -> String {
    BracketStripper::default().strip_text(text)
}

/// Annotation stripper with a configurable pattern
#[derive(Debug, Clone)]
pub struct BracketStripper {
    pattern: Regex,
}

impl Default for BracketStripper {
    fn default() -> Self {
        Self {
            pattern: ANNOTATION.clone(),
        }
    }
}

impl BracketStripper {
    pub fn new(config: &StripConfig) -> Result<Self> {
        let pattern = Regex::new(&config.pattern).map_err(|e| {
            SrtError::Config(format!("Invalid strip pattern '{}': {}", config.pattern, e))
        })?;
        Ok(Self { pattern })
    }

    pub fn strip_text(&self, text: &str) -> String {
        self.pattern.replace_all(text, "").trim().to_string()
    }

    pub fn strip_subtitle(&self, mut subtitle: Subtitle) -> Subtitle {
        subtitle.text = self.strip_text(&subtitle.text);
        subtitle
    }

    pub fn strip_subtitles(&self, subtitles: Vec<Subtitle>) -> Vec<Subtitle> {
        subtitles
            .into_iter()
            .map(|s| self.strip_subtitle(s))
            .collect()
    }
}
