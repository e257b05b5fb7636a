//! srtkit - Batch utilities for SRT subtitles
//!
//! Strips bracketed annotations from captions, merges subtitles into
//! Matroska files with mkvmerge, and translates subtitles through a
//! chat-completion API.

pub mod cli;
pub mod config;
pub mod workflow;
pub mod translate;
pub mod subtitle;
pub mod brackets;
pub mod media;
pub mod error;
