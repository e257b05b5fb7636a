use tracing::debug;

pub const SYSTEM_PROMPT: &str = "You are an expert SRT subtitle translator.";

/// Build the user prompt asking for a translation of one chunk of SRT blocks.
///
/// The chunk is placed after an opening ```` ```srt ```` fence; models answer
/// with a fenced block that [`clean_translation_response`] strips again.
pub fn build_translation_prompt(chunk_text: &str, source_language: &str, target_language: &str) -> String {
    format!(
        "Translate ONLY the text portions of the following SRT subtitle blocks from {} to {}.\n\
         Maintain the EXACT original formatting, including the subtitle index numbers and timestamps.\n\
         Do NOT add any extra explanations, introductory text, or closing remarks.\n\
         Output ONLY the translated SRT blocks.\n\
         \n\
         Input SRT Chunk:\n\
         ```srt\n\
         {}",
        source_language, target_language, chunk_text
    )
}

/// Check that a model reply looks like SRT and strip code fences from it.
///
/// Returns `None` when the reply has no timestamp arrow at all.
pub fn clean_translation_response(raw: &str) -> Option<String> {
    let trimmed = raw.trim();
    if !trimmed.contains("-->") {
        debug!("Reply has no timestamp separator");
        return None;
    }

    let cleaned = trimmed
        .replace("```srt", "")
        .replace("```", "")
        .trim()
        .to_string();

    if cleaned.is_empty() {
        None
    } else {
        Some(cleaned)
    }
}

/// Shorten text for log lines without splitting a character
pub fn preview(text: &str, max_chars: usize) -> String {
    match text.char_indices().nth(max_chars) {
        Some((idx, _)) => format!("{}...", &text[..idx]),
        None => text.to_string(),
    }
}
