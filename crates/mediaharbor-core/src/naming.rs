//! Display-name cleanup for uploaded files

use regex::Regex;
use std::sync::OnceLock;

/// Bracketed annotations, bitrate suffixes and a trailing extension.
const NAME_NOISE_PATTERN: &str = r"\s*[\(\[].*?[\)\]]|\s*-\s*\d+Kbps|\s*\.\w+$";

const UNTITLED: &str = "untitled";

fn name_noise() -> Option<&'static Regex> {
    static PATTERN: OnceLock<Result<Regex, regex::Error>> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(NAME_NOISE_PATTERN)).as_ref().ok()
}

/// Turn an uploaded filename into a human-readable media name.
///
/// `"Intro (Official Video) [HD] - 320Kbps.mp4"` becomes `"Intro"`. Names that
/// clean down to nothing keep their original (trimmed) form.
pub fn clean_media_name(original: &str) -> String {
    let trimmed = original.trim();
    let cleaned = match name_noise() {
        Some(pattern) => pattern.replace_all(trimmed, "").trim().to_string(),
        None => trimmed.to_string(),
    };

    if !cleaned.is_empty() {
        cleaned
    } else if !trimmed.is_empty() {
        trimmed.to_string()
    } else {
        UNTITLED.to_string()
    }
}
