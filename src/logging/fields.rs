//! Field helpers for structured logging

/// Longest upstream body kept in errors and log fields.
pub const BODY_EXCERPT_CHARS: usize = 200;

/// Truncate `text` to at most `max_chars` characters, marking the cut.
///
/// Counts characters, not bytes, so multi-byte UTF-8 is never split.
///
/// # Examples
///
/// ```
/// use yolo_remote::logging::excerpt;
///
/// assert_eq!(excerpt("internal error", 8), "internal...");
/// assert_eq!(excerpt("ok", 8), "ok");
/// ```
pub fn excerpt(text: &str, max_chars: usize) -> String {
    let trimmed = text.trim();
    match trimmed.char_indices().nth(max_chars) {
        Some((cut, _)) => format!("{}...", &trimmed[..cut]),
        None => trimmed.to_string(),
    }
}

/// Lossy excerpt of a raw response body.
pub fn body_excerpt(body: &[u8]) -> String {
    excerpt(&String::from_utf8_lossy(body), BODY_EXCERPT_CHARS)
}
