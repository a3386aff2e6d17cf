//! Free-text input cleanup

/// Characters removed from every free-text field
const STRIPPED: [char; 4] = ['<', '>', '"', '\''];

/// Trims whitespace, removes markup characters and truncates to `max_chars`
///
/// Truncation counts characters, not bytes, so multi-byte input is never
/// split mid-character.
pub fn sanitize_text(input: &str, max_chars: usize) -> String {
    input
        .trim()
        .chars()
        .filter(|c| !STRIPPED.contains(c))
        .take(max_chars)
        .collect()
}

/// Like [`sanitize_text`] but maps an empty result to `None`
pub fn sanitize_optional(input: Option<&str>, max_chars: usize) -> Option<String> {
    input
        .map(|s| sanitize_text(s, max_chars))
        .filter(|s| !s.is_empty())
}
