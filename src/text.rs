//! Small text helpers shared by the scheduler and ranker.

/// Default length bound for lazily derived summaries.
pub const SUMMARY_MAX_CHARS: usize = 240;

/// Derive a short summary from raw text: the leading content, cut at a
/// sentence boundary where one fits, otherwise at a word boundary.
pub fn summarize(raw_text: &str, max_chars: usize) -> String {
    let flattened: String = raw_text
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ");

    if flattened.chars().count() <= max_chars {
        return flattened;
    }

    let head: String = flattened.chars().take(max_chars).collect();

    // Prefer ending on a complete sentence.
    if let Some(pos) = head.rfind(['.', '!', '?']) {
        if pos > max_chars / 2 {
            return head[..=pos].to_string();
        }
    }

    match head.rfind(' ') {
        Some(pos) => format!("{}…", &head[..pos]),
        None => format!("{head}…"),
    }
}
