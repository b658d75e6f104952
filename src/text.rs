//! String helpers shared by the row templates and the name editor.

// ============================================================================
// Truncation
// ============================================================================

/// Shorten `text` to at most `limit` characters for display in a row.
///
/// When the cut lands right before a space the shortened name reads as a
/// whole word, so it is returned without an ellipsis (trailing whitespace
/// trimmed). Otherwise `"..."` is appended.
pub fn truncate(text: &str, limit: usize) -> String {
    if text.chars().count() <= limit {
        return text.to_string();
    }

    let cut: String = text.chars().take(limit).collect();

    match text.chars().nth(limit) {
        Some(' ') => cut.trim_end().to_string(),
        _ => format!("{}...", cut),
    }
}

// ============================================================================
// Escaping
// ============================================================================

pub fn html_escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#39;")
}
