//! Common display utilities and helpers

/// Truncate string to max characters with ellipsis
pub fn truncate_string(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max_len.saturating_sub(3)).collect();
        format!("{}...", kept)
    }
}

/// Upstream placeholders ("unknown", "n/a", empty) shown as `--`
pub fn or_dash(s: &str) -> String {
    match s.trim() {
        "" | "unknown" | "n/a" => "--".to_string(),
        v => v.to_string(),
    }
}

/// Comma-joined names, `--` when there are none
pub fn join_names<'a>(names: impl IntoIterator<Item = &'a str>, max_len: usize) -> String {
    let joined = names.into_iter().collect::<Vec<_>>().join(", ");
    if joined.is_empty() {
        "--".to_string()
    } else {
        truncate_string(&joined, max_len)
    }
}
