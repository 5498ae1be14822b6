//! Small text helpers used when turning raw GitHub items into article lines.

const PREVIEW_LINES: usize = 3;
const PREVIEW_CHARS: usize = 200;

/// First line of a commit message, trimmed.
pub fn first_line(message: &str) -> &str {
    message.lines().next().unwrap_or("").trim()
}

pub fn short_sha(sha: &str) -> &str {
    match sha.char_indices().nth(7) {
        Some((idx, _)) => &sha[..idx],
        None => sha,
    }
}

/// Release body preview: the first three lines joined by single spaces,
/// cut to 200 characters with `...` appended when something was cut.
/// Returns `None` for an empty body.
pub fn body_preview(body: &str) -> Option<String> {
    if body.is_empty() {
        return None;
    }

    let joined = body
        .split('\n')
        .take(PREVIEW_LINES)
        .map(str::trim)
        .collect::<Vec<_>>()
        .join(" ");

    if joined.chars().count() > PREVIEW_CHARS {
        let cut: String = joined.chars().take(PREVIEW_CHARS).collect();
        Some(format!("{}...", cut))
    } else {
        Some(joined)
    }
}
