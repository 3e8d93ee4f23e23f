const TOKEN_PREVIEW_CHARS: usize = 8;

/// Shortens a bot token for display: the first 8 characters followed by `...`.
/// Tokens too short to preview are fully hidden.
pub fn mask_token(token: &str) -> String {
    match token.char_indices().nth(TOKEN_PREVIEW_CHARS) {
        Some((idx, _)) => format!("{}...", &token[..idx]),
        None => "...".to_string(),
    }
}

/// Replaces every occurrence of `token` in `text` with its masked form.
pub fn redact_token(text: &str, token: &str) -> String {
    if token.is_empty() {
        return text.to_string();
    }
    text.replace(token, &mask_token(token))
}
