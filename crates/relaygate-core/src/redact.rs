//! Log-only views of outgoing requests with credentials masked.

use relaygate_provider_core::Headers;

pub const REDACTED: &str = "[redacted]";

const SENSITIVE_HEADERS: [&str; 5] = [
    "authorization",
    "x-api-key",
    "x-goog-api-key",
    "cookie",
    "set-cookie",
];
const SENSITIVE_QUERY_KEYS: [&str; 3] = ["key", "api_key", "access_token"];

pub fn redact_headers(headers: &Headers, redact: bool) -> Headers {
    let mut headers = headers.clone();
    if !redact {
        return headers;
    }
    for (k, v) in &mut headers {
        if SENSITIVE_HEADERS.iter().any(|name| name.eq_ignore_ascii_case(k)) {
            *v = REDACTED.to_string();
        }
    }
    headers
}

pub fn redact_url(url: &str, redact: bool) -> String {
    if !redact {
        return url.to_string();
    }
    let Some((base, query)) = url.split_once('?') else {
        return url.to_string();
    };
    let Ok(mut pairs) = serde_urlencoded::from_str::<Vec<(String, String)>>(query) else {
        return format!("{base}?{REDACTED}");
    };
    for (k, v) in &mut pairs {
        if SENSITIVE_QUERY_KEYS
            .iter()
            .any(|name| name.eq_ignore_ascii_case(k))
        {
            *v = REDACTED.to_string();
        }
    }
    match serde_urlencoded::to_string(pairs) {
        Ok(query) => format!("{base}?{query}"),
        Err(_) => format!("{base}?{REDACTED}"),
    }
}

/// Cuts `text` to at most `limit` characters, marking the cut.
pub fn truncate_for_log(text: &str, limit: usize) -> String {
    match text.char_indices().nth(limit) {
        Some((idx, _)) => format!("{}...", &text[..idx]),
        None => text.to_string(),
    }
}
