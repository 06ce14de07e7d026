//! Small helpers for speaking PostgREST.

use serde::Deserialize;

/// Builds an `ilike.<pattern>` filter value that matches `value` exactly,
/// ignoring case.
///
/// `%`, `_` and `\` are escaped. PostgREST also expands `*` to `%`; callers
/// re-check overrides client-side, so a stray wildcard can only widen the
/// server response, never change the final result.
#[must_use]
pub fn ilike_exact(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len() + 6);
    for c in value.trim().chars() {
        if matches!(c, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    format!("ilike.{escaped}")
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    message: Option<String>,
    details: Option<String>,
    hint: Option<String>,
}

/// Extracts the human-readable part of a PostgREST error body, falling back
/// to the raw body (or `fallback` when empty).
#[must_use]
pub fn error_message(body: &str, fallback: &str) -> String {
    if let Ok(parsed) = serde_json::from_str::<ErrorBody>(body) {
        if let Some(message) = parsed.message {
            let extra = parsed.details.or(parsed.hint);
            return match extra {
                Some(extra) if !extra.is_empty() => format!("{message} ({extra})"),
                _ => message,
            };
        }
    }
    let trimmed = body.trim();
    if trimmed.is_empty() {
        fallback.to_string()
    } else {
        trimmed.chars().take(200).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ilike_exact_escapes_pattern_characters() {
        assert_eq!(ilike_exact("BLR-01"), "ilike.BLR-01");
        assert_eq!(ilike_exact(" 50%_off\\ "), "ilike.50\\%\\_off\\\\");
    }

    #[test]
    fn error_message_prefers_postgrest_fields() {
        let body = r#"{"code":"42P01","message":"relation \"retailers\" does not exist","details":null,"hint":null}"#;
        assert_eq!(
            error_message(body, "Not Found"),
            "relation \"retailers\" does not exist"
        );
        let with_hint = r#"{"message":"permission denied","hint":"check RLS policies"}"#;
        assert_eq!(
            error_message(with_hint, "Forbidden"),
            "permission denied (check RLS policies)"
        );
    }

    #[test]
    fn error_message_falls_back_to_body_or_reason() {
        assert_eq!(error_message("upstream timeout", "Bad Gateway"), "upstream timeout");
        assert_eq!(error_message("", "Bad Gateway"), "Bad Gateway");
    }
}
