//! Deep-link parameters read once at startup.

use percent_encoding::percent_decode_str;

use crate::filters::UrlOverrides;

impl UrlOverrides {
    /// Parses `darkstore`, `sk_id` and `buying_category` from a URL query
    /// string. A leading `?` is allowed; empty values are treated as absent
    /// and later duplicates win.
    #[must_use]
    pub fn from_query(query: &str) -> Self {
        let mut overrides = UrlOverrides::default();
        for pair in query.trim_start_matches('?').split('&') {
            let (key, value) = pair.split_once('=').unwrap_or((pair, ""));
            let value = decode(value);
            let value = value.trim();
            if value.is_empty() {
                continue;
            }
            match decode(key).as_str() {
                "darkstore" => overrides.darkstore = Some(value.to_string()),
                "sk_id" => overrides.sk_id = Some(value.to_string()),
                "buying_category" => overrides.buying_category = Some(value.to_string()),
                other => tracing::debug!(param = other, "ignoring unknown deep-link parameter"),
            }
        }
        overrides
    }
}

// `+` is a space in form-encoded queries.
fn decode(raw: &str) -> String {
    let spaced = raw.replace('+', " ");
    percent_decode_str(&spaced).decode_utf8_lossy().into_owned()
}
