//! Sanitization of untrusted status-file fields.
//!
//! OpenVPN common names and usernames are chosen by peers, so anything read
//! from a status file is hostile until proven otherwise. These are pure
//! functions: they never fail, they only degrade a value to [`PLACEHOLDER`].

use std::net::IpAddr;

/// Substitute for fields that are empty, missing, or fail validation.
///
/// OpenVPN itself emits the literal string `unknown` for addresses it cannot
/// determine, so the placeholder matches that convention.
pub const PLACEHOLDER: &str = "unknown";

/// Maximum length of a sanitized label value.
const MAX_LABEL_LEN: usize = 100;

/// Normalizes an untrusted string into a label-safe token.
///
/// Strips path-traversal sequences and separators first, then drops every
/// character outside `[A-Za-z0-9._-]` and truncates to [`MAX_LABEL_LEN`].
/// An empty result becomes [`PLACEHOLDER`], so the output is always a
/// non-empty, label-safe string.
pub fn sanitize_label(raw: &str) -> String {
    let stripped = raw.replace("..", "").replace(['/', '\\'], "");
    let mut label: String = stripped
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-'))
        .collect();
    // Only ASCII remains, so this cannot split a character.
    label.truncate(MAX_LABEL_LEN);

    if label.is_empty() {
        PLACEHOLDER.to_string()
    } else {
        label
    }
}

/// Returns `raw` unchanged when it is a syntactically valid IPv4/IPv6
/// address, or [`PLACEHOLDER`] otherwise.
///
/// The empty string and the literal `unknown` pass through as-is: OpenVPN
/// emits both for addresses it cannot determine. Validation only decides
/// whether the value is trustworthy as a label; it never rejects the
/// surrounding record.
pub fn validate_address(raw: &str) -> &str {
    if raw.is_empty() || raw == PLACEHOLDER {
        return raw;
    }
    if raw.parse::<IpAddr>().is_ok() {
        raw
    } else {
        PLACEHOLDER
    }
}
