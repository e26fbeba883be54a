//! PII redaction for log output.
//!
//! Message bodies are echoed into logs so a failed message can be replayed
//! by hand. The raw IP and device id must not reach the log sink, so bodies
//! pass through [`redact_for_log`] first:
//! - values of the `ip` and `device_id` keys become `[REDACTED]`
//! - any remaining IPv4 address becomes `[IP_ADDRESS]`
//!
//! Works on raw text, so it also covers bodies that are not valid JSON.

use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    /// `"ip"` and `"device_id"` members with any scalar value, or a flat
    /// array or object value
    static ref PII_MEMBER_PATTERN: Regex = Regex::new(
        r#""(ip|device_id)"\s*:\s*(?:"(?:[^"\\]|\\.)*"|\[[^\]]*\]|\{[^}]*\}|[^,}\]\s]+)"#
    ).unwrap();

    /// IP address pattern (IPv4)
    static ref IP_PATTERN: Regex = Regex::new(
        r"\b(?:\d{1,3}\.){3}\d{1,3}\b"
    ).unwrap();
}

/// Longest body echoed into a log line, in bytes.
pub const MAX_LOGGED_BODY: usize = 2_048;

/// Redaction statistics.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct RedactionResult {
    pub members_redacted: usize,
    pub ips_redacted: usize,
}

/// Redact a message body for logging. Output is truncated to
/// [`MAX_LOGGED_BODY`] bytes on a char boundary.
pub fn redact_for_log(body: &str) -> String {
    let (redacted, _) = redact_with_stats(body);
    let mut out = redacted;
    if truncate_at_char_boundary(&mut out, MAX_LOGGED_BODY) {
        out.push_str("...");
    }
    out
}

/// Redact and report what was replaced.
pub fn redact_with_stats(body: &str) -> (String, RedactionResult) {
    let mut result = RedactionResult::default();

    let member_count = PII_MEMBER_PATTERN.find_iter(body).count();
    let mut redacted = if member_count > 0 {
        result.members_redacted = member_count;
        PII_MEMBER_PATTERN
            .replace_all(body, r#""$1":"[REDACTED]""#)
            .into_owned()
    } else {
        body.to_string()
    };

    let ip_count = IP_PATTERN.find_iter(&redacted).count();
    if ip_count > 0 {
        result.ips_redacted = ip_count;
        redacted = IP_PATTERN.replace_all(&redacted, "[IP_ADDRESS]").into_owned();
    }

    (redacted, result)
}

/// Cut `s` to at most `max` bytes without splitting a character. Returns
/// whether anything was removed.
pub fn truncate_at_char_boundary(s: &mut String, max: usize) -> bool {
    if s.len() <= max {
        return false;
    }
    let mut cut = max;
    while !s.is_char_boundary(cut) {
        cut -= 1;
    }
    s.truncate(cut);
    true
}
