//! HTTP status classification.

use eon_common::EonError;

/// Reason phrases for the status codes operators commonly hit.
const REASONS: &[(u16, &str)] = &[
    (400, "Bad Request"),
    (401, "Unauthorized"),
    (403, "Forbidden"),
    (404, "Not Found"),
    (405, "Method Not Allowed"),
    (408, "Request Timeout"),
    (429, "Too Many Requests"),
    (500, "Internal Server Error"),
    (502, "Bad Gateway"),
    (503, "Service Unavailable"),
];

pub fn is_success(status: u16) -> bool {
    (200..300).contains(&status)
}

/// Describe an error status: a reason phrase for well-known codes,
/// `Error {code}` for any other 4xx/5xx, and `None` when not an error.
pub fn classify_http_status(status: u16) -> Option<String> {
    if !(400..600).contains(&status) {
        return None;
    }
    Some(
        known_reason(status)
            .map(str::to_string)
            .unwrap_or_else(|| format!("Error {}", status)),
    )
}

fn known_reason(status: u16) -> Option<&'static str> {
    REASONS
        .iter()
        .find(|(code, _)| *code == status)
        .map(|(_, reason)| *reason)
}

/// Error for a non-success response from `location`.
pub fn http_status_error(location: &str, status: u16) -> EonError {
    let message = match known_reason(status) {
        Some(reason) => format!("{}: {}", location, reason),
        None => format!("{} Error {}", location, status),
    };
    EonError::HttpStatus {
        location: location.to_string(),
        status,
        message,
    }
}
