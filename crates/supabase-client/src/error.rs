use thiserror::Error;

/// Errors from the auth endpoints.
#[derive(Debug, Error)]
pub enum AuthError {
    /// Rejected locally before any request was sent
    #[error("{0}")]
    Invalid(String),

    /// Rejected by the auth service; the message is the service's own
    #[error("{message}")]
    Rejected { status: u16, message: String },

    #[error("network error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("malformed response: {0}")]
    Parse(String),
}

/// Errors from the watchlist table.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("watchlist request failed (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("network error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("malformed response: {0}")]
    Parse(String),
}

/// Pull a human-readable message out of an error body
///
/// GoTrue uses `msg` or `error_description`, PostgREST uses `message`.
pub(crate) fn error_message(status: u16, body: &[u8]) -> String {
    let parsed: Option<serde_json::Value> = serde_json::from_slice(body).ok();
    parsed
        .as_ref()
        .and_then(|value| {
            ["msg", "error_description", "message", "error"]
                .iter()
                .find_map(|key| value.get(key).and_then(|v| v.as_str()))
        })
        .map(str::to_string)
        .unwrap_or_else(|| format!("request failed with status {}", status))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_message_variants() {
        assert_eq!(
            error_message(400, br#"{"code":400,"error_code":"invalid_credentials","msg":"Invalid login credentials"}"#),
            "Invalid login credentials"
        );
        assert_eq!(
            error_message(400, br#"{"error":"invalid_grant","error_description":"Email not confirmed"}"#),
            "Email not confirmed"
        );
        assert_eq!(
            error_message(409, br#"{"code":"23505","details":null,"hint":null,"message":"duplicate key value"}"#),
            "duplicate key value"
        );
        assert_eq!(error_message(502, b"<html>bad gateway</html>"), "request failed with status 502");
    }

    #[test]
    fn test_rejected_displays_service_message() {
        let err = AuthError::Rejected {
            status: 422,
            message: "User already registered".to_string(),
        };
        assert_eq!(err.to_string(), "User already registered");
    }
}
