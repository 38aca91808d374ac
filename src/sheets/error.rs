use thiserror::Error;

#[derive(Error, Debug)]
pub enum SheetError {
    #[error("Authentication failed: {0}")]
    Auth(String),

    #[error("Sheet or tab not found: {0}")]
    NotFound(String),

    #[error("Transient error: {0}")]
    Transient(String),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),
}

/// Maximum length for error response bodies in error messages
const MAX_ERROR_BODY_LENGTH: usize = 500;

impl SheetError {
    /// Truncate a response body to avoid logging excessive data
    fn truncate_body(body: &str) -> String {
        if body.len() <= MAX_ERROR_BODY_LENGTH {
            body.to_string()
        } else {
            let mut end = MAX_ERROR_BODY_LENGTH;
            while !body.is_char_boundary(end) {
                end -= 1;
            }
            format!(
                "{}... (truncated, {} total bytes)",
                &body[..end],
                body.len()
            )
        }
    }

    pub fn from_status(status: reqwest::StatusCode, body: &str) -> Self {
        let truncated = Self::truncate_body(body);
        match status.as_u16() {
            401 | 403 => SheetError::Auth(truncated),
            404 => SheetError::NotFound(truncated),
            429 => SheetError::Transient("rate limited".to_string()),
            500..=599 => SheetError::Transient(format!("server error {}: {}", status, truncated)),
            _ => SheetError::InvalidResponse(format!("Status {}: {}", status, truncated)),
        }
    }

    /// Transient errors are retried within a fetch cycle; auth and
    /// not-found failures need an operator fix and are not.
    pub fn is_retryable(&self) -> bool {
        matches!(self, SheetError::Transient(_))
    }
}

impl From<reqwest::Error> for SheetError {
    fn from(e: reqwest::Error) -> Self {
        // Timeouts and connection failures are worth retrying; anything
        // else from the client side is reported as-is.
        if e.is_timeout() || e.is_connect() || e.is_request() {
            SheetError::Transient(e.to_string())
        } else {
            SheetError::InvalidResponse(e.to_string())
        }
    }
}
