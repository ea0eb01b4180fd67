use thiserror::Error;

/// Failure of an outbound gateway call (payment provider or messaging API).
/// These are logged at the call site and never change the HTTP status the
/// caller sees; the platform's own redelivery is the only retry mechanism.
#[derive(Debug, Error)]
pub enum GatewayError {
    #[error("transport_error: {0}")]
    Transport(String),
    #[error("provider_rejected: {0}")]
    Rejected(String),
    #[error("invalid_response: {0}")]
    InvalidResponse(String),
}

impl GatewayError {
    pub fn transport(err: reqwest::Error) -> Self {
        Self::Transport(err.to_string())
    }
}
