use thiserror::Error;

/// Top-level error type for wagate.
#[derive(Debug, Error)]
pub enum GatewayError {
    /// A send was attempted while no session is live.
    #[error("WhatsApp not connected")]
    NotConnected,

    /// Error surfaced by the WhatsApp client, message passed through unchanged.
    #[error("{0}")]
    Backend(String),

    /// Auth-state directory could not be created or removed.
    #[error("filesystem error: {0}")]
    Filesystem(String),

    /// Configuration error.
    #[error("config error: {0}")]
    Config(String),

    /// QR rendering error.
    #[error("qr error: {0}")]
    Qr(String),

    /// I/O error.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization error.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl GatewayError {
    /// HTTP status code for this error at the API boundary.
    pub fn status_code(&self) -> u16 {
        match self {
            Self::NotConnected => 400,
            _ => 500,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_connected_maps_to_400() {
        let err = GatewayError::NotConnected;
        assert_eq!(err.status_code(), 400);
        assert_eq!(err.to_string(), "WhatsApp not connected");
    }

    #[test]
    fn test_backend_message_passes_through() {
        let err = GatewayError::Backend("stream closed".to_string());
        assert_eq!(err.to_string(), "stream closed");
        assert_eq!(err.status_code(), 500);
    }

    #[test]
    fn test_filesystem_maps_to_500() {
        let err = GatewayError::Filesystem("permission denied".to_string());
        assert_eq!(err.status_code(), 500);
    }
}
