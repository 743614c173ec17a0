use aviary_protocol::ErrorCode;

#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    #[error("server already running with PID {0}")]
    AlreadyRunning(u32),

    #[error("invalid configuration: {0}")]
    ConfigInvalid(String),

    #[error("protocol error: {0}")]
    Protocol(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error(transparent)]
    Paths(#[from] aviary_paths::PathError),
}

impl ServerError {
    /// Map to the wire error code for client responses.
    pub fn error_code(&self) -> ErrorCode {
        match self {
            ServerError::Protocol(_) => ErrorCode::ProtocolError,
            ServerError::Serialization(_) => ErrorCode::SerializationError,
            _ => ErrorCode::IoError,
        }
    }
}
