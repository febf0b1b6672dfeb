use thiserror::Error;

#[derive(Error, Debug)]
pub enum BridgeError {
    #[error("Bridge capability not available: {0}")]
    NotAvailable(String),

    #[error("Bridge operation failed: {0}")]
    OperationFailed(String),

    #[error("Remote service error ({status}): {message}")]
    RemoteStatus { status: u16, message: String },

    #[error("Audio device error: {0}")]
    AudioDevice(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl BridgeError {
    /// Returns `true` if the remote service answered with a 5xx status,
    /// i.e. the request itself was well-formed.
    pub fn is_server_error(&self) -> bool {
        matches!(self, BridgeError::RemoteStatus { status, .. } if (500..600).contains(status))
    }
}

pub type Result<T> = std::result::Result<T, BridgeError>;
