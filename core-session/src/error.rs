use thiserror::Error;

#[derive(Error, Debug)]
pub enum SessionError {
    #[error("Installment must carry exactly 3 choices, got {0}")]
    ChoiceCount(usize),

    #[error("Installment contains no story chunks")]
    EmptyStory,

    #[error("Invalid session configuration: {0}")]
    Config(String),
}

impl SessionError {
    /// Returns `true` when the error describes malformed generator output
    /// rather than a local misconfiguration.
    pub fn is_upstream_contract(&self) -> bool {
        matches!(self, SessionError::ChoiceCount(_) | SessionError::EmptyStory)
    }
}

pub type Result<T> = std::result::Result<T, SessionError>;
