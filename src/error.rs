use thiserror::Error;

/// Everything that can go wrong inside the quiz core.
#[derive(Debug, Error)]
pub enum QuizError {
    /// Operation not legal in the current session state. Reaching this from
    /// the UI means an input was let through that should have been blocked.
    #[error("invalid state: {0}")]
    InvalidState(&'static str),

    /// Out-of-range answer, empty submitter name and the like.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// Persisted ledger data could not be parsed.
    #[error("corrupt high-score data: {0}")]
    CorruptData(#[source] serde_json::Error),

    #[error("storage error: {0}")]
    Storage(#[from] rusqlite::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A question bank failed to deserialize.
    #[error("malformed question bank: {0}")]
    Json(#[from] serde_json::Error),
}

impl QuizError {
    pub fn invalid_input(msg: impl Into<String>) -> Self {
        Self::InvalidInput(msg.into())
    }

    pub fn is_invalid_state(&self) -> bool {
        matches!(self, Self::InvalidState(_))
    }
}

pub type Result<T, E = QuizError> = std::result::Result<T, E>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_messages() {
        assert_eq!(
            QuizError::InvalidState("session already completed").to_string(),
            "invalid state: session already completed"
        );
        assert_eq!(
            QuizError::invalid_input("name must not be empty").to_string(),
            "invalid input: name must not be empty"
        );
    }

    #[test]
    fn corrupt_data_keeps_parse_error() {
        let parse_err = serde_json::from_str::<Vec<u8>>("{").unwrap_err();
        let err = QuizError::CorruptData(parse_err);
        assert!(err.to_string().starts_with("corrupt high-score data"));
        assert!(std::error::Error::source(&err).is_some());
    }

    #[test]
    fn invalid_state_predicate() {
        assert!(QuizError::InvalidState("x").is_invalid_state());
        assert!(!QuizError::invalid_input("x").is_invalid_state());
    }
}
