use thiserror::Error;

/// A required selection was missing when a form was submitted.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValidationError {
    #[error("no model selected")]
    MissingModel,

    #[error("no metric selected")]
    MissingMetric,

    #[error("no batch file selected")]
    MissingFile,
}

#[derive(Error, Debug)]
pub enum ChurnError {
    #[error("Validation failed: {0}")]
    Validation(#[from] ValidationError),

    #[error("HTTP error: {0}")]
    Http(String),

    #[error("Service error: {0}")]
    Service(String),

    #[error("Malformed response: {0}")]
    Decode(String),

    #[error("Unknown {kind}: {value}")]
    UnknownValue { kind: &'static str, value: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Config error: {0}")]
    Config(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Blocked before any request was sent
    Validation,
    /// The request was sent but failed or came back unusable
    Transport,
    /// Local input problems (files, config, parsing)
    Local,
}

impl ChurnError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            ChurnError::Validation(_) => ErrorKind::Validation,
            ChurnError::Http(_) | ChurnError::Service(_) | ChurnError::Decode(_) => {
                ErrorKind::Transport
            }
            ChurnError::UnknownValue { .. }
            | ChurnError::Io(_)
            | ChurnError::Json(_)
            | ChurnError::Config(_) => ErrorKind::Local,
        }
    }

    pub fn is_validation(&self) -> bool {
        self.kind() == ErrorKind::Validation
    }
}

pub type Result<T> = std::result::Result<T, ChurnError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_kinds() {
        assert_eq!(
            ChurnError::from(ValidationError::MissingMetric).kind(),
            ErrorKind::Validation
        );
        assert_eq!(ChurnError::Service("boom".into()).kind(), ErrorKind::Transport);
        assert_eq!(ChurnError::Decode("eof".into()).kind(), ErrorKind::Transport);
        assert_eq!(ChurnError::Config("bad".into()).kind(), ErrorKind::Local);
    }

    #[test]
    fn test_validation_message() {
        let err = ChurnError::from(ValidationError::MissingFile);
        assert_eq!(err.to_string(), "Validation failed: no batch file selected");
    }
}
