// Error types for the fetch/download orchestration

use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// Invalid user input, no network call was attempted
    Validation(String),

    /// Provider reported a failure or returned a malformed payload
    Metadata(String),

    /// Download preparation request failed
    Download(String),

    /// Request exceeded its time bound
    Timeout(String),

    /// Operation was superseded by a newer one; never shown to the user
    Cancelled,
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Validation(msg) => write!(f, "{}", msg),
            Self::Metadata(msg) => write!(f, "{}", msg),
            Self::Download(msg) => write!(f, "{}", msg),
            Self::Timeout(what) => write!(f, "Timed out: {}", what),
            Self::Cancelled => write!(f, "Operation superseded"),
        }
    }
}

impl std::error::Error for Error {}

impl Error {
    /// Whether this failure must be dropped silently instead of surfaced.
    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_passes_user_text_through() {
        assert_eq!(Error::Metadata("unsupported".to_string()).to_string(), "unsupported");
        assert_eq!(
            Error::Validation("Please enter a URL".to_string()).to_string(),
            "Please enter a URL"
        );
    }

    #[test]
    fn timeout_is_prefixed() {
        let err = Error::Timeout("metadata lookup".to_string());
        assert_eq!(err.to_string(), "Timed out: metadata lookup");
    }

    #[test]
    fn only_cancelled_is_silent() {
        assert!(Error::Cancelled.is_cancelled());
        assert!(!Error::Download("x".to_string()).is_cancelled());
    }
}
