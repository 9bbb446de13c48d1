//! Custom error types for translation operations

use std::fmt;

use thiserror::Error;

/// Failure to obtain a fresh credential for a backend
#[derive(Error, Debug)]
pub enum CredentialError {
    /// The refresh request could not be sent or returned an error status
    #[error("Credential request failed: {message}")]
    Request {
        message: String,
    },

    /// The refresh response did not contain a usable credential
    #[error("Credential parse error: {message}")]
    Parse {
        message: String,
    },

    /// Cancellation was requested while waiting for the credential
    #[error("Credential refresh cancelled")]
    Cancelled,
}

/// Failure of a single backend attempt
#[derive(Error, Debug)]
pub enum BackendError {
    /// Network error
    #[error("Network error: {message}")]
    Network {
        message: String,
    },

    /// Remote service answered with an error status
    #[error("API error: {status} - {message}")]
    Api {
        status: u16,
        message: String,
    },

    /// Invalid response from the service
    #[error("Invalid response: {message}")]
    InvalidResponse {
        message: String,
    },

    /// The backend could not acquire its credential
    #[error("{0}")]
    Credential(CredentialError),

    /// Cancellation was requested during the attempt
    #[error("Operation cancelled")]
    Cancelled,

    /// The backend was disposed
    #[error("Backend has been disposed")]
    Disposed,
}

impl BackendError {
    /// Whether this error must stop the fallback chain instead of being recorded
    pub fn is_cancellation(&self) -> bool {
        matches!(self, BackendError::Cancelled)
    }
}

impl From<CredentialError> for BackendError {
    fn from(err: CredentialError) -> Self {
        match err {
            CredentialError::Cancelled => BackendError::Cancelled,
            other => BackendError::Credential(other),
        }
    }
}

/// Per-backend errors recorded during one orchestrated call, in attempt order
#[derive(Debug, Default)]
pub struct AttemptErrors {
    entries: Vec<(String, BackendError)>,
}

impl AttemptErrors {
    /// Create an empty record
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a failed attempt
    pub fn record(&mut self, backend: impl Into<String>, error: BackendError) {
        self.entries.push((backend.into(), error));
    }

    /// Error recorded for the given backend, if it was attempted and failed
    pub fn get(&self, backend: &str) -> Option<&BackendError> {
        self.entries
            .iter()
            .find(|(name, _)| name == backend)
            .map(|(_, err)| err)
    }

    pub fn contains(&self, backend: &str) -> bool {
        self.get(backend).is_some()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Backend names in attempt order
    pub fn backends(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(name, _)| name.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &BackendError)> {
        self.entries.iter().map(|(name, err)| (name.as_str(), err))
    }
}

impl IntoIterator for AttemptErrors {
    type Item = (String, BackendError);
    type IntoIter = std::vec::IntoIter<(String, BackendError)>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.into_iter()
    }
}

impl fmt::Display for AttemptErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, (name, err)) in self.entries.iter().enumerate() {
            if i > 0 {
                write!(f, "; ")?;
            }
            write!(f, "{}: {}", name, err)?;
        }
        Ok(())
    }
}

/// Every eligible backend was attempted and failed
#[derive(Error, Debug)]
#[error("All backends failed ({}): {}", .errors.len(), .errors)]
pub struct AggregateFailure {
    pub errors: AttemptErrors,
}

/// Errors surfaced by the orchestrator
#[derive(Error, Debug)]
pub enum TranslationError {
    /// Input rejected before any backend was touched
    #[error("Validation error: {message}")]
    Validation {
        message: String,
    },

    /// No configured backend can serve the requested language
    #[error("Unsupported language: {language}")]
    UnsupportedLanguage {
        language: String,
    },

    /// Every eligible backend failed
    #[error(transparent)]
    AllFailed(#[from] AggregateFailure),

    /// Cancellation was requested
    #[error("Operation cancelled")]
    Cancelled,

    /// Called after dispose
    #[error("Translator has been disposed")]
    Disposed,

    /// Configuration error
    #[error("Configuration error: {message}")]
    Config {
        message: String,
    },

    /// Reqwest error
    #[error("HTTP client error: {0}")]
    Http(#[from] reqwest::Error),
}

impl From<anyhow::Error> for TranslationError {
    fn from(err: anyhow::Error) -> Self {
        TranslationError::Config {
            message: err.to_string(),
        }
    }
}

/// Result type for translation operations
pub type Result<T> = std::result::Result<T, TranslationError>;
