//! Polytrans - multi-backend translation client
//!
//! Fans translation, transliteration and language detection requests out over
//! an ordered list of third-party services, falling back on failure and
//! collecting the errors of every backend that was tried. Backends that need
//! ephemeral credentials cache them in a [`SessionManager`] that refreshes on
//! demand with a single request per expiry window.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod backends;
pub mod core;

// Re-export key types for convenience
pub use crate::core::{
    backend::Backend,
    cache::CacheEntry,
    config::{BackendKind, TranslatorConfig},
    errors::{AggregateFailure, AttemptErrors, BackendError, CredentialError, TranslationError},
    language::Language,
    models::{
        AggregateOutcome, DetectionResult, TranslationRequest, TranslationResult,
        TransliterationResult,
    },
    orchestrator::Orchestrator,
    session::{CredentialSource, SessionManager},
};

pub use tokio_util::sync::CancellationToken;

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Library name
pub const NAME: &str = env!("CARGO_PKG_NAME");
