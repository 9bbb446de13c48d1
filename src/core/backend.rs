//! Capability contract every translation service implements

use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use crate::core::errors::BackendError;
use crate::core::language::Language;
use crate::core::models::{TranslationRequest, TranslationResult, TransliterationResult};

/// A single third-party translation service.
///
/// Credential handling is internal to the implementation; a credential failure
/// surfaces as [`BackendError::Credential`].
#[async_trait]
pub trait Backend: Send + Sync {
    /// Stable identifier used in logs and attempt records
    fn name(&self) -> &str;

    async fn translate(
        &self,
        request: &TranslationRequest,
        cancel: &CancellationToken,
    ) -> Result<TranslationResult, BackendError>;

    async fn transliterate(
        &self,
        request: &TranslationRequest,
        cancel: &CancellationToken,
    ) -> Result<TransliterationResult, BackendError>;

    async fn detect_language(
        &self,
        text: &str,
        cancel: &CancellationToken,
    ) -> Result<Language, BackendError>;

    fn is_language_supported(&self, language: &Language) -> bool;

    /// Release held resources. Later calls fail with [`BackendError::Disposed`].
    fn dispose(&self) {}
}

/// One-way disposed marker
#[derive(Debug, Default)]
pub struct DisposeFlag {
    disposed: AtomicBool,
}

impl DisposeFlag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_disposed(&self) -> bool {
        self.disposed.load(Ordering::Acquire)
    }

    /// Mark disposed; returns `true` only for the first call
    pub fn dispose(&self) -> bool {
        !self.disposed.swap(true, Ordering::AcqRel)
    }

    pub fn ensure_active(&self) -> Result<(), BackendError> {
        if self.is_disposed() {
            Err(BackendError::Disposed)
        } else {
            Ok(())
        }
    }
}
