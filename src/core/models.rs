//! Core data models for translation

use serde::{Deserialize, Serialize};

use crate::core::errors::AttemptErrors;
use crate::core::language::Language;

/// Translation or transliteration request
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TranslationRequest {
    pub text: String,
    pub target: Language,
    pub source: Option<Language>,
}

impl TranslationRequest {
    pub fn new(text: impl Into<String>, target: Language) -> Self {
        Self {
            text: text.into(),
            target,
            source: None,
        }
    }

    pub fn with_source(mut self, source: Language) -> Self {
        self.source = Some(source);
        self
    }

    /// Languages a backend must support to serve this request
    pub fn languages(&self) -> impl Iterator<Item = &Language> {
        std::iter::once(&self.target).chain(self.source.as_ref())
    }
}

/// Translation result
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TranslationResult {
    pub translation: String,
    pub source_text: String,
    pub target_language: Language,
    /// Source language as given or as detected by the backend
    pub source_language: Option<Language>,
    /// Name of the backend that produced this result
    pub backend: String,
}

/// Transliteration result
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransliterationResult {
    pub transliteration: String,
    pub source_text: String,
    pub target_language: Language,
    pub source_language: Option<Language>,
    pub backend: String,
}

/// Language detection result
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DetectionResult {
    pub language: Language,
    pub backend: String,
}

/// Successful orchestrated call plus the failures that preceded it
#[derive(Debug)]
pub struct AggregateOutcome<T> {
    pub result: T,
    /// Backends attempted before the successful one that failed, in order
    pub errors: AttemptErrors,
}

impl<T> AggregateOutcome<T> {
    pub fn into_inner(self) -> T {
        self.result
    }

    /// Whether the first attempted backend succeeded
    pub fn is_clean(&self) -> bool {
        self.errors.is_empty()
    }
}
