//! Scripted backend for orchestrator tests

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use crate::core::backend::{Backend, DisposeFlag};
use crate::core::errors::BackendError;
use crate::core::language::Language;
use crate::core::models::{TranslationRequest, TranslationResult, TransliterationResult};

#[derive(Debug, Clone)]
pub(crate) enum Script {
    /// Answer with this text
    Succeed(String),
    /// Fail with a network error carrying this message
    Fail(String),
    /// Fail with a cancellation error
    Cancelled,
    /// Cancel the token, then fail with a network error
    CancelThenFail(CancellationToken),
}

pub(crate) struct ScriptedBackend {
    name: String,
    supported: Vec<&'static str>,
    script: Script,
    detected: Language,
    calls: Arc<AtomicUsize>,
    disposals: Arc<AtomicUsize>,
    disposed: DisposeFlag,
}

impl ScriptedBackend {
    pub(crate) fn new(name: &str, supported: &[&'static str], script: Script) -> Self {
        Self {
            name: name.to_string(),
            supported: supported.to_vec(),
            script,
            detected: lang("en"),
            calls: Arc::new(AtomicUsize::new(0)),
            disposals: Arc::new(AtomicUsize::new(0)),
            disposed: DisposeFlag::new(),
        }
    }

    pub(crate) fn succeeding(name: &str, supported: &[&'static str], text: &str) -> Self {
        Self::new(name, supported, Script::Succeed(text.to_string()))
    }

    pub(crate) fn failing(name: &str, supported: &[&'static str], message: &str) -> Self {
        Self::new(name, supported, Script::Fail(message.to_string()))
    }

    pub(crate) fn detecting(mut self, code: &str) -> Self {
        self.detected = lang(code);
        self
    }

    /// Invocation counter that outlives boxing the backend
    pub(crate) fn calls(&self) -> Arc<AtomicUsize> {
        Arc::clone(&self.calls)
    }

    pub(crate) fn disposals(&self) -> Arc<AtomicUsize> {
        Arc::clone(&self.disposals)
    }

    fn run(&self) -> Result<String, BackendError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.disposed.ensure_active()?;
        match &self.script {
            Script::Succeed(text) => Ok(text.clone()),
            Script::Fail(message) => Err(BackendError::Network {
                message: message.clone(),
            }),
            Script::Cancelled => Err(BackendError::Cancelled),
            Script::CancelThenFail(token) => {
                token.cancel();
                Err(BackendError::Network {
                    message: "interrupted".to_string(),
                })
            }
        }
    }
}

#[async_trait]
impl Backend for ScriptedBackend {
    fn name(&self) -> &str {
        &self.name
    }

    async fn translate(
        &self,
        request: &TranslationRequest,
        _cancel: &CancellationToken,
    ) -> Result<TranslationResult, BackendError> {
        let translation = self.run()?;
        Ok(TranslationResult {
            translation,
            source_text: request.text.clone(),
            target_language: request.target,
            source_language: request.source.or(Some(self.detected)),
            backend: self.name.clone(),
        })
    }

    async fn transliterate(
        &self,
        request: &TranslationRequest,
        _cancel: &CancellationToken,
    ) -> Result<TransliterationResult, BackendError> {
        let transliteration = self.run()?;
        Ok(TransliterationResult {
            transliteration,
            source_text: request.text.clone(),
            target_language: request.target,
            source_language: request.source,
            backend: self.name.clone(),
        })
    }

    async fn detect_language(
        &self,
        _text: &str,
        _cancel: &CancellationToken,
    ) -> Result<Language, BackendError> {
        self.run()?;
        Ok(self.detected)
    }

    fn is_language_supported(&self, language: &Language) -> bool {
        self.supported.contains(&language.code)
    }

    fn dispose(&self) {
        if self.disposed.dispose() {
            self.disposals.fetch_add(1, Ordering::SeqCst);
        }
    }
}

pub(crate) fn lang(code: &str) -> Language {
    Language::resolve(code).unwrap_or_else(|| panic!("unknown test language {}", code))
}
