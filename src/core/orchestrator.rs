//! Ordered fallback across translation backends

use std::future::Future;
use std::pin::Pin;

use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::core::backend::{Backend, DisposeFlag};
use crate::core::config::TranslatorConfig;
use crate::core::errors::{AggregateFailure, AttemptErrors, BackendError, Result, TranslationError};
use crate::core::language::Language;
use crate::core::models::{
    AggregateOutcome, DetectionResult, TranslationRequest, TranslationResult, TransliterationResult,
};

/// One boxed backend attempt
type Attempt<'a, T> = Pin<Box<dyn Future<Output = std::result::Result<T, BackendError>> + Send + 'a>>;

/// Fans each request out over an ordered backend list.
///
/// Backends that cannot serve the requested languages are skipped without a
/// record. The first success wins and carries the errors of the backends that
/// failed before it; if every eligible backend fails the call fails with an
/// [`AggregateFailure`]. Order is the construction order and never changes.
pub struct Orchestrator {
    backends: Vec<Box<dyn Backend>>,
    disposed: DisposeFlag,
}

impl Orchestrator {
    /// Create an orchestrator over backends in fallback order
    pub fn new(backends: Vec<Box<dyn Backend>>) -> Self {
        Self {
            backends,
            disposed: DisposeFlag::new(),
        }
    }

    /// Build the configured backends in order
    pub fn from_config(config: &TranslatorConfig) -> Result<Self> {
        config.validate()?;

        let backends = config
            .backends
            .iter()
            .map(|kind| crate::backends::build(*kind, config))
            .collect::<Result<Vec<_>>>()?;

        Ok(Self::new(backends))
    }

    /// Create from environment
    pub fn from_env() -> Result<Self> {
        let config = TranslatorConfig::load()?;
        Self::from_config(&config)
    }

    /// Backend names in fallback order
    pub fn backend_names(&self) -> Vec<&str> {
        self.backends.iter().map(|b| b.name()).collect()
    }

    pub fn is_disposed(&self) -> bool {
        self.disposed.is_disposed()
    }

    /// Whether any backend supports the language given as code, name or alias
    pub fn is_language_supported(&self, language: &str) -> bool {
        Language::resolve(language)
            .map(|lang| self.backends.iter().any(|b| b.is_language_supported(&lang)))
            .unwrap_or(false)
    }

    /// Translate `text` into `to`, optionally from `from`
    pub async fn translate(
        &self,
        text: &str,
        to: &str,
        from: Option<&str>,
    ) -> Result<AggregateOutcome<TranslationResult>> {
        self.translate_cancellable(text, to, from, &CancellationToken::new())
            .await
    }

    pub async fn translate_cancellable(
        &self,
        text: &str,
        to: &str,
        from: Option<&str>,
        cancel: &CancellationToken,
    ) -> Result<AggregateOutcome<TranslationResult>> {
        let request = self.build_request(text, to, from)?;
        self.translate_request(&request, cancel).await
    }

    /// Translate a pre-resolved request
    pub async fn translate_request(
        &self,
        request: &TranslationRequest,
        cancel: &CancellationToken,
    ) -> Result<AggregateOutcome<TranslationResult>> {
        self.ensure_active()?;
        validate_text(&request.text)?;
        let candidates = self.eligible(request)?;

        self.fallback("translate", candidates, cancel, |backend| {
            backend.translate(request, cancel)
        })
        .await
    }

    /// Transliterate `text` into the script of `to`
    pub async fn transliterate(
        &self,
        text: &str,
        to: &str,
        from: Option<&str>,
    ) -> Result<AggregateOutcome<TransliterationResult>> {
        self.transliterate_cancellable(text, to, from, &CancellationToken::new())
            .await
    }

    pub async fn transliterate_cancellable(
        &self,
        text: &str,
        to: &str,
        from: Option<&str>,
        cancel: &CancellationToken,
    ) -> Result<AggregateOutcome<TransliterationResult>> {
        let request = self.build_request(text, to, from)?;
        self.transliterate_request(&request, cancel).await
    }

    /// Transliterate a pre-resolved request
    pub async fn transliterate_request(
        &self,
        request: &TranslationRequest,
        cancel: &CancellationToken,
    ) -> Result<AggregateOutcome<TransliterationResult>> {
        self.ensure_active()?;
        validate_text(&request.text)?;
        let candidates = self.eligible(request)?;

        self.fallback("transliterate", candidates, cancel, |backend| {
            backend.transliterate(request, cancel)
        })
        .await
    }

    /// Detect the language of `text`
    pub async fn detect_language(&self, text: &str) -> Result<AggregateOutcome<DetectionResult>> {
        self.detect_language_cancellable(text, &CancellationToken::new())
            .await
    }

    /// Detection tries every backend in order; there is no language to filter on
    pub async fn detect_language_cancellable(
        &self,
        text: &str,
        cancel: &CancellationToken,
    ) -> Result<AggregateOutcome<DetectionResult>> {
        self.ensure_active()?;
        validate_text(text)?;
        let candidates: Vec<&dyn Backend> = self.backends.iter().map(|b| b.as_ref()).collect();

        self.fallback("detect language", candidates, cancel, |backend| {
            Box::pin(async move {
                backend
                    .detect_language(text, cancel)
                    .await
                    .map(|language| DetectionResult {
                        language,
                        backend: backend.name().to_string(),
                    })
            })
        })
        .await
    }

    /// Dispose every backend in order. Later calls fail with `Disposed`.
    pub fn dispose(&self) {
        if !self.disposed.dispose() {
            return;
        }

        for backend in &self.backends {
            debug!("Disposing backend {}", backend.name());
            backend.dispose();
        }
        info!("Translator disposed");
    }

    fn ensure_active(&self) -> Result<()> {
        if self.disposed.is_disposed() {
            return Err(TranslationError::Disposed);
        }
        Ok(())
    }

    fn build_request(&self, text: &str, to: &str, from: Option<&str>) -> Result<TranslationRequest> {
        self.ensure_active()?;
        validate_text(text)?;

        let target = resolve(to)?;
        let mut request = TranslationRequest::new(text, target);
        if let Some(from) = from {
            request = request.with_source(resolve(from)?);
        }

        Ok(request)
    }

    /// Backends that support every language of the request, in order
    fn eligible(&self, request: &TranslationRequest) -> Result<Vec<&dyn Backend>> {
        let candidates: Vec<&dyn Backend> = self
            .backends
            .iter()
            .map(|b| b.as_ref())
            .filter(|backend| {
                let supported = request
                    .languages()
                    .all(|lang| backend.is_language_supported(lang));
                if !supported {
                    debug!("Skipping backend {}: language not supported", backend.name());
                }
                supported
            })
            .collect();

        if candidates.is_empty() {
            let language = match &request.source {
                Some(source) => format!("{} -> {}", source.code, request.target.code),
                None => request.target.code.to_string(),
            };
            return Err(TranslationError::UnsupportedLanguage { language });
        }

        Ok(candidates)
    }

    /// Try candidates left to right until one succeeds
    async fn fallback<'a, T, F>(
        &self,
        operation: &str,
        candidates: Vec<&'a dyn Backend>,
        cancel: &CancellationToken,
        mut attempt: F,
    ) -> Result<AggregateOutcome<T>>
    where
        F: FnMut(&'a dyn Backend) -> Attempt<'a, T>,
    {
        let mut errors = AttemptErrors::new();

        for backend in candidates {
            if cancel.is_cancelled() {
                debug!("{} cancelled before trying {}", operation, backend.name());
                return Err(TranslationError::Cancelled);
            }
            self.ensure_active()?;

            debug!("Trying {} with backend {}", operation, backend.name());
            match attempt(backend).await {
                Ok(result) => {
                    if !errors.is_empty() {
                        info!(
                            "{} succeeded with {} after {} failed attempt(s)",
                            operation,
                            backend.name(),
                            errors.len()
                        );
                    }
                    return Ok(AggregateOutcome { result, errors });
                }
                Err(e) if e.is_cancellation() => {
                    debug!("{} cancelled during {}", operation, backend.name());
                    return Err(TranslationError::Cancelled);
                }
                Err(e) => {
                    warn!("Backend {} failed to {}: {}", backend.name(), operation, e);
                    errors.record(backend.name(), e);
                }
            }
        }

        Err(AggregateFailure { errors }.into())
    }
}

impl Drop for Orchestrator {
    fn drop(&mut self) {
        self.dispose();
    }
}

fn validate_text(text: &str) -> Result<()> {
    if text.trim().is_empty() {
        return Err(TranslationError::Validation {
            message: "text must not be empty".to_string(),
        });
    }
    Ok(())
}

/// Unknown language strings can never be served by any backend
fn resolve(language: &str) -> Result<Language> {
    Language::resolve(language).ok_or_else(|| TranslationError::UnsupportedLanguage {
        language: language.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::testing::{lang, Script, ScriptedBackend};
    use std::sync::atomic::Ordering;

    fn boxed(backend: ScriptedBackend) -> Box<dyn Backend> {
        Box::new(backend)
    }

    #[tokio::test]
    async fn test_first_supporting_backend_wins() {
        let a = ScriptedBackend::succeeding("A", &["en", "fr"], "bonjour");
        let b = ScriptedBackend::succeeding("B", &["en", "es"], "hola");
        let c = ScriptedBackend::succeeding("C", &["en", "es"], "buenas");
        let (a_calls, c_calls) = (a.calls(), c.calls());
        let orchestrator = Orchestrator::new(vec![boxed(a), boxed(b), boxed(c)]);

        let outcome = orchestrator.translate("hello", "es", None).await.unwrap();
        assert!(outcome.is_clean());
        assert_eq!(outcome.result.backend, "B");
        assert_eq!(outcome.result.translation, "hola");
        assert_eq!(outcome.result.target_language.code, "es");
        assert_eq!(a_calls.load(Ordering::SeqCst), 0);
        assert_eq!(c_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_skip_fail_then_succeed() {
        let a = ScriptedBackend::succeeding("A", &["en", "fr"], "bonjour");
        let b = ScriptedBackend::failing("B", &["en", "es"], "network");
        let c = ScriptedBackend::succeeding("C", &["en", "es"], "hola");
        let (a_calls, b_calls, c_calls) = (a.calls(), b.calls(), c.calls());
        let orchestrator = Orchestrator::new(vec![boxed(a), boxed(b), boxed(c)]);

        let outcome = orchestrator.translate("hello", "es", None).await.unwrap();
        assert_eq!(outcome.result.backend, "C");
        assert_eq!(outcome.errors.len(), 1);
        assert!(!outcome.errors.contains("A"));
        assert_eq!(
            outcome.errors.get("B").unwrap().to_string(),
            "Network error: network"
        );
        assert_eq!(a_calls.load(Ordering::SeqCst), 0);
        assert_eq!(b_calls.load(Ordering::SeqCst), 1);
        assert_eq!(c_calls.load(Ordering::SeqCst), 1);
        assert_eq!(outcome.into_inner().translation, "hola");
    }

    #[tokio::test]
    async fn test_unknown_language_touches_no_backend() {
        let a = ScriptedBackend::succeeding("A", &["en", "es"], "hola");
        let calls = a.calls();
        let orchestrator = Orchestrator::new(vec![boxed(a)]);

        let err = orchestrator.translate("hello", "xx-unknown", None).await.unwrap_err();
        assert!(matches!(err, TranslationError::UnsupportedLanguage { ref language } if language == "xx-unknown"));
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_language_no_backend_supports() {
        let a = ScriptedBackend::succeeding("A", &["en", "es"], "hola");
        let b = ScriptedBackend::succeeding("B", &["en", "fr"], "salut");
        let (a_calls, b_calls) = (a.calls(), b.calls());
        let orchestrator = Orchestrator::new(vec![boxed(a), boxed(b)]);

        let err = orchestrator.translate("hello", "ja", None).await.unwrap_err();
        assert!(matches!(err, TranslationError::UnsupportedLanguage { .. }));
        assert_eq!(a_calls.load(Ordering::SeqCst), 0);
        assert_eq!(b_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_source_language_filters_backends() {
        let a = ScriptedBackend::succeeding("A", &["es"], "hola");
        let b = ScriptedBackend::succeeding("B", &["es", "de"], "hola (de)");
        let a_calls = a.calls();
        let orchestrator = Orchestrator::new(vec![boxed(a), boxed(b)]);

        let outcome = orchestrator.translate("hallo", "es", Some("de")).await.unwrap();
        assert_eq!(outcome.result.backend, "B");
        assert_eq!(outcome.result.source_language.unwrap().code, "de");
        assert_eq!(a_calls.load(Ordering::SeqCst), 0);

        let err = orchestrator.translate("hallo", "es", Some("ja")).await.unwrap_err();
        assert!(matches!(err, TranslationError::UnsupportedLanguage { ref language } if language == "ja -> es"));
    }

    #[tokio::test]
    async fn test_all_eligible_fail() {
        let a = ScriptedBackend::failing("A", &["es"], "timeout");
        let b = ScriptedBackend::succeeding("B", &["fr"], "salut");
        let c = ScriptedBackend::failing("C", &["es"], "bad gateway");
        let orchestrator = Orchestrator::new(vec![boxed(a), boxed(b), boxed(c)]);

        let err = orchestrator.translate("hello", "es", None).await.unwrap_err();
        match err {
            TranslationError::AllFailed(failure) => {
                assert_eq!(failure.errors.len(), 2);
                assert_eq!(failure.errors.backends().collect::<Vec<_>>(), vec!["A", "C"]);
            }
            other => panic!("expected aggregate failure, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_empty_text_is_rejected() {
        let a = ScriptedBackend::succeeding("A", &["es"], "hola");
        let calls = a.calls();
        let orchestrator = Orchestrator::new(vec![boxed(a)]);

        for text in ["", "   \n"] {
            let err = orchestrator.translate(text, "es", None).await.unwrap_err();
            assert!(matches!(err, TranslationError::Validation { .. }));
        }
        let err = orchestrator.detect_language("").await.unwrap_err();
        assert!(matches!(err, TranslationError::Validation { .. }));
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_cancelled_before_start() {
        let a = ScriptedBackend::succeeding("A", &["es"], "hola");
        let calls = a.calls();
        let orchestrator = Orchestrator::new(vec![boxed(a)]);
        let cancel = CancellationToken::new();
        cancel.cancel();

        let err = orchestrator
            .translate_cancellable("hello", "es", None, &cancel)
            .await
            .unwrap_err();
        assert!(matches!(err, TranslationError::Cancelled));
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_cancel_between_attempts_stops_fallback() {
        let cancel = CancellationToken::new();
        let a = ScriptedBackend::new("A", &["es"], Script::CancelThenFail(cancel.clone()));
        let b = ScriptedBackend::succeeding("B", &["es"], "hola");
        let b_calls = b.calls();
        let orchestrator = Orchestrator::new(vec![boxed(a), boxed(b)]);

        let err = orchestrator
            .translate_cancellable("hello", "es", None, &cancel)
            .await
            .unwrap_err();
        assert!(matches!(err, TranslationError::Cancelled));
        assert_eq!(b_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_backend_cancellation_is_not_recorded() {
        let a = ScriptedBackend::new("A", &["es"], Script::Cancelled);
        let b = ScriptedBackend::succeeding("B", &["es"], "hola");
        let b_calls = b.calls();
        let orchestrator = Orchestrator::new(vec![boxed(a), boxed(b)]);

        let err = orchestrator.transliterate("hello", "es", None).await.unwrap_err();
        assert!(matches!(err, TranslationError::Cancelled));
        assert_eq!(b_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_transliterate_falls_back() {
        let a = ScriptedBackend::failing("A", &["ja"], "no script");
        let b = ScriptedBackend::succeeding("B", &["ja"], "konnichiwa");
        let orchestrator = Orchestrator::new(vec![boxed(a), boxed(b)]);

        let outcome = orchestrator.transliterate("こんにちは", "ja", None).await.unwrap();
        assert_eq!(outcome.result.transliteration, "konnichiwa");
        assert_eq!(outcome.result.backend, "B");
        assert!(outcome.errors.contains("A"));
    }

    #[tokio::test]
    async fn test_detect_ignores_language_support() {
        let a = ScriptedBackend::failing("A", &[], "down");
        let b = ScriptedBackend::succeeding("B", &[], "").detecting("de");
        let orchestrator = Orchestrator::new(vec![boxed(a), boxed(b)]);

        let outcome = orchestrator.detect_language("Guten Morgen").await.unwrap();
        assert_eq!(outcome.result.language.code, "de");
        assert_eq!(outcome.result.backend, "B");
        assert_eq!(outcome.errors.backends().collect::<Vec<_>>(), vec!["A"]);
    }

    #[tokio::test]
    async fn test_dispose_cascades_and_blocks_calls() {
        let a = ScriptedBackend::succeeding("A", &["es"], "hola");
        let b = ScriptedBackend::succeeding("B", &["es"], "hola");
        let (a_calls, a_disposals, b_disposals) = (a.calls(), a.disposals(), b.disposals());
        let orchestrator = Orchestrator::new(vec![boxed(a), boxed(b)]);

        orchestrator.dispose();
        orchestrator.dispose();
        assert!(orchestrator.is_disposed());
        assert_eq!(a_disposals.load(Ordering::SeqCst), 1);
        assert_eq!(b_disposals.load(Ordering::SeqCst), 1);

        let err = orchestrator.translate("hello", "es", None).await.unwrap_err();
        assert!(matches!(err, TranslationError::Disposed));
        let err = orchestrator.detect_language("hello").await.unwrap_err();
        assert!(matches!(err, TranslationError::Disposed));
        let request = TranslationRequest::new("hello", lang("es"));
        let err = orchestrator
            .transliterate_request(&request, &CancellationToken::new())
            .await
            .unwrap_err();
        assert!(matches!(err, TranslationError::Disposed));
        assert_eq!(a_calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_is_language_supported() {
        let a = ScriptedBackend::succeeding("A", &["es"], "hola");
        let b = ScriptedBackend::succeeding("B", &["zh-Hant"], "你好");
        let orchestrator = Orchestrator::new(vec![boxed(a), boxed(b)]);

        assert!(orchestrator.is_language_supported("Spanish"));
        assert!(orchestrator.is_language_supported("zh-TW"));
        assert!(!orchestrator.is_language_supported("fr"));
        assert!(!orchestrator.is_language_supported("xx-unknown"));
        assert_eq!(orchestrator.backend_names(), vec!["A", "B"]);
    }
}
