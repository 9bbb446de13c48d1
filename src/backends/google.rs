//! Google Translate backend (keyless `translate_a/single` endpoint)

use async_trait::async_trait;
use serde::Deserialize;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::backends::{build_client, parse_json, send_text};
use crate::core::backend::{Backend, DisposeFlag};
use crate::core::config::TranslatorConfig;
use crate::core::errors::BackendError;
use crate::core::language::Language;
use crate::core::models::{TranslationRequest, TranslationResult, TransliterationResult};

pub const NAME: &str = "Google";

const TRANSLATE_URL: &str = "https://translate.googleapis.com/translate_a/single";

/// Google translation backend; needs no credential
#[derive(Debug)]
pub struct GoogleBackend {
    client: reqwest::Client,
    disposed: DisposeFlag,
}

impl GoogleBackend {
    pub fn new(config: &TranslatorConfig) -> reqwest::Result<Self> {
        Ok(Self::with_client(build_client(config)?))
    }

    pub fn with_client(client: reqwest::Client) -> Self {
        Self {
            client,
            disposed: DisposeFlag::new(),
        }
    }

    async fn query(
        &self,
        text: &str,
        target: &str,
        source: Option<&Language>,
        cancel: &CancellationToken,
    ) -> Result<GoogleResponse, BackendError> {
        self.disposed.ensure_active()?;

        let source = source.map(api_code).unwrap_or("auto");
        debug!("Google query {} -> {}", source, target);

        let request = self
            .client
            .post(TRANSLATE_URL)
            .query(&[
                ("client", "gtx"),
                ("sl", source),
                ("tl", target),
                ("dt", "t"),
                ("dt", "rm"),
                ("dj", "1"),
                ("ie", "UTF-8"),
                ("oe", "UTF-8"),
            ])
            .form(&[("q", text)]);

        let body = send_text(request, cancel).await?;
        parse_json(&body)
    }
}

#[async_trait]
impl Backend for GoogleBackend {
    fn name(&self) -> &str {
        NAME
    }

    async fn translate(
        &self,
        request: &TranslationRequest,
        cancel: &CancellationToken,
    ) -> Result<TranslationResult, BackendError> {
        let response = self
            .query(&request.text, api_code(&request.target), request.source.as_ref(), cancel)
            .await?;

        let translation = response.translation().ok_or_else(|| BackendError::InvalidResponse {
            message: "No translation in response".to_string(),
        })?;

        Ok(TranslationResult {
            translation,
            source_text: request.text.clone(),
            target_language: request.target,
            source_language: request.source.or_else(|| response.source_language()),
            backend: NAME.to_string(),
        })
    }

    async fn transliterate(
        &self,
        request: &TranslationRequest,
        cancel: &CancellationToken,
    ) -> Result<TransliterationResult, BackendError> {
        let response = self
            .query(&request.text, api_code(&request.target), request.source.as_ref(), cancel)
            .await?;

        let transliteration = response.transliteration().ok_or_else(|| BackendError::InvalidResponse {
            message: "No transliteration in response".to_string(),
        })?;

        Ok(TransliterationResult {
            transliteration,
            source_text: request.text.clone(),
            target_language: request.target,
            source_language: request.source.or_else(|| response.source_language()),
            backend: NAME.to_string(),
        })
    }

    async fn detect_language(
        &self,
        text: &str,
        cancel: &CancellationToken,
    ) -> Result<Language, BackendError> {
        let response = self.query(text, "en", None, cancel).await?;

        response.source_language().ok_or_else(|| BackendError::InvalidResponse {
            message: format!("Unknown detected language: {:?}", response.src),
        })
    }

    fn is_language_supported(&self, language: &Language) -> bool {
        Language::all().contains(language)
    }

    fn dispose(&self) {
        self.disposed.dispose();
    }
}

/// Google's code for a language
fn api_code(language: &Language) -> &'static str {
    match language.code {
        "zh" => "zh-CN",
        "zh-Hant" => "zh-TW",
        "he" => "iw",
        "fil" => "tl",
        code => code,
    }
}

/// `dj=1` response body
#[derive(Debug, Deserialize)]
struct GoogleResponse {
    #[serde(default)]
    sentences: Vec<Sentence>,
    src: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Sentence {
    trans: Option<String>,
    translit: Option<String>,
}

impl GoogleResponse {
    fn translation(&self) -> Option<String> {
        let text: String = self
            .sentences
            .iter()
            .filter_map(|s| s.trans.as_deref())
            .collect();
        (!text.is_empty()).then_some(text)
    }

    /// Transliteration of the translated text
    fn transliteration(&self) -> Option<String> {
        let text: String = self
            .sentences
            .iter()
            .filter_map(|s| s.translit.as_deref())
            .collect();
        (!text.is_empty()).then_some(text)
    }

    fn source_language(&self) -> Option<Language> {
        self.src.as_deref().and_then(Language::resolve)
    }
}
