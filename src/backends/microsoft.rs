//! Microsoft Translator backend authenticated with the Edge browser token

use async_trait::async_trait;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use chrono::{DateTime, Utc};
use serde::Deserialize;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::backends::{build_client, fetch_text, parse_json, send_text};
use crate::core::backend::{Backend, DisposeFlag};
use crate::core::cache::CacheEntry;
use crate::core::config::TranslatorConfig;
use crate::core::errors::{BackendError, CredentialError};
use crate::core::language::Language;
use crate::core::models::{TranslationRequest, TranslationResult, TransliterationResult};
use crate::core::session::{CredentialSource, SessionManager};

pub const NAME: &str = "Microsoft";

const AUTH_URL: &str = "https://edge.microsoft.com/translate/auth";
const API_URL: &str = "https://api-edge.cognitive.microsofttranslator.com";
const API_VERSION: &str = "3.0";

/// Languages without a Translator v3 counterpart
const UNSUPPORTED: &[&str] = &["la"];

/// Bearer token issued to the Edge browser
#[derive(Debug, Clone)]
pub struct AuthToken {
    pub token: String,
    pub expires_at: DateTime<Utc>,
}

/// Fetches Edge auth tokens
#[derive(Debug)]
pub struct EdgeTokenSource {
    client: reqwest::Client,
}

#[async_trait]
impl CredentialSource for EdgeTokenSource {
    type Credential = AuthToken;

    async fn refresh(&self) -> Result<CacheEntry<AuthToken>, CredentialError> {
        let body = fetch_text(self.client.get(AUTH_URL))
            .await
            .map_err(|e| CredentialError::Request {
                message: e.to_string(),
            })?;
        parse_token(&body)
    }
}

#[derive(Deserialize)]
struct Claims {
    exp: i64,
}

/// Read the expiration from the JWT `exp` claim
pub(crate) fn parse_token(body: &str) -> Result<CacheEntry<AuthToken>, CredentialError> {
    let token = body.trim();
    let payload = token
        .split('.')
        .nth(1)
        .filter(|part| !part.is_empty())
        .ok_or_else(|| CredentialError::Parse {
            message: "Auth token is not a JWT".to_string(),
        })?;

    let decoded = URL_SAFE_NO_PAD
        .decode(payload.trim_end_matches('='))
        .map_err(|e| CredentialError::Parse {
            message: format!("Invalid JWT payload: {}", e),
        })?;
    let claims: Claims = serde_json::from_slice(&decoded).map_err(|e| CredentialError::Parse {
        message: format!("Invalid JWT claims: {}", e),
    })?;

    let expires_at = DateTime::from_timestamp(claims.exp, 0).ok_or_else(|| CredentialError::Parse {
        message: format!("Invalid exp claim: {}", claims.exp),
    })?;

    Ok(CacheEntry::expiring_at(
        AuthToken {
            token: token.to_string(),
            expires_at,
        },
        expires_at,
    ))
}

/// Microsoft Translator v3 backend
pub struct MicrosoftBackend {
    client: reqwest::Client,
    session: SessionManager<EdgeTokenSource>,
    disposed: DisposeFlag,
}

impl MicrosoftBackend {
    pub fn new(config: &TranslatorConfig) -> reqwest::Result<Self> {
        Ok(Self::with_client(build_client(config)?))
    }

    pub fn with_client(client: reqwest::Client) -> Self {
        let source = EdgeTokenSource {
            client: client.clone(),
        };
        Self {
            client,
            session: SessionManager::new(NAME, source),
            disposed: DisposeFlag::new(),
        }
    }

    async fn call(
        &self,
        path: &str,
        params: &[(&str, &str)],
        text: &str,
        cancel: &CancellationToken,
    ) -> Result<String, BackendError> {
        self.disposed.ensure_active()?;
        let auth = self.session.get_or_refresh(cancel).await?;

        debug!("Microsoft {} {:?}", path, params);
        let request = self
            .client
            .post(format!("{}{}", API_URL, path))
            .query(&[("api-version", API_VERSION)])
            .query(params)
            .bearer_auth(&auth.token)
            .json(&request_body(text));

        send_text(request, cancel).await
    }

    async fn translate_item(
        &self,
        request: &TranslationRequest,
        to_script: Option<&str>,
        cancel: &CancellationToken,
    ) -> Result<TranslateItem, BackendError> {
        let mut params = vec![("to", api_code(&request.target))];
        if let Some(source) = &request.source {
            params.push(("from", api_code(source)));
        }
        if let Some(script) = to_script {
            params.push(("toScript", script));
        }

        let body = self.call("/translate", &params, &request.text, cancel).await?;
        first_item(parse_json(&body)?)
    }
}

#[async_trait]
impl Backend for MicrosoftBackend {
    fn name(&self) -> &str {
        NAME
    }

    async fn translate(
        &self,
        request: &TranslationRequest,
        cancel: &CancellationToken,
    ) -> Result<TranslationResult, BackendError> {
        let item = self.translate_item(request, None, cancel).await?;
        let translation = item.translation()?.text.clone();

        Ok(TranslationResult {
            translation,
            source_text: request.text.clone(),
            target_language: request.target,
            source_language: request.source.or_else(|| item.detected()),
            backend: NAME.to_string(),
        })
    }

    async fn transliterate(
        &self,
        request: &TranslationRequest,
        cancel: &CancellationToken,
    ) -> Result<TransliterationResult, BackendError> {
        let item = self.translate_item(request, Some("Latn"), cancel).await?;
        let transliteration = item.transliteration()?;

        Ok(TransliterationResult {
            transliteration,
            source_text: request.text.clone(),
            target_language: request.target,
            source_language: request.source.or_else(|| item.detected()),
            backend: NAME.to_string(),
        })
    }

    async fn detect_language(
        &self,
        text: &str,
        cancel: &CancellationToken,
    ) -> Result<Language, BackendError> {
        let body = self.call("/detect", &[], text, cancel).await?;
        let detections: Vec<DetectedLanguage> = parse_json(&body)?;

        detections
            .first()
            .and_then(DetectedLanguage::resolve)
            .ok_or_else(|| BackendError::InvalidResponse {
                message: "No detected language in response".to_string(),
            })
    }

    fn is_language_supported(&self, language: &Language) -> bool {
        is_supported(language)
    }

    fn dispose(&self) {
        if self.disposed.dispose() {
            self.session.reset();
        }
    }
}

pub(crate) fn is_supported(language: &Language) -> bool {
    Language::all().contains(language) && !UNSUPPORTED.contains(&language.code)
}

/// Translator v3 code for a language
pub(crate) fn api_code(language: &Language) -> &'static str {
    match language.code {
        "zh" => "zh-Hans",
        "no" => "nb",
        "mn" => "mn-Cyrl",
        "sr" => "sr-Cyrl",
        code => code,
    }
}

fn request_body(text: &str) -> serde_json::Value {
    serde_json::json!([{ "Text": text }])
}

#[derive(Debug, Deserialize)]
pub(crate) struct DetectedLanguage {
    pub language: String,
}

impl DetectedLanguage {
    fn resolve(&self) -> Option<Language> {
        Language::resolve(&self.language)
    }
}

/// One element of a translate response array
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct TranslateItem {
    pub detected_language: Option<DetectedLanguage>,
    #[serde(default)]
    pub translations: Vec<TranslationEntry>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct TranslationEntry {
    pub text: String,
    pub transliteration: Option<TransliterationEntry>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct TransliterationEntry {
    pub text: String,
}

impl TranslateItem {
    pub(crate) fn translation(&self) -> Result<&TranslationEntry, BackendError> {
        self.translations.first().ok_or_else(|| BackendError::InvalidResponse {
            message: "No translation in response".to_string(),
        })
    }

    pub(crate) fn transliteration(&self) -> Result<String, BackendError> {
        self.translation()?
            .transliteration
            .as_ref()
            .map(|t| t.text.clone())
            .ok_or_else(|| BackendError::InvalidResponse {
                message: "No transliteration in response".to_string(),
            })
    }

    pub(crate) fn detected(&self) -> Option<Language> {
        self.detected_language.as_ref().and_then(DetectedLanguage::resolve)
    }
}

pub(crate) fn first_item(items: Vec<TranslateItem>) -> Result<TranslateItem, BackendError> {
    items.into_iter().next().ok_or_else(|| BackendError::InvalidResponse {
        message: "Empty response array".to_string(),
    })
}
