//! Bing Translator backend using the session scraped from the translator page

use std::sync::OnceLock;

use async_trait::async_trait;
use chrono::DateTime;
use regex::Regex;
use serde::Deserialize;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::backends::microsoft::{api_code, first_item, is_supported, TranslateItem};
use crate::backends::{build_client, fetch_text, parse_json, send_text};
use crate::core::backend::{Backend, DisposeFlag};
use crate::core::cache::CacheEntry;
use crate::core::config::TranslatorConfig;
use crate::core::errors::{BackendError, CredentialError};
use crate::core::language::Language;
use crate::core::models::{TranslationRequest, TranslationResult, TransliterationResult};
use crate::core::session::{CredentialSource, SessionManager};

pub const NAME: &str = "Bing";

const PAGE_URL: &str = "https://www.bing.com/translator";
const TRANSLATE_URL: &str = "https://www.bing.com/ttranslatev3";
const DEFAULT_IID: &str = "translator.5028";
const AUTO_DETECT: &str = "auto-detect";

/// Anti-abuse parameters embedded in the translator page
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BingSession {
    /// Issue timestamp in milliseconds, sent back as `key`
    pub key: i64,
    pub token: String,
    /// Correlation id
    pub ig: String,
    pub iid: String,
}

/// Scrapes a fresh session from the translator page
#[derive(Debug)]
pub struct PageSessionSource {
    client: reqwest::Client,
}

#[async_trait]
impl CredentialSource for PageSessionSource {
    type Credential = BingSession;

    async fn refresh(&self) -> Result<CacheEntry<BingSession>, CredentialError> {
        let html = fetch_text(self.client.get(PAGE_URL))
            .await
            .map_err(|e| CredentialError::Request {
                message: e.to_string(),
            })?;
        parse_session(&html)
    }
}

fn abuse_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r#"params_AbusePreventionHelper\s*=\s*\[\s*(\d+)\s*,\s*"([^"]+)"\s*,\s*(\d+)"#)
            .expect("valid regex")
    })
}

fn ig_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r#"IG\s*:\s*"([0-9A-Fa-f]+)""#).expect("valid regex"))
}

fn iid_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r#"data-iid\s*=\s*"([^"]+)""#).expect("valid regex"))
}

/// Extract the session; it expires `interval` ms after `key`
pub(crate) fn parse_session(html: &str) -> Result<CacheEntry<BingSession>, CredentialError> {
    let missing = |what: &str| CredentialError::Parse {
        message: format!("Could not find {} in translator page", what),
    };

    let abuse = abuse_regex()
        .captures(html)
        .ok_or_else(|| missing("params_AbusePreventionHelper"))?;
    let key: i64 = abuse[1].parse().map_err(|_| missing("a numeric key"))?;
    let token = abuse[2].to_string();
    let interval: i64 = abuse[3].parse().map_err(|_| missing("a numeric interval"))?;

    let ig = ig_regex()
        .captures(html)
        .map(|c| c[1].to_string())
        .ok_or_else(|| missing("IG"))?;
    let iid = iid_regex()
        .captures(html)
        .map(|c| c[1].to_string())
        .unwrap_or_else(|| DEFAULT_IID.to_string());

    let expires_at = key
        .checked_add(interval)
        .and_then(DateTime::from_timestamp_millis)
        .ok_or_else(|| CredentialError::Parse {
            message: format!("Invalid session window: {} + {}", key, interval),
        })?;

    Ok(CacheEntry::expiring_at(
        BingSession { key, token, ig, iid },
        expires_at,
    ))
}

/// Error object returned with a 200 status
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct BingError {
    status_code: u16,
    error_message: Option<String>,
}

fn parse_response(body: &str) -> Result<TranslateItem, BackendError> {
    if let Ok(error) = serde_json::from_str::<BingError>(body) {
        return Err(BackendError::Api {
            status: error.status_code,
            message: error.error_message.unwrap_or_default(),
        });
    }
    first_item(parse_json(body)?)
}

/// Bing Translator backend
pub struct BingBackend {
    client: reqwest::Client,
    session: SessionManager<PageSessionSource>,
    disposed: DisposeFlag,
}

impl BingBackend {
    pub fn new(config: &TranslatorConfig) -> reqwest::Result<Self> {
        Ok(Self::with_client(build_client(config)?))
    }

    pub fn with_client(client: reqwest::Client) -> Self {
        let source = PageSessionSource {
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
        text: &str,
        to: &str,
        from: Option<&Language>,
        cancel: &CancellationToken,
    ) -> Result<TranslateItem, BackendError> {
        self.disposed.ensure_active()?;
        let session = self.session.get_or_refresh(cancel).await?;

        let from = from.map(api_code).unwrap_or(AUTO_DETECT);
        debug!("Bing translate {} -> {}", from, to);

        let key = session.key.to_string();
        let request = self
            .client
            .post(TRANSLATE_URL)
            .query(&[
                ("isVertical", "1"),
                ("IG", session.ig.as_str()),
                ("IID", session.iid.as_str()),
            ])
            .form(&[
                ("fromLang", from),
                ("to", to),
                ("text", text),
                ("token", session.token.as_str()),
                ("key", key.as_str()),
            ]);

        let body = send_text(request, cancel).await?;
        parse_response(&body)
    }
}

#[async_trait]
impl Backend for BingBackend {
    fn name(&self) -> &str {
        NAME
    }

    async fn translate(
        &self,
        request: &TranslationRequest,
        cancel: &CancellationToken,
    ) -> Result<TranslationResult, BackendError> {
        let item = self
            .call(&request.text, api_code(&request.target), request.source.as_ref(), cancel)
            .await?;
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
        let item = self
            .call(&request.text, api_code(&request.target), request.source.as_ref(), cancel)
            .await?;
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
        let item = self.call(text, "en", None, cancel).await?;

        item.detected().ok_or_else(|| BackendError::InvalidResponse {
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
