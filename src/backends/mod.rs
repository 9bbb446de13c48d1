//! Concrete translation services

pub mod bing;
pub mod google;
pub mod microsoft;

use std::time::Duration;

use serde::de::DeserializeOwned;
use tokio_util::sync::CancellationToken;

use crate::core::backend::Backend;
use crate::core::cancel::or_cancelled;
use crate::core::config::{BackendKind, TranslatorConfig};
use crate::core::errors::{BackendError, Result};

pub use bing::BingBackend;
pub use google::GoogleBackend;
pub use microsoft::MicrosoftBackend;

/// Build one configured backend
pub fn build(kind: BackendKind, config: &TranslatorConfig) -> Result<Box<dyn Backend>> {
    let backend: Box<dyn Backend> = match kind {
        BackendKind::Google => Box::new(GoogleBackend::new(config)?),
        BackendKind::Microsoft => Box::new(MicrosoftBackend::new(config)?),
        BackendKind::Bing => Box::new(BingBackend::new(config)?),
    };
    Ok(backend)
}

/// HTTP client owned by a single backend
pub(crate) fn build_client(config: &TranslatorConfig) -> reqwest::Result<reqwest::Client> {
    reqwest::Client::builder()
        .timeout(Duration::from_millis(config.timeout_ms))
        .pool_idle_timeout(Some(Duration::from_secs(config.pool_idle_timeout_secs)))
        .pool_max_idle_per_host(config.pool_max_idle_per_host)
        .user_agent(config.user_agent.clone())
        .build()
}

/// Send a request and return the body of a successful response
pub(crate) async fn fetch_text(request: reqwest::RequestBuilder) -> std::result::Result<String, BackendError> {
    let response = request.send().await.map_err(|e| BackendError::Network {
        message: e.to_string(),
    })?;

    let status = response.status();
    let body = response.text().await.map_err(|e| BackendError::Network {
        message: e.to_string(),
    })?;

    if !status.is_success() {
        return Err(BackendError::Api {
            status: status.as_u16(),
            message: body,
        });
    }

    Ok(body)
}

/// [`fetch_text`] that gives up as soon as `cancel` fires
pub(crate) async fn send_text(
    request: reqwest::RequestBuilder,
    cancel: &CancellationToken,
) -> std::result::Result<String, BackendError> {
    or_cancelled(cancel, BackendError::Cancelled, fetch_text(request)).await
}

pub(crate) fn parse_json<T: DeserializeOwned>(body: &str) -> std::result::Result<T, BackendError> {
    serde_json::from_str(body).map_err(|e| BackendError::InvalidResponse {
        message: e.to_string(),
    })
}
