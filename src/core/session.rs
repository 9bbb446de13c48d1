//! Per-backend credential cache with single-flight refresh

use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::RwLock;
use tokio::sync::Mutex;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::core::cache::CacheEntry;
use crate::core::cancel::or_cancelled;
use crate::core::errors::CredentialError;

/// Backend-specific refresh operation
#[async_trait]
pub trait CredentialSource: Send + Sync {
    /// Credential payload handed to the backend
    type Credential: Clone + Send + Sync + 'static;

    /// Issue one refresh request and extract the credential and its expiration
    async fn refresh(&self) -> Result<CacheEntry<Self::Credential>, CredentialError>;
}

/// Caches a credential and refreshes it on demand.
///
/// Readers take the fast path through a short read lock on the published
/// entry. When the entry is missing or expired, callers queue on a per-instance
/// mutex and re-check after acquiring it, so concurrent callers trigger exactly
/// one refresh and all observe the entry the winner published. A failed
/// refresh publishes nothing and the next caller tries again.
pub struct SessionManager<S: CredentialSource> {
    name: String,
    source: S,
    current: RwLock<Option<Arc<CacheEntry<S::Credential>>>>,
    refresh_lock: Mutex<()>,
}

impl<S: CredentialSource> SessionManager<S> {
    /// Create a session manager with no cached credential
    pub fn new(name: impl Into<String>, source: S) -> Self {
        Self {
            name: name.into(),
            source,
            current: RwLock::new(None),
            refresh_lock: Mutex::new(()),
        }
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    /// Currently published entry, expired or not
    pub fn current(&self) -> Option<Arc<CacheEntry<S::Credential>>> {
        self.current.read().clone()
    }

    /// Return the cached credential, refreshing it first if missing or expired
    pub async fn get_or_refresh(
        &self,
        cancel: &CancellationToken,
    ) -> Result<S::Credential, CredentialError> {
        if let Some(credential) = self.valid_credential() {
            return Ok(credential);
        }

        let _guard = or_cancelled(cancel, CredentialError::Cancelled, async {
            Ok(self.refresh_lock.lock().await)
        })
        .await?;

        // Another caller may have refreshed while we waited for the lock
        if let Some(credential) = self.valid_credential() {
            debug!("{}: credential refreshed by concurrent caller", self.name);
            return Ok(credential);
        }

        debug!("{}: refreshing credential", self.name);
        let entry = or_cancelled(cancel, CredentialError::Cancelled, self.source.refresh())
            .await
            .map_err(|e| {
                warn!("{}: credential refresh failed: {}", self.name, e);
                e
            })?;

        let credential = entry.value().clone();
        match entry.expires_at() {
            Some(expires_at) => info!("{}: credential refreshed, expires at {}", self.name, expires_at),
            None => info!("{}: credential refreshed, never expires", self.name),
        }
        *self.current.write() = Some(Arc::new(entry));

        Ok(credential)
    }

    /// Drop the cached credential
    pub fn reset(&self) {
        *self.current.write() = None;
    }

    fn valid_credential(&self) -> Option<S::Credential> {
        let entry = self.current.read().clone()?;
        if entry.is_expired() {
            None
        } else {
            Some(entry.value().clone())
        }
    }
}
