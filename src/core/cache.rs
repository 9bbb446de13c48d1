//! Immutable value cell with an expiration instant

use chrono::{DateTime, Duration, Utc};

/// Cached payload plus its expiration. Never mutated; a refresh builds a new entry.
#[derive(Debug, Clone)]
pub struct CacheEntry<T> {
    value: T,
    cached_at: DateTime<Utc>,
    /// `None` never expires
    expires_at: Option<DateTime<Utc>>,
}

impl<T> CacheEntry<T> {
    /// Entry that never expires
    pub fn never_expiring(value: T) -> Self {
        Self {
            value,
            cached_at: Utc::now(),
            expires_at: None,
        }
    }

    /// Entry that expires at an absolute instant
    pub fn expiring_at(value: T, expires_at: DateTime<Utc>) -> Self {
        Self {
            value,
            cached_at: Utc::now(),
            expires_at: Some(expires_at),
        }
    }

    /// Entry that expires `ttl` after construction
    pub fn expiring_after(value: T, ttl: Duration) -> Self {
        let now = Utc::now();
        Self {
            value,
            cached_at: now,
            expires_at: now.checked_add_signed(ttl),
        }
    }

    /// Held payload, expired or not
    pub fn value(&self) -> &T {
        &self.value
    }

    pub fn into_value(self) -> T {
        self.value
    }

    pub fn cached_at(&self) -> DateTime<Utc> {
        self.cached_at
    }

    pub fn expires_at(&self) -> Option<DateTime<Utc>> {
        self.expires_at
    }

    pub fn is_expired(&self) -> bool {
        self.is_expired_at(Utc::now())
    }

    /// Expired once `now` reaches the expiration instant
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        match self.expires_at {
            Some(expires_at) => now >= expires_at,
            None => false,
        }
    }
}
