//! The tree lives in an external key-value cache; the client holds a signed key.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use reducible_state::{AdapterError, Envelope, RequestContext, StateAdapter};

use crate::session::{random_key, KeyRef};
use crate::verifier::Verifier;

/// Request parameter carrying the key-reference token.
pub const CACHE_STATE_PARAM: &str = "vcr_state_key";

/// Default lifetime of a cached envelope.
pub const DEFAULT_TTL: Duration = Duration::from_secs(900);

/// Default key namespace.
pub const DEFAULT_NAMESPACE: &str = "vcr";

/// A string key-value store with optional expiry, such as Redis.
pub trait KeyValueCache: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<String>, AdapterError>;

    /// Store `value`. `None` means it never expires.
    fn set(&self, key: &str, value: String, ttl: Option<Duration>) -> Result<(), AdapterError>;
}

impl<T: KeyValueCache + ?Sized> KeyValueCache for Arc<T> {
    fn get(&self, key: &str) -> Result<Option<String>, AdapterError> {
        self.as_ref().get(key)
    }

    fn set(&self, key: &str, value: String, ttl: Option<Duration>) -> Result<(), AdapterError> {
        self.as_ref().set(key, value, ttl)
    }
}

struct Entry {
    value: String,
    expires_at: Option<Instant>,
}

impl Entry {
    fn is_live(&self, now: Instant) -> bool {
        self.expires_at.map_or(true, |at| now < at)
    }
}

/// Process-local cache honoring TTLs.
///
/// Expired entries are dropped lazily on read and by [`InMemoryCache::purge_expired`].
#[derive(Default)]
pub struct InMemoryCache {
    entries: Mutex<HashMap<String, Entry>>,
}

impl InMemoryCache {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, HashMap<String, Entry>>, AdapterError> {
        self.entries
            .lock()
            .map_err(|_| AdapterError::Backend("cache lock poisoned".to_string()))
    }

    /// Number of stored entries, live or not yet purged.
    pub fn len(&self) -> Result<usize, AdapterError> {
        Ok(self.lock()?.len())
    }

    pub fn is_empty(&self) -> Result<bool, AdapterError> {
        Ok(self.lock()?.is_empty())
    }

    /// Drop every expired entry.
    pub fn purge_expired(&self) -> Result<usize, AdapterError> {
        let now = Instant::now();
        let mut entries = self.lock()?;
        let before = entries.len();
        entries.retain(|_, entry| entry.is_live(now));
        Ok(before - entries.len())
    }
}

impl KeyValueCache for InMemoryCache {
    fn get(&self, key: &str) -> Result<Option<String>, AdapterError> {
        let now = Instant::now();
        let mut entries = self.lock()?;
        match entries.get(key) {
            Some(entry) if entry.is_live(now) => Ok(Some(entry.value.clone())),
            Some(_) => {
                entries.remove(key);
                Ok(None)
            }
            None => Ok(None),
        }
    }

    fn set(&self, key: &str, value: String, ttl: Option<Duration>) -> Result<(), AdapterError> {
        // A TTL past the clock's range never expires.
        let expires_at = ttl.and_then(|ttl| Instant::now().checked_add(ttl));
        self.lock()?
            .insert(key.to_string(), Entry { value, expires_at });
        Ok(())
    }
}

/// Stores envelope JSON in a [`KeyValueCache`] under `"{namespace}:{key}"`.
#[derive(Clone)]
pub struct CacheAdapter {
    verifier: Verifier,
    cache: Arc<dyn KeyValueCache>,
    ttl: Option<Duration>,
    namespace: String,
}

impl CacheAdapter {
    pub fn new(verifier: Verifier, cache: Arc<dyn KeyValueCache>) -> Self {
        Self {
            verifier,
            cache,
            ttl: Some(DEFAULT_TTL),
            namespace: DEFAULT_NAMESPACE.to_string(),
        }
    }

    /// `None` stores entries without expiry.
    #[must_use]
    pub fn with_ttl(mut self, ttl: Option<Duration>) -> Self {
        self.ttl = ttl;
        self
    }

    #[must_use]
    pub fn with_namespace(mut self, namespace: impl Into<String>) -> Self {
        self.namespace = namespace.into();
        self
    }

    pub fn ttl(&self) -> Option<Duration> {
        self.ttl
    }

    fn cache_key(&self, key: &str) -> String {
        format!("{}:{}", self.namespace, key)
    }
}

impl std::fmt::Debug for CacheAdapter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CacheAdapter")
            .field("ttl", &self.ttl)
            .field("namespace", &self.namespace)
            .finish_non_exhaustive()
    }
}

impl StateAdapter for CacheAdapter {
    fn state_param(&self) -> &str {
        CACHE_STATE_PARAM
    }

    fn dump(&self, envelope: &Envelope, _request: &mut RequestContext) -> Result<String, AdapterError> {
        let key = random_key();
        let json = envelope
            .to_json()
            .map_err(|e| AdapterError::Encode(e.to_string()))?;
        self.cache.set(&self.cache_key(&key), json, self.ttl)?;
        tracing::debug!(path = %envelope.path, key = %key, ttl = ?self.ttl, "stored state in cache");
        self.verifier.generate(&KeyRef { k: key })
    }

    fn load(&self, request: &RequestContext) -> Result<Envelope, AdapterError> {
        let KeyRef { k } = self.verifier.verify(request.require_param(CACHE_STATE_PARAM)?)?;
        let raw = self
            .cache
            .get(&self.cache_key(&k))?
            .ok_or(AdapterError::MissingEntry(k))?;
        Envelope::from_json(&raw).map_err(|e| AdapterError::Decode(e.to_string()))
    }
}
