//! Choosing and building an adapter.

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use reducible_state::{AdapterError, StateAdapter};

use crate::cache::{CacheAdapter, InMemoryCache, KeyValueCache, DEFAULT_NAMESPACE, DEFAULT_TTL};
use crate::hidden_field::HiddenFieldAdapter;
use crate::session::SessionAdapter;
use crate::verifier::Verifier;

pub const SECRET_ENV: &str = "REDUCIBLE_SECRET";
pub const ADAPTER_ENV: &str = "REDUCIBLE_ADAPTER";
pub const CACHE_TTL_ENV: &str = "REDUCIBLE_CACHE_TTL";

/// Which persistence strategy to use.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum AdapterKind {
    HiddenField,
    #[default]
    Session,
    Cache,
}

impl FromStr for AdapterKind {
    type Err = AdapterError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().replace('-', "_").as_str() {
            "hidden_field" => Ok(AdapterKind::HiddenField),
            "session" => Ok(AdapterKind::Session),
            "cache" | "redis" => Ok(AdapterKind::Cache),
            other => Err(AdapterError::InvalidConfig(format!(
                "unknown adapter '{other}', expected hidden_field, session or cache"
            ))),
        }
    }
}

impl fmt::Display for AdapterKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            AdapterKind::HiddenField => "hidden_field",
            AdapterKind::Session => "session",
            AdapterKind::Cache => "cache",
        })
    }
}

/// Adapter settings.
#[derive(Clone)]
pub struct AdapterConfig {
    pub kind: AdapterKind,
    pub secret: Option<String>,
    /// Lifetime of cached envelopes. `None` never expires.
    pub cache_ttl: Option<Duration>,
    pub cache_namespace: String,
    /// Cache backend. An [`InMemoryCache`] is used when unset.
    pub cache: Option<Arc<dyn KeyValueCache>>,
}

impl Default for AdapterConfig {
    fn default() -> Self {
        Self {
            kind: AdapterKind::default(),
            secret: None,
            cache_ttl: Some(DEFAULT_TTL),
            cache_namespace: DEFAULT_NAMESPACE.to_string(),
            cache: None,
        }
    }
}

impl fmt::Debug for AdapterConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AdapterConfig")
            .field("kind", &self.kind)
            .field("secret", &self.secret.as_ref().map(|_| "<redacted>"))
            .field("cache_ttl", &self.cache_ttl)
            .field("cache_namespace", &self.cache_namespace)
            .field("cache", &self.cache.is_some())
            .finish()
    }
}

impl AdapterConfig {
    /// Read settings from the process environment.
    pub fn from_env() -> Result<Self, AdapterError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Read settings through `lookup`, which maps a variable name to its value.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, AdapterError> {
        let mut config = Self::default();

        config.secret = lookup(SECRET_ENV).filter(|s| !s.is_empty());

        if let Some(kind) = lookup(ADAPTER_ENV) {
            config.kind = kind.parse()?;
        }

        if let Some(ttl) = lookup(CACHE_TTL_ENV) {
            let secs: u64 = ttl.trim().parse().map_err(|_| {
                AdapterError::InvalidConfig(format!("{CACHE_TTL_ENV} must be whole seconds, got '{ttl}'"))
            })?;
            config.cache_ttl = (secs > 0).then(|| Duration::from_secs(secs));
        }

        Ok(config)
    }

    #[must_use]
    pub fn with_kind(mut self, kind: AdapterKind) -> Self {
        self.kind = kind;
        self
    }

    #[must_use]
    pub fn with_secret(mut self, secret: impl Into<String>) -> Self {
        self.secret = Some(secret.into());
        self
    }

    #[must_use]
    pub fn with_cache(mut self, cache: Arc<dyn KeyValueCache>) -> Self {
        self.cache = Some(cache);
        self
    }

    /// Build the configured adapter.
    pub fn build(&self) -> Result<Box<dyn StateAdapter>, AdapterError> {
        let secret = self.secret.as_deref().ok_or(AdapterError::MissingSecret)?;
        let verifier = Verifier::new(secret)?;

        tracing::debug!(kind = %self.kind, "building state adapter");
        let adapter: Box<dyn StateAdapter> = match self.kind {
            AdapterKind::HiddenField => Box::new(HiddenFieldAdapter::new(verifier)),
            AdapterKind::Session => Box::new(SessionAdapter::new(verifier)),
            AdapterKind::Cache => {
                let cache: Arc<dyn KeyValueCache> = match &self.cache {
                    Some(cache) => cache.clone(),
                    None => Arc::new(InMemoryCache::new()),
                };
                Box::new(
                    CacheAdapter::new(verifier, cache)
                        .with_ttl(self.cache_ttl)
                        .with_namespace(self.cache_namespace.clone()),
                )
            }
        };
        Ok(adapter)
    }
}
