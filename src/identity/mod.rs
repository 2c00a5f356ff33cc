//! Caller identity → contact address resolution.

/// Slack `users.info` resolver.
pub mod slack;

pub use slack::SlackResolver;

use std::fmt;

use log::{debug, error, warn};

use crate::cache::{CacheStats, LruCache};
use crate::config::IdentityConfig;
use crate::error::ProviderError;

/// Default identity cache size.
pub const IDENTITY_CACHE_CAPACITY: usize = 256;

/// Outcome of resolving a caller to a contact address.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    /// The caller's contact address (an email for Duo).
    Resolved(String),
    /// The backend answered but could not produce an address.
    ResolverError(String),
    /// No resolver exists for the active backend. Holds the backend name.
    Unsupported(String),
}

impl fmt::Display for Resolution {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Resolution::Resolved(addr) => write!(f, "resolved: {addr}"),
            Resolution::ResolverError(e) => write!(f, "resolver error: {e}"),
            Resolution::Unsupported(b) => write!(f, "unsupported backend: {b}"),
        }
    }
}

/// Backend-specific lookup of a caller's contact address.
///
/// `Err` means the backend could not be reached or its reply could not be
/// decoded. Those failures are transient and never cached.
pub trait IdentityResolver: Send + Sync {
    fn resolve(&self, user_id: &str) -> Result<Resolution, ProviderError>;
}

/// Returns one configured address for every caller. Used by the `test` backend.
#[derive(Debug, Clone)]
pub struct FixedResolver {
    address: String,
}

impl FixedResolver {
    pub fn new(address: impl Into<String>) -> Self {
        Self {
            address: address.into(),
        }
    }
}

impl IdentityResolver for FixedResolver {
    fn resolve(&self, user_id: &str) -> Result<Resolution, ProviderError> {
        debug!("fixed resolver: {user_id} -> {}", self.address);
        Ok(Resolution::Resolved(self.address.clone()))
    }
}

/// Resolver for backends that cannot map callers to contact addresses.
#[derive(Debug, Clone)]
pub struct UnsupportedResolver {
    backend: String,
}

impl UnsupportedResolver {
    pub fn new(backend: impl Into<String>) -> Self {
        Self {
            backend: backend.into(),
        }
    }
}

impl IdentityResolver for UnsupportedResolver {
    fn resolve(&self, _user_id: &str) -> Result<Resolution, ProviderError> {
        debug!("no identity resolver for backend {}", self.backend);
        Ok(Resolution::Unsupported(self.backend.clone()))
    }
}

/// Pick the resolver for the configured backend.
pub fn resolver_for(
    config: &IdentityConfig,
    timeout_secs: u64,
) -> Result<Box<dyn IdentityResolver>, ProviderError> {
    match config.backend.as_str() {
        "test" => Ok(Box::new(FixedResolver::new(config.test_address.clone()))),
        "slack" => Ok(Box::new(SlackResolver::new(&config.slack_token, timeout_secs)?)),
        other => Ok(Box::new(UnsupportedResolver::new(other))),
    }
}

/// Memoizes [`IdentityResolver::resolve`] by caller id.
///
/// Every [`Resolution`] is cached, so a backend that keeps answering with an
/// error is not hammered on every command. Operators clear the cache after
/// fixing identity mappings. Transport failures are returned uncached.
pub struct IdentityCache {
    resolver: Box<dyn IdentityResolver>,
    cache: LruCache<Resolution>,
}

impl IdentityCache {
    pub fn new(resolver: Box<dyn IdentityResolver>, capacity: usize) -> Self {
        Self {
            resolver,
            cache: LruCache::new(capacity),
        }
    }

    pub fn lookup(&self, user_id: &str) -> Result<Resolution, ProviderError> {
        self.cache.get_or_try_insert_with(user_id, || {
            let resolution = self.resolver.resolve(user_id).inspect_err(|e| {
                warn!("identity backend unreachable for {user_id}: {e}");
            })?;
            match &resolution {
                Resolution::ResolverError(e) => {
                    error!("error looking up contact address for {user_id}: {e}")
                }
                other => debug!("identity {user_id}: {other}"),
            }
            Ok(resolution)
        })
    }

    pub fn stats(&self) -> CacheStats {
        self.cache.stats()
    }

    pub fn clear(&self) {
        self.cache.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// `outcome: None` fails every call with a transport error.
    struct Counting {
        calls: Arc<AtomicUsize>,
        outcome: Option<Resolution>,
    }

    impl IdentityResolver for Counting {
        fn resolve(&self, _user_id: &str) -> Result<Resolution, ProviderError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.outcome
                .clone()
                .ok_or_else(|| ProviderError::Transport("connection refused".into()))
        }
    }

    fn counting(outcome: Option<Resolution>) -> (IdentityCache, Arc<AtomicUsize>) {
        let calls = Arc::new(AtomicUsize::new(0));
        let cache = IdentityCache::new(
            Box::new(Counting {
                calls: Arc::clone(&calls),
                outcome,
            }),
            IDENTITY_CACHE_CAPACITY,
        );
        (cache, calls)
    }

    #[test]
    fn stats_track_hits_and_misses() {
        let cache = IdentityCache::new(
            Box::new(FixedResolver::new("test@test.com")),
            IDENTITY_CACHE_CAPACITY,
        );
        let s = cache.stats();
        assert_eq!((s.hits, s.misses, s.capacity, s.size), (0, 0, 256, 0));

        assert_eq!(
            cache.lookup("123456").unwrap(),
            Resolution::Resolved("test@test.com".into())
        );
        let s = cache.stats();
        assert_eq!((s.hits, s.misses, s.size), (0, 1, 1));

        cache.lookup("123456").unwrap();
        let s = cache.stats();
        assert_eq!((s.hits, s.misses, s.size), (1, 1, 1));

        cache.clear();
        let s = cache.stats();
        assert_eq!((s.hits, s.misses, s.size), (0, 0, 0));
    }

    #[test]
    fn resolver_errors_are_cached() {
        let (cache, calls) = counting(Some(Resolution::ResolverError("users_not_found".into())));
        cache.lookup("U1").unwrap();
        cache.lookup("U1").unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn transport_failures_are_not_cached() {
        let (cache, calls) = counting(None);
        assert!(matches!(cache.lookup("U1"), Err(ProviderError::Transport(_))));
        assert!(cache.lookup("U1").is_err());
        assert_eq!(calls.load(Ordering::SeqCst), 2);
        assert_eq!(cache.stats().size, 0);
    }

    #[test]
    fn unsupported_is_cached() {
        let (cache, calls) = counting(Some(Resolution::Unsupported("irc".into())));
        assert_eq!(cache.lookup("U1").unwrap(), Resolution::Unsupported("irc".into()));
        cache.lookup("U1").unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn clear_forces_re_resolution() {
        let (cache, calls) = counting(Some(Resolution::Resolved("a@example.com".into())));
        cache.lookup("U1").unwrap();
        cache.clear();
        cache.lookup("U1").unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn resolution_display() {
        assert_eq!(
            Resolution::Unsupported("irc".into()).to_string(),
            "unsupported backend: irc"
        );
        assert_eq!(
            Resolution::Resolved("a@example.com".into()).to_string(),
            "resolved: a@example.com"
        );
    }

    #[test]
    fn backend_selection() {
        let mut config = IdentityConfig {
            backend: "test".into(),
            test_address: "ops@example.com".into(),
            slack_token: String::new(),
        };
        let r = resolver_for(&config, 5).unwrap();
        assert_eq!(
            r.resolve("x").unwrap(),
            Resolution::Resolved("ops@example.com".into())
        );

        config.backend = "telegram".into();
        let r = resolver_for(&config, 5).unwrap();
        assert_eq!(
            r.resolve("x").unwrap(),
            Resolution::Unsupported("telegram".into())
        );
    }
}
