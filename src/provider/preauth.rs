use std::sync::Arc;

use log::debug;

use super::{AuthProvider, PreauthResponse};
use crate::cache::{CacheStats, LruCache};
use crate::error::ProviderError;

/// Default preauth cache size. Kept small: verdicts go stale quickly once a
/// user enrolls or an admin changes policy.
pub const PREAUTH_CACHE_CAPACITY: usize = 4;

/// Memoizes [`AuthProvider::preauth`] per contact address.
pub struct PreauthCache {
    provider: Arc<dyn AuthProvider>,
    cache: LruCache<PreauthResponse>,
}

impl PreauthCache {
    pub fn new(provider: Arc<dyn AuthProvider>, capacity: usize) -> Self {
        Self {
            provider,
            cache: LruCache::new(capacity),
        }
    }

    /// Cached preauth verdict for `contact`. Provider failures are returned
    /// as errors and not cached.
    pub fn preauth(&self, contact: &str) -> Result<PreauthResponse, ProviderError> {
        self.cache.get_or_try_insert_with(contact, || {
            debug!("preauth cache miss for {contact}");
            self.provider.preauth(contact)
        })
    }

    pub fn stats(&self) -> CacheStats {
        self.cache.stats()
    }

    pub fn clear(&self) {
        self.cache.clear();
    }
}
