//! Auth provider contract: verdict types, the [`AuthProvider`] trait, and the
//! memoized preauth wrapper.

/// Duo Auth API v2 client.
pub mod duo;
/// Bounded cache in front of [`AuthProvider::preauth`].
pub mod preauth;

pub use duo::DuoClient;
pub use preauth::{PREAUTH_CACHE_CAPACITY, PreauthCache};

use crate::error::ProviderError;
use crate::parse::AuthMethod;

/// Outcome of a preauth query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PreauthVerdict {
    /// Identity may skip step-up (e.g. a remembered device).
    Allow,
    /// Identity is refused outright.
    Deny,
    /// Identity is not enrolled with the provider.
    Enroll,
    /// Identity must complete a step-up challenge.
    AuthRequired,
    /// Any other value. The gate blocks on it.
    Unrecognized(String),
}

impl PreauthVerdict {
    /// Map the provider's `result` string.
    pub fn from_provider(raw: &str) -> Self {
        match raw {
            "allow" => PreauthVerdict::Allow,
            "deny" => PreauthVerdict::Deny,
            "enroll" => PreauthVerdict::Enroll,
            "auth" => PreauthVerdict::AuthRequired,
            other => PreauthVerdict::Unrecognized(other.to_string()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PreauthResponse {
    pub verdict: PreauthVerdict,
    /// Human-readable status message from the provider.
    pub message: String,
}

/// Outcome of a step-up challenge.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StepUpVerdict {
    Allow,
    Deny,
    Unrecognized(String),
}

impl StepUpVerdict {
    pub fn from_provider(raw: &str) -> Self {
        match raw {
            "allow" => StepUpVerdict::Allow,
            "deny" => StepUpVerdict::Deny,
            other => StepUpVerdict::Unrecognized(other.to_string()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StepUpResponse {
    pub verdict: StepUpVerdict,
    pub message: String,
}

/// Remote two-factor provider.
///
/// Calls may block on network I/O. Transport and provider-side failures are
/// reported as [`ProviderError`], never as a verdict.
pub trait AuthProvider: Send + Sync {
    /// Verify that the configured credentials are accepted.
    fn check(&self) -> Result<(), ProviderError> {
        Ok(())
    }

    fn preauth(&self, contact: &str) -> Result<PreauthResponse, ProviderError>;

    fn auth(&self, contact: &str, method: AuthMethod) -> Result<StepUpResponse, ProviderError>;
}
