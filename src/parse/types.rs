//! Types produced by the selector parser and consumed by the gate.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Second-factor method requested by the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AuthMethod {
    /// Let the provider pick the user's default device and factor.
    #[default]
    Auto,
    /// Push notification to the provider's mobile app.
    Push,
    /// Phone call-back.
    Phone,
    /// SMS passcode.
    Sms,
}

impl AuthMethod {
    /// Every accepted method, in the order they are shown to callers.
    pub const ALL: [AuthMethod; 4] = [
        AuthMethod::Auto,
        AuthMethod::Push,
        AuthMethod::Phone,
        AuthMethod::Sms,
    ];

    /// The wire name sent to the provider as the `factor` parameter.
    pub fn as_str(self) -> &'static str {
        match self {
            AuthMethod::Auto => "auto",
            AuthMethod::Push => "push",
            AuthMethod::Phone => "phone",
            AuthMethod::Sms => "sms",
        }
    }

    /// Comma-separated list of accepted methods, for user-facing messages.
    pub fn allowed_list() -> String {
        Self::ALL
            .iter()
            .map(|m| m.as_str())
            .collect::<Vec<_>>()
            .join(", ")
    }
}

impl fmt::Display for AuthMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Returned when a method name is not one of [`AuthMethod::ALL`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown 2fa method `{0}`")]
pub struct UnknownMethod(pub String);

impl FromStr for AuthMethod {
    type Err = UnknownMethod;

    /// Case-insensitive.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "auto" => Ok(AuthMethod::Auto),
            "push" => Ok(AuthMethod::Push),
            "phone" => Ok(AuthMethod::Phone),
            "sms" => Ok(AuthMethod::Sms),
            _ => Err(UnknownMethod(s.to_string())),
        }
    }
}

/// The selector a caller appended to a command's arguments.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Selector {
    /// A recognised method (or `auto` when no value followed the flag).
    Method(AuthMethod),
    /// A value followed the flag but is not an accepted method. Holds the
    /// lower-cased token.
    Unrecognized(String),
}

impl Selector {
    /// The method, if the selector named a recognised one.
    pub fn method(&self) -> Option<AuthMethod> {
        match self {
            Selector::Method(m) => Some(*m),
            Selector::Unrecognized(_) => None,
        }
    }
}
