//! Operator commands: managing the filtered-command set and the caches.
//!
//! Commands arrive as chat text (`!require 2fa deploy`), are tokenized with
//! shlex, and run against a [`Gate`]. Each returns the reply to send back.

/// Identity and preauth cache inspection and clearing.
pub mod cache;
/// `require 2fa`, `remove 2fa`, and listing of filtered commands.
pub mod filter;

use log::{info, warn};
use thiserror::Error;

use crate::eval::Gate;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OperatorCommand {
    /// `require 2fa <cmd>`
    Require(String),
    /// `remove 2fa <cmd>`
    Remove(String),
    /// `twofa email cache info`
    EmailCacheInfo,
    /// `twofa email cache clear`
    EmailCacheClear,
    /// `twofa preauth cache clear`
    PreauthCacheClear,
    /// `twofa filtered`
    ListFiltered,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum OperatorParseError {
    #[error("could not parse command: unbalanced quotes")]
    Unbalanced,
    #[error("unknown command `{0}`. Try: require 2fa <cmd>, remove 2fa <cmd>, twofa email cache info|clear, twofa preauth cache clear, twofa filtered")]
    Unknown(String),
}

impl OperatorCommand {
    /// Parse operator text. A leading `!` bot prefix is ignored; keywords are
    /// case-insensitive, command names are kept as typed.
    pub fn parse(text: &str) -> Result<Self, OperatorParseError> {
        let text = text.trim();
        let text = text.strip_prefix('!').unwrap_or(text);
        let words = shlex::split(text).ok_or(OperatorParseError::Unbalanced)?;
        let lowered: Vec<String> = words.iter().map(|w| w.to_lowercase()).collect();
        let keywords: Vec<&str> = lowered.iter().map(String::as_str).collect();

        match keywords.as_slice() {
            ["require", "2fa", _] => Ok(OperatorCommand::Require(words[2].clone())),
            ["remove", "2fa", _] => Ok(OperatorCommand::Remove(words[2].clone())),
            ["twofa", "email", "cache", "info"] => Ok(OperatorCommand::EmailCacheInfo),
            ["twofa", "email", "cache", "clear"] => Ok(OperatorCommand::EmailCacheClear),
            ["twofa", "preauth", "cache", "clear"] => Ok(OperatorCommand::PreauthCacheClear),
            ["twofa", "filtered"] => Ok(OperatorCommand::ListFiltered),
            _ => Err(OperatorParseError::Unknown(text.to_string())),
        }
    }

    /// Commands that change gate state are restricted to bot admins.
    pub fn requires_admin(&self) -> bool {
        !matches!(
            self,
            OperatorCommand::EmailCacheInfo | OperatorCommand::ListFiltered
        )
    }

    /// Run against `gate` on behalf of a caller, returning the reply text.
    pub fn execute(&self, gate: &Gate, caller: &str, is_admin: bool) -> String {
        if self.requires_admin() && !is_admin {
            warn!("{caller} attempted admin-only command {self:?}");
            return "This command is only available to bot admins.".into();
        }
        info!("{caller} ran {self:?}");
        match self {
            OperatorCommand::Require(name) => filter::require(gate, name),
            OperatorCommand::Remove(name) => filter::remove(gate, name),
            OperatorCommand::EmailCacheInfo => cache::email_cache_info(gate),
            OperatorCommand::EmailCacheClear => cache::email_cache_clear(gate),
            OperatorCommand::PreauthCacheClear => cache::preauth_cache_clear(gate),
            OperatorCommand::ListFiltered => filter::list(gate),
        }
    }
}
