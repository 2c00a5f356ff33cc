//! twofa-gate: a command filter that puts sensitive chat-ops commands behind
//! Duo step-up two-factor authentication.
//!
//! The dispatcher hands every inbound command to [`Gate::filter`], which
//! returns [`GateDecision::Proceed`] (with the selector stripped from the
//! arguments) or [`GateDecision::Block`] with a reason for the caller.
//! Only commands in the [`FilterRegistry`](registry::FilterRegistry) are
//! gated; callers opt into step-up by appending `--2fa [auto|push|phone|sms]`.
//!
//! # Architecture
//!
//! - **[`parse`]**: selector extraction from a raw argument string.
//! - **[`registry`]**: persisted set of filtered command names.
//! - **[`cache`]**: bounded LRU memo cache with hit/miss counters.
//! - **[`identity`]**: caller id → contact address resolvers and their cache.
//! - **[`provider`]**: Duo preauth/auth client and the preauth cache.
//! - **[`eval`]**: the gate state machine and decision types.
//! - **[`commands`]**: operator commands (`require 2fa`, cache info, ...).
//! - **[`config`]**: embedded defaults + user overlay + environment credentials.
//! - **[`logging`]**: simplelog file logger and per-decision records.

/// Bounded LRU memo cache shared by the identity and preauth layers.
pub mod cache;
/// Operator commands for the filtered set and the caches.
pub mod commands;
/// Configuration types, loading, and overlay merge logic.
pub mod config;
/// Error types for configuration, provider calls, persistence, and activation.
pub mod error;
/// The gate state machine and its request/decision types.
pub mod eval;
/// Identity resolution and the identity cache.
pub mod identity;
/// File logging setup and decision records.
pub mod logging;
/// Selector flag parsing and auth method types.
pub mod parse;
/// Auth provider contract, Duo client, and preauth cache.
pub mod provider;
/// Persisted registry of filtered command names.
pub mod registry;

pub use eval::{CommandRequest, Gate, GateDecision};
