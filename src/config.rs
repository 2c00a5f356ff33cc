use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::identity::IDENTITY_CACHE_CAPACITY;
use crate::parse::DEFAULT_SELECTOR_FLAG;
use crate::provider::PREAUTH_CACHE_CAPACITY;

/// Embedded default configuration.
const DEFAULT_CONFIG: &str = include_str!("../config.default.toml");

const REDACTED: &str = "********";

// ── Final (merged) config types ──

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub duo: DuoConfig,
    #[serde(default)]
    pub gate: GateSettings,
    #[serde(default)]
    pub identity: IdentityConfig,
    #[serde(default)]
    pub store: StoreConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default)]
    pub commands: CommandsConfig,
}

/// Duo Auth API credentials.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DuoConfig {
    #[serde(default)]
    pub api_host: String,
    #[serde(default)]
    pub integration_key: String,
    #[serde(default)]
    pub secret_key: String,
    /// Transport timeout for provider and identity calls.
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,
}

fn default_timeout() -> u64 {
    30
}

impl Default for DuoConfig {
    fn default() -> Self {
        Self {
            api_host: String::new(),
            integration_key: String::new(),
            secret_key: String::new(),
            timeout_secs: default_timeout(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct GateSettings {
    /// Inline flag callers append to opt into step-up.
    pub selector_flag: String,
    pub identity_cache_capacity: usize,
    pub preauth_cache_capacity: usize,
}

impl Default for GateSettings {
    fn default() -> Self {
        Self {
            selector_flag: DEFAULT_SELECTOR_FLAG.to_string(),
            identity_cache_capacity: IDENTITY_CACHE_CAPACITY,
            preauth_cache_capacity: PREAUTH_CACHE_CAPACITY,
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize, Default)]
pub struct IdentityConfig {
    /// `slack`, `test`, or any other name (unsupported).
    #[serde(default)]
    pub backend: String,
    /// Address returned for every caller by the `test` backend.
    #[serde(default)]
    pub test_address: String,
    #[serde(default)]
    pub slack_token: String,
}

#[derive(Debug, Clone, Deserialize, Serialize, Default)]
pub struct StoreConfig {
    /// JSON file holding the filtered-command set. `~` is expanded.
    #[serde(default)]
    pub path: String,
}

#[derive(Debug, Clone, Deserialize, Serialize, Default)]
pub struct LoggingConfig {
    #[serde(default)]
    pub level: String,
    #[serde(default)]
    pub path: String,
}

#[derive(Debug, Clone, Deserialize, Serialize, Default)]
pub struct CommandsConfig {
    /// Dispatcher's command list; `require 2fa` only accepts these when non-empty.
    #[serde(default)]
    pub known: Vec<String>,
}

// ── Overlay types (user config that merges with defaults) ──

#[derive(Debug, Deserialize, Default)]
struct ConfigOverlay {
    #[serde(default)]
    duo: DuoOverlay,
    #[serde(default)]
    gate: GateOverlay,
    #[serde(default)]
    identity: IdentityOverlay,
    #[serde(default)]
    store: StoreOverlay,
    #[serde(default)]
    logging: LoggingOverlay,
    #[serde(default)]
    commands: CommandsOverlay,
}

#[derive(Debug, Deserialize, Default)]
struct DuoOverlay {
    api_host: Option<String>,
    integration_key: Option<String>,
    secret_key: Option<String>,
    timeout_secs: Option<u64>,
}

#[derive(Debug, Deserialize, Default)]
struct GateOverlay {
    selector_flag: Option<String>,
    identity_cache_capacity: Option<usize>,
    preauth_cache_capacity: Option<usize>,
}

#[derive(Debug, Deserialize, Default)]
struct IdentityOverlay {
    backend: Option<String>,
    test_address: Option<String>,
    slack_token: Option<String>,
}

#[derive(Debug, Deserialize, Default)]
struct StoreOverlay {
    path: Option<String>,
}

#[derive(Debug, Deserialize, Default)]
struct LoggingOverlay {
    level: Option<String>,
    path: Option<String>,
}

#[derive(Debug, Deserialize, Default)]
struct CommandsOverlay {
    #[serde(default)]
    replace: bool,
    #[serde(default)]
    known: Vec<String>,
    #[serde(default)]
    remove_known: Vec<String>,
}

// ── Merge logic ──

/// Merge a user list into a default list.
/// In replace mode: user list replaces default entirely.
/// In merge mode: remove items first, then extend with additions (deduped).
fn merge_list(base: &mut Vec<String>, add: Vec<String>, remove: &[String], replace: bool) {
    if replace {
        *base = add;
    } else {
        base.retain(|item| !remove.contains(item));
        for item in add {
            if !base.contains(&item) {
                base.push(item);
            }
        }
    }
}

fn set_if<T>(slot: &mut T, value: Option<T>) {
    if let Some(v) = value {
        *slot = v;
    }
}

impl Config {
    /// Load the default embedded configuration.
    pub fn default_config() -> Self {
        toml::from_str(DEFAULT_CONFIG).expect("embedded default config must parse")
    }

    /// Load configuration with resolution order:
    /// 1. Start with embedded defaults
    /// 2. Merge user overlay from ~/.config/twofa-gate/config.toml (if exists)
    /// 3. Fill empty Duo credentials from the environment
    pub fn load() -> Self {
        let mut config = Self::default_config();
        if let Some(overlay) = Self::load_overlay() {
            config.apply_overlay(overlay);
        }
        config.apply_env(|key| std::env::var(key).ok());
        config
    }

    /// Try to load user overlay from ~/.config/twofa-gate/config.toml.
    fn load_overlay() -> Option<ConfigOverlay> {
        let home = std::env::var_os("HOME")?;
        let path = std::path::Path::new(&home).join(".config/twofa-gate/config.toml");
        let content = std::fs::read_to_string(path).ok()?;
        match toml::from_str(&content) {
            Ok(overlay) => Some(overlay),
            Err(e) => {
                // Logging is configured from this file, so it is not up yet.
                eprintln!("twofa-gate: {}", ConfigError::Parse(e));
                None
            }
        }
    }

    /// Apply an overlay on top of this config (merge semantics).
    fn apply_overlay(&mut self, overlay: ConfigOverlay) {
        let d = overlay.duo;
        set_if(&mut self.duo.api_host, d.api_host);
        set_if(&mut self.duo.integration_key, d.integration_key);
        set_if(&mut self.duo.secret_key, d.secret_key);
        set_if(&mut self.duo.timeout_secs, d.timeout_secs);

        let g = overlay.gate;
        set_if(&mut self.gate.selector_flag, g.selector_flag);
        set_if(&mut self.gate.identity_cache_capacity, g.identity_cache_capacity);
        set_if(&mut self.gate.preauth_cache_capacity, g.preauth_cache_capacity);

        let i = overlay.identity;
        set_if(&mut self.identity.backend, i.backend);
        set_if(&mut self.identity.test_address, i.test_address);
        set_if(&mut self.identity.slack_token, i.slack_token);

        set_if(&mut self.store.path, overlay.store.path);

        let l = overlay.logging;
        set_if(&mut self.logging.level, l.level);
        set_if(&mut self.logging.path, l.path);

        let c = overlay.commands;
        merge_list(&mut self.commands.known, c.known, &c.remove_known, c.replace);
    }

    /// Fill any empty Duo credential from `lookup(env_var)`.
    pub fn apply_env(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        let slots = [
            (&mut self.duo.api_host, "DUO_API_HOST"),
            (&mut self.duo.integration_key, "DUO_INT_KEY"),
            (&mut self.duo.secret_key, "DUO_SECRET_KEY"),
        ];
        for (slot, env) in slots {
            if slot.is_empty()
                && let Some(v) = lookup(env)
            {
                *slot = v;
            }
        }
    }

    /// Reject configurations the gate cannot activate with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let creds = [
            (&self.duo.api_host, "duo.api_host", "DUO_API_HOST"),
            (&self.duo.integration_key, "duo.integration_key", "DUO_INT_KEY"),
            (&self.duo.secret_key, "duo.secret_key", "DUO_SECRET_KEY"),
        ];
        for (value, key, env) in creds {
            if value.trim().is_empty() {
                return Err(ConfigError::MissingSetting { key, env });
            }
        }
        if self.gate.identity_cache_capacity == 0 {
            return Err(ConfigError::ZeroCapacity {
                key: "gate.identity_cache_capacity",
            });
        }
        if self.gate.preauth_cache_capacity == 0 {
            return Err(ConfigError::ZeroCapacity {
                key: "gate.preauth_cache_capacity",
            });
        }
        if self.gate.selector_flag.trim().is_empty() {
            return Err(ConfigError::EmptySetting {
                key: "gate.selector_flag",
            });
        }
        if self.identity.backend == "slack" && self.identity.slack_token.is_empty() {
            return Err(ConfigError::EmptySetting {
                key: "identity.slack_token",
            });
        }
        if self.store.path.trim().is_empty() {
            return Err(ConfigError::EmptySetting { key: "store.path" });
        }
        Ok(())
    }

    /// Filtered-command store location with `~` expanded.
    pub fn store_path(&self) -> PathBuf {
        PathBuf::from(shellexpand::tilde(&self.store.path).into_owned())
    }

    /// Log file location with `~` expanded.
    pub fn log_path(&self) -> PathBuf {
        PathBuf::from(shellexpand::tilde(&self.logging.path).into_owned())
    }

    /// Copy with secrets masked, for `--dump-config`.
    pub fn redacted(&self) -> Self {
        let mut copy = self.clone();
        if !copy.duo.secret_key.is_empty() {
            copy.duo.secret_key = REDACTED.into();
        }
        if !copy.identity.slack_token.is_empty() {
            copy.identity.slack_token = REDACTED.into();
        }
        copy
    }

    /// Apply an overlay from a TOML string. Used for testing.
    #[cfg(test)]
    fn apply_overlay_str(&mut self, toml_str: &str) {
        let overlay: ConfigOverlay = toml::from_str(toml_str).unwrap();
        self.apply_overlay(overlay);
    }
}
