pub mod decision;

pub use decision::{CommandRequest, GateDecision};

use std::sync::Arc;

use log::{debug, error, info, warn};

use crate::config::{Config, GateSettings};
use crate::error::{ActivationError, ProviderError};
use crate::identity::{self, IdentityCache, IdentityResolver, Resolution};
use crate::logging;
use crate::parse::{AuthMethod, Selector, parse_auth_selector_with};
use crate::provider::{AuthProvider, DuoClient, PreauthCache, PreauthVerdict, StepUpVerdict};
use crate::registry::{FilterRegistry, JsonFileStore};

/// The command-authorization gate.
///
/// Shared across concurrent invocations: the registry and both caches are
/// internally synchronized, and [`filter`](Self::filter) takes `&self`.
pub struct Gate {
    registry: FilterRegistry,
    identity: IdentityCache,
    preauth: PreauthCache,
    provider: Arc<dyn AuthProvider>,
    selector_flag: String,
    known_commands: Vec<String>,
}

impl Gate {
    /// Assemble a gate from explicit collaborators. No credential check is made.
    pub fn new(
        registry: FilterRegistry,
        resolver: Box<dyn IdentityResolver>,
        provider: Arc<dyn AuthProvider>,
        settings: &GateSettings,
    ) -> Self {
        Self {
            registry,
            identity: IdentityCache::new(resolver, settings.identity_cache_capacity),
            preauth: PreauthCache::new(Arc::clone(&provider), settings.preauth_cache_capacity),
            provider,
            selector_flag: settings.selector_flag.clone(),
            known_commands: Vec::new(),
        }
    }

    /// Build the production gate from configuration.
    ///
    /// Refuses to activate on invalid configuration, an unreadable store, or
    /// credentials the provider rejects.
    pub fn activate(config: &Config) -> Result<Self, ActivationError> {
        config.validate()?;

        let store = JsonFileStore::new(config.store_path());
        let store_path = store.path().display().to_string();
        let registry = FilterRegistry::open(Box::new(store))?;

        let client = DuoClient::new(&config.duo).map_err(ActivationError::Client)?;
        if let Err(e) = client.check() {
            error!("Unable to connect to Duo api with credentials. {e}");
            return Err(ActivationError::Credentials(e));
        }

        let resolver = identity::resolver_for(&config.identity, config.duo.timeout_secs)
            .map_err(ActivationError::Client)?;

        info!(
            "activated: backend={} store={} filtered={}",
            config.identity.backend,
            store_path,
            registry.len()
        );
        Ok(Self::new(registry, resolver, Arc::new(client), &config.gate)
            .with_known_commands(config.commands.known.clone()))
    }

    /// Restrict `require 2fa` to the dispatcher's command list.
    pub fn with_known_commands(mut self, known: Vec<String>) -> Self {
        self.known_commands = known;
        self
    }

    pub fn registry(&self) -> &FilterRegistry {
        &self.registry
    }

    pub fn identity(&self) -> &IdentityCache {
        &self.identity
    }

    pub fn preauth(&self) -> &PreauthCache {
        &self.preauth
    }

    pub fn known_commands(&self) -> &[String] {
        &self.known_commands
    }

    /// Decide whether `request` may run, and log the decision.
    pub fn filter(&self, request: &CommandRequest) -> GateDecision {
        let decision = self.decide(request);
        logging::log_decision(request, &decision);
        decision
    }

    fn decide(&self, request: &CommandRequest) -> GateDecision {
        let cmd = request.command.as_str();

        // Always strip the selector so it never reaches the command itself.
        let (selector, args) = parse_auth_selector_with(&request.args, &self.selector_flag);
        let proceed = || GateDecision::Proceed {
            command: cmd.to_string(),
            args: args.clone(),
        };

        if request.dry_run {
            return proceed();
        }

        if !self.registry.contains(cmd) {
            return proceed();
        }

        let method = match selector {
            Some(Selector::Method(method)) => method,
            Some(Selector::Unrecognized(value)) => {
                debug!("{} sent unknown 2fa method {value} for {cmd}", request.user_id);
                return block(format!(
                    "`{value}` is not a 2fa method.\n{}",
                    self.instructions()
                ));
            }
            None => {
                debug!("{} ran {cmd} without {}", request.user_id, self.selector_flag);
                return block(self.instructions());
            }
        };

        let contact = match self.identity.lookup(&request.user_id) {
            Ok(Resolution::Resolved(contact)) => contact,
            Ok(Resolution::ResolverError(e)) => {
                return block(format!(
                    "Unable to look up your email for Duo, please contact your bot admin.\nError message: {e}"
                ));
            }
            Ok(Resolution::Unsupported(backend)) => {
                error!("2fa gate cannot resolve identities on the {backend} backend");
                return block(format!(
                    "Duo 2FA is not supported on the {backend} backend. \
                     This command cannot run until the bot is reconfigured."
                ));
            }
            Err(e) => {
                error!("Error talking to the identity backend: {e}");
                return block(format!(
                    "Unable to look up your email for Duo right now: {e}\nPlease try again in a moment."
                ));
            }
        };

        let preauth = match self.preauth.preauth(&contact) {
            Ok(p) => p,
            Err(e) => return transient(&e),
        };

        match preauth.verdict {
            PreauthVerdict::Deny => {
                debug!("{contact} denied by Duo for {cmd}");
                return block(format!(
                    "You are not authorized to auth to Duo at this time. Please contact your Duo admin.\nError message: {}",
                    preauth.message
                ));
            }
            PreauthVerdict::Enroll => {
                debug!("{contact} is not enrolled in Duo");
                return block(format!(
                    "You are not enrolled in Duo. Please contact your Duo admin.\nUser Email: {contact}"
                ));
            }
            PreauthVerdict::Allow => {
                debug!("{contact} allowed without 2fa by Duo for {cmd}");
                return proceed();
            }
            PreauthVerdict::AuthRequired => {
                debug!("{contact} needs to 2fa auth via Duo ({method})");
            }
            PreauthVerdict::Unrecognized(raw) => {
                warn!("unrecognized Duo preauth result {raw:?} for {contact}");
                return block(format!(
                    "Duo returned an unexpected preauth result ({raw}). Refusing to run {cmd}."
                ));
            }
        }

        let step_up = match self.provider.auth(&contact, method) {
            Ok(s) => s,
            Err(e) => return transient(&e),
        };

        match step_up.verdict {
            StepUpVerdict::Allow => {
                info!("{contact} passed Duo 2fa ({method}) for {cmd}");
                proceed()
            }
            StepUpVerdict::Deny => {
                info!("{contact} failed Duo 2fa ({method}) for {cmd}");
                block(format!(
                    "Your Duo 2FA auth failed.\nError message: {}",
                    step_up.message
                ))
            }
            StepUpVerdict::Unrecognized(raw) => {
                warn!("unrecognized Duo auth result {raw:?} for {contact}");
                block(format!(
                    "Duo returned an unexpected auth result ({raw}). Refusing to run {cmd}."
                ))
            }
        }
    }

    /// How to resupply a filtered command with the selector.
    fn instructions(&self) -> String {
        let flag = &self.selector_flag;
        format!(
            "This command requires Duo Two Factor. Rerun this command with {flag}.\n\
             You can specify your preferred 2fa method after {flag} like this `{flag} sms`. \
             Allowed methods: {}. Just sending {flag} is the same as {flag} {}.",
            AuthMethod::allowed_list(),
            AuthMethod::default(),
        )
    }
}

fn block(reason: String) -> GateDecision {
    GateDecision::Block { reason }
}

fn transient(e: &ProviderError) -> GateDecision {
    error!("Error talking to Duo api: {e}");
    block(format!(
        "Error when talking to the Duo api: {e}\nPlease try again in a moment."
    ))
}
