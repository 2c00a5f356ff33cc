use serde::{Deserialize, Serialize};

/// One command invocation as handed over by the dispatcher.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct CommandRequest {
    /// Registered command name.
    pub command: String,
    /// Raw argument string, possibly carrying the selector flag.
    #[serde(default)]
    pub args: String,
    /// Backend-specific caller id.
    pub user_id: String,
    /// "Would this be authorized?" check. Never performs I/O.
    #[serde(default)]
    pub dry_run: bool,
}

impl CommandRequest {
    pub fn new(command: impl Into<String>, args: impl Into<String>, user_id: impl Into<String>) -> Self {
        Self {
            command: command.into(),
            args: args.into(),
            user_id: user_id.into(),
            dry_run: false,
        }
    }

    pub fn dry_run(mut self) -> Self {
        self.dry_run = true;
        self
    }
}

/// Terminal output of one gate invocation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "decision", rename_all = "lowercase")]
pub enum GateDecision {
    /// Run `command` with the selector-stripped `args`.
    Proceed { command: String, args: String },
    /// Abort and show `reason` to the caller.
    Block { reason: String },
}

impl GateDecision {
    pub fn as_str(&self) -> &'static str {
        match self {
            GateDecision::Proceed { .. } => "proceed",
            GateDecision::Block { .. } => "block",
        }
    }

    pub fn is_proceed(&self) -> bool {
        matches!(self, GateDecision::Proceed { .. })
    }

    /// The block reason, if blocked.
    pub fn reason(&self) -> Option<&str> {
        match self {
            GateDecision::Proceed { .. } => None,
            GateDecision::Block { reason } => Some(reason),
        }
    }
}
