use std::path::Path;

use log::{LevelFilter, info};
use simplelog::{ConfigBuilder, WriteLogger};

use crate::eval::{CommandRequest, GateDecision};

/// Target used for per-decision records, so they can be filtered out of the
/// general debug stream.
pub const DECISION_TARGET: &str = "twofa_gate::decision";

/// Install a file logger at `path` (parent directories are created).
/// Best-effort: failures are silently ignored.
pub fn init(level: &str, path: &Path) {
    let level = level.parse::<LevelFilter>().unwrap_or(LevelFilter::Info);
    if let Some(parent) = path.parent() {
        let _ = std::fs::create_dir_all(parent);
    }
    let Ok(file) = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
    else {
        return;
    };
    let config = ConfigBuilder::new()
        .set_time_format_rfc3339()
        .set_target_level(LevelFilter::Error)
        .build();
    let _ = WriteLogger::init(level, config, file);
}

/// Emit one single-line record for a gate decision.
pub fn log_decision(request: &CommandRequest, decision: &GateDecision) {
    let cmd_truncated: String = request.command.chars().take(200).collect();
    // Compact single-line reason (replace newlines with "; ")
    let detail = match decision {
        GateDecision::Proceed { .. } => String::new(),
        GateDecision::Block { reason } => reason.replace('\n', "; "),
    };
    info!(
        target: DECISION_TARGET,
        "{decision}\t{cmd}\t{user}\t{dry}\t{detail}",
        decision = decision.as_str(),
        cmd = cmd_truncated,
        user = request.user_id,
        dry = if request.dry_run { "dry-run" } else { "live" },
    );
}
