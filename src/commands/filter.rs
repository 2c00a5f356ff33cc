use log::error;

use crate::eval::Gate;

/// Add `name` to the filtered set.
pub fn require(gate: &Gate, name: &str) -> String {
    let known = gate.known_commands();
    if !known.is_empty() && !known.iter().any(|k| k == name) {
        return format!(
            "{name} not in our bot's command list. Make sure you are adding the command by its registered name"
        );
    }
    match gate.registry().add(name) {
        Ok(true) => format!("{name} now requires 2fa"),
        Ok(false) => format!("{name} already requires 2fa"),
        Err(e) => {
            error!("failed to add {name} to the filtered commands: {e}");
            format!("Unable to update the 2fa command list: {e}")
        }
    }
}

/// Remove `name` from the filtered set.
pub fn remove(gate: &Gate, name: &str) -> String {
    match gate.registry().remove(name) {
        Ok(true) => format!("{name} no longer requires 2fa"),
        Ok(false) => format!("{name} does not require 2fa"),
        Err(e) => {
            error!("failed to remove {name} from the filtered commands: {e}");
            format!("Unable to update the 2fa command list: {e}")
        }
    }
}

pub fn list(gate: &Gate) -> String {
    let names = gate.registry().list();
    if names.is_empty() {
        return "No commands require 2fa".into();
    }
    format!("Commands requiring 2fa:\n{}", names.join("\n"))
}
