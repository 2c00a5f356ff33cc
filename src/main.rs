//! twofa-gate: command filter for chat-ops dispatchers.
//!
//! Modes:
//!   twofa-gate                     read a JSON request on stdin, write the decision to stdout
//!   twofa-gate admin <command...>  run an operator command (`require 2fa deploy`, ...) as admin
//!   twofa-gate --dump-config       print the merged configuration (secrets redacted)
//!
//! Request:  {"command": "deploy", "args": "prod --2fa push", "user_id": "U123", "dry_run": false}
//! Decision: {"decision": "proceed", "command": "deploy", "args": "prod"}
//!       or  {"decision": "block", "reason": "..."}

use std::io::Read;
use std::process::exit;

use twofa_gate::commands::OperatorCommand;
use twofa_gate::config::Config;
use twofa_gate::{CommandRequest, Gate};

fn main() {
    let args: Vec<String> = std::env::args().skip(1).collect();
    let mode = args.first().map(String::as_str);
    let config = Config::load();

    if mode == Some("--dump-config") {
        match toml::to_string_pretty(&config.redacted()) {
            Ok(s) => print!("{s}"),
            Err(e) => {
                eprintln!("twofa-gate: {e}");
                exit(1);
            }
        }
        return;
    }

    twofa_gate::logging::init(&config.logging.level, &config.log_path());

    let gate = match Gate::activate(&config) {
        Ok(gate) => gate,
        Err(e) => {
            eprintln!("twofa-gate: refusing to activate: {e}");
            exit(1);
        }
    };

    if mode == Some("admin") {
        let words = &args[1..];
        let text = shlex::try_join(words.iter().map(String::as_str))
            .unwrap_or_else(|_| words.join(" "));
        match OperatorCommand::parse(&text) {
            Ok(cmd) => println!("{}", cmd.execute(&gate, "cli", true)),
            Err(e) => {
                eprintln!("twofa-gate: {e}");
                exit(2);
            }
        }
        return;
    }

    let mut input = String::new();
    if std::io::stdin().read_to_string(&mut input).is_err() {
        eprintln!("failed to read stdin");
        exit(1);
    }

    let request: CommandRequest = match serde_json::from_str(&input) {
        Ok(v) => v,
        Err(e) => {
            eprintln!("JSON parse error: {e}");
            exit(1);
        }
    };

    let decision = gate.filter(&request);
    match serde_json::to_string(&decision) {
        Ok(out) => println!("{out}"),
        Err(e) => {
            eprintln!("failed to encode decision: {e}");
            exit(1);
        }
    }
}
