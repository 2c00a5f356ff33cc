//! Extraction of the inline 2fa selector from a command's argument string.

use super::types::{AuthMethod, Selector};

/// Selector flag used when the configuration does not override it.
pub const DEFAULT_SELECTOR_FLAG: &str = "--2fa";

/// A token starting with this prefix is treated as another flag, never as a method value.
pub const FLAG_PREFIX: &str = "--";

/// Strip the default `--2fa` selector from `args`.
///
/// See [`parse_auth_selector_with`].
pub fn parse_auth_selector(args: &str) -> (Option<Selector>, String) {
    parse_auth_selector_with(args, DEFAULT_SELECTOR_FLAG)
}

/// Strip the selector `flag` (and its method value, if any) from `args`.
///
/// Returns the selector and the remaining arguments. When the flag is not
/// present as a whole token, `args` is returned untouched. Otherwise the
/// remaining tokens are rejoined with single spaces.
///
/// - `flag` last, or followed by another `--` flag: method is `auto` and only
///   `flag` is removed.
/// - Otherwise the next token is consumed and lower-cased as the method value.
pub fn parse_auth_selector_with(args: &str, flag: &str) -> (Option<Selector>, String) {
    if !args.contains(flag) {
        return (None, args.to_string());
    }

    let mut tokens: Vec<&str> = args.split_whitespace().collect();
    let Some(idx) = tokens.iter().position(|t| *t == flag) else {
        // Present only as part of a larger token, e.g. `--2fa=push`.
        return (None, args.to_string());
    };

    let selector = match take_selector(&mut tokens, idx) {
        Some(value) => match value.parse::<AuthMethod>() {
            Ok(method) => Selector::Method(method),
            Err(_) => Selector::Unrecognized(value),
        },
        None => Selector::Method(AuthMethod::Auto),
    };

    // Only the first occurrence picks the method; repeats are dropped too.
    while let Some(idx) = tokens.iter().position(|t| *t == flag) {
        take_selector(&mut tokens, idx);
    }

    (Some(selector), tokens.join(" "))
}

/// Remove the flag at `idx` and its value, if one follows. Returns the
/// lower-cased value.
fn take_selector(tokens: &mut Vec<&str>, idx: usize) -> Option<String> {
    let value = tokens
        .get(idx + 1)
        .filter(|next| !next.starts_with(FLAG_PREFIX))
        .map(|next| next.to_lowercase());
    let end = if value.is_some() { idx + 1 } else { idx };
    tokens.drain(idx..=end);
    value
}
