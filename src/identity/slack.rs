use std::time::Duration;

use log::debug;
use serde::Deserialize;

use super::{IdentityResolver, Resolution};
use crate::error::ProviderError;

const USERS_INFO_URL: &str = "https://slack.com/api/users.info";

/// Resolves Slack user ids to the email on their profile.
///
/// Requires a bot token with the `users:read.email` scope.
pub struct SlackResolver {
    token: String,
    url: String,
    http: reqwest::blocking::Client,
}

#[derive(Deserialize)]
struct UsersInfo {
    ok: bool,
    #[serde(default)]
    error: Option<String>,
    #[serde(default)]
    user: Option<SlackUser>,
}

#[derive(Deserialize)]
struct SlackUser {
    #[serde(default)]
    profile: SlackProfile,
}

#[derive(Deserialize, Default)]
struct SlackProfile {
    #[serde(default)]
    email: Option<String>,
}

impl SlackResolver {
    pub fn new(token: &str, timeout_secs: u64) -> Result<Self, ProviderError> {
        let http = reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()?;
        Ok(Self {
            token: token.to_string(),
            url: USERS_INFO_URL.to_string(),
            http,
        })
    }

    fn fetch(&self, user_id: &str) -> Result<UsersInfo, ProviderError> {
        let info = self
            .http
            .get(&self.url)
            .bearer_auth(&self.token)
            .query(&[("user", user_id)])
            .send()?
            .json::<UsersInfo>()?;
        Ok(info)
    }
}

/// Turn a `users.info` payload into a resolution.
fn email_from(info: UsersInfo) -> Resolution {
    if !info.ok {
        return Resolution::ResolverError(format!(
            "Slack error: {}",
            info.error.unwrap_or_else(|| "unknown".into())
        ));
    }
    match info.user.and_then(|u| u.profile.email) {
        Some(email) if !email.is_empty() => Resolution::Resolved(email),
        _ => Resolution::ResolverError("Slack profile has no email".into()),
    }
}

impl IdentityResolver for SlackResolver {
    fn resolve(&self, user_id: &str) -> Result<Resolution, ProviderError> {
        debug!("querying slack for {user_id} email");
        Ok(email_from(self.fetch(user_id)?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(body: &str) -> Resolution {
        email_from(serde_json::from_str(body).unwrap())
    }

    #[test]
    fn ok_payload_yields_email() {
        let r = parse(r#"{"ok":true,"user":{"id":"U1","profile":{"email":"ops@example.com"}}}"#);
        assert_eq!(r, Resolution::Resolved("ops@example.com".into()));
    }

    #[test]
    fn not_ok_is_resolver_error() {
        let r = parse(r#"{"ok":false,"error":"user_not_found"}"#);
        assert_eq!(r, Resolution::ResolverError("Slack error: user_not_found".into()));
    }

    #[test]
    fn unreachable_slack_is_a_transport_error() {
        // Bind then drop to get a loopback port nothing listens on.
        let port = std::net::TcpListener::bind("127.0.0.1:0")
            .unwrap()
            .local_addr()
            .unwrap()
            .port();
        let resolver = SlackResolver {
            url: format!("http://127.0.0.1:{port}/api/users.info"),
            ..SlackResolver::new("xoxb-test", 2).unwrap()
        };
        assert!(matches!(
            resolver.resolve("U1"),
            Err(ProviderError::Transport(_))
        ));
    }

    #[test]
    fn missing_email_is_resolver_error() {
        let r = parse(r#"{"ok":true,"user":{"id":"U1","profile":{}}}"#);
        assert!(matches!(r, Resolution::ResolverError(_)));
    }
}
