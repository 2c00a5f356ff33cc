//! Duo Auth API v2 client.
//!
//! Every request is signed: the canonical string
//! `date \n METHOD \n host \n path \n params` (params sorted by key, RFC 3986
//! encoded) is HMAC-SHA512'd with the secret key, and sent as HTTP Basic
//! credentials `integration_key:hex_signature` alongside the same `Date` header.

use std::time::Duration;

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use hmac::{Hmac, Mac};
use log::debug;
use reqwest::Method;
use reqwest::header::{AUTHORIZATION, CONTENT_TYPE, DATE};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use sha2::Sha512;

use super::{AuthProvider, PreauthResponse, PreauthVerdict, StepUpResponse, StepUpVerdict};
use crate::config::DuoConfig;
use crate::error::ProviderError;
use crate::parse::AuthMethod;

type HmacSha512 = Hmac<Sha512>;

const CHECK_PATH: &str = "/auth/v2/check";
const PREAUTH_PATH: &str = "/auth/v2/preauth";
const AUTH_PATH: &str = "/auth/v2/auth";

pub struct DuoClient {
    host: String,
    /// `https://{host}`. Only tests point it elsewhere.
    base_url: String,
    integration_key: String,
    secret_key: String,
    http: reqwest::blocking::Client,
}

#[derive(Deserialize)]
struct Envelope<T> {
    stat: String,
    response: Option<T>,
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    message_detail: Option<String>,
}

#[derive(Deserialize)]
struct ResultBody {
    result: String,
    #[serde(default)]
    status_msg: String,
}

impl DuoClient {
    pub fn new(config: &DuoConfig) -> Result<Self, ProviderError> {
        let http = reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .user_agent(concat!("twofa-gate/", env!("CARGO_PKG_VERSION")))
            .build()?;
        let host = config.api_host.to_lowercase();
        Ok(Self {
            base_url: format!("https://{host}"),
            host,
            integration_key: config.integration_key.clone(),
            secret_key: config.secret_key.clone(),
            http,
        })
    }

    fn call<T: DeserializeOwned>(
        &self,
        method: Method,
        path: &str,
        params: &[(&str, &str)],
    ) -> Result<T, ProviderError> {
        let date = chrono::Utc::now().to_rfc2822();
        let encoded = canonical_params(params);
        let authorization = sign(
            &self.integration_key,
            &self.secret_key,
            &date,
            method.as_str(),
            &self.host,
            path,
            &encoded,
        )?;

        let url = format!("{}{path}", self.base_url);
        let request = if method == Method::GET {
            let url = if encoded.is_empty() {
                url
            } else {
                format!("{url}?{encoded}")
            };
            self.http.get(url)
        } else {
            self.http
                .request(method, url)
                .header(CONTENT_TYPE, "application/x-www-form-urlencoded")
                .body(encoded)
        };

        debug!("duo request {path}");
        let response = request
            .header(DATE, &date)
            .header(AUTHORIZATION, authorization)
            .send()?;
        let status = response.status();
        let body = response.text()?;

        parse_envelope(&body).map_err(|e| match e {
            ProviderError::Malformed(detail) if !status.is_success() => ProviderError::Status {
                stat: status.as_u16().to_string(),
                message: detail,
            },
            other => other,
        })
    }
}

impl AuthProvider for DuoClient {
    fn check(&self) -> Result<(), ProviderError> {
        let _: serde_json::Value = self.call(Method::GET, CHECK_PATH, &[])?;
        Ok(())
    }

    fn preauth(&self, contact: &str) -> Result<PreauthResponse, ProviderError> {
        let body: ResultBody = self.call(Method::POST, PREAUTH_PATH, &[("username", contact)])?;
        Ok(PreauthResponse {
            verdict: PreauthVerdict::from_provider(&body.result),
            message: body.status_msg,
        })
    }

    fn auth(&self, contact: &str, method: AuthMethod) -> Result<StepUpResponse, ProviderError> {
        let body: ResultBody = self.call(
            Method::POST,
            AUTH_PATH,
            &[
                ("username", contact),
                ("factor", method.as_str()),
                ("device", "auto"),
            ],
        )?;
        Ok(StepUpResponse {
            verdict: StepUpVerdict::from_provider(&body.result),
            message: body.status_msg,
        })
    }
}

/// Decode a Duo `{stat, response}` envelope.
fn parse_envelope<T: DeserializeOwned>(body: &str) -> Result<T, ProviderError> {
    let envelope: Envelope<T> =
        serde_json::from_str(body).map_err(|e| ProviderError::Malformed(e.to_string()))?;
    if envelope.stat != "OK" {
        let mut message = envelope.message.unwrap_or_else(|| "no message".into());
        if let Some(detail) = envelope.message_detail {
            message = format!("{message} ({detail})");
        }
        return Err(ProviderError::Status {
            stat: envelope.stat,
            message,
        });
    }
    envelope
        .response
        .ok_or_else(|| ProviderError::Malformed("missing `response`".into()))
}

/// Sort by key and percent-encode into `k=v&k=v`.
fn canonical_params(params: &[(&str, &str)]) -> String {
    let mut sorted: Vec<&(&str, &str)> = params.iter().collect();
    sorted.sort_by(|a, b| a.0.cmp(b.0));
    sorted
        .iter()
        .map(|(k, v)| format!("{}={}", url_encode(k), url_encode(v)))
        .collect::<Vec<_>>()
        .join("&")
}

/// Build the `Authorization` header value for one request.
fn sign(
    integration_key: &str,
    secret_key: &str,
    date: &str,
    method: &str,
    host: &str,
    path: &str,
    params: &str,
) -> Result<String, ProviderError> {
    let canonical = format!(
        "{date}\n{}\n{}\n{path}\n{params}",
        method.to_uppercase(),
        host.to_lowercase()
    );
    let mut mac = HmacSha512::new_from_slice(secret_key.as_bytes())
        .map_err(|e| ProviderError::Transport(format!("signing key: {e}")))?;
    mac.update(canonical.as_bytes());
    let signature = hex::encode(mac.finalize().into_bytes());
    let credentials = STANDARD.encode(format!("{integration_key}:{signature}"));
    Ok(format!("Basic {credentials}"))
}

/// RFC 3986 percent-encoding: everything but unreserved characters.
fn url_encode(input: &str) -> String {
    let mut encoded = String::with_capacity(input.len());
    for byte in input.bytes() {
        match byte {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'_' | b'.' | b'~' => {
                encoded.push(byte as char);
            }
            _ => encoded.push_str(&format!("%{byte:02X}")),
        }
    }
    encoded
}
