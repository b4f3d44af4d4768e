//! Shared HTTP plumbing for remote backends

use reqwest::header::{HeaderMap, RETRY_AFTER};
use secrecy::SecretString;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::time::Duration;
use tracing::warn;

use crate::constants::network::CONNECTION_TIMEOUT_SECS;
use crate::types::{ErrorCategory, ErrorClassifier, LlmError};

const MAX_ERROR_BODY_CHARS: usize = 500;

/// Client with a connect timeout only; the request deadline belongs to `submit`
pub(super) fn build_client(provider: &str) -> Result<reqwest::Client, LlmError> {
    reqwest::Client::builder()
        .connect_timeout(Duration::from_secs(CONNECTION_TIMEOUT_SECS))
        .build()
        .map_err(|e| {
            LlmError::with_provider(
                ErrorCategory::BadRequest,
                format!("Failed to create HTTP client: {}", e),
                provider,
            )
        })
}

/// API key from config, falling back to `env_var`
///
/// Surrounding whitespace (a common copy-paste artifact) is stripped with a
/// warning. A missing or blank key is an authentication failure.
pub(super) fn resolve_api_key(
    configured: Option<&str>,
    env_var: &str,
    provider: &str,
) -> Result<SecretString, LlmError> {
    let raw = configured
        .map(String::from)
        .or_else(|| std::env::var(env_var).ok())
        .unwrap_or_default();

    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(LlmError::with_provider(
            ErrorCategory::Auth,
            format!(
                "API key not found. Set {} or llm.api_keys.{} in config",
                env_var, provider
            ),
            provider,
        ));
    }
    if trimmed.len() != raw.len() {
        warn!("{} API key had surrounding whitespace, trimmed", provider);
    }
    Ok(SecretString::from(trimmed.to_string()))
}

/// Strip trailing slashes so paths can be appended with `format!`
pub(super) fn normalize_base(base: &str) -> String {
    base.trim_end_matches('/').to_string()
}

/// Send a prepared request and decode a JSON body, classifying every failure
pub(super) async fn send_json<T: DeserializeOwned>(
    request: reqwest::RequestBuilder,
    provider: &str,
) -> Result<T, LlmError> {
    let response = request
        .send()
        .await
        .map_err(|e| ErrorClassifier::classify_transport(&e, provider))?;

    let status = response.status();
    let retry_after = retry_after(response.headers());
    let body = response
        .text()
        .await
        .map_err(|e| ErrorClassifier::classify_transport(&e, provider))?;

    if !status.is_success() {
        let mut err =
            ErrorClassifier::classify_http_status(status.as_u16(), &error_message(&body), provider);
        if let Some(delay) = retry_after {
            err = err.retry_after(delay);
        }
        return Err(err);
    }

    serde_json::from_str(&body).map_err(|e| {
        LlmError::with_provider(
            ErrorCategory::ParseError,
            format!("Failed to parse response body: {}", e),
            provider,
        )
    })
}

fn retry_after(headers: &HeaderMap) -> Option<Duration> {
    headers
        .get(RETRY_AFTER)?
        .to_str()
        .ok()?
        .trim()
        .parse::<u64>()
        .ok()
        .map(Duration::from_secs)
}

/// Best-effort human message from an error body
///
/// Understands `{"error": {"message": ..}}`, `{"error": ".."}` and
/// `{"message": ..}`; anything else is returned truncated.
pub(super) fn error_message(body: &str) -> String {
    if let Ok(json) = serde_json::from_str::<Value>(body) {
        let message = json
            .pointer("/error/message")
            .or_else(|| json.get("error").filter(|v| v.is_string()))
            .or_else(|| json.get("message"))
            .and_then(Value::as_str);
        if let Some(message) = message {
            return message.to_string();
        }
    }
    body.chars().take(MAX_ERROR_BODY_CHARS).collect()
}
