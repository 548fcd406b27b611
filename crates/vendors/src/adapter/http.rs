//! Shared HTTP plumbing for the bundled adapters.

use std::time::Duration;

use log::debug;
use reqwest::{Client, RequestBuilder, StatusCode};
use rust_decimal::Decimal;
use serde_json::Value;
use std::str::FromStr;

use crate::errors::VendorError;

/// Connect timeout applied to every adapter client. The per-call timeout
/// comes from the provider context.
const CONNECT_TIMEOUT: Duration = Duration::from_secs(5);

pub(crate) fn build_client() -> Client {
    Client::builder()
        .connect_timeout(CONNECT_TIMEOUT)
        .pool_max_idle_per_host(16)
        .build()
        .unwrap_or_else(|_| Client::new())
}

/// Send a request and decode the JSON body, mapping transport and status
/// failures to [`VendorError`].
pub(crate) async fn send_json(
    provider: &str,
    request: RequestBuilder,
    timeout: Duration,
) -> Result<Value, VendorError> {
    let response = request.timeout(timeout).send().await.map_err(|e| {
        if e.is_timeout() {
            VendorError::Timeout {
                provider: provider.to_string(),
            }
        } else {
            VendorError::Network(e)
        }
    })?;

    let status = response.status();
    debug!("{} responded with HTTP {}", provider, status);

    if status == StatusCode::TOO_MANY_REQUESTS {
        return Err(VendorError::RateLimited {
            provider: provider.to_string(),
        });
    }

    if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
        return Err(VendorError::ProviderError {
            provider: provider.to_string(),
            message: "Credentials rejected".to_string(),
        });
    }

    let body = response.text().await.map_err(|e| {
        if e.is_timeout() {
            VendorError::Timeout {
                provider: provider.to_string(),
            }
        } else {
            VendorError::Network(e)
        }
    })?;

    if status.is_server_error() {
        return Err(VendorError::ServerError {
            provider: provider.to_string(),
            status: status.as_u16(),
            message: truncate(&body, 200).to_string(),
        });
    }

    if !status.is_success() {
        return Err(VendorError::ProviderError {
            provider: provider.to_string(),
            message: format!("HTTP {} - {}", status, truncate(&body, 200)),
        });
    }

    serde_json::from_str(&body).map_err(|e| VendorError::InvalidResponse {
        provider: provider.to_string(),
        message: format!("{} (body: {})", e, truncate(&body, 200)),
    })
}

fn truncate(s: &str, max: usize) -> &str {
    match s.char_indices().nth(max) {
        Some((idx, _)) => &s[..idx],
        None => s,
    }
}

/// Read a field that vendors send either as a JSON string or a number.
pub(crate) fn string_field(value: &Value, key: &str) -> Option<String> {
    match value.get(key)? {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// Read a decimal amount sent either as a JSON string or a number.
pub(crate) fn decimal_field(value: &Value, key: &str) -> Option<Decimal> {
    string_field(value, key).and_then(|s| Decimal::from_str(s.trim()).ok())
}
