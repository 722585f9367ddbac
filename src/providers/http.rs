//! Shared outbound HTTP helpers
//!
//! Client construction, URL joining and conversion of provider responses into
//! JSON values or [`AppError::Provider`].

use std::time::Duration;

use reqwest::{Client, Response, StatusCode, Url};
use serde_json::Value;
use tracing::warn;

use crate::error::{AppError, Result};

/// Builds the HTTP client shared by every provider.
///
/// Every request carries `timeout`; providers have no timeout of their own.
pub fn build_client(timeout: Duration) -> Result<Client> {
    Ok(Client::builder()
        .pool_max_idle_per_host(10)
        .pool_idle_timeout(Duration::from_secs(30))
        .connect_timeout(timeout.min(Duration::from_secs(10)))
        .timeout(timeout)
        .user_agent(concat!("vin_intel/", env!("CARGO_PKG_VERSION")))
        .build()?)
}

/// Appends percent-encoded path segments to `base`.
pub fn join_url(base: &str, segments: &[&str]) -> Result<Url> {
    let mut url = Url::parse(base)
        .map_err(|e| AppError::Config(format!("invalid provider base URL '{}': {}", base, e)))?;
    {
        let mut path = url
            .path_segments_mut()
            .map_err(|_| AppError::Config(format!("provider base URL '{}' cannot be a base", base)))?;
        path.pop_if_empty().extend(segments);
    }
    Ok(url)
}

/// Reads a successful response as JSON.
///
/// Non-success statuses become [`provider_error`]; a success status with a
/// body that is not JSON is reported as 502.
pub async fn read_json(provider: &str, response: Response) -> Result<Value> {
    let status = response.status();
    let text = response.text().await?;

    if !status.is_success() {
        return Err(provider_error(provider, status, &text));
    }

    serde_json::from_str(&text).map_err(|e| {
        warn!(provider, "provider returned a malformed body: {}", e);
        AppError::Provider {
            status: StatusCode::BAD_GATEWAY.as_u16(),
            message: format!("Invalid response from {}", provider),
            details: Some(Value::String(e.to_string())),
        }
    })
}

/// Reads a successful response, keeping a non-JSON body as a string value.
///
/// An empty body reads as `null`.
pub async fn read_body(provider: &str, response: Response) -> Result<Value> {
    let status = response.status();
    let text = response.text().await?;

    if !status.is_success() {
        return Err(provider_error(provider, status, &text));
    }

    if text.trim().is_empty() {
        return Ok(Value::Null);
    }
    Ok(serde_json::from_str(&text).unwrap_or(Value::String(text)))
}

/// Builds the error for a non-success provider response.
///
/// The body is parsed as JSON when possible to pull out a message; the
/// parsed body (or the raw text) is kept as `details`.
pub fn provider_error(provider: &str, status: StatusCode, body: &str) -> AppError {
    let parsed: Option<Value> = serde_json::from_str(body).ok();
    let raw = body.trim();

    let message = parsed
        .as_ref()
        .and_then(extract_message)
        .unwrap_or_else(|| {
            format!(
                "{} request failed with status {}",
                provider,
                status.as_u16()
            )
        });

    let details = match parsed {
        Some(value) => Some(value),
        None if !raw.is_empty() => Some(Value::String(raw.to_string())),
        None => None,
    };

    warn!(provider, status = status.as_u16(), "provider error: {}", message);

    AppError::Provider {
        status: status.as_u16(),
        message,
        details,
    }
}

fn extract_message(body: &Value) -> Option<String> {
    const FIELDS: [&str; 5] = ["message", "error_description", "error", "msg", "detail"];

    FIELDS.iter().find_map(|field| match body.get(*field)? {
        Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
        nested @ Value::Object(_) => extract_message(nested),
        _ => None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_join_url() {
        let url = join_url("https://mc-api.marketcheck.com", &["v2", "listing", "car", "a/b c"]).unwrap();
        assert_eq!(
            url.as_str(),
            "https://mc-api.marketcheck.com/v2/listing/car/a%2Fb%20c"
        );

        let url = join_url("http://127.0.0.1:8080/prefix/", &["v2", "mds"]).unwrap();
        assert_eq!(url.as_str(), "http://127.0.0.1:8080/prefix/v2/mds");
    }

    #[test]
    fn test_join_url_rejects_invalid_base() {
        assert!(matches!(join_url("not a url", &["x"]), Err(AppError::Config(_))));
    }

    #[test]
    fn test_provider_error_prefers_json_message() {
        let err = provider_error(
            "MarketCheck",
            StatusCode::UNPROCESSABLE_ENTITY,
            r#"{"code":422,"message":"Invalid VIN"}"#,
        );
        match err {
            AppError::Provider {
                status,
                message,
                details,
            } => {
                assert_eq!(status, 422);
                assert_eq!(message, "Invalid VIN");
                assert_eq!(details, Some(json!({"code": 422, "message": "Invalid VIN"})));
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[test]
    fn test_provider_error_reads_nested_error_object() {
        let err = provider_error(
            "Manheim",
            StatusCode::UNAUTHORIZED,
            r#"{"error":{"message":"token expired"}}"#,
        );
        assert_eq!(err.to_string(), "token expired");
    }

    #[test]
    fn test_provider_error_falls_back_to_raw_text() {
        let err = provider_error("MarketCheck", StatusCode::BAD_GATEWAY, "upstream exploded");
        match err {
            AppError::Provider {
                status,
                message,
                details,
            } => {
                assert_eq!(status, 502);
                assert_eq!(message, "MarketCheck request failed with status 502");
                assert_eq!(details, Some(json!("upstream exploded")));
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[test]
    fn test_provider_error_empty_body() {
        match provider_error("MarketCheck", StatusCode::NOT_FOUND, "  ") {
            AppError::Provider { details, .. } => assert!(details.is_none()),
            other => panic!("unexpected error: {:?}", other),
        }
    }
}
