//! Demo Responder
//!
//! Maps an API path to a fixture file and turns the fixture into a response.

use std::path::{Component, Path, PathBuf};

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::{json, Value};
use tracing::{debug, warn};

/// Prefix stripped from the API path before locating the fixture
pub const API_PREFIX: &str = "/api/";
/// Extension appended to the stripped path
pub const FIXTURE_EXTENSION: &str = "json";

/// Fixture-backed response: status plus the fixture body.
#[derive(Debug, Clone, PartialEq)]
pub struct DemoResponse {
    pub status: StatusCode,
    pub body: Value,
}

impl DemoResponse {
    /// 200 when the fixture reports `success: true`, 404 otherwise.
    fn from_fixture(body: Value) -> Self {
        let success = body.get("success").and_then(Value::as_bool).unwrap_or(false);
        let status = if success {
            StatusCode::OK
        } else {
            StatusCode::NOT_FOUND
        };
        Self { status, body }
    }

    /// Canonical answer for a path with no usable fixture.
    fn not_found(api_path: &str) -> Self {
        Self {
            status: StatusCode::NOT_FOUND,
            body: json!({
                "success": false,
                "error": "Demo data not found",
                "details": format!("No demo fixture is available for {}", api_path),
            }),
        }
    }
}

impl IntoResponse for DemoResponse {
    fn into_response(self) -> Response {
        (self.status, Json(self.body)).into_response()
    }
}

/// Demo-mode switch plus the fixture directory.
#[derive(Debug, Clone)]
pub struct DemoResponder {
    enabled: bool,
    fixture_dir: PathBuf,
}

impl DemoResponder {
    pub fn new(enabled: bool, fixture_dir: impl Into<PathBuf>) -> Self {
        Self {
            enabled,
            fixture_dir: fixture_dir.into(),
        }
    }

    /// A responder that never intercepts.
    pub fn disabled() -> Self {
        Self::new(false, PathBuf::new())
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// File backing `api_path`: `/api/vindata/valuation` maps to
    /// `<fixture_dir>/vindata/valuation.json`.
    ///
    /// `None` for paths outside the API prefix or that try to leave the
    /// fixture directory.
    pub fn fixture_path(&self, api_path: &str) -> Option<PathBuf> {
        let relative = api_path
            .strip_prefix(API_PREFIX)?
            .trim_end_matches('/');
        if relative.is_empty() {
            return None;
        }

        let relative = Path::new(relative);
        if !relative
            .components()
            .all(|c| matches!(c, Component::Normal(_)))
        {
            return None;
        }

        let mut path = self.fixture_dir.join(relative);
        let file_name = path.file_name()?.to_string_lossy().into_owned();
        path.set_file_name(format!("{}.{}", file_name, FIXTURE_EXTENSION));
        Some(path)
    }

    /// Returns the fixture response for `api_path`, or `None` when demo mode
    /// is off.
    pub async fn intercept(&self, api_path: &str) -> Option<DemoResponse> {
        if !self.enabled {
            return None;
        }
        Some(self.respond(api_path).await)
    }

    /// Loads the fixture for `api_path`; a missing or unparsable fixture
    /// yields the canonical not-found response.
    pub async fn respond(&self, api_path: &str) -> DemoResponse {
        let Some(path) = self.fixture_path(api_path) else {
            warn!(api_path, "no demo fixture mapping for path");
            return DemoResponse::not_found(api_path);
        };

        let contents = match tokio::fs::read_to_string(&path).await {
            Ok(contents) => contents,
            Err(e) => {
                warn!(api_path, fixture = %path.display(), "demo fixture unreadable: {}", e);
                return DemoResponse::not_found(api_path);
            }
        };

        match serde_json::from_str::<Value>(&contents) {
            Ok(body) => {
                debug!(api_path, fixture = %path.display(), "serving demo fixture");
                DemoResponse::from_fixture(body)
            }
            Err(e) => {
                warn!(api_path, fixture = %path.display(), "demo fixture is not valid JSON: {}", e);
                DemoResponse::not_found(api_path)
            }
        }
    }
}
