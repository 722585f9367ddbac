//! VIN Report Flow
//!
//! Two-step retrieval of a MarketCheck VIN report:
//!
//! 1. **Generate** the report for a VIN. The answer either embeds the report
//!    (done), names a report id (go to step 2) or neither (failed).
//! 2. **Access** the report by id.
//!
//! When generation itself is refused by the provider, one attempt is made at
//! the alternate `access-report/{vin}` path before giving up. There are no
//! other retries; failures go back to the caller.

use serde_json::Value;
use tracing::{info, warn};

use crate::error::{AppError, Result};
use crate::providers::MarketCheckClient;

/// Endpoint label for a result produced by report generation
pub const GENERATE_ENDPOINT: &str = "generate-report";
/// Endpoint label for a result produced by access-by-id
pub const ACCESS_ENDPOINT: &str = "access-report";
/// Endpoint label for a result produced by the fallback path
pub const FALLBACK_ENDPOINT: &str = "access-report (fallback)";

const REPORT_ID_FIELDS: [&str; 3] = ["report_id", "reportId", "id"];

// == Flow Types ==
/// Outcome of the generate step.
#[derive(Debug, Clone, PartialEq)]
pub enum GenerateOutcome {
    /// The provider embedded the report in its answer
    Direct(Value),
    /// The report must be fetched by id
    Pending(String),
}

/// Which call produced a result.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Provenance {
    Primary,
    Fallback,
}

/// Result of the generate step plus where it came from.
#[derive(Debug, Clone, PartialEq)]
pub struct GeneratedReport {
    pub outcome: GenerateOutcome,
    pub provenance: Provenance,
}

impl GeneratedReport {
    /// Endpoint label reported to callers.
    pub fn endpoint(&self) -> &'static str {
        match self.provenance {
            Provenance::Primary => GENERATE_ENDPOINT,
            Provenance::Fallback => FALLBACK_ENDPOINT,
        }
    }
}

/// A fully resolved report.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedReport {
    pub data: Value,
    /// Set when the report was fetched by id
    pub report_id: Option<String>,
    pub endpoint: &'static str,
}

// == Flow ==
/// Runs the VIN report state machine against MarketCheck.
///
/// The VIN must already be validated.
#[derive(Debug, Clone, Copy)]
pub struct VinReportFlow<'a> {
    client: &'a MarketCheckClient,
}

impl<'a> VinReportFlow<'a> {
    pub fn new(client: &'a MarketCheckClient) -> Self {
        Self { client }
    }

    /// Generate step, with the one-shot fallback.
    pub async fn generate(&self, vin: &str) -> Result<GeneratedReport> {
        match self.client.generate_report(vin).await {
            Ok(body) => Ok(GeneratedReport {
                outcome: classify_generate_response(body)?,
                provenance: Provenance::Primary,
            }),
            Err(primary @ AppError::Provider { .. }) => {
                warn!(vin, "report generation failed, trying access-report fallback");
                match self.client.access_report_by_vin(vin).await {
                    Ok(data) => {
                        info!(vin, "access-report fallback succeeded");
                        Ok(GeneratedReport {
                            outcome: GenerateOutcome::Direct(data),
                            provenance: Provenance::Fallback,
                        })
                    }
                    Err(fallback) => {
                        warn!(vin, "access-report fallback failed: {}", fallback);
                        Err(primary)
                    }
                }
            }
            Err(other) => Err(other),
        }
    }

    /// Access step.
    pub async fn access(&self, report_id: &str) -> Result<Value> {
        self.client.access_report(report_id).await
    }

    /// Runs generate then, when needed, access until the report is resolved.
    pub async fn resolve(&self, vin: &str) -> Result<ResolvedReport> {
        let generated = self.generate(vin).await?;
        let endpoint = generated.endpoint();

        match generated.outcome {
            GenerateOutcome::Direct(data) => Ok(ResolvedReport {
                data,
                report_id: None,
                endpoint,
            }),
            GenerateOutcome::Pending(report_id) => {
                let data = self.access(&report_id).await?;
                Ok(ResolvedReport {
                    data,
                    report_id: Some(report_id),
                    endpoint: ACCESS_ENDPOINT,
                })
            }
        }
    }
}

/// Decides what a successful generate answer means.
///
/// Embedded `data` wins over a report id; a non-empty non-JSON body (an
/// HTML report) counts as embedded data.
pub fn classify_generate_response(body: Value) -> Result<GenerateOutcome> {
    match body {
        Value::Object(mut map) => {
            if let Some(data) = map.remove("data").filter(|d| !d.is_null()) {
                return Ok(GenerateOutcome::Direct(data));
            }
            REPORT_ID_FIELDS
                .iter()
                .find_map(|field| map.get(*field).and_then(report_id_string))
                .map(GenerateOutcome::Pending)
                .ok_or_else(no_report_id)
        }
        Value::String(text) if !text.trim().is_empty() => {
            Ok(GenerateOutcome::Direct(Value::String(text)))
        }
        _ => Err(no_report_id()),
    }
}

fn report_id_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn no_report_id() -> AppError {
    AppError::ReportUnavailable(
        "No report ID received. Please check the VIN and try again.".to_string(),
    )
}
