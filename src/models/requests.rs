//! Request DTOs for the gateway API
//!
//! Defines the structure of incoming JSON bodies and query strings. Every
//! field is optional at the serde level so that missing input surfaces as a
//! 400 from validation rather than an extractor rejection.

use serde::{Deserialize, Deserializer};
use serde_json::Value;

use crate::error::{AppError, Result};

/// Length of a valid VIN
pub const VIN_LENGTH: usize = 17;

/// Validates a VIN before any cache or provider interaction.
///
/// Surrounding whitespace is ignored and the VIN is upper-cased; the result
/// must be exactly [`VIN_LENGTH`] characters.
pub fn require_vin(vin: Option<&str>) -> Result<String> {
    let vin = vin.map(str::trim).unwrap_or_default();
    if vin.is_empty() {
        return Err(AppError::InvalidRequest("VIN is required".to_string()));
    }
    if vin.chars().count() != VIN_LENGTH {
        return Err(AppError::InvalidRequest(format!(
            "VIN must be exactly {} characters. Please check the VIN and try again.",
            VIN_LENGTH
        )));
    }
    Ok(vin.to_ascii_uppercase())
}

/// Body or query carrying just a VIN.
///
/// Used by `generate-report`, `report` and `demand-score`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct VinRequest {
    #[serde(default)]
    pub vin: Option<String>,
}

impl VinRequest {
    pub fn vin(&self) -> Result<String> {
        require_vin(self.vin.as_deref())
    }
}

/// Body for `access-report`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AccessReportRequest {
    #[serde(default, rename = "reportId", alias = "report_id")]
    pub report_id: Option<String>,
}

impl AccessReportRequest {
    pub fn report_id(&self) -> Result<String> {
        self.report_id
            .as_deref()
            .map(str::trim)
            .filter(|id| !id.is_empty())
            .map(str::to_string)
            .ok_or_else(|| AppError::InvalidRequest("reportId is required".to_string()))
    }
}

/// Body for the `valuation` and `mmr` routes.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct VehicleRequest {
    #[serde(default)]
    pub vin: Option<String>,
    /// Odometer reading; accepts `42000` or `"42,000"`
    #[serde(default, alias = "mileage", deserialize_with = "lenient_u64")]
    pub miles: Option<u64>,
    #[serde(default)]
    pub zip: Option<String>,
    /// `franchise` (provider default) or `independent`
    #[serde(default, rename = "dealerType", alias = "dealer_type")]
    pub dealer_type: Option<String>,
}

impl VehicleRequest {
    pub fn vin(&self) -> Result<String> {
        require_vin(self.vin.as_deref())
    }

    /// ZIP code with whitespace removed, `None` when blank.
    pub fn zip(&self) -> Option<String> {
        clean(self.zip.as_deref())
    }

    pub fn dealer_type(&self) -> Option<String> {
        clean(self.dealer_type.as_deref())
    }
}

/// Query string for the listing search route.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SearchQuery {
    #[serde(default, deserialize_with = "lenient_u64")]
    pub year: Option<u64>,
    #[serde(default)]
    pub make: Option<String>,
    #[serde(default)]
    pub model: Option<String>,
    #[serde(default)]
    pub zip: Option<String>,
    #[serde(default, deserialize_with = "lenient_u64")]
    pub radius: Option<u64>,
    #[serde(default, deserialize_with = "lenient_u64")]
    pub rows: Option<u64>,
}

impl SearchQuery {
    /// Requires at least one of year, make or model.
    pub fn validate(&self) -> Result<()> {
        if self.year.is_none()
            && clean(self.make.as_deref()).is_none()
            && clean(self.model.as_deref()).is_none()
        {
            return Err(AppError::InvalidRequest(
                "At least one of year, make or model is required".to_string(),
            ));
        }
        Ok(())
    }

    /// Non-empty parameters as provider query pairs, in a fixed order.
    pub fn to_query_pairs(&self) -> Vec<(&'static str, String)> {
        let mut pairs = Vec::new();
        if let Some(year) = self.year {
            pairs.push(("year", year.to_string()));
        }
        if let Some(make) = clean(self.make.as_deref()) {
            pairs.push(("make", make));
        }
        if let Some(model) = clean(self.model.as_deref()) {
            pairs.push(("model", model));
        }
        if let Some(zip) = clean(self.zip.as_deref()) {
            pairs.push(("zip", zip));
        }
        if let Some(radius) = self.radius {
            pairs.push(("radius", radius.to_string()));
        }
        if let Some(rows) = self.rows {
            pairs.push(("rows", rows.to_string()));
        }
        pairs
    }
}

/// Query string for `DELETE /api/cache`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CacheClearQuery {
    #[serde(default)]
    pub endpoint: Option<String>,
}

// == Helpers ==
fn clean(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

/// Accepts a number, a numeric string (commas allowed) or null.
///
/// Anything unparsable becomes `None` instead of rejecting the request.
fn lenient_u64<'de, D>(deserializer: D) -> std::result::Result<Option<u64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(Value::Number(n)) => n
            .as_u64()
            .or_else(|| n.as_f64().filter(|f| *f >= 0.0).map(|f| f.round() as u64)),
        Some(Value::String(s)) => s.trim().replace(',', "").parse().ok(),
        _ => None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_require_vin_accepts_17_characters() {
        assert_eq!(
            require_vin(Some("1hgcm82633a004352")).unwrap(),
            "1HGCM82633A004352"
        );
        assert_eq!(
            require_vin(Some("  1HGCM82633A004352 ")).unwrap(),
            "1HGCM82633A004352"
        );
    }

    #[test]
    fn test_require_vin_rejects_wrong_length() {
        assert!(matches!(
            require_vin(Some("1HGCM82633A00435")),
            Err(AppError::InvalidRequest(_))
        ));
        assert!(matches!(
            require_vin(Some("1HGCM82633A0043521")),
            Err(AppError::InvalidRequest(_))
        ));
    }

    #[test]
    fn test_require_vin_rejects_missing() {
        assert!(matches!(require_vin(None), Err(AppError::InvalidRequest(_))));
        assert!(matches!(require_vin(Some("   ")), Err(AppError::InvalidRequest(_))));
    }

    #[test]
    fn test_vehicle_request_lenient_miles() {
        let req: VehicleRequest =
            serde_json::from_str(r#"{"vin":"1HGCM82633A004352","miles":"42,000","zip":" 90210 "}"#)
                .unwrap();
        assert_eq!(req.miles, Some(42_000));
        assert_eq!(req.zip().as_deref(), Some("90210"));

        let req: VehicleRequest = serde_json::from_str(r#"{"mileage":12000.4}"#).unwrap();
        assert_eq!(req.miles, Some(12_000));

        let req: VehicleRequest = serde_json::from_str(r#"{"miles":"lots"}"#).unwrap();
        assert_eq!(req.miles, None);
    }

    #[test]
    fn test_vehicle_request_dealer_type() {
        let req: VehicleRequest = serde_json::from_str(r#"{"dealerType":" independent "}"#).unwrap();
        assert_eq!(req.dealer_type().as_deref(), Some("independent"));

        let req: VehicleRequest = serde_json::from_str(r#"{"dealer_type":"franchise"}"#).unwrap();
        assert_eq!(req.dealer_type().as_deref(), Some("franchise"));

        let req: VehicleRequest = serde_json::from_str(r#"{"dealerType":""}"#).unwrap();
        assert_eq!(req.dealer_type(), None);
    }

    #[test]
    fn test_access_report_request_aliases() {
        let req: AccessReportRequest = serde_json::from_str(r#"{"reportId":"r-1"}"#).unwrap();
        assert_eq!(req.report_id().unwrap(), "r-1");

        let req: AccessReportRequest = serde_json::from_str(r#"{"report_id":"r-2"}"#).unwrap();
        assert_eq!(req.report_id().unwrap(), "r-2");

        let req: AccessReportRequest = serde_json::from_str(r#"{}"#).unwrap();
        assert!(req.report_id().is_err());
    }

    #[test]
    fn test_search_query_validation_and_pairs() {
        let query = SearchQuery::default();
        assert!(query.validate().is_err());

        let query = SearchQuery {
            year: Some(2020),
            make: Some("Honda".into()),
            model: Some(" ".into()),
            zip: Some("90210".into()),
            ..SearchQuery::default()
        };
        assert!(query.validate().is_ok());
        assert_eq!(
            query.to_query_pairs(),
            vec![
                ("year", "2020".to_string()),
                ("make", "Honda".to_string()),
                ("zip", "90210".to_string()),
            ]
        );
    }
}
