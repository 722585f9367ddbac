//! Manheim MMR normalizer
//!
//! Manheim payloads vary by product and account: values may sit at the top of
//! a valuation, under `valuationDetails`, or inside `wholesale` /
//! `adjustedPricing` bands, and numbers sometimes arrive as strings. The
//! payload types below accept all of that and never fail; anything with the
//! wrong shape simply reads as absent.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

/// Label used for an adjustment that names nothing
pub const DEFAULT_ADJUSTMENT_LABEL: &str = "Adjustment";

// == Normalized Output ==
/// Fixed-shape valuation.
///
/// Absent figures are `None` (serialized as `null`), never zero, so callers
/// can tell "no data" from "worth nothing".
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NormalizedValuation {
    pub base_mmr: Option<f64>,
    pub adjusted_mmr: Option<f64>,
    pub avg_odo: Option<f64>,
    pub avg_condition: Option<f64>,
    pub adjustments: Vec<Adjustment>,
    pub metadata: ValuationMetadata,
    /// The provider payload exactly as received
    pub raw: Value,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Adjustment {
    pub label: String,
    pub value: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ValuationMetadata {
    pub vin: Option<String>,
    pub year: Option<u32>,
    pub make: Option<String>,
    pub model: Option<String>,
    pub trim: Option<String>,
    pub region: Option<String>,
    pub sample_size: Option<u64>,
    pub currency: Option<String>,
}

// == Provider Payload ==
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct ManheimValuation {
    #[serde(rename = "baseMMR", deserialize_with = "lenient_number")]
    base_mmr: Option<f64>,
    #[serde(rename = "adjustedMMR", deserialize_with = "lenient_number")]
    adjusted_mmr: Option<f64>,
    #[serde(deserialize_with = "lenient_number")]
    mmr: Option<f64>,
    #[serde(rename = "averageOdometer", deserialize_with = "lenient_number")]
    average_odometer: Option<f64>,
    #[serde(rename = "avgOdometer", deserialize_with = "lenient_number")]
    avg_odometer: Option<f64>,
    #[serde(rename = "averageCondition", deserialize_with = "lenient_number")]
    average_condition: Option<f64>,
    #[serde(rename = "avgCondition", deserialize_with = "lenient_number")]
    avg_condition: Option<f64>,
    #[serde(rename = "averageGrade", deserialize_with = "lenient_number")]
    average_grade: Option<f64>,
    #[serde(deserialize_with = "lenient")]
    wholesale: Option<PriceBand>,
    #[serde(rename = "adjustedPricing", deserialize_with = "lenient")]
    adjusted_pricing: Option<AdjustedPricing>,
    #[serde(rename = "valuationDetails", deserialize_with = "lenient")]
    valuation_details: Option<ValuationDetails>,
    #[serde(deserialize_with = "lenient")]
    adjustments: Option<Vec<Value>>,
    #[serde(deserialize_with = "lenient")]
    description: Option<Description>,
    #[serde(flatten)]
    top_level: Description,
    #[serde(deserialize_with = "lenient_string")]
    vin: Option<String>,
    #[serde(deserialize_with = "lenient_string")]
    region: Option<String>,
    #[serde(rename = "sampleSize", deserialize_with = "lenient_number")]
    sample_size: Option<f64>,
    #[serde(deserialize_with = "lenient_string")]
    currency: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct ValuationDetails {
    #[serde(rename = "baseMMR", deserialize_with = "lenient_number")]
    base_mmr: Option<f64>,
    #[serde(rename = "adjustedMMR", deserialize_with = "lenient_number")]
    adjusted_mmr: Option<f64>,
    #[serde(rename = "averageOdometer", deserialize_with = "lenient_number")]
    average_odometer: Option<f64>,
    #[serde(rename = "averageCondition", deserialize_with = "lenient_number")]
    average_condition: Option<f64>,
    #[serde(deserialize_with = "lenient")]
    adjustments: Option<Vec<Value>>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct PriceBand {
    #[serde(deserialize_with = "lenient_number")]
    average: Option<f64>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct AdjustedPricing {
    #[serde(deserialize_with = "lenient")]
    wholesale: Option<PriceBand>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct Description {
    #[serde(deserialize_with = "lenient_number")]
    year: Option<f64>,
    #[serde(deserialize_with = "lenient_string")]
    make: Option<String>,
    #[serde(deserialize_with = "lenient_string")]
    model: Option<String>,
    #[serde(deserialize_with = "lenient_string")]
    trim: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct RawAdjustment {
    #[serde(deserialize_with = "lenient_string")]
    label: Option<String>,
    #[serde(deserialize_with = "lenient_string")]
    name: Option<String>,
    #[serde(rename = "type", deserialize_with = "lenient_string")]
    kind: Option<String>,
    #[serde(deserialize_with = "lenient_number")]
    value: Option<f64>,
    #[serde(deserialize_with = "lenient_number")]
    amount: Option<f64>,
}

// == Normalizer ==
/// Maps a Manheim payload to a [`NormalizedValuation`].
///
/// The first element of `valuations` is used when present, otherwise the
/// whole payload is read as one valuation. Returns `None` for a missing,
/// `null` or empty payload. Pure: the input is only read.
pub fn normalize_manheim_response(payload: Option<&Value>) -> Option<NormalizedValuation> {
    let raw = payload.filter(|p| !is_empty(p))?;

    let source = raw
        .get("valuations")
        .and_then(Value::as_array)
        .and_then(|items| items.first())
        .unwrap_or(raw);

    let valuation = ManheimValuation::deserialize(source).unwrap_or_default();
    let details = valuation.valuation_details.unwrap_or_default();

    let base_mmr = valuation
        .base_mmr
        .or(details.base_mmr)
        .or(valuation.wholesale.and_then(|band| band.average))
        .or(valuation.mmr);

    let adjusted_mmr = valuation.adjusted_mmr.or(details.adjusted_mmr).or(valuation
        .adjusted_pricing
        .and_then(|pricing| pricing.wholesale)
        .and_then(|band| band.average));

    let avg_odo = valuation
        .average_odometer
        .or(valuation.avg_odometer)
        .or(details.average_odometer);

    let avg_condition = valuation
        .average_condition
        .or(valuation.avg_condition)
        .or(valuation.average_grade)
        .or(details.average_condition);

    let adjustments = valuation
        .adjustments
        .or(details.adjustments)
        .unwrap_or_default()
        .iter()
        .map(to_adjustment)
        .collect();

    let description = valuation.description.unwrap_or_default();
    let top = valuation.top_level;
    let metadata = ValuationMetadata {
        vin: valuation
            .vin
            .or_else(|| raw.get("vin").and_then(Value::as_str).map(str::to_string)),
        year: description.year.or(top.year).map(|y| y as u32),
        make: description.make.or(top.make),
        model: description.model.or(top.model),
        trim: description.trim.or(top.trim),
        region: valuation.region,
        sample_size: valuation.sample_size.map(|n| n as u64),
        currency: valuation.currency,
    };

    Some(NormalizedValuation {
        base_mmr,
        adjusted_mmr,
        avg_odo,
        avg_condition,
        adjustments,
        metadata,
        raw: raw.clone(),
    })
}

fn to_adjustment(item: &Value) -> Adjustment {
    let adj = RawAdjustment::deserialize(item).unwrap_or_default();
    Adjustment {
        label: adj
            .label
            .or(adj.name)
            .or(adj.kind)
            .unwrap_or_else(|| DEFAULT_ADJUSTMENT_LABEL.to_string()),
        value: adj.value.or(adj.amount).unwrap_or(0.0),
    }
}

fn is_empty(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::Object(map) => map.is_empty(),
        Value::Array(items) => items.is_empty(),
        Value::String(s) => s.trim().is_empty(),
        _ => false,
    }
}

// == Lenient Field Readers ==
fn lenient<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(value.and_then(|v| serde_json::from_value(v).ok()))
}

/// Numbers, or strings like `"12,500"` / `"$12500.00"`.
fn lenient_number<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(Value::Number(n)) => n.as_f64(),
        Some(Value::String(s)) => s
            .trim()
            .trim_start_matches('$')
            .replace(',', "")
            .parse()
            .ok(),
        _ => None,
    })
}

fn lenient_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(Value::String(s)) if !s.trim().is_empty() => Some(s.trim().to_string()),
        Some(Value::Number(n)) => Some(n.to_string()),
        _ => None,
    })
}
