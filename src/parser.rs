//! Response schema for the product API.
//!
//! Every field the API may omit is an `Option` (or defaults to empty), so a
//! sparse payload still decodes. Numeric fields accept any JSON number or a
//! numeric string; values of the wrong kind decode as `None`. Only
//! structurally wrong JSON is an error.

use serde::{Deserialize, Deserializer};
use serde_json::Value;

use crate::error::FetchError;

#[derive(Debug, Default, Deserialize)]
pub struct ProductResponse {
    #[serde(default)]
    pub request_info: Option<RequestInfo>,
    #[serde(default)]
    pub product: Option<Product>,
}

/// Usage counters reported with every response.
#[derive(Debug, Default, Clone, Copy, Deserialize)]
pub struct RequestInfo {
    #[serde(default, deserialize_with = "lenient_count")]
    pub credits_used: Option<u64>,
    #[serde(default, deserialize_with = "lenient_count")]
    pub credits_remaining: Option<u64>,
}

#[derive(Debug, Default, Deserialize)]
pub struct Product {
    #[serde(default, deserialize_with = "lenient_number")]
    pub rating: Option<f64>,
    #[serde(default, deserialize_with = "lenient_count")]
    pub ratings_total: Option<u64>,
    #[serde(default)]
    pub specifications: Option<Vec<Specification>>,
    #[serde(default)]
    pub rating_breakdown: Option<RatingBreakdown>,
}

#[derive(Debug, Default, Deserialize)]
pub struct Specification {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub value: Option<Value>,
}

impl Specification {
    /// The specification value as text. Non-string scalars are stringified;
    /// null and blank values yield `None`.
    pub fn value_text(&self) -> Option<String> {
        let text = match self.value.as_ref()? {
            Value::Null => return None,
            Value::String(s) => s.trim().to_string(),
            other => other.to_string(),
        };
        (!text.is_empty()).then_some(text)
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct RatingBreakdown {
    #[serde(default)]
    pub five_star: Option<BucketCount>,
    #[serde(default)]
    pub four_star: Option<BucketCount>,
    #[serde(default)]
    pub three_star: Option<BucketCount>,
    #[serde(default)]
    pub two_star: Option<BucketCount>,
    #[serde(default)]
    pub one_star: Option<BucketCount>,
}

#[derive(Debug, Default, Clone, Copy, Deserialize)]
pub struct BucketCount {
    #[serde(default, deserialize_with = "lenient_count")]
    pub count: Option<u64>,
}

fn number_value(value: Option<Value>) -> Option<f64> {
    let number: f64 = match value? {
        Value::Number(n) => n.as_f64()?,
        Value::String(s) => s.trim().replace(',', "").parse().ok()?,
        _ => return None,
    };
    number.is_finite().then_some(number)
}

fn lenient_number<'de, D: Deserializer<'de>>(de: D) -> Result<Option<f64>, D::Error> {
    Ok(number_value(Option::<Value>::deserialize(de)?))
}

/// Non-negative counts; fractional values are truncated.
fn lenient_count<'de, D: Deserializer<'de>>(de: D) -> Result<Option<u64>, D::Error> {
    let value = Option::<Value>::deserialize(de)?;
    if let Some(n) = value.as_ref().and_then(Value::as_u64) {
        return Ok(Some(n));
    }
    Ok(number_value(value).filter(|n| *n >= 0.0).map(|n| n as u64))
}

/// Count of a single bucket, defaulting to 0 when the bucket or its count is absent.
pub fn bucket_count(bucket: Option<&BucketCount>) -> u64 {
    bucket.and_then(|b| b.count).unwrap_or(0)
}

/// Decodes a raw product API payload.
///
/// # Errors
///
/// Returns [`FetchError::Decode`] if the bytes are not JSON of the expected shape.
pub fn parse_product_response(bytes: &[u8]) -> Result<ProductResponse, FetchError> {
    Ok(serde_json::from_slice(bytes)?)
}
