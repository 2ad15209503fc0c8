//! Listing endpoint wire types
//!
//! The endpoint answers `{"results": [...], "resultsTotal": N}`. Missing or
//! empty `results` ends pagination, a missing `resultsTotal` leaves the
//! total unknown.

use serde::{Deserialize, Deserializer};
use serde_json::Value;

use crate::error::FetchError;

/// Minimal job identity from the listing, before detail enrichment.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct JobStub {
    #[serde(default, deserialize_with = "lenient_string")]
    pub id: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub title: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub location: String,
    /// Detail page path, relative to the site root
    #[serde(default, deserialize_with = "lenient_string")]
    pub link: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PageResponse {
    pub results: Vec<JobStub>,
    pub results_total: Option<usize>,
}

impl PageResponse {
    /// Parse a listing body.
    pub fn from_json(body: &str) -> Result<Self, FetchError> {
        let value: Value = serde_json::from_str(body)
            .map_err(|e| FetchError::MalformedResponse(format!("invalid JSON: {}", e)))?;
        Self::from_value(value)
    }

    pub fn from_value(value: Value) -> Result<Self, FetchError> {
        let Value::Object(mut map) = value else {
            return Err(FetchError::MalformedResponse(
                "listing body is not a JSON object".into(),
            ));
        };

        let results = match map.remove("results") {
            None | Some(Value::Null) => Vec::new(),
            Some(Value::Array(items)) => items
                .into_iter()
                .map(serde_json::from_value::<JobStub>)
                .collect::<Result<Vec<_>, _>>()
                .map_err(|e| FetchError::MalformedResponse(format!("bad job entry: {}", e)))?,
            Some(other) => {
                return Err(FetchError::MalformedResponse(format!(
                    "results is not an array: {}",
                    other
                )))
            }
        };

        let results_total = match map.get("resultsTotal") {
            None | Some(Value::Null) => None,
            Some(Value::Number(n)) => n.as_u64().map(|n| n as usize),
            Some(Value::String(s)) => s.trim().parse().ok(),
            Some(other) => {
                return Err(FetchError::MalformedResponse(format!(
                    "resultsTotal is not a number: {}",
                    other
                )))
            }
        };

        Ok(Self {
            results,
            results_total,
        })
    }

    /// True when this page signals the end of pagination.
    pub fn is_last(&self) -> bool {
        self.results.is_empty()
    }
}

/// Any scalar as text, `null` as empty. A stray number in a field never
/// fails the whole page.
fn lenient_string<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    Ok(match Value::deserialize(deserializer)? {
        Value::String(s) => s,
        Value::Null => String::new(),
        other => other.to_string(),
    })
}
