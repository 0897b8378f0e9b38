//! Response decoders. Attribute values pass through untouched; a missing
//! field is an error that names the field, never a silent default.

use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::warn;

use crate::{
    api::{IngestResponse, LookupResult},
    error::{Result, VectoError},
};

pub(crate) fn decode<T: DeserializeOwned>(operation: &'static str, value: Value) -> Result<T> {
    serde_json::from_value(value).map_err(|e| VectoError::decode(operation, e))
}

/// Accepts `{"results": [...]}` or a bare array. Service order is kept.
pub(crate) fn lookup_results(operation: &'static str, value: Value) -> Result<Vec<LookupResult>> {
    let results = match value {
        Value::Array(results) => results,
        Value::Object(mut object) => match object.remove("results") {
            Some(Value::Array(results)) => results,
            Some(other) => {
                return Err(VectoError::decode(
                    operation,
                    format!("`results` is not an array: {other}"),
                ))
            }
            None => return Err(VectoError::decode(operation, "missing field `results`")),
        },
        other => {
            return Err(VectoError::decode(
                operation,
                format!("expected a list of results, got {other}"),
            ))
        }
    };

    results
        .into_iter()
        .enumerate()
        .map(|(index, result)| {
            serde_json::from_value(result)
                .map_err(|e| VectoError::decode(operation, format!("result {index}: {e}")))
        })
        .collect()
}

/// The service is expected to answer with one id per submitted item, in
/// submission order. That is its contract; a mismatch is logged, not fixed.
pub(crate) fn ingest_response(
    operation: &'static str,
    value: Value,
    submitted: usize,
) -> Result<IngestResponse> {
    let response: IngestResponse = decode(operation, value)?;
    if response.ids.len() != submitted {
        warn!(
            submitted,
            returned = response.ids.len(),
            "service returned a different number of ids than items submitted"
        );
    }
    Ok(response)
}
