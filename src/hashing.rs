//! Hashing System - SHA-256 for Quotations
//!
//! The same requirements priced against the same rates by the same engine
//! always produce the same job hash.

use serde::Serialize;
use serde_json::{to_string, Value};
use sha2::{Digest, Sha256};

use crate::materials::MaterialRateTable;
use crate::requirements::ProductRequirements;

/// SHA-256 of bytes as lowercase hex
pub fn sha256_hex(data: &[u8]) -> String {
    Sha256::digest(data)
        .iter()
        .map(|b| format!("{:02x}", b))
        .collect()
}

/// Canonical JSON: object keys sorted at every depth, no whitespace
pub fn canonical_json<T: Serialize>(value: &T) -> Result<String, serde_json::Error> {
    let v = serde_json::to_value(value)?;
    to_string(&sorted(v))
}

fn sorted(v: Value) -> Value {
    match v {
        Value::Object(map) => {
            let mut entries: Vec<_> = map.into_iter().collect();
            entries.sort_by(|a, b| a.0.cmp(&b.0));
            Value::Object(entries.into_iter().map(|(k, v)| (k, sorted(v))).collect())
        }
        Value::Array(items) => Value::Array(items.into_iter().map(sorted).collect()),
        other => other,
    }
}

/// Digest of a rate snapshot, recorded on every quotation
pub fn rates_digest(rates: &MaterialRateTable) -> Result<String, serde_json::Error> {
    Ok(sha256_hex(canonical_json(rates)?.as_bytes()))
}

/// job_hash = sha256(canonical requirements : rates digest : engine version)
pub fn compute_job_hash(
    requirements: &ProductRequirements,
    rates: &MaterialRateTable,
    engine_version: &str,
) -> Result<String, serde_json::Error> {
    let combined = format!(
        "{}:{}:{}",
        canonical_json(requirements)?,
        rates_digest(rates)?,
        engine_version
    );
    Ok(sha256_hex(combined.as_bytes()))
}

/// Hash over a complete quotation envelope
pub fn compute_quotation_hash<T: Serialize>(quotation: &T) -> Result<String, serde_json::Error> {
    Ok(sha256_hex(canonical_json(quotation)?.as_bytes()))
}
