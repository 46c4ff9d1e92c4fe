//! Distribution <-> JSON text.
//!
//! The document is one object: each key is the outcome tuple written as a
//! JSON array (`"[1, 2]"`), each value its count. Whole counts are written
//! as integers, fractional ones as floats.

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde_json::{Map, Number, Value};

use dicedist_eval::{DiceTuple, Distribution};

use crate::error::StorageError;

/// Render a tuple the way outcome keys are stored.
pub fn encode_key(key: &[i64]) -> String {
    let parts: Vec<String> = key.iter().map(i64::to_string).collect();
    format!("[{}]", parts.join(", "))
}

/// Parse a stored key: an integer array, or a bare integer for a 1-tuple.
pub fn decode_key(text: &str) -> Result<DiceTuple, StorageError> {
    let invalid = || StorageError::InvalidKey(text.to_string());
    match serde_json::from_str::<Value>(text).map_err(|_| invalid())? {
        Value::Array(items) => items
            .iter()
            .map(|item| item.as_i64().ok_or_else(invalid))
            .collect(),
        Value::Number(n) => n.as_i64().map(|v| vec![v]).ok_or_else(invalid),
        _ => Err(invalid()),
    }
}

fn encode_count(count: Decimal) -> Value {
    if count.fract().is_zero() {
        if let Some(n) = count.to_i64() {
            return Value::Number(n.into());
        }
        if let Some(n) = count.to_u64() {
            return Value::Number(n.into());
        }
    }
    count
        .to_f64()
        .and_then(Number::from_f64)
        .map(Value::Number)
        .unwrap_or(Value::Null)
}

fn decode_count(key: &str, value: &Value) -> Result<Decimal, StorageError> {
    let invalid = || StorageError::InvalidCount {
        key: key.to_string(),
        value: value.to_string(),
    };
    let Value::Number(n) = value else {
        return Err(invalid());
    };
    let count = if let Some(i) = n.as_i64() {
        Decimal::from(i)
    } else if let Some(u) = n.as_u64() {
        Decimal::from(u)
    } else {
        n.as_f64()
            .and_then(|f| Decimal::try_from(f).ok())
            .ok_or_else(invalid)?
    };
    if count.is_sign_negative() && !count.is_zero() {
        return Err(invalid());
    }
    Ok(count)
}

/// The JSON document for `distribution`.
pub fn to_value(distribution: &Distribution) -> Value {
    let entries: Map<String, Value> = distribution
        .iter()
        .map(|(key, count)| (encode_key(key), encode_count(*count)))
        .collect();
    Value::Object(entries)
}

/// Rebuild a distribution from its JSON document.
pub fn from_value(value: &Value) -> Result<Distribution, StorageError> {
    let Value::Object(entries) = value else {
        return Err(StorageError::NotAnObject);
    };
    let mut distribution = Distribution::new();
    for (key, count) in entries {
        distribution.add(decode_key(key)?, decode_count(key, count)?);
    }
    Ok(distribution)
}

pub fn to_json(distribution: &Distribution) -> Result<String, StorageError> {
    Ok(serde_json::to_string_pretty(&to_value(distribution))?)
}

pub fn from_json(text: &str) -> Result<Distribution, StorageError> {
    let value: Value = serde_json::from_str(text)?;
    from_value(&value)
}
