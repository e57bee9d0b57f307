//! Value codec: renders local values as remote-safe SQL literals and
//! converts bridge-returned cells back into local values.

use chrono::{NaiveDate, NaiveDateTime};
use rust_decimal::Decimal;

use crate::catalog::{SemanticType, TableDescriptor};
use crate::errors::{Error, Result};
use crate::value::{Record, Value};

const DATE_FORMAT: &str = "%Y-%m-%d";
const DATETIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";
/// Some bridges hand back ISO datetimes with a `T` separator.
const DATETIME_FORMAT_ISO: &str = "%Y-%m-%dT%H:%M:%S";

/// Escape a string for inclusion in a single-quoted remote literal.
///
/// Backslashes are doubled first, then embedded single quotes: both forms
/// are required for the remote store's backslash-escape semantics.
fn escape_text(value: &str) -> String {
    value.replace('\\', "\\\\").replace('\'', "''")
}

/// Render one value as a remote-safe SQL literal.
pub fn sql_literal(value: &Value) -> String {
    match value {
        Value::Null => "NULL".to_string(),
        Value::Integer(n) => n.to_string(),
        Value::Decimal(d) => d.to_string(),
        Value::Bool(b) => {
            if *b {
                "1".to_string()
            } else {
                "0".to_string()
            }
        }
        Value::Date(date) => format!("'{}'", date.format(DATE_FORMAT)),
        Value::DateTime(datetime) => format!("'{}'", datetime.format(DATETIME_FORMAT)),
        Value::Text(text) => format!("'{}'", escape_text(text)),
        Value::Structured(json) => {
            let serialized = serde_json::to_string(json).unwrap_or_default();
            format!("'{}'", escape_text(&serialized))
        }
    }
}

/// Whether a string looks like a serialized JSON object or array.
fn looks_like_json(text: &str) -> bool {
    matches!(text.trim_start().as_bytes().first(), Some(b'{') | Some(b'['))
}

fn decode_integer(raw: &serde_json::Value) -> Result<Value> {
    match raw {
        serde_json::Value::Number(n) => n
            .as_i64()
            .map(Value::Integer)
            .ok_or_else(|| Error::decode(format!("non-integer number: {}", n))),
        serde_json::Value::String(s) => s
            .trim()
            .parse::<i64>()
            .map(Value::Integer)
            .map_err(|_| Error::decode(format!("invalid integer literal '{}'", s))),
        other => Err(Error::decode(format!("expected integer, got {}", other))),
    }
}

fn decode_decimal(raw: &serde_json::Value) -> Result<Value> {
    match raw {
        serde_json::Value::Number(n) => n
            .to_string()
            .parse::<Decimal>()
            .map(Value::Decimal)
            .map_err(|e| Error::decode(format!("invalid decimal {}: {}", n, e))),
        serde_json::Value::String(s) => s
            .trim()
            .parse::<Decimal>()
            .map(Value::Decimal)
            .map_err(|_| Error::decode(format!("invalid decimal literal '{}'", s))),
        other => Err(Error::decode(format!("expected decimal, got {}", other))),
    }
}

fn decode_boolean(raw: &serde_json::Value) -> Result<Value> {
    match raw {
        serde_json::Value::Bool(b) => Ok(Value::Bool(*b)),
        serde_json::Value::Number(n) => Ok(Value::Bool(n.as_i64().unwrap_or(0) != 0)),
        serde_json::Value::String(s) => match s.trim() {
            "0" | "false" => Ok(Value::Bool(false)),
            "1" | "true" => Ok(Value::Bool(true)),
            other => Err(Error::decode(format!("invalid boolean literal '{}'", other))),
        },
        other => Err(Error::decode(format!("expected boolean, got {}", other))),
    }
}

fn decode_date(raw: &serde_json::Value) -> Result<Value> {
    let text = raw
        .as_str()
        .ok_or_else(|| Error::decode(format!("expected date string, got {}", raw)))?;
    NaiveDate::parse_from_str(text.trim(), DATE_FORMAT)
        .map(Value::Date)
        .map_err(|_| Error::decode(format!("invalid date literal '{}'", text)))
}

fn decode_datetime(raw: &serde_json::Value) -> Result<Value> {
    let text = raw
        .as_str()
        .ok_or_else(|| Error::decode(format!("expected datetime string, got {}", raw)))?;
    let trimmed = text.trim();
    NaiveDateTime::parse_from_str(trimmed, DATETIME_FORMAT)
        .or_else(|_| NaiveDateTime::parse_from_str(trimmed, DATETIME_FORMAT_ISO))
        .map(Value::DateTime)
        .map_err(|_| Error::decode(format!("invalid datetime literal '{}'", text)))
}

/// Decode a structured cell. Legacy rows may hold plain text in a
/// structured column; malformed JSON falls back to the raw string rather
/// than failing the decode pass.
fn decode_structured(raw: &serde_json::Value) -> Value {
    match raw {
        serde_json::Value::Array(_) | serde_json::Value::Object(_) => Value::Structured(raw.clone()),
        serde_json::Value::String(s) => {
            if !s.is_empty() && looks_like_json(s) {
                match serde_json::from_str::<serde_json::Value>(s) {
                    Ok(parsed) => Value::Structured(parsed),
                    Err(_) => Value::Text(s.clone()),
                }
            } else {
                Value::Text(s.clone())
            }
        }
        other => Value::Text(other.to_string()),
    }
}

/// Convert one bridge-returned cell back into a local value.
pub fn decode_value(raw: &serde_json::Value, semantic: SemanticType) -> Result<Value> {
    if raw.is_null() {
        return Ok(Value::Null);
    }

    match semantic {
        SemanticType::Integer => decode_integer(raw),
        SemanticType::Decimal => decode_decimal(raw),
        SemanticType::Boolean => decode_boolean(raw),
        SemanticType::Date => decode_date(raw),
        SemanticType::DateTime => decode_datetime(raw),
        SemanticType::Text => Ok(match raw {
            serde_json::Value::String(s) => Value::Text(s.clone()),
            other => Value::Text(other.to_string()),
        }),
        SemanticType::Structured => Ok(decode_structured(raw)),
    }
}

/// Decode one remote row against a table descriptor. Columns absent from
/// the remote row decode to null; extra remote columns are ignored.
pub fn decode_row(
    descriptor: &TableDescriptor,
    row: &serde_json::Map<String, serde_json::Value>,
) -> Result<Record> {
    let mut record = Record::with_capacity(descriptor.columns.len());
    for column in descriptor.columns {
        let raw = row.get(column.name).unwrap_or(&serde_json::Value::Null);
        let value = decode_value(raw, column.semantic).map_err(|err| {
            Error::decode(format!(
                "{}.{}: {}",
                descriptor.name, column.name, err
            ))
        })?;
        record.insert(column.name.to_string(), value);
    }
    Ok(record)
}
