//! Tolerant scalar decoders. The export API has shipped numbers as strings
//! and booleans as `0`/`1` depending on the backend that rendered it.

use serde::{Deserialize, Deserializer};
use serde_json::Value;

pub(super) use zywrap_schema::lenient::{opt_string, string};

pub(super) fn opt_i64<'de, D>(deserializer: D) -> Result<Option<i64>, D::Error>
where
    D: Deserializer<'de>,
{
    match Value::deserialize(deserializer)? {
        Value::Null => Ok(None),
        Value::Number(n) => n
            .as_i64()
            .map(Some)
            .ok_or_else(|| serde::de::Error::custom(format!("expected an integer, got {n}"))),
        Value::String(s) => s
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| serde::de::Error::custom(format!("expected an integer, got `{s}`"))),
        other => Err(serde::de::Error::custom(format!(
            "expected an integer, got {other}"
        ))),
    }
}

pub(super) fn flag<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    match Value::deserialize(deserializer)? {
        Value::Null => Ok(false),
        Value::Bool(b) => Ok(b),
        Value::Number(n) => Ok(n.as_f64().is_some_and(|v| v != 0.0)),
        Value::String(s) => match s.trim() {
            "1" | "true" | "TRUE" | "True" => Ok(true),
            "" | "0" | "false" | "FALSE" | "False" => Ok(false),
            _ => Err(serde::de::Error::custom(format!("expected a boolean, got `{s}`"))),
        },
        other => Err(serde::de::Error::custom(format!(
            "expected a boolean, got {other}"
        ))),
    }
}
