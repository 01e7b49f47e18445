//! Lenient deserializers
//!
//! Automation frameworks hand parameters over as strings as often as typed
//! JSON (`timeout="10"`, `remove_unset_attrs=yes`). Module parameter structs
//! use these with `#[serde(deserialize_with = ...)]`.

use serde::de::{self, Deserialize, Deserializer};
use serde_json::Value;
use std::fmt::Display;

/// Parse a bool-like string: yes/no, true/false, on/off, y/n, 1/0.
pub fn parse_bool(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "yes" | "true" | "on" | "y" | "1" => Some(true),
        "no" | "false" | "off" | "n" | "0" => Some(false),
        _ => None,
    }
}

/// Interpret a JSON value as a bool the way the framework does.
pub fn value_as_bool(value: &Value) -> Option<bool> {
    match value {
        Value::Bool(b) => Some(*b),
        Value::String(s) => parse_bool(s),
        Value::Number(n) => match n.as_i64() {
            Some(1) => Some(true),
            Some(0) => Some(false),
            _ => None,
        },
        _ => None,
    }
}

/// Interpret a JSON value as an integer.
pub fn value_as_i64(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n.as_i64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

pub fn bool_like<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    value_as_bool(&value)
        .ok_or_else(|| de::Error::custom(format!("{} is not a valid boolean", value)))
}

pub fn int_like<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: TryFrom<i64>,
    T::Error: Display,
{
    let value = Value::deserialize(deserializer)?;
    let n = value_as_i64(&value)
        .ok_or_else(|| de::Error::custom(format!("{} is not a valid integer", value)))?;
    T::try_from(n).map_err(de::Error::custom)
}

/// Render a scalar as the string the framework would pass: `1.0`, `0`, `true`.
pub fn value_as_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

pub fn string_like<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    value_as_string(&value).ok_or_else(|| de::Error::custom(format!("{} is not a valid string", value)))
}

pub fn opt_string_like<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    match Value::deserialize(deserializer)? {
        Value::Null => Ok(None),
        value => value_as_string(&value)
            .map(Some)
            .ok_or_else(|| de::Error::custom(format!("{} is not a valid string", value))),
    }
}

/// Accepts a JSON array of strings or a comma separated string.
pub fn list_like<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    match Value::deserialize(deserializer)? {
        Value::String(s) => Ok(split_list(&s)),
        Value::Array(items) => items
            .into_iter()
            .map(|item| match item {
                Value::String(s) => Ok(s.trim().to_string()),
                Value::Number(n) => Ok(n.to_string()),
                other => Err(de::Error::custom(format!("{} is not a valid list item", other))),
            })
            .filter(|item| !matches!(item, Ok(s) if s.is_empty()))
            .collect(),
        other => Err(de::Error::custom(format!("{} is not a valid list", other))),
    }
}

/// Split a comma separated list, trimming items and dropping empty ones.
pub fn split_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}
