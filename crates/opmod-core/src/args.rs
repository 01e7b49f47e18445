//! Module argument intake
//!
//! The framework hands a module a file holding its arguments. Three shapes
//! are accepted:
//!
//! - a JSON object of parameters,
//! - the same object wrapped as `{"ANSIBLE_MODULE_ARGS": {...}}`,
//! - legacy `key=value` text with shell-like quoting.
//!
//! Keys prefixed with `_ansible_` carry framework flags (check mode, diff,
//! no_log, verbosity) and are split off from the user parameters.

use regex::Regex;
use serde::de::DeserializeOwned;
use serde_json::{json, Map, Value};
use std::iter::Peekable;
use std::str::Chars;
use std::sync::OnceLock;
use tracing::debug;

use crate::de::{value_as_bool, value_as_i64};
use crate::error::{Error, Result};

/// Key under which newer framework versions wrap the parameters
pub const ARGS_WRAPPER_KEY: &str = "ANSIBLE_MODULE_ARGS";

/// Replacement for values of no_log parameters in echoed invocations
pub const NO_LOG_PLACEHOLDER: &str = "VALUE_SPECIFIED_IN_NO_LOG_PARAMETER";

const INTERNAL_PREFIX: &str = "_ansible_";

/// Parameters of one invocation plus the framework flags that came with them
#[derive(Debug, Clone, Default)]
pub struct ModuleArgs {
    params: Map<String, Value>,
    /// Report what would change without changing anything
    pub check_mode: bool,
    /// Caller asked for before/after details
    pub diff: bool,
    /// Suppress the echoed invocation entirely
    pub no_log: bool,
    pub verbosity: u8,
}

impl ModuleArgs {
    /// Parse the raw content of an arguments file.
    pub fn from_text(text: &str) -> Result<Self> {
        let trimmed = text.trim();
        if trimmed.is_empty() {
            return Ok(Self::default());
        }

        if trimmed.starts_with('{') {
            let value: Value = serde_json::from_str(trimmed)?;
            return Self::from_value(value);
        }

        let params = split_key_value(trimmed)?
            .into_iter()
            .map(|(k, v)| (k, Value::String(v)))
            .collect();
        Self::from_params(params)
    }

    /// Build from an already decoded JSON document (plain or wrapped).
    pub fn from_value(value: Value) -> Result<Self> {
        match value {
            Value::Object(mut map) => match map.remove(ARGS_WRAPPER_KEY) {
                Some(Value::Object(inner)) => Self::from_params(inner),
                Some(other) => Err(Error::invalid_argument(format!(
                    "{} must be a JSON object, got {}",
                    ARGS_WRAPPER_KEY, other
                ))),
                None => Self::from_params(map),
            },
            other => Err(Error::invalid_argument(format!(
                "module arguments must be a JSON object, got {}",
                other
            ))),
        }
    }

    /// Split framework-internal keys from user parameters.
    ///
    /// `null` values are treated as "not specified" so that defaults apply.
    pub fn from_params(raw: Map<String, Value>) -> Result<Self> {
        let mut args = Self::default();

        for (key, value) in raw {
            if value.is_null() {
                continue;
            }

            let Some(flag) = key.strip_prefix(INTERNAL_PREFIX) else {
                args.params.insert(key, value);
                continue;
            };

            match flag {
                "check_mode" => args.check_mode = value_as_bool(&value).unwrap_or(false),
                "diff" => args.diff = value_as_bool(&value).unwrap_or(false),
                "no_log" => args.no_log = value_as_bool(&value).unwrap_or(false),
                "verbosity" => {
                    args.verbosity = value_as_i64(&value)
                        .map(|v| v.clamp(0, u8::MAX as i64) as u8)
                        .unwrap_or(0)
                }
                _ => debug!("Ignoring internal argument {}", key),
            }
        }

        Ok(args)
    }

    pub fn params(&self) -> &Map<String, Value> {
        &self.params
    }

    /// Add or replace a parameter.
    pub fn with_param(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.params.insert(key.into(), value.into());
        self
    }

    pub fn with_check_mode(mut self, check_mode: bool) -> Self {
        self.check_mode = check_mode;
        self
    }

    /// Deserialize the user parameters into a module's typed parameter struct.
    pub fn parse<T: DeserializeOwned>(&self, module: &str) -> Result<T> {
        serde_json::from_value(Value::Object(self.params.clone()))
            .map_err(|e| Error::InvalidArgument(describe_param_error(module, &e)))
    }

    /// The `invocation` block echoed back in the report.
    pub fn invocation(&self, no_log_params: &[&str]) -> Value {
        let masked: Map<String, Value> = self
            .params
            .iter()
            .map(|(key, value)| {
                if no_log_params.contains(&key.as_str()) {
                    (key.clone(), Value::String(NO_LOG_PLACEHOLDER.to_string()))
                } else {
                    (key.clone(), value.clone())
                }
            })
            .collect();

        json!({ "module_args": masked })
    }
}

fn describe_param_error(module: &str, err: &serde_json::Error) -> String {
    static UNKNOWN: OnceLock<Option<Regex>> = OnceLock::new();
    static MISSING: OnceLock<Option<Regex>> = OnceLock::new();

    // serde's wording for deny_unknown_fields and absent required fields
    let message = err.to_string();
    if let Some(field) = quoted_field(&UNKNOWN, r"unknown field `([^`]+)`", &message) {
        format!("Unsupported parameters for ({}) module: {}", module, field)
    } else if let Some(field) = quoted_field(&MISSING, r"missing field `([^`]+)`", &message) {
        format!("missing required arguments: {}", field)
    } else {
        format!("invalid arguments for ({}) module: {}", module, message)
    }
}

fn quoted_field(cell: &OnceLock<Option<Regex>>, pattern: &str, message: &str) -> Option<String> {
    cell.get_or_init(|| Regex::new(pattern).ok())
        .as_ref()?
        .captures(message)
        .map(|caps| caps[1].to_string())
}

/// Split legacy `key=value key2='quoted value'` arguments.
fn split_key_value(text: &str) -> Result<Vec<(String, String)>> {
    let mut pairs = Vec::new();
    let mut chars = text.chars().peekable();

    loop {
        while chars.peek().is_some_and(|c| c.is_whitespace()) {
            chars.next();
        }
        if chars.peek().is_none() {
            break;
        }

        let token = read_token(&mut chars)?;
        let (key, value) = token.split_once('=').ok_or_else(|| {
            Error::invalid_argument(format!(
                "malformed module argument '{}': expected key=value",
                token
            ))
        })?;
        if key.is_empty() {
            return Err(Error::invalid_argument(format!(
                "malformed module argument '{}': empty key",
                token
            )));
        }
        pairs.push((key.to_string(), value.to_string()));
    }

    Ok(pairs)
}

fn read_token(chars: &mut Peekable<Chars<'_>>) -> Result<String> {
    let mut token = String::new();
    let mut quote: Option<char> = None;

    while let Some(c) = chars.next() {
        match (quote, c) {
            (None, c) if c.is_whitespace() => break,
            (None, '\'' | '"') => quote = Some(c),
            (Some(q), c) if c == q => quote = None,
            (Some('\''), c) => token.push(c),
            (_, '\\') => match chars.next() {
                Some(escaped) => token.push(escaped),
                None => token.push('\\'),
            },
            (_, c) => token.push(c),
        }
    }

    if let Some(q) = quote {
        return Err(Error::invalid_argument(format!(
            "unterminated {} quote in module arguments",
            q
        )));
    }

    Ok(token)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Debug, Deserialize)]
    #[serde(deny_unknown_fields)]
    struct Params {
        bind_dn: String,
        #[serde(default)]
        content: Option<String>,
    }

    #[test]
    fn test_plain_json() {
        let args = ModuleArgs::from_text(r#"{"bind_dn": "cn=admin", "_ansible_check_mode": true}"#)
            .unwrap();
        assert!(args.check_mode);
        assert_eq!(args.params().len(), 1);
        let p: Params = args.parse("ldap").unwrap();
        assert_eq!(p.bind_dn, "cn=admin");
    }

    #[test]
    fn test_wrapped_json() {
        let args = ModuleArgs::from_text(
            r#"{"ANSIBLE_MODULE_ARGS": {"bind_dn": "cn=admin", "_ansible_diff": "yes", "_ansible_verbosity": 3, "_ansible_module_name": "ldap"}}"#,
        )
        .unwrap();
        assert!(args.diff);
        assert!(!args.check_mode);
        assert_eq!(args.verbosity, 3);
        assert!(!args.params().contains_key("_ansible_module_name"));
    }

    #[test]
    fn test_key_value_with_quotes() {
        let args = ModuleArgs::from_text(
            "bind_dn='cn=master,dc=encom,dc=com' content=\"dc: encom\nobjectClass: top\" _ansible_check_mode=True",
        )
        .unwrap();
        assert!(args.check_mode);
        let p: Params = args.parse("ldap").unwrap();
        assert_eq!(p.bind_dn, "cn=master,dc=encom,dc=com");
        assert_eq!(p.content.as_deref(), Some("dc: encom\nobjectClass: top"));
    }

    #[test]
    fn test_key_value_escapes() {
        let pairs = split_key_value(r#"a=one\ two b="x \"y\"""#).unwrap();
        assert_eq!(pairs[0], ("a".to_string(), "one two".to_string()));
        assert_eq!(pairs[1], ("b".to_string(), "x \"y\"".to_string()));
    }

    #[test]
    fn test_malformed_key_value() {
        assert!(ModuleArgs::from_text("justaword").is_err());
        assert!(ModuleArgs::from_text("a='unterminated").is_err());
        assert!(ModuleArgs::from_text("=value").is_err());
    }

    #[test]
    fn test_empty_input_means_no_parameters() {
        let args = ModuleArgs::from_text("  \n").unwrap();
        assert!(args.params().is_empty());
    }

    #[test]
    fn test_null_values_are_unspecified() {
        let args = ModuleArgs::from_text(r#"{"bind_dn": "cn=admin", "content": null}"#).unwrap();
        assert!(!args.params().contains_key("content"));
    }

    #[test]
    fn test_non_object_is_rejected() {
        assert!(ModuleArgs::from_text("[1, 2]").is_err());
        assert!(ModuleArgs::from_value(json!({"ANSIBLE_MODULE_ARGS": "x"})).is_err());
    }

    #[test]
    fn test_unknown_parameter_message() {
        let args = ModuleArgs::default()
            .with_param("bind_dn", "cn=admin")
            .with_param("bogus", 1);
        let err = args.parse::<Params>("ldap").unwrap_err();
        assert_eq!(err.to_string(), "Unsupported parameters for (ldap) module: bogus");
    }

    #[test]
    fn test_type_error_message_names_module() {
        let err = ModuleArgs::default()
            .with_param("bind_dn", json!({"cn": "admin"}))
            .parse::<Params>("ldap")
            .unwrap_err();
        assert!(
            err.to_string().starts_with("invalid arguments for (ldap) module: "),
            "{}",
            err
        );
    }

    #[test]
    fn test_missing_parameter_message() {
        let err = ModuleArgs::default().parse::<Params>("ldap").unwrap_err();
        assert_eq!(err.to_string(), "missing required arguments: bind_dn");
    }

    #[test]
    fn test_invocation_masks_no_log_params() {
        let args = ModuleArgs::default()
            .with_param("bind_dn", "cn=admin")
            .with_param("bind_password", "secret");
        let invocation = args.invocation(&["bind_password"]);
        assert_eq!(invocation["module_args"]["bind_dn"], "cn=admin");
        assert_eq!(invocation["module_args"]["bind_password"], NO_LOG_PLACEHOLDER);
    }
}
