//! `${key}` / `${key:default}` placeholder substitution
//!
//! Applied to string values anywhere inside a JSON property tree. Values
//! come from the configuration collaborator; a placeholder with no value and
//! no default is a `MissingConfiguration` fault.

use crate::error::GeneratorFault;
use serde_json::Value;
use shared_types::ConfigurationProvider;
use std::collections::BTreeMap;

/// Substitute placeholders in every string of `value`.
pub fn resolve_value(
    value: &Value,
    config: &dyn ConfigurationProvider,
) -> Result<Value, GeneratorFault> {
    Ok(match value {
        Value::String(text) => Value::String(resolve_text(text, config)?),
        Value::Array(items) => Value::Array(
            items
                .iter()
                .map(|item| resolve_value(item, config))
                .collect::<Result<_, _>>()?,
        ),
        Value::Object(map) => Value::Object(
            map.iter()
                .map(|(k, v)| Ok((k.clone(), resolve_value(v, config)?)))
                .collect::<Result<_, GeneratorFault>>()?,
        ),
        other => other.clone(),
    })
}

/// Substitute placeholders in every value of a property map.
pub fn resolve_map(
    map: &BTreeMap<String, Value>,
    config: &dyn ConfigurationProvider,
) -> Result<BTreeMap<String, Value>, GeneratorFault> {
    map.iter()
        .map(|(k, v)| Ok((k.clone(), resolve_value(v, config)?)))
        .collect()
}

/// Substitute placeholders in one string. An unterminated `${` is kept
/// verbatim.
pub fn resolve_text(
    text: &str,
    config: &dyn ConfigurationProvider,
) -> Result<String, GeneratorFault> {
    let mut out = String::with_capacity(text.len());
    let mut rest = text;

    while let Some(start) = rest.find("${") {
        out.push_str(&rest[..start]);
        let after = &rest[start + 2..];
        let Some(end) = after.find('}') else {
            out.push_str(&rest[start..]);
            return Ok(out);
        };

        let placeholder = &after[..end];
        let (key, default) = match placeholder.split_once(':') {
            Some((key, default)) => (key, Some(default)),
            None => (placeholder, None),
        };
        match config.value(key) {
            Some(value) => out.push_str(&value),
            None => match default {
                Some(default) => out.push_str(default),
                None => {
                    return Err(GeneratorFault::MissingConfiguration {
                        key: key.to_string(),
                    })
                }
            },
        }
        rest = &after[end + 1..];
    }

    out.push_str(rest);
    Ok(out)
}
