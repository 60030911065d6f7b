use serde_json::{Number, Value};

use crate::FieldKind;

/// Converts raw text typed by a user into a JSON value of the given kind.
///
/// Blank text becomes `null` for every kind so the field reads as empty.
/// Lists accept either a JSON array or comma-separated items.
pub fn coerce_text(text: &str, kind: FieldKind) -> Result<Value, String> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return Ok(Value::Null);
    }
    match kind {
        FieldKind::String => Ok(Value::String(text.to_string())),
        FieldKind::Enum => Ok(Value::String(trimmed.to_string())),
        FieldKind::Number => {
            if let Ok(integer) = trimmed.parse::<i64>() {
                return Ok(Value::Number(Number::from(integer)));
            }
            trimmed
                .parse::<f64>()
                .ok()
                .and_then(Number::from_f64)
                .map(Value::Number)
                .ok_or_else(|| format!("'{}' is not a number", trimmed))
        }
        FieldKind::Boolean => match trimmed.to_ascii_lowercase().as_str() {
            "true" | "yes" | "on" | "1" => Ok(Value::Bool(true)),
            "false" | "no" | "off" | "0" => Ok(Value::Bool(false)),
            _ => Err(format!("'{}' is not true or false", trimmed)),
        },
        FieldKind::List => {
            if trimmed.starts_with('[') {
                return match serde_json::from_str::<Value>(trimmed) {
                    Ok(Value::Array(items)) => Ok(Value::Array(items)),
                    Ok(_) | Err(_) => Err(format!("'{}' is not a JSON array", trimmed)),
                };
            }
            let items = trimmed
                .split(',')
                .map(str::trim)
                .filter(|item| !item.is_empty())
                .map(|item| Value::String(item.to_string()))
                .collect();
            Ok(Value::Array(items))
        }
    }
}
