//! Total conversions from loosely-typed JSON values into concrete scalars.
//!
//! Every function here returns the zero value of its target type when the
//! input is absent, has an incompatible shape, or cannot be represented
//! exactly. Fractional numbers never truncate into integers.

use serde_json::{Number, Value};

/// Coerce to a 32-bit integer.
pub fn to_int(value: Option<&Value>) -> i32 {
    i32::try_from(to_int64(value)).unwrap_or(0)
}

/// Coerce to a 64-bit integer.
pub fn to_int64(value: Option<&Value>) -> i64 {
    match value {
        Some(Value::Number(n)) => number_to_i64(n),
        Some(Value::String(s)) => s.parse::<i64>().unwrap_or(0),
        _ => 0,
    }
}

pub fn to_float(value: Option<&Value>) -> f64 {
    match value {
        Some(Value::Number(n)) => n.as_f64().unwrap_or(0.0),
        Some(Value::String(s)) => s.parse::<f64>().unwrap_or(0.0),
        _ => 0.0,
    }
}

/// Coerce to a string. Numbers render in their JSON form; other shapes
/// yield an empty string.
pub fn to_string(value: Option<&Value>) -> String {
    match value {
        Some(Value::String(s)) => s.clone(),
        Some(Value::Number(n)) => n.to_string(),
        _ => String::new(),
    }
}

pub fn to_bool(value: Option<&Value>) -> bool {
    match value {
        Some(Value::Bool(b)) => *b,
        Some(Value::Number(n)) => n.as_f64().is_some_and(|f| f != 0.0),
        Some(Value::String(s)) => parse_bool(s),
        _ => false,
    }
}

fn number_to_i64(n: &Number) -> i64 {
    if let Some(i) = n.as_i64() {
        return i;
    }
    if n.is_u64() {
        // larger than i64::MAX
        return 0;
    }
    match n.as_f64() {
        // i64::MAX as f64 rounds up to 2^63, which is out of range
        Some(f) if f.fract() == 0.0 && f >= i64::MIN as f64 && f < i64::MAX as f64 => f as i64,
        _ => 0,
    }
}

fn parse_bool(s: &str) -> bool {
    matches!(s, "1" | "t" | "T" | "true" | "TRUE" | "True")
}
