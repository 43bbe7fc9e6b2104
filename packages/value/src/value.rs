//! The Value type - a scalar as the interpreter sees it.

use crate::format::NumberFormat;

/// A scalar interpreter value.
///
/// Scripts hand these to blocking builtins as handle names. Tables are kept
/// separately in [`crate::Table`] since only their keys ever become handles.
#[derive(Clone, Debug, Default, PartialEq)]
pub enum Value {
    /// A variable that was never assigned. Renders as the empty string.
    #[default]
    Uninit,
    /// A string value.
    Str(String),
    /// An integral number.
    Integer(i64),
    /// A floating point number.
    Number(f64),
}

impl Value {
    /// Check if this value was never assigned.
    pub fn is_uninit(&self) -> bool {
        matches!(self, Value::Uninit)
    }

    /// Convert to the string form used everywhere values are coerced.
    ///
    /// Integral numbers print as integers regardless of `format`; every
    /// other number goes through it.
    pub fn to_awk_string(&self, format: &NumberFormat) -> String {
        match self {
            Value::Uninit => String::new(),
            Value::Str(s) => s.clone(),
            Value::Integer(i) => i.to_string(),
            Value::Number(n) => number_to_string(*n, format),
        }
    }
}

fn number_to_string(n: f64, format: &NumberFormat) -> String {
    // i64::MAX as f64 rounds up to 2^63, hence the strict upper bound.
    if n.is_finite() && n.fract() == 0.0 && n >= i64::MIN as f64 && n < i64::MAX as f64 {
        (n as i64).to_string()
    } else {
        format.format(n)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::Str(v.to_string())
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::Str(v)
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::Integer(v)
    }
}

impl From<i32> for Value {
    fn from(v: i32) -> Self {
        Value::Integer(v as i64)
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Number(v)
    }
}
