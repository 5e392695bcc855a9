use rust_decimal::Decimal;
use std::str::FromStr;

/// A single profile field value or resolved condition operand.
///
/// The original evaluator treated profile fields and thresholds as untyped
/// objects and coerced them at comparison time. Here the coercion happens
/// once, at the seam where a value enters the engine (profile field lookup,
/// threshold resolution), so every downstream operator works against a
/// closed, typed representation instead of re-parsing strings.
#[derive(Debug, Clone, PartialEq)]
pub enum ScalarValue {
    Null,
    Bool(bool),
    Decimal(Decimal),
    Text(String),
}

impl ScalarValue {
    pub fn as_decimal(&self) -> Option<Decimal> {
        match self {
            ScalarValue::Decimal(d) => Some(*d),
            ScalarValue::Text(s) => Decimal::from_str(s.trim()).ok(),
            ScalarValue::Bool(b) => Some(if *b { Decimal::ONE } else { Decimal::ZERO }),
            ScalarValue::Null => None,
        }
    }

    pub fn as_bool_lossy(&self) -> bool {
        match self {
            ScalarValue::Bool(b) => *b,
            ScalarValue::Text(s) => matches!(s.trim().to_lowercase().as_str(), "true" | "1" | "yes"),
            ScalarValue::Decimal(d) => !d.is_zero(),
            ScalarValue::Null => false,
        }
    }

    /// Explicit membership test for `is_false`, not the negation of
    /// [`Self::as_bool_lossy`]: a null/absent field or an unrecognized string
    /// (e.g. `"maybe"`) must yield `false`, not `true`.
    pub fn is_false_lossy(&self) -> bool {
        match self {
            ScalarValue::Bool(b) => !*b,
            ScalarValue::Text(s) => matches!(s.trim().to_lowercase().as_str(), "false" | "0" | "no"),
            ScalarValue::Decimal(d) => d.is_zero(),
            ScalarValue::Null => false,
        }
    }

    /// Loose textual form, used for string equality and membership checks.
    pub fn as_text_lossy(&self) -> String {
        match self {
            ScalarValue::Text(s) => s.trim().to_lowercase(),
            ScalarValue::Decimal(d) => d.normalize().to_string(),
            ScalarValue::Bool(b) => b.to_string(),
            ScalarValue::Null => String::new(),
        }
    }

    /// Splits a textual operand into a membership list, matching the
    /// original's accepted inputs for `in` / `not_in`: a JSON array literal
    /// or a comma-separated string.
    pub fn as_list_lossy(&self) -> Vec<String> {
        match self {
            ScalarValue::Text(s) => {
                let trimmed = s.trim();
                if trimmed.starts_with('[') {
                    if let Ok(parsed) = serde_json::from_str::<Vec<String>>(trimmed) {
                        return parsed.into_iter().map(|v| v.trim().to_lowercase()).collect();
                    }
                }
                trimmed
                    .split(',')
                    .map(|v| v.trim().to_lowercase())
                    .filter(|v| !v.is_empty())
                    .collect()
            }
            ScalarValue::Null => Vec::new(),
            other => vec![other.as_text_lossy()],
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, ScalarValue::Null)
    }

    /// Projects the value onto the wire representation used in the JSON
    /// evaluation payload (decimals become floats at this boundary only).
    pub fn to_json(&self) -> serde_json::Value {
        match self {
            ScalarValue::Null => serde_json::Value::Null,
            ScalarValue::Bool(b) => serde_json::Value::Bool(*b),
            ScalarValue::Text(s) => serde_json::Value::String(s.clone()),
            ScalarValue::Decimal(d) => serde_json::json!(d.to_string().parse::<f64>().unwrap_or_default()),
        }
    }
}

impl From<&serde_json::Value> for ScalarValue {
    fn from(value: &serde_json::Value) -> Self {
        match value {
            serde_json::Value::Null => ScalarValue::Null,
            serde_json::Value::Bool(b) => ScalarValue::Bool(*b),
            serde_json::Value::String(s) => ScalarValue::Text(s.clone()),
            serde_json::Value::Number(n) => n
                .to_string()
                .parse::<Decimal>()
                .map(ScalarValue::Decimal)
                .unwrap_or(ScalarValue::Null),
            serde_json::Value::Array(_) | serde_json::Value::Object(_) => {
                ScalarValue::Text(value.to_string())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn decimal_coercion_from_text() {
        let v = ScalarValue::Text("  1400.50 ".into());
        assert_eq!(v.as_decimal(), Some(dec!(1400.50)));
    }

    #[test]
    fn list_from_comma_text() {
        let v = ScalarValue::Text("Bogota, Medellin,cali".into());
        assert_eq!(v.as_list_lossy(), vec!["bogota", "medellin", "cali"]);
    }

    #[test]
    fn list_from_json_array_text() {
        let v = ScalarValue::Text(r#"["Bogota", "Cali"]"#.into());
        assert_eq!(v.as_list_lossy(), vec!["bogota", "cali"]);
    }

    #[test]
    fn bool_lossy_accepts_only_the_spec_truthy_set() {
        assert!(ScalarValue::Text("true".into()).as_bool_lossy());
        assert!(ScalarValue::Text("1".into()).as_bool_lossy());
        assert!(ScalarValue::Text("yes".into()).as_bool_lossy());
        assert!(!ScalarValue::Text("Sí".into()).as_bool_lossy());
        assert!(!ScalarValue::Text("no".into()).as_bool_lossy());
    }

    #[test]
    fn is_false_lossy_only_matches_the_false_set() {
        assert!(ScalarValue::Text("no".into()).is_false_lossy());
        assert!(ScalarValue::Text("FALSE".into()).is_false_lossy());
        assert!(ScalarValue::Decimal(rust_decimal::Decimal::ZERO).is_false_lossy());
        assert!(!ScalarValue::Null.is_false_lossy());
        assert!(!ScalarValue::Text("maybe".into()).is_false_lossy());
    }
}
