use std::collections::HashMap;
use std::str::FromStr;

use rust_decimal::Decimal;

use crate::error::EngineError;
use crate::model::{RuleCondition, ValueType};
use crate::value::ScalarValue;

/// Resolves a condition's `value` / `value_secondary` into concrete operands,
/// dispatching on [`ValueType`]. Threshold figures come from a flat
/// `code -> COP value` map built once per evaluation; the UVT figure for the
/// fiscal year is looked up under the reserved key `"uvt_value"`.
pub struct ThresholdResolver<'a> {
    thresholds: &'a HashMap<String, Decimal>,
}

impl<'a> ThresholdResolver<'a> {
    pub const UVT_KEY: &'static str = "uvt_value";

    pub fn new(thresholds: &'a HashMap<String, Decimal>) -> Self {
        ThresholdResolver { thresholds }
    }

    pub fn resolve(
        &self,
        condition: &RuleCondition,
    ) -> Result<(ScalarValue, Option<ScalarValue>), EngineError> {
        match condition.value_type {
            ValueType::Literal => Ok((
                as_literal(condition.value.as_deref()),
                condition.value_secondary.as_deref().map(str_to_literal),
            )),
            ValueType::ThresholdRef => {
                let primary = self.resolve_threshold_ref(condition.value.as_deref())?;
                let secondary = match condition.value_secondary.as_deref() {
                    Some(code) => Some(self.resolve_threshold_ref(Some(code))?),
                    None => None,
                };
                Ok((primary, secondary))
            }
            ValueType::UvtExpr => {
                let primary = self.resolve_uvt_expr(condition.value.as_deref())?;
                let secondary = match condition.value_secondary.as_deref() {
                    Some(expr) => Some(self.resolve_uvt_expr(Some(expr))?),
                    None => None,
                };
                Ok((primary, secondary))
            }
        }
    }

    fn resolve_threshold_ref(&self, code: Option<&str>) -> Result<ScalarValue, EngineError> {
        let code = match code {
            Some(c) => c,
            None => return Ok(ScalarValue::Null),
        };
        self.thresholds
            .get(code)
            .map(|v| ScalarValue::Decimal(*v))
            .ok_or_else(|| EngineError::ThresholdMissing { code: code.to_string() })
    }

    /// `uvt_expr` is a bare numeric multiplier of the fiscal year's UVT value
    /// (e.g. `"1400"` means 1400 UVT). Anything that doesn't parse as a
    /// decimal is rejected rather than silently coerced to zero.
    fn resolve_uvt_expr(&self, expr: Option<&str>) -> Result<ScalarValue, EngineError> {
        let expr = match expr {
            Some(e) => e,
            None => return Ok(ScalarValue::Null),
        };
        let multiplier = Decimal::from_str(expr.trim())
            .map_err(|_| EngineError::InvalidUvtExpr { expr: expr.to_string() })?;
        let uvt_value = self
            .thresholds
            .get(Self::UVT_KEY)
            .ok_or(EngineError::UvtMissing)?;
        Ok(ScalarValue::Decimal(multiplier * uvt_value))
    }
}

fn as_literal(value: Option<&str>) -> ScalarValue {
    value.map(str_to_literal).unwrap_or(ScalarValue::Null)
}

fn str_to_literal(value: &str) -> ScalarValue {
    ScalarValue::Text(value.to_string())
}
