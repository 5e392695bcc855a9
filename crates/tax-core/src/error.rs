use thiserror::Error;

/// Errors surfaced while resolving condition operands or running the engine.
///
/// These are config/data errors, not programmer errors: they describe a
/// rule set that references a threshold or UVT figure the caller never
/// loaded, not a bug in the engine itself.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EngineError {
    #[error("threshold not found: {code}")]
    ThresholdMissing { code: String },

    #[error("uvt value not configured for this fiscal year")]
    UvtMissing,

    #[error("uvt_expr is not a bare numeric multiplier: {expr}")]
    InvalidUvtExpr { expr: String },

    #[error("no active rule set for fiscal year {fiscal_year}")]
    NoActiveRuleSet { fiscal_year: i32 },
}

/// Condition operators are a closed set (see [`crate::model::ConditionOperator`]).
/// This error only arises when a rule is loaded from untyped input (a fixture
/// file, an admin import) whose `operator` string was never validated against
/// that enum. Reaching it is a data-ingestion bug, not a runtime condition the
/// engine should recover from — callers that hit it should fix the input, not
/// catch it.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown condition operator: {operator}")]
pub struct UnknownOperator {
    pub operator: String,
}
