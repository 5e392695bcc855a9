use std::collections::BTreeMap;

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::evaluator::ConditionTrace;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FiscalYearStatus {
    Draft,
    Active,
    Archived,
}

/// A calendar fiscal year and the UVT figure that grounds its thresholds.
///
/// ## Spec reference
/// §2 Data model — FiscalYear.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FiscalYear {
    pub id: Uuid,
    pub year: i32,
    pub status: FiscalYearStatus,
    pub uvt_value: Decimal,
    pub notes: Option<String>,
}

impl FiscalYear {
    pub fn is_active(&self) -> bool {
        self.status == FiscalYearStatus::Active
    }

    pub fn cop_from_uvt(&self, uvt_amount: Decimal) -> Decimal {
        uvt_amount * self.uvt_value
    }
}

/// A named dollar figure (expressed in COP or UVT) a rule condition can
/// reference by code instead of embedding a literal.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Threshold {
    pub id: Uuid,
    pub fiscal_year_id: Uuid,
    pub code: String,
    pub name: String,
    pub value_cop: Decimal,
    pub value_uvt: Option<Decimal>,
    pub description: Option<String>,
}

/// Catalog entry for a tax obligation (renta, iva, ica, ...). The category
/// and responsible-entity fields are open vocabularies defined by Colombian
/// tax law, not a closed Rust enum — new obligations can appear without a
/// code change here.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ObligationType {
    pub id: Uuid,
    pub code: String,
    pub name: String,
    pub category: String,
    pub description: String,
    pub responsible_entity: String,
    pub legal_base: Option<String>,
    pub is_active: bool,
    pub display_order: i32,
}

/// Filing cadence and NIT-digit due-date schedule for one obligation in one
/// fiscal year. `nit_schedule` maps the last digit of the taxpayer's NIT
/// (as a single-character string key, matching the wire format) to the
/// filing deadline for that digit group.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ObligationPeriodicity {
    pub id: Uuid,
    pub obligation_type_id: Uuid,
    pub fiscal_year_id: Uuid,
    pub frequency: String,
    pub nit_schedule: BTreeMap<String, NaiveDate>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RuleSetStatus {
    Draft,
    Active,
    Deprecated,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LogicOperator {
    #[serde(rename = "AND")]
    And,
    #[serde(rename = "OR")]
    Or,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ObligationResultKind {
    Applies,
    DoesNotApply,
    Conditional,
    NeedsMoreInfo,
}

impl ObligationResultKind {
    pub fn as_wire_str(&self) -> &'static str {
        match self {
            ObligationResultKind::Applies => "applies",
            ObligationResultKind::DoesNotApply => "does_not_apply",
            ObligationResultKind::Conditional => "conditional",
            ObligationResultKind::NeedsMoreInfo => "needs_more_info",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConditionOperator {
    Gt,
    Gte,
    Lt,
    Lte,
    Eq,
    Neq,
    In,
    NotIn,
    Between,
    IsTrue,
    IsFalse,
}

impl ConditionOperator {
    pub const ALL: [ConditionOperator; 11] = [
        ConditionOperator::Gt,
        ConditionOperator::Gte,
        ConditionOperator::Lt,
        ConditionOperator::Lte,
        ConditionOperator::Eq,
        ConditionOperator::Neq,
        ConditionOperator::In,
        ConditionOperator::NotIn,
        ConditionOperator::Between,
        ConditionOperator::IsTrue,
        ConditionOperator::IsFalse,
    ];

    pub fn as_wire_str(&self) -> &'static str {
        match self {
            ConditionOperator::Gt => "gt",
            ConditionOperator::Gte => "gte",
            ConditionOperator::Lt => "lt",
            ConditionOperator::Lte => "lte",
            ConditionOperator::Eq => "eq",
            ConditionOperator::Neq => "neq",
            ConditionOperator::In => "in",
            ConditionOperator::NotIn => "not_in",
            ConditionOperator::Between => "between",
            ConditionOperator::IsTrue => "is_true",
            ConditionOperator::IsFalse => "is_false",
        }
    }
}

impl std::str::FromStr for ConditionOperator {
    type Err = crate::error::UnknownOperator;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ConditionOperator::ALL
            .into_iter()
            .find(|op| op.as_wire_str() == s)
            .ok_or_else(|| crate::error::UnknownOperator { operator: s.to_string() })
    }
}

impl ConditionOperator {
    /// Parses a raw operator name coming from an untyped source (a legacy
    /// import, a hand-edited seed file read before it passes through
    /// `serde`'s own validation). A rule built through normal deserialization
    /// never reaches this: `serde` already rejects an unrecognized
    /// `operator` string as a data error at that point. This entry point
    /// exists for loaders that read the raw string first and decide what to
    /// do with it themselves — and for those, an operator name with no match
    /// in the closed set is a corrupt rule corpus, not a value to recover
    /// from, so it panics instead of returning a `Result`.
    pub fn parse_or_panic(s: &str) -> ConditionOperator {
        s.parse().unwrap_or_else(|e: crate::error::UnknownOperator| {
            panic!("corrupt rule corpus: {e}")
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ValueType {
    Literal,
    ThresholdRef,
    UvtExpr,
}

/// One comparison a rule performs against a profile field.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RuleCondition {
    pub id: Uuid,
    pub rule_id: Uuid,
    pub field: String,
    pub operator: ConditionOperator,
    pub value_type: ValueType,
    pub value: Option<String>,
    pub value_secondary: Option<String>,
    pub description: Option<String>,
}

/// A named combination of conditions that decides one obligation's result
/// when it wins the priority race for that obligation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Rule {
    pub id: Uuid,
    pub rule_set_id: Uuid,
    pub obligation_type_id: Uuid,
    pub code: String,
    pub name: String,
    pub description: Option<String>,
    pub logic_operator: LogicOperator,
    pub priority: i32,
    pub result_if_true: ObligationResultKind,
    pub is_active: bool,
    pub conditions: Vec<RuleCondition>,
}

/// A versioned, immutable-once-published bundle of rules for one fiscal
/// year. At most one rule set per fiscal year may be [`RuleSetStatus::Active`]
/// at a time — see [`crate::lifecycle::decide_publish`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RuleSet {
    pub id: Uuid,
    pub fiscal_year_id: Uuid,
    pub version: i32,
    pub status: RuleSetStatus,
    pub published_at: Option<DateTime<Utc>>,
    pub changelog: Option<String>,
    pub rules: Vec<Rule>,
}

/// The taxpayer-reported facts an evaluation runs against. Fields that are
/// genuinely optional in the original intake form stay `Option`; fields the
/// engine always needs a value for (even if zero) do not.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaxProfile {
    pub id: Uuid,
    pub user_id: Uuid,
    pub tenant_id: Uuid,
    pub fiscal_year_id: Uuid,
    pub persona_type: String,
    pub regime: String,
    pub is_iva_responsable: bool,
    pub ingresos_brutos_cop: Decimal,
    pub patrimonio_bruto_cop: Option<Decimal>,
    pub consignaciones_cop: Option<Decimal>,
    pub compras_consumos_cop: Option<Decimal>,
    pub has_employees: bool,
    pub employee_count: i32,
    pub economic_activity_ciiu: Option<String>,
    pub economic_activities: Vec<String>,
    pub city: Option<String>,
    pub department: Option<String>,
    pub has_rut: bool,
    pub has_comercio_registration: bool,
    pub nit_last_digit: Option<u8>,
    #[serde(default)]
    pub additional_data: serde_json::Map<String, serde_json::Value>,
}

impl TaxProfile {
    /// A frozen copy of the facts an evaluation was run against, embedded in
    /// the persisted [`Evaluation`] for audit purposes.
    pub fn to_snapshot(&self) -> serde_json::Value {
        serde_json::to_value(self).unwrap_or(serde_json::Value::Null)
    }
}

/// The outcome computed for a single obligation.
#[derive(Debug, Clone, Serialize)]
pub struct EvaluationResult {
    pub obligation_type_id: Uuid,
    pub obligation_code: String,
    pub obligation_name: String,
    pub obligation_category: String,
    pub responsible_entity: String,
    pub result: ObligationResultKind,
    pub periodicity: Option<String>,
    pub triggered_rule_id: Option<Uuid>,
    pub reason: String,
    pub explanation: String,
    pub legal_references: Vec<String>,
    pub conditions_evaluated: Vec<ConditionTrace>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EvaluationStatus {
    Completed,
}

/// A full run of the engine against one profile, frozen as a standalone
/// audit record. `rule_set_id`/`results` are owned values, not live
/// references, so a later rule-set deprecation never changes the meaning of
/// an evaluation that already happened.
#[derive(Debug, Clone, Serialize)]
pub struct Evaluation {
    pub id: Uuid,
    pub user_id: Uuid,
    pub tenant_id: Uuid,
    pub tax_profile_id: Uuid,
    pub rule_set_id: Uuid,
    pub fiscal_year_id: Uuid,
    pub status: EvaluationStatus,
    pub evaluated_at: DateTime<Utc>,
    pub profile_snapshot: serde_json::Value,
    pub results: Vec<EvaluationResult>,
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct EvaluationSummary {
    pub total_obligations_evaluated: usize,
    pub applies: usize,
    pub does_not_apply: usize,
    pub conditional: usize,
    pub needs_more_info: usize,
}

impl Evaluation {
    pub fn summary(&self) -> EvaluationSummary {
        let mut summary = EvaluationSummary {
            total_obligations_evaluated: self.results.len(),
            ..Default::default()
        };
        for result in &self.results {
            match result.result {
                ObligationResultKind::Applies => summary.applies += 1,
                ObligationResultKind::DoesNotApply => summary.does_not_apply += 1,
                ObligationResultKind::Conditional => summary.conditional += 1,
                ObligationResultKind::NeedsMoreInfo => summary.needs_more_info += 1,
            }
        }
        summary
    }
}
