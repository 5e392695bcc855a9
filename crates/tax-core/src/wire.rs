use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use crate::evaluator::ConditionTrace;
use crate::model::{ConditionOperator, Evaluation, EvaluationResult, EvaluationSummary};

/// The disclaimer shown alongside every evaluation payload. Kept as a
/// constant rather than configuration: the wording is a compliance
/// requirement, not an operational knob.
pub const DISCLAIMER: &str = "Esta evaluación es una guía informativa y no constituye asesoría tributaria. \
Verifique sus obligaciones con un contador público o directamente ante la DIAN.";

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "snake_case")]
pub struct ConditionTraceProjection {
    pub field: String,
    pub operator: ConditionOperator,
    pub profile_value: serde_json::Value,
    pub threshold_code: Option<String>,
    pub threshold_value: serde_json::Value,
    pub passes: bool,
    pub description: Option<String>,
}

impl From<&ConditionTrace> for ConditionTraceProjection {
    fn from(trace: &ConditionTrace) -> Self {
        ConditionTraceProjection {
            field: trace.field.clone(),
            operator: trace.operator,
            profile_value: trace.profile_value.to_json(),
            threshold_code: trace.threshold_code.clone(),
            threshold_value: trace.threshold_value.to_json(),
            passes: trace.passes,
            description: trace.description.clone(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ObligationProjection {
    pub code: String,
    pub name: String,
    pub category: String,
    pub responsible_entity: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "snake_case")]
pub struct EvaluationResultProjection {
    pub obligation: ObligationProjection,
    pub result: String,
    pub periodicity: Option<String>,
    pub reason: String,
    pub explanation: String,
    pub legal_references: Vec<String>,
    pub conditions_evaluated: Vec<ConditionTraceProjection>,
}

impl From<&EvaluationResult> for EvaluationResultProjection {
    fn from(result: &EvaluationResult) -> Self {
        EvaluationResultProjection {
            obligation: ObligationProjection {
                code: result.obligation_code.clone(),
                name: result.obligation_name.clone(),
                category: result.obligation_category.clone(),
                responsible_entity: result.responsible_entity.clone(),
            },
            result: result.result.as_wire_str().to_string(),
            periodicity: result.periodicity.clone(),
            reason: result.reason.clone(),
            explanation: result.explanation.clone(),
            legal_references: result.legal_references.clone(),
            conditions_evaluated: result.conditions_evaluated.iter().map(Into::into).collect(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "snake_case")]
pub struct EvaluationProjection {
    pub id: Uuid,
    pub tax_profile_id: Uuid,
    pub fiscal_year_id: Uuid,
    pub evaluated_at: DateTime<Utc>,
    pub summary: EvaluationSummary,
    pub results: Vec<EvaluationResultProjection>,
    pub disclaimer: &'static str,
}

impl From<&Evaluation> for EvaluationProjection {
    fn from(evaluation: &Evaluation) -> Self {
        EvaluationProjection {
            id: evaluation.id,
            tax_profile_id: evaluation.tax_profile_id,
            fiscal_year_id: evaluation.fiscal_year_id,
            evaluated_at: evaluation.evaluated_at,
            summary: evaluation.summary(),
            results: evaluation.results.iter().map(Into::into).collect(),
            disclaimer: DISCLAIMER,
        }
    }
}

/// The compact projection used when listing a user's past evaluations,
/// without the full per-condition audit trail.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "snake_case")]
pub struct EvaluationListItem {
    pub id: Uuid,
    pub fiscal_year_id: Uuid,
    pub evaluated_at: DateTime<Utc>,
    pub summary: EvaluationSummary,
}

impl From<&Evaluation> for EvaluationListItem {
    fn from(evaluation: &Evaluation) -> Self {
        EvaluationListItem {
            id: evaluation.id,
            fiscal_year_id: evaluation.fiscal_year_id,
            evaluated_at: evaluation.evaluated_at,
            summary: evaluation.summary(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{EvaluationStatus, ObligationResultKind};

    fn sample_evaluation() -> Evaluation {
        Evaluation {
            id: Uuid::new_v4(),
            user_id: Uuid::new_v4(),
            tenant_id: Uuid::new_v4(),
            tax_profile_id: Uuid::new_v4(),
            rule_set_id: Uuid::new_v4(),
            fiscal_year_id: Uuid::new_v4(),
            status: EvaluationStatus::Completed,
            evaluated_at: Utc::now(),
            profile_snapshot: serde_json::Value::Null,
            results: vec![EvaluationResult {
                obligation_type_id: Uuid::new_v4(),
                obligation_code: "renta".into(),
                obligation_name: "Declaración de renta".into(),
                obligation_category: "nacional".into(),
                responsible_entity: "DIAN".into(),
                result: ObligationResultKind::Applies,
                periodicity: Some("anual".into()),
                triggered_rule_id: None,
                reason: "sus ingresos superan el tope".into(),
                explanation: "Usted está obligado...".into(),
                legal_references: vec![],
                conditions_evaluated: vec![],
            }],
        }
    }

    #[test]
    fn projection_serializes_to_expected_shape() {
        let evaluation = sample_evaluation();
        let projection = EvaluationProjection::from(&evaluation);
        let json = serde_json::to_value(&projection).unwrap();
        assert_eq!(json["results"][0]["result"], "applies");
        assert_eq!(json["summary"]["applies"], 1);
        assert!(json["disclaimer"].as_str().unwrap().contains("DIAN"));
    }
}
