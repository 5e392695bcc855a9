use serde::Serialize;

use crate::error::EngineError;
use crate::model::{ConditionOperator, LogicOperator, Rule, RuleCondition, TaxProfile};
use crate::operators;
use crate::profile;
use crate::resolver::ThresholdResolver;
use crate::value::ScalarValue;

/// The fully-evaluated record of one condition: what field was read, what it
/// was compared against, and whether it passed. Always produced, even when
/// resolving the operand failed, so the trace fully accounts for every
/// condition a rule declared.
#[derive(Debug, Clone, Serialize)]
pub struct ConditionTrace {
    pub field: String,
    pub operator: ConditionOperator,
    #[serde(skip)]
    pub profile_value: ScalarValue,
    pub threshold_code: Option<String>,
    #[serde(skip)]
    pub threshold_value: ScalarValue,
    pub passes: bool,
    pub description: Option<String>,
}

/// Outcome of evaluating one rule's full condition set.
pub struct RuleEvaluation {
    pub passes: bool,
    pub condition_results: Vec<ConditionTrace>,
    /// Set when any condition's operand failed to resolve (missing threshold,
    /// missing UVT value, malformed `uvt_expr`). The engine escalates the
    /// owning obligation to `needs_more_info` when this is present, rather
    /// than trusting `passes`, because `passes` may be a false negative
    /// produced purely by the unresolved operand.
    pub config_error: Option<EngineError>,
}

fn evaluate_condition(
    condition: &RuleCondition,
    profile: &TaxProfile,
    resolver: &ThresholdResolver,
) -> (ConditionTrace, Option<EngineError>) {
    let profile_value = profile::field_value(profile, &condition.field);
    let threshold_code = match condition.value_type {
        crate::model::ValueType::ThresholdRef => condition.value.clone(),
        _ => None,
    };

    match resolver.resolve(condition) {
        Ok((operand, secondary)) => {
            let passes = operators::apply_operator(
                condition.operator,
                &profile_value,
                &operand,
                secondary.as_ref(),
            );
            let trace = ConditionTrace {
                field: condition.field.clone(),
                operator: condition.operator,
                profile_value,
                threshold_code,
                threshold_value: operand,
                passes,
                description: condition.description.clone(),
            };
            (trace, None)
        }
        Err(err) => {
            let trace = ConditionTrace {
                field: condition.field.clone(),
                operator: condition.operator,
                profile_value,
                threshold_code,
                threshold_value: ScalarValue::Null,
                passes: false,
                description: Some(format!("no se pudo resolver la condición: {err}")),
            };
            (trace, Some(err))
        }
    }
}

/// Evaluates every condition in `rule` against `profile` and combines them
/// per the rule's `logic_operator`. Conditions are never short-circuited:
/// every one of them is evaluated and recorded, even once the combined
/// result is already decided, because the full trace is itself part of the
/// audit output.
pub fn evaluate_rule(
    rule: &Rule,
    profile: &TaxProfile,
    resolver: &ThresholdResolver,
) -> RuleEvaluation {
    let mut condition_results = Vec::with_capacity(rule.conditions.len());
    let mut config_error = None;

    for condition in &rule.conditions {
        let (trace, err) = evaluate_condition(condition, profile, resolver);
        if config_error.is_none() {
            config_error = err;
        }
        condition_results.push(trace);
    }

    let passes = if condition_results.is_empty() {
        false
    } else {
        match rule.logic_operator {
            LogicOperator::And => condition_results.iter().all(|c| c.passes),
            LogicOperator::Or => condition_results.iter().any(|c| c.passes),
        }
    };

    RuleEvaluation { passes, condition_results, config_error }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{ConditionOperator, LogicOperator, ObligationResultKind, Rule, ValueType};
    use rust_decimal_macros::dec;
    use std::collections::HashMap;
    use uuid::Uuid;

    fn condition(field: &str, operator: ConditionOperator, value_type: ValueType, value: &str) -> RuleCondition {
        RuleCondition {
            id: Uuid::new_v4(),
            rule_id: Uuid::new_v4(),
            field: field.into(),
            operator,
            value_type,
            value: Some(value.into()),
            value_secondary: None,
            description: None,
        }
    }

    fn rule(logic_operator: LogicOperator, conditions: Vec<RuleCondition>) -> Rule {
        Rule {
            id: Uuid::new_v4(),
            rule_set_id: Uuid::new_v4(),
            obligation_type_id: Uuid::new_v4(),
            code: "test_rule".into(),
            name: "Test rule".into(),
            description: None,
            logic_operator,
            priority: 1,
            result_if_true: ObligationResultKind::Applies,
            is_active: true,
            conditions,
        }
    }

    fn sample_profile() -> TaxProfile {
        TaxProfile {
            id: Uuid::new_v4(),
            user_id: Uuid::new_v4(),
            tenant_id: Uuid::new_v4(),
            fiscal_year_id: Uuid::new_v4(),
            persona_type: "natural".into(),
            regime: "ordinario".into(),
            is_iva_responsable: false,
            ingresos_brutos_cop: dec!(80000000),
            patrimonio_bruto_cop: None,
            consignaciones_cop: None,
            compras_consumos_cop: None,
            has_employees: false,
            employee_count: 0,
            economic_activity_ciiu: None,
            economic_activities: vec![],
            city: None,
            department: None,
            has_rut: true,
            has_comercio_registration: false,
            nit_last_digit: None,
            additional_data: serde_json::Map::new(),
        }
    }

    #[test]
    fn or_passes_when_any_condition_passes_and_evaluates_all() {
        let thresholds = HashMap::new();
        let resolver = ThresholdResolver::new(&thresholds);
        let r = rule(
            LogicOperator::Or,
            vec![
                condition("ingresos_brutos_cop", ConditionOperator::Gte, ValueType::Literal, "999999999"),
                condition("has_rut", ConditionOperator::IsTrue, ValueType::Literal, ""),
            ],
        );
        let evaluation = evaluate_rule(&r, &sample_profile(), &resolver);
        assert!(evaluation.passes);
        assert_eq!(evaluation.condition_results.len(), 2);
        assert!(!evaluation.condition_results[0].passes);
        assert!(evaluation.condition_results[1].passes);
    }

    #[test]
    fn and_fails_when_any_condition_fails() {
        let thresholds = HashMap::new();
        let resolver = ThresholdResolver::new(&thresholds);
        let r = rule(
            LogicOperator::And,
            vec![
                condition("has_rut", ConditionOperator::IsTrue, ValueType::Literal, ""),
                condition("has_employees", ConditionOperator::IsTrue, ValueType::Literal, ""),
            ],
        );
        let evaluation = evaluate_rule(&r, &sample_profile(), &resolver);
        assert!(!evaluation.passes);
        assert_eq!(evaluation.condition_results.len(), 2);
    }

    #[test]
    fn missing_threshold_surfaces_as_config_error_but_still_records_trace() {
        let thresholds = HashMap::new();
        let resolver = ThresholdResolver::new(&thresholds);
        let r = rule(
            LogicOperator::And,
            vec![condition(
                "ingresos_brutos_cop",
                ConditionOperator::Gte,
                ValueType::ThresholdRef,
                "nonexistent_code",
            )],
        );
        let evaluation = evaluate_rule(&r, &sample_profile(), &resolver);
        assert!(evaluation.config_error.is_some());
        assert_eq!(evaluation.condition_results.len(), 1);
        assert!(!evaluation.condition_results[0].passes);
    }
}
