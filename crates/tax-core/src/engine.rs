use std::collections::HashMap;

use rust_decimal::Decimal;
use uuid::Uuid;

use crate::error::EngineError;
use crate::evaluator::{self, ConditionTrace};
use crate::explanation::{self, ExplanationBuilder};
use crate::model::{
    EvaluationResult, ObligationResultKind, ObligationType, Rule, RuleSet, RuleSetStatus, TaxProfile,
};
use crate::resolver::ThresholdResolver;

/// Runs a published rule set against one profile and produces a result per
/// obligation. Stateless and I/O-free: every input it needs (thresholds,
/// obligation catalog, periodicities) is passed in by the caller, which is
/// expected to have already loaded them from a repository.
pub struct RulesEngine {
    fiscal_year: i32,
}

impl RulesEngine {
    pub fn new(fiscal_year: i32) -> Self {
        RulesEngine { fiscal_year }
    }

    /// Evaluates `profile` against `rule_set`. `thresholds` must include the
    /// fiscal year's UVT figure under [`ThresholdResolver::UVT_KEY`] if any
    /// rule uses `uvt_expr`. `obligations` is the full catalog this rule set
    /// may reference; obligations with no active rule in the set simply
    /// never produce a result. `periodicities` maps an obligation type id to
    /// its filing frequency label for this fiscal year, when known.
    pub fn evaluate(
        &self,
        profile: &TaxProfile,
        rule_set: &RuleSet,
        obligations: &[ObligationType],
        thresholds: &HashMap<String, Decimal>,
        periodicities: &HashMap<Uuid, String>,
    ) -> Result<Vec<EvaluationResult>, EngineError> {
        if rule_set.status != RuleSetStatus::Active {
            return Err(EngineError::NoActiveRuleSet { fiscal_year: self.fiscal_year });
        }

        let resolver = ThresholdResolver::new(thresholds);
        let explainer = ExplanationBuilder::new(self.fiscal_year);

        let rules_by_obligation = group_active_rules_by_obligation(rule_set);

        let mut obligations_sorted: Vec<&ObligationType> = obligations.iter().filter(|o| o.is_active).collect();
        obligations_sorted.sort_by_key(|o| o.display_order);

        let mut results = Vec::with_capacity(obligations_sorted.len());
        for obligation in obligations_sorted {
            let rules = rules_by_obligation
                .get(&obligation.id)
                .map(Vec::as_slice)
                .unwrap_or(&[]);
            let result = self.evaluate_obligation(obligation, rules, profile, &resolver, &explainer, periodicities);
            results.push(result);
        }

        Ok(results)
    }

    fn evaluate_obligation(
        &self,
        obligation: &ObligationType,
        rules: &[&Rule],
        profile: &TaxProfile,
        resolver: &ThresholdResolver,
        explainer: &ExplanationBuilder,
        periodicities: &HashMap<Uuid, String>,
    ) -> EvaluationResult {
        let mut all_conditions: Vec<ConditionTrace> = Vec::new();
        let mut triggered_conditions: Vec<ConditionTrace> = Vec::new();
        let mut result_kind = ObligationResultKind::DoesNotApply;
        let mut triggered_rule_id = None;

        for rule in rules {
            let evaluation = evaluator::evaluate_rule(rule, profile, resolver);

            if let Some(err) = evaluation.config_error {
                all_conditions.extend(evaluation.condition_results);
                tracing::warn!(
                    obligation = %obligation.code,
                    rule = %rule.code,
                    error = %err,
                    "rule references an unresolved threshold; obligation needs more info"
                );
                result_kind = ObligationResultKind::NeedsMoreInfo;
                triggered_rule_id = None;
                break;
            }

            if evaluation.passes {
                result_kind = rule.result_if_true;
                triggered_rule_id = Some(rule.id);
                triggered_conditions = evaluation.condition_results.clone();
                all_conditions.extend(evaluation.condition_results);
                break;
            }

            all_conditions.extend(evaluation.condition_results);
        }

        // The narrative reason is built only from the conditions of the rule
        // that actually fired, not every condition tried across the
        // obligation's rules; that would leak a non-triggering AND rule's
        // passing conditions into the explanation.
        let reason = explanation::build_reason_from_conditions(&triggered_conditions);
        let explanation_text = explainer.build(obligation, result_kind, &reason);
        let legal_references = explainer.legal_references(obligation);

        EvaluationResult {
            obligation_type_id: obligation.id,
            obligation_code: obligation.code.clone(),
            obligation_name: obligation.name.clone(),
            obligation_category: obligation.category.clone(),
            responsible_entity: obligation.responsible_entity.clone(),
            result: result_kind,
            periodicity: periodicities.get(&obligation.id).cloned(),
            triggered_rule_id,
            reason,
            explanation: explanation_text,
            legal_references,
            conditions_evaluated: all_conditions,
        }
    }
}

fn group_active_rules_by_obligation(rule_set: &RuleSet) -> HashMap<Uuid, Vec<&Rule>> {
    let mut map: HashMap<Uuid, Vec<&Rule>> = HashMap::new();
    for rule in rule_set.rules.iter().filter(|r| r.is_active) {
        map.entry(rule.obligation_type_id).or_default().push(rule);
    }
    for rules in map.values_mut() {
        rules.sort_by_key(|r| r.priority);
    }
    map
}
