use std::collections::HashMap;

use crate::evaluator::ConditionTrace;
use crate::model::{ConditionOperator, ObligationResultKind, ObligationType};
use crate::money::Cop;
use crate::value::ScalarValue;

fn default_templates() -> HashMap<&'static str, &'static str> {
    HashMap::from([
        (
            "renta_applies",
            "Para el año gravable {fiscal_year}, usted está obligado a declarar renta porque {reason}. Base legal: {legal_reference}.",
        ),
        (
            "renta_does_not_apply",
            "Para el año gravable {fiscal_year}, usted no está obligado a declarar renta porque {reason}.",
        ),
        (
            "iva_applies",
            "Para el año gravable {fiscal_year}, usted es responsable del IVA porque {reason}. Base legal: {legal_reference}.",
        ),
        (
            "generic_applies",
            "Para el año gravable {fiscal_year}, la obligación {obligation_name} le aplica porque {reason}. {legal_note}",
        ),
        (
            "generic_does_not_apply",
            "La obligación {obligation_name} no le aplica porque {reason}.",
        ),
        (
            "generic_conditional",
            "La obligación {obligation_name} le aplica de forma condicional: {reason}. {legal_note}",
        ),
        (
            "generic_needs_more_info",
            "No fue posible determinar si la obligación {obligation_name} le aplica: {reason}.",
        ),
    ])
}

/// Builds the Spanish-language narrative shown to a taxpayer for one
/// obligation result: looks up an obligation-specific template keyed
/// `"{obligation_code}_{result}"`, falling back to `"generic_{result}"`.
pub struct ExplanationBuilder {
    fiscal_year: i32,
    templates: HashMap<&'static str, &'static str>,
}

impl ExplanationBuilder {
    pub fn new(fiscal_year: i32) -> Self {
        ExplanationBuilder { fiscal_year, templates: default_templates() }
    }

    pub fn build(
        &self,
        obligation: &ObligationType,
        result: ObligationResultKind,
        reason: &str,
    ) -> String {
        let result_key = result.as_wire_str();
        let specific_key = format!("{}_{}", obligation.code, result_key);
        let generic_key = format!("generic_{result_key}");

        let template = self
            .templates
            .get(specific_key.as_str())
            .or_else(|| self.templates.get(generic_key.as_str()))
            .copied()
            .unwrap_or("Para el año gravable {fiscal_year}, la obligación {obligation_name} tiene el resultado {result}: {reason}. {legal_note}");

        let legal_reference = match &obligation.legal_base {
            Some(raw) if !raw.trim().is_empty() => raw.clone(),
            _ => "sin referencia legal registrada".to_string(),
        };
        let legal_note = match &obligation.legal_base {
            Some(raw) if !raw.trim().is_empty() => format!("Base legal: {raw}."),
            _ => String::new(),
        };

        template
            .replace("{fiscal_year}", &self.fiscal_year.to_string())
            .replace("{obligation_name}", &obligation.name)
            .replace("{result}", result_key)
            .replace("{reason}", reason)
            .replace("{legal_reference}", &legal_reference)
            .replace("{legal_note}", &legal_note)
    }

    pub fn legal_references(&self, obligation: &ObligationType) -> Vec<String> {
        match &obligation.legal_base {
            None => Vec::new(),
            Some(raw) => raw
                .split(';')
                .map(|piece| piece.trim())
                .filter(|piece| !piece.is_empty())
                .map(String::from)
                .collect(),
        }
    }
}

/// Builds the short bullet-style reason string shown alongside a result,
/// assembled from the conditions that actually passed on the rule that was
/// evaluated (the triggered rule, or none at all). Falls back to a generic
/// phrase when no condition passed.
pub fn build_reason_from_conditions(conditions: &[ConditionTrace]) -> String {
    let passing: Vec<&ConditionTrace> = conditions.iter().filter(|c| c.passes).collect();
    if passing.is_empty() {
        return "se cumplen las condiciones establecidas".to_string();
    }

    let phrases: Vec<String> = passing.iter().map(|c| condition_phrase(c)).collect();
    phrases.join("; ")
}

fn condition_phrase(condition: &ConditionTrace) -> String {
    let field = condition.field.replace('_', " ");

    match condition.operator {
        ConditionOperator::Gt | ConditionOperator::Gte => format!(
            "su {field} ({}) supera el tope de {}",
            format_cop_lossy(&condition.profile_value),
            format_cop_lossy(&condition.threshold_value),
        ),
        ConditionOperator::Eq => {
            format!("su {field} es {}", condition.profile_value.as_text_lossy())
        }
        ConditionOperator::IsTrue => format!("cumple con {field}"),
        ConditionOperator::IsFalse => format!("no cumple con {field}"),
        ConditionOperator::Lt
        | ConditionOperator::Lte
        | ConditionOperator::Neq
        | ConditionOperator::In
        | ConditionOperator::NotIn
        | ConditionOperator::Between => match &condition.description {
            Some(description) if !description.is_empty() => description.clone(),
            _ => format!("cumple la condición sobre {field}"),
        },
    }
}

fn format_cop_lossy(value: &ScalarValue) -> String {
    match value.as_decimal() {
        Some(amount) => Cop::new(amount).to_string(),
        None => "N/A".to_string(),
    }
}
