use crate::model::TaxProfile;
use crate::value::ScalarValue;

/// Looks up a condition's `field` against the profile's first-class columns,
/// falling back to `additional_data` for anything the schema doesn't name
/// directly. Matching the original's dynamic `getattr`, but resolved through
/// an explicit match instead of reflection.
pub fn field_value(profile: &TaxProfile, field: &str) -> ScalarValue {
    match field {
        "persona_type" => ScalarValue::Text(profile.persona_type.clone()),
        "regime" => ScalarValue::Text(profile.regime.clone()),
        "is_iva_responsable" => ScalarValue::Bool(profile.is_iva_responsable),
        "ingresos_brutos_cop" => ScalarValue::Decimal(profile.ingresos_brutos_cop),
        "patrimonio_bruto_cop" => profile
            .patrimonio_bruto_cop
            .map(ScalarValue::Decimal)
            .unwrap_or(ScalarValue::Null),
        "consignaciones_cop" => profile
            .consignaciones_cop
            .map(ScalarValue::Decimal)
            .unwrap_or(ScalarValue::Null),
        "compras_consumos_cop" => profile
            .compras_consumos_cop
            .map(ScalarValue::Decimal)
            .unwrap_or(ScalarValue::Null),
        "has_employees" => ScalarValue::Bool(profile.has_employees),
        "employee_count" => ScalarValue::Decimal(profile.employee_count.into()),
        "economic_activity_ciiu" => profile
            .economic_activity_ciiu
            .clone()
            .map(ScalarValue::Text)
            .unwrap_or(ScalarValue::Null),
        "economic_activities" => ScalarValue::Text(profile.economic_activities.join(",")),
        "city" => profile.city.clone().map(ScalarValue::Text).unwrap_or(ScalarValue::Null),
        "department" => profile
            .department
            .clone()
            .map(ScalarValue::Text)
            .unwrap_or(ScalarValue::Null),
        "has_rut" => ScalarValue::Bool(profile.has_rut),
        "has_comercio_registration" => ScalarValue::Bool(profile.has_comercio_registration),
        "nit_last_digit" => profile
            .nit_last_digit
            .map(|d| ScalarValue::Decimal(d.into()))
            .unwrap_or(ScalarValue::Null),
        other => profile
            .additional_data
            .get(other)
            .map(ScalarValue::from)
            .unwrap_or(ScalarValue::Null),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;
    use uuid::Uuid;

    fn sample_profile() -> TaxProfile {
        TaxProfile {
            id: Uuid::new_v4(),
            user_id: Uuid::new_v4(),
            tenant_id: Uuid::new_v4(),
            fiscal_year_id: Uuid::new_v4(),
            persona_type: "natural".into(),
            regime: "simple".into(),
            is_iva_responsable: false,
            ingresos_brutos_cop: dec!(80000000),
            patrimonio_bruto_cop: None,
            consignaciones_cop: None,
            compras_consumos_cop: None,
            has_employees: true,
            employee_count: 3,
            economic_activity_ciiu: Some("6201".into()),
            economic_activities: vec!["6201".into(), "6202".into()],
            city: Some("Bogota".into()),
            department: Some("Cundinamarca".into()),
            has_rut: true,
            has_comercio_registration: false,
            nit_last_digit: Some(7),
            additional_data: serde_json::Map::new(),
        }
    }

    #[test]
    fn reads_first_class_fields() {
        let profile = sample_profile();
        assert_eq!(field_value(&profile, "ingresos_brutos_cop").as_decimal(), Some(dec!(80000000)));
        assert!(field_value(&profile, "has_employees").as_bool_lossy());
    }

    #[test]
    fn missing_optional_field_is_null() {
        let profile = sample_profile();
        assert!(field_value(&profile, "patrimonio_bruto_cop").is_null());
    }

    #[test]
    fn unknown_field_falls_back_to_additional_data() {
        let mut profile = sample_profile();
        profile
            .additional_data
            .insert("tiene_vehiculo".into(), serde_json::Value::Bool(true));
        assert!(field_value(&profile, "tiene_vehiculo").as_bool_lossy());
        assert!(field_value(&profile, "unrecognized_field").is_null());
    }
}
