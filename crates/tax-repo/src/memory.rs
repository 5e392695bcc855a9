use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use uuid::Uuid;

use tax_core::lifecycle;
use tax_core::model::{
    Evaluation, FiscalYear, ObligationPeriodicity, ObligationType, RuleSet, TaxProfile, Threshold,
};
use tax_core::resolver::ThresholdResolver;

use crate::error::RepoError;
use crate::traits::{EvaluationRepo, FiscalYearRepo, ObligationCatalog, ProfileRepo, RuleRepo, ThresholdRepo};

#[derive(Default)]
struct Inner {
    fiscal_years: HashMap<Uuid, FiscalYear>,
    thresholds: HashMap<Uuid, Vec<Threshold>>,
    obligation_types: HashMap<Uuid, ObligationType>,
    periodicities: HashMap<(Uuid, Uuid), ObligationPeriodicity>,
    rule_sets: HashMap<Uuid, RuleSet>,
    profiles: HashMap<Uuid, TaxProfile>,
    evaluations: HashMap<Uuid, Evaluation>,
}

/// A process-local, mutex-guarded implementation of every repository trait,
/// useful for tests, the CLI, and local experimentation. It holds its own
/// indexes rather than wrapping a real database; `publish` demonstrates the
/// locking discipline a transactional implementation needs around
/// `tax_core::lifecycle::decide_publish`.
#[derive(Default)]
pub struct InMemoryStore {
    inner: Mutex<Inner>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn seed_fiscal_year(&self, fiscal_year: FiscalYear) {
        self.inner.lock().unwrap().fiscal_years.insert(fiscal_year.id, fiscal_year);
    }

    pub fn seed_threshold(&self, threshold: Threshold) {
        self.inner
            .lock()
            .unwrap()
            .thresholds
            .entry(threshold.fiscal_year_id)
            .or_default()
            .push(threshold);
    }

    pub fn seed_obligation_type(&self, obligation: ObligationType) {
        self.inner.lock().unwrap().obligation_types.insert(obligation.id, obligation);
    }

    pub fn seed_periodicity(&self, periodicity: ObligationPeriodicity) {
        let key = (periodicity.obligation_type_id, periodicity.fiscal_year_id);
        self.inner.lock().unwrap().periodicities.insert(key, periodicity);
    }

    pub fn seed_rule_set(&self, rule_set: RuleSet) {
        self.inner.lock().unwrap().rule_sets.insert(rule_set.id, rule_set);
    }

    pub fn seed_profile(&self, profile: TaxProfile) {
        self.inner.lock().unwrap().profiles.insert(profile.id, profile);
    }
}

#[async_trait]
impl FiscalYearRepo for InMemoryStore {
    async fn get(&self, id: Uuid) -> Result<FiscalYear, RepoError> {
        self.inner
            .lock()
            .unwrap()
            .fiscal_years
            .get(&id)
            .cloned()
            .ok_or(RepoError::NotFound { kind: "fiscal_year", id })
    }

    async fn get_by_year(&self, year: i32) -> Result<FiscalYear, RepoError> {
        self.inner
            .lock()
            .unwrap()
            .fiscal_years
            .values()
            .find(|fy| fy.year == year)
            .cloned()
            .ok_or(RepoError::NotFound { kind: "fiscal_year", id: Uuid::nil() })
    }

    async fn list(&self) -> Result<Vec<FiscalYear>, RepoError> {
        Ok(self.inner.lock().unwrap().fiscal_years.values().cloned().collect())
    }
}

#[async_trait]
impl ThresholdRepo for InMemoryStore {
    async fn resolve_map(&self, fiscal_year_id: Uuid) -> Result<HashMap<String, Decimal>, RepoError> {
        let inner = self.inner.lock().unwrap();
        let mut map = HashMap::new();
        if let Some(thresholds) = inner.thresholds.get(&fiscal_year_id) {
            for threshold in thresholds {
                map.insert(threshold.code.clone(), threshold.value_cop);
            }
        }
        if let Some(fiscal_year) = inner.fiscal_years.get(&fiscal_year_id) {
            map.insert(ThresholdResolver::UVT_KEY.to_string(), fiscal_year.uvt_value);
        }
        Ok(map)
    }

    async fn list(&self, fiscal_year_id: Uuid) -> Result<Vec<Threshold>, RepoError> {
        Ok(self
            .inner
            .lock()
            .unwrap()
            .thresholds
            .get(&fiscal_year_id)
            .cloned()
            .unwrap_or_default())
    }

    async fn upsert(&self, threshold: Threshold) -> Result<Threshold, RepoError> {
        let mut inner = self.inner.lock().unwrap();
        let bucket = inner.thresholds.entry(threshold.fiscal_year_id).or_default();
        if let Some(existing) = bucket.iter_mut().find(|t| t.code == threshold.code) {
            *existing = threshold.clone();
        } else {
            bucket.push(threshold.clone());
        }
        Ok(threshold)
    }
}

#[async_trait]
impl ObligationCatalog for InMemoryStore {
    async fn list_active(&self) -> Result<Vec<ObligationType>, RepoError> {
        let mut items: Vec<ObligationType> = self
            .inner
            .lock()
            .unwrap()
            .obligation_types
            .values()
            .filter(|o| o.is_active)
            .cloned()
            .collect();
        items.sort_by_key(|o| o.display_order);
        Ok(items)
    }

    async fn get(&self, id: Uuid) -> Result<ObligationType, RepoError> {
        self.inner
            .lock()
            .unwrap()
            .obligation_types
            .get(&id)
            .cloned()
            .ok_or(RepoError::NotFound { kind: "obligation_type", id })
    }

    async fn periodicities(&self, fiscal_year_id: Uuid) -> Result<HashMap<Uuid, String>, RepoError> {
        Ok(self
            .inner
            .lock()
            .unwrap()
            .periodicities
            .iter()
            .filter(|((_, fy), _)| *fy == fiscal_year_id)
            .map(|((obligation_type_id, _), p)| (*obligation_type_id, p.frequency.clone()))
            .collect())
    }

    async fn periodicity_schedule(
        &self,
        obligation_type_id: Uuid,
        fiscal_year_id: Uuid,
    ) -> Result<Option<ObligationPeriodicity>, RepoError> {
        Ok(self
            .inner
            .lock()
            .unwrap()
            .periodicities
            .get(&(obligation_type_id, fiscal_year_id))
            .cloned())
    }
}

#[async_trait]
impl RuleRepo for InMemoryStore {
    async fn get_active(&self, fiscal_year_id: Uuid) -> Result<RuleSet, RepoError> {
        self.inner
            .lock()
            .unwrap()
            .rule_sets
            .values()
            .find(|rs| rs.fiscal_year_id == fiscal_year_id && rs.status == tax_core::model::RuleSetStatus::Active)
            .cloned()
            .ok_or(RepoError::NotFound { kind: "active_rule_set", id: fiscal_year_id })
    }

    async fn get(&self, id: Uuid) -> Result<RuleSet, RepoError> {
        self.inner
            .lock()
            .unwrap()
            .rule_sets
            .get(&id)
            .cloned()
            .ok_or(RepoError::NotFound { kind: "rule_set", id })
    }

    async fn list_for_fiscal_year(&self, fiscal_year_id: Uuid) -> Result<Vec<RuleSet>, RepoError> {
        Ok(self
            .inner
            .lock()
            .unwrap()
            .rule_sets
            .values()
            .filter(|rs| rs.fiscal_year_id == fiscal_year_id)
            .cloned()
            .collect())
    }

    async fn create_draft(&self, rule_set: RuleSet) -> Result<RuleSet, RepoError> {
        let mut inner = self.inner.lock().unwrap();
        inner.rule_sets.insert(rule_set.id, rule_set.clone());
        Ok(rule_set)
    }

    async fn publish(&self, rule_set_id: Uuid, now: DateTime<Utc>) -> Result<RuleSet, RepoError> {
        let mut inner = self.inner.lock().unwrap();
        let target = inner
            .rule_sets
            .get(&rule_set_id)
            .cloned()
            .ok_or(RepoError::NotFound { kind: "rule_set", id: rule_set_id })?;

        let fiscal_year_id = target.fiscal_year_id;
        let mut siblings: Vec<RuleSet> = inner
            .rule_sets
            .values()
            .filter(|rs| rs.fiscal_year_id == fiscal_year_id)
            .cloned()
            .collect();

        lifecycle::decide_publish(&mut siblings, rule_set_id, now)
            .map_err(|e| RepoError::Conflict(e.to_string()))?;

        for rule_set in siblings {
            inner.rule_sets.insert(rule_set.id, rule_set);
        }

        Ok(inner.rule_sets.get(&rule_set_id).cloned().unwrap())
    }
}

#[async_trait]
impl ProfileRepo for InMemoryStore {
    async fn get(&self, id: Uuid, tenant_id: Uuid) -> Result<TaxProfile, RepoError> {
        self.inner
            .lock()
            .unwrap()
            .profiles
            .get(&id)
            .filter(|p| p.tenant_id == tenant_id)
            .cloned()
            .ok_or(RepoError::NotFound { kind: "tax_profile", id })
    }

    async fn get_for_user(&self, user_id: Uuid, tenant_id: Uuid, fiscal_year_id: Uuid) -> Result<TaxProfile, RepoError> {
        self.inner
            .lock()
            .unwrap()
            .profiles
            .values()
            .find(|p| p.user_id == user_id && p.tenant_id == tenant_id && p.fiscal_year_id == fiscal_year_id)
            .cloned()
            .ok_or(RepoError::NotFound { kind: "tax_profile", id: user_id })
    }

    async fn upsert(&self, profile: TaxProfile) -> Result<TaxProfile, RepoError> {
        let mut inner = self.inner.lock().unwrap();
        inner.profiles.insert(profile.id, profile.clone());
        Ok(profile)
    }
}

#[async_trait]
impl EvaluationRepo for InMemoryStore {
    async fn save(&self, evaluation: Evaluation) -> Result<Evaluation, RepoError> {
        let mut inner = self.inner.lock().unwrap();
        inner.evaluations.insert(evaluation.id, evaluation.clone());
        Ok(evaluation)
    }

    async fn get(&self, id: Uuid, tenant_id: Uuid) -> Result<Evaluation, RepoError> {
        self.inner
            .lock()
            .unwrap()
            .evaluations
            .get(&id)
            .filter(|e| e.tenant_id == tenant_id)
            .cloned()
            .ok_or(RepoError::NotFound { kind: "evaluation", id })
    }

    async fn list_for_user(&self, user_id: Uuid, tenant_id: Uuid) -> Result<Vec<Evaluation>, RepoError> {
        Ok(self
            .inner
            .lock()
            .unwrap()
            .evaluations
            .values()
            .filter(|e| e.user_id == user_id && e.tenant_id == tenant_id)
            .cloned()
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;
    use tax_core::model::{FiscalYearStatus, RuleSetStatus};

    fn fiscal_year() -> FiscalYear {
        FiscalYear {
            id: Uuid::new_v4(),
            year: 2025,
            status: FiscalYearStatus::Active,
            uvt_value: dec!(49641),
            notes: None,
        }
    }

    fn draft_rule_set(fiscal_year_id: Uuid) -> RuleSet {
        RuleSet {
            id: Uuid::new_v4(),
            fiscal_year_id,
            version: 1,
            status: RuleSetStatus::Draft,
            published_at: None,
            changelog: None,
            rules: vec![],
        }
    }

    #[tokio::test]
    async fn resolve_map_includes_uvt_value_under_reserved_key() {
        let store = InMemoryStore::new();
        let fy = fiscal_year();
        let fy_id = fy.id;
        store.seed_fiscal_year(fy);
        store.seed_threshold(Threshold {
            id: Uuid::new_v4(),
            fiscal_year_id: fy_id,
            code: "renta_pn_ingresos_tope".into(),
            name: "Tope ingresos renta".into(),
            value_cop: dec!(69497400),
            value_uvt: Some(dec!(1400)),
            description: None,
        });

        let map = ThresholdRepo::resolve_map(&store, fy_id).await.unwrap();
        assert_eq!(map.get(ThresholdResolver::UVT_KEY), Some(&dec!(49641)));
        assert_eq!(map.get("renta_pn_ingresos_tope"), Some(&dec!(69497400)));
    }

    #[tokio::test]
    async fn publish_deprecates_previous_active_rule_set() {
        let store = InMemoryStore::new();
        let fy_id = Uuid::new_v4();
        let old_active = RuleSet { status: RuleSetStatus::Active, ..draft_rule_set(fy_id) };
        let new_draft = draft_rule_set(fy_id);
        let new_id = new_draft.id;
        store.seed_rule_set(old_active.clone());
        store.seed_rule_set(new_draft);

        let published = RuleRepo::publish(&store, new_id, Utc::now()).await.unwrap();
        assert_eq!(published.status, RuleSetStatus::Active);

        let old_after = RuleRepo::get(&store, old_active.id).await.unwrap();
        assert_eq!(old_after.status, RuleSetStatus::Deprecated);
    }

    #[tokio::test]
    async fn publish_unknown_rule_set_is_not_found() {
        let store = InMemoryStore::new();
        let err = RuleRepo::publish(&store, Uuid::new_v4(), Utc::now()).await.unwrap_err();
        assert!(matches!(err, RepoError::NotFound { .. }));
    }

    fn sample_profile(tenant_id: Uuid) -> TaxProfile {
        TaxProfile {
            id: Uuid::new_v4(),
            user_id: Uuid::new_v4(),
            tenant_id,
            fiscal_year_id: Uuid::new_v4(),
            persona_type: "natural".into(),
            regime: "ordinario".into(),
            is_iva_responsable: false,
            ingresos_brutos_cop: dec!(0),
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

    #[tokio::test]
    async fn profile_get_returns_not_found_for_a_different_tenant() {
        let store = InMemoryStore::new();
        let owner_tenant = Uuid::new_v4();
        let profile = sample_profile(owner_tenant);
        let profile_id = profile.id;
        store.seed_profile(profile);

        let ok = ProfileRepo::get(&store, profile_id, owner_tenant).await;
        assert!(ok.is_ok());

        let other_tenant = Uuid::new_v4();
        let err = ProfileRepo::get(&store, profile_id, other_tenant).await.unwrap_err();
        assert!(matches!(err, RepoError::NotFound { .. }));
    }

    #[tokio::test]
    async fn evaluation_list_for_user_excludes_other_tenants_records() {
        use tax_core::model::{Evaluation, EvaluationStatus};

        let store = InMemoryStore::new();
        let tenant_a = Uuid::new_v4();
        let tenant_b = Uuid::new_v4();
        let user_id = Uuid::new_v4();

        let eval = |tenant_id: Uuid| Evaluation {
            id: Uuid::new_v4(),
            user_id,
            tenant_id,
            tax_profile_id: Uuid::new_v4(),
            rule_set_id: Uuid::new_v4(),
            fiscal_year_id: Uuid::new_v4(),
            status: EvaluationStatus::Completed,
            evaluated_at: Utc::now(),
            profile_snapshot: serde_json::Value::Null,
            results: vec![],
        };

        EvaluationRepo::save(&store, eval(tenant_a)).await.unwrap();
        EvaluationRepo::save(&store, eval(tenant_b)).await.unwrap();

        let for_a = EvaluationRepo::list_for_user(&store, user_id, tenant_a).await.unwrap();
        assert_eq!(for_a.len(), 1);
        assert_eq!(for_a[0].tenant_id, tenant_a);
    }
}
