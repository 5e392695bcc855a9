use std::sync::Arc;

use chrono::Utc;
use uuid::Uuid;

use tax_core::model::{Evaluation, EvaluationStatus, RuleSetStatus};
use tax_core::RulesEngine;
use tax_repo::{EvaluationRepo, FiscalYearRepo, ObligationCatalog, ProfileRepo, RuleRepo, ThresholdRepo};

use crate::fixtures::Fixture;

/// Reproduces the evaluation orchestration a real API handler would run:
/// load the profile's fiscal year and active rule set, pull thresholds and
/// the obligation catalog, run the engine, and persist the result as a
/// standalone audit record.
pub struct EvaluationService<S> {
    store: Arc<S>,
}

impl<S> EvaluationService<S>
where
    S: FiscalYearRepo + ThresholdRepo + ObligationCatalog + RuleRepo + ProfileRepo + EvaluationRepo,
{
    pub fn new(store: Arc<S>) -> Self {
        EvaluationService { store }
    }

    pub async fn evaluate(&self, profile_id: Uuid, tenant_id: Uuid) -> anyhow::Result<Evaluation> {
        let profile = ProfileRepo::get(self.store.as_ref(), profile_id, tenant_id).await?;
        let fiscal_year = FiscalYearRepo::get(self.store.as_ref(), profile.fiscal_year_id).await?;
        let rule_set = RuleRepo::get_active(self.store.as_ref(), fiscal_year.id).await?;
        if rule_set.status != RuleSetStatus::Active {
            anyhow::bail!("rule set {} is not active", rule_set.id);
        }

        let thresholds = ThresholdRepo::resolve_map(self.store.as_ref(), fiscal_year.id).await?;
        let obligations = ObligationCatalog::list_active(self.store.as_ref()).await?;
        let periodicities = ObligationCatalog::periodicities(self.store.as_ref(), fiscal_year.id).await?;

        let engine = RulesEngine::new(fiscal_year.year);
        let results = engine.evaluate(&profile, &rule_set, &obligations, &thresholds, &periodicities)?;

        let evaluation = Evaluation {
            id: Uuid::new_v4(),
            user_id: profile.user_id,
            tenant_id: profile.tenant_id,
            tax_profile_id: profile.id,
            rule_set_id: rule_set.id,
            fiscal_year_id: fiscal_year.id,
            status: EvaluationStatus::Completed,
            evaluated_at: Utc::now(),
            profile_snapshot: profile.to_snapshot(),
            results,
        };

        let saved = EvaluationRepo::save(self.store.as_ref(), evaluation).await?;
        Ok(saved)
    }
}

/// Seeds an [`tax_repo::InMemoryStore`] with everything a [`Fixture`]
/// describes, activating the fixture's rule set unconditionally — the CLI
/// is a demo harness, not a lifecycle-respecting admin tool. Returns the
/// seeded profile's id and tenant id, the pair a tenant-scoped read needs.
pub fn seed_store(store: &tax_repo::InMemoryStore, fixture: Fixture) -> (Uuid, Uuid) {
    let Fixture { fiscal_year, thresholds, obligation_types, periodicities, mut rule_set, profile } = fixture;

    store.seed_fiscal_year(fiscal_year);
    for threshold in thresholds {
        store.seed_threshold(threshold);
    }
    for obligation_type in obligation_types {
        store.seed_obligation_type(obligation_type);
    }
    for periodicity in periodicities {
        store.seed_periodicity(periodicity);
    }

    rule_set.status = RuleSetStatus::Active;
    rule_set.published_at = Some(Utc::now());
    store.seed_rule_set(rule_set);

    let profile_id = profile.id;
    let tenant_id = profile.tenant_id;
    store.seed_profile(profile);
    (profile_id, tenant_id)
}
