use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use std::collections::HashMap;
use uuid::Uuid;

use tax_core::model::{
    Evaluation, FiscalYear, ObligationPeriodicity, ObligationType, RuleSet, TaxProfile, Threshold,
};

use crate::error::RepoError;

#[async_trait]
pub trait FiscalYearRepo: Send + Sync {
    async fn get(&self, id: Uuid) -> Result<FiscalYear, RepoError>;
    async fn get_by_year(&self, year: i32) -> Result<FiscalYear, RepoError>;
    async fn list(&self) -> Result<Vec<FiscalYear>, RepoError>;
}

#[async_trait]
pub trait ThresholdRepo: Send + Sync {
    /// All thresholds for a fiscal year, keyed by code, flattened to their
    /// COP value — the shape `tax-core`'s `ThresholdResolver` consumes
    /// directly. The fiscal year's UVT figure is included under
    /// `tax_core::resolver::ThresholdResolver::UVT_KEY`.
    async fn resolve_map(&self, fiscal_year_id: Uuid) -> Result<HashMap<String, Decimal>, RepoError>;
    async fn list(&self, fiscal_year_id: Uuid) -> Result<Vec<Threshold>, RepoError>;
    async fn upsert(&self, threshold: Threshold) -> Result<Threshold, RepoError>;
}

#[async_trait]
pub trait ObligationCatalog: Send + Sync {
    async fn list_active(&self) -> Result<Vec<ObligationType>, RepoError>;
    async fn get(&self, id: Uuid) -> Result<ObligationType, RepoError>;
    async fn periodicities(&self, fiscal_year_id: Uuid) -> Result<HashMap<Uuid, String>, RepoError>;
    async fn periodicity_schedule(
        &self,
        obligation_type_id: Uuid,
        fiscal_year_id: Uuid,
    ) -> Result<Option<ObligationPeriodicity>, RepoError>;
}

#[async_trait]
pub trait RuleRepo: Send + Sync {
    async fn get_active(&self, fiscal_year_id: Uuid) -> Result<RuleSet, RepoError>;
    async fn get(&self, id: Uuid) -> Result<RuleSet, RepoError>;
    async fn list_for_fiscal_year(&self, fiscal_year_id: Uuid) -> Result<Vec<RuleSet>, RepoError>;
    async fn create_draft(&self, rule_set: RuleSet) -> Result<RuleSet, RepoError>;

    /// Publishes `rule_set_id` as the active rule set for its fiscal year,
    /// deprecating whatever rule set previously held that spot. Implementors
    /// must make this atomic with respect to concurrent publishes within the
    /// same fiscal year — see `tax_core::lifecycle::decide_publish` for the
    /// pure decision this wraps.
    async fn publish(&self, rule_set_id: Uuid, now: DateTime<Utc>) -> Result<RuleSet, RepoError>;
}

/// Every read accepts the caller's `tenant_id` and must behave as if a
/// record belonging to a different tenant doesn't exist — returning
/// [`RepoError::NotFound`], never the record itself and never a distinct
/// "wrong tenant" error that would leak the record's existence.
#[async_trait]
pub trait ProfileRepo: Send + Sync {
    async fn get(&self, id: Uuid, tenant_id: Uuid) -> Result<TaxProfile, RepoError>;
    async fn get_for_user(&self, user_id: Uuid, tenant_id: Uuid, fiscal_year_id: Uuid) -> Result<TaxProfile, RepoError>;
    async fn upsert(&self, profile: TaxProfile) -> Result<TaxProfile, RepoError>;
}

/// Tenant-scoped the same way as [`ProfileRepo`]: a read for a record
/// outside the caller's tenant must return not-found.
#[async_trait]
pub trait EvaluationRepo: Send + Sync {
    async fn save(&self, evaluation: Evaluation) -> Result<Evaluation, RepoError>;
    async fn get(&self, id: Uuid, tenant_id: Uuid) -> Result<Evaluation, RepoError>;
    async fn list_for_user(&self, user_id: Uuid, tenant_id: Uuid) -> Result<Vec<Evaluation>, RepoError>;
}
