use std::path::Path;

use serde::Deserialize;
use tax_core::model::{FiscalYear, ObligationPeriodicity, ObligationType, RuleSet, TaxProfile, Threshold};

/// The on-disk shape loaded by the CLI: one fiscal year's worth of
/// thresholds, obligation catalog, a rule set, and a sample profile to run
/// against. Real deployments load each of these from a database through the
/// `tax-repo` traits instead; this mirrors that shape for local use.
#[derive(Debug, Deserialize)]
pub struct Fixture {
    pub fiscal_year: FiscalYear,
    #[serde(default)]
    pub thresholds: Vec<Threshold>,
    #[serde(default)]
    pub obligation_types: Vec<ObligationType>,
    #[serde(default)]
    pub periodicities: Vec<ObligationPeriodicity>,
    pub rule_set: RuleSet,
    pub profile: TaxProfile,
}

pub fn load(path: &Path) -> anyhow::Result<Fixture> {
    let raw = std::fs::read_to_string(path)
        .map_err(|e| anyhow::anyhow!("reading fixture {}: {e}", path.display()))?;
    let fixture: Fixture = serde_json::from_str(&raw)
        .map_err(|e| anyhow::anyhow!("parsing fixture {}: {e}", path.display()))?;
    Ok(fixture)
}
