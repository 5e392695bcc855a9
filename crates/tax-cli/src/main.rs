mod fixtures;
mod service;

use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use tax_core::wire::EvaluationProjection;
use tax_repo::InMemoryStore;
use tracing_subscriber::EnvFilter;

/// Runs the tax obligation engine against a JSON fixture describing one
/// fiscal year's thresholds, obligation catalog, rule set, and a profile,
/// then prints the resulting evaluation as JSON.
#[derive(Parser, Debug)]
#[command(name = "tax-engine", version)]
struct Cli {
    /// Path to a fixture JSON file (see `fixtures/fiscal_year_2025.json`).
    #[arg(long, default_value = "crates/tax-cli/fixtures/fiscal_year_2025.json")]
    fixture: PathBuf,

    /// Pretty-print the resulting JSON payload.
    #[arg(long, default_value_t = true)]
    pretty: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .json()
        .init();

    let cli = Cli::parse();
    let fixture = fixtures::load(&cli.fixture)?;

    let store = Arc::new(InMemoryStore::new());
    let (profile_id, tenant_id) = service::seed_store(&store, fixture);

    let evaluation_service = service::EvaluationService::new(Arc::clone(&store));
    let evaluation = evaluation_service.evaluate(profile_id, tenant_id).await?;

    let projection = EvaluationProjection::from(&evaluation);
    let output = if cli.pretty {
        serde_json::to_string_pretty(&projection)?
    } else {
        serde_json::to_string(&projection)?
    };
    println!("{output}");

    Ok(())
}
