//! Repository contracts for the tax engine domain, plus an in-memory
//! reference implementation used by tests, the CLI, and local tooling. A
//! production deployment is expected to provide its own implementations of
//! the traits in [`traits`] backed by a real database; none is included
//! here.

pub mod error;
pub mod memory;
pub mod traits;

pub use error::RepoError;
pub use memory::InMemoryStore;
pub use traits::{EvaluationRepo, FiscalYearRepo, ObligationCatalog, ProfileRepo, RuleRepo, ThresholdRepo};
