use thiserror::Error;
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RepoError {
    #[error("{kind} {id} not found")]
    NotFound { kind: &'static str, id: Uuid },

    #[error("conflict: {0}")]
    Conflict(String),
}
