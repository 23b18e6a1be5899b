//! Persistence context shared by the catalog and application services.

mod memory;

pub use memory::InMemoryStore;

/// Error enumeration for repository failures.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RepositoryError {
    #[error("unique constraint `{0}` violated")]
    Conflict(&'static str),
    #[error("referenced {0} does not exist")]
    MissingReference(&'static str),
    #[error("record not found")]
    NotFound,
    #[error("record is still referenced by {0}")]
    InUse(&'static str),
    #[error("record changed since it was read (expected version {expected}, found {found})")]
    Stale { expected: u64, found: u64 },
    #[error("repository unavailable: {0}")]
    Unavailable(String),
}
