// Module declarations
pub mod id;
pub mod persistence;

use application::{ApplicationError, DocumentStore, StoreConfig};
use std::sync::Arc;
use tracing::info;

// Re-export all implementations
pub use id::RandomNumericIdGenerator;
pub use persistence::InMemoryDocumentRepository;

/// Wires a [`DocumentStore`] over the in-memory repository and random numeric ids.
pub fn build_in_memory_store(config: StoreConfig) -> Result<DocumentStore, ApplicationError> {
    config.validate()?;
    let repository = Arc::new(InMemoryDocumentRepository::new());
    let id_generator = Arc::new(RandomNumericIdGenerator::new(config.id_upper_bound));
    info!(
        id_upper_bound = config.id_upper_bound,
        max_id_attempts = config.max_id_attempts,
        conflict_policy = %config.conflict_policy,
        "In-memory document store initialized."
    );
    DocumentStore::new(repository, id_generator, config)
}
