use crate::models::{Pokemon, PokemonPatch};
use async_trait::async_trait;
use service_core::error::AppError;

/// Data-access contract over the creature collection.
///
/// "Absent" outcomes are `Ok(None)`; errors are reserved for validation
/// and store failures.
#[async_trait]
pub trait PokemonRepository: Send + Sync {
    async fn count(&self) -> Result<u64, AppError>;

    /// One page window, ordered by `id` ascending.
    async fn list(&self, skip: u64, limit: u64) -> Result<Vec<Pokemon>, AppError>;

    async fn find_by_id(&self, id: i64) -> Result<Option<Pokemon>, AppError>;

    /// Case-insensitive substring match on the english, french or japanese
    /// name. When several records match, which one comes back is undefined.
    async fn find_by_name_fragment(&self, fragment: &str) -> Result<Option<Pokemon>, AppError>;

    /// Highest assigned `id`, or 0 for an empty collection.
    async fn find_max_id(&self) -> Result<i64, AppError>;

    async fn insert(&self, pokemon: Pokemon) -> Result<Pokemon, AppError>;

    /// Returns the record as it is after the update.
    async fn update_by_id(&self, id: i64, patch: PokemonPatch)
        -> Result<Option<Pokemon>, AppError>;

    async fn delete_by_id(&self, id: i64) -> Result<Option<Pokemon>, AppError>;

    async fn health_check(&self) -> Result<(), AppError>;
}
