//! Repository port trait.
//!
//! This is the primary port in our hexagonal architecture.
//! Adapters (Postgres, SQLite, in-memory mocks) implement this trait.

use uuid::Uuid;

use crate::entity::{Entity, Relation};
use crate::error::{DomainError, RepoError};
use crate::query::Select;

/// One matched row: its id and the entity decoded from it.
pub type Decoded<E> = (Uuid, Result<E, DomainError>);

/// Storage for reference entities.
///
/// Reads execute a [`Select`] together with its eager-load plan and return
/// fully stitched entities. Writes back the administrative surface and are
/// not used on the read path.
#[async_trait::async_trait]
pub trait ReferenceRepository: Send + Sync + 'static {
    // ─────────────────────────────────────────────────────────────────────────────
    // Reads
    // ─────────────────────────────────────────────────────────────────────────────

    /// Runs the query and returns every matching entity, each at most once.
    async fn fetch_all<E: Entity>(&self, select: Select<E>) -> Result<Vec<E>, RepoError>;

    /// Runs the query and decodes every matching row on its own.
    ///
    /// A row whose columns do not convert to `E` is reported in its slot
    /// instead of failing the query. Only the row's id must be readable.
    async fn fetch_each<E: Entity>(&self, select: Select<E>) -> Result<Vec<Decoded<E>>, RepoError> {
        Ok(self
            .fetch_all(select)
            .await?
            .into_iter()
            .map(|entity| (entity.id(), Ok(entity)))
            .collect())
    }

    /// Runs the query and returns the first matching entity.
    async fn fetch_optional<E: Entity>(&self, select: Select<E>) -> Result<Option<E>, RepoError> {
        Ok(self.fetch_all(select).await?.into_iter().next())
    }

    // ─────────────────────────────────────────────────────────────────────────────
    // Writes
    // ─────────────────────────────────────────────────────────────────────────────

    /// Validates and stores a new entity.
    ///
    /// Storage assigns the id and stamps `created_at` plus any write timestamps;
    /// the stored entity is returned.
    async fn insert<E: Entity>(&self, entity: E) -> Result<E, RepoError>;

    /// Connects `owner` to `target` through a many-to-many relation.
    ///
    /// Fails with [`RepoError::Conflict`] when the pair is already linked or the
    /// owner already holds the relation's maximum number of links.
    async fn link(&self, relation: Relation, owner: Uuid, target: Uuid) -> Result<(), RepoError>;

    /// Flips the active flag and stamps `updated_at`. Returns false when no row has `id`.
    async fn set_active<E: Entity>(&self, id: Uuid, active: bool) -> Result<bool, RepoError>;
}
