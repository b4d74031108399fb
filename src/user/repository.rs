//! Port between the users endpoint and a storage engine.

use async_trait::async_trait;
use uuid::Uuid;

use super::UserEntity;

pub type Result<T> = std::result::Result<T, RepositoryError>;

/// Errors raised by a [`UserRepository`] implementation.
#[derive(Debug, thiserror::Error)]
pub enum RepositoryError {
    #[error("user identifier must not be empty")]
    EmptyIdentifier,
    #[error("user {0} already exists")]
    AlreadyExists(Uuid),
    #[error("SQL request failed: {0}")]
    Sql(#[from] sqlx::Error),
}

/// What [`UserRepository::update_or_insert`] ended up doing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Upsert {
    Inserted(UserEntity),
    Updated(UserEntity),
}

/// Port for user persistence.
///
/// Implementations must tolerate concurrent calls; the endpoint never
/// serializes access on their behalf.
#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Find a user by its identifier.
    async fn find_by_id(&self, id: Uuid) -> Result<Option<UserEntity>>;

    /// Store a new user. A nil identifier is replaced by a generated one.
    async fn insert(&self, user: UserEntity) -> Result<UserEntity>;

    /// Replace the user carrying `user.id`, or insert it when absent.
    async fn update_or_insert(&self, user: UserEntity) -> Result<Upsert>;
}
