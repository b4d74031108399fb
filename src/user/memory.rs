//! In-memory user storage.

use std::collections::HashMap;
use std::collections::hash_map::Entry;

use async_trait::async_trait;
use tokio::sync::RwLock;
use uuid::Uuid;

use super::{RepositoryError, Result, Upsert, UserEntity, UserRepository};

/// Users kept in a process-local map. Lost on restart.
#[derive(Debug, Default)]
pub struct InMemoryUserRepository {
    users: RwLock<HashMap<Uuid, UserEntity>>,
}

impl InMemoryUserRepository {
    /// Create an empty [`InMemoryUserRepository`].
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl UserRepository for InMemoryUserRepository {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<UserEntity>> {
        Ok(self.users.read().await.get(&id).cloned())
    }

    async fn insert(&self, mut user: UserEntity) -> Result<UserEntity> {
        if user.id.is_nil() {
            user.id = Uuid::new_v4();
        }

        match self.users.write().await.entry(user.id) {
            Entry::Occupied(_) => Err(RepositoryError::AlreadyExists(user.id)),
            Entry::Vacant(slot) => Ok(slot.insert(user).clone()),
        }
    }

    async fn update_or_insert(&self, user: UserEntity) -> Result<Upsert> {
        if user.id.is_nil() {
            return Err(RepositoryError::EmptyIdentifier);
        }

        let previous = self.users.write().await.insert(user.id, user.clone());
        Ok(match previous {
            Some(_) => Upsert::Updated(user),
            None => Upsert::Inserted(user),
        })
    }
}
