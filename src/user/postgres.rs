//! PostgreSQL user storage.

use async_trait::async_trait;
use sqlx::{Pool, Postgres};
use uuid::Uuid;

use super::{RepositoryError, Result, Upsert, UserEntity, UserRepository};

#[derive(Clone)]
pub struct PgUserRepository {
    pool: Pool<Postgres>,
}

impl PgUserRepository {
    /// Create a new [`PgUserRepository`].
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl UserRepository for PgUserRepository {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<UserEntity>> {
        let user = sqlx::query_as::<_, UserEntity>(
            r#"SELECT id, login, first_name, last_name FROM users WHERE id = $1"#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(user)
    }

    async fn insert(&self, mut user: UserEntity) -> Result<UserEntity> {
        if user.id.is_nil() {
            user.id = Uuid::new_v4();
        }

        let result = sqlx::query(
            r#"INSERT INTO users (id, login, first_name, last_name)
                VALUES ($1, $2, $3, $4)
                ON CONFLICT (id) DO NOTHING"#,
        )
        .bind(user.id)
        .bind(&user.login)
        .bind(&user.first_name)
        .bind(&user.last_name)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() != 1 {
            return Err(RepositoryError::AlreadyExists(user.id));
        }

        Ok(user)
    }

    async fn update_or_insert(&self, user: UserEntity) -> Result<Upsert> {
        if user.id.is_nil() {
            return Err(RepositoryError::EmptyIdentifier);
        }

        // `xmax` is zero only for a freshly inserted tuple.
        let inserted = sqlx::query_scalar::<_, bool>(
            r#"INSERT INTO users (id, login, first_name, last_name)
                VALUES ($1, $2, $3, $4)
                ON CONFLICT (id) DO UPDATE
                SET login = EXCLUDED.login,
                    first_name = EXCLUDED.first_name,
                    last_name = EXCLUDED.last_name
                RETURNING (xmax = 0)"#,
        )
        .bind(user.id)
        .bind(&user.login)
        .bind(&user.first_name)
        .bind(&user.last_name)
        .fetch_one(&self.pool)
        .await?;

        Ok(if inserted {
            Upsert::Inserted(user)
        } else {
            Upsert::Updated(user)
        })
    }
}
