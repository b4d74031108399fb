//! database (db) connection pool.
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;

pub const DEFAULT_CREDENTIALS: &str = "postgres";
pub const DEFAULT_DATABASE_NAME: &str = "users";
pub const DEFAULT_POOL_SIZE: u32 = 10;

/// Connections handed to the PostgreSQL repository.
#[derive(Clone)]
pub struct Database {
    pub postgres: PgPool,
}

impl Database {
    /// Init database connections.
    pub async fn new(
        hostname: &str,
        username: &str,
        password: &str,
        db: &str,
        pool: u32,
    ) -> Result<Self, sqlx::Error> {
        let addr = format!("postgres://{username}:{password}@{hostname}/{db}");
        let postgres = PgPoolOptions::new()
            .max_connections(pool)
            .connect(&addr)
            .await?;

        tracing::info!(%hostname, %db, pool, "postgres connected");

        Ok(Self { postgres })
    }
}
