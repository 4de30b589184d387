//! Database handle over a hydrated SQLite image.

use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use tempfile::NamedTempFile;

use crate::error::Result;

/// Queryable per-session blog database.
///
/// The handle holds exactly one pooled connection: statements execute
/// sequentially, and `last_insert_rowid()` stays attached to the statements
/// this session ran.
#[derive(Debug)]
pub struct BlogDatabase {
    pool: SqlitePool,
    /// Keeps the materialized image file alive for the pool's lifetime.
    _image: Option<NamedTempFile>,
}

impl BlogDatabase {
    /// Instantiate a database from a serialized image.
    ///
    /// The bytes are materialized into a private temp file owned by the
    /// handle and removed when it is dropped, so the database stays ephemeral
    /// to the session; writes never reach the cached image.
    pub async fn from_image(image: &[u8]) -> Result<Self> {
        let file = NamedTempFile::new()?;
        std::fs::write(file.path(), image)?;
        let options = Self::base_options().filename(file.path());
        let pool = Self::open_pool(options).await?;
        Ok(Self {
            pool,
            _image: Some(file),
        })
    }

    /// Open an empty in-memory database.
    ///
    /// Covers sessions that start without a stored image, and tests.
    pub async fn in_memory() -> Result<Self> {
        let options = Self::base_options().filename(":memory:");
        let pool = Self::open_pool(options).await?;
        Ok(Self { pool, _image: None })
    }

    fn base_options() -> SqliteConnectOptions {
        SqliteConnectOptions::new().foreign_keys(true)
    }

    async fn open_pool(options: SqliteConnectOptions) -> Result<SqlitePool> {
        // One connection only: an in-memory database is destroyed when its
        // connection closes, and a second connection would see a different
        // database entirely.
        Ok(SqlitePoolOptions::new()
            .max_connections(1)
            .connect_with(options)
            .await?)
    }

    /// The underlying connection pool, for custom queries.
    #[must_use]
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Close the database, waiting for the connection to be released.
    pub async fn close(&self) {
        self.pool.close().await;
    }
}
