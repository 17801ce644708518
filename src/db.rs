use sqlx::{pool::PoolConnection, sqlite::SqlitePoolOptions, Sqlite, SqlitePool};

use crate::error::Result;

/// Database connection pool wrapper
///
/// Cloned into every request through the application state. Callers borrow one
/// pooled connection per operation with [`Database::acquire`]; the connection goes
/// back to the pool when the guard is dropped, on success and error paths alike.
#[derive(Clone)]
pub struct Database {
    pool: SqlitePool,
}

impl Database {
    /// Create a new database connection
    pub async fn new(path: &str, max_connections: u32) -> Result<Self> {
        // Create database URL
        let url = format!("sqlite:{}?mode=rwc", path);

        // Create connection pool
        let pool = SqlitePoolOptions::new()
            .max_connections(max_connections)
            .connect(&url)
            .await?;

        Ok(Self { pool })
    }

    /// Borrow one connection from the pool for the duration of an operation
    pub async fn acquire(&self) -> Result<PoolConnection<Sqlite>> {
        Ok(self.pool.acquire().await?)
    }

    /// Close every connection; later operations fail with a pool error
    pub async fn close(&self) {
        self.pool.close().await;
    }

    /// Run database migrations
    pub async fn run_migrations(&self) -> Result<()> {
        let mut conn = self.acquire().await?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS files (
                id TEXT PRIMARY KEY,
                file_name TEXT NOT NULL,
                file_path TEXT NOT NULL UNIQUE,
                upload_date TEXT NOT NULL
            )
            "#,
        )
        .execute(&mut *conn)
        .await?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS partenaires (
                id TEXT PRIMARY KEY,
                name TEXT NOT NULL,
                website TEXT NOT NULL DEFAULT '',
                description TEXT NOT NULL DEFAULT '',
                logo_file TEXT UNIQUE,
                upload_date TEXT NOT NULL
            )
            "#,
        )
        .execute(&mut *conn)
        .await?;

        tracing::info!("Database migrations completed");
        Ok(())
    }
}

#[cfg(test)]
pub(crate) async fn open_temp(dir: &std::path::Path) -> Database {
    let path = dir.join("test.db");
    let db = Database::new(path.to_str().unwrap(), 2).await.unwrap();
    db.run_migrations().await.unwrap();
    db
}
