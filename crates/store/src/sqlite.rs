//! SQLite backend for vector tables.
//!
//! One database file holds any number of chunk tables plus a
//! `docqa_tables` registry recording each table's vector dimension:
//! - `<table>` — `text`, `vector` (little-endian f32 blob), `filename`,
//!   `page_numbers` (JSON array), `title`
//! - `docqa_tables` — `name`, `ndims`, `created_at`
//!
//! Similarity is computed in Rust over all rows of the table.

use std::path::Path;
use std::str::FromStr;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use docqa_core::embedding::Embedder;
use docqa_core::error::StoreError;
use docqa_core::store::{ChunkMetadata, ChunkRecord, NewRecord, SearchResult, VectorTable};
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions, SqliteSynchronous};
use sqlx::{Row, SqlitePool};
use tracing::{debug, info};

use crate::in_memory::embed_records;
use crate::vector::{from_blob, rank_by_similarity, to_blob};

const REGISTRY: &str = "docqa_tables";

/// A handle to one SQLite database file.
pub struct Database {
    pool: SqlitePool,
    path: String,
}

impl Database {
    /// Open (creating if missing) the database at `path`.
    ///
    /// Pass `":memory:"` for an ephemeral database; it is limited to a
    /// single pooled connection so every query sees the same data.
    pub async fn connect(path: &str) -> Result<Self, StoreError> {
        let in_memory = path == ":memory:" || path.contains("mode=memory");

        let base = if in_memory || path.starts_with("sqlite:") {
            SqliteConnectOptions::from_str(path)
                .map_err(|e| StoreError::Connection(format!("Invalid SQLite path: {e}")))?
        } else {
            if let Some(parent) = Path::new(path).parent().filter(|p| !p.as_os_str().is_empty()) {
                tokio::fs::create_dir_all(parent).await.map_err(|e| {
                    StoreError::Connection(format!("Failed to create {}: {e}", parent.display()))
                })?;
            }
            SqliteConnectOptions::new().filename(path)
        };
        let options = base
            .create_if_missing(true)
            .journal_mode(SqliteJournalMode::Wal)
            .synchronous(SqliteSynchronous::Normal);

        let pool = SqlitePoolOptions::new()
            .max_connections(if in_memory { 1 } else { 4 })
            .connect_with(options)
            .await
            .map_err(|e| StoreError::Connection(format!("Failed to open SQLite: {e}")))?;

        let db = Self {
            pool,
            path: path.to_string(),
        };
        db.run_migrations().await?;
        info!(path = %db.path, "SQLite store opened");
        Ok(db)
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    async fn run_migrations(&self) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS docqa_tables (
                name       TEXT PRIMARY KEY,
                ndims      INTEGER NOT NULL,
                created_at TEXT NOT NULL
            )
            "#,
        )
        .execute(&self.pool)
        .await
        .map_err(|e| StoreError::Connection(format!("registry table: {e}")))?;

        debug!("SQLite migrations complete");
        Ok(())
    }

    /// Create `name`, replacing any existing table of that name and its rows.
    ///
    /// The embedder's dimension is recorded and fixed for the table's lifetime.
    pub async fn create_table(
        &self,
        name: &str,
        embedder: Arc<dyn Embedder>,
    ) -> Result<SqliteTable, StoreError> {
        let ident = quote_ident(name)?;
        let ndims = embedder.ndims();

        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| StoreError::Write(format!("BEGIN: {e}")))?;

        sqlx::query(&format!("DROP TABLE IF EXISTS {ident}"))
            .execute(&mut *tx)
            .await
            .map_err(|e| StoreError::Write(format!("DROP {name}: {e}")))?;

        sqlx::query(&format!(
            r#"
            CREATE TABLE {ident} (
                id           INTEGER PRIMARY KEY AUTOINCREMENT,
                text         TEXT NOT NULL,
                vector       BLOB NOT NULL,
                filename     TEXT,
                page_numbers TEXT,
                title        TEXT
            )
            "#
        ))
        .execute(&mut *tx)
        .await
        .map_err(|e| StoreError::Write(format!("CREATE {name}: {e}")))?;

        sqlx::query(
            "INSERT OR REPLACE INTO docqa_tables (name, ndims, created_at) VALUES (?1, ?2, ?3)",
        )
        .bind(name)
        .bind(ndims as i64)
        .bind(Utc::now().to_rfc3339())
        .execute(&mut *tx)
        .await
        .map_err(|e| StoreError::Write(format!("register {name}: {e}")))?;

        tx.commit()
            .await
            .map_err(|e| StoreError::Write(format!("COMMIT: {e}")))?;

        info!(table = name, ndims, "Created table (overwrite)");
        Ok(SqliteTable {
            pool: self.pool.clone(),
            name: name.to_string(),
            ident,
            embedder,
        })
    }

    /// Open an existing table, checking its recorded dimension.
    pub async fn open_table(
        &self,
        name: &str,
        embedder: Arc<dyn Embedder>,
    ) -> Result<SqliteTable, StoreError> {
        let ident = quote_ident(name)?;
        let ndims = self
            .registered_ndims(name)
            .await?
            .ok_or_else(|| StoreError::TableNotFound(name.to_string()))?;

        if ndims != embedder.ndims() {
            return Err(StoreError::SchemaMismatch {
                table: name.to_string(),
                expected: ndims,
                actual: embedder.ndims(),
            });
        }

        debug!(table = name, ndims, "Opened table");
        Ok(SqliteTable {
            pool: self.pool.clone(),
            name: name.to_string(),
            ident,
            embedder,
        })
    }

    pub async fn table_exists(&self, name: &str) -> Result<bool, StoreError> {
        Ok(self.registered_ndims(name).await?.is_some())
    }

    /// Names of all registered tables, alphabetically.
    pub async fn table_names(&self) -> Result<Vec<String>, StoreError> {
        let rows = sqlx::query("SELECT name FROM docqa_tables ORDER BY name")
            .fetch_all(&self.pool)
            .await
            .map_err(|e| StoreError::Query(format!("list tables: {e}")))?;

        rows.iter()
            .map(|row| {
                row.try_get::<String, _>("name")
                    .map_err(|e| StoreError::Query(format!("name column: {e}")))
            })
            .collect()
    }

    /// Close every pooled connection. Tables opened from this database stop
    /// working afterwards.
    pub async fn close(&self) {
        self.pool.close().await;
        info!(path = %self.path, "SQLite store closed");
    }

    async fn registered_ndims(&self, name: &str) -> Result<Option<usize>, StoreError> {
        let row = sqlx::query("SELECT ndims FROM docqa_tables WHERE name = ?1")
            .bind(name)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| StoreError::Query(format!("registry lookup: {e}")))?;

        row.map(|row| {
            row.try_get::<i64, _>("ndims")
                .map(|n| n as usize)
                .map_err(|e| StoreError::Query(format!("ndims column: {e}")))
        })
        .transpose()
    }
}

/// Validate a table name and quote it for interpolation into SQL.
fn quote_ident(name: &str) -> Result<String, StoreError> {
    let valid = !name.is_empty()
        && name != REGISTRY
        && name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-');
    if !valid {
        return Err(StoreError::Query(format!("Invalid table name: '{name}'")));
    }
    Ok(format!("\"{name}\""))
}

/// A chunk table inside a [`Database`].
pub struct SqliteTable {
    pool: SqlitePool,
    name: String,
    ident: String,
    embedder: Arc<dyn Embedder>,
}

impl SqliteTable {
    fn row_to_record(row: &sqlx::sqlite::SqliteRow) -> Result<ChunkRecord, StoreError> {
        let text: String = row
            .try_get("text")
            .map_err(|e| StoreError::Query(format!("text column: {e}")))?;
        let blob: Vec<u8> = row
            .try_get("vector")
            .map_err(|e| StoreError::Query(format!("vector column: {e}")))?;
        let filename: Option<String> = row
            .try_get("filename")
            .map_err(|e| StoreError::Query(format!("filename column: {e}")))?;
        let pages_json: Option<String> = row
            .try_get("page_numbers")
            .map_err(|e| StoreError::Query(format!("page_numbers column: {e}")))?;
        let title: Option<String> = row
            .try_get("title")
            .map_err(|e| StoreError::Query(format!("title column: {e}")))?;

        let page_numbers = pages_json
            .map(|json| serde_json::from_str::<Vec<u32>>(&json))
            .transpose()
            .map_err(|e| StoreError::Query(format!("page_numbers JSON: {e}")))?;

        Ok(ChunkRecord {
            text,
            vector: from_blob(&blob),
            metadata: ChunkMetadata {
                filename,
                page_numbers,
                title,
            },
        })
    }
}

#[async_trait]
impl VectorTable for SqliteTable {
    fn name(&self) -> &str {
        &self.name
    }

    fn ndims(&self) -> usize {
        self.embedder.ndims()
    }

    async fn add(&self, records: Vec<NewRecord>) -> Result<usize, StoreError> {
        if records.is_empty() {
            return Ok(0);
        }
        let embedded = embed_records(self.embedder.as_ref(), records).await?;

        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| StoreError::Write(format!("BEGIN: {e}")))?;

        let sql = format!(
            "INSERT INTO {} (text, vector, filename, page_numbers, title) VALUES (?1, ?2, ?3, ?4, ?5)",
            self.ident
        );
        for record in &embedded {
            let pages_json = record
                .metadata
                .page_numbers
                .as_ref()
                .map(serde_json::to_string)
                .transpose()
                .map_err(|e| StoreError::Write(format!("page_numbers JSON: {e}")))?;

            sqlx::query(&sql)
                .bind(&record.text)
                .bind(to_blob(&record.vector))
                .bind(&record.metadata.filename)
                .bind(pages_json)
                .bind(&record.metadata.title)
                .execute(&mut *tx)
                .await
                .map_err(|e| StoreError::Write(format!("INSERT into {}: {e}", self.name)))?;
        }

        tx.commit()
            .await
            .map_err(|e| StoreError::Write(format!("COMMIT: {e}")))?;

        debug!(table = %self.name, rows = embedded.len(), "Appended batch");
        Ok(embedded.len())
    }

    async fn search(&self, query: &str, limit: usize) -> Result<Vec<SearchResult>, StoreError> {
        let query_vector = self.embedder.embed_one(query).await?;

        let rows = sqlx::query(&format!(
            "SELECT text, vector, filename, page_numbers, title FROM {} ORDER BY id",
            self.ident
        ))
        .fetch_all(&self.pool)
        .await
        .map_err(|e| StoreError::Query(format!("SELECT from {}: {e}", self.name)))?;

        let records = rows
            .iter()
            .map(Self::row_to_record)
            .collect::<Result<Vec<_>, _>>()?;

        debug!(table = %self.name, candidates = records.len(), limit, "Vector search");
        Ok(rank_by_similarity(records, &query_vector, limit))
    }

    async fn count(&self) -> Result<usize, StoreError> {
        let row = sqlx::query(&format!("SELECT COUNT(*) as cnt FROM {}", self.ident))
            .fetch_one(&self.pool)
            .await
            .map_err(|e| StoreError::Query(format!("COUNT: {e}")))?;

        let cnt: i64 = row
            .try_get("cnt")
            .map_err(|e| StoreError::Query(format!("cnt column: {e}")))?;

        Ok(cnt as usize)
    }
}
