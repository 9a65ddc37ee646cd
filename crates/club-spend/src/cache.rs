//! SQLite cache for the last good snapshot per source
//!
//! A snapshot body is stored only after it parsed successfully, so whatever
//! the cache holds can always stand in for a failed fetch. Derived metrics are
//! never stored; they are recomputed from the snapshot on every run.

use anyhow::{Context, Result};
use chrono::Utc;
use sqlx::{FromRow, SqlitePool};
use std::path::Path;

/// Cache database wrapper
pub struct Cache {
    pool: SqlitePool,
}

/// A cached snapshot body with its bookkeeping
#[derive(Debug, FromRow)]
pub struct CachedSnapshot {
    pub body: String,
    pub last_updated: String,
    pub fetched_at: String,
}

/// Row type for the listing query (body length instead of body)
#[derive(Debug, FromRow)]
pub struct CachedSnapshotInfo {
    pub source: String,
    pub last_updated: String,
    pub fetched_at: String,
    pub bytes: i64,
}

impl Cache {
    /// Open or create cache database
    pub async fn open(path: &Path) -> Result<Self> {
        // Ensure parent directory exists
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        // SQLx requires the file to exist for SQLite
        if !path.exists() {
            std::fs::File::create(path)?;
        }

        let url = format!("sqlite:{}", path.display());
        let pool = SqlitePool::connect(&url)
            .await
            .context("Failed to open cache database")?;

        sqlx::query("PRAGMA journal_mode=WAL")
            .execute(&pool)
            .await?;
        sqlx::query("PRAGMA busy_timeout=5000")
            .execute(&pool)
            .await?;

        let cache = Self { pool };
        cache.init_schema().await?;

        Ok(cache)
    }

    /// Initialize database schema
    async fn init_schema(&self) -> Result<()> {
        sqlx::query(
            "
            -- Last good snapshot per source
            CREATE TABLE IF NOT EXISTS snapshots (
                source TEXT PRIMARY KEY,
                body TEXT NOT NULL,
                last_updated TEXT NOT NULL,
                fetched_at TEXT NOT NULL
            )
            ",
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            "
            -- Cache metadata
            CREATE TABLE IF NOT EXISTS metadata (
                key TEXT PRIMARY KEY,
                value TEXT NOT NULL
            )
            ",
        )
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    // =========================================================================
    // Snapshots
    // =========================================================================

    /// Get the cached snapshot for a source
    pub async fn load_snapshot(&self, source: &str) -> Result<Option<CachedSnapshot>> {
        let row: Option<CachedSnapshot> = sqlx::query_as(
            "SELECT body, last_updated, fetched_at FROM snapshots WHERE source = ?",
        )
        .bind(source)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row)
    }

    /// Replace the cached snapshot for a source
    pub async fn store_snapshot(&self, source: &str, body: &str, last_updated: &str) -> Result<()> {
        let fetched_at = Utc::now().format("%Y-%m-%d %H:%M:%S UTC").to_string();

        sqlx::query(
            "INSERT OR REPLACE INTO snapshots (source, body, last_updated, fetched_at)
             VALUES (?, ?, ?, ?)",
        )
        .bind(source)
        .bind(body)
        .bind(last_updated)
        .bind(&fetched_at)
        .execute(&self.pool)
        .await?;

        log::debug!("Cached {} bytes for {}", body.len(), source);
        Ok(())
    }

    /// All cached snapshots, most recently fetched first
    pub async fn list_snapshots(&self) -> Result<Vec<CachedSnapshotInfo>> {
        let rows: Vec<CachedSnapshotInfo> = sqlx::query_as(
            "SELECT source, last_updated, fetched_at, LENGTH(body) AS bytes
             FROM snapshots
             ORDER BY fetched_at DESC, source",
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }

    /// Delete every cached snapshot and metadata entry, returning the snapshot count
    pub async fn clear(&self) -> Result<u64> {
        let mut tx = self.pool.begin().await?;

        let deleted = sqlx::query("DELETE FROM snapshots")
            .execute(&mut *tx)
            .await?
            .rows_affected();
        sqlx::query("DELETE FROM metadata")
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(deleted)
    }

    // =========================================================================
    // Metadata
    // =========================================================================

    /// Get metadata value
    pub async fn get_metadata(&self, key: &str) -> Result<Option<String>> {
        let row: Option<(String,)> = sqlx::query_as("SELECT value FROM metadata WHERE key = ?")
            .bind(key)
            .fetch_optional(&self.pool)
            .await?;

        Ok(row.map(|(v,)| v))
    }

    /// Set metadata value
    pub async fn set_metadata(&self, key: &str, value: &str) -> Result<()> {
        sqlx::query("INSERT OR REPLACE INTO metadata (key, value) VALUES (?, ?)")
            .bind(key)
            .bind(value)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    // =========================================================================
    // Utilities
    // =========================================================================

    /// Get cache statistics
    pub async fn stats(&self) -> Result<CacheStats> {
        let snapshots: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM snapshots")
            .fetch_one(&self.pool)
            .await?;
        let bytes: (i64,) = sqlx::query_as("SELECT COALESCE(SUM(LENGTH(body)), 0) FROM snapshots")
            .fetch_one(&self.pool)
            .await?;

        Ok(CacheStats {
            snapshots: snapshots.0 as u64,
            bytes: bytes.0 as u64,
        })
    }
}

/// Cache statistics
#[derive(Debug)]
pub struct CacheStats {
    pub snapshots: u64,
    pub bytes: u64,
}

impl std::fmt::Display for CacheStats {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} snapshot(s), {:.1} KiB",
            self.snapshots,
            self.bytes as f64 / 1024.0
        )
    }
}
