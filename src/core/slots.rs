// src/core/slots.rs
//! Local persistent key-value slots - the persistence port behind the document store

use anyhow::{Context, Result};
use async_trait::async_trait;
use sqlx::sqlite::SqlitePoolOptions;
use sqlx::SqlitePool;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::fs;
use tokio::sync::RwLock;

use crate::app_log;
use crate::core::config_manager::{StorageBackend, StorageConfig};

/// Well-known slot names
pub mod keys {
    pub const DOCUMENT: &str = "cv_data";
    pub const REMOTE_TOKEN: &str = "remote_token";
    pub const ADMIN_SESSION: &str = "admin_session";
    pub const ADMIN_PASSWORD: &str = "admin_password";
    pub const CONTACT_MESSAGES: &str = "contact_messages";
}

#[async_trait]
pub trait SlotStore: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<String>>;
    async fn set(&self, key: &str, value: &str) -> Result<()>;
    async fn remove(&self, key: &str) -> Result<()>;
}

/// Open the slot backend selected in configuration
pub async fn open_slots(config: &StorageConfig) -> Result<Arc<dyn SlotStore>> {
    let store: Arc<dyn SlotStore> = match config.backend {
        StorageBackend::File => Arc::new(FileSlots::open(&config.path).await?),
        StorageBackend::Sqlite => Arc::new(SqliteSlots::connect(&config.path).await?),
        StorageBackend::Memory => Arc::new(MemorySlots::default()),
    };
    app_log!(info, "Slot store ready: {:?} at {}", config.backend, config.path.display());
    Ok(store)
}

// ===== File-per-key directory =====

pub struct FileSlots {
    dir: PathBuf,
}

impl FileSlots {
    pub async fn open(dir: &Path) -> Result<Self> {
        if !dir.exists() {
            fs::create_dir_all(dir)
                .await
                .with_context(|| format!("Failed to create slot directory: {}", dir.display()))?;
            app_log!(info, "Created slot directory: {}", dir.display());
        }
        Ok(Self {
            dir: dir.to_path_buf(),
        })
    }

    fn slot_path(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{}.slot", normalize_slot_key(key)))
    }
}

#[async_trait]
impl SlotStore for FileSlots {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        let path = self.slot_path(key);
        if !path.exists() {
            return Ok(None);
        }
        let content = fs::read_to_string(&path)
            .await
            .with_context(|| format!("Failed to read slot: {}", path.display()))?;
        Ok(Some(content))
    }

    async fn set(&self, key: &str, value: &str) -> Result<()> {
        let path = self.slot_path(key);
        // Per-write staging name so concurrent writers never rename each other's file
        let staging = path.with_extension(format!("slot.{}.tmp", uuid::Uuid::new_v4().simple()));

        // Write-then-rename so a crash never leaves a half-written slot
        fs::write(&staging, value)
            .await
            .with_context(|| format!("Failed to write slot: {}", staging.display()))?;
        fs::rename(&staging, &path)
            .await
            .with_context(|| format!("Failed to commit slot: {}", path.display()))?;

        app_log!(trace, "Written slot: {}", path.display());
        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<()> {
        let path = self.slot_path(key);
        if path.exists() {
            fs::remove_file(&path)
                .await
                .with_context(|| format!("Failed to remove slot: {}", path.display()))?;
            app_log!(info, "Removed slot: {}", path.display());
        }
        Ok(())
    }
}

/// Slot names become file names, so keep them to a safe alphabet
pub fn normalize_slot_key(key: &str) -> String {
    key.trim()
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '-' || c == '_' {
                c
            } else {
                '_'
            }
        })
        .collect()
}

// ===== SQLite table =====

pub struct SqliteSlots {
    pool: SqlitePool,
}

impl SqliteSlots {
    pub async fn connect(database_path: &Path) -> Result<Self> {
        if let Some(parent) = database_path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).await.with_context(|| {
                    format!("Failed to create database directory: {}", parent.display())
                })?;
            }
        }

        let database_url = format!("sqlite:{}?mode=rwc", database_path.display());
        let pool = SqlitePool::connect(&database_url).await.with_context(|| {
            format!("Failed to connect to database: {}", database_path.display())
        })?;

        app_log!(info, "Database connection established: {}", database_path.display());
        Self::from_pool(pool).await
    }

    /// Private in-memory database, one connection so every query sees the same data
    pub async fn in_memory() -> Result<Self> {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await
            .context("Failed to open in-memory database")?;
        Self::from_pool(pool).await
    }

    async fn from_pool(pool: SqlitePool) -> Result<Self> {
        let slots = Self { pool };
        slots.migrate().await?;
        Ok(slots)
    }

    async fn migrate(&self) -> Result<()> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS slots (
                key TEXT PRIMARY KEY NOT NULL,
                value TEXT NOT NULL,
                updated_at TEXT NOT NULL DEFAULT (datetime('now'))
            );
            "#,
        )
        .execute(&self.pool)
        .await
        .context("Failed to create slots table")?;

        app_log!(info, "Database migrations completed");
        Ok(())
    }
}

#[async_trait]
impl SlotStore for SqliteSlots {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        sqlx::query_scalar::<_, String>("SELECT value FROM slots WHERE key = ?")
            .bind(key)
            .fetch_optional(&self.pool)
            .await
            .with_context(|| format!("Failed to read slot: {}", key))
    }

    async fn set(&self, key: &str, value: &str) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO slots (key, value, updated_at) VALUES (?, ?, datetime('now'))
            ON CONFLICT(key) DO UPDATE SET value = excluded.value, updated_at = excluded.updated_at
            "#,
        )
        .bind(key)
        .bind(value)
        .execute(&self.pool)
        .await
        .with_context(|| format!("Failed to write slot: {}", key))?;
        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<()> {
        sqlx::query("DELETE FROM slots WHERE key = ?")
            .bind(key)
            .execute(&self.pool)
            .await
            .with_context(|| format!("Failed to remove slot: {}", key))?;
        Ok(())
    }
}

// ===== In-memory map =====

#[derive(Default)]
pub struct MemorySlots {
    entries: RwLock<HashMap<String, String>>,
}

impl MemorySlots {
    pub fn with_entries<I, K, V>(entries: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            entries: RwLock::new(
                entries
                    .into_iter()
                    .map(|(k, v)| (k.into(), v.into()))
                    .collect(),
            ),
        }
    }
}

#[async_trait]
impl SlotStore for MemorySlots {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self.entries.read().await.get(key).cloned())
    }

    async fn set(&self, key: &str, value: &str) -> Result<()> {
        self.entries
            .write()
            .await
            .insert(key.to_string(), value.to_string());
        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<()> {
        self.entries.write().await.remove(key);
        Ok(())
    }
}
