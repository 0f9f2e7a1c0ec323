//! Delivery entry repository
//!
//! Database operations for delivery entries.
//!
//! This module provides:
//! - `EntryRepository` trait defining the interface for entry data access
//! - `SqlxEntryRepository` implementing the trait for SQLite and MySQL
//!
//! Listing takes an optional owner filter; access control decides whether a
//! filter is applied, the repository only executes it.

use crate::config::DatabaseDriver;
use crate::db::DynDatabasePool;
use crate::models::DeliveryEntry;
use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use sqlx::{MySqlPool, Row, SqlitePool};
use std::sync::Arc;

/// Delivery entry repository trait
#[async_trait]
pub trait EntryRepository: Send + Sync {
    /// Create a new entry
    async fn create(&self, entry: &DeliveryEntry) -> Result<DeliveryEntry>;

    /// Get entry by ID
    async fn get_by_id(&self, id: i64) -> Result<Option<DeliveryEntry>>;

    /// List entries, newest date first.
    ///
    /// With `owner` set, only that user's entries are returned.
    async fn list(&self, owner: Option<i64>) -> Result<Vec<DeliveryEntry>>;

    /// Update an entry (full row, matched by id)
    async fn update(&self, entry: &DeliveryEntry) -> Result<DeliveryEntry>;

    /// Delete an entry
    async fn delete(&self, id: i64) -> Result<()>;
}

/// SQLx-based entry repository implementation
///
/// Supports both SQLite and MySQL databases.
pub struct SqlxEntryRepository {
    pool: DynDatabasePool,
}

impl SqlxEntryRepository {
    /// Create a new SQLx entry repository
    pub fn new(pool: DynDatabasePool) -> Self {
        Self { pool }
    }

    /// Create a boxed repository for use with dependency injection
    pub fn boxed(pool: DynDatabasePool) -> Arc<dyn EntryRepository> {
        Arc::new(Self::new(pool))
    }
}

#[async_trait]
impl EntryRepository for SqlxEntryRepository {
    async fn create(&self, entry: &DeliveryEntry) -> Result<DeliveryEntry> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => {
                create_entry_sqlite(self.pool.as_sqlite().unwrap(), entry).await
            }
            DatabaseDriver::Mysql => create_entry_mysql(self.pool.as_mysql().unwrap(), entry).await,
        }
    }

    async fn get_by_id(&self, id: i64) -> Result<Option<DeliveryEntry>> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => {
                get_entry_by_id_sqlite(self.pool.as_sqlite().unwrap(), id).await
            }
            DatabaseDriver::Mysql => get_entry_by_id_mysql(self.pool.as_mysql().unwrap(), id).await,
        }
    }

    async fn list(&self, owner: Option<i64>) -> Result<Vec<DeliveryEntry>> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => {
                list_entries_sqlite(self.pool.as_sqlite().unwrap(), owner).await
            }
            DatabaseDriver::Mysql => list_entries_mysql(self.pool.as_mysql().unwrap(), owner).await,
        }
    }

    async fn update(&self, entry: &DeliveryEntry) -> Result<DeliveryEntry> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => {
                update_entry_sqlite(self.pool.as_sqlite().unwrap(), entry).await
            }
            DatabaseDriver::Mysql => update_entry_mysql(self.pool.as_mysql().unwrap(), entry).await,
        }
    }

    async fn delete(&self, id: i64) -> Result<()> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => delete_entry_sqlite(self.pool.as_sqlite().unwrap(), id).await,
            DatabaseDriver::Mysql => delete_entry_mysql(self.pool.as_mysql().unwrap(), id).await,
        }
    }
}

const ENTRY_COLUMNS: &str = "id, user_id, entry_date, challan_amount, delivered_amount, \
     pending_amount, vehicle_required, vehicle_confirmed, vehicle_missing, notes, \
     created_at, updated_at";

// ============================================================================
// SQLite implementations
// ============================================================================

async fn create_entry_sqlite(pool: &SqlitePool, entry: &DeliveryEntry) -> Result<DeliveryEntry> {
    let result = sqlx::query(
        r#"
        INSERT INTO delivery_entries
            (user_id, entry_date, challan_amount, delivered_amount, pending_amount,
             vehicle_required, vehicle_confirmed, vehicle_missing, notes, created_at, updated_at)
        VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(entry.user_id)
    .bind(entry.date)
    .bind(entry.challan_amount)
    .bind(entry.delivered_amount)
    .bind(entry.pending_amount)
    .bind(entry.vehicle_required)
    .bind(entry.vehicle_confirmed)
    .bind(entry.vehicle_missing)
    .bind(&entry.notes)
    .bind(entry.created_at)
    .bind(entry.updated_at)
    .execute(pool)
    .await
    .context("Failed to create entry")?;

    let mut created = entry.clone();
    created.id = result.last_insert_rowid();
    Ok(created)
}

async fn get_entry_by_id_sqlite(pool: &SqlitePool, id: i64) -> Result<Option<DeliveryEntry>> {
    let query = format!("SELECT {} FROM delivery_entries WHERE id = ?", ENTRY_COLUMNS);
    let row = sqlx::query(&query)
        .bind(id)
        .fetch_optional(pool)
        .await
        .context("Failed to get entry by ID")?;

    match row {
        Some(row) => Ok(Some(row_to_entry_sqlite(&row)?)),
        None => Ok(None),
    }
}

async fn list_entries_sqlite(pool: &SqlitePool, owner: Option<i64>) -> Result<Vec<DeliveryEntry>> {
    let rows = match owner {
        Some(user_id) => {
            let query = format!(
                "SELECT {} FROM delivery_entries WHERE user_id = ? ORDER BY entry_date DESC, id DESC",
                ENTRY_COLUMNS
            );
            sqlx::query(&query).bind(user_id).fetch_all(pool).await
        }
        None => {
            let query = format!(
                "SELECT {} FROM delivery_entries ORDER BY entry_date DESC, id DESC",
                ENTRY_COLUMNS
            );
            sqlx::query(&query).fetch_all(pool).await
        }
    }
    .context("Failed to list entries")?;

    rows.iter().map(row_to_entry_sqlite).collect()
}

async fn update_entry_sqlite(pool: &SqlitePool, entry: &DeliveryEntry) -> Result<DeliveryEntry> {
    sqlx::query(
        r#"
        UPDATE delivery_entries
        SET entry_date = ?, challan_amount = ?, delivered_amount = ?, pending_amount = ?,
            vehicle_required = ?, vehicle_confirmed = ?, vehicle_missing = ?, notes = ?,
            updated_at = ?
        WHERE id = ?
        "#,
    )
    .bind(entry.date)
    .bind(entry.challan_amount)
    .bind(entry.delivered_amount)
    .bind(entry.pending_amount)
    .bind(entry.vehicle_required)
    .bind(entry.vehicle_confirmed)
    .bind(entry.vehicle_missing)
    .bind(&entry.notes)
    .bind(entry.updated_at)
    .bind(entry.id)
    .execute(pool)
    .await
    .context("Failed to update entry")?;

    Ok(entry.clone())
}

async fn delete_entry_sqlite(pool: &SqlitePool, id: i64) -> Result<()> {
    sqlx::query("DELETE FROM delivery_entries WHERE id = ?")
        .bind(id)
        .execute(pool)
        .await
        .context("Failed to delete entry")?;

    Ok(())
}

fn row_to_entry_sqlite(row: &sqlx::sqlite::SqliteRow) -> Result<DeliveryEntry> {
    Ok(DeliveryEntry {
        id: row.get("id"),
        user_id: row.get("user_id"),
        date: row.get("entry_date"),
        challan_amount: row.get("challan_amount"),
        delivered_amount: row.get("delivered_amount"),
        pending_amount: row.get("pending_amount"),
        vehicle_required: row.get("vehicle_required"),
        vehicle_confirmed: row.get("vehicle_confirmed"),
        vehicle_missing: row.get("vehicle_missing"),
        notes: row.get("notes"),
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
    })
}

// ============================================================================
// MySQL implementations
// ============================================================================

async fn create_entry_mysql(pool: &MySqlPool, entry: &DeliveryEntry) -> Result<DeliveryEntry> {
    let result = sqlx::query(
        r#"
        INSERT INTO delivery_entries
            (user_id, entry_date, challan_amount, delivered_amount, pending_amount,
             vehicle_required, vehicle_confirmed, vehicle_missing, notes, created_at, updated_at)
        VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(entry.user_id)
    .bind(entry.date)
    .bind(entry.challan_amount)
    .bind(entry.delivered_amount)
    .bind(entry.pending_amount)
    .bind(entry.vehicle_required)
    .bind(entry.vehicle_confirmed)
    .bind(entry.vehicle_missing)
    .bind(&entry.notes)
    .bind(entry.created_at)
    .bind(entry.updated_at)
    .execute(pool)
    .await
    .context("Failed to create entry")?;

    let mut created = entry.clone();
    created.id = result.last_insert_id() as i64;
    Ok(created)
}

async fn get_entry_by_id_mysql(pool: &MySqlPool, id: i64) -> Result<Option<DeliveryEntry>> {
    let query = format!("SELECT {} FROM delivery_entries WHERE id = ?", ENTRY_COLUMNS);
    let row = sqlx::query(&query)
        .bind(id)
        .fetch_optional(pool)
        .await
        .context("Failed to get entry by ID")?;

    match row {
        Some(row) => Ok(Some(row_to_entry_mysql(&row)?)),
        None => Ok(None),
    }
}

async fn list_entries_mysql(pool: &MySqlPool, owner: Option<i64>) -> Result<Vec<DeliveryEntry>> {
    let rows = match owner {
        Some(user_id) => {
            let query = format!(
                "SELECT {} FROM delivery_entries WHERE user_id = ? ORDER BY entry_date DESC, id DESC",
                ENTRY_COLUMNS
            );
            sqlx::query(&query).bind(user_id).fetch_all(pool).await
        }
        None => {
            let query = format!(
                "SELECT {} FROM delivery_entries ORDER BY entry_date DESC, id DESC",
                ENTRY_COLUMNS
            );
            sqlx::query(&query).fetch_all(pool).await
        }
    }
    .context("Failed to list entries")?;

    rows.iter().map(row_to_entry_mysql).collect()
}

async fn update_entry_mysql(pool: &MySqlPool, entry: &DeliveryEntry) -> Result<DeliveryEntry> {
    sqlx::query(
        r#"
        UPDATE delivery_entries
        SET entry_date = ?, challan_amount = ?, delivered_amount = ?, pending_amount = ?,
            vehicle_required = ?, vehicle_confirmed = ?, vehicle_missing = ?, notes = ?,
            updated_at = ?
        WHERE id = ?
        "#,
    )
    .bind(entry.date)
    .bind(entry.challan_amount)
    .bind(entry.delivered_amount)
    .bind(entry.pending_amount)
    .bind(entry.vehicle_required)
    .bind(entry.vehicle_confirmed)
    .bind(entry.vehicle_missing)
    .bind(&entry.notes)
    .bind(entry.updated_at)
    .bind(entry.id)
    .execute(pool)
    .await
    .context("Failed to update entry")?;

    Ok(entry.clone())
}

async fn delete_entry_mysql(pool: &MySqlPool, id: i64) -> Result<()> {
    sqlx::query("DELETE FROM delivery_entries WHERE id = ?")
        .bind(id)
        .execute(pool)
        .await
        .context("Failed to delete entry")?;

    Ok(())
}

fn row_to_entry_mysql(row: &sqlx::mysql::MySqlRow) -> Result<DeliveryEntry> {
    let date: NaiveDate = row.get("entry_date");
    let created_at: DateTime<Utc> = row.get("created_at");
    let updated_at: DateTime<Utc> = row.get("updated_at");

    Ok(DeliveryEntry {
        id: row.get("id"),
        user_id: row.get("user_id"),
        date,
        challan_amount: row.get("challan_amount"),
        delivered_amount: row.get("delivered_amount"),
        pending_amount: row.get("pending_amount"),
        vehicle_required: row.get("vehicle_required"),
        vehicle_confirmed: row.get("vehicle_confirmed"),
        vehicle_missing: row.get("vehicle_missing"),
        notes: row.get("notes"),
        created_at,
        updated_at,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{create_test_pool, migrations};
    use crate::models::{CreateEntryInput, UserRole};

    async fn setup_test_repo() -> (DynDatabasePool, SqlxEntryRepository) {
        let pool = create_test_pool().await.expect("Failed to create test pool");
        migrations::run_migrations(&pool)
            .await
            .expect("Failed to run migrations");
        let repo = SqlxEntryRepository::new(pool.clone());
        (pool, repo)
    }

    async fn create_test_user(pool: &DynDatabasePool, id: i64) {
        let now = Utc::now();
        if let Some(sqlite_pool) = pool.as_sqlite() {
            sqlx::query(
                "INSERT INTO users (id, email, name, picture, role, created_at) VALUES (?, ?, ?, ?, ?, ?)",
            )
            .bind(id)
            .bind(format!("user{}@example.com", id))
            .bind(format!("User {}", id))
            .bind("")
            .bind(UserRole::User.to_string())
            .bind(now)
            .execute(sqlite_pool)
            .await
            .expect("Failed to create test user");
        }
    }

    fn test_entry(user_id: i64, date: &str) -> DeliveryEntry {
        DeliveryEntry::new(
            user_id,
            CreateEntryInput {
                date: date.parse().unwrap(),
                challan_amount: 1000.0,
                delivered_amount: 600.0,
                pending_amount: 400.0,
                vehicle_required: 5,
                vehicle_confirmed: 4,
                vehicle_missing: 1,
                notes: String::new(),
            },
        )
    }

    #[tokio::test]
    async fn test_create_entry_assigns_id() {
        let (pool, repo) = setup_test_repo().await;
        create_test_user(&pool, 1).await;

        let created = repo
            .create(&test_entry(1, "2024-05-10"))
            .await
            .expect("Failed to create entry");

        assert!(created.id > 0);
        assert_eq!(created.user_id, 1);
        assert_eq!(created.challan_amount, 1000.0);
    }

    #[tokio::test]
    async fn test_get_by_id_roundtrip() {
        let (pool, repo) = setup_test_repo().await;
        create_test_user(&pool, 1).await;

        let created = repo
            .create(&test_entry(1, "2024-05-10"))
            .await
            .expect("Failed to create entry");

        let found = repo
            .get_by_id(created.id)
            .await
            .expect("Failed to get entry")
            .expect("Entry not found");

        assert_eq!(found.id, created.id);
        assert_eq!(found.date, created.date);
        assert_eq!(found.vehicle_required, 5);
        assert_eq!(found.notes, "");
    }

    #[tokio::test]
    async fn test_get_by_id_not_found() {
        let (_pool, repo) = setup_test_repo().await;

        let found = repo.get_by_id(999).await.expect("Failed to get entry");
        assert!(found.is_none());
    }

    #[tokio::test]
    async fn test_list_with_owner_filter() {
        let (pool, repo) = setup_test_repo().await;
        create_test_user(&pool, 1).await;
        create_test_user(&pool, 2).await;

        repo.create(&test_entry(1, "2024-05-10")).await.unwrap();
        repo.create(&test_entry(1, "2024-05-11")).await.unwrap();
        repo.create(&test_entry(2, "2024-05-12")).await.unwrap();

        let own = repo.list(Some(1)).await.expect("Failed to list entries");
        assert_eq!(own.len(), 2);
        assert!(own.iter().all(|e| e.user_id == 1));

        let all = repo.list(None).await.expect("Failed to list entries");
        assert_eq!(all.len(), 3);
    }

    #[tokio::test]
    async fn test_list_ordered_by_date_descending() {
        let (pool, repo) = setup_test_repo().await;
        create_test_user(&pool, 1).await;

        repo.create(&test_entry(1, "2024-05-10")).await.unwrap();
        repo.create(&test_entry(1, "2024-05-12")).await.unwrap();
        repo.create(&test_entry(1, "2024-05-11")).await.unwrap();

        let entries = repo.list(Some(1)).await.expect("Failed to list entries");
        let dates: Vec<String> = entries.iter().map(|e| e.date.to_string()).collect();
        assert_eq!(dates, vec!["2024-05-12", "2024-05-11", "2024-05-10"]);
    }

    #[tokio::test]
    async fn test_update_entry() {
        let (pool, repo) = setup_test_repo().await;
        create_test_user(&pool, 1).await;

        let mut entry = repo
            .create(&test_entry(1, "2024-05-10"))
            .await
            .expect("Failed to create entry");

        entry.delivered_amount = 900.0;
        entry.pending_amount = 100.0;
        entry.notes = "second run added".to_string();

        repo.update(&entry).await.expect("Failed to update entry");

        let found = repo
            .get_by_id(entry.id)
            .await
            .expect("Failed to get entry")
            .expect("Entry not found");

        assert_eq!(found.delivered_amount, 900.0);
        assert_eq!(found.pending_amount, 100.0);
        assert_eq!(found.notes, "second run added");
    }

    #[tokio::test]
    async fn test_delete_entry() {
        let (pool, repo) = setup_test_repo().await;
        create_test_user(&pool, 1).await;

        let entry = repo
            .create(&test_entry(1, "2024-05-10"))
            .await
            .expect("Failed to create entry");

        repo.delete(entry.id).await.expect("Failed to delete entry");

        let found = repo.get_by_id(entry.id).await.expect("Failed to get entry");
        assert!(found.is_none());
    }
}
