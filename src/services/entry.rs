//! Delivery entry service
//!
//! Business logic for delivery entries: create/read/update/delete with
//! access control applied on every path. Ownership is stamped from the
//! validated session; nothing in the request payload can redirect it.

use crate::db::repositories::EntryRepository;
use crate::models::{CreateEntryInput, DeliveryEntry, UpdateEntryInput, User};
use crate::services::access::{authorize_write, scope_for};
use anyhow::Context;
use std::sync::Arc;

/// Error types for entry operations
#[derive(Debug, thiserror::Error)]
pub enum EntryServiceError {
    /// Entry not found
    #[error("Entry not found: {0}")]
    NotFound(i64),

    /// The user may not see or modify this entry
    #[error("Access denied")]
    Forbidden,

    /// Validation error (malformed numeric input)
    #[error("Validation error: {0}")]
    ValidationError(String),

    /// Internal error
    #[error("Internal error: {0}")]
    InternalError(#[from] anyhow::Error),
}

/// Service for managing delivery entries
pub struct EntryService {
    repo: Arc<dyn EntryRepository>,
}

impl EntryService {
    /// Create a new entry service
    pub fn new(repo: Arc<dyn EntryRepository>) -> Self {
        Self { repo }
    }

    /// Create a new entry owned by the calling user.
    ///
    /// The owner is always the caller; the payload carries no owner field
    /// and could not override it if it did.
    pub async fn create(
        &self,
        user: &User,
        input: CreateEntryInput,
    ) -> Result<DeliveryEntry, EntryServiceError> {
        validate_amounts(
            &[
                ("challan_amount", input.challan_amount),
                ("delivered_amount", input.delivered_amount),
                ("pending_amount", input.pending_amount),
            ],
            &[
                ("vehicle_required", input.vehicle_required),
                ("vehicle_confirmed", input.vehicle_confirmed),
                ("vehicle_missing", input.vehicle_missing),
            ],
        )?;

        let entry = DeliveryEntry::new(user.id, input);

        let created = self
            .repo
            .create(&entry)
            .await
            .context("Failed to create entry")?;

        Ok(created)
    }

    /// List all entries visible under the caller's scope, newest date first.
    pub async fn list_for(&self, user: &User) -> Result<Vec<DeliveryEntry>, EntryServiceError> {
        let scope = scope_for(user);
        let entries = self
            .repo
            .list(scope.owner_filter())
            .await
            .context("Failed to list entries")?;

        Ok(entries)
    }

    /// Get a single entry.
    ///
    /// Absent ids report not-found before any ownership consideration;
    /// entries outside the caller's scope report access denied.
    pub async fn get(&self, user: &User, id: i64) -> Result<DeliveryEntry, EntryServiceError> {
        let entry = self
            .repo
            .get_by_id(id)
            .await
            .context("Failed to get entry")?
            .ok_or(EntryServiceError::NotFound(id))?;

        if !scope_for(user).permits(entry.user_id) {
            return Err(EntryServiceError::Forbidden);
        }

        Ok(entry)
    }

    /// Partially update an entry.
    ///
    /// Only supplied fields change; `updated_at` is refreshed. Last write
    /// wins across concurrent edits of the same entry.
    pub async fn update(
        &self,
        user: &User,
        id: i64,
        patch: UpdateEntryInput,
    ) -> Result<DeliveryEntry, EntryServiceError> {
        let mut entry = self
            .repo
            .get_by_id(id)
            .await
            .context("Failed to get entry")?
            .ok_or(EntryServiceError::NotFound(id))?;

        authorize_write(user, entry.user_id).map_err(|_| EntryServiceError::Forbidden)?;

        validate_patch(&patch)?;

        entry.apply(patch);

        let updated = self
            .repo
            .update(&entry)
            .await
            .context("Failed to update entry")?;

        Ok(updated)
    }

    /// Delete an entry.
    pub async fn delete(&self, user: &User, id: i64) -> Result<(), EntryServiceError> {
        let entry = self
            .repo
            .get_by_id(id)
            .await
            .context("Failed to get entry")?
            .ok_or(EntryServiceError::NotFound(id))?;

        authorize_write(user, entry.user_id).map_err(|_| EntryServiceError::Forbidden)?;

        self.repo
            .delete(entry.id)
            .await
            .context("Failed to delete entry")?;

        Ok(())
    }
}

fn validate_amounts(
    amounts: &[(&str, f64)],
    counts: &[(&str, i64)],
) -> Result<(), EntryServiceError> {
    for (field, value) in amounts {
        if !value.is_finite() || *value < 0.0 {
            return Err(EntryServiceError::ValidationError(format!(
                "{} must be a non-negative number",
                field
            )));
        }
    }
    for (field, value) in counts {
        if *value < 0 {
            return Err(EntryServiceError::ValidationError(format!(
                "{} must be non-negative",
                field
            )));
        }
    }
    Ok(())
}

fn validate_patch(patch: &UpdateEntryInput) -> Result<(), EntryServiceError> {
    let amounts = [
        ("challan_amount", patch.challan_amount),
        ("delivered_amount", patch.delivered_amount),
        ("pending_amount", patch.pending_amount),
    ];
    let counts = [
        ("vehicle_required", patch.vehicle_required),
        ("vehicle_confirmed", patch.vehicle_confirmed),
        ("vehicle_missing", patch.vehicle_missing),
    ];

    let present_amounts: Vec<(&str, f64)> = amounts
        .iter()
        .filter_map(|(f, v)| v.map(|v| (*f, v)))
        .collect();
    let present_counts: Vec<(&str, i64)> = counts
        .iter()
        .filter_map(|(f, v)| v.map(|v| (*f, v)))
        .collect();

    validate_amounts(&present_amounts, &present_counts)
}


#[cfg(test)]
mod property_tests {
    use super::*;
    use crate::db::repositories::SqlxEntryRepository;
    use crate::db::{create_test_pool, migrations, DynDatabasePool};
    use crate::models::UserRole;
    use chrono::{Duration, NaiveDate, Utc};
    use proptest::prelude::*;

    async fn setup() -> (DynDatabasePool, EntryService) {
        let pool = create_test_pool().await.expect("Failed to create test pool");
        migrations::run_migrations(&pool)
            .await
            .expect("Failed to run migrations");
        let service = EntryService::new(SqlxEntryRepository::boxed(pool.clone()));
        (pool, service)
    }

    async fn insert_user(pool: &DynDatabasePool, id: i64, role: UserRole) -> User {
        let now = Utc::now();
        sqlx::query(
            "INSERT INTO users (id, email, name, picture, role, created_at) VALUES (?, ?, ?, ?, ?, ?)",
        )
        .bind(id)
        .bind(format!("user{}@example.com", id))
        .bind(format!("User {}", id))
        .bind("")
        .bind(role.to_string())
        .bind(now)
        .execute(pool.as_sqlite().unwrap())
        .await
        .expect("Failed to insert test user");

        let mut user = User::new(
            format!("user{}@example.com", id),
            format!("User {}", id),
            String::new(),
            role,
        );
        user.id = id;
        user
    }

    fn input_strategy() -> impl Strategy<Value = CreateEntryInput> {
        (0u32..30, 0.0f64..10_000.0, 0.0f64..10_000.0, 0i64..20).prop_map(
            |(day_offset, challan, delivered, vehicles)| CreateEntryInput {
                date: NaiveDate::from_ymd_opt(2024, 5, 1).unwrap()
                    + Duration::days(day_offset as i64),
                challan_amount: challan,
                delivered_amount: delivered,
                pending_amount: (challan - delivered).max(0.0),
                vehicle_required: vehicles,
                vehicle_confirmed: vehicles,
                vehicle_missing: 0,
                notes: String::new(),
            },
        )
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(10))]

        /// Listing under a non-admin scope never yields a foreign entry,
        /// whatever the mix of owners in the store.
        #[test]
        fn non_admin_listing_never_leaks_foreign_entries(
            own in prop::collection::vec(input_strategy(), 0..5),
            foreign in prop::collection::vec(input_strategy(), 0..5),
        ) {
            let rt = tokio::runtime::Runtime::new().unwrap();
            let result: Result<(), TestCaseError> = rt.block_on(async {
                let (pool, service) = setup().await;
                let alice = insert_user(&pool, 1, UserRole::User).await;
                let bob = insert_user(&pool, 2, UserRole::User).await;

                let own_count = own.len();
                for input in own {
                    service.create(&alice, input).await.expect("create failed");
                }
                for input in foreign {
                    service.create(&bob, input).await.expect("create failed");
                }

                let listed = service.list_for(&alice).await.expect("list failed");
                prop_assert_eq!(listed.len(), own_count);
                prop_assert!(listed.iter().all(|e| e.user_id == alice.id));
                Ok(())
            });
            result?;
        }
    }
}
