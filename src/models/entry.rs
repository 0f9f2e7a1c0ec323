//! Delivery entry model
//!
//! A delivery entry is one day's logistics record for one user: billed
//! (challan), delivered and pending amounts, plus vehicle counts.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// One logistics record for a given date and owner.
///
/// `pending_amount` is conceptually `challan_amount - delivered_amount`, but
/// all three are accepted as independently supplied values; no cross-field
/// check is performed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeliveryEntry {
    /// Unique identifier
    pub id: i64,
    /// Owning user ID
    pub user_id: i64,
    /// Calendar date this entry describes
    pub date: NaiveDate,
    /// Billed/invoiced amount
    pub challan_amount: f64,
    /// Amount delivered
    pub delivered_amount: f64,
    /// Amount still pending
    pub pending_amount: f64,
    /// Vehicles required for the day
    pub vehicle_required: i64,
    /// Vehicles confirmed
    pub vehicle_confirmed: i64,
    /// Vehicles missing
    pub vehicle_missing: i64,
    /// Free-text notes (may be empty)
    pub notes: String,
    /// Creation timestamp
    pub created_at: DateTime<Utc>,
    /// Last update timestamp
    pub updated_at: DateTime<Utc>,
}

impl DeliveryEntry {
    /// Create a new entry owned by `user_id` from the given input.
    ///
    /// The id is assigned by the database on insert.
    pub fn new(user_id: i64, input: CreateEntryInput) -> Self {
        let now = Utc::now();
        Self {
            id: 0,
            user_id,
            date: input.date,
            challan_amount: input.challan_amount,
            delivered_amount: input.delivered_amount,
            pending_amount: input.pending_amount,
            vehicle_required: input.vehicle_required,
            vehicle_confirmed: input.vehicle_confirmed,
            vehicle_missing: input.vehicle_missing,
            notes: input.notes,
            created_at: now,
            updated_at: now,
        }
    }

    /// Apply a partial update, refreshing `updated_at`.
    ///
    /// Only fields present in the patch are changed; ownership and creation
    /// timestamp are never touched.
    pub fn apply(&mut self, patch: UpdateEntryInput) {
        if let Some(date) = patch.date {
            self.date = date;
        }
        if let Some(v) = patch.challan_amount {
            self.challan_amount = v;
        }
        if let Some(v) = patch.delivered_amount {
            self.delivered_amount = v;
        }
        if let Some(v) = patch.pending_amount {
            self.pending_amount = v;
        }
        if let Some(v) = patch.vehicle_required {
            self.vehicle_required = v;
        }
        if let Some(v) = patch.vehicle_confirmed {
            self.vehicle_confirmed = v;
        }
        if let Some(v) = patch.vehicle_missing {
            self.vehicle_missing = v;
        }
        if let Some(notes) = patch.notes {
            self.notes = notes;
        }
        self.updated_at = Utc::now();
    }
}

/// Input for creating a delivery entry
#[derive(Debug, Clone, Deserialize)]
pub struct CreateEntryInput {
    pub date: NaiveDate,
    pub challan_amount: f64,
    pub delivered_amount: f64,
    pub pending_amount: f64,
    #[serde(default)]
    pub vehicle_required: i64,
    #[serde(default)]
    pub vehicle_confirmed: i64,
    #[serde(default)]
    pub vehicle_missing: i64,
    #[serde(default)]
    pub notes: String,
}

/// Input for partially updating a delivery entry
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateEntryInput {
    pub date: Option<NaiveDate>,
    pub challan_amount: Option<f64>,
    pub delivered_amount: Option<f64>,
    pub pending_amount: Option<f64>,
    pub vehicle_required: Option<i64>,
    pub vehicle_confirmed: Option<i64>,
    pub vehicle_missing: Option<i64>,
    pub notes: Option<String>,
}
