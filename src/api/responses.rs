//! Shared API response types
//!
//! Common response structures used across multiple API endpoints to keep
//! the wire shapes consistent.

use serde::{Deserialize, Serialize};

use crate::models::{DeliveryEntry, User};

/// User info returned by auth and admin endpoints
#[derive(Debug, Serialize, Deserialize)]
pub struct UserResponse {
    pub id: i64,
    pub email: String,
    pub name: String,
    pub picture: String,
    pub role: String,
    pub created_at: String,
}

impl From<User> for UserResponse {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            email: user.email,
            name: user.name,
            picture: user.picture,
            role: user.role.to_string(),
            created_at: user.created_at.to_rfc3339(),
        }
    }
}

/// Delivery entry as returned by the API
#[derive(Debug, Serialize, Deserialize)]
pub struct EntryResponse {
    pub id: i64,
    pub user_id: i64,
    pub date: String,
    pub challan_amount: f64,
    pub delivered_amount: f64,
    pub pending_amount: f64,
    pub vehicle_required: i64,
    pub vehicle_confirmed: i64,
    pub vehicle_missing: i64,
    pub notes: String,
    pub created_at: String,
    pub updated_at: String,
}

impl From<DeliveryEntry> for EntryResponse {
    fn from(entry: DeliveryEntry) -> Self {
        Self {
            id: entry.id,
            user_id: entry.user_id,
            date: entry.date.to_string(),
            challan_amount: entry.challan_amount,
            delivered_amount: entry.delivered_amount,
            pending_amount: entry.pending_amount,
            vehicle_required: entry.vehicle_required,
            vehicle_confirmed: entry.vehicle_confirmed,
            vehicle_missing: entry.vehicle_missing,
            notes: entry.notes,
            created_at: entry.created_at.to_rfc3339(),
            updated_at: entry.updated_at.to_rfc3339(),
        }
    }
}
