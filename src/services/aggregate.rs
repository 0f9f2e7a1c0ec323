//! Aggregation engine
//!
//! Turns an already-scoped, finite collection of delivery entries into a
//! KPI summary and a chronological daily trend. Both computations are pure
//! functions of their input snapshot and the supplied clock; they hold no
//! state and never touch the database.

use chrono::{DateTime, Duration, NaiveDate, Utc};
use serde::Serialize;
use std::collections::BTreeMap;

use crate::models::DeliveryEntry;

/// Window for `recent_entries_count`: the 7 calendar dates ending today
pub const RECENT_WINDOW_DAYS: i64 = 7;

/// Default trend window: the trailing 30 calendar dates
pub const TREND_WINDOW_DAYS: i64 = 30;

/// Dashboard KPI summary
///
/// Field names are a stable contract with dashboard consumers.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct DashboardSummary {
    pub total_challan_amount: f64,
    pub total_delivered_amount: f64,
    pub total_pending_amount: f64,
    pub total_vehicle_required: i64,
    pub total_vehicle_confirmed: i64,
    pub total_vehicle_missing: i64,
    /// delivered / challan as a percentage, 0 when nothing was billed
    pub delivery_rate: f64,
    /// confirmed / required as a percentage, 0 when nothing was required
    pub vehicle_utilization_rate: f64,
    pub recent_entries_count: i64,
}

/// One day's aggregated totals in the trend view
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DailyBucket {
    pub date: NaiveDate,
    pub challan_amount: f64,
    pub delivered_amount: f64,
    pub pending_amount: f64,
    pub vehicle_required: i64,
    pub vehicle_confirmed: i64,
    pub vehicle_missing: i64,
}

impl DailyBucket {
    fn empty(date: NaiveDate) -> Self {
        Self {
            date,
            challan_amount: 0.0,
            delivered_amount: 0.0,
            pending_amount: 0.0,
            vehicle_required: 0,
            vehicle_confirmed: 0,
            vehicle_missing: 0,
        }
    }
}

/// Compute the KPI summary over a collection of entries.
///
/// All sums are field-wise. `recent_entries_count` counts entries whose
/// date falls within the 7 calendar dates ending at `now`. Rates are
/// percentages with a zero-guard: an empty or zero-denominator collection
/// yields 0, never a division fault.
pub fn compute_summary(entries: &[DeliveryEntry], now: DateTime<Utc>) -> DashboardSummary {
    let mut summary = DashboardSummary::default();

    let today = now.date_naive();
    let recent_start = today - Duration::days(RECENT_WINDOW_DAYS - 1);

    for entry in entries {
        summary.total_challan_amount += entry.challan_amount;
        summary.total_delivered_amount += entry.delivered_amount;
        summary.total_pending_amount += entry.pending_amount;
        summary.total_vehicle_required += entry.vehicle_required;
        summary.total_vehicle_confirmed += entry.vehicle_confirmed;
        summary.total_vehicle_missing += entry.vehicle_missing;

        if entry.date >= recent_start && entry.date <= today {
            summary.recent_entries_count += 1;
        }
    }

    if summary.total_challan_amount > 0.0 {
        summary.delivery_rate =
            summary.total_delivered_amount / summary.total_challan_amount * 100.0;
    }
    if summary.total_vehicle_required > 0 {
        summary.vehicle_utilization_rate = summary.total_vehicle_confirmed as f64
            / summary.total_vehicle_required as f64
            * 100.0;
    }

    summary
}

/// Compute the daily trend over a collection of entries.
///
/// Entries are grouped by calendar date with field-wise sums per bucket,
/// restricted to the `window_days` calendar dates ending at `now`. Buckets
/// come back in ascending date order. Dates without entries are omitted,
/// not zero-filled; callers rendering a continuous axis interpolate the
/// gaps themselves.
pub fn compute_daily_trend(
    entries: &[DeliveryEntry],
    window_days: i64,
    now: DateTime<Utc>,
) -> Vec<DailyBucket> {
    let today = now.date_naive();
    let window_start = today - Duration::days(window_days - 1);

    let mut buckets: BTreeMap<NaiveDate, DailyBucket> = BTreeMap::new();

    for entry in entries {
        if entry.date < window_start || entry.date > today {
            continue;
        }

        let bucket = buckets
            .entry(entry.date)
            .or_insert_with(|| DailyBucket::empty(entry.date));
        bucket.challan_amount += entry.challan_amount;
        bucket.delivered_amount += entry.delivered_amount;
        bucket.pending_amount += entry.pending_amount;
        bucket.vehicle_required += entry.vehicle_required;
        bucket.vehicle_confirmed += entry.vehicle_confirmed;
        bucket.vehicle_missing += entry.vehicle_missing;
    }

    buckets.into_values().collect()
}
