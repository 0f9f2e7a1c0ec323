//! Services layer - Business logic
//!
//! This module contains all business logic services for the Dispatchboard
//! service. Services are responsible for:
//! - Implementing business rules
//! - Coordinating between repositories and external collaborators
//! - Handling validation and error cases

pub mod access;
pub mod aggregate;
pub mod auth;
pub mod entry;
pub mod identity;

pub use access::{authorize_write, scope_for, AccessError, EntryScope};
pub use aggregate::{
    compute_daily_trend, compute_summary, DailyBucket, DashboardSummary, RECENT_WINDOW_DAYS,
    TREND_WINDOW_DAYS,
};
pub use auth::{AuthService, AuthServiceError};
pub use entry::{EntryService, EntryServiceError};
pub use identity::{HttpIdentityProvider, IdentityError, IdentityProfile, IdentityProvider};
