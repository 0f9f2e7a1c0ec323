//! Data models
//!
//! This module contains all data structures used throughout the Dispatchboard
//! service. Models represent:
//! - Database entities (User, Session, DeliveryEntry)
//! - Input types for create/update operations

mod entry;
mod session;
mod user;

pub use entry::{CreateEntryInput, DeliveryEntry, UpdateEntryInput};
pub use session::Session;
pub use user::{User, UserRole};
