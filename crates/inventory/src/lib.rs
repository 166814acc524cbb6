//! Food inventory domain module.
//!
//! Items, expiry classification and the analytics roll-up, implemented as
//! deterministic domain logic (no IO, no clock, no storage).

pub mod expiry;
pub mod item;
pub mod summary;

pub use expiry::{ExpiryStatus, classify, days_remaining, status_color};
pub use item::{FoodCategory, FoodItem, FoodItemPatch, Quantity};
pub use summary::{ExpirySummary, UpcomingExpiry};
