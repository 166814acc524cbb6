//! `pantry-alerts`
//!
//! **Responsibility:** decide which expiry alerts a user should receive.
//!
//! This crate is pure:
//! - It never fetches items or talks to a notification facility.
//! - It never reads the clock; `now` is always passed in.
//! - It owns the per-session de-duplication state ([`AlertSession`]).
//!
//! Timers, cancellation and delivery live in `pantry-infra`.

pub mod alert;
pub mod scope;
pub mod session;

pub use alert::ExpiryAlert;
pub use scope::AlertScope;
pub use session::{AlertSession, PassOutcome};
