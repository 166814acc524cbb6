//! `pantry-core` — shared domain primitives.
//!
//! Identifiers and the domain error model. No IO lives here.

pub mod error;
pub mod id;

pub use error::{DomainError, DomainResult};
pub use id::{ItemId, UserId};
