//! Backend data API boundary.
//!
//! The item store is a collaborator owned by another service. This module
//! defines the contract the scheduler and detail view consume, plus adapters
//! for tests and for running against a local JSON export.

pub mod in_memory;
pub mod json_file;
pub mod r#trait;

pub use in_memory::InMemoryItemStore;
pub use json_file::JsonFileItemSource;
pub use r#trait::{FetchError, ItemSource, ItemStore};
