use async_trait::async_trait;
use thiserror::Error;

use pantry_core::{ItemId, UserId};
use pantry_inventory::FoodItem;

/// Failure talking to the backend data API.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum FetchError {
    /// Transport failure (unreachable, timeout, connection reset).
    #[error("network error: {0}")]
    Network(String),

    /// The backend rejected the caller's credentials.
    #[error("not authorized: {0}")]
    Auth(String),

    /// The backend answered but the response was unusable.
    #[error("backend error: {0}")]
    Backend(String),
}

impl FetchError {
    pub fn network(msg: impl Into<String>) -> Self {
        Self::Network(msg.into())
    }

    pub fn auth(msg: impl Into<String>) -> Self {
        Self::Auth(msg.into())
    }

    pub fn backend(msg: impl Into<String>) -> Self {
        Self::Backend(msg.into())
    }
}

/// Read access to a user's inventory.
#[async_trait]
pub trait ItemSource: Send + Sync + 'static {
    /// All items currently stored for `user_id`.
    async fn fetch_user_items(&self, user_id: UserId) -> Result<Vec<FoodItem>, FetchError>;
}

/// Full item CRUD, used by interactive actions.
///
/// Ownership is not checked here; callers decide who may see or change an item.
#[async_trait]
pub trait ItemStore: ItemSource {
    async fn get_item(&self, item_id: ItemId) -> Result<Option<FoodItem>, FetchError>;

    /// Replace a stored item. Fails with `Backend` when the item does not exist.
    async fn update_item(&self, item: FoodItem) -> Result<FoodItem, FetchError>;

    async fn delete_item(&self, item_id: ItemId) -> Result<(), FetchError>;
}
