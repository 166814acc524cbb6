use std::path::{Path, PathBuf};

use async_trait::async_trait;

use pantry_core::UserId;
use pantry_inventory::FoodItem;

use super::r#trait::{FetchError, ItemSource};

/// Read-only item source backed by a JSON array of items on disk.
///
/// The file is re-read on every fetch so edits show up on the next pass.
/// Items are validated; invalid entries fail the whole fetch.
#[derive(Debug, Clone)]
pub struct JsonFileItemSource {
    path: PathBuf,
}

impl JsonFileItemSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl ItemSource for JsonFileItemSource {
    async fn fetch_user_items(&self, user_id: UserId) -> Result<Vec<FoodItem>, FetchError> {
        let raw = tokio::fs::read_to_string(&self.path).await.map_err(|e| {
            FetchError::backend(format!("failed to read {}: {e}", self.path.display()))
        })?;

        let items: Vec<FoodItem> = serde_json::from_str(&raw).map_err(|e| {
            FetchError::backend(format!("failed to parse {}: {e}", self.path.display()))
        })?;

        let mut owned = Vec::with_capacity(items.len());
        for item in items.into_iter().filter(|i| i.user_id == user_id) {
            item.validate()
                .map_err(|e| FetchError::backend(format!("item {}: {e}", item.id)))?;
            owned.push(item);
        }
        Ok(owned)
    }
}
