//! Item detail coordinator.
//!
//! Fetches one item for the signed-in user, decorates it with its expiry
//! status and delegates edits/deletes to the backend. Every failed action
//! produces exactly one failure toast and leaves the stored item untouched.

use std::sync::{Arc, Mutex, PoisonError};

use serde::Serialize;
use thiserror::Error;
use tracing::{info, warn};

use pantry_core::{DomainError, ItemId, UserId};
use pantry_inventory::{ExpiryStatus, FoodItem, FoodItemPatch, classify, days_remaining, status_color};

use crate::backend::{FetchError, ItemStore};
use crate::clock::Clock;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DetailError {
    /// Missing, or owned by someone else. The two are indistinguishable to the caller.
    #[error("item not found")]
    NotFound,

    #[error(transparent)]
    Validation(DomainError),

    #[error(transparent)]
    Fetch(#[from] FetchError),
}

impl DetailError {
    /// Where the view should go after this failure.
    pub fn navigation(&self) -> Navigation {
        match self {
            DetailError::NotFound => Navigation::Inventory,
            DetailError::Validation(_) | DetailError::Fetch(_) => Navigation::Stay,
        }
    }
}

impl From<DomainError> for DetailError {
    fn from(err: DomainError) -> Self {
        match err {
            DomainError::NotFound => DetailError::NotFound,
            other => DetailError::Validation(other),
        }
    }
}

/// Navigation target after an action.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Navigation {
    Stay,
    Inventory,
}

/// One-shot user-visible message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "message", rename_all = "lowercase")]
pub enum Toast {
    Success(String),
    Failure(String),
}

/// Channel for toasts.
pub trait Feedback: Send + Sync + 'static {
    fn toast(&self, toast: Toast);
}

/// In-memory feedback sink for tests/dev.
#[derive(Debug, Default)]
pub struct InMemoryFeedback {
    inner: Mutex<Vec<Toast>>,
}

impl InMemoryFeedback {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn all(&self) -> Vec<Toast> {
        self.inner
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

impl Feedback for InMemoryFeedback {
    fn toast(&self, toast: Toast) {
        self.inner
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(toast);
    }
}

/// Item plus its derived expiry presentation.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ItemDetail {
    pub item: FoodItem,
    pub status: ExpiryStatus,
    pub days_remaining: i64,
    pub color: &'static str,
}

/// Detail view for a single viewer.
pub struct DetailView {
    store: Arc<dyn ItemStore>,
    clock: Arc<dyn Clock>,
    feedback: Arc<dyn Feedback>,
    viewer: UserId,
}

impl DetailView {
    pub fn new(
        store: Arc<dyn ItemStore>,
        clock: Arc<dyn Clock>,
        feedback: Arc<dyn Feedback>,
        viewer: UserId,
    ) -> Self {
        Self {
            store,
            clock,
            feedback,
            viewer,
        }
    }

    /// Fetch and decorate an item.
    pub async fn load(&self, item_id: ItemId) -> Result<ItemDetail, DetailError> {
        let result = self.owned_item(item_id).await.map(|item| self.decorate(item));
        self.report(result, |_| None)
    }

    /// Apply `patch` to an owned item.
    pub async fn update(
        &self,
        item_id: ItemId,
        patch: &FoodItemPatch,
    ) -> Result<ItemDetail, DetailError> {
        let result = self.try_update(item_id, patch).await;
        self.report(result, |d| Some(format!("{} updated", d.item.name)))
    }

    /// Delete an owned item. On success the view returns to the inventory.
    pub async fn delete(&self, item_id: ItemId) -> Result<Navigation, DetailError> {
        let result = self.try_delete(item_id).await;
        self.report(result, |item| Some(format!("{} deleted", item.name)))
            .map(|_| Navigation::Inventory)
    }

    async fn try_update(
        &self,
        item_id: ItemId,
        patch: &FoodItemPatch,
    ) -> Result<ItemDetail, DetailError> {
        let item = self.owned_item(item_id).await?;
        let next = item.patched(patch)?;
        let saved = self.store.update_item(next).await?;
        info!(item = %item_id, user = %self.viewer, "item updated");
        Ok(self.decorate(saved))
    }

    async fn try_delete(&self, item_id: ItemId) -> Result<FoodItem, DetailError> {
        let item = self.owned_item(item_id).await?;
        self.store.delete_item(item_id).await?;
        info!(item = %item_id, user = %self.viewer, "item deleted");
        Ok(item)
    }

    async fn owned_item(&self, item_id: ItemId) -> Result<FoodItem, DetailError> {
        match self.store.get_item(item_id).await? {
            Some(item) if item.is_owned_by(self.viewer) => Ok(item),
            Some(_) => {
                warn!(item = %item_id, user = %self.viewer, "item belongs to another user");
                Err(DetailError::NotFound)
            }
            None => Err(DetailError::NotFound),
        }
    }

    fn decorate(&self, item: FoodItem) -> ItemDetail {
        let now = self.clock.now();
        let status = classify(item.expiry_date, now);
        ItemDetail {
            days_remaining: days_remaining(item.expiry_date, now),
            status,
            color: status_color(status),
            item,
        }
    }

    fn report<T>(
        &self,
        result: Result<T, DetailError>,
        success: impl FnOnce(&T) -> Option<String>,
    ) -> Result<T, DetailError> {
        match &result {
            Ok(value) => {
                if let Some(msg) = success(value) {
                    self.feedback.toast(Toast::Success(msg));
                }
            }
            Err(err) => self.feedback.toast(Toast::Failure(err.to_string())),
        }
        result
    }
}
