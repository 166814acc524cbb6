use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{PoisonError, RwLock};

use async_trait::async_trait;

use pantry_core::{ItemId, UserId};
use pantry_inventory::FoodItem;

use super::r#trait::{FetchError, ItemSource, ItemStore};

/// In-memory item store.
///
/// Intended for tests/dev. Keeps insertion order and can be switched into a
/// failing mode to simulate an unreachable backend.
#[derive(Debug, Default)]
pub struct InMemoryItemStore {
    items: RwLock<Vec<FoodItem>>,
    failure: RwLock<Option<FetchError>>,
    fetches: AtomicUsize,
}

impl InMemoryItemStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_items(items: impl IntoIterator<Item = FoodItem>) -> Self {
        let store = Self::new();
        for item in items {
            store.insert(item);
        }
        store
    }

    /// Insert or replace an item by id.
    pub fn insert(&self, item: FoodItem) {
        let mut items = self.items.write().unwrap_or_else(PoisonError::into_inner);
        match items.iter_mut().find(|i| i.id == item.id) {
            Some(existing) => *existing = item,
            None => items.push(item),
        }
    }

    pub fn snapshot(&self) -> Vec<FoodItem> {
        self.items
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Make every subsequent call fail with `error` (or succeed again with `None`).
    pub fn set_failure(&self, error: Option<FetchError>) {
        *self.failure.write().unwrap_or_else(PoisonError::into_inner) = error;
    }

    /// Number of `fetch_user_items` calls served so far (including failed ones).
    pub fn fetch_count(&self) -> usize {
        self.fetches.load(Ordering::SeqCst)
    }

    fn check_available(&self) -> Result<(), FetchError> {
        match self
            .failure
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .as_ref()
        {
            Some(err) => Err(err.clone()),
            None => Ok(()),
        }
    }
}

#[async_trait]
impl ItemSource for InMemoryItemStore {
    async fn fetch_user_items(&self, user_id: UserId) -> Result<Vec<FoodItem>, FetchError> {
        self.fetches.fetch_add(1, Ordering::SeqCst);
        self.check_available()?;
        Ok(self
            .items
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .filter(|i| i.user_id == user_id)
            .cloned()
            .collect())
    }
}

#[async_trait]
impl ItemStore for InMemoryItemStore {
    async fn get_item(&self, item_id: ItemId) -> Result<Option<FoodItem>, FetchError> {
        self.check_available()?;
        Ok(self
            .items
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .find(|i| i.id == item_id)
            .cloned())
    }

    async fn update_item(&self, item: FoodItem) -> Result<FoodItem, FetchError> {
        self.check_available()?;
        let mut items = self.items.write().unwrap_or_else(PoisonError::into_inner);
        let existing = items
            .iter_mut()
            .find(|i| i.id == item.id)
            .ok_or_else(|| FetchError::backend(format!("item {} does not exist", item.id)))?;
        *existing = item.clone();
        Ok(item)
    }

    async fn delete_item(&self, item_id: ItemId) -> Result<(), FetchError> {
        self.check_available()?;
        let mut items = self.items.write().unwrap_or_else(PoisonError::into_inner);
        let before = items.len();
        items.retain(|i| i.id != item_id);
        if items.len() == before {
            return Err(FetchError::backend(format!("item {item_id} does not exist")));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use pantry_inventory::{FoodCategory, Quantity};

    fn item(owner: UserId, name: &str) -> FoodItem {
        let d = NaiveDate::from_ymd_opt(2026, 10, 18).unwrap();
        FoodItem::new(owner, name, FoodCategory::Pantry, Quantity::new(1.0, "pcs"), d, d)
    }

    #[tokio::test]
    async fn fetch_returns_only_the_users_items() {
        let alice = UserId::new();
        let bob = UserId::new();
        let store = InMemoryItemStore::with_items([item(alice, "Flour"), item(bob, "Sugar")]);

        let items = store.fetch_user_items(alice).await.unwrap();
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].name, "Flour");
        assert_eq!(store.fetch_count(), 1);
    }

    #[tokio::test]
    async fn failure_mode_fails_every_call_until_cleared() {
        let alice = UserId::new();
        let flour = item(alice, "Flour");
        let store = InMemoryItemStore::with_items([flour.clone()]);

        store.set_failure(Some(FetchError::network("connection refused")));
        assert!(store.fetch_user_items(alice).await.is_err());
        assert!(store.get_item(flour.id).await.is_err());
        assert!(store.delete_item(flour.id).await.is_err());

        store.set_failure(None);
        assert_eq!(store.fetch_user_items(alice).await.unwrap().len(), 1);
        assert_eq!(store.fetch_count(), 2);
    }

    #[tokio::test]
    async fn update_and_delete_unknown_items_fail() {
        let store = InMemoryItemStore::new();
        let ghost = item(UserId::new(), "Ghost");
        assert!(matches!(
            store.update_item(ghost.clone()).await,
            Err(FetchError::Backend(_))
        ));
        assert!(matches!(
            store.delete_item(ghost.id).await,
            Err(FetchError::Backend(_))
        ));
    }
}
