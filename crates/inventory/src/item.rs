use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use pantry_core::{DomainError, DomainResult, ItemId, UserId};

/// Food category as stored by the backend.
///
/// Unknown category strings deserialize to `Other` so a newer backend never
/// breaks an older reader.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FoodCategory {
    Dairy,
    Meat,
    Seafood,
    Produce,
    Bakery,
    Frozen,
    Pantry,
    Beverages,
    Leftovers,
    #[serde(other)]
    Other,
}

impl FoodCategory {
    pub const ALL: [FoodCategory; 10] = [
        FoodCategory::Dairy,
        FoodCategory::Meat,
        FoodCategory::Seafood,
        FoodCategory::Produce,
        FoodCategory::Bakery,
        FoodCategory::Frozen,
        FoodCategory::Pantry,
        FoodCategory::Beverages,
        FoodCategory::Leftovers,
        FoodCategory::Other,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            FoodCategory::Dairy => "dairy",
            FoodCategory::Meat => "meat",
            FoodCategory::Seafood => "seafood",
            FoodCategory::Produce => "produce",
            FoodCategory::Bakery => "bakery",
            FoodCategory::Frozen => "frozen",
            FoodCategory::Pantry => "pantry",
            FoodCategory::Beverages => "beverages",
            FoodCategory::Leftovers => "leftovers",
            FoodCategory::Other => "other",
        }
    }
}

impl core::fmt::Display for FoodCategory {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Amount of an item plus its free-form unit ("pcs", "g", "l", ...).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Quantity {
    pub amount: f64,
    pub unit: String,
}

impl Quantity {
    pub fn new(amount: f64, unit: impl Into<String>) -> Self {
        Self {
            amount,
            unit: unit.into(),
        }
    }
}

impl core::fmt::Display for Quantity {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "{} {}", self.amount, self.unit)
    }
}

/// A perishable item in a user's inventory.
///
/// Owned by the backend store. Expiry logic only reads `expiry_date` and
/// `category`; nothing in this workspace mutates an item in place except the
/// explicit patch path used by the detail view.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FoodItem {
    pub id: ItemId,
    pub user_id: UserId,
    pub name: String,
    pub category: FoodCategory,
    pub quantity: Quantity,
    pub expiry_date: NaiveDate,
    pub added_date: NaiveDate,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub barcode: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
}

impl FoodItem {
    pub fn new(
        user_id: UserId,
        name: impl Into<String>,
        category: FoodCategory,
        quantity: Quantity,
        expiry_date: NaiveDate,
        added_date: NaiveDate,
    ) -> Self {
        Self {
            id: ItemId::new(),
            user_id,
            name: name.into(),
            category,
            quantity,
            expiry_date,
            added_date,
            notes: None,
            barcode: None,
            image_url: None,
        }
    }

    pub fn is_owned_by(&self, user_id: UserId) -> bool {
        self.user_id == user_id
    }

    /// Check the invariants a stored item must hold.
    pub fn validate(&self) -> DomainResult<()> {
        if self.name.trim().is_empty() {
            return Err(DomainError::validation("name cannot be empty"));
        }
        if !self.quantity.amount.is_finite() || self.quantity.amount < 0.0 {
            return Err(DomainError::validation(
                "quantity must be a finite, non-negative number",
            ));
        }
        if self.quantity.unit.trim().is_empty() {
            return Err(DomainError::validation("unit cannot be empty"));
        }
        Ok(())
    }

    /// Return a copy of this item with `patch` applied and validated.
    ///
    /// Identity, owner and `added_date` are never changed by a patch.
    pub fn patched(&self, patch: &FoodItemPatch) -> DomainResult<FoodItem> {
        let mut next = self.clone();
        if let Some(name) = &patch.name {
            next.name = name.trim().to_string();
        }
        if let Some(category) = patch.category {
            next.category = category;
        }
        if let Some(quantity) = &patch.quantity {
            next.quantity = quantity.clone();
        }
        if let Some(expiry_date) = patch.expiry_date {
            next.expiry_date = expiry_date;
        }
        if let Some(notes) = &patch.notes {
            next.notes = notes.clone();
        }
        if let Some(barcode) = &patch.barcode {
            next.barcode = barcode.clone();
        }
        if let Some(image_url) = &patch.image_url {
            next.image_url = image_url.clone();
        }
        next.validate()?;
        Ok(next)
    }
}

/// Edit request for an item.
///
/// `None` leaves a field untouched. For optional fields, `Some(None)` clears
/// the value.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FoodItemPatch {
    pub name: Option<String>,
    pub category: Option<FoodCategory>,
    pub quantity: Option<Quantity>,
    pub expiry_date: Option<NaiveDate>,
    pub notes: Option<Option<String>>,
    pub barcode: Option<Option<String>>,
    pub image_url: Option<Option<String>>,
}

impl FoodItemPatch {
    pub fn is_empty(&self) -> bool {
        *self == FoodItemPatch::default()
    }
}
