use serde::{Deserialize, Serialize};

use pantry_core::ItemId;
use pantry_inventory::ExpiryStatus;

/// One alert raised for an item entering an alertable status.
///
/// This is a notification payload, not a stored record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExpiryAlert {
    pub item_id: ItemId,
    pub item_name: String,
    pub status: ExpiryStatus,
    pub days_remaining: i64,
}

impl ExpiryAlert {
    pub fn title(&self) -> String {
        match self.status {
            ExpiryStatus::Expired => format!("Expired: {}", self.item_name),
            _ => format!("Expiring soon: {}", self.item_name),
        }
    }

    pub fn body(&self) -> String {
        let name = &self.item_name;
        match self.days_remaining {
            d if d < -1 => format!("{name} expired {} days ago.", -d),
            -1 => format!("{name} expired yesterday."),
            0 => format!("{name} expires today."),
            1 => format!("{name} expires tomorrow."),
            d => format!("{name} expires in {d} days."),
        }
    }
}
