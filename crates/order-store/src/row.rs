//! Persisted record layouts.

use chrono::{DateTime, Utc};
use common::{OrderId, OrderItemId, Status, Version};
use serde::{Deserialize, Serialize};

/// A row of the `orders` table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderRow {
    pub id: OrderId,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub received: DateTime<Utc>,
    pub status: Status,
    pub version: Version,
}

/// A row of the `order_items` table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderItemRow {
    pub id: OrderItemId,
    pub order_id: OrderId,
    pub sku: String,
    pub email: String,
    pub status: Status,
    pub version: Version,
}

impl OrderItemRow {
    /// Returns true if both rows share the `(order, sku, email)` key.
    pub fn same_line(&self, other: &OrderItemRow) -> bool {
        self.order_id == other.order_id && self.sku == other.sku && self.email == other.email
    }
}
