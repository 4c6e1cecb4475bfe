use async_trait::async_trait;

use crate::{OrderId, OrderItemId, OrderItemRow, OrderRow, Result, StoreError, Version};

/// Core trait for order store implementations.
///
/// The store is the only component that touches storage. Status changes go
/// through the `save_*_if_version` methods, which write only if the stored
/// version still equals the version the caller read.
/// All implementations must be thread-safe (Send + Sync).
#[async_trait]
pub trait OrderStore: Send + Sync {
    /// Inserts a new order.
    ///
    /// Fails with `DuplicateOrder` if an order with the same id exists.
    async fn insert_order(&self, order: OrderRow) -> Result<OrderId>;

    /// Retrieves an order, failing with `NotFound` if it doesn't exist.
    async fn get_order(&self, id: OrderId) -> Result<OrderRow>;

    /// Persists `order.status` if the stored version equals `expected`.
    ///
    /// On success the stored version becomes `expected.next()`, which is
    /// returned. Fails with `ConcurrentModification` if another writer got
    /// there first.
    async fn save_order_if_version(&self, order: &OrderRow, expected: Version) -> Result<Version>;

    /// Deletes an order.
    ///
    /// Refused with `ReferencedByChildren` while any item references it.
    async fn delete_order(&self, id: OrderId) -> Result<()>;

    /// Inserts a new item.
    ///
    /// Fails with `OrderNotFound` if the referenced order doesn't exist and
    /// with `DuplicateItem` if the `(order, sku, email)` key is taken.
    async fn insert_order_item(&self, item: OrderItemRow) -> Result<OrderItemId>;

    /// Retrieves an item, failing with `NotFound` if it doesn't exist.
    async fn get_order_item(&self, id: OrderItemId) -> Result<OrderItemRow>;

    /// Persists `item.status` if the stored version equals `expected`.
    async fn save_order_item_if_version(
        &self,
        item: &OrderItemRow,
        expected: Version,
    ) -> Result<Version>;

    /// Retrieves all items of an order, ordered by sku then email.
    async fn get_items_for_order(&self, order_id: OrderId) -> Result<Vec<OrderItemRow>>;
}

/// Extension trait providing convenience methods for order stores.
#[async_trait]
pub trait OrderStoreExt: OrderStore {
    /// Retrieves an order, returning None instead of `NotFound`.
    async fn find_order(&self, id: OrderId) -> Result<Option<OrderRow>> {
        match self.get_order(id).await {
            Ok(order) => Ok(Some(order)),
            Err(StoreError::NotFound { .. }) => Ok(None),
            Err(e) => Err(e),
        }
    }

    /// Checks if an order exists.
    async fn order_exists(&self, id: OrderId) -> Result<bool> {
        Ok(self.find_order(id).await?.is_some())
    }
}

// Blanket implementation for all OrderStore implementations
impl<T: OrderStore + ?Sized> OrderStoreExt for T {}
