use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::{
    Entity, OrderId, OrderItemId, OrderItemRow, OrderRow, Result, StoreError, Version,
    store::OrderStore,
};

#[derive(Default)]
struct Tables {
    orders: HashMap<OrderId, OrderRow>,
    items: HashMap<OrderItemId, OrderItemRow>,
}

impl Tables {
    fn items_of(&self, order_id: OrderId) -> impl Iterator<Item = &OrderItemRow> {
        self.items.values().filter(move |i| i.order_id == order_id)
    }
}

/// In-memory order store implementation for testing.
///
/// Both tables sit behind one lock so that foreign key, uniqueness and
/// version checks are atomic with the write they guard, like the
/// constraints of the PostgreSQL implementation.
#[derive(Clone, Default)]
pub struct InMemoryOrderStore {
    tables: Arc<RwLock<Tables>>,
}

impl InMemoryOrderStore {
    /// Creates a new empty in-memory store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the number of stored orders.
    pub async fn order_count(&self) -> usize {
        self.tables.read().await.orders.len()
    }

    /// Returns the number of stored items.
    pub async fn item_count(&self) -> usize {
        self.tables.read().await.items.len()
    }
}

#[async_trait]
impl OrderStore for InMemoryOrderStore {
    async fn insert_order(&self, order: OrderRow) -> Result<OrderId> {
        let mut tables = self.tables.write().await;
        if tables.orders.contains_key(&order.id) {
            return Err(StoreError::DuplicateOrder(order.id));
        }
        let id = order.id;
        tables.orders.insert(id, order);
        Ok(id)
    }

    async fn get_order(&self, id: OrderId) -> Result<OrderRow> {
        let tables = self.tables.read().await;
        tables
            .orders
            .get(&id)
            .cloned()
            .ok_or_else(|| StoreError::not_found(Entity::Order, id))
    }

    async fn save_order_if_version(&self, order: &OrderRow, expected: Version) -> Result<Version> {
        let mut tables = self.tables.write().await;
        let stored = tables
            .orders
            .get_mut(&order.id)
            .ok_or_else(|| StoreError::not_found(Entity::Order, order.id))?;

        if stored.version != expected {
            return Err(StoreError::ConcurrentModification {
                entity: Entity::Order,
                id: order.id.to_string(),
                expected,
                actual: stored.version,
            });
        }

        stored.status = order.status;
        stored.version = expected.next();
        Ok(stored.version)
    }

    async fn delete_order(&self, id: OrderId) -> Result<()> {
        let mut tables = self.tables.write().await;
        if !tables.orders.contains_key(&id) {
            return Err(StoreError::not_found(Entity::Order, id));
        }

        let items = tables.items_of(id).count();
        if items > 0 {
            return Err(StoreError::ReferencedByChildren {
                order_id: id,
                items,
            });
        }

        tables.orders.remove(&id);
        Ok(())
    }

    async fn insert_order_item(&self, item: OrderItemRow) -> Result<OrderItemId> {
        let mut tables = self.tables.write().await;
        if !tables.orders.contains_key(&item.order_id) {
            return Err(StoreError::OrderNotFound(item.order_id));
        }

        // unique_order_sku_email
        if tables.items_of(item.order_id).any(|i| i.same_line(&item)) {
            return Err(StoreError::DuplicateItem {
                order_id: item.order_id,
                sku: item.sku,
                email: item.email,
            });
        }

        let id = item.id;
        tables.items.insert(id, item);
        Ok(id)
    }

    async fn get_order_item(&self, id: OrderItemId) -> Result<OrderItemRow> {
        let tables = self.tables.read().await;
        tables
            .items
            .get(&id)
            .cloned()
            .ok_or_else(|| StoreError::not_found(Entity::OrderItem, id))
    }

    async fn save_order_item_if_version(
        &self,
        item: &OrderItemRow,
        expected: Version,
    ) -> Result<Version> {
        let mut tables = self.tables.write().await;
        let stored = tables
            .items
            .get_mut(&item.id)
            .ok_or_else(|| StoreError::not_found(Entity::OrderItem, item.id))?;

        if stored.version != expected {
            return Err(StoreError::ConcurrentModification {
                entity: Entity::OrderItem,
                id: item.id.to_string(),
                expected,
                actual: stored.version,
            });
        }

        stored.status = item.status;
        stored.version = expected.next();
        Ok(stored.version)
    }

    async fn get_items_for_order(&self, order_id: OrderId) -> Result<Vec<OrderItemRow>> {
        let tables = self.tables.read().await;
        let mut items: Vec<_> = tables.items_of(order_id).cloned().collect();
        items.sort_by(|a, b| a.sku.cmp(&b.sku).then_with(|| a.email.cmp(&b.email)));
        Ok(items)
    }
}
