use common::{OrderId, UnknownStatus, Version};
use thiserror::Error;

/// The kind of record an error refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Entity {
    Order,
    OrderItem,
}

impl Entity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Entity::Order => "order",
            Entity::OrderItem => "order item",
        }
    }
}

impl std::fmt::Display for Entity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Errors that can occur when interacting with the order store.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The stored version no longer matches the version the writer read.
    #[error(
        "Concurrent modification of {entity} {id}: expected version {expected}, found {actual}"
    )]
    ConcurrentModification {
        entity: Entity,
        id: String,
        expected: Version,
        actual: Version,
    },

    /// The record does not exist.
    #[error("{entity} not found: {id}")]
    NotFound { entity: Entity, id: String },

    /// An order with this id already exists.
    #[error("Order already exists: {0}")]
    DuplicateOrder(OrderId),

    /// The order already has an item with this sku and email.
    #[error("Order {order_id} already has an item for sku {sku} and email {email}")]
    DuplicateItem {
        order_id: OrderId,
        sku: String,
        email: String,
    },

    /// An item referenced an order that does not exist.
    #[error("Referenced order not found: {0}")]
    OrderNotFound(OrderId),

    /// The order still has items and cannot be deleted.
    #[error("Order {order_id} is referenced by {items} item(s)")]
    ReferencedByChildren { order_id: OrderId, items: usize },

    /// A stored status code could not be decoded.
    #[error("Invalid stored status: {0}")]
    InvalidStatus(#[from] UnknownStatus),

    /// A database error occurred.
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// A database migration error occurred.
    #[error("Migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),
}

impl StoreError {
    pub(crate) fn not_found(entity: Entity, id: impl ToString) -> Self {
        StoreError::NotFound {
            entity,
            id: id.to_string(),
        }
    }
}

/// Result type for order store operations.
pub type Result<T> = std::result::Result<T, StoreError>;
