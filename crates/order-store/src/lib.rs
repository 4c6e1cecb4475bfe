pub mod config;
pub mod error;
pub mod memory;
pub mod postgres;
pub mod row;
pub mod store;

pub use common::{OrderId, OrderItemId, Status, Version};
pub use config::StoreConfig;
pub use error::{Entity, Result, StoreError};
pub use memory::InMemoryOrderStore;
pub use postgres::PostgresOrderStore;
pub use row::{OrderItemRow, OrderRow};
pub use store::{OrderStore, OrderStoreExt};
