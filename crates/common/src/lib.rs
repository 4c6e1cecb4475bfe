//! Types shared by the order store and the domain layer.

pub mod status;
pub mod types;

pub use status::{Status, UnknownStatus};
pub use types::{OrderId, OrderItemId, Version};
