//! Orders, order items and the service that records and processes them.

mod aggregate;
mod commands;
mod item;
mod service;
mod value_objects;

pub use aggregate::Order;
pub use commands::{CreateOrder, CreateOrderItem};
pub use item::OrderItem;
pub use service::FulfillmentService;
pub use value_objects::{Email, MAX_FIELD_LENGTH};
