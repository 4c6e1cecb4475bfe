//! Creation commands issued by the ingestion side.

use chrono::{DateTime, SubsecRound, Utc};
use common::{OrderId, OrderItemId, Status, Version};

use crate::error::ValidationError;

use super::value_objects::{Email, required_text};
use super::{Order, OrderItem};

/// Command to record a new order received from the storefront.
#[derive(Debug, Clone)]
pub struct CreateOrder {
    /// The storefront's order id.
    pub order_id: OrderId,

    /// Customer contact address.
    pub email: String,

    pub first_name: String,
    pub last_name: String,

    /// When the order was received. Defaults to the time of creation.
    /// Kept at microsecond precision, the finest the store persists.
    pub received: Option<DateTime<Utc>>,
}

impl CreateOrder {
    /// Creates a new CreateOrder command.
    pub fn new(
        order_id: OrderId,
        email: impl Into<String>,
        first_name: impl Into<String>,
        last_name: impl Into<String>,
    ) -> Self {
        Self {
            order_id,
            email: email.into(),
            first_name: first_name.into(),
            last_name: last_name.into(),
            received: None,
        }
    }

    /// Sets an explicit receive time.
    pub fn received_at(mut self, received: DateTime<Utc>) -> Self {
        self.received = Some(received);
        self
    }

    /// Validates the command and builds the order in status NEW.
    pub fn validate(self) -> Result<Order, ValidationError> {
        if self.order_id.as_i64() <= 0 {
            return Err(ValidationError::InvalidOrderId(self.order_id.as_i64()));
        }

        Ok(Order {
            id: self.order_id,
            email: Email::parse(&self.email)?,
            first_name: required_text("first_name", &self.first_name)?,
            last_name: required_text("last_name", &self.last_name)?,
            received: self.received.unwrap_or_else(Utc::now).trunc_subsecs(6),
            status: Status::New,
            version: Version::initial(),
        })
    }
}

/// Command to record a SKU line of an existing order.
#[derive(Debug, Clone)]
pub struct CreateOrderItem {
    /// The order the item belongs to.
    pub order_id: OrderId,

    pub sku: String,

    /// Address the item is fulfilled for.
    pub email: String,
}

impl CreateOrderItem {
    /// Creates a new CreateOrderItem command.
    pub fn new(
        order_id: OrderId,
        sku: impl Into<String>,
        email: impl Into<String>,
    ) -> Self {
        Self {
            order_id,
            sku: sku.into(),
            email: email.into(),
        }
    }

    /// Validates the command and builds the item in status NEW with a fresh id.
    ///
    /// Existence of the order and uniqueness of the line are checked by the
    /// store when the item is inserted.
    pub fn validate(self) -> Result<OrderItem, ValidationError> {
        Ok(OrderItem {
            id: OrderItemId::new(),
            order_id: self.order_id,
            sku: required_text("sku", &self.sku)?,
            email: Email::parse(&self.email)?,
            status: Status::New,
            version: Version::initial(),
        })
    }
}
