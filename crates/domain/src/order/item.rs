//! Order item entity.

use async_trait::async_trait;
use common::{OrderId, OrderItemId, Status, Version};
use order_store::{Entity, OrderItemRow, OrderStore, StoreError};
use serde::Serialize;

use crate::error::{BoxError, DomainError};
use crate::machine::{StateMachine, Stateful, VersionedWrite, sealed::Advance};
use crate::observer::TransitionObserver;
use crate::transition::Transition;

use super::Email;

/// One SKU line of an order.
///
/// An order holds at most one item per `(sku, email)` pair. Items move
/// through the same statuses as orders, independently of their order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OrderItem {
    pub(crate) id: OrderItemId,
    pub(crate) order_id: OrderId,
    pub(crate) sku: String,
    pub(crate) email: Email,
    pub(crate) status: Status,
    #[serde(skip)]
    pub(crate) version: Version,
}

impl OrderItem {
    pub fn id(&self) -> OrderItemId {
        self.id
    }

    pub fn order_id(&self) -> OrderId {
        self.order_id
    }

    pub fn sku(&self) -> &str {
        &self.sku
    }

    pub fn email(&self) -> &Email {
        &self.email
    }

    pub fn status(&self) -> Status {
        self.status
    }

    pub fn version(&self) -> Version {
        self.version
    }

    pub fn is_terminal(&self) -> bool {
        self.status.is_terminal()
    }

    pub(crate) fn to_row(&self) -> OrderItemRow {
        OrderItemRow {
            id: self.id,
            order_id: self.order_id,
            sku: self.sku.clone(),
            email: self.email.as_str().to_string(),
            status: self.status,
            version: self.version,
        }
    }

    pub(crate) fn from_row(row: OrderItemRow) -> Self {
        Self {
            id: row.id,
            order_id: row.order_id,
            sku: row.sku,
            email: Email::from_stored(row.email),
            status: row.status,
            version: row.version,
        }
    }
}

// Transitions
impl OrderItem {
    /// NEW -> PROCESSING.
    pub async fn start_processing<S, O>(
        &self,
        machine: &StateMachine<S, O>,
    ) -> Result<OrderItem, DomainError>
    where
        S: VersionedWrite<OrderItem>,
        O: TransitionObserver,
    {
        self.start_processing_with(machine, |_| Ok(()))
        .await
    }

    /// NEW -> PROCESSING, running `body` as the work; ERROR if it fails.
    pub async fn start_processing_with<S, O, F>(
        &self,
        machine: &StateMachine<S, O>,
        body: F,
    ) -> Result<OrderItem, DomainError>
    where
        S: VersionedWrite<OrderItem>,
        O: TransitionObserver,
        F: FnOnce(&OrderItem) -> Result<(), BoxError> + Send,
    {
        machine
            .apply_with(self, Transition::StartProcessing, body)
            .await
    }

    /// PROCESSING -> PROCESSED.
    pub async fn finish_processing<S, O>(
        &self,
        machine: &StateMachine<S, O>,
    ) -> Result<OrderItem, DomainError>
    where
        S: VersionedWrite<OrderItem>,
        O: TransitionObserver,
    {
        self.finish_processing_with(machine, |_| Ok(()))
        .await
    }

    /// PROCESSING -> PROCESSED, running `body` as the work; ERROR if it fails.
    pub async fn finish_processing_with<S, O, F>(
        &self,
        machine: &StateMachine<S, O>,
        body: F,
    ) -> Result<OrderItem, DomainError>
    where
        S: VersionedWrite<OrderItem>,
        O: TransitionObserver,
        F: FnOnce(&OrderItem) -> Result<(), BoxError> + Send,
    {
        machine
            .apply_with(self, Transition::FinishProcessing, body)
            .await
    }

    /// PROCESSING -> ERROR.
    pub async fn fail<S, O>(&self, machine: &StateMachine<S, O>) -> Result<OrderItem, DomainError>
    where
        S: VersionedWrite<OrderItem>,
        O: TransitionObserver,
    {
        self.fail_with(machine, |_| Ok(()))
        .await
    }

    /// PROCESSING -> ERROR, running `body` first. A failing `body` is fatal.
    pub async fn fail_with<S, O, F>(
        &self,
        machine: &StateMachine<S, O>,
        body: F,
    ) -> Result<OrderItem, DomainError>
    where
        S: VersionedWrite<OrderItem>,
        O: TransitionObserver,
        F: FnOnce(&OrderItem) -> Result<(), BoxError> + Send,
    {
        machine.apply_with(self, Transition::Fail, body).await
    }
}

impl Advance for OrderItem {
    fn advanced(&self, status: Status) -> Self {
        Self {
            status,
            version: self.version.next(),
            ..self.clone()
        }
    }
}

impl Stateful for OrderItem {
    const ENTITY: Entity = Entity::OrderItem;

    fn entity_id(&self) -> String {
        self.id.to_string()
    }

    fn status(&self) -> Status {
        self.status
    }

    fn version(&self) -> Version {
        self.version
    }
}

#[async_trait]
impl<S: OrderStore + ?Sized> VersionedWrite<OrderItem> for S {
    async fn write_if_version(
        &self,
        item: &OrderItem,
        expected: Version,
    ) -> Result<Version, StoreError> {
        self.save_order_item_if_version(&item.to_row(), expected)
            .await
    }
}
