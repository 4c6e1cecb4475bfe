//! Order entity.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use common::{OrderId, Status, Version};
use order_store::{Entity, OrderRow, OrderStore, StoreError};
use serde::Serialize;

use crate::error::{BoxError, DomainError};
use crate::machine::{StateMachine, Stateful, VersionedWrite, sealed::Advance};
use crate::observer::TransitionObserver;
use crate::transition::Transition;

use super::Email;

/// An order received from the storefront.
///
/// Contact fields and `received` never change after creation. The status is
/// only moved by the transition methods, each of which performs one
/// optimistic-concurrency-checked write.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Order {
    pub(crate) id: OrderId,
    pub(crate) email: Email,
    pub(crate) first_name: String,
    pub(crate) last_name: String,
    pub(crate) received: DateTime<Utc>,
    pub(crate) status: Status,

    /// Current version for optimistic concurrency.
    #[serde(skip)]
    pub(crate) version: Version,
}

impl Order {
    pub fn id(&self) -> OrderId {
        self.id
    }

    pub fn email(&self) -> &Email {
        &self.email
    }

    pub fn first_name(&self) -> &str {
        &self.first_name
    }

    pub fn last_name(&self) -> &str {
        &self.last_name
    }

    pub fn received(&self) -> DateTime<Utc> {
        self.received
    }

    pub fn status(&self) -> Status {
        self.status
    }

    pub fn version(&self) -> Version {
        self.version
    }

    /// Returns true if no further transition is possible.
    pub fn is_terminal(&self) -> bool {
        self.status.is_terminal()
    }

    pub(crate) fn to_row(&self) -> OrderRow {
        OrderRow {
            id: self.id,
            email: self.email.as_str().to_string(),
            first_name: self.first_name.clone(),
            last_name: self.last_name.clone(),
            received: self.received,
            status: self.status,
            version: self.version,
        }
    }

    pub(crate) fn from_row(row: OrderRow) -> Self {
        Self {
            id: row.id,
            email: Email::from_stored(row.email),
            first_name: row.first_name,
            last_name: row.last_name,
            received: row.received,
            status: row.status,
            version: row.version,
        }
    }
}

// Transitions
impl Order {
    /// NEW -> PROCESSING.
    pub async fn start_processing<S, O>(
        &self,
        machine: &StateMachine<S, O>,
    ) -> Result<Order, DomainError>
    where
        S: VersionedWrite<Order>,
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
    ) -> Result<Order, DomainError>
    where
        S: VersionedWrite<Order>,
        O: TransitionObserver,
        F: FnOnce(&Order) -> Result<(), BoxError> + Send,
    {
        machine
            .apply_with(self, Transition::StartProcessing, body)
            .await
    }

    /// PROCESSING -> PROCESSED.
    pub async fn finish_processing<S, O>(
        &self,
        machine: &StateMachine<S, O>,
    ) -> Result<Order, DomainError>
    where
        S: VersionedWrite<Order>,
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
    ) -> Result<Order, DomainError>
    where
        S: VersionedWrite<Order>,
        O: TransitionObserver,
        F: FnOnce(&Order) -> Result<(), BoxError> + Send,
    {
        machine
            .apply_with(self, Transition::FinishProcessing, body)
            .await
    }

    /// PROCESSING -> ERROR.
    pub async fn fail<S, O>(&self, machine: &StateMachine<S, O>) -> Result<Order, DomainError>
    where
        S: VersionedWrite<Order>,
        O: TransitionObserver,
    {
        self.fail_with(machine, |_| Ok(()))
        .await
    }

    /// PROCESSING -> ERROR, running `body` first.
    ///
    /// A failing `body` is returned as `DomainError::Fatal` and nothing is
    /// written.
    pub async fn fail_with<S, O, F>(
        &self,
        machine: &StateMachine<S, O>,
        body: F,
    ) -> Result<Order, DomainError>
    where
        S: VersionedWrite<Order>,
        O: TransitionObserver,
        F: FnOnce(&Order) -> Result<(), BoxError> + Send,
    {
        machine.apply_with(self, Transition::Fail, body).await
    }
}

impl Advance for Order {
    fn advanced(&self, status: Status) -> Self {
        Self {
            status,
            version: self.version.next(),
            ..self.clone()
        }
    }
}

impl Stateful for Order {
    const ENTITY: Entity = Entity::Order;

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
impl<S: OrderStore + ?Sized> VersionedWrite<Order> for S {
    async fn write_if_version(
        &self,
        order: &Order,
        expected: Version,
    ) -> Result<Version, StoreError> {
        self.save_order_if_version(&order.to_row(), expected).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::order::CreateOrder;
    use order_store::InMemoryOrderStore;

    async fn stored_order(store: &InMemoryOrderStore) -> Order {
        let order = CreateOrder::new(OrderId::new(1001), "a@b.com", "A", "B")
            .validate()
            .unwrap();
        store.insert_order(order.to_row()).await.unwrap();
        order
    }

    #[test]
    fn test_row_round_trip_preserves_fields() {
        let order = CreateOrder::new(OrderId::new(7), "a@b.com", "A", "B")
            .validate()
            .unwrap();
        assert_eq!(Order::from_row(order.to_row()), order);
    }

    #[test]
    fn test_advanced_moves_status_and_version_only() {
        let order = CreateOrder::new(OrderId::new(7), "a@b.com", "A", "B")
            .validate()
            .unwrap();
        let next = order.advanced(Status::Processing);
        assert_eq!(next.status(), Status::Processing);
        assert_eq!(next.version(), Version::new(1));
        assert_eq!(next.email(), order.email());
        assert_eq!(next.received(), order.received());
    }

    #[tokio::test]
    async fn test_start_then_finish() {
        let store = InMemoryOrderStore::new();
        let order = stored_order(&store).await;
        let machine = StateMachine::new(store.clone());

        let order = order.start_processing(&machine).await.unwrap();
        assert_eq!(order.status(), Status::Processing);
        assert_eq!(order.version(), Version::new(1));

        let order = order.finish_processing(&machine).await.unwrap();
        assert_eq!(order.status(), Status::Processed);
        assert_eq!(order.version(), Version::new(2));
        assert!(order.is_terminal());

        let stored = store.get_order(order.id()).await.unwrap();
        assert_eq!(stored.status, Status::Processed);
        assert_eq!(stored.version, Version::new(2));
    }

    #[tokio::test]
    async fn test_fail_from_new_is_invalid() {
        let store = InMemoryOrderStore::new();
        let order = stored_order(&store).await;
        let machine = StateMachine::new(store.clone());

        let result = order.fail(&machine).await;
        assert!(matches!(
            result,
            Err(DomainError::InvalidTransition {
                status: Status::New,
                transition: Transition::Fail,
                ..
            })
        ));

        let stored = store.get_order(order.id()).await.unwrap();
        assert_eq!(stored.status, Status::New);
        assert_eq!(stored.version, Version::initial());
    }

    #[test]
    fn test_serialization_omits_version() {
        let order = CreateOrder::new(OrderId::new(7), "a@b.com", "A", "B")
            .validate()
            .unwrap();
        let json = serde_json::to_value(&order).unwrap();
        assert_eq!(json["id"], 7);
        assert_eq!(json["status"], "NEW");
        assert!(json.get("version").is_none());
    }
}
