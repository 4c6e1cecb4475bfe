//! Fulfillment service providing a simplified API for order operations.

use common::{OrderId, OrderItemId};
use order_store::{Entity, OrderStore};

use crate::config::RetryPolicy;
use crate::error::DomainError;
use crate::machine::StateMachine;
use crate::observer::{TracingObserver, TransitionObserver};
use crate::transition::Transition;

use super::{CreateOrder, CreateOrderItem, Order, OrderItem};

/// Service for recording orders and moving them through processing.
///
/// Wraps a [`StateMachine`] over an [`OrderStore`]. Creation goes through
/// validation and the store's constraints; transitions go through the
/// machine. The `transition_*` methods add a bounded re-read-and-retry loop
/// for callers that only hold an id.
pub struct FulfillmentService<S: OrderStore, O = TracingObserver> {
    machine: StateMachine<S, O>,
    retry: RetryPolicy,
}

impl<S: OrderStore> FulfillmentService<S> {
    /// Creates a new service over the given store.
    pub fn new(store: S) -> Self {
        Self {
            machine: StateMachine::new(store),
            retry: RetryPolicy::default(),
        }
    }
}

impl<S: OrderStore, O: TransitionObserver> FulfillmentService<S, O> {
    /// Creates a service around an existing state machine.
    pub fn with_machine(machine: StateMachine<S, O>) -> Self {
        Self {
            machine,
            retry: RetryPolicy::default(),
        }
    }

    /// Replaces the retry policy.
    pub fn with_retry_policy(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// Returns the state machine used for transitions.
    pub fn machine(&self) -> &StateMachine<S, O> {
        &self.machine
    }

    fn store(&self) -> &S {
        self.machine.store()
    }

    /// Records a new order in status NEW.
    #[tracing::instrument(skip(self, cmd), fields(order_id = %cmd.order_id))]
    pub async fn create_order(&self, cmd: CreateOrder) -> Result<Order, DomainError> {
        let order = cmd.validate()?;
        self.store().insert_order(order.to_row()).await?;
        tracing::debug!("order created");
        Ok(order)
    }

    /// Records a new item of an existing order in status NEW.
    ///
    /// Fails with `NotFound` if the order doesn't exist and with
    /// `DuplicateItem` if the order already has this sku for this email.
    #[tracing::instrument(skip(self, cmd), fields(order_id = %cmd.order_id, sku = %cmd.sku))]
    pub async fn create_order_item(&self, cmd: CreateOrderItem) -> Result<OrderItem, DomainError> {
        let item = cmd.validate()?;
        self.store().insert_order_item(item.to_row()).await?;
        tracing::debug!(item_id = %item.id(), "order item created");
        Ok(item)
    }

    /// Loads an order.
    #[tracing::instrument(skip(self))]
    pub async fn get_order(&self, id: OrderId) -> Result<Order, DomainError> {
        let row = self.store().get_order(id).await?;
        Ok(Order::from_row(row))
    }

    /// Loads an order item.
    #[tracing::instrument(skip(self))]
    pub async fn get_order_item(&self, id: OrderItemId) -> Result<OrderItem, DomainError> {
        let row = self.store().get_order_item(id).await?;
        Ok(OrderItem::from_row(row))
    }

    /// Lists the items of an order, ordered by sku then email.
    #[tracing::instrument(skip(self))]
    pub async fn items_for_order(&self, id: OrderId) -> Result<Vec<OrderItem>, DomainError> {
        // Distinguish "no such order" from "order without items"
        self.store().get_order(id).await?;
        let rows = self.store().get_items_for_order(id).await?;
        Ok(rows.into_iter().map(OrderItem::from_row).collect())
    }

    /// Deletes an order that has no items.
    #[tracing::instrument(skip(self))]
    pub async fn delete_order(&self, id: OrderId) -> Result<(), DomainError> {
        self.store().delete_order(id).await?;
        tracing::debug!("order deleted");
        Ok(())
    }

    /// Applies `transition` to the order, re-reading and retrying on lost races.
    #[tracing::instrument(skip(self))]
    pub async fn transition_order(
        &self,
        id: OrderId,
        transition: Transition,
    ) -> Result<Order, DomainError> {
        self.with_retry(Entity::Order, id.to_string(), transition, move || async move {
            let order = self.get_order(id).await?;
            self.machine.apply(&order, transition).await
        })
        .await
    }

    /// Applies `transition` to the item, re-reading and retrying on lost races.
    #[tracing::instrument(skip(self))]
    pub async fn transition_item(
        &self,
        id: OrderItemId,
        transition: Transition,
    ) -> Result<OrderItem, DomainError> {
        self.with_retry(Entity::OrderItem, id.to_string(), transition, move || async move {
            let item = self.get_order_item(id).await?;
            self.machine.apply(&item, transition).await
        })
        .await
    }

    /// Runs `attempt` until it succeeds, fails with a non-retryable error, or
    /// the policy's attempts are used up.
    ///
    /// Each attempt re-reads the entity, so a transition a concurrent writer
    /// already moved past ends with `InvalidTransition` rather than a retry.
    async fn with_retry<E, F, Fut>(
        &self,
        entity: Entity,
        id: String,
        transition: Transition,
        mut attempt: F,
    ) -> Result<E, DomainError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<E, DomainError>>,
    {
        let max_attempts = self.retry.max_attempts;
        for n in 1..=max_attempts {
            match attempt().await {
                Err(e) if e.is_retryable() && n < max_attempts => {
                    tracing::debug!(attempt = n, error = %e, "retrying transition");
                }
                Err(e) if e.is_retryable() => {
                    tracing::warn!(attempts = n, error = %e, "giving up on transition");
                    break;
                }
                result => return result,
            }
        }

        Err(DomainError::RetriesExhausted {
            entity,
            id,
            transition,
            attempts: max_attempts,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use common::{Status, Version};
    use order_store::{InMemoryOrderStore, OrderStoreExt};

    fn create_service() -> FulfillmentService<InMemoryOrderStore> {
        FulfillmentService::new(InMemoryOrderStore::new())
    }

    #[tokio::test]
    async fn test_create_and_get_order() {
        let service = create_service();
        let created = service
            .create_order(CreateOrder::new(OrderId::new(1001), "a@b.com", "A", "B"))
            .await
            .unwrap();

        let loaded = service.get_order(OrderId::new(1001)).await.unwrap();
        assert_eq!(loaded, created);
        assert_eq!(loaded.status(), Status::New);
        assert_eq!(loaded.version(), Version::initial());
    }

    #[tokio::test]
    async fn test_create_order_twice_fails() {
        let service = create_service();
        let cmd = CreateOrder::new(OrderId::new(1), "a@b.com", "A", "B");
        service.create_order(cmd.clone()).await.unwrap();

        let result = service.create_order(cmd).await;
        assert!(matches!(result, Err(DomainError::DuplicateOrder(_))));
    }

    #[tokio::test]
    async fn test_invalid_order_is_not_stored() {
        let service = create_service();
        let result = service
            .create_order(CreateOrder::new(OrderId::new(1), "nope", "A", "B"))
            .await;
        assert!(matches!(result, Err(DomainError::Validation(_))));
        assert!(
            !service
                .machine()
                .store()
                .order_exists(OrderId::new(1))
                .await
                .unwrap()
        );
    }

    #[tokio::test]
    async fn test_item_for_missing_order_is_not_found() {
        let service = create_service();
        let result = service
            .create_order_item(CreateOrderItem::new(OrderId::new(5), "SKU-1", "a@b.com"))
            .await;
        assert!(matches!(
            result,
            Err(DomainError::NotFound {
                entity: Entity::Order,
                ..
            })
        ));
    }

    #[tokio::test]
    async fn test_items_for_missing_order_is_not_found() {
        let service = create_service();
        let result = service.items_for_order(OrderId::new(5)).await;
        assert!(matches!(result, Err(DomainError::NotFound { .. })));
    }

    #[tokio::test]
    async fn test_transition_order_by_id() {
        let service = create_service();
        service
            .create_order(CreateOrder::new(OrderId::new(1), "a@b.com", "A", "B"))
            .await
            .unwrap();

        let order = service
            .transition_order(OrderId::new(1), Transition::StartProcessing)
            .await
            .unwrap();
        assert_eq!(order.status(), Status::Processing);

        // Re-read sees PROCESSING, so a repeat is invalid rather than retried
        let result = service
            .transition_order(OrderId::new(1), Transition::StartProcessing)
            .await;
        assert!(matches!(result, Err(DomainError::InvalidTransition { .. })));
    }

    #[tokio::test]
    async fn test_transition_missing_item_is_not_found() {
        let service = create_service();
        let result = service
            .transition_item(OrderItemId::new(), Transition::StartProcessing)
            .await;
        assert!(matches!(
            result,
            Err(DomainError::NotFound {
                entity: Entity::OrderItem,
                ..
            })
        ));
    }
}
