//! Domain error types.

use common::{OrderId, Status, Version};
use order_store::{Entity, StoreError};
use thiserror::Error;

use crate::transition::Transition;

/// Error raised by the work performed inside a transition.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Input rejected when constructing an order or an item.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    /// Order ids come from the storefront and are positive.
    #[error("Invalid order id: {0}")]
    InvalidOrderId(i64),

    /// Email address is not syntactically valid.
    #[error("Invalid email address: {0:?}")]
    InvalidEmail(String),

    /// A required text field is empty.
    #[error("{field} must not be empty")]
    EmptyField { field: &'static str },

    /// A text field exceeds its maximum length.
    #[error("{field} exceeds {max} characters")]
    TooLong { field: &'static str, max: usize },
}

/// Errors that can occur during domain operations.
#[derive(Debug, Error)]
pub enum DomainError {
    /// The transition is not legal from the entity's current status.
    #[error("Invalid transition: cannot {transition} {entity} {id} from {status}")]
    InvalidTransition {
        entity: Entity,
        id: String,
        transition: Transition,
        status: Status,
    },

    /// Another writer changed the entity since it was read.
    #[error(
        "Concurrent modification of {entity} {id}: expected version {expected}, found {actual}"
    )]
    ConcurrentModification {
        entity: Entity,
        id: String,
        expected: Version,
        actual: Version,
    },

    /// The transition's work failed; the entity was moved to its error status.
    #[error("{transition} failed for {entity} {id}, recorded as {status} at version {version}")]
    TransitionFailed {
        entity: Entity,
        id: String,
        transition: Transition,
        status: Status,
        version: Version,
        #[source]
        source: BoxError,
    },

    /// The transition's work failed and the transition declares no error status.
    #[error("{transition} failed for {entity} {id} with no error status to record")]
    Fatal {
        entity: Entity,
        id: String,
        transition: Transition,
        #[source]
        source: BoxError,
    },

    /// A bounded retry gave up after losing every race.
    #[error("{transition} on {entity} {id} gave up after {attempts} attempts")]
    RetriesExhausted {
        entity: Entity,
        id: String,
        transition: Transition,
        attempts: u32,
    },

    /// Entity not found.
    #[error("{entity} not found: {id}")]
    NotFound { entity: Entity, id: String },

    /// An order with this id already exists.
    #[error("Order already exists: {0}")]
    DuplicateOrder(OrderId),

    /// The order already contains an item for this sku and email.
    #[error("Order {order_id} already has an item for sku {sku} and email {email}")]
    DuplicateItem {
        order_id: OrderId,
        sku: String,
        email: String,
    },

    /// The order still has items and cannot be deleted.
    #[error("Order {order_id} is referenced by {items} item(s)")]
    ReferencedByChildren { order_id: OrderId, items: usize },

    /// Construction input was rejected.
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    /// Infrastructure failure in the order store.
    #[error("Store error: {0}")]
    Store(StoreError),
}

impl DomainError {
    /// Returns true if re-reading the entity and retrying may succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(self, DomainError::ConcurrentModification { .. })
    }
}

impl From<StoreError> for DomainError {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::ConcurrentModification {
                entity,
                id,
                expected,
                actual,
            } => DomainError::ConcurrentModification {
                entity,
                id,
                expected,
                actual,
            },
            StoreError::NotFound { entity, id } => DomainError::NotFound { entity, id },
            StoreError::OrderNotFound(order_id) => DomainError::NotFound {
                entity: Entity::Order,
                id: order_id.to_string(),
            },
            StoreError::DuplicateOrder(id) => DomainError::DuplicateOrder(id),
            StoreError::DuplicateItem {
                order_id,
                sku,
                email,
            } => DomainError::DuplicateItem {
                order_id,
                sku,
                email,
            },
            StoreError::ReferencedByChildren { order_id, items } => {
                DomainError::ReferencedByChildren { order_id, items }
            }
            other => DomainError::Store(other),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn store_conflict_maps_to_domain_conflict() {
        let err: DomainError = StoreError::ConcurrentModification {
            entity: Entity::Order,
            id: "1".to_string(),
            expected: Version::new(0),
            actual: Version::new(1),
        }
        .into();
        assert!(err.is_retryable());
        assert!(matches!(err, DomainError::ConcurrentModification { .. }));
    }

    #[test]
    fn missing_parent_maps_to_not_found_order() {
        let err: DomainError = StoreError::OrderNotFound(OrderId::new(5)).into();
        assert!(matches!(
            err,
            DomainError::NotFound { entity: Entity::Order, ref id } if id == "5"
        ));
        assert!(!err.is_retryable());
    }

    #[test]
    fn invalid_transition_message() {
        let err = DomainError::InvalidTransition {
            entity: Entity::Order,
            id: "1001".to_string(),
            transition: Transition::StartProcessing,
            status: Status::Processed,
        };
        assert_eq!(
            err.to_string(),
            "Invalid transition: cannot start_processing order 1001 from PROCESSED"
        );
    }
}
