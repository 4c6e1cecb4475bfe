//! Domain layer for order fulfillment tracking.
//!
//! This crate provides:
//! - The transition table shared by orders and order items
//! - A generic state machine applying transitions with optimistic concurrency
//! - An injectable observer for transition outcomes
//! - Order and OrderItem entities with validated construction
//! - A fulfillment service for creating, loading and transitioning records

pub mod config;
pub mod error;
pub mod machine;
pub mod observer;
pub mod order;
pub mod transition;

pub use config::RetryPolicy;
pub use error::{BoxError, DomainError, ValidationError};
pub use machine::{StateMachine, Stateful, VersionedWrite};
pub use observer::{TracingObserver, TransitionObserver, TransitionRecord};
pub use order::{
    CreateOrder, CreateOrderItem, Email, FulfillmentService, MAX_FIELD_LENGTH, Order, OrderItem,
};
pub use transition::{PROCESSING_TRANSITIONS, Transition, TransitionRule, TransitionTable};
