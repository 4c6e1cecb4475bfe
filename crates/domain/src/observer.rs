//! Observation hook invoked by the state machine.

use common::{Status, Version};
use order_store::Entity;

use crate::transition::Transition;

/// A status change as seen by an observer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransitionRecord {
    pub entity: Entity,
    pub id: String,
    pub transition: Transition,
    pub from: Status,
    pub to: Status,
    pub version: Version,
}

/// Receives notifications about transitions applied by a
/// [`StateMachine`](crate::StateMachine).
///
/// Observers are for observability only; they cannot affect the outcome.
pub trait TransitionObserver: Send + Sync {
    /// A transition was persisted.
    fn applied(&self, record: &TransitionRecord);

    /// The transition's work failed and `record.to` is the error status
    /// that was persisted instead of the target.
    fn failed(&self, record: &TransitionRecord) {
        let _ = record;
    }

    /// The conditional write lost a race against another writer.
    fn conflicted(&self, entity: Entity, id: &str, transition: Transition) {
        let _ = (entity, id, transition);
    }

    /// The transition was refused because of the current status.
    fn rejected(&self, entity: Entity, id: &str, transition: Transition, status: Status) {
        let _ = (entity, id, transition, status);
    }
}

/// Default observer: structured logs via `tracing` and counters via `metrics`.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingObserver;

impl TransitionObserver for TracingObserver {
    fn applied(&self, record: &TransitionRecord) {
        tracing::debug!(
            entity = %record.entity,
            id = %record.id,
            transition = %record.transition,
            from = %record.from,
            to = %record.to,
            version = %record.version,
            "transition applied"
        );
        metrics::counter!(
            "order_transitions_total",
            "entity" => record.entity.as_str(),
            "transition" => record.transition.as_str(),
            "outcome" => "applied"
        )
        .increment(1);
    }

    fn failed(&self, record: &TransitionRecord) {
        tracing::warn!(
            entity = %record.entity,
            id = %record.id,
            transition = %record.transition,
            from = %record.from,
            to = %record.to,
            version = %record.version,
            "transition body failed"
        );
        metrics::counter!(
            "order_transitions_total",
            "entity" => record.entity.as_str(),
            "transition" => record.transition.as_str(),
            "outcome" => "failed"
        )
        .increment(1);
    }

    fn conflicted(&self, entity: Entity, id: &str, transition: Transition) {
        tracing::warn!(%entity, id, %transition, "lost race on conditional write");
        metrics::counter!("order_transition_conflicts_total", "entity" => entity.as_str())
            .increment(1);
    }

    fn rejected(&self, entity: Entity, id: &str, transition: Transition, status: Status) {
        tracing::debug!(%entity, id, %transition, %status, "transition not allowed");
        metrics::counter!(
            "order_transitions_total",
            "entity" => entity.as_str(),
            "transition" => transition.as_str(),
            "outcome" => "rejected"
        )
        .increment(1);
    }
}
