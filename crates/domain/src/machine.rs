//! Generic versioned state machine.
//!
//! Entities declare their transitions in a [`TransitionTable`]; the
//! [`StateMachine`] checks the declared sources, computes the next status and
//! persists it with a conditional write against the version that was read.
//! Of several writers holding the same snapshot, exactly one wins; the others
//! get [`DomainError::ConcurrentModification`] and must re-read.

use async_trait::async_trait;
use common::{Status, Version};
use order_store::{Entity, StoreError};

use crate::error::{BoxError, DomainError};
use crate::observer::{TracingObserver, TransitionObserver, TransitionRecord};
use crate::transition::{PROCESSING_TRANSITIONS, Transition, TransitionTable};

pub(crate) mod sealed {
    use common::Status;

    /// Produces the successor snapshot of a transition.
    ///
    /// Not nameable outside the crate, so status can only move through a
    /// [`StateMachine`](super::StateMachine).
    pub trait Advance {
        /// Returns a copy at `status` and the next version.
        fn advanced(&self, status: Status) -> Self;
    }
}

/// An entity whose status moves along a transition table.
pub trait Stateful: sealed::Advance + Clone + Send + Sync {
    /// Kind of record, used in errors and traces.
    const ENTITY: Entity;

    /// Identifier rendered for errors and traces.
    fn entity_id(&self) -> String;

    /// Current status.
    fn status(&self) -> Status;

    /// Version read together with the status.
    fn version(&self) -> Version;

    /// The legal transitions of this entity type.
    fn transitions() -> &'static TransitionTable {
        &PROCESSING_TRANSITIONS
    }
}

/// Conditional write of an entity's status.
#[async_trait]
pub trait VersionedWrite<E: Stateful>: Send + Sync {
    /// Persists `entity.status()` if the stored version equals `expected`,
    /// returning the new stored version.
    async fn write_if_version(&self, entity: &E, expected: Version) -> Result<Version, StoreError>;
}

/// Applies transitions under optimistic concurrency.
///
/// Holds the store used for conditional writes and the observer notified of
/// every outcome.
pub struct StateMachine<S, O = TracingObserver> {
    store: S,
    observer: O,
}

impl<S> StateMachine<S> {
    /// Creates a state machine that reports through `tracing` and `metrics`.
    pub fn new(store: S) -> Self {
        Self {
            store,
            observer: TracingObserver,
        }
    }
}

impl<S, O: TransitionObserver> StateMachine<S, O> {
    /// Creates a state machine with a custom observer.
    pub fn with_observer(store: S, observer: O) -> Self {
        Self { store, observer }
    }

    /// Returns a reference to the underlying store.
    pub fn store(&self) -> &S {
        &self.store
    }

    /// Returns a reference to the observer.
    pub fn observer(&self) -> &O {
        &self.observer
    }

    /// Applies `transition` to `entity` with no work attached.
    pub async fn apply<E>(&self, entity: &E, transition: Transition) -> Result<E, DomainError>
    where
        E: Stateful,
        S: VersionedWrite<E>,
    {
        self.apply_with(entity, transition, |_| Ok(())).await
    }

    /// Applies `transition` to `entity`, running `body` as the transition's work.
    ///
    /// - If the current status is not a declared source, fails with
    ///   `InvalidTransition` without running `body` or writing.
    /// - If `body` succeeds, persists the target status.
    /// - If `body` fails and the transition declares an error status, persists
    ///   that status and fails with `TransitionFailed`. Without one, fails
    ///   with `Fatal` and writes nothing.
    ///
    /// Every write is conditional on the version of `entity`; losing the race
    /// fails with `ConcurrentModification` and leaves the stored record as the
    /// winner wrote it. On success the returned snapshot is one version ahead
    /// of `entity`.
    pub async fn apply_with<E, F>(
        &self,
        entity: &E,
        transition: Transition,
        body: F,
    ) -> Result<E, DomainError>
    where
        E: Stateful,
        S: VersionedWrite<E>,
        F: FnOnce(&E) -> Result<(), BoxError> + Send,
    {
        let rule = E::transitions().rule(transition);
        let from = entity.status();

        if !rule.allows(from) {
            let id = entity.entity_id();
            self.observer.rejected(E::ENTITY, &id, transition, from);
            return Err(DomainError::InvalidTransition {
                entity: E::ENTITY,
                id,
                transition,
                status: from,
            });
        }

        match body(entity) {
            Ok(()) => {
                let next = self.persist(entity, rule.target, transition).await?;
                self.observer.applied(&record(&next, transition, from));
                Ok(next)
            }
            Err(source) => {
                let Some(on_error) = rule.on_error else {
                    return Err(DomainError::Fatal {
                        entity: E::ENTITY,
                        id: entity.entity_id(),
                        transition,
                        source,
                    });
                };

                let next = self.persist(entity, on_error, transition).await?;
                self.observer.failed(&record(&next, transition, from));
                Err(DomainError::TransitionFailed {
                    entity: E::ENTITY,
                    id: next.entity_id(),
                    transition,
                    status: on_error,
                    version: next.version(),
                    source,
                })
            }
        }
    }

    async fn persist<E>(
        &self,
        entity: &E,
        status: Status,
        transition: Transition,
    ) -> Result<E, DomainError>
    where
        E: Stateful,
        S: VersionedWrite<E>,
    {
        let next = entity.advanced(status);
        match self.store.write_if_version(&next, entity.version()).await {
            Ok(version) => {
                debug_assert_eq!(version, next.version());
                Ok(next)
            }
            Err(e) => {
                if let StoreError::ConcurrentModification { .. } = e {
                    self.observer
                        .conflicted(E::ENTITY, &entity.entity_id(), transition);
                }
                Err(e.into())
            }
        }
    }
}

fn record<E: Stateful>(next: &E, transition: Transition, from: Status) -> TransitionRecord {
    TransitionRecord {
        entity: E::ENTITY,
        id: next.entity_id(),
        transition,
        from,
        to: next.status(),
        version: next.version(),
    }
}
