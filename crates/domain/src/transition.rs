//! Named transitions and the table that declares the legal status graph.

use common::Status;
use serde::{Deserialize, Serialize};

/// A named, guarded status change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Transition {
    StartProcessing,
    FinishProcessing,
    Fail,
}

impl Transition {
    /// All transitions.
    pub const ALL: [Transition; 3] = [
        Transition::StartProcessing,
        Transition::FinishProcessing,
        Transition::Fail,
    ];

    /// Returns the transition name as a string.
    pub fn as_str(&self) -> &'static str {
        match self {
            Transition::StartProcessing => "start_processing",
            Transition::FinishProcessing => "finish_processing",
            Transition::Fail => "fail",
        }
    }
}

impl std::fmt::Display for Transition {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Declaration of a single transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TransitionRule {
    /// Statuses the transition may start from.
    pub sources: &'static [Status],

    /// Status reached when the transition succeeds.
    pub target: Status,

    /// Status recorded instead of `target` when the transition body fails.
    /// `None` means a body failure is not recoverable.
    pub on_error: Option<Status>,
}

impl TransitionRule {
    /// Returns true if the transition may start from `status`.
    pub fn allows(&self, status: Status) -> bool {
        self.sources.contains(&status)
    }
}

/// Static mapping from transition name to its rule.
#[derive(Debug, Clone, Copy)]
pub struct TransitionTable {
    start_processing: TransitionRule,
    finish_processing: TransitionRule,
    fail: TransitionRule,
}

impl TransitionTable {
    /// Returns the rule declared for `transition`.
    pub fn rule(&self, transition: Transition) -> &TransitionRule {
        match transition {
            Transition::StartProcessing => &self.start_processing,
            Transition::FinishProcessing => &self.finish_processing,
            Transition::Fail => &self.fail,
        }
    }

    /// Returns the transitions that may start from `status`.
    pub fn available_from(&self, status: Status) -> Vec<Transition> {
        Transition::ALL
            .into_iter()
            .filter(|t| self.rule(*t).allows(status))
            .collect()
    }
}

/// Transition table shared by orders and order items.
///
/// ```text
/// start_processing   NEW        -> PROCESSING  (on error: ERROR)
/// finish_processing  PROCESSING -> PROCESSED   (on error: ERROR)
/// fail               PROCESSING -> ERROR
/// ```
pub static PROCESSING_TRANSITIONS: TransitionTable = TransitionTable {
    start_processing: TransitionRule {
        sources: &[Status::New],
        target: Status::Processing,
        on_error: Some(Status::Error),
    },
    finish_processing: TransitionRule {
        sources: &[Status::Processing],
        target: Status::Processed,
        on_error: Some(Status::Error),
    },
    fail: TransitionRule {
        sources: &[Status::Processing],
        target: Status::Error,
        on_error: None,
    },
};
