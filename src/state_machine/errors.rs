//! # State Machine Error Types
//!
//! Structured error handling for state graphs and the transition executor
//! using thiserror instead of `Box<dyn Error>` patterns.

use thiserror::Error;

use crate::model::InvocationError;

/// Violations detected while building or validating a state graph.
///
/// Graphs are validated once at load time so that invalid transition keys,
/// unreachable targets, and cycles are caught early instead of on every call.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StateGraphError {
    #[error("state graph '{graph}' does not declare an initial state")]
    MissingInitialState { graph: String },

    #[error("state graph '{graph}' declares unknown initial state '{name}'")]
    UnknownInitialState { graph: String, name: String },

    #[error("state graph '{graph}' declares no terminal state")]
    NoTerminalState { graph: String },

    #[error("state graph '{graph}' declares state '{name}' more than once")]
    DuplicateState { graph: String, name: String },

    #[error("state '{state}' declares transition '{key}' more than once")]
    DuplicateTransition { state: String, key: String },

    #[error("state '{state}' declares operation '{key}' more than once")]
    DuplicateOperation { state: String, key: String },

    #[error("transition '{key}' from state '{state}' targets unknown state '{target}'")]
    UnknownTarget {
        state: String,
        key: String,
        target: String,
    },

    #[error("terminal state '{state}' declares outgoing transitions")]
    TerminalTransition { state: String },

    #[error("state '{state}' declares more than one automatic transition")]
    AmbiguousAutomatic { state: String },

    #[error("state graph '{graph}' contains a transition cycle: {path}")]
    CyclicGraph { graph: String, path: String },
}

/// Errors raised by the transition executor.
#[derive(Error, Debug)]
pub enum StateMachineError {
    #[error("no transition '{transition}' is declared from state '{state}'")]
    UnknownTransition { state: String, transition: String },

    #[error("no operation '{operation}' is declared on state '{state}'")]
    UnknownOperation { state: String, operation: String },

    #[error("entry action of state '{state}' failed while applying transition '{transition}'")]
    EntryActionFailed {
        state: String,
        transition: String,
        #[source]
        source: InvocationError,
    },

    #[error("operation '{operation}' on state '{state}' failed")]
    OperationFailed {
        state: String,
        operation: String,
        #[source]
        source: InvocationError,
    },

    #[error("state machine has been disposed")]
    Disposed,
}

impl StateMachineError {
    /// Create an unknown-transition error
    pub fn unknown_transition(state: impl Into<String>, transition: impl Into<String>) -> Self {
        Self::UnknownTransition {
            state: state.into(),
            transition: transition.into(),
        }
    }

    /// Create an unknown-operation error
    pub fn unknown_operation(state: impl Into<String>, operation: impl Into<String>) -> Self {
        Self::UnknownOperation {
            state: state.into(),
            operation: operation.into(),
        }
    }
}

pub type StateMachineResult<T> = std::result::Result<T, StateMachineError>;
