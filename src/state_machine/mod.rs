// State machine module for component lifecycle execution
//
// A generic, reusable finite-state executor driven by declared graphs of
// states and transitions. Graphs are validated once at load time; the
// executor has no knowledge of components.

pub mod errors;
pub mod events;
pub mod graph;
pub mod machine;

// Re-export main types for convenient access
pub use errors::{StateGraphError, StateMachineError, StateMachineResult};
pub use events::{ListenerSet, StateChange, StateChangeListener};
pub use graph::{OperationSpec, State, StateGraph, StateGraphBuilder, Transition};
pub use machine::StateMachine;
