//! # State Machine Executor
//!
//! Drives a single instance value through a validated [`StateGraph`].
//!
//! ## Overview
//!
//! Each machine is single-owner: it is created for exactly one instance value
//! and never shared between instances. A per-machine mutex guarantees at most
//! one transition is mid-flight at a time; listener notification happens after
//! the lock is released so observers can safely call back into the machine.
//!
//! ## Transition semantics
//!
//! - `initialize` applies automatic transitions from the initial state until
//!   none remain, running each target state's entry action against the value.
//!   An entry action failure rolls the machine back to the last stable state
//!   and propagates as [`StateMachineError::EntryActionFailed`].
//! - `apply` performs one named transition; the target state is committed only
//!   after its entry action succeeds.
//! - `execute` invokes a state-bound operation without transitioning.
//! - `terminate` follows the graph's termination key toward a terminal state,
//!   best-effort: entry action failures are logged and teardown continues.

use std::sync::Arc;

use parking_lot::Mutex;
use serde_json::Value;
use tracing::{debug, warn};

use super::errors::{StateMachineError, StateMachineResult};
use super::events::{ListenerSet, StateChange, StateChangeListener};
use super::graph::{OperationSpec, State, StateGraph, Transition};
use crate::model::Invocable;

#[derive(Debug)]
struct MachineState {
    current: usize,
    active: bool,
    disposed: bool,
}

/// Transition executor bound to one state graph.
#[derive(Debug)]
pub struct StateMachine {
    graph: Arc<StateGraph>,
    state: Mutex<MachineState>,
    listeners: ListenerSet,
}

impl StateMachine {
    pub fn new(graph: Arc<StateGraph>) -> Self {
        let current = graph.initial_index();
        Self {
            graph,
            state: Mutex::new(MachineState {
                current,
                active: false,
                disposed: false,
            }),
            listeners: ListenerSet::new(),
        }
    }

    pub fn graph(&self) -> &Arc<StateGraph> {
        &self.graph
    }

    /// Register a transition observer.
    pub fn add_listener(&self, listener: Arc<dyn StateChangeListener>) {
        self.listeners.add(listener);
    }

    /// The current state.
    pub fn current_state(&self) -> StateMachineResult<State> {
        let guard = self.state.lock();
        if guard.disposed {
            return Err(StateMachineError::Disposed);
        }
        Ok(self.graph.state_at(guard.current).clone())
    }

    /// Whether initialization has completed and termination has not.
    pub fn is_active(&self) -> bool {
        let guard = self.state.lock();
        guard.active && !guard.disposed
    }

    /// Run the machine from the initial state through every applicable
    /// automatic transition, executing each target state's entry action
    /// against `value`. Returns the resulting stable state.
    pub fn initialize(&self, value: &dyn Invocable) -> StateMachineResult<State> {
        let mut changes = Vec::new();
        let outcome = {
            let mut guard = self.state.lock();
            if guard.disposed {
                return Err(StateMachineError::Disposed);
            }
            let result = self.run_automatic(&mut guard, value, &mut changes);
            if result.is_ok() {
                guard.active = true;
            }
            result.map(|()| self.graph.state_at(guard.current).clone())
        };
        self.publish(&changes);
        let state = outcome?;
        debug!(graph = self.graph.name(), state = state.name(), "state machine initialized");
        Ok(state)
    }

    /// Apply the named transition from the current state. The entry action of
    /// the target state runs before the transition is committed; on failure
    /// the machine stays in the current state.
    pub fn apply(&self, key: &str, value: &dyn Invocable) -> StateMachineResult<State> {
        let mut changes = Vec::new();
        let outcome = {
            let mut guard = self.state.lock();
            if guard.disposed {
                return Err(StateMachineError::Disposed);
            }
            let current = self.graph.state_at(guard.current);
            let transition = current
                .find_transition(key)
                .ok_or_else(|| StateMachineError::unknown_transition(current.name(), key))?
                .clone();
            self.step(&mut guard, &transition, value, &mut changes)
                .map(|()| self.graph.state_at(guard.current).clone())
        };
        self.publish(&changes);
        outcome
    }

    /// Invoke the named state-bound operation against `value` without
    /// changing state.
    pub fn execute(&self, key: &str, value: &dyn Invocable) -> StateMachineResult<Value> {
        let (operation, state_name) = {
            let guard = self.state.lock();
            if guard.disposed {
                return Err(StateMachineError::Disposed);
            }
            let current = self.graph.state_at(guard.current);
            let operation = current
                .find_operation(key)
                .ok_or_else(|| StateMachineError::unknown_operation(current.name(), key))?
                .clone();
            (operation, current.name().to_string())
        };
        value
            .invoke(operation.method_name(), Value::Null)
            .map_err(|source| StateMachineError::OperationFailed {
                state: state_name,
                operation: key.to_string(),
                source,
            })
    }

    /// Drive the machine toward a terminal state by repeatedly applying the
    /// graph's designated termination transition. Best-effort: entry action
    /// failures are logged and the transition is still taken, since teardown
    /// must not be abandoned mid-way. Returns the final state.
    pub fn terminate(&self, value: &dyn Invocable) -> State {
        let termination_key = self.graph.termination_key().to_string();
        let mut changes = Vec::new();
        let state = {
            let mut guard = self.state.lock();
            if guard.disposed {
                return self.graph.state_at(guard.current).clone();
            }
            loop {
                let current = self.graph.state_at(guard.current);
                if current.is_terminal() {
                    break;
                }
                let Some(transition) = current.find_transition(&termination_key).cloned() else {
                    break;
                };
                let target_ix = self.graph.index_of(transition.target());
                let target = self.graph.state_at(target_ix);
                if let Some(action) = target.entry_action_name() {
                    if let Err(error) = value.invoke(action, Value::Null) {
                        warn!(
                            graph = self.graph.name(),
                            state = target.name(),
                            error = %error,
                            "entry action failed during termination; continuing teardown"
                        );
                    }
                }
                changes.push(StateChange::new(current.name(), target.name()));
                guard.current = target_ix;
            }
            guard.active = false;
            self.graph.state_at(guard.current).clone()
        };
        self.publish(&changes);
        debug!(graph = self.graph.name(), state = state.name(), "state machine terminated");
        state
    }

    /// Transitions available from the current state.
    pub fn available_transitions(&self) -> StateMachineResult<Vec<Transition>> {
        self.current_state().map(|s| s.transitions().to_vec())
    }

    /// Operations available on the current state.
    pub fn available_operations(&self) -> StateMachineResult<Vec<OperationSpec>> {
        self.current_state().map(|s| s.operations().to_vec())
    }

    /// Dispose of the machine; all further calls except `terminate` fail with
    /// [`StateMachineError::Disposed`]. Listeners are released.
    pub fn dispose(&self) {
        let mut guard = self.state.lock();
        guard.disposed = true;
        guard.active = false;
        drop(guard);
        self.listeners.clear();
    }

    /// Apply automatic transitions until none remain; caller holds the lock.
    fn run_automatic(
        &self,
        guard: &mut MachineState,
        value: &dyn Invocable,
        changes: &mut Vec<StateChange>,
    ) -> StateMachineResult<()> {
        loop {
            let current = self.graph.state_at(guard.current);
            let Some(transition) = current.automatic_transition().cloned() else {
                return Ok(());
            };
            self.step(guard, &transition, value, changes)?;
        }
    }

    /// Run the target's entry action, then commit the transition. Caller
    /// holds the lock; rollback is simply not committing.
    fn step(
        &self,
        guard: &mut MachineState,
        transition: &Transition,
        value: &dyn Invocable,
        changes: &mut Vec<StateChange>,
    ) -> StateMachineResult<()> {
        let from = self.graph.state_at(guard.current).name().to_string();
        let target_ix = self.graph.index_of(transition.target());
        let target = self.graph.state_at(target_ix);
        if let Some(action) = target.entry_action_name() {
            value
                .invoke(action, Value::Null)
                .map_err(|source| StateMachineError::EntryActionFailed {
                    state: target.name().to_string(),
                    transition: transition.key().to_string(),
                    source,
                })?;
        }
        changes.push(StateChange::new(from, target.name()));
        guard.current = target_ix;
        Ok(())
    }

    fn publish(&self, changes: &[StateChange]) {
        for change in changes {
            self.listeners.notify(change);
        }
    }
}
