//! # State Graph Model
//!
//! Declarative finite-state graphs: named states with entry actions, keyed
//! transitions (some automatic), and state-bound operations.
//!
//! ## Overview
//!
//! A [`StateGraph`] is the immutable, shareable description of a component
//! lifecycle. Graphs are assembled through [`StateGraphBuilder`] and validated
//! once at build time; the executor in [`super::machine`] never has to deal
//! with dangling targets or ambiguous automatic transitions at runtime.
//!
//! ## Validation
//!
//! - exactly one initial state, which must be declared
//! - at least one terminal state
//! - state names and per-state transition/operation keys are unique
//! - every transition targets a declared state
//! - terminal states declare no outgoing transitions
//! - at most one automatic transition per state
//! - the transition digraph is acyclic

use std::collections::HashMap;

use super::errors::StateGraphError;
use crate::constants::DEFAULT_TERMINATION_KEY;

/// A keyed edge between two states.
///
/// Automatic transitions are applied immediately on entry without an external
/// request; all others are applied by name through the executor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transition {
    key: String,
    target: String,
    automatic: bool,
}

impl Transition {
    pub fn new(key: impl Into<String>, target: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            target: target.into(),
            automatic: false,
        }
    }

    /// Mark this transition as automatic (applied on entry).
    pub fn automatic(mut self) -> Self {
        self.automatic = true;
        self
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn target(&self) -> &str {
        &self.target
    }

    pub fn is_automatic(&self) -> bool {
        self.automatic
    }
}

/// A named side-effecting operation bound to a state.
///
/// The `method` is the operation name dispatched against the instance value;
/// it defaults to the declared key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OperationSpec {
    key: String,
    method: Option<String>,
}

impl OperationSpec {
    pub fn new(key: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            method: None,
        }
    }

    pub fn with_method(key: impl Into<String>, method: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            method: Some(method.into()),
        }
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    /// The operation name invoked on the instance value.
    pub fn method_name(&self) -> &str {
        self.method.as_deref().unwrap_or(&self.key)
    }
}

/// One named state in a graph.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct State {
    name: String,
    terminal: bool,
    entry_action: Option<String>,
    transitions: Vec<Transition>,
    operations: Vec<OperationSpec>,
}

impl State {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            terminal: false,
            entry_action: None,
            transitions: Vec::new(),
            operations: Vec::new(),
        }
    }

    /// Mark this state as terminal (no outgoing transitions permitted).
    pub fn terminal(mut self) -> Self {
        self.terminal = true;
        self
    }

    /// Declare the operation invoked against the instance value on entry.
    pub fn entry_action(mut self, operation: impl Into<String>) -> Self {
        self.entry_action = Some(operation.into());
        self
    }

    /// Declare an outgoing transition.
    pub fn transition(mut self, transition: Transition) -> Self {
        self.transitions.push(transition);
        self
    }

    /// Declare a state-bound operation.
    pub fn operation(mut self, operation: OperationSpec) -> Self {
        self.operations.push(operation);
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn is_terminal(&self) -> bool {
        self.terminal
    }

    pub fn entry_action_name(&self) -> Option<&str> {
        self.entry_action.as_deref()
    }

    pub fn transitions(&self) -> &[Transition] {
        &self.transitions
    }

    pub fn operations(&self) -> &[OperationSpec] {
        &self.operations
    }

    /// Find an outgoing transition by key.
    pub fn find_transition(&self, key: &str) -> Option<&Transition> {
        self.transitions.iter().find(|t| t.key == key)
    }

    /// The automatic transition out of this state, if one is declared.
    pub fn automatic_transition(&self) -> Option<&Transition> {
        self.transitions.iter().find(|t| t.automatic)
    }

    /// Find a bound operation by key.
    pub fn find_operation(&self, key: &str) -> Option<&OperationSpec> {
        self.operations.iter().find(|o| o.key == key)
    }
}

/// Immutable, validated state graph.
#[derive(Debug, Clone)]
pub struct StateGraph {
    name: String,
    initial: usize,
    termination_key: String,
    states: Vec<State>,
    index: HashMap<String, usize>,
}

impl StateGraph {
    pub fn builder(name: impl Into<String>) -> StateGraphBuilder {
        StateGraphBuilder::new(name)
    }

    /// A single-state graph whose initial state is terminal and immediately
    /// available. Components that declare no lifecycle use this.
    pub fn inert() -> Self {
        StateGraphBuilder::new("inert")
            .initial("available")
            .state(State::new("available").terminal())
            .build()
            .expect("inert graph is statically valid")
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// The transition key followed by best-effort termination.
    pub fn termination_key(&self) -> &str {
        &self.termination_key
    }

    pub fn initial_state(&self) -> &State {
        &self.states[self.initial]
    }

    pub fn states(&self) -> &[State] {
        &self.states
    }

    pub fn state(&self, name: &str) -> Option<&State> {
        self.index.get(name).map(|ix| &self.states[*ix])
    }

    pub(crate) fn initial_index(&self) -> usize {
        self.initial
    }

    pub(crate) fn state_at(&self, index: usize) -> &State {
        &self.states[index]
    }

    /// Index of a state known to exist (validated targets only).
    pub(crate) fn index_of(&self, name: &str) -> usize {
        self.index[name]
    }
}

/// Builder and load-time validator for [`StateGraph`].
#[derive(Debug)]
pub struct StateGraphBuilder {
    name: String,
    initial: Option<String>,
    termination_key: String,
    states: Vec<State>,
}

impl StateGraphBuilder {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            initial: None,
            termination_key: DEFAULT_TERMINATION_KEY.to_string(),
            states: Vec::new(),
        }
    }

    /// Designate the initial state by name.
    pub fn initial(mut self, name: impl Into<String>) -> Self {
        self.initial = Some(name.into());
        self
    }

    /// Override the transition key followed during termination.
    pub fn termination_key(mut self, key: impl Into<String>) -> Self {
        self.termination_key = key.into();
        self
    }

    pub fn state(mut self, state: State) -> Self {
        self.states.push(state);
        self
    }

    /// Validate and freeze the graph.
    pub fn build(self) -> Result<StateGraph, StateGraphError> {
        let graph_name = self.name.clone();

        let mut index = HashMap::with_capacity(self.states.len());
        for (ix, state) in self.states.iter().enumerate() {
            if index.insert(state.name.clone(), ix).is_some() {
                return Err(StateGraphError::DuplicateState {
                    graph: graph_name,
                    name: state.name.clone(),
                });
            }
        }

        let initial_name = self
            .initial
            .ok_or_else(|| StateGraphError::MissingInitialState {
                graph: graph_name.clone(),
            })?;
        let initial = *index
            .get(&initial_name)
            .ok_or_else(|| StateGraphError::UnknownInitialState {
                graph: graph_name.clone(),
                name: initial_name.clone(),
            })?;

        if !self.states.iter().any(|s| s.terminal) {
            return Err(StateGraphError::NoTerminalState { graph: graph_name });
        }

        for state in &self.states {
            if state.terminal && !state.transitions.is_empty() {
                return Err(StateGraphError::TerminalTransition {
                    state: state.name.clone(),
                });
            }
            if state.transitions.iter().filter(|t| t.automatic).count() > 1 {
                return Err(StateGraphError::AmbiguousAutomatic {
                    state: state.name.clone(),
                });
            }
            let mut seen_keys = Vec::with_capacity(state.transitions.len());
            for transition in &state.transitions {
                if seen_keys.contains(&transition.key.as_str()) {
                    return Err(StateGraphError::DuplicateTransition {
                        state: state.name.clone(),
                        key: transition.key.clone(),
                    });
                }
                seen_keys.push(transition.key.as_str());
                if !index.contains_key(&transition.target) {
                    return Err(StateGraphError::UnknownTarget {
                        state: state.name.clone(),
                        key: transition.key.clone(),
                        target: transition.target.clone(),
                    });
                }
            }
            let mut seen_ops = Vec::with_capacity(state.operations.len());
            for operation in &state.operations {
                if seen_ops.contains(&operation.key.as_str()) {
                    return Err(StateGraphError::DuplicateOperation {
                        state: state.name.clone(),
                        key: operation.key.clone(),
                    });
                }
                seen_ops.push(operation.key.as_str());
            }
        }

        detect_cycle(&graph_name, &self.states, &index)?;

        Ok(StateGraph {
            name: self.name,
            initial,
            termination_key: self.termination_key,
            states: self.states,
            index,
        })
    }
}

/// Depth-first search over the transition digraph; reports the first cycle
/// found with its state path.
fn detect_cycle(
    graph: &str,
    states: &[State],
    index: &HashMap<String, usize>,
) -> Result<(), StateGraphError> {
    #[derive(Clone, Copy, PartialEq)]
    enum Mark {
        Unvisited,
        InProgress,
        Done,
    }

    fn visit(
        ix: usize,
        states: &[State],
        index: &HashMap<String, usize>,
        marks: &mut [Mark],
        trail: &mut Vec<usize>,
    ) -> Option<Vec<usize>> {
        marks[ix] = Mark::InProgress;
        trail.push(ix);
        for transition in states[ix].transitions() {
            let next = index[transition.target()];
            match marks[next] {
                Mark::InProgress => {
                    let start = trail.iter().position(|&t| t == next).unwrap_or(0);
                    let mut cycle = trail[start..].to_vec();
                    cycle.push(next);
                    return Some(cycle);
                }
                Mark::Unvisited => {
                    if let Some(cycle) = visit(next, states, index, marks, trail) {
                        return Some(cycle);
                    }
                }
                Mark::Done => {}
            }
        }
        trail.pop();
        marks[ix] = Mark::Done;
        None
    }

    let mut marks = vec![Mark::Unvisited; states.len()];
    for ix in 0..states.len() {
        if marks[ix] == Mark::Unvisited {
            let mut trail = Vec::new();
            if let Some(cycle) = visit(ix, states, index, &mut marks, &mut trail) {
                let path = cycle
                    .iter()
                    .map(|&c| states[c].name())
                    .collect::<Vec<_>>()
                    .join(" -> ");
                return Err(StateGraphError::CyclicGraph {
                    graph: graph.to_string(),
                    path,
                });
            }
        }
    }
    Ok(())
}
