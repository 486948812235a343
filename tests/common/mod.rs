//! Shared fixtures for integration tests.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;
use serde_json::{json, Value};

use assembly_core::model::{
    factory_fn, FactoryError, InstanceFactory, InvocationError, Invocable,
};
use assembly_core::state_machine::graph::State;
use assembly_core::state_machine::{StateGraph, Transition};

/// Component value that records every operation invoked against it.
pub struct Probe {
    pub label: String,
    calls: Mutex<Vec<String>>,
}

impl Probe {
    pub fn new(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().clone()
    }
}

impl Invocable for Probe {
    fn invoke(&self, operation: &str, input: Value) -> Result<Value, InvocationError> {
        self.calls.lock().push(operation.to_string());
        match operation {
            "describe" => Ok(json!({"label": self.label, "input": input})),
            _ => Ok(Value::Null),
        }
    }
}

/// Factory producing a fresh [`Probe`] per call, counting creations.
pub struct CountingFactory {
    pub created: Arc<AtomicUsize>,
    pub factory: Arc<dyn InstanceFactory>,
}

pub fn counting_factory(label: &str) -> CountingFactory {
    let created = Arc::new(AtomicUsize::new(0));
    let counter = created.clone();
    let label = label.to_string();
    let factory = factory_fn(move |_context| {
        counter.fetch_add(1, Ordering::SeqCst);
        Ok(Arc::new(Probe::new(label.clone())) as Arc<dyn Invocable>)
    });
    CountingFactory { created, factory }
}

/// Factory that fails its first `failures` calls, then succeeds.
pub fn flaky_factory(failures: usize) -> Arc<dyn InstanceFactory> {
    let attempts = AtomicUsize::new(0);
    factory_fn(move |context| {
        if attempts.fetch_add(1, Ordering::SeqCst) < failures {
            return Err(FactoryError::instantiation(
                context.path().as_str(),
                "dependency not ready",
            ));
        }
        Ok(Arc::new(Probe::new("flaky")) as Arc<dyn Invocable>)
    })
}

/// `new --boot(auto)--> ready --stop--> stopped`, with a termination edge
/// from `ready` so deactivation reaches the terminal state.
pub fn lifecycle_graph() -> Arc<StateGraph> {
    Arc::new(
        StateGraph::builder("lifecycle")
            .initial("new")
            .state(State::new("new").transition(Transition::new("boot", "ready").automatic()))
            .state(
                State::new("ready")
                    .entry_action("start")
                    .transition(Transition::new("stop", "stopped"))
                    .transition(Transition::new("terminate", "stopped")),
            )
            .state(State::new("stopped").entry_action("shutdown").terminal())
            .build()
            .expect("fixture graph is valid"),
    )
}
