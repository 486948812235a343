//! # Instance Wrapper and Isolation View
//!
//! Binds one raw component value to its own private state-machine run and
//! produces an isolation view exposing only the declared service
//! capabilities.
//!
//! ## Overview
//!
//! An [`Instance`] is created by a holder when its policy requires a new
//! runtime value. Construction seeds a fresh [`StateMachine`] from the
//! model's graph and immediately initializes it against the raw value;
//! failure aborts construction and the instance is never registered.
//!
//! The [`ServiceView`] forwards capability invocations to the raw value only
//! while the instance is available; after deactivation every call fails with
//! an unavailable error. Composition wiring uses [`Instance::value`] with
//! `isolate = false` to bypass the view.

pub mod creator;

use std::collections::HashSet;
use std::sync::Arc;

use serde_json::Value;
use tracing::debug;
use uuid::Uuid;

use crate::error::{ComponentError, Result};
use crate::model::{ComponentPath, Invocable};
use crate::state_machine::{
    ListenerSet, State, StateChange, StateChangeListener, StateGraph, StateMachine,
};

pub use creator::InstanceCreator;

/// Forwards machine transitions to listeners registered on the instance.
struct ListenerBridge(ListenerSet);

impl StateChangeListener for ListenerBridge {
    fn state_changed(
        &self,
        change: &StateChange,
    ) -> std::result::Result<(), Box<dyn std::error::Error + Send + Sync>> {
        self.0.notify(change);
        Ok(())
    }
}

/// The value a caller receives from [`Instance::value`].
#[derive(Clone)]
pub enum InstanceValue {
    /// Capability-gated isolation view.
    View(ServiceView),
    /// The raw implementation value, bypassing isolation.
    Raw(Arc<dyn Invocable>),
}

/// One raw implementation value plus its private running state machine.
pub struct Instance {
    id: Uuid,
    path: ComponentPath,
    raw: Arc<dyn Invocable>,
    machine: StateMachine,
    capabilities: Arc<HashSet<String>>,
    listeners: ListenerSet,
    me: std::sync::Weak<Instance>,
}

impl Instance {
    /// Create and activate a new instance: seed a private machine from the
    /// graph and run it to the first stable state. Fails if initialization
    /// does not complete; a failed instance is never returned to callers.
    pub(crate) fn new(
        path: ComponentPath,
        raw: Arc<dyn Invocable>,
        capabilities: Arc<HashSet<String>>,
        graph: Arc<StateGraph>,
    ) -> Result<Arc<Self>> {
        let machine = StateMachine::new(graph);
        let listeners = ListenerSet::new();
        machine.add_listener(Arc::new(ListenerBridge(listeners.clone())));

        let instance = Arc::new_cyclic(|me| Self {
            id: Uuid::new_v4(),
            path,
            raw,
            machine,
            capabilities,
            listeners,
            me: me.clone(),
        });

        let state = instance
            .machine
            .initialize(instance.raw.as_ref())
            .map_err(|e| ComponentError::lifecycle(&instance.path, e))?;
        debug!(
            path = %instance.path,
            instance_id = %instance.id,
            state = state.name(),
            "instance activated"
        );
        Ok(instance)
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn path(&self) -> &ComponentPath {
        &self.path
    }

    /// Current lifecycle state.
    pub fn state(&self) -> Result<State> {
        self.machine
            .current_state()
            .map_err(|e| ComponentError::lifecycle(&self.path, e))
    }

    /// Whether the instance is available for capability invocations.
    pub fn is_available(&self) -> bool {
        self.machine.is_active()
    }

    /// Apply a named lifecycle transition against the raw value.
    pub fn apply(&self, key: &str) -> Result<State> {
        self.machine
            .apply(key, self.raw.as_ref())
            .map_err(|e| ComponentError::lifecycle(&self.path, e))
    }

    /// Execute a state-bound operation against the raw value.
    pub fn execute(&self, key: &str) -> Result<Value> {
        self.machine
            .execute(key, self.raw.as_ref())
            .map_err(|e| ComponentError::lifecycle(&self.path, e))
    }

    /// Register a listener for this instance's state changes. Machine
    /// notifications are re-published one level, without transformation.
    pub fn add_listener(&self, listener: Arc<dyn StateChangeListener>) {
        self.listeners.add(listener);
    }

    /// The isolation view. Never returned while the instance is not in an
    /// available state.
    pub fn view(&self) -> Result<ServiceView> {
        if !self.is_available() {
            return Err(ComponentError::unavailable(&self.path));
        }
        // Instances only exist behind an Arc, so the self-weak upgrades
        // while any caller can reach this method.
        let instance = self
            .me
            .upgrade()
            .ok_or_else(|| ComponentError::unavailable(&self.path))?;
        Ok(ServiceView { instance })
    }

    /// `isolate = true` returns the isolation view; `false` returns the raw
    /// value directly (used by composition wiring).
    pub fn value(&self, isolate: bool) -> Result<InstanceValue> {
        if isolate {
            self.view().map(InstanceValue::View)
        } else {
            Ok(InstanceValue::Raw(self.raw.clone()))
        }
    }

    /// The raw value, bypassing isolation.
    pub(crate) fn raw_value(&self) -> Arc<dyn Invocable> {
        self.raw.clone()
    }

    /// Run the machine toward a terminal state, best-effort. Idempotent.
    pub fn deactivate(&self) {
        if !self.machine.is_active() {
            return;
        }
        let state = self.machine.terminate(self.raw.as_ref());
        debug!(
            path = %self.path,
            instance_id = %self.id,
            state = state.name(),
            "instance deactivated"
        );
    }

    /// Deactivate if necessary, then dispose of the private machine.
    pub fn dispose(&self) {
        self.deactivate();
        self.machine.dispose();
        debug!(path = %self.path, instance_id = %self.id, "instance disposed");
    }
}

impl std::fmt::Debug for Instance {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Instance")
            .field("id", &self.id)
            .field("path", &self.path)
            .field("available", &self.is_available())
            .finish()
    }
}

/// Restricted facade exposing only the declared service capabilities of one
/// instance.
#[derive(Clone)]
pub struct ServiceView {
    instance: Arc<Instance>,
}

impl ServiceView {
    /// Invoke an operation through a declared capability. Fails with an
    /// unknown-capability error for undeclared capabilities and with an
    /// unavailable error once the instance has been deactivated.
    pub fn invoke(&self, capability: &str, operation: &str, input: Value) -> Result<Value> {
        if !self.instance.capabilities.contains(capability) {
            return Err(ComponentError::unknown_capability(
                &self.instance.path,
                capability,
            ));
        }
        if !self.instance.is_available() {
            return Err(ComponentError::unavailable(&self.instance.path));
        }
        self.instance
            .raw
            .invoke(operation, input)
            .map_err(|e| ComponentError::invocation(&self.instance.path, e))
    }

    pub fn capabilities(&self) -> &HashSet<String> {
        self.instance.capabilities.as_ref()
    }

    pub fn instance_id(&self) -> Uuid {
        self.instance.id
    }
}

impl std::fmt::Debug for ServiceView {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServiceView")
            .field("path", &self.instance.path)
            .field("capabilities", &self.instance.capabilities)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::InvocationError;
    use crate::state_machine::{StateGraph, Transition};
    use crate::state_machine::graph::State as GraphState;
    use serde_json::json;

    struct Echo;

    impl Invocable for Echo {
        fn invoke(
            &self,
            operation: &str,
            input: Value,
        ) -> std::result::Result<Value, InvocationError> {
            match operation {
                "echo" => Ok(input),
                "start" | "shutdown" => Ok(Value::Null),
                other => Err(InvocationError::unknown_operation(other)),
            }
        }
    }

    fn graph() -> Arc<StateGraph> {
        Arc::new(
            StateGraph::builder("echo")
                .initial("new")
                .state(GraphState::new("new").transition(Transition::new("boot", "ready").automatic()))
                .state(
                    GraphState::new("ready")
                        .entry_action("start")
                        .transition(Transition::new("terminate", "stopped")),
                )
                .state(GraphState::new("stopped").entry_action("shutdown").terminal())
                .build()
                .unwrap(),
        )
    }

    fn capabilities() -> Arc<HashSet<String>> {
        Arc::new(["echo-service".to_string()].into_iter().collect())
    }

    fn new_instance() -> Arc<Instance> {
        Instance::new(
            ComponentPath::root("echo"),
            Arc::new(Echo),
            capabilities(),
            graph(),
        )
        .unwrap()
    }

    #[test]
    fn test_construction_initializes_machine() {
        let instance = new_instance();
        assert!(instance.is_available());
        assert_eq!(instance.state().unwrap().name(), "ready");
    }

    #[test]
    fn test_view_forwards_declared_capability() {
        let instance = new_instance();
        let view = instance.view().unwrap();
        let result = view.invoke("echo-service", "echo", json!("hi")).unwrap();
        assert_eq!(result, json!("hi"));
    }

    #[test]
    fn test_view_rejects_undeclared_capability() {
        let instance = new_instance();
        let view = instance.view().unwrap();
        let err = view.invoke("admin", "echo", json!(null)).unwrap_err();
        assert!(matches!(err, ComponentError::UnknownCapability { .. }));
    }

    #[test]
    fn test_view_fails_after_deactivation() {
        let instance = new_instance();
        let view = instance.view().unwrap();
        instance.deactivate();

        let err = view.invoke("echo-service", "echo", json!(null)).unwrap_err();
        assert!(matches!(err, ComponentError::Unavailable { .. }));
        assert!(matches!(
            instance.view().unwrap_err(),
            ComponentError::Unavailable { .. }
        ));
    }

    #[test]
    fn test_raw_value_bypasses_isolation() {
        let instance = new_instance();
        match instance.value(false).unwrap() {
            InstanceValue::Raw(raw) => {
                // undeclared as capability, still reachable on the raw value
                assert_eq!(raw.invoke("echo", json!(1)).unwrap(), json!(1));
            }
            InstanceValue::View(_) => panic!("expected raw value"),
        }
    }

    #[test]
    fn test_failed_initialization_aborts_construction() {
        struct FailsOnStart;
        impl Invocable for FailsOnStart {
            fn invoke(
                &self,
                operation: &str,
                _input: Value,
            ) -> std::result::Result<Value, InvocationError> {
                Err(InvocationError::failed(operation, "boom"))
            }
        }

        let err = Instance::new(
            ComponentPath::root("broken"),
            Arc::new(FailsOnStart),
            capabilities(),
            graph(),
        )
        .unwrap_err();
        assert!(matches!(err, ComponentError::Lifecycle { .. }));
    }

    #[test]
    fn test_listener_repropagation() {
        use parking_lot::Mutex;

        struct Recorder(Mutex<Vec<String>>);
        impl StateChangeListener for Recorder {
            fn state_changed(
                &self,
                change: &StateChange,
            ) -> std::result::Result<(), Box<dyn std::error::Error + Send + Sync>> {
                self.0.lock().push(change.to.clone());
                Ok(())
            }
        }

        let instance = new_instance();
        let recorder = Arc::new(Recorder(Mutex::new(Vec::new())));
        instance.add_listener(recorder.clone());

        instance.deactivate();
        assert_eq!(recorder.0.lock().clone(), vec!["stopped".to_string()]);
    }

    #[test]
    fn test_deactivate_is_idempotent() {
        let instance = new_instance();
        instance.deactivate();
        instance.deactivate();
        assert!(!instance.is_available());
    }
}
