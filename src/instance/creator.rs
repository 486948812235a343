//! # Instance Creator
//!
//! Captures everything a holder needs to produce a new activated instance:
//! the resolved capability set and graph, the external factory, and the part
//! handlers whose raw values are wired into construction arguments.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use serde_json::json;
use tracing::debug;

use super::Instance;
use crate::constants::events::INSTANCE_CREATED;
use crate::error::{ComponentError, Result};
use crate::events::EventPublisher;
use crate::handler::ComponentHandler;
use crate::model::{ComponentPath, CreationContext, InstanceFactory, Invocable};
use crate::state_machine::StateGraph;

/// Builds activated instances for one component position.
pub struct InstanceCreator {
    path: ComponentPath,
    factory: Arc<dyn InstanceFactory>,
    capabilities: Arc<HashSet<String>>,
    graph: Arc<StateGraph>,
    parts: HashMap<String, Arc<ComponentHandler>>,
    publisher: EventPublisher,
}

impl InstanceCreator {
    pub(crate) fn new(
        path: ComponentPath,
        factory: Arc<dyn InstanceFactory>,
        capabilities: Arc<HashSet<String>>,
        graph: Arc<StateGraph>,
        parts: HashMap<String, Arc<ComponentHandler>>,
        publisher: EventPublisher,
    ) -> Self {
        Self {
            path,
            factory,
            capabilities,
            graph,
            parts,
            publisher,
        }
    }

    pub fn path(&self) -> &ComponentPath {
        &self.path
    }

    /// Create a raw value through the external factory and activate it.
    /// Factory failures are wrapped and propagated without retry; a value
    /// whose initialization fails is never returned.
    pub fn create(&self) -> Result<Arc<Instance>> {
        let context = self.creation_context();
        let raw = self
            .factory
            .create(&context)
            .map_err(|e| ComponentError::instantiation(&self.path, e))?;

        let instance = Instance::new(
            self.path.clone(),
            raw,
            self.capabilities.clone(),
            self.graph.clone(),
        )?;

        let _ = self.publisher.publish(
            INSTANCE_CREATED,
            json!({
                "path": self.path.as_str(),
                "instance_id": instance.id().to_string(),
            }),
        );
        debug!(path = %self.path, instance_id = %instance.id(), "created new instance");
        Ok(instance)
    }

    /// Resolved construction arguments: raw values of currently-active
    /// parts. A part that is inactive or cannot supply an instance is simply
    /// absent; factories decide whether that is fatal.
    fn creation_context(&self) -> CreationContext {
        let mut parts: HashMap<String, Arc<dyn Invocable>> = HashMap::new();
        for (key, handler) in &self.parts {
            if !handler.is_active() {
                continue;
            }
            match handler.get_instance() {
                Ok(instance) => {
                    parts.insert(key.clone(), instance.raw_value());
                }
                Err(error) => {
                    debug!(
                        path = %self.path,
                        part = key.as_str(),
                        error = %error,
                        "part instance unavailable for construction wiring"
                    );
                }
            }
        }
        CreationContext::new(self.path.clone(), parts)
    }
}

impl std::fmt::Debug for InstanceCreator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InstanceCreator")
            .field("path", &self.path)
            .field("graph", &self.graph.name())
            .field("parts", &self.parts.keys().collect::<Vec<_>>())
            .finish()
    }
}
