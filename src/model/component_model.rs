//! # Component Model
//!
//! The immutable descriptor of a component: identity path, implementation
//! factory, declared capability set, the three policy axes, a state graph,
//! and the keyed sub-models of composed parts.
//!
//! ## Overview
//!
//! Models own nothing mutable and are freely shared across handlers and
//! threads behind `Arc`. Part keys are unique within a model; part paths are
//! re-rooted under the parent when the model is built, so every position in a
//! composition tree carries its full hierarchical identity.

use std::collections::HashMap;
use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use super::contracts::InstanceFactory;
use super::policies::{ActivationPolicy, CollectionPolicy, LifestylePolicy};
use crate::error::ComponentError;
use crate::state_machine::StateGraph;

/// Hierarchical component identity, normalized to `/segment/segment` form.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ComponentPath(String);

impl ComponentPath {
    /// A root-level path for a named component.
    pub fn root(name: &str) -> Self {
        Self(format!("/{}", name.trim_matches('/')))
    }

    /// The path of a part keyed under this component.
    pub fn child(&self, key: &str) -> Self {
        Self(format!("{}/{}", self.0, key.trim_matches('/')))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Path segments, outermost first.
    pub fn segments(&self) -> Vec<&str> {
        self.0.split('/').filter(|s| !s.is_empty()).collect()
    }

    /// The final segment.
    pub fn name(&self) -> &str {
        self.segments().last().copied().unwrap_or("")
    }
}

impl fmt::Display for ComponentPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Immutable component descriptor.
#[derive(Clone)]
pub struct ComponentModel {
    path: ComponentPath,
    factory: Arc<dyn InstanceFactory>,
    capabilities: HashSet<String>,
    lifestyle: LifestylePolicy,
    collection: CollectionPolicy,
    activation: ActivationPolicy,
    graph: Arc<StateGraph>,
    parts: HashMap<String, Arc<ComponentModel>>,
}

impl ComponentModel {
    pub fn builder(name: &str, factory: Arc<dyn InstanceFactory>) -> ComponentModelBuilder {
        ComponentModelBuilder::new(name, factory)
    }

    pub fn path(&self) -> &ComponentPath {
        &self.path
    }

    pub fn factory(&self) -> &Arc<dyn InstanceFactory> {
        &self.factory
    }

    pub fn capabilities(&self) -> &HashSet<String> {
        &self.capabilities
    }

    pub fn lifestyle(&self) -> LifestylePolicy {
        self.lifestyle
    }

    pub fn collection(&self) -> CollectionPolicy {
        self.collection
    }

    pub fn activation(&self) -> ActivationPolicy {
        self.activation
    }

    pub fn graph(&self) -> &Arc<StateGraph> {
        &self.graph
    }

    pub fn parts(&self) -> &HashMap<String, Arc<ComponentModel>> {
        &self.parts
    }

    pub fn part(&self, key: &str) -> Option<&Arc<ComponentModel>> {
        self.parts.get(key)
    }

    /// Clone this model with its identity (and every part's identity)
    /// re-rooted under `path`.
    fn rerooted(&self, path: ComponentPath) -> ComponentModel {
        let parts = self
            .parts
            .iter()
            .map(|(key, part)| {
                let child = part.rerooted(path.child(key));
                (key.clone(), Arc::new(child))
            })
            .collect();
        ComponentModel {
            path,
            factory: self.factory.clone(),
            capabilities: self.capabilities.clone(),
            lifestyle: self.lifestyle,
            collection: self.collection,
            activation: self.activation,
            graph: self.graph.clone(),
            parts,
        }
    }
}

impl fmt::Debug for ComponentModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ComponentModel")
            .field("path", &self.path)
            .field("capabilities", &self.capabilities)
            .field("lifestyle", &self.lifestyle)
            .field("collection", &self.collection)
            .field("activation", &self.activation)
            .field("graph", &self.graph.name())
            .field("parts", &self.parts.keys().collect::<Vec<_>>())
            .finish()
    }
}

/// Builder for [`ComponentModel`].
pub struct ComponentModelBuilder {
    name: String,
    factory: Arc<dyn InstanceFactory>,
    capabilities: HashSet<String>,
    lifestyle: LifestylePolicy,
    collection: CollectionPolicy,
    activation: ActivationPolicy,
    graph: Option<Arc<StateGraph>>,
    parts: Vec<(String, ComponentModel)>,
}

impl ComponentModelBuilder {
    pub fn new(name: &str, factory: Arc<dyn InstanceFactory>) -> Self {
        Self {
            name: name.to_string(),
            factory,
            capabilities: HashSet::new(),
            lifestyle: LifestylePolicy::default(),
            collection: CollectionPolicy::default(),
            activation: ActivationPolicy::default(),
            graph: None,
            parts: Vec::new(),
        }
    }

    /// Declare a service capability exposed through the isolation view.
    pub fn capability(mut self, name: impl Into<String>) -> Self {
        self.capabilities.insert(name.into());
        self
    }

    pub fn lifestyle(mut self, policy: LifestylePolicy) -> Self {
        self.lifestyle = policy;
        self
    }

    pub fn collection(mut self, policy: CollectionPolicy) -> Self {
        self.collection = policy;
        self
    }

    pub fn activation(mut self, policy: ActivationPolicy) -> Self {
        self.activation = policy;
        self
    }

    /// Attach the lifecycle graph. Components without one get
    /// [`StateGraph::inert`].
    pub fn graph(mut self, graph: Arc<StateGraph>) -> Self {
        self.graph = Some(graph);
        self
    }

    /// Compose a child component under `key`. Keys must be unique; the
    /// child's identity is re-rooted under this model at build time.
    pub fn part(mut self, key: impl Into<String>, model: ComponentModel) -> Self {
        self.parts.push((key.into(), model));
        self
    }

    pub fn build(self) -> Result<ComponentModel, ComponentError> {
        let path = ComponentPath::root(&self.name);
        let mut parts = HashMap::with_capacity(self.parts.len());
        for (key, model) in self.parts {
            let child = model.rerooted(path.child(&key));
            if parts.insert(key.clone(), Arc::new(child)).is_some() {
                return Err(ComponentError::configuration(format!(
                    "component '{path}' declares part '{key}' more than once"
                )));
            }
        }
        Ok(ComponentModel {
            path,
            factory: self.factory,
            capabilities: self.capabilities,
            lifestyle: self.lifestyle,
            collection: self.collection,
            activation: self.activation,
            graph: self.graph.unwrap_or_else(|| Arc::new(StateGraph::inert())),
            parts,
        })
    }
}
