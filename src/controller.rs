//! # Assembly Controller
//!
//! Top-level factory translating component models into handler trees, and
//! the seam through which the surrounding system drives activation and
//! deactivation.
//!
//! ## Overview
//!
//! The controller is the only constructor of handlers. Trees are built
//! depth-first, children before parents; failure of any child construction
//! is fatal to the parent's construction, so no partial trees escape.
//!
//! There is deliberately no process-wide controller singleton: hosts
//! construct one explicitly (usually via [`Controller::builder`]) and pass
//! the handle to whatever drives the tree.

use std::collections::HashMap;
use std::sync::Arc;

use tracing::debug;

use crate::config::AssemblyConfig;
use crate::error::{ComponentError, Result};
use crate::events::EventPublisher;
use crate::handler::ComponentHandler;
use crate::model::{ComponentModel, ModelTypeResolver, TypeResolver};

/// Top-level handler factory and activation seam.
pub struct Controller {
    resolver: Arc<dyn TypeResolver>,
    config: AssemblyConfig,
    publisher: EventPublisher,
}

impl Controller {
    /// A controller with default resolution and configuration.
    pub fn new() -> Self {
        Self::builder().build()
    }

    pub fn builder() -> ControllerBuilder {
        ControllerBuilder::default()
    }

    pub fn config(&self) -> &AssemblyConfig {
        &self.config
    }

    /// The publisher every handler built by this controller reports through.
    pub fn publisher(&self) -> &EventPublisher {
        &self.publisher
    }

    /// Build the handler tree for a model, children before parent. Type
    /// resolution failures and child construction failures abort the whole
    /// subtree build.
    pub fn create_handler(&self, model: &Arc<ComponentModel>) -> Result<Arc<ComponentHandler>> {
        let resolved = self
            .resolver
            .resolve(model)
            .map_err(|e| ComponentError::model_load(model.path(), e.to_string()))?;

        let mut parts = HashMap::with_capacity(model.parts().len());
        for (key, part_model) in model.parts() {
            let part = self.create_handler(part_model)?;
            parts.insert(key.clone(), part);
        }

        let handler = ComponentHandler::new(
            model.clone(),
            resolved,
            parts,
            &self.config,
            self.publisher.clone(),
        );
        debug!(path = %handler.path(), "handler tree node constructed");
        Ok(handler)
    }

    /// Activate a handler (and, through it, its startup-policy parts).
    pub fn activate(&self, handler: &ComponentHandler) -> Result<()> {
        handler.activate()
    }

    /// Deactivate a handler tree. Never raises.
    pub fn deactivate(&self, handler: &ComponentHandler) {
        handler.deactivate();
    }

    /// Dispose of a handler tree. Never raises.
    pub fn dispose(&self, handler: &ComponentHandler) {
        handler.dispose();
    }
}

impl Default for Controller {
    fn default() -> Self {
        Self::new()
    }
}

/// Builder for [`Controller`] with explicit dependency injection.
#[derive(Default)]
pub struct ControllerBuilder {
    resolver: Option<Arc<dyn TypeResolver>>,
    config: Option<AssemblyConfig>,
    publisher: Option<EventPublisher>,
}

impl ControllerBuilder {
    pub fn resolver(mut self, resolver: Arc<dyn TypeResolver>) -> Self {
        self.resolver = Some(resolver);
        self
    }

    pub fn config(mut self, config: AssemblyConfig) -> Self {
        self.config = Some(config);
        self
    }

    pub fn publisher(mut self, publisher: EventPublisher) -> Self {
        self.publisher = Some(publisher);
        self
    }

    pub fn build(self) -> Controller {
        let config = self.config.unwrap_or_default();
        let publisher = self
            .publisher
            .unwrap_or_else(|| EventPublisher::new(config.event_capacity));
        Controller {
            resolver: self.resolver.unwrap_or_else(|| Arc::new(ModelTypeResolver)),
            config,
            publisher,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{
        factory_fn, InvocationError, Invocable, ResolverError,
    };
    use serde_json::Value;

    struct Noop;

    impl Invocable for Noop {
        fn invoke(
            &self,
            _operation: &str,
            _input: Value,
        ) -> std::result::Result<Value, InvocationError> {
            Ok(Value::Null)
        }
    }

    fn noop_model(name: &str) -> ComponentModel {
        ComponentModel::builder(name, factory_fn(|_| Ok(Arc::new(Noop) as Arc<dyn Invocable>)))
            .build()
            .unwrap()
    }

    #[test]
    fn test_tree_construction_builds_children() {
        let model = Arc::new(
            ComponentModel::builder(
                "server",
                factory_fn(|_| Ok(Arc::new(Noop) as Arc<dyn Invocable>)),
            )
            .part("db", noop_model("db"))
            .part("web", noop_model("web"))
            .build()
            .unwrap(),
        );

        let controller = Controller::new();
        let handler = controller.create_handler(&model).unwrap();

        let db = handler.get_part_handler("db").unwrap();
        let web = handler.get_part_handler("web").unwrap();
        assert_ne!(db.path(), web.path());
        assert_eq!(db.path().as_str(), "/server/db");

        let err = handler.get_part_handler("cache").unwrap_err();
        assert!(matches!(err, ComponentError::UnknownPart { .. }));
    }

    #[test]
    fn test_resolver_failure_aborts_build() {
        struct Refusing;
        impl TypeResolver for Refusing {
            fn resolve(
                &self,
                model: &ComponentModel,
            ) -> std::result::Result<crate::model::ResolvedComponent, ResolverError> {
                Err(ResolverError::new(model.path().as_str(), "unknown type"))
            }
        }

        let controller = Controller::builder().resolver(Arc::new(Refusing)).build();
        let model = Arc::new(noop_model("orphan"));

        let err = controller.create_handler(&model).unwrap_err();
        assert!(matches!(err, ComponentError::ModelLoad { .. }));
    }

    #[test]
    fn test_child_failure_is_fatal_to_parent() {
        struct ChildRefusing;
        impl TypeResolver for ChildRefusing {
            fn resolve(
                &self,
                model: &ComponentModel,
            ) -> std::result::Result<crate::model::ResolvedComponent, ResolverError> {
                if model.path().as_str().ends_with("/bad") {
                    return Err(ResolverError::new(model.path().as_str(), "broken part"));
                }
                ModelTypeResolver.resolve(model)
            }
        }

        let model = Arc::new(
            ComponentModel::builder(
                "parent",
                factory_fn(|_| Ok(Arc::new(Noop) as Arc<dyn Invocable>)),
            )
            .part("bad", noop_model("bad"))
            .build()
            .unwrap(),
        );

        let controller = Controller::builder()
            .resolver(Arc::new(ChildRefusing))
            .build();
        let err = controller.create_handler(&model).unwrap_err();
        assert!(matches!(err, ComponentError::ModelLoad { .. }));
    }

    #[test]
    fn test_activation_passthrough() {
        let controller = Controller::new();
        let model = Arc::new(noop_model("simple"));
        let handler = controller.create_handler(&model).unwrap();

        controller.activate(&handler).unwrap();
        assert!(handler.is_active());
        controller.deactivate(&handler);
        assert!(!handler.is_active());
    }
}
