//! # External Collaborator Contracts
//!
//! The seams between this core and the surrounding system: the dynamic
//! operation-dispatch surface implemented by component values, the instance
//! factory that produces raw values, and the type resolver that supplies the
//! effective capability set and state graph for a model.
//!
//! ## Overview
//!
//! Component implementations expose a single string-keyed, JSON-in/JSON-out
//! dispatch surface ([`Invocable`]). State-graph entry actions, state-bound
//! operations and capability invocations all travel through it, so a
//! component's runtime surface is exactly as dynamic as its declared model:
//! invalid names are caught by the validated graph or the declared capability
//! set, not discovered per call.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use serde_json::Value;
use thiserror::Error;

use super::component_model::{ComponentModel, ComponentPath};
use crate::state_machine::StateGraph;

/// Error raised by [`Invocable::invoke`].
#[derive(Error, Debug)]
pub enum InvocationError {
    #[error("operation '{operation}' is not supported")]
    UnknownOperation { operation: String },

    #[error("operation '{operation}' failed: {message}")]
    Failed { operation: String, message: String },
}

impl InvocationError {
    /// Create an unknown-operation error
    pub fn unknown_operation(operation: impl Into<String>) -> Self {
        Self::UnknownOperation {
            operation: operation.into(),
        }
    }

    /// Create an operation-failure error
    pub fn failed(operation: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Failed {
            operation: operation.into(),
            message: message.into(),
        }
    }
}

/// Dynamic named-operation dispatch implemented by raw component values.
pub trait Invocable: Send + Sync {
    /// Invoke a named operation with a JSON payload.
    fn invoke(&self, operation: &str, input: Value) -> Result<Value, InvocationError>;
}

/// Errors raised by an external [`InstanceFactory`]; wrapped and propagated
/// without retry.
#[derive(Error, Debug)]
pub enum FactoryError {
    #[error("instantiation failed for component '{path}': {message}")]
    Instantiation { path: String, message: String },

    #[error("constructor invocation failed for component '{path}': {message}")]
    Invocation { path: String, message: String },
}

impl FactoryError {
    /// Create an instantiation error
    pub fn instantiation(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Instantiation {
            path: path.into(),
            message: message.into(),
        }
    }

    /// Create a constructor-invocation error
    pub fn invocation(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Invocation {
            path: path.into(),
            message: message.into(),
        }
    }
}

/// Resolved construction arguments handed to an [`InstanceFactory`].
///
/// Carries the component path and the raw values of currently-active parts,
/// letting a parent wire child implementations into its own construction
/// without going through the isolation view.
#[derive(Clone)]
pub struct CreationContext {
    path: ComponentPath,
    parts: HashMap<String, Arc<dyn Invocable>>,
}

impl CreationContext {
    pub(crate) fn new(path: ComponentPath, parts: HashMap<String, Arc<dyn Invocable>>) -> Self {
        Self { path, parts }
    }

    pub fn path(&self) -> &ComponentPath {
        &self.path
    }

    /// Raw value of an active part, if present.
    pub fn part(&self, key: &str) -> Option<&Arc<dyn Invocable>> {
        self.parts.get(key)
    }

    pub fn part_keys(&self) -> Vec<&str> {
        self.parts.keys().map(String::as_str).collect()
    }
}

impl std::fmt::Debug for CreationContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CreationContext")
            .field("path", &self.path)
            .field("parts", &self.parts.keys().collect::<Vec<_>>())
            .finish()
    }
}

/// Produces one raw component value per call.
pub trait InstanceFactory: Send + Sync {
    fn create(&self, context: &CreationContext) -> Result<Arc<dyn Invocable>, FactoryError>;
}

/// Closure adapter for [`InstanceFactory`].
pub struct FnFactory<F>(F);

impl<F> InstanceFactory for FnFactory<F>
where
    F: Fn(&CreationContext) -> Result<Arc<dyn Invocable>, FactoryError> + Send + Sync,
{
    fn create(&self, context: &CreationContext) -> Result<Arc<dyn Invocable>, FactoryError> {
        (self.0)(context)
    }
}

/// Wrap a closure as a shared instance factory.
pub fn factory_fn<F>(f: F) -> Arc<dyn InstanceFactory>
where
    F: Fn(&CreationContext) -> Result<Arc<dyn Invocable>, FactoryError> + Send + Sync + 'static,
{
    Arc::new(FnFactory(f))
}

/// The effective capability set and state graph for a component model.
#[derive(Debug, Clone)]
pub struct ResolvedComponent {
    pub capabilities: HashSet<String>,
    pub graph: Arc<StateGraph>,
}

/// Failure of type resolution; fatal at handler construction.
#[derive(Error, Debug)]
#[error("type resolution failed for component '{path}': {message}")]
pub struct ResolverError {
    pub path: String,
    pub message: String,
}

impl ResolverError {
    pub fn new(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            message: message.into(),
        }
    }
}

/// Resolves the concrete capability set and state graph for a model.
pub trait TypeResolver: Send + Sync {
    fn resolve(&self, model: &ComponentModel) -> Result<ResolvedComponent, ResolverError>;
}

/// Default resolver: trusts the model's own declarations.
#[derive(Debug, Clone, Copy, Default)]
pub struct ModelTypeResolver;

impl TypeResolver for ModelTypeResolver {
    fn resolve(&self, model: &ComponentModel) -> Result<ResolvedComponent, ResolverError> {
        Ok(ResolvedComponent {
            capabilities: model.capabilities().clone(),
            graph: model.graph().clone(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Echo;

    impl Invocable for Echo {
        fn invoke(&self, operation: &str, input: Value) -> Result<Value, InvocationError> {
            match operation {
                "echo" => Ok(input),
                other => Err(InvocationError::unknown_operation(other)),
            }
        }
    }

    #[test]
    fn test_factory_fn_adapter() {
        let factory = factory_fn(|_context| Ok(Arc::new(Echo) as Arc<dyn Invocable>));
        let context = CreationContext::new(ComponentPath::root("echo"), HashMap::new());
        let value = factory.create(&context).unwrap();
        assert_eq!(
            value.invoke("echo", serde_json::json!(42)).unwrap(),
            serde_json::json!(42)
        );
    }

    #[test]
    fn test_model_type_resolver_reads_declarations() {
        let factory = factory_fn(|_| Ok(Arc::new(Echo) as Arc<dyn Invocable>));
        let model = ComponentModel::builder("echo", factory)
            .capability("echo-service")
            .build()
            .unwrap();
        let resolved = ModelTypeResolver.resolve(&model).unwrap();
        assert!(resolved.capabilities.contains("echo-service"));
        assert_eq!(resolved.graph.name(), model.graph().name());
    }
}
