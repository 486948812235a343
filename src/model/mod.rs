// Component model module
//
// Immutable component descriptors (identity, factory, capabilities, policies,
// state graph, parts) plus the contracts implemented by external
// collaborators: instance factories, type resolvers and the dynamic
// operation-dispatch surface of component values.

pub mod component_model;
pub mod contracts;
pub mod policies;

// Re-export main types for convenient access
pub use component_model::{ComponentModel, ComponentModelBuilder, ComponentPath};
pub use contracts::{
    factory_fn, CreationContext, FactoryError, FnFactory, InstanceFactory, InvocationError,
    Invocable, ModelTypeResolver, ResolvedComponent, ResolverError, TypeResolver,
};
pub use policies::{ActivationPolicy, CollectionPolicy, LifestylePolicy};
