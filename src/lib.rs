#![allow(clippy::missing_errors_doc)] // Allow public functions without # Errors sections
#![allow(clippy::must_use_candidate)] // Allow methods without must_use when context is clear

//! # Assembly Core
//!
//! Component lifecycle and instance-management runtime.
//!
//! ## Overview
//!
//! Given a declarative [`ComponentModel`](model::ComponentModel) (an
//! implementation factory, a set of exposed service capabilities, a lifestyle
//! policy, a collection policy, an activation policy, and a state graph),
//! this crate creates, pools, isolates, and tears down runtime instances of
//! the component. It enforces at-most-one-concurrent-instance-per-identity
//! guarantees and drives every instance through an explicit finite-state
//! lifecycle.
//!
//! ## Architecture
//!
//! A [`Controller`](controller::Controller) translates a model tree into a
//! tree of [`ComponentHandler`](handler::ComponentHandler)s, children before
//! parents. Each handler owns exactly one pooling
//! [holder](holder::InstanceHolder) chosen by the model's lifestyle policy;
//! holders create [`Instance`](instance::Instance)s whose private
//! [`StateMachine`](state_machine::StateMachine) runs the declared graph to
//! establish availability. Callers receive a capability-gated
//! [`ServiceView`](instance::ServiceView) unless composition wiring
//! explicitly bypasses isolation.
//!
//! ## Module Organization
//!
//! - [`state_machine`] - Generic finite-state executor and graph validation
//! - [`model`] - Immutable component descriptors and collaborator contracts
//! - [`holder`] - Singleton, transient, and per-thread pooling strategies
//! - [`instance`] - Instance wrapper and capability isolation view
//! - [`handler`] - Per-component runtime controller
//! - [`controller`] - Handler-tree factory and activation seam
//! - [`config`] - Runtime configuration and policy defaults
//! - [`events`] - Lifecycle event publishing
//! - [`error`] - Structured error handling
//!
//! ## Quick Start
//!
//! ```rust
//! use assembly_core::controller::Controller;
//! use assembly_core::model::{
//!     factory_fn, ActivationPolicy, ComponentModel, InvocationError, Invocable,
//!     LifestylePolicy,
//! };
//! use serde_json::{json, Value};
//! use std::sync::Arc;
//!
//! struct Greeter;
//!
//! impl Invocable for Greeter {
//!     fn invoke(&self, operation: &str, input: Value) -> Result<Value, InvocationError> {
//!         match operation {
//!             "greet" => Ok(json!(format!("hello, {}", input.as_str().unwrap_or("world")))),
//!             other => Err(InvocationError::unknown_operation(other)),
//!         }
//!     }
//! }
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let factory = factory_fn(|_context| Ok(Arc::new(Greeter) as Arc<dyn Invocable>));
//!     let model = Arc::new(
//!         ComponentModel::builder("greeter", factory)
//!             .capability("greeting")
//!             .lifestyle(LifestylePolicy::Singleton)
//!             .activation(ActivationPolicy::Demand)
//!             .build()?,
//!     );
//!
//!     let controller = Controller::new();
//!     let handler = controller.create_handler(&model)?;
//!     controller.activate(&handler)?;
//!
//!     let instance = handler.get_instance()?;
//!     let view = instance.view()?;
//!     assert_eq!(
//!         view.invoke("greeting", "greet", json!("assembly"))?,
//!         json!("hello, assembly")
//!     );
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod constants;
pub mod controller;
pub mod error;
pub mod events;
pub mod handler;
pub mod holder;
pub mod instance;
pub mod logging;
pub mod model;
pub mod state_machine;

pub use config::AssemblyConfig;
pub use controller::{Controller, ControllerBuilder};
pub use error::{ComponentError, Result};
pub use events::{EventPublisher, PublishedEvent};
pub use handler::{ComponentHandler, HandlerStatus};
pub use holder::InstanceHolder;
pub use instance::{Instance, InstanceValue, ServiceView};
pub use model::{
    ActivationPolicy, CollectionPolicy, ComponentModel, ComponentPath, LifestylePolicy,
};
pub use state_machine::{StateGraph, StateMachine};
