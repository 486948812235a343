// Event system foundation
//
// Lifecycle events are published as named records with JSON context so that
// hosts can observe activation, deactivation and disposal without coupling
// to handler internals.

pub mod publisher;

pub use publisher::{EventPublisher, PublishError, PublishedEvent};
