//! # System Constants
//!
//! Well-known event names, default keys, and configuration boundaries shared
//! across the assembly runtime.

/// Core lifecycle events published through the event system
pub mod events {
    // Component lifecycle events
    pub const COMPONENT_ACTIVATED: &str = "component.activated";
    pub const COMPONENT_ACTIVATION_FAILED: &str = "component.activation_failed";
    pub const COMPONENT_DEACTIVATED: &str = "component.deactivated";
    pub const COMPONENT_DISPOSED: &str = "component.disposed";

    // Instance lifecycle events
    pub const INSTANCE_CREATED: &str = "instance.created";
}

/// Transition key followed during best-effort termination unless a graph
/// overrides it.
pub const DEFAULT_TERMINATION_KEY: &str = "terminate";

/// Default bound of each subscriber's event channel.
pub const DEFAULT_EVENT_CAPACITY: usize = 1000;

/// Prefix for environment-variable configuration overrides.
pub const ENV_PREFIX: &str = "ASSEMBLY";
