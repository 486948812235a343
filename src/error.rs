//! # Component Error Types
//!
//! Crate-level error taxonomy using thiserror for structured error types
//! instead of `Box<dyn Error>` patterns. Every runtime variant carries the
//! component path so per-call failures are diagnosable at the caller.
//!
//! Construction-time errors (`ModelLoad`, `Configuration`) are fatal and
//! non-recoverable; per-call errors surface to the immediate caller; teardown
//! never raises past its own boundary.

use thiserror::Error;

use crate::model::{ComponentPath, FactoryError, InvocationError};
use crate::state_machine::StateMachineError;

/// Comprehensive component runtime error types
#[derive(Error, Debug)]
pub enum ComponentError {
    #[error("model load failed for component '{path}': {message}")]
    ModelLoad { path: String, message: String },

    #[error("instantiation failed for component '{path}'")]
    Instantiation {
        path: String,
        #[source]
        source: FactoryError,
    },

    #[error("lifecycle error for component '{path}'")]
    Lifecycle {
        path: String,
        #[source]
        source: StateMachineError,
    },

    #[error("invocation failed for component '{path}'")]
    Invocation {
        path: String,
        #[source]
        source: InvocationError,
    },

    #[error("component '{path}' is not active")]
    NotActive { path: String },

    #[error("instance of component '{path}' is no longer available")]
    Unavailable { path: String },

    #[error("component '{path}' has been disposed")]
    Disposed { path: String },

    #[error("component '{path}' does not declare part '{key}'")]
    UnknownPart { path: String, key: String },

    #[error("component '{path}' does not expose capability '{capability}'")]
    UnknownCapability { path: String, capability: String },

    #[error("configuration error: {message}")]
    Configuration { message: String },
}

impl ComponentError {
    /// Create a model-load error
    pub fn model_load(path: &ComponentPath, message: impl Into<String>) -> Self {
        Self::ModelLoad {
            path: path.to_string(),
            message: message.into(),
        }
    }

    /// Wrap a factory failure
    pub fn instantiation(path: &ComponentPath, source: FactoryError) -> Self {
        Self::Instantiation {
            path: path.to_string(),
            source,
        }
    }

    /// Wrap a state-machine failure
    pub fn lifecycle(path: &ComponentPath, source: StateMachineError) -> Self {
        Self::Lifecycle {
            path: path.to_string(),
            source,
        }
    }

    /// Wrap an invocation failure
    pub fn invocation(path: &ComponentPath, source: InvocationError) -> Self {
        Self::Invocation {
            path: path.to_string(),
            source,
        }
    }

    /// Create a not-active precondition error
    pub fn not_active(path: &ComponentPath) -> Self {
        Self::NotActive {
            path: path.to_string(),
        }
    }

    /// Create an unavailable precondition error
    pub fn unavailable(path: &ComponentPath) -> Self {
        Self::Unavailable {
            path: path.to_string(),
        }
    }

    /// Create a disposed precondition error
    pub fn disposed(path: &ComponentPath) -> Self {
        Self::Disposed {
            path: path.to_string(),
        }
    }

    /// Create an unknown-part error
    pub fn unknown_part(path: &ComponentPath, key: impl Into<String>) -> Self {
        Self::UnknownPart {
            path: path.to_string(),
            key: key.into(),
        }
    }

    /// Create an unknown-capability error
    pub fn unknown_capability(path: &ComponentPath, capability: impl Into<String>) -> Self {
        Self::UnknownCapability {
            path: path.to_string(),
            capability: capability.into(),
        }
    }

    /// Create a configuration error
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, ComponentError>;
