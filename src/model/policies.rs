//! # Component Policies
//!
//! The three policy axes of a component model: lifestyle (instance sharing),
//! collection (reference strength of pooled instances), and activation
//! (eager versus on-demand instantiation). `SystemDefault` variants resolve
//! against [`AssemblyConfig`](crate::config::AssemblyConfig) at
//! handler-construction time.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::config::AssemblyConfig;

/// Governs instance sharing across callers of one handler.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum LifestylePolicy {
    /// One shared instance per handler.
    Singleton,
    /// A fresh instance per request.
    Transient,
    /// One instance per calling thread.
    #[default]
    Thread,
}

impl fmt::Display for LifestylePolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Singleton => write!(f, "singleton"),
            Self::Transient => write!(f, "transient"),
            Self::Thread => write!(f, "thread"),
        }
    }
}

impl std::str::FromStr for LifestylePolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "singleton" => Ok(Self::Singleton),
            "transient" => Ok(Self::Transient),
            "thread" => Ok(Self::Thread),
            _ => Err(format!("Invalid lifestyle policy: {s}")),
        }
    }
}

/// Governs the reference strength under which a pooled instance is held,
/// determining its eligibility for automatic reclamation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum CollectionPolicy {
    /// Direct ownership; never reclaimed while the holder exists.
    Hard,
    /// Reclaimable under memory pressure. No such signal exists here, so the
    /// holder observes reclamation the same way as `Weak`.
    Soft,
    /// Reclaimable whenever no external strong holder remains.
    Weak,
    /// Deferred to the runtime configuration default.
    #[default]
    SystemDefault,
}

impl CollectionPolicy {
    /// Resolve `SystemDefault` against the runtime configuration. The result
    /// is always a concrete policy.
    pub fn resolve(self, config: &AssemblyConfig) -> CollectionPolicy {
        match self {
            Self::SystemDefault => match config.default_collection {
                Self::SystemDefault => Self::Hard,
                concrete => concrete,
            },
            concrete => concrete,
        }
    }

    /// Whether instances held under this policy may disappear between an
    /// existence check and use.
    pub fn is_reclaimable(&self) -> bool {
        matches!(self, Self::Soft | Self::Weak)
    }
}

impl fmt::Display for CollectionPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Hard => write!(f, "hard"),
            Self::Soft => write!(f, "soft"),
            Self::Weak => write!(f, "weak"),
            Self::SystemDefault => write!(f, "system_default"),
        }
    }
}

impl std::str::FromStr for CollectionPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "hard" => Ok(Self::Hard),
            "soft" => Ok(Self::Soft),
            "weak" => Ok(Self::Weak),
            "system_default" => Ok(Self::SystemDefault),
            _ => Err(format!("Invalid collection policy: {s}")),
        }
    }
}

/// Whether a component is instantiated eagerly on activation or lazily on
/// first use.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ActivationPolicy {
    /// Eager instance creation when the handler activates.
    Startup,
    /// Explicit activation, lazy instance creation.
    Demand,
    /// Deferred to the runtime configuration default.
    #[default]
    SystemDefault,
}

impl ActivationPolicy {
    /// Resolve `SystemDefault` against the runtime configuration. The result
    /// is always a concrete policy.
    pub fn resolve(self, config: &AssemblyConfig) -> ActivationPolicy {
        match self {
            Self::SystemDefault => match config.default_activation {
                Self::SystemDefault => Self::Demand,
                concrete => concrete,
            },
            concrete => concrete,
        }
    }

    pub fn is_startup(&self) -> bool {
        matches!(self, Self::Startup)
    }
}

impl fmt::Display for ActivationPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Startup => write!(f, "startup"),
            Self::Demand => write!(f, "demand"),
            Self::SystemDefault => write!(f, "system_default"),
        }
    }
}

impl std::str::FromStr for ActivationPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "startup" => Ok(Self::Startup),
            "demand" => Ok(Self::Demand),
            "system_default" => Ok(Self::SystemDefault),
            _ => Err(format!("Invalid activation policy: {s}")),
        }
    }
}
