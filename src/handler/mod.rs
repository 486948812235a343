//! # Component Handler
//!
//! Per-component runtime controller: owns exactly one holder, tracks
//! active/inactive status, resolves child-part handlers, and exposes
//! instances to callers.
//!
//! ## Status machine
//!
//! `Inactive -> (activate) -> Active -> (deactivate) -> Inactive`, with
//! `dispose` reachable from either state and terminal. Activation with a
//! startup policy eagerly creates an instance; any failure during eager
//! activation triggers an automatic deactivation before the error surfaces,
//! so a handler is never left half-active and a failed activation may be
//! retried.
//!
//! ## Locking
//!
//! A per-handler lifecycle mutex serializes activate/deactivate/dispose; the
//! status field itself sits behind its own short-lived lock so read paths
//! never wait on an in-flight activation. Lock ordering follows the
//! composition tree (parent before child), and children never call back into
//! parents, so cross-handler deadlock cannot arise.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::Mutex;
use serde_json::json;
use tracing::{debug, warn};

use crate::config::AssemblyConfig;
use crate::constants::events::{
    COMPONENT_ACTIVATED, COMPONENT_ACTIVATION_FAILED, COMPONENT_DEACTIVATED, COMPONENT_DISPOSED,
};
use crate::error::{ComponentError, Result};
use crate::events::EventPublisher;
use crate::holder::{create_holder, InstanceHolder};
use crate::instance::{Instance, InstanceCreator};
use crate::model::{
    ActivationPolicy, CollectionPolicy, ComponentModel, ComponentPath, LifestylePolicy,
    ResolvedComponent,
};

/// Coarse handler lifecycle status.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HandlerStatus {
    Inactive,
    Active,
    Disposed,
}

impl std::fmt::Display for HandlerStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Inactive => write!(f, "inactive"),
            Self::Active => write!(f, "active"),
            Self::Disposed => write!(f, "disposed"),
        }
    }
}

/// Runtime controller for one component position in a composition tree.
pub struct ComponentHandler {
    model: Arc<ComponentModel>,
    path: ComponentPath,
    lifestyle: LifestylePolicy,
    collection: CollectionPolicy,
    activation: ActivationPolicy,
    holder: Box<dyn InstanceHolder>,
    parts: HashMap<String, Arc<ComponentHandler>>,
    status: Mutex<HandlerStatus>,
    lifecycle: Mutex<()>,
    publisher: EventPublisher,
}

impl ComponentHandler {
    /// Construct a handler over an already-resolved model. Child handlers
    /// must exist before the parent is constructed; the controller is the
    /// only caller.
    pub(crate) fn new(
        model: Arc<ComponentModel>,
        resolved: ResolvedComponent,
        parts: HashMap<String, Arc<ComponentHandler>>,
        config: &AssemblyConfig,
        publisher: EventPublisher,
    ) -> Arc<Self> {
        let path = model.path().clone();
        let lifestyle = model.lifestyle();
        let collection = model.collection().resolve(config);
        let activation = model.activation().resolve(config);

        let creator = Arc::new(InstanceCreator::new(
            path.clone(),
            model.factory().clone(),
            Arc::new(resolved.capabilities),
            resolved.graph,
            parts.clone(),
            publisher.clone(),
        ));
        let holder = create_holder(lifestyle, collection, creator);

        debug!(
            path = %path,
            lifestyle = %lifestyle,
            collection = %collection,
            activation = %activation,
            "new component handler"
        );

        Arc::new(Self {
            model,
            path,
            lifestyle,
            collection,
            activation,
            holder,
            parts,
            status: Mutex::new(HandlerStatus::Inactive),
            lifecycle: Mutex::new(()),
            publisher,
        })
    }

    pub fn model(&self) -> &Arc<ComponentModel> {
        &self.model
    }

    pub fn path(&self) -> &ComponentPath {
        &self.path
    }

    pub fn lifestyle(&self) -> LifestylePolicy {
        self.lifestyle
    }

    /// Effective collection policy (system defaults resolved).
    pub fn collection(&self) -> CollectionPolicy {
        self.collection
    }

    /// Effective activation policy (system defaults resolved).
    pub fn activation(&self) -> ActivationPolicy {
        self.activation
    }

    pub fn status(&self) -> HandlerStatus {
        *self.status.lock()
    }

    pub fn is_active(&self) -> bool {
        self.status() == HandlerStatus::Active
    }

    /// Activate this handler. No-op when already active. Startup-policy
    /// parts are activated first (children before parent), then a startup
    /// policy on this component forces eager instance creation. Any failure
    /// rolls back to the inactive state before the error is surfaced.
    pub fn activate(&self) -> Result<()> {
        let _lifecycle = self.lifecycle.lock();
        match self.status() {
            HandlerStatus::Disposed => return Err(ComponentError::disposed(&self.path)),
            HandlerStatus::Active => return Ok(()),
            HandlerStatus::Inactive => {}
        }

        if let Err(error) = self.activate_inner() {
            self.deactivate_inner();
            let _ = self.publisher.publish(
                COMPONENT_ACTIVATION_FAILED,
                json!({"path": self.path.as_str(), "error": error.to_string()}),
            );
            warn!(path = %self.path, error = %error, "activation failed; handler deactivated");
            return Err(error);
        }

        *self.status.lock() = HandlerStatus::Active;
        let _ = self
            .publisher
            .publish(COMPONENT_ACTIVATED, json!({"path": self.path.as_str()}));
        debug!(path = %self.path, "component activated");
        Ok(())
    }

    /// Activation body; caller holds the lifecycle lock and rolls back on
    /// error.
    fn activate_inner(&self) -> Result<()> {
        for part in self.parts.values() {
            if part.activation().is_startup() {
                part.activate()?;
            }
        }
        if self.activation.is_startup() {
            // Eager creation; the handler is not yet marked active, so the
            // holder is driven directly.
            self.holder.get_instance()?;
        }
        Ok(())
    }

    /// Deactivate this handler and its parts. Idempotent; never raises.
    pub fn deactivate(&self) {
        let _lifecycle = self.lifecycle.lock();
        if self.status() != HandlerStatus::Active {
            return;
        }
        *self.status.lock() = HandlerStatus::Inactive;
        self.deactivate_inner();
        let _ = self
            .publisher
            .publish(COMPONENT_DEACTIVATED, json!({"path": self.path.as_str()}));
        debug!(path = %self.path, "component deactivated");
    }

    /// Teardown body: own instances first, then parts (reverse of the
    /// activation traversal). Caller holds the lifecycle lock.
    fn deactivate_inner(&self) {
        self.holder.deactivate_all();
        for part in self.parts.values() {
            part.deactivate();
        }
    }

    /// Obtain an instance according to the lifestyle policy.
    pub fn get_instance(&self) -> Result<Arc<Instance>> {
        match self.status() {
            HandlerStatus::Disposed => Err(ComponentError::disposed(&self.path)),
            HandlerStatus::Inactive => Err(ComponentError::not_active(&self.path)),
            HandlerStatus::Active => self.holder.get_instance(),
        }
    }

    /// Explicitly discard a per-request instance the caller is done with.
    pub fn release(&self, instance: &Arc<Instance>) {
        if self.status() == HandlerStatus::Disposed {
            return;
        }
        self.holder.release(instance);
    }

    /// The child handler composed under `key`. The caller is responsible for
    /// activating a demand-policy part before use.
    pub fn get_part_handler(&self, key: &str) -> Result<Arc<ComponentHandler>> {
        if self.status() == HandlerStatus::Disposed {
            return Err(ComponentError::disposed(&self.path));
        }
        self.parts
            .get(key)
            .cloned()
            .ok_or_else(|| ComponentError::unknown_part(&self.path, key))
    }

    /// Declared part keys.
    pub fn part_keys(&self) -> Vec<&str> {
        self.parts.keys().map(String::as_str).collect()
    }

    /// Live instance count of the holder.
    pub fn size(&self) -> usize {
        self.holder.instance_count()
    }

    /// Deactivate if necessary, dispose of every held instance and every
    /// part, and retire the handler. All later calls fail with a disposed
    /// error.
    pub fn dispose(&self) {
        let _lifecycle = self.lifecycle.lock();
        {
            let mut status = self.status.lock();
            if *status == HandlerStatus::Disposed {
                return;
            }
            *status = HandlerStatus::Disposed;
        }
        self.holder.deactivate_all();
        self.holder.dispose_all();
        for part in self.parts.values() {
            part.dispose();
        }
        let _ = self
            .publisher
            .publish(COMPONENT_DISPOSED, json!({"path": self.path.as_str()}));
        debug!(path = %self.path, "component disposed");
    }
}

impl std::fmt::Debug for ComponentHandler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ComponentHandler")
            .field("path", &self.path)
            .field("lifestyle", &self.lifestyle)
            .field("collection", &self.collection)
            .field("activation", &self.activation)
            .field("status", &self.status())
            .field("parts", &self.parts.keys().collect::<Vec<_>>())
            .finish()
    }
}
