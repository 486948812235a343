//! # Per-Request Transient Holder
//!
//! Creates and activates a brand-new instance on every request. Instances
//! are tracked through weak references so callers that drop their handles
//! without explicit disposal do not grow the registry without bound; dead
//! entries are pruned on every access.

use std::sync::{Arc, Weak};

use parking_lot::Mutex;

use super::InstanceHolder;
use crate::error::Result;
use crate::instance::{Instance, InstanceCreator};

/// Per-request pooling strategy.
pub struct TransientHolder {
    creator: Arc<InstanceCreator>,
    live: Mutex<Vec<Weak<Instance>>>,
}

impl TransientHolder {
    pub(crate) fn new(creator: Arc<InstanceCreator>) -> Self {
        Self {
            creator,
            live: Mutex::new(Vec::new()),
        }
    }

    /// Prune dead entries and return the surviving instances.
    fn live_instances(&self) -> Vec<Arc<Instance>> {
        let mut registry = self.live.lock();
        registry.retain(|weak| weak.strong_count() > 0);
        registry.iter().filter_map(Weak::upgrade).collect()
    }

    /// Drain every live instance, clearing the registry.
    fn drain(&self) -> Vec<Arc<Instance>> {
        let mut registry = self.live.lock();
        let drained = registry.iter().filter_map(Weak::upgrade).collect();
        registry.clear();
        drained
    }
}

impl InstanceHolder for TransientHolder {
    fn get_instance(&self) -> Result<Arc<Instance>> {
        // Independent requests must not block each other: creation happens
        // outside the registry lock.
        let instance = self.creator.create()?;
        let mut registry = self.live.lock();
        registry.retain(|weak| weak.strong_count() > 0);
        registry.push(Arc::downgrade(&instance));
        Ok(instance)
    }

    fn instance_count(&self) -> usize {
        self.live_instances().len()
    }

    fn all_instances(&self) -> Vec<Arc<Instance>> {
        self.live_instances()
    }

    fn release(&self, instance: &Arc<Instance>) {
        let target = Arc::downgrade(instance);
        let removed = {
            let mut registry = self.live.lock();
            let before = registry.len();
            registry.retain(|weak| !weak.ptr_eq(&target));
            before != registry.len()
        };
        if removed {
            instance.dispose();
        }
    }

    fn deactivate_all(&self) {
        for instance in self.drain() {
            instance.deactivate();
        }
    }

    fn dispose_all(&self) {
        for instance in self.drain() {
            instance.dispose();
        }
    }
}
