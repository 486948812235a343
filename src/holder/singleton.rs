//! # Exclusive Singleton Holder
//!
//! Holds at most one instance behind a reference of the model's declared
//! strength. Hard references pin the instance for the holder's lifetime;
//! soft and weak references let the instance disappear once no caller holds
//! a strong reference, in which case the next request transparently
//! re-creates and re-activates it. The re-creation is an intentional
//! consequence of the collection policy, not a defect.

use std::sync::{Arc, Weak};

use parking_lot::Mutex;
use tracing::debug;

use super::InstanceHolder;
use crate::error::Result;
use crate::instance::{Instance, InstanceCreator};
use crate::model::CollectionPolicy;

/// The single slot, under the declared reference strength.
enum Slot {
    Hard(Option<Arc<Instance>>),
    Reclaimable(Option<Weak<Instance>>),
}

impl Slot {
    fn live(&self) -> Option<Arc<Instance>> {
        match self {
            Slot::Hard(slot) => slot.clone(),
            Slot::Reclaimable(slot) => slot.as_ref().and_then(Weak::upgrade),
        }
    }

    fn store(&mut self, instance: &Arc<Instance>) {
        match self {
            Slot::Hard(slot) => *slot = Some(instance.clone()),
            Slot::Reclaimable(slot) => *slot = Some(Arc::downgrade(instance)),
        }
    }

    fn take(&mut self) -> Option<Arc<Instance>> {
        match self {
            Slot::Hard(slot) => slot.take(),
            Slot::Reclaimable(slot) => slot.take().and_then(|w| w.upgrade()),
        }
    }

    fn was_populated(&self) -> bool {
        match self {
            Slot::Hard(slot) => slot.is_some(),
            Slot::Reclaimable(slot) => slot.is_some(),
        }
    }
}

/// Shared-instance pooling strategy.
pub struct SingletonHolder {
    creator: Arc<InstanceCreator>,
    slot: Mutex<Slot>,
}

impl SingletonHolder {
    /// `collection` must be a concrete (resolved) policy.
    pub(crate) fn new(creator: Arc<InstanceCreator>, collection: CollectionPolicy) -> Self {
        let slot = if collection.is_reclaimable() {
            Slot::Reclaimable(None)
        } else {
            Slot::Hard(None)
        };
        Self {
            creator,
            slot: Mutex::new(slot),
        }
    }
}

impl InstanceHolder for SingletonHolder {
    fn get_instance(&self) -> Result<Arc<Instance>> {
        // The slot mutex is the per-slot creation lock: concurrent callers
        // serialize here so at most one instance is ever created.
        let mut slot = self.slot.lock();
        if let Some(instance) = slot.live() {
            return Ok(instance);
        }
        if slot.was_populated() {
            debug!(path = %self.creator.path(), "singleton instance reclaimed; re-creating");
        }
        let instance = self.creator.create()?;
        slot.store(&instance);
        Ok(instance)
    }

    fn instance_count(&self) -> usize {
        usize::from(self.slot.lock().live().is_some())
    }

    fn all_instances(&self) -> Vec<Arc<Instance>> {
        self.slot.lock().live().into_iter().collect()
    }

    fn release(&self, _instance: &Arc<Instance>) {
        // Singleton instances are shared; release is a caller-side no-op.
    }

    fn deactivate_all(&self) {
        let instance = self.slot.lock().take();
        if let Some(instance) = instance {
            instance.deactivate();
        }
    }

    fn dispose_all(&self) {
        let instance = self.slot.lock().take();
        if let Some(instance) = instance {
            instance.dispose();
        }
    }
}
