//! # Per-Thread Holder
//!
//! Maintains one lazily-created instance per calling thread. Slots are held
//! weakly, exactly like the transient case, so a thread that exits (or a
//! caller that drops its handle) does not pin its instance forever; dead
//! slots are pruned on access.
//!
//! Slot cells are resolved through a sharded map and each cell carries its
//! own creation lock, so creation for one thread never blocks callers on
//! other threads while same-slot creation stays serialized.

use std::sync::{Arc, Weak};
use std::thread::{self, ThreadId};

use dashmap::DashMap;
use parking_lot::Mutex;

use super::InstanceHolder;
use crate::error::Result;
use crate::instance::{Instance, InstanceCreator};

type SlotCell = Arc<Mutex<Option<Weak<Instance>>>>;

/// Per-thread pooling strategy.
pub struct ThreadHolder {
    creator: Arc<InstanceCreator>,
    slots: DashMap<ThreadId, SlotCell>,
}

impl ThreadHolder {
    pub(crate) fn new(creator: Arc<InstanceCreator>) -> Self {
        Self {
            creator,
            slots: DashMap::new(),
        }
    }

    /// The calling thread's slot cell, created on first access. The shard
    /// lock is held only for the lookup, never during instance creation.
    fn slot_cell(&self) -> SlotCell {
        let id = thread::current().id();
        self.slots.entry(id).or_default().clone()
    }

    /// Live instances across all thread slots, pruning dead slots.
    fn live_instances(&self) -> Vec<Arc<Instance>> {
        let mut live = Vec::new();
        self.slots.retain(|_, cell| {
            let slot = cell.lock();
            match slot.as_ref().and_then(Weak::upgrade) {
                Some(instance) => {
                    live.push(instance);
                    true
                }
                None => false,
            }
        });
        live
    }

    /// Drain every live instance, clearing all slots.
    fn drain(&self) -> Vec<Arc<Instance>> {
        let mut drained = Vec::new();
        self.slots.retain(|_, cell| {
            if let Some(instance) = cell.lock().take().and_then(|w| w.upgrade()) {
                drained.push(instance);
            }
            false
        });
        drained
    }
}

impl InstanceHolder for ThreadHolder {
    fn get_instance(&self) -> Result<Arc<Instance>> {
        let cell = self.slot_cell();
        // Per-slot creation lock: same-thread callers serialize here while
        // other threads proceed against their own cells.
        let mut slot = cell.lock();
        if let Some(instance) = slot.as_ref().and_then(Weak::upgrade) {
            return Ok(instance);
        }
        let instance = self.creator.create()?;
        *slot = Some(Arc::downgrade(&instance));
        Ok(instance)
    }

    fn instance_count(&self) -> usize {
        self.live_instances().len()
    }

    fn all_instances(&self) -> Vec<Arc<Instance>> {
        self.live_instances()
    }

    fn release(&self, instance: &Arc<Instance>) {
        let mut released = false;
        self.slots.retain(|_, cell| {
            let mut slot = cell.lock();
            let matches = slot
                .as_ref()
                .is_some_and(|weak| std::ptr::eq(weak.as_ptr(), Arc::as_ptr(instance)));
            if matches {
                *slot = None;
                released = true;
                return false;
            }
            true
        });
        if released {
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
