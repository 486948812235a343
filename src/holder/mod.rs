//! # Instance Holder Strategies
//!
//! Three interchangeable pooling strategies built on the instance wrapper and
//! a chosen reference strength:
//!
//! - [`SingletonHolder`]: at most one shared instance per handler, held
//!   under the model's collection policy
//! - [`TransientHolder`]: a fresh instance per request, tracked weakly so
//!   dropped instances do not accumulate
//! - [`ThreadHolder`]: one lazily-created instance per calling thread
//!
//! Every strategy serializes instance creation per logical slot, so at most
//! one instance is created per slot even under race, while creation for
//! distinct slots proceeds without mutual blocking.

pub mod per_thread;
pub mod singleton;
pub mod transient;

use std::sync::Arc;

use crate::error::Result;
use crate::instance::{Instance, InstanceCreator};
use crate::model::{CollectionPolicy, LifestylePolicy};

pub use per_thread::ThreadHolder;
pub use singleton::SingletonHolder;
pub use transient::TransientHolder;

/// Common contract of the pooling strategies.
pub trait InstanceHolder: Send + Sync {
    /// Obtain an instance according to the lifestyle policy, creating and
    /// activating one when required.
    fn get_instance(&self) -> Result<Arc<Instance>>;

    /// Number of live instances currently held.
    fn instance_count(&self) -> usize;

    /// Every live instance currently held.
    fn all_instances(&self) -> Vec<Arc<Instance>>;

    /// Explicitly discard one held instance. Shared-instance strategies
    /// ignore this; per-request strategies dispose of the instance.
    fn release(&self, instance: &Arc<Instance>);

    /// Deactivate every live instance and clear all slots. Best-effort,
    /// never raises.
    fn deactivate_all(&self);

    /// Dispose of every live instance and clear all slots. The holder may
    /// still be used afterwards; disposal of the owning handler is what
    /// retires it.
    fn dispose_all(&self);
}

/// Choose the holder implementation for a lifestyle policy. `collection`
/// must already be resolved to a concrete policy.
pub(crate) fn create_holder(
    lifestyle: LifestylePolicy,
    collection: CollectionPolicy,
    creator: Arc<InstanceCreator>,
) -> Box<dyn InstanceHolder> {
    match lifestyle {
        LifestylePolicy::Singleton => Box::new(SingletonHolder::new(creator, collection)),
        LifestylePolicy::Transient => Box::new(TransientHolder::new(creator)),
        LifestylePolicy::Thread => Box::new(ThreadHolder::new(creator)),
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use std::collections::{HashMap, HashSet};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    use serde_json::Value;

    use crate::events::EventPublisher;
    use crate::instance::InstanceCreator;
    use crate::model::{factory_fn, ComponentPath, InvocationError, Invocable};
    use crate::state_machine::graph::State;
    use crate::state_machine::{StateGraph, Transition};

    struct Noop;

    impl Invocable for Noop {
        fn invoke(&self, _operation: &str, _input: Value) -> Result<Value, InvocationError> {
            Ok(Value::Null)
        }
    }

    fn lifecycle_graph() -> Arc<StateGraph> {
        Arc::new(
            StateGraph::builder("test")
                .initial("ready")
                .state(State::new("ready").transition(Transition::new("terminate", "stopped")))
                .state(State::new("stopped").terminal())
                .build()
                .unwrap(),
        )
    }

    /// Creator over a counting factory; the second element reports how many
    /// raw values the factory has produced.
    pub(crate) fn test_creator(name: &str) -> (Arc<InstanceCreator>, Arc<AtomicUsize>) {
        let created = Arc::new(AtomicUsize::new(0));
        let counter = created.clone();
        let factory = factory_fn(move |_context| {
            counter.fetch_add(1, Ordering::SeqCst);
            Ok(Arc::new(Noop) as Arc<dyn Invocable>)
        });
        let creator = Arc::new(InstanceCreator::new(
            ComponentPath::root(name),
            factory,
            Arc::new(HashSet::new()),
            lifecycle_graph(),
            HashMap::new(),
            EventPublisher::new(8),
        ));
        (creator, created)
    }
}
