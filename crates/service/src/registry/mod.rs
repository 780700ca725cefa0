//! Singleton service registry.
//!
//! Holds at most one live instance per `(service type, name)` pair. Instances
//! are built lazily on first request and shared as `Arc`s afterwards. The
//! registry is an ordinary value: build one at startup, pass it around (see
//! [`crate::runtime::AppContext`]) and drop or [`ServiceRegistry::clear`] it to
//! tear everything down.
//!
//! The same name may be requested with different service types; each type gets
//! its own instance. Such reuse is logged at `warn` since names are expected to
//! be unique per application.

mod service;

pub use service::{Service, ServiceName};

use std::any::{type_name, Any, TypeId};
use std::convert::Infallible;
use std::fmt;
use std::sync::Arc;

use dashmap::DashMap;
use once_cell::sync::OnceCell;
use tracing::{debug, warn};

type Instance = Arc<dyn Any + Send + Sync>;

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
struct ServiceKey {
    type_id: TypeId,
    name: String,
}

impl ServiceKey {
    fn of<S: 'static>(name: &str) -> Self {
        Self { type_id: TypeId::of::<S>(), name: name.to_string() }
    }
}

/// One per key. The cell stays empty until a factory succeeds.
struct Slot {
    type_name: &'static str,
    cell: OnceCell<Instance>,
}

impl Slot {
    fn instance(&self) -> Option<&Instance> {
        self.cell.get()
    }
}

#[derive(Default)]
pub struct ServiceRegistry {
    slots: DashMap<ServiceKey, Arc<Slot>>,
}

fn downcast<S: Send + Sync + 'static>(instance: &Instance) -> Arc<S> {
    match Arc::clone(instance).downcast::<S>() {
        Ok(service) => service,
        // ServiceKey carries TypeId::of::<S>(), so anything stored under it is an S.
        Err(_) => unreachable!("registry entry for {} holds another type", type_name::<S>()),
    }
}

impl ServiceRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the instance of `S` registered under `name`, constructing it
    /// with [`Service::create`] on first use.
    pub fn get_instance<S: Service>(&self, name: &str) -> Arc<S> {
        self.get_instance_with(name, S::create)
    }

    /// Like [`ServiceRegistry::get_instance`] with an explicit constructor, for
    /// services that need collaborators besides their name.
    pub fn get_instance_with<S, F>(&self, name: &str, factory: F) -> Arc<S>
    where
        S: Send + Sync + 'static,
        F: FnOnce(&str) -> S,
    {
        match self.try_get_instance_with::<S, Infallible, _>(name, |n| Ok(factory(n))) {
            Ok(service) => service,
            Err(never) => match never {},
        }
    }

    /// Fallible variant: a factory error is returned unchanged and nothing is
    /// registered, so a later call retries construction.
    ///
    /// The factory runs at most once per key at a time: concurrent callers for
    /// the same key block on its slot until it finishes. No map lock is held
    /// meanwhile, so the factory may resolve other keys. Resolving its own key
    /// from inside the factory deadlocks.
    pub fn try_get_instance_with<S, E, F>(&self, name: &str, factory: F) -> Result<Arc<S>, E>
    where
        S: Send + Sync + 'static,
        F: FnOnce(&str) -> Result<S, E>,
    {
        let key = ServiceKey::of::<S>(name);
        let slot = Arc::clone(
            &*self
                .slots
                .entry(key.clone())
                .or_insert_with(|| Arc::new(Slot { type_name: type_name::<S>(), cell: OnceCell::new() })),
        );

        let mut built = false;
        let instance = slot.cell.get_or_try_init(|| {
            built = true;
            factory(name).map(|service| Arc::new(service) as Instance)
        })?;

        if built {
            debug!(service = name, service_type = type_name::<S>(), event = "registered", "service instance created");
            self.warn_on_shared_name(&key);
        }
        Ok(downcast(instance))
    }

    fn warn_on_shared_name(&self, key: &ServiceKey) {
        let others: Vec<&'static str> = self
            .slots
            .iter()
            .filter(|e| e.key().name == key.name && e.key().type_id != key.type_id)
            .filter(|e| e.value().instance().is_some())
            .map(|e| e.value().type_name)
            .collect();
        if !others.is_empty() {
            warn!(
                service = %key.name,
                other_types = ?others,
                event = "name_shared",
                "service name registered by more than one type; each type keeps its own instance"
            );
        }
    }

    pub fn contains<S: 'static>(&self, name: &str) -> bool {
        self.slots
            .get(&ServiceKey::of::<S>(name))
            .map_or(false, |slot| slot.instance().is_some())
    }

    /// Unregister and return the instance of `S` under `name`. Holders of the
    /// returned `Arc` keep it alive; the next request builds a new one.
    pub fn remove<S: Send + Sync + 'static>(&self, name: &str) -> Option<Arc<S>> {
        let (_, slot) = self.slots.remove(&ServiceKey::of::<S>(name))?;
        let instance = slot.instance()?;
        debug!(service = name, event = "removed", "service instance unregistered");
        Some(downcast(instance))
    }

    /// Number of constructed instances.
    pub fn len(&self) -> usize {
        self.slots.iter().filter(|e| e.value().instance().is_some()).count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Registered names, sorted and deduplicated.
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self
            .slots
            .iter()
            .filter(|e| e.value().instance().is_some())
            .map(|e| e.key().name.clone())
            .collect();
        names.sort();
        names.dedup();
        names
    }

    /// Drop every registered instance.
    pub fn clear(&self) {
        let count = self.len();
        self.slots.clear();
        debug!(event = "cleared", count, "service registry cleared");
    }
}

impl fmt::Debug for ServiceRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut entries: Vec<(String, &'static str)> = self
            .slots
            .iter()
            .filter(|e| e.value().instance().is_some())
            .map(|e| (e.key().name.clone(), e.value().type_name))
            .collect();
        entries.sort();
        f.debug_struct("ServiceRegistry").field("instances", &entries).finish()
    }
}
