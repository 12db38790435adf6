//! Container with a shared instance cache

use parking_lot::Mutex;
use rustc_hash::FxHashMap;
use serde_json::Value;
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, trace};

use crate::builder::{Builder, InstanceBuilder};
use crate::config::{Config, ConfigStore};
use crate::definition::Definition;
use crate::error::{DiError, DiResult};
use crate::registry::ClassRegistry;
use crate::service::{Service, SharedInstance};

/// Pinned instance for one id, locked while it is being built
type Slot = Arc<Mutex<Option<SharedInstance>>>;

/// Entry point for retrieving instances by id
///
/// Ids that have been shared, either explicitly or because their definition
/// is marked `shared`, always return the same instance. Everything else is
/// built fresh on each [`get`](Container::get).
///
/// Each shared id has its own slot. While one id is being built and pinned,
/// only callers asking for that same id wait; other ids proceed. Locks are not
/// re-entrant, so a constructor must not ask the container for the id that is
/// currently being pinned.
pub struct Container<C: ConfigStore = Config, B: InstanceBuilder = Builder> {
    config: C,
    builder: B,
    /// Pin slots by id; the map lock is never held while a slot is locked
    shared: Mutex<FxHashMap<String, Slot>>,
}

impl Container<Config, Builder> {
    /// Create a container from definitions and parameters
    pub fn init(
        registry: ClassRegistry,
        definitions: impl IntoIterator<Item = (String, Definition)>,
        parameters: impl IntoIterator<Item = (String, Value)>,
    ) -> Self {
        Container::new(
            Config::new(definitions, parameters),
            Builder::new(Arc::new(registry)),
        )
    }

    /// Create a container from a JSON or TOML configuration file
    pub fn from_path(registry: ClassRegistry, path: impl AsRef<Path>) -> DiResult<Self> {
        let config = Config::from_path(path)?;
        Ok(Container::new(config, Builder::new(Arc::new(registry))))
    }
}

impl<C: ConfigStore, B: InstanceBuilder> Container<C, B> {
    pub fn new(config: C, builder: B) -> Self {
        Self {
            config,
            builder,
            shared: Mutex::new(FxHashMap::default()),
        }
    }

    pub fn config(&self) -> &C {
        &self.config
    }

    pub fn builder(&self) -> &B {
        &self.builder
    }

    /// Get an instance by id
    pub fn get(&self, id: &str) -> DiResult<SharedInstance> {
        if let Some(instance) = self.pinned(id) {
            trace!(id, "Shared instance hit");
            return Ok(instance);
        }

        let pin = self
            .config
            .definition(id)
            .map_or(false, |definition| definition.shared);
        if pin {
            return self.pin(id);
        }

        debug!(id, "Building instance");
        let instance = self.builder.build(id, &self.config)?;
        Ok(Arc::from(instance))
    }

    /// Get an instance by id as its concrete type
    pub fn get_as<T: Service>(&self, id: &str) -> DiResult<Arc<T>> {
        let instance = self.get(id)?;
        instance.downcast_arc::<T>().map_err(|instance| DiError::TypeMismatch {
            id: id.to_string(),
            expected: std::any::type_name::<T>(),
            actual: (*instance).type_name(),
        })
    }

    /// Build `id` once and pin the instance
    ///
    /// If `id` is already pinned, the pinned instance is returned untouched.
    pub fn share(&self, id: &str) -> DiResult<SharedInstance> {
        self.pin(id)
    }

    /// Pin an externally created instance under `id`
    ///
    /// The id does not need a definition. Any previously pinned instance is
    /// replaced.
    pub fn share_instance(&self, id: &str, instance: SharedInstance) -> &Self {
        debug!(id, "Sharing external instance");
        *self.slot(id).lock() = Some(instance);
        self
    }

    pub fn is_shared(&self, id: &str) -> bool {
        self.pinned(id).is_some()
    }

    /// Ids of all pinned instances, sorted
    pub fn shared_ids(&self) -> Vec<String> {
        let slots: Vec<(String, Slot)> = self
            .shared
            .lock()
            .iter()
            .map(|(id, slot)| (id.clone(), slot.clone()))
            .collect();

        let mut ids: Vec<String> = slots
            .into_iter()
            .filter(|(_, slot)| slot.lock().is_some())
            .map(|(id, _)| id)
            .collect();
        ids.sort_unstable();
        ids
    }

    fn slot(&self, id: &str) -> Slot {
        self.shared.lock().entry(id.to_string()).or_default().clone()
    }

    fn pinned(&self, id: &str) -> Option<SharedInstance> {
        let slot = self.shared.lock().get(id).cloned()?;
        let pinned = slot.lock().clone();
        pinned
    }

    /// Build under the slot lock so concurrent callers observe one instance
    fn pin(&self, id: &str) -> DiResult<SharedInstance> {
        let slot = self.slot(id);
        let mut pinned = slot.lock();
        if let Some(instance) = pinned.as_ref() {
            return Ok(instance.clone());
        }

        debug!(id, "Building shared instance");
        let instance: SharedInstance = Arc::from(self.builder.build(id, &self.config)?);
        *pinned = Some(instance.clone());
        Ok(instance)
    }
}
