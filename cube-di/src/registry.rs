//! Class registry for name-based instantiation
//!
//! Definitions name their class as a string. The registry maps those names to
//! constructor closures, and each concrete type to the methods a definition
//! may call on it.

use crate::args::Args;
use crate::error::{DiError, DiResult};
use crate::service::{Instance, Service};
use rustc_hash::FxHashMap;
use std::any::TypeId;
use std::fmt;
use std::marker::PhantomData;
use std::sync::Arc;

/// Factory function that creates an instance from resolved arguments
pub type Constructor = Arc<dyn Fn(Args) -> DiResult<Instance> + Send + Sync>;

/// Type-erased method invoked on a built instance
pub type Method = Arc<dyn Fn(&mut dyn Service, Args) -> DiResult<()> + Send + Sync>;

#[derive(Clone)]
struct ClassEntry {
    type_id: TypeId,
    type_name: &'static str,
    constructor: Constructor,
}

/// Maps class names to constructors and types to callable methods
#[derive(Clone, Default)]
pub struct ClassRegistry {
    classes: FxHashMap<String, ClassEntry>,
    methods: FxHashMap<TypeId, FxHashMap<String, Method>>,
    names: FxHashMap<TypeId, String>,
}

impl ClassRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a class under `name`
    ///
    /// Registering the same name twice replaces the constructor. Methods are
    /// keyed by the concrete type, so aliases of one type share them.
    pub fn register<T, F>(&mut self, name: &str, constructor: F) -> ClassBuilder<'_, T>
    where
        T: Service,
        F: Fn(Args) -> DiResult<T> + Send + Sync + 'static,
    {
        let type_id = TypeId::of::<T>();
        self.classes.insert(
            name.to_string(),
            ClassEntry {
                type_id,
                type_name: std::any::type_name::<T>(),
                constructor: Arc::new(move |args: Args| -> DiResult<Instance> {
                    Ok(Box::new(constructor(args)?))
                }),
            },
        );
        self.names.entry(type_id).or_insert_with(|| name.to_string());
        self.methods.entry(type_id).or_default();

        ClassBuilder {
            registry: self,
            _marker: PhantomData,
        }
    }

    /// Add methods to an already registered type
    pub fn class<T: Service>(&mut self) -> ClassBuilder<'_, T> {
        self.methods.entry(TypeId::of::<T>()).or_default();
        ClassBuilder {
            registry: self,
            _marker: PhantomData,
        }
    }

    pub fn contains(&self, name: &str) -> bool {
        self.classes.contains_key(name)
    }

    /// Look up the constructor for a class name
    pub fn constructor(&self, name: &str) -> DiResult<&Constructor> {
        self.classes
            .get(name)
            .map(|entry| &entry.constructor)
            .ok_or_else(|| DiError::UnknownClass {
                class: name.to_string(),
            })
    }

    /// Look up a method on the concrete type of `instance`
    pub fn method(&self, instance: &dyn Service, method: &str) -> DiResult<&Method> {
        let type_id = instance.as_any().type_id();
        self.methods
            .get(&type_id)
            .and_then(|methods| methods.get(method))
            .ok_or_else(|| DiError::UnknownMethod {
                class: self.class_name(instance),
                method: method.to_string(),
            })
    }

    pub fn has_method(&self, instance: &dyn Service, method: &str) -> bool {
        self.method(instance, method).is_ok()
    }

    /// Check a method against a class name without building anything
    ///
    /// Returns `None` when the class itself is unknown.
    pub fn class_has_method(&self, class: &str, method: &str) -> Option<bool> {
        let entry = self.classes.get(class)?;
        Some(
            self.methods
                .get(&entry.type_id)
                .map_or(false, |methods| methods.contains_key(method)),
        )
    }

    /// Registered class names, sorted
    pub fn class_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.classes.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    /// Name the instance was first registered under, or its Rust type name
    pub fn class_name(&self, instance: &dyn Service) -> String {
        self.names
            .get(&instance.as_any().type_id())
            .cloned()
            .unwrap_or_else(|| instance.type_name().to_string())
    }
}

impl fmt::Debug for ClassRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut classes: Vec<(&str, &str, usize)> = self
            .classes
            .iter()
            .map(|(name, entry)| {
                let methods = self.methods.get(&entry.type_id).map_or(0, |m| m.len());
                (name.as_str(), entry.type_name, methods)
            })
            .collect();
        classes.sort_unstable();
        f.debug_struct("ClassRegistry")
            .field("classes", &classes)
            .finish()
    }
}

/// Fluent registration of methods for one type
pub struct ClassBuilder<'a, T> {
    registry: &'a mut ClassRegistry,
    _marker: PhantomData<fn() -> T>,
}

impl<'a, T: Service> ClassBuilder<'a, T> {
    /// Register a method callable from definitions by `name`
    pub fn method<F>(self, name: &str, method: F) -> Self
    where
        F: Fn(&mut T, Args) -> DiResult<()> + Send + Sync + 'static,
    {
        let erased: Method = Arc::new(move |instance: &mut dyn Service, args: Args| -> DiResult<()> {
            let target = args.target().to_string();
            let instance = instance
                .downcast_mut::<T>()
                .ok_or_else(|| DiError::InvalidArgument {
                    target,
                    position: 0,
                    reason: format!("receiver is not a {}", std::any::type_name::<T>()),
                })?;
            method(instance, args)
        });

        self.registry
            .methods
            .entry(TypeId::of::<T>())
            .or_default()
            .insert(name.to_string(), erased);
        self
    }

    /// Register an alternative class name for the same type
    pub fn alias<F>(self, name: &str, constructor: F) -> Self
    where
        F: Fn(Args) -> DiResult<T> + Send + Sync + 'static,
    {
        let registry = self.registry;
        registry.register(name, constructor);
        ClassBuilder {
            registry,
            _marker: PhantomData,
        }
    }
}
