//! Resolution and construction of object graphs
//!
//! The builder turns a definition id into a live instance. Constructor and
//! method arguments are resolved left to right: literals pass through,
//! parameter references are looked up in the store, and definition
//! references are built recursively. Nothing is cached here; every call to
//! [`Builder::build`] produces fresh instances all the way down.
//!
//! Reference cycles are rejected with [`DiError::CycleDetected`]. The ids
//! currently under construction are tracked on a stack that travels with the
//! recursion, so a cycle is reported with its full path instead of
//! overflowing the call stack.

use crate::args::{Args, Resolved};
use crate::argument::Argument;
use crate::config::ConfigStore;
use crate::definition::{Definition, MethodCall};
use crate::error::{DiError, DiResult};
use crate::registry::ClassRegistry;
use crate::service::Instance;
use serde_json::Value;
use std::sync::Arc;

/// Anything that can turn a definition id into an instance
pub trait InstanceBuilder: Send + Sync {
    /// Build a fresh instance of the definition `id`
    fn build(&self, id: &str, store: &dyn ConfigStore) -> DiResult<Instance>;
}

/// Builds instances from definitions using a class registry
#[derive(Debug, Clone)]
pub struct Builder {
    registry: Arc<ClassRegistry>,
}

/// Ids under construction, outermost first
#[derive(Debug, Default)]
struct BuildStack {
    ids: Vec<String>,
}

impl BuildStack {
    fn enter(&mut self, id: &str) -> DiResult<()> {
        if self.ids.iter().any(|open| open == id) {
            let mut path = self.ids.clone();
            path.push(id.to_string());
            return Err(DiError::CycleDetected {
                path: path.join(" -> "),
            });
        }
        self.ids.push(id.to_string());
        Ok(())
    }

    fn leave(&mut self) {
        self.ids.pop();
    }
}

impl Builder {
    pub fn new(registry: Arc<ClassRegistry>) -> Self {
        Self { registry }
    }

    pub fn registry(&self) -> &ClassRegistry {
        &self.registry
    }

    /// Build the definition `id` and everything it references
    pub fn build(&self, id: &str, store: &dyn ConfigStore) -> DiResult<Instance> {
        self.build_in(id, store, &mut BuildStack::default())
    }

    /// Instantiate a definition's class with its resolved constructor arguments
    ///
    /// Method calls declared on the definition are not applied.
    pub fn new_instance(&self, definition: &Definition, store: &dyn ConfigStore) -> DiResult<Instance> {
        self.new_instance_in(definition, store, &mut BuildStack::default())
    }

    /// Apply method calls to an instance, in order
    ///
    /// The same instance is returned. Calls that succeeded before a failing
    /// one have already taken effect.
    pub fn invoke_calls(
        &self,
        instance: Instance,
        calls: &[MethodCall],
        store: &dyn ConfigStore,
    ) -> DiResult<Instance> {
        self.invoke_calls_in(instance, calls, store, &mut BuildStack::default())
    }

    /// Resolve arguments one to one, preserving order
    pub fn resolve_args(&self, arguments: &[Argument], store: &dyn ConfigStore) -> DiResult<Vec<Resolved>> {
        self.resolve_args_in(arguments, store, &mut BuildStack::default())
    }

    fn build_in(&self, id: &str, store: &dyn ConfigStore, stack: &mut BuildStack) -> DiResult<Instance> {
        let definition = store.definition(id).ok_or_else(|| DiError::DefinitionNotFound {
            id: id.to_string(),
        })?;

        stack.enter(id)?;
        let instance = self.new_instance_in(definition, store, stack)?;
        let instance = match &definition.calls {
            Some(calls) => self.invoke_calls_in(instance, calls, store, stack)?,
            None => instance,
        };
        stack.leave();

        Ok(instance)
    }

    fn new_instance_in(
        &self,
        definition: &Definition,
        store: &dyn ConfigStore,
        stack: &mut BuildStack,
    ) -> DiResult<Instance> {
        let constructor = self.registry.constructor(&definition.class)?;
        let target = format!("{}::new", definition.class);

        let args = match &definition.args {
            Some(arguments) => Args::new(target, self.resolve_args_in(arguments, store, stack)?),
            None => Args::empty(target),
        };

        constructor(args)
    }

    fn invoke_calls_in(
        &self,
        mut instance: Instance,
        calls: &[MethodCall],
        store: &dyn ConfigStore,
        stack: &mut BuildStack,
    ) -> DiResult<Instance> {
        for call in calls {
            // Lookup happens before any of this call's arguments are built
            let method = self.registry.method(&*instance, &call.method)?;
            let target = format!("{}::{}", self.registry.class_name(&*instance), call.method);

            let args = match &call.arguments {
                Some(arguments) => Args::new(target, self.resolve_args_in(arguments, store, stack)?),
                None => Args::empty(target),
            };

            method(&mut *instance, args)?;
        }

        Ok(instance)
    }

    fn resolve_args_in(
        &self,
        arguments: &[Argument],
        store: &dyn ConfigStore,
        stack: &mut BuildStack,
    ) -> DiResult<Vec<Resolved>> {
        let mut resolved = Vec::with_capacity(arguments.len());
        for argument in arguments {
            resolved.push(match argument {
                Argument::Literal(value) => Resolved::Value(value.clone()),
                Argument::Definition(id) => Resolved::Instance(self.build_in(id, store, stack)?),
                Argument::Parameter(path) => Resolved::Value(get_parameter(path, store)?),
            });
        }
        Ok(resolved)
    }
}

impl InstanceBuilder for Builder {
    fn build(&self, id: &str, store: &dyn ConfigStore) -> DiResult<Instance> {
        Builder::build(self, id, store)
    }
}

fn get_parameter(path: &str, store: &dyn ConfigStore) -> DiResult<Value> {
    store
        .parameter(path)
        .cloned()
        .ok_or_else(|| DiError::ParameterNotFound {
            path: path.to_string(),
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Debug)]
    struct Transport {
        host: String,
        port: i64,
    }

    struct Mailer {
        transport: Box<Transport>,
        from: Option<String>,
        log: Vec<String>,
    }

    fn registry(constructed: Arc<AtomicUsize>) -> ClassRegistry {
        let mut registry = ClassRegistry::new();
        registry.register("Transport", move |args: Args| {
            constructed.fetch_add(1, Ordering::SeqCst);
            Ok(Transport {
                host: args.str(0)?.to_string(),
                port: args.i64(1)?,
            })
        });
        registry
            .register("Mailer", |mut args: Args| {
                Ok(Mailer {
                    transport: args.take::<Transport>(0)?,
                    from: None,
                    log: Vec::new(),
                })
            })
            .method("setFrom", |mailer: &mut Mailer, args| {
                mailer.from = Some(args.str(0)?.to_string());
                mailer.log.push("setFrom".to_string());
                Ok(())
            })
            .method("ping", |mailer: &mut Mailer, args| {
                args.expect_len(0)?;
                mailer.log.push("ping".to_string());
                Ok(())
            });
        registry
    }

    fn store() -> Config {
        let mut config = Config::default();
        config
            .set_definition(
                "transport",
                Definition::new("Transport")
                    .with_args([Argument::parameter("smtp.host"), Argument::literal(25)]),
            )
            .set_definition(
                "mailer",
                Definition::new("Mailer")
                    .with_args([Argument::definition("transport")])
                    .with_call(
                        MethodCall::new("setFrom").with_arguments([Argument::parameter("mail.from")]),
                    )
                    .with_call(MethodCall::new("ping")),
            )
            .set_parameter("smtp", json!({ "host": "mail.local" }))
            .set_parameter("mail", json!({ "from": "noreply@example.com" }));
        config
    }

    #[test]
    fn test_build_nested_graph() {
        let builder = Builder::new(Arc::new(registry(Arc::default())));
        let instance = builder.build("mailer", &store()).unwrap();
        let mailer = instance.downcast_ref::<Mailer>().unwrap();

        assert_eq!(mailer.transport.host, "mail.local");
        assert_eq!(mailer.transport.port, 25);
        assert_eq!(mailer.from.as_deref(), Some("noreply@example.com"));
        assert_eq!(mailer.log, vec!["setFrom", "ping"]);
    }

    #[test]
    fn test_unknown_definition_builds_nothing() {
        let constructed = Arc::new(AtomicUsize::new(0));
        let builder = Builder::new(Arc::new(registry(constructed.clone())));

        let err = builder.build("missing", &store()).err().unwrap();
        assert!(matches!(err, DiError::DefinitionNotFound { ref id } if id == "missing"));
        assert_eq!(constructed.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_builder_never_caches() {
        let constructed = Arc::new(AtomicUsize::new(0));
        let builder = Builder::new(Arc::new(registry(constructed.clone())));
        let store = store();

        let first = builder.build("transport", &store).unwrap();
        let second = builder.build("transport", &store).unwrap();

        assert_eq!(constructed.load(Ordering::SeqCst), 2);
        let first_ptr = first.downcast_ref::<Transport>().unwrap() as *const Transport;
        let second_ptr = second.downcast_ref::<Transport>().unwrap() as *const Transport;
        assert_ne!(first_ptr, second_ptr);
    }

    #[test]
    fn test_unknown_class() {
        let builder = Builder::new(Arc::new(ClassRegistry::new()));
        let err = builder.build("transport", &store()).err().unwrap();
        assert!(matches!(err, DiError::UnknownClass { ref class } if class == "Transport"));
    }

    #[test]
    fn test_missing_parameter_propagates_unchanged() {
        let builder = Builder::new(Arc::new(registry(Arc::default())));
        let mut store = store();
        store.set_parameter("smtp", json!({ "port": 25 }));

        let err = builder.build("mailer", &store).err().unwrap();
        assert!(matches!(err, DiError::ParameterNotFound { ref path } if path == "smtp.host"));
    }

    #[test]
    fn test_parameter_values_are_not_rescanned() {
        let builder = Builder::new(Arc::new(registry(Arc::default())));
        let mut store = store();
        store.set_parameter("smtp", json!({ "host": "@mailer" }));

        let instance = builder.build("transport", &store).unwrap();
        assert_eq!(instance.downcast_ref::<Transport>().unwrap().host, "@mailer");
    }

    #[test]
    fn test_invoke_calls_preserves_identity() {
        let builder = Builder::new(Arc::new(registry(Arc::default())));
        let store = store();
        let definition = store.definition("mailer").unwrap();

        let instance = builder.new_instance(definition, &store).unwrap();
        assert!(instance.downcast_ref::<Mailer>().unwrap().log.is_empty());
        let before = instance.downcast_ref::<Mailer>().unwrap() as *const Mailer;

        let calls = definition.calls.as_deref().unwrap();
        let instance = builder.invoke_calls(instance, calls, &store).unwrap();
        let after = instance.downcast_ref::<Mailer>().unwrap() as *const Mailer;

        assert_eq!(before, after);
        assert_eq!(instance.downcast_ref::<Mailer>().unwrap().log.len(), 2);
    }

    #[test]
    fn test_resolve_args_mixed() {
        let builder = Builder::new(Arc::new(registry(Arc::default())));
        let resolved = builder
            .resolve_args(
                &[
                    Argument::literal("plain"),
                    Argument::parameter("smtp.host"),
                    Argument::definition("transport"),
                ],
                &store(),
            )
            .unwrap();

        assert_eq!(resolved.len(), 3);
        assert_eq!(resolved[0].as_value(), Some(&json!("plain")));
        assert_eq!(resolved[1].as_value(), Some(&json!("mail.local")));
        assert!(resolved[2].as_instance().unwrap().is::<Transport>());
    }

    #[test]
    fn test_self_reference_is_a_cycle() {
        let builder = Builder::new(Arc::new(registry(Arc::default())));
        let mut store = store();
        store.set_definition(
            "loop",
            Definition::new("Mailer").with_args([Argument::definition("loop")]),
        );

        let err = builder.build("loop", &store).err().unwrap();
        assert!(matches!(err, DiError::CycleDetected { ref path } if path == "loop -> loop"));
    }

    #[test]
    fn test_cycle_through_method_call() {
        struct Node;

        let mut registry = ClassRegistry::new();
        registry
            .register("Node", |_| Ok(Node))
            .method("setParent", |_: &mut Node, mut args| {
                args.take::<Node>(0)?;
                Ok(())
            });

        let mut store = Config::default();
        store
            .set_definition(
                "a",
                Definition::new("Node")
                    .with_call(MethodCall::new("setParent").with_arguments([Argument::definition("a")])),
            )
            .set_definition("b", Definition::new("Node").with_args([Argument::definition("c")]))
            .set_definition(
                "c",
                Definition::new("Node")
                    .with_call(MethodCall::new("setParent").with_arguments([Argument::definition("b")])),
            );

        let builder = Builder::new(Arc::new(registry));
        let err = builder.build("a", &store).err().unwrap();
        assert!(matches!(err, DiError::CycleDetected { ref path } if path == "a -> a"));

        let err = builder.build("b", &store).err().unwrap();
        assert!(matches!(err, DiError::CycleDetected { ref path } if path == "b -> c -> b"));
    }

    #[test]
    fn test_diamond_is_not_a_cycle() {
        let mut registry = ClassRegistry::new();
        registry.register("Pair", |args: Args| Ok(args.len()));
        registry.register("Leaf", |_| Ok(0usize));

        let mut store = Config::default();
        store
            .set_definition(
                "top",
                Definition::new("Pair")
                    .with_args([Argument::definition("left"), Argument::definition("right")]),
            )
            .set_definition("left", Definition::new("Pair").with_args([Argument::definition("leaf")]))
            .set_definition("right", Definition::new("Pair").with_args([Argument::definition("leaf")]))
            .set_definition("leaf", Definition::new("Leaf"));

        let builder = Builder::new(Arc::new(registry));
        let top = builder.build("top", &store).unwrap();
        assert_eq!(*top.downcast_ref::<usize>().unwrap(), 2);
    }
}
