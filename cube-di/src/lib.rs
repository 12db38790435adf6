//! Configuration-driven dependency injection
//!
//! Objects are described as data: a class name registered in a
//! [`ClassRegistry`], positional constructor arguments, and methods to call
//! after construction. Arguments are literals, references to other
//! definitions (`"@mailer"`) or references to parameters by dotted path
//! (`"&smtp.host"`). The [`Builder`] resolves those references recursively
//! and the [`Container`] hands out instances by id, pinning shared ones.
//!
//! ```
//! use cube_di::prelude::*;
//! use serde_json::json;
//!
//! struct Transport {
//!     host: String,
//! }
//!
//! struct Mailer {
//!     transport: Box<Transport>,
//! }
//!
//! let mut registry = ClassRegistry::new();
//! registry.register("Transport", |args: Args| {
//!     Ok(Transport { host: args.str(0)?.to_string() })
//! });
//! registry.register("Mailer", |mut args: Args| {
//!     Ok(Mailer { transport: args.take::<Transport>(0)? })
//! });
//!
//! let config = Config::from_json(r#"{
//!     "definitions": {
//!         "transport": { "class": "Transport", "args": ["&smtp.host"] },
//!         "mailer": { "class": "Mailer", "args": ["@transport"], "shared": true }
//!     },
//!     "parameters": { "smtp": { "host": "mail.local" } }
//! }"#).unwrap();
//!
//! let container = Container::new(config, Builder::new(registry.into()));
//! let mailer = container.get_as::<Mailer>("mailer").unwrap();
//! assert_eq!(mailer.transport.host, "mail.local");
//! ```

pub mod analysis;
pub mod args;
pub mod argument;
pub mod builder;
pub mod config;
pub mod container;
pub mod definition;
pub mod error;
pub mod registry;
pub mod service;

pub use analysis::{DependencyAnalysis, Issue};
pub use args::{Args, Resolved};
pub use argument::{Argument, Sigils, DEFINITION_SIGIL, PARAMETER_SIGIL};
pub use builder::{Builder, InstanceBuilder};
pub use config::{Config, ConfigFile, ConfigStore};
pub use container::Container;
pub use definition::{Definition, MethodCall};
pub use error::{DiError, DiResult, ErrorKind};
pub use registry::{ClassBuilder, ClassRegistry};
pub use service::{Instance, Service, SharedInstance};

/// Prelude module for common imports
pub mod prelude {
    pub use crate::{
        Args, Argument, Builder, ClassRegistry, Config, ConfigStore, Container, Definition,
        DiError, DiResult, MethodCall, Service,
    };
}
