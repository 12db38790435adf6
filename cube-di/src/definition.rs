//! Object definitions

use crate::argument::Argument;
use serde::{Deserialize, Serialize};

/// Recipe for building one object
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Definition {
    /// Registered class name to instantiate
    pub class: String,
    /// Positional constructor arguments
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub args: Option<Vec<Argument>>,
    /// Methods invoked after construction, in order
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub calls: Option<Vec<MethodCall>>,
    /// Pin the first built instance in the container
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub shared: bool,
}

/// A post-construction method invocation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MethodCall {
    pub method: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub arguments: Option<Vec<Argument>>,
}

impl Definition {
    pub fn new(class: impl Into<String>) -> Self {
        Self {
            class: class.into(),
            args: None,
            calls: None,
            shared: false,
        }
    }

    /// Set the constructor arguments
    pub fn with_args(mut self, args: impl IntoIterator<Item = Argument>) -> Self {
        self.args = Some(args.into_iter().collect());
        self
    }

    /// Append a method call
    pub fn with_call(mut self, call: MethodCall) -> Self {
        self.calls.get_or_insert_with(Vec::new).push(call);
        self
    }

    pub fn shared(mut self) -> Self {
        self.shared = true;
        self
    }

    /// All arguments of the constructor and every call, in declaration order
    pub fn arguments(&self) -> impl Iterator<Item = &Argument> {
        let ctor = self.args.iter().flatten();
        let calls = self
            .calls
            .iter()
            .flatten()
            .flat_map(|call| call.arguments.iter().flatten());
        ctor.chain(calls)
    }
}

impl MethodCall {
    pub fn new(method: impl Into<String>) -> Self {
        Self {
            method: method.into(),
            arguments: None,
        }
    }

    pub fn with_arguments(mut self, arguments: impl IntoIterator<Item = Argument>) -> Self {
        self.arguments = Some(arguments.into_iter().collect());
        self
    }
}
