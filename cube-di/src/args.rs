//! Resolved arguments handed to constructors and methods

use crate::error::{DiError, DiResult};
use crate::service::{Instance, Service};
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::fmt;

/// A single argument after reference resolution
pub enum Resolved {
    /// A literal, or the value found at a parameter path
    Value(Value),
    /// An instance built from a definition reference
    Instance(Instance),
}

impl Resolved {
    pub fn as_value(&self) -> Option<&Value> {
        match self {
            Resolved::Value(value) => Some(value),
            Resolved::Instance(_) => None,
        }
    }

    pub fn as_instance(&self) -> Option<&dyn Service> {
        match self {
            Resolved::Value(_) => None,
            Resolved::Instance(instance) => Some(&**instance),
        }
    }
}

impl fmt::Debug for Resolved {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Resolved::Value(value) => f.debug_tuple("Value").field(value).finish(),
            Resolved::Instance(instance) => {
                f.debug_tuple("Instance").field(&(**instance).type_name()).finish()
            }
        }
    }
}

impl From<Value> for Resolved {
    fn from(value: Value) -> Self {
        Resolved::Value(value)
    }
}

impl From<Instance> for Resolved {
    fn from(instance: Instance) -> Self {
        Resolved::Instance(instance)
    }
}

/// Positional arguments for one constructor or method invocation
///
/// Accessors report failures as [`DiError::InvalidArgument`] naming the
/// invocation target and the offending position.
#[derive(Debug)]
pub struct Args {
    target: String,
    values: Vec<Option<Resolved>>,
}

impl Args {
    pub fn new(target: impl Into<String>, values: Vec<Resolved>) -> Self {
        Self {
            target: target.into(),
            values: values.into_iter().map(Some).collect(),
        }
    }

    /// Arguments for an invocation without any
    pub fn empty(target: impl Into<String>) -> Self {
        Self::new(target, Vec::new())
    }

    /// The constructor or method these arguments are for
    pub fn target(&self) -> &str {
        &self.target
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Fail unless exactly `expected` arguments were passed
    pub fn expect_len(&self, expected: usize) -> DiResult<()> {
        if self.values.len() == expected {
            Ok(())
        } else {
            Err(self.invalid(
                self.values.len().min(expected),
                format!("expected {} arguments, got {}", expected, self.values.len()),
            ))
        }
    }

    /// Borrow the raw resolved argument at `position`
    pub fn get(&self, position: usize) -> DiResult<&Resolved> {
        match self.values.get(position) {
            Some(Some(resolved)) => Ok(resolved),
            Some(None) => Err(self.invalid(position, "argument already taken")),
            None => Err(self.invalid(position, "missing argument")),
        }
    }

    /// Borrow a value argument
    pub fn value(&self, position: usize) -> DiResult<&Value> {
        self.get(position)?
            .as_value()
            .ok_or_else(|| self.invalid(position, "expected a value, got an instance"))
    }

    pub fn str(&self, position: usize) -> DiResult<&str> {
        self.value(position)?
            .as_str()
            .ok_or_else(|| self.invalid(position, "expected a string"))
    }

    pub fn i64(&self, position: usize) -> DiResult<i64> {
        self.value(position)?
            .as_i64()
            .ok_or_else(|| self.invalid(position, "expected an integer"))
    }

    pub fn u64(&self, position: usize) -> DiResult<u64> {
        self.value(position)?
            .as_u64()
            .ok_or_else(|| self.invalid(position, "expected a non-negative integer"))
    }

    pub fn f64(&self, position: usize) -> DiResult<f64> {
        self.value(position)?
            .as_f64()
            .ok_or_else(|| self.invalid(position, "expected a number"))
    }

    pub fn bool(&self, position: usize) -> DiResult<bool> {
        self.value(position)?
            .as_bool()
            .ok_or_else(|| self.invalid(position, "expected a boolean"))
    }

    /// Deserialize a value argument into any serde type
    pub fn parse<T: DeserializeOwned>(&self, position: usize) -> DiResult<T> {
        let value = self.value(position)?.clone();
        serde_json::from_value(value).map_err(|e| self.invalid(position, e.to_string()))
    }

    /// Take ownership of an instance argument as its concrete type
    pub fn take<T: Service>(&mut self, position: usize) -> DiResult<Box<T>> {
        match self.values.get(position) {
            Some(Some(Resolved::Instance(instance))) if instance.is::<T>() => {}
            Some(Some(Resolved::Instance(instance))) => {
                let reason = format!(
                    "expected {}, got {}",
                    std::any::type_name::<T>(),
                    (**instance).type_name()
                );
                return Err(self.invalid(position, reason));
            }
            _ => {
                self.get(position)?;
                return Err(self.invalid(position, "expected an instance, got a value"));
            }
        }

        match self.values[position].take() {
            Some(Resolved::Instance(instance)) => instance
                .downcast::<T>()
                .map_err(|_| self.invalid(position, "instance changed type")),
            _ => Err(self.invalid(position, "argument already taken")),
        }
    }

    /// Take every remaining argument in order
    pub fn into_vec(self) -> Vec<Resolved> {
        self.values.into_iter().flatten().collect()
    }

    fn invalid(&self, position: usize, reason: impl Into<String>) -> DiError {
        DiError::InvalidArgument {
            target: self.target.clone(),
            position,
            reason: reason.into(),
        }
    }
}
