//! Service trait and instance handles

use downcast_rs::{impl_downcast, DowncastSync};
use std::sync::Arc;

/// Trait that all injectable types implement
///
/// Every `'static + Send + Sync` type qualifies through the blanket impl, so
/// registering a class never requires implementing anything by hand. The
/// blanket impl also covers `Box<dyn Service>` itself: call trait methods on
/// the dereferenced `dyn Service`, never on the box.
pub trait Service: DowncastSync {
    /// Get the type name of the service
    fn type_name(&self) -> &'static str {
        std::any::type_name::<Self>()
    }
}

impl_downcast!(sync Service);

/// Blanket implementation for all suitable types
impl<T: std::any::Any + Send + Sync> Service for T {}

/// A freshly built instance, exclusively owned by whoever requested it
pub type Instance = Box<dyn Service>;

/// An instance pinned in a container and handed out by reference count
pub type SharedInstance = Arc<dyn Service>;
