//! Inter-pass analysis state.

use rustc_hash::{FxHashMap, FxHashSet};
use std::any::{Any, TypeId};

use crate::layout::Layout;

/// Mutable state shared by the passes of one pipeline run.
///
/// The layout gets a dedicated field because nearly every stage touches
/// it. Everything else lives in a type-keyed map: an analysis pass
/// stores its result under its own result type and downstream passes
/// read it back by type.
#[derive(Debug, Default)]
pub struct PropertySet {
    /// The current virtual-to-physical assignment, once a layout pass
    /// has chosen one.
    pub layout: Option<Layout>,
    values: FxHashMap<TypeId, Box<dyn Any + Send + Sync>>,
    /// Names of analysis results currently trusted. A transformation
    /// pass that changes the circuit invalidates the names it declares.
    valid: FxHashSet<&'static str>,
}

impl PropertySet {
    /// Create an empty property set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Store a value, replacing any previous value of the same type.
    pub fn set<T: Any + Send + Sync>(&mut self, value: T) {
        self.values.insert(TypeId::of::<T>(), Box::new(value));
    }

    /// Read a value by type.
    pub fn get<T: Any + Send + Sync>(&self) -> Option<&T> {
        self.values
            .get(&TypeId::of::<T>())
            .and_then(|v| v.downcast_ref())
    }

    /// Read a value mutably by type.
    pub fn get_mut<T: Any + Send + Sync>(&mut self) -> Option<&mut T> {
        self.values
            .get_mut(&TypeId::of::<T>())
            .and_then(|v| v.downcast_mut())
    }

    /// Check whether a value of the given type is present.
    pub fn contains<T: Any + Send + Sync>(&self) -> bool {
        self.values.contains_key(&TypeId::of::<T>())
    }

    /// Remove a value by type, returning it.
    pub fn remove<T: Any + Send + Sync>(&mut self) -> Option<T> {
        self.values
            .remove(&TypeId::of::<T>())
            .and_then(|v| v.downcast().ok())
            .map(|b| *b)
    }

    /// Mark a named analysis result as trusted.
    pub fn mark_valid(&mut self, name: &'static str) {
        self.valid.insert(name);
    }

    /// Mark a named analysis result as stale.
    pub fn invalidate(&mut self, name: &str) {
        self.valid.remove(name);
    }

    /// Check whether a named analysis result is trusted.
    pub fn is_valid(&self, name: &str) -> bool {
        self.valid.contains(name)
    }
}
