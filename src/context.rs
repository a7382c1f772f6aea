//! Per-module evaluation contexts
//!
//! Each module scope owns one [`EvalContext`]; child module contexts
//! nest under their parent's, mirroring module nesting. The walk may
//! visit sibling nodes concurrently and several nodes write into the
//! same module's context, so every context carries its own mutex. The
//! lock is held across writing a resolved link value *and* decoding the
//! resource body against the enriched scope, and lives as long as the
//! context itself.

use serde_json::{Map, Value};
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

/// One module scope's variable namespace
#[derive(Debug, Default)]
pub struct EvalContext {
    vars: Mutex<Map<String, Value>>,
    children: Mutex<HashMap<String, Arc<EvalContext>>>,
}

impl EvalContext {
    /// Create a root context
    pub fn root() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Get or create the child context for a direct sub-module
    pub fn child(&self, name: &str) -> Arc<EvalContext> {
        let mut children = self
            .children
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        children
            .entry(name.to_string())
            .or_insert_with(|| Arc::new(Self::default()))
            .clone()
    }

    /// Walk a dotted module path down from this context
    ///
    /// An empty path returns this context itself.
    pub fn descend(self: &Arc<Self>, module_path: &str) -> Arc<EvalContext> {
        let mut current = self.clone();
        for part in module_path.split('.').filter(|p| !p.is_empty()) {
            let next = current.child(part);
            current = next;
        }
        current
    }

    /// Lock the variable scope for a write-and-decode critical section
    pub fn lock(&self) -> MutexGuard<'_, Map<String, Value>> {
        self.vars.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Look up a dotted path in this context's variables
    pub fn lookup(&self, path: &str) -> Option<Value> {
        crate::expr::lookup_path(&self.lock(), path)
    }

    /// Set a value at a dotted path, taking the lock for the write
    pub fn set_var(&self, path: &str, value: Value) {
        set_path(&mut self.lock(), path, value);
    }
}

/// Set a value at a dotted path inside an already-locked scope
///
/// Intermediate segments become nested objects; an existing non-object
/// intermediate is replaced.
pub fn set_path(vars: &mut Map<String, Value>, path: &str, value: Value) {
    let segments: Vec<&str> = path.split('.').filter(|p| !p.is_empty()).collect();
    let Some((last, rest)) = segments.split_last() else {
        return;
    };
    let mut current = vars;
    for segment in rest {
        let entry = current
            .entry((*segment).to_string())
            .or_insert_with(|| Value::Object(Map::new()));
        if !entry.is_object() {
            *entry = Value::Object(Map::new());
        }
        // Just ensured the entry is an object.
        let Value::Object(next) = entry else {
            return;
        };
        current = next;
    }
    current.insert((*last).to_string(), value);
}
