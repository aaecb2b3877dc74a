//! Streaming aggregation for grouped query execution.
//!
//! This crate defines the open [`AggregateFunction`] trait, the per-group
//! [`AggregateHandle`] state machine that drives it, and a
//! [`FunctionRegistry`] resolving reducers by `(name, num_args)` key with
//! variadic fallback. The twelve standard reducers live in [`builtins`];
//! [`register_builtins`] installs them all.
//!
//! The execution model is streaming: a handle is created per reducer per
//! group, fed one row at a time, and finalized once after input is
//! exhausted. No reducer ever needs the whole input up front; the ones that
//! must see every value (`percentile*`, `stDev*`, `collect*`) buffer
//! internally and do their ordering work at finalize.

use std::any::Any;
use std::collections::HashMap;
use std::sync::Arc;

use quiver_error::{QuiverError, Result};
use tracing::debug;

pub mod builtins;
pub mod distinct;
pub mod function;
pub mod handle;

pub use builtins::register_builtins;
pub use distinct::{distinct_count, distinct_values};
pub use function::{AggregateAdapter, AggregateFunction};
pub use handle::AggregateHandle;

/// Type-erased aggregate function object used by the registry.
pub type ErasedAggregateFunction = dyn AggregateFunction<State = Box<dyn Any + Send>>;

/// Composite lookup key for aggregates: `(UPPERCASE name, num_args)`.
///
/// `-1` for `num_args` means variadic (any number of arguments).
/// Names are stored as uppercase ASCII for case-insensitive matching.
#[derive(Debug, Clone, Hash, Eq, PartialEq)]
pub struct FunctionKey {
    /// Function name, stored as uppercase ASCII.
    pub name: String,
    /// Expected argument count, or `-1` for variadic.
    pub num_args: i32,
}

impl FunctionKey {
    /// Create a new function key with the name canonicalized to uppercase.
    #[must_use]
    pub fn new(name: &str, num_args: i32) -> Self {
        Self {
            name: canonical_name(name),
            num_args,
        }
    }
}

/// Registry for aggregate functions, keyed by `(name, num_args)`.
///
/// Lookup strategy:
/// 1. Exact match on `(UPPERCASE_NAME, num_args)`.
/// 2. Fallback to variadic version `(UPPERCASE_NAME, -1)`.
/// 3. `None` if neither found (the caller raises "no such function").
#[derive(Default)]
pub struct FunctionRegistry {
    aggregates: HashMap<FunctionKey, Arc<ErasedAggregateFunction>>,
}

impl FunctionRegistry {
    /// Create an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a registry pre-populated with every built-in reducer.
    #[must_use]
    pub fn with_builtins() -> Self {
        let mut registry = Self::new();
        register_builtins(&mut registry);
        registry
    }

    /// Register an aggregate function using the type-erased adapter.
    ///
    /// Overwrites any existing function with the same `(name, num_args)` key.
    /// Returns the previous function if one existed.
    pub fn register<F>(&mut self, function: F) -> Option<Arc<ErasedAggregateFunction>>
    where
        F: AggregateFunction + 'static,
        F::State: 'static,
    {
        let key = FunctionKey::new(function.name(), function.num_args());
        self.aggregates
            .insert(key, Arc::new(AggregateAdapter::new(function)))
    }

    /// Look up an aggregate function by `(name, num_args)`.
    ///
    /// Tries exact match first, then falls back to variadic `(name, -1)`.
    #[must_use]
    pub fn find(&self, name: &str, num_args: i32) -> Option<Arc<ErasedAggregateFunction>> {
        let canon = canonical_name(name);
        let exact = FunctionKey {
            name: canon.clone(),
            num_args,
        };
        if let Some(f) = self.aggregates.get(&exact) {
            debug!(name = %canon, arity = num_args, hit = "exact", "registry lookup");
            return Some(Arc::clone(f));
        }
        // Variadic fallback
        let variadic = FunctionKey {
            name: canon.clone(),
            num_args: -1,
        };
        let result = self.aggregates.get(&variadic).map(Arc::clone);
        debug!(
            name = %canon,
            arity = num_args,
            hit = if result.is_some() { "variadic" } else { "miss" },
            "registry lookup"
        );
        result
    }

    /// Whether the registry contains any aggregate with this name
    /// (any arg count).
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        let canon = canonical_name(name);
        self.aggregates.keys().any(|k| k.name == canon)
    }

    /// Resolve a reducer and wrap it in a fresh per-group handle.
    ///
    /// # Errors
    ///
    /// Returns [`QuiverError::UnknownFunction`] when no reducer matches.
    pub fn handle(&self, name: &str, num_args: i32) -> Result<AggregateHandle> {
        let function = self
            .find(name, num_args)
            .ok_or_else(|| QuiverError::unknown_function(name))?;
        Ok(AggregateHandle::new(function))
    }
}

fn canonical_name(name: &str) -> String {
    name.trim().to_ascii_uppercase()
}
