//! Aggregate function trait with type-erased state adapter.
//!
//! An aggregate function reduces a column of values for one group (e.g.
//! `sum`, `collect`). Each group gets its own accumulator state.
//!
//! # Type Erasure
//!
//! The [`FunctionRegistry`](crate::FunctionRegistry) stores aggregates as
//! `Arc<dyn AggregateFunction<State = Box<dyn Any + Send>>>`. Concrete
//! implementations use [`AggregateAdapter`] to wrap their typed state.

use std::any::Any;

use quiver_error::{QuiverError, Result};
use quiver_types::Value;

/// A named aggregation behavior: an accumulator shape, a step rule, and a
/// finalize rule.
///
/// This trait is **open** (user-implementable). Extension authors implement
/// it to register custom aggregations.
///
/// # State Lifecycle
///
/// 1. [`initial_state`](Self::initial_state) creates a fresh accumulator.
/// 2. [`step`](Self::step) is called once per input row with a batch of
///    `num_args` values (the primary value plus any fixed auxiliary
///    arguments, e.g. a percentile fraction in the trailing slot).
/// 3. [`finalize`](Self::finalize) consumes the state and returns the
///    group's single output scalar.
///
/// # Send + Sync
///
/// The function object itself is shared across threads via `Arc`. The
/// `State` type must be `Send` so a handle can be moved between worker
/// threads; a given state is only ever driven by one caller at a time.
pub trait AggregateFunction: Send + Sync {
    /// The per-group accumulator type.
    type State: Send;

    /// Create a fresh accumulator (zero/identity state).
    fn initial_state(&self) -> Self::State;

    /// Process one row, updating the accumulator.
    fn step(&self, state: &mut Self::State, args: &[Value]) -> Result<()>;

    /// Consume the accumulator and produce the final result.
    fn finalize(&self, state: Self::State) -> Result<Value>;

    /// The number of arguments this function accepts (`-1` = variadic).
    fn num_args(&self) -> i32;

    /// The function name, used for registration and in error messages.
    fn name(&self) -> &str;
}

/// Type-erased adapter that wraps a concrete [`AggregateFunction`] so the
/// registry can store heterogeneous aggregates behind a single trait object.
///
/// The adapter implements `AggregateFunction<State = Box<dyn Any + Send>>`,
/// boxing the concrete state on creation and downcasting on step/finalize.
/// A downcast mismatch is reported as an internal error rather than a panic
/// since erased handles are part of the public execution surface.
pub struct AggregateAdapter<F> {
    inner: F,
}

impl<F> AggregateAdapter<F> {
    /// Wrap a concrete aggregate function for type-erased storage.
    pub const fn new(inner: F) -> Self {
        Self { inner }
    }
}

impl<F> AggregateFunction for AggregateAdapter<F>
where
    F: AggregateFunction,
    F::State: 'static,
{
    type State = Box<dyn Any + Send>;

    fn initial_state(&self) -> Self::State {
        Box::new(self.inner.initial_state())
    }

    fn step(&self, state: &mut Self::State, args: &[Value]) -> Result<()> {
        let concrete = state.downcast_mut::<F::State>().ok_or_else(|| {
            QuiverError::internal(format!("{}: accumulator state type mismatch", self.name()))
        })?;
        self.inner.step(concrete, args)
    }

    fn finalize(&self, state: Self::State) -> Result<Value> {
        let concrete = state.downcast::<F::State>().map_err(|_| {
            QuiverError::internal(format!("{}: accumulator state type mismatch", self.name()))
        })?;
        self.inner.finalize(*concrete)
    }

    fn num_args(&self) -> i32 {
        self.inner.num_args()
    }

    fn name(&self) -> &str {
        self.inner.name()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;

    // -- Mock: integer tally over one column --

    struct Tally;

    impl AggregateFunction for Tally {
        type State = i64;

        fn initial_state(&self) -> i64 {
            0
        }

        fn step(&self, state: &mut i64, args: &[Value]) -> Result<()> {
            if let Some(n) = args[0].as_integer() {
                *state += n;
            }
            Ok(())
        }

        fn finalize(&self, state: i64) -> Result<Value> {
            Ok(Value::Integer(state))
        }

        fn num_args(&self) -> i32 {
            1
        }

        fn name(&self) -> &str {
            "tally"
        }
    }

    #[test]
    fn test_aggregate_initial_state() {
        let agg = Tally;
        assert_eq!(agg.initial_state(), 0);
    }

    #[test]
    fn test_aggregate_step_and_finalize() {
        let agg = Tally;
        let mut state = agg.initial_state();

        agg.step(&mut state, &[Value::Integer(10)]).unwrap();
        agg.step(&mut state, &[Value::Integer(20)]).unwrap();
        agg.step(&mut state, &[Value::Integer(12)]).unwrap();

        let result = agg.finalize(state).unwrap();
        assert_eq!(result, Value::Integer(42));
    }

    #[test]
    fn test_aggregate_type_erasure_adapter() {
        let adapted: AggregateAdapter<Tally> = AggregateAdapter::new(Tally);
        let erased: Arc<dyn AggregateFunction<State = Box<dyn Any + Send>>> = Arc::new(adapted);

        let mut state = erased.initial_state();
        erased.step(&mut state, &[Value::Integer(10)]).unwrap();
        erased.step(&mut state, &[Value::Integer(32)]).unwrap();

        let result = erased.finalize(state).unwrap();
        assert_eq!(result, Value::Integer(42));

        // Verify we can clone the Arc (shared across threads).
        let e2 = Arc::clone(&erased);
        assert_eq!(e2.name(), "tally");
    }

    #[test]
    fn test_adapter_state_mismatch_is_internal_error() {
        let adapted = AggregateAdapter::new(Tally);
        // Hand the adapter a state box of the wrong concrete type.
        let mut bogus: Box<dyn Any + Send> = Box::new(String::from("not a tally state"));
        let err = adapted.step(&mut bogus, &[Value::Integer(1)]).unwrap_err();
        assert!(matches!(err, QuiverError::Internal(_)));

        let err = adapted.finalize(bogus).unwrap_err();
        assert!(matches!(err, QuiverError::Internal(_)));
    }
}
