//! Per-group aggregation state handle.
//!
//! A handle owns one accumulator for one reducer instance within one group.
//! The group-aggregation driver feeds it batches via [`AggregateHandle::step`]
//! (one call per input row) and asks for the terminal scalar via
//! [`AggregateHandle::finalize`] once input is exhausted.

use std::any::Any;
use std::sync::Arc;

use quiver_error::{QuiverError, Result};
use quiver_types::Value;
use tracing::debug;

use crate::ErasedAggregateFunction;

/// The state machine driving one aggregation: `Accumulating → Finalized`,
/// with an orthogonal errored flag reachable at any point during
/// accumulation.
///
/// Once the error slot is set, further [`step`](Self::step) calls are
/// no-ops. [`finalize`](Self::finalize) must still be called by convention;
/// it consumes the accumulator (releasing any scratch buffers it holds) and
/// reports the recorded error. Calling `finalize` more than once returns the
/// stored result or error without touching state.
pub struct AggregateHandle {
    function: Arc<ErasedAggregateFunction>,
    /// Live accumulator; `None` once finalize has consumed it.
    state: Option<Box<dyn Any + Send>>,
    error: Option<QuiverError>,
    result: Option<Value>,
}

impl std::fmt::Debug for AggregateHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AggregateHandle")
            .field("error", &self.error)
            .field("result", &self.result)
            .finish_non_exhaustive()
    }
}

impl AggregateHandle {
    /// Create a fresh handle with its own independent accumulator.
    pub fn new(function: Arc<ErasedAggregateFunction>) -> Self {
        let state = function.initial_state();
        Self {
            function,
            state: Some(state),
            error: None,
            result: None,
        }
    }

    /// The reducer name this handle is wired to.
    pub fn name(&self) -> &str {
        self.function.name()
    }

    /// The declared batch arity of the underlying reducer.
    pub fn num_args(&self) -> i32 {
        self.function.num_args()
    }

    /// Deliver one row's batch of values to the accumulator.
    ///
    /// Returns the error once, at the step that raised it, and records it in
    /// the error slot; any later call on an errored (or already finalized)
    /// handle is an `Ok` no-op.
    pub fn step(&mut self, args: &[Value]) -> Result<()> {
        if self.error.is_some() {
            return Ok(());
        }
        let Some(state) = self.state.as_mut() else {
            return Ok(());
        };
        if let Err(err) = self.function.step(state, args) {
            debug!(function = self.function.name(), error = %err, "aggregation step failed");
            self.error = Some(err.clone());
            return Err(err);
        }
        Ok(())
    }

    /// Consume the accumulator and produce the group's output scalar.
    ///
    /// On the error path the accumulator is still consumed — dropping it
    /// releases every scratch buffer the reducer grew while stepping — and
    /// the recorded error is returned. Accidental repeat calls return the
    /// stored outcome without corrupting state.
    pub fn finalize(&mut self) -> Result<Value> {
        let Some(state) = self.state.take() else {
            // Already finalized: report the stored outcome.
            if let Some(err) = &self.error {
                return Err(err.clone());
            }
            if let Some(value) = &self.result {
                return Ok(value.clone());
            }
            return Err(QuiverError::internal(format!(
                "{}: finalize called on a consumed handle",
                self.function.name()
            )));
        };

        if let Some(err) = &self.error {
            drop(state);
            return Err(err.clone());
        }

        match self.function.finalize(state) {
            Ok(value) => {
                self.result = Some(value.clone());
                Ok(value)
            }
            Err(err) => {
                debug!(function = self.function.name(), error = %err, "aggregation finalize failed");
                self.error = Some(err.clone());
                Err(err)
            }
        }
    }

    /// Whether an error has been recorded for this handle.
    pub const fn is_errored(&self) -> bool {
        self.error.is_some()
    }

    /// The recorded error, if any.
    pub const fn error(&self) -> Option<&QuiverError> {
        self.error.as_ref()
    }

    /// Human-readable message for the recorded error, if any.
    pub fn error_message(&self) -> Option<String> {
        self.error.as_ref().map(ToString::to_string)
    }

    /// The finalized result, if finalize has completed successfully.
    pub const fn result(&self) -> Option<&Value> {
        self.result.as_ref()
    }
}
