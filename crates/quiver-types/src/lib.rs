//! Shared value types for the Quiver graph query engine.
//!
//! The execution layer moves rows of dynamically-typed scalar values between
//! operators; [`Value`] is that scalar. It defines the numeric coercion rules
//! and the cross-type total order every downstream consumer (filtering,
//! ordering, aggregation) relies on.

pub mod value;

pub use value::Value;
