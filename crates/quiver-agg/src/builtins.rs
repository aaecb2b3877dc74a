//! Built-in aggregation functions.
//!
//! All twelve reducers share two conventions. First, a `Null` primary value
//! is silently skipped by every reducer; a non-null value that a numeric
//! reducer cannot coerce aborts the group with a coercion error naming the
//! reducer. Second, reducers that buffer their inputs (`percentile*`,
//! `stDev*`, `collect*`) defer all ordering and deduplication work to
//! finalize, so stepping stays append-only.

use quiver_error::{QuiverError, Result};
use quiver_types::Value;

use crate::distinct::{distinct_count, distinct_values};
use crate::function::AggregateFunction;
use crate::FunctionRegistry;

/// Coerce one primary value for a numeric reducer.
///
/// `Ok(None)` means the row was a null and must be skipped. `Err` names the
/// reducer and the offending type.
fn numeric_arg(name: &str, value: &Value) -> Result<Option<f64>> {
    if value.is_null() {
        return Ok(None);
    }
    match value.to_f64() {
        Some(n) => Ok(Some(n)),
        None => Err(QuiverError::coercion(name, value.type_name())),
    }
}

// -- sum / avg --

/// Shared accumulator: `avg` reads both fields, `sum` only the total.
#[derive(Debug, Default)]
pub struct RunningSum {
    count: i64,
    total: f64,
}

impl RunningSum {
    fn step(&mut self, name: &str, args: &[Value]) -> Result<()> {
        if let Some(n) = numeric_arg(name, &args[0])? {
            self.count += 1;
            self.total += n;
        }
        Ok(())
    }
}

/// `sum(x)`: running total of coercible values. Always emits a float, even
/// for all-integer input; an empty group emits `0.0`.
pub struct SumFunc;

impl AggregateFunction for SumFunc {
    type State = RunningSum;

    fn initial_state(&self) -> RunningSum {
        RunningSum::default()
    }

    fn step(&self, state: &mut RunningSum, args: &[Value]) -> Result<()> {
        state.step(self.name(), args)
    }

    fn finalize(&self, state: RunningSum) -> Result<Value> {
        Ok(Value::Float(state.total))
    }

    fn num_args(&self) -> i32 {
        1
    }

    fn name(&self) -> &str {
        "sum"
    }
}

/// `avg(x)`: arithmetic mean of coercible values; `0.0` for an empty group.
pub struct AvgFunc;

impl AggregateFunction for AvgFunc {
    type State = RunningSum;

    fn initial_state(&self) -> RunningSum {
        RunningSum::default()
    }

    fn step(&self, state: &mut RunningSum, args: &[Value]) -> Result<()> {
        state.step(self.name(), args)
    }

    fn finalize(&self, state: RunningSum) -> Result<Value> {
        if state.count == 0 {
            return Ok(Value::Float(0.0));
        }
        Ok(Value::Float(state.total / state.count as f64))
    }

    fn num_args(&self) -> i32 {
        1
    }

    fn name(&self) -> &str {
        "avg"
    }
}

// -- max / min --

/// `max(x)`: greatest seen value under the cross-type total order. Works on
/// any comparable value, not just numbers. All-null input finalizes to
/// `Null`.
pub struct MaxFunc;

impl AggregateFunction for MaxFunc {
    type State = Option<Value>;

    fn initial_state(&self) -> Option<Value> {
        None
    }

    fn step(&self, state: &mut Option<Value>, args: &[Value]) -> Result<()> {
        let value = &args[0];
        if value.is_null() {
            return Ok(());
        }
        match state {
            Some(best) if best.total_cmp(value).is_ge() => {}
            _ => *state = Some(value.clone()),
        }
        Ok(())
    }

    fn finalize(&self, state: Option<Value>) -> Result<Value> {
        Ok(state.unwrap_or(Value::Null))
    }

    fn num_args(&self) -> i32 {
        1
    }

    fn name(&self) -> &str {
        "max"
    }
}

/// `min(x)`: least seen value under the cross-type total order.
pub struct MinFunc;

impl AggregateFunction for MinFunc {
    type State = Option<Value>;

    fn initial_state(&self) -> Option<Value> {
        None
    }

    fn step(&self, state: &mut Option<Value>, args: &[Value]) -> Result<()> {
        let value = &args[0];
        if value.is_null() {
            return Ok(());
        }
        match state {
            Some(best) if best.total_cmp(value).is_le() => {}
            _ => *state = Some(value.clone()),
        }
        Ok(())
    }

    fn finalize(&self, state: Option<Value>) -> Result<Value> {
        Ok(state.unwrap_or(Value::Null))
    }

    fn num_args(&self) -> i32 {
        1
    }

    fn name(&self) -> &str {
        "min"
    }
}

// -- count / countDistinct --

/// `count(x)`: number of non-null values.
pub struct CountFunc;

impl AggregateFunction for CountFunc {
    type State = i64;

    fn initial_state(&self) -> i64 {
        0
    }

    fn step(&self, state: &mut i64, args: &[Value]) -> Result<()> {
        if !args[0].is_null() {
            *state += 1;
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
        "count"
    }
}

/// `countDistinct(x)`: number of distinct non-null values, where
/// distinctness is equality under the cross-type total order.
pub struct CountDistinctFunc;

impl AggregateFunction for CountDistinctFunc {
    type State = Vec<Value>;

    fn initial_state(&self) -> Vec<Value> {
        Vec::new()
    }

    fn step(&self, state: &mut Vec<Value>, args: &[Value]) -> Result<()> {
        if !args[0].is_null() {
            state.push(args[0].clone());
        }
        Ok(())
    }

    fn finalize(&self, state: Vec<Value>) -> Result<Value> {
        Ok(Value::Integer(distinct_count(state) as i64))
    }

    fn num_args(&self) -> i32 {
        1
    }

    fn name(&self) -> &str {
        "countDistinct"
    }
}

// -- percentileDisc / percentileCont --

/// Buffered samples plus the percentile fraction, captured from the trailing
/// argument of the first step call and validated there.
#[derive(Debug, Default)]
pub struct PercentileState {
    fraction: Option<f64>,
    values: Vec<f64>,
}

fn percentile_step(name: &str, state: &mut PercentileState, args: &[Value]) -> Result<()> {
    let Some((fraction_arg, primaries)) = args.split_last() else {
        return Err(QuiverError::invalid_argument(
            name,
            "missing percentile argument",
        ));
    };
    if primaries.is_empty() {
        return Err(QuiverError::invalid_argument(
            name,
            "missing aggregated value",
        ));
    }

    // First row wins: the fraction is captured once and later rows' trailing
    // argument is ignored.
    if state.fraction.is_none() {
        let fraction = fraction_arg.to_f64().ok_or_else(|| {
            QuiverError::invalid_argument(
                name,
                format!(
                    "percentile must be a number, got {}",
                    fraction_arg.type_name()
                ),
            )
        })?;
        if !(0.0..=1.0).contains(&fraction) {
            return Err(QuiverError::invalid_argument(
                name,
                format!("percentile must be between 0.0 and 1.0, got {fraction}"),
            ));
        }
        state.fraction = Some(fraction);
    }

    for value in primaries {
        if let Some(n) = numeric_arg(name, value)? {
            state.values.push(n);
        }
    }
    Ok(())
}

/// `percentileDisc(x, p)`: discrete percentile. Returns an actual sample:
/// the value at rank `ceil(p * n)` (1-based) of the sorted buffer.
pub struct PercentileDiscFunc;

impl AggregateFunction for PercentileDiscFunc {
    type State = PercentileState;

    fn initial_state(&self) -> PercentileState {
        PercentileState::default()
    }

    fn step(&self, state: &mut PercentileState, args: &[Value]) -> Result<()> {
        percentile_step(self.name(), state, args)
    }

    fn finalize(&self, state: PercentileState) -> Result<Value> {
        let PercentileState {
            fraction,
            mut values,
        } = state;
        let (Some(fraction), false) = (fraction, values.is_empty()) else {
            return Ok(Value::Null);
        };
        values.sort_by(f64::total_cmp);
        let idx = if fraction > 0.0 {
            (fraction * values.len() as f64).ceil() as usize - 1
        } else {
            0
        };
        Ok(Value::Float(values[idx]))
    }

    fn num_args(&self) -> i32 {
        2
    }

    fn name(&self) -> &str {
        "percentileDisc"
    }
}

/// `percentileCont(x, p)`: continuous percentile with linear interpolation
/// between the two nearest samples.
pub struct PercentileContFunc;

impl AggregateFunction for PercentileContFunc {
    type State = PercentileState;

    fn initial_state(&self) -> PercentileState {
        PercentileState::default()
    }

    fn step(&self, state: &mut PercentileState, args: &[Value]) -> Result<()> {
        percentile_step(self.name(), state, args)
    }

    fn finalize(&self, state: PercentileState) -> Result<Value> {
        let PercentileState {
            fraction,
            mut values,
        } = state;
        let (Some(fraction), false) = (fraction, values.is_empty()) else {
            return Ok(Value::Null);
        };
        values.sort_by(f64::total_cmp);
        let n = values.len();
        if fraction == 1.0 || n == 1 {
            return Ok(Value::Float(values[n - 1]));
        }
        let pos = fraction * (n - 1) as f64;
        let lower = pos.floor() as usize;
        let weight = pos - lower as f64;
        let interpolated = values[lower] + weight * (values[lower + 1] - values[lower]);
        Ok(Value::Float(interpolated))
    }

    fn num_args(&self) -> i32 {
        2
    }

    fn name(&self) -> &str {
        "percentileCont"
    }
}

// -- stDev / stDevP --

#[derive(Debug, Default)]
pub struct StDevState {
    total: f64,
    values: Vec<f64>,
}

fn stdev_step(name: &str, state: &mut StDevState, args: &[Value]) -> Result<()> {
    if let Some(n) = numeric_arg(name, &args[0])? {
        state.total += n;
        state.values.push(n);
    }
    Ok(())
}

/// Two-pass standard deviation. With fewer than two samples the deviation is
/// defined as `0.0`. The sum of squared deviations is accumulated as
/// `(x - mean) * (x + mean)`, which telescopes to `Σx² - n·mean²`.
fn stdev_finalize(state: StDevState, sample: bool) -> Value {
    let n = state.values.len();
    if n < 2 {
        return Value::Float(0.0);
    }
    let mean = state.total / n as f64;
    let mut sum_of_squares = 0.0;
    for x in &state.values {
        sum_of_squares += (x - mean) * (x + mean);
    }
    let divisor = if sample { n - 1 } else { n } as f64;
    Value::Float((sum_of_squares / divisor).sqrt())
}

/// `stDev(x)`: sample standard deviation (divisor `n - 1`).
pub struct StDevFunc;

impl AggregateFunction for StDevFunc {
    type State = StDevState;

    fn initial_state(&self) -> StDevState {
        StDevState::default()
    }

    fn step(&self, state: &mut StDevState, args: &[Value]) -> Result<()> {
        stdev_step(self.name(), state, args)
    }

    fn finalize(&self, state: StDevState) -> Result<Value> {
        Ok(stdev_finalize(state, true))
    }

    fn num_args(&self) -> i32 {
        1
    }

    fn name(&self) -> &str {
        "stDev"
    }
}

/// `stDevP(x)`: population standard deviation (divisor `n`).
pub struct StDevPFunc;

impl AggregateFunction for StDevPFunc {
    type State = StDevState;

    fn initial_state(&self) -> StDevState {
        StDevState::default()
    }

    fn step(&self, state: &mut StDevState, args: &[Value]) -> Result<()> {
        stdev_step(self.name(), state, args)
    }

    fn finalize(&self, state: StDevState) -> Result<Value> {
        Ok(stdev_finalize(state, false))
    }

    fn num_args(&self) -> i32 {
        1
    }

    fn name(&self) -> &str {
        "stDevP"
    }
}

// -- collect / collectDistinct --

/// The list materializes on the first step call even when that row is null,
/// so an all-null group yields an empty array while a group that was never
/// stepped yields `Null`.
fn collect_step(state: &mut Option<Vec<Value>>, args: &[Value]) {
    let items = state.get_or_insert_with(Vec::new);
    if !args[0].is_null() {
        items.push(args[0].clone());
    }
}

/// `collect(x)`: non-null values in arrival order, as an array.
pub struct CollectFunc;

impl AggregateFunction for CollectFunc {
    type State = Option<Vec<Value>>;

    fn initial_state(&self) -> Option<Vec<Value>> {
        None
    }

    fn step(&self, state: &mut Option<Vec<Value>>, args: &[Value]) -> Result<()> {
        collect_step(state, args);
        Ok(())
    }

    fn finalize(&self, state: Option<Vec<Value>>) -> Result<Value> {
        Ok(state.map_or(Value::Null, Value::Array))
    }

    fn num_args(&self) -> i32 {
        1
    }

    fn name(&self) -> &str {
        "collect"
    }
}

/// `collectDistinct(x)`: like `collect`, deduplicated under the cross-type
/// total order. Output is in sorted order, not arrival order.
pub struct CollectDistinctFunc;

impl AggregateFunction for CollectDistinctFunc {
    type State = Option<Vec<Value>>;

    fn initial_state(&self) -> Option<Vec<Value>> {
        None
    }

    fn step(&self, state: &mut Option<Vec<Value>>, args: &[Value]) -> Result<()> {
        collect_step(state, args);
        Ok(())
    }

    fn finalize(&self, state: Option<Vec<Value>>) -> Result<Value> {
        Ok(state.map_or(Value::Null, |items| Value::Array(distinct_values(items))))
    }

    fn num_args(&self) -> i32 {
        1
    }

    fn name(&self) -> &str {
        "collectDistinct"
    }
}

/// Register every built-in aggregation into `registry`.
pub fn register_builtins(registry: &mut FunctionRegistry) {
    registry.register(SumFunc);
    registry.register(AvgFunc);
    registry.register(MaxFunc);
    registry.register(MinFunc);
    registry.register(CountFunc);
    registry.register(CountDistinctFunc);
    registry.register(PercentileDiscFunc);
    registry.register(PercentileContFunc);
    registry.register(StDevFunc);
    registry.register(StDevPFunc);
    registry.register(CollectFunc);
    registry.register(CollectDistinctFunc);
}
