//! Sort-based deduplication shared by `countDistinct` and `collectDistinct`.
//!
//! Sorts a buffered collection with the cross-type total order (never a
//! numeric sort), then scans adjacent pairs keeping the first element of
//! every run of equals. Equality is equality under [`Value::total_cmp`], so
//! `1` and `1.0` collapse into one element.

use std::cmp::Ordering;

use quiver_types::Value;

/// Collapse duplicates, consuming the input.
///
/// The result preserves first-occurrence-after-sort order. Inputs of length
/// 0 or 1 are returned untouched without sorting or scanning.
pub fn distinct_values(mut values: Vec<Value>) -> Vec<Value> {
    if values.len() <= 1 {
        return values;
    }
    values.sort_by(|a, b| a.total_cmp(b));

    // Explicit partition: the first element of each equal run is kept, every
    // other element is discarded here and now.
    let mut kept: Vec<Value> = Vec::with_capacity(values.len());
    for value in values {
        match kept.last() {
            Some(last) if last.total_cmp(&value) == Ordering::Equal => drop(value),
            _ => kept.push(value),
        }
    }
    kept
}

/// Counting mode: the cardinality of the deduplicated input.
pub fn distinct_count(values: Vec<Value>) -> usize {
    distinct_values(values).len()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_and_singleton_pass_through() {
        assert!(distinct_values(vec![]).is_empty());
        assert_eq!(distinct_count(vec![]), 0);

        let one = distinct_values(vec![Value::Integer(9)]);
        assert_eq!(one, vec![Value::Integer(9)]);
        assert_eq!(distinct_count(vec![Value::Integer(9)]), 1);
    }

    #[test]
    fn test_duplicates_collapse() {
        let input = vec![
            Value::Integer(2),
            Value::Integer(2),
            Value::Integer(3),
            Value::Integer(3),
            Value::Integer(1),
        ];
        let out = distinct_values(input.clone());
        assert_eq!(
            out,
            vec![Value::Integer(1), Value::Integer(2), Value::Integer(3)]
        );
        assert_eq!(distinct_count(input), 3);
    }

    #[test]
    fn test_integer_and_float_equal_under_comparator() {
        let input = vec![Value::Integer(1), Value::Float(1.0), Value::Integer(1)];
        assert_eq!(distinct_count(input), 1);
    }

    #[test]
    fn test_mixed_types_keep_one_per_kind() {
        let input = vec![
            Value::from("a"),
            Value::Integer(1),
            Value::from("a"),
            Value::Bool(true),
            Value::Integer(1),
            Value::Bool(true),
        ];
        let out = distinct_values(input);
        // Total order: numeric < boolean < string.
        assert_eq!(
            out,
            vec![Value::Integer(1), Value::Bool(true), Value::from("a")]
        );
    }

    #[test]
    fn test_all_equal_keeps_first() {
        let input = vec![Value::from("x"); 5];
        let out = distinct_values(input);
        assert_eq!(out, vec![Value::from("x")]);
    }

    #[test]
    fn test_arrays_deduplicate_structurally() {
        let a = Value::Array(vec![Value::Integer(1), Value::Integer(2)]);
        let b = Value::Array(vec![Value::Integer(1), Value::Integer(2)]);
        let c = Value::Array(vec![Value::Integer(1)]);
        let out = distinct_values(vec![a.clone(), b, c.clone()]);
        assert_eq!(out, vec![c, a]);
    }
}
