use std::cmp::Ordering;
use std::fmt;

/// A dynamically-typed scalar produced by the query pipeline.
///
/// One of six kinds: null, 64-bit integer, 64-bit float, boolean, UTF-8
/// string, or an ordered array of values. Integer and float share a single
/// numeric comparison class; every pair of values has a defined three-way
/// ordering (see [`Value::total_cmp`]).
#[derive(Clone, Debug, serde::Serialize, serde::Deserialize)]
pub enum Value {
    /// The null scalar.
    Null,
    /// A 64-bit signed integer.
    Integer(i64),
    /// A 64-bit IEEE 754 floating-point number.
    Float(f64),
    /// A boolean.
    Bool(bool),
    /// A UTF-8 string.
    String(String),
    /// An ordered, heterogeneous array of values.
    Array(Vec<Value>),
}

impl Value {
    /// Returns true if this is the null scalar.
    pub const fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// The kind name used in error messages: "null", "integer", "float",
    /// "boolean", "string", or "array".
    pub const fn type_name(&self) -> &'static str {
        match self {
            Self::Null => "null",
            Self::Integer(_) => "integer",
            Self::Float(_) => "float",
            Self::Bool(_) => "boolean",
            Self::String(_) => "string",
            Self::Array(_) => "array",
        }
    }

    /// Try to extract an integer value.
    pub const fn as_integer(&self) -> Option<i64> {
        match self {
            Self::Integer(i) => Some(*i),
            _ => None,
        }
    }

    /// Try to extract a float value.
    pub const fn as_float(&self) -> Option<f64> {
        match self {
            Self::Float(f) => Some(*f),
            _ => None,
        }
    }

    /// Try to extract a boolean value.
    pub const fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// Try to extract a string reference.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(s) => Some(s),
            _ => None,
        }
    }

    /// Try to extract an array reference.
    pub fn as_array(&self) -> Option<&[Value]> {
        match self {
            Self::Array(items) => Some(items),
            _ => None,
        }
    }

    /// Numeric coercion.
    ///
    /// Integers, floats, booleans (false → 0.0, true → 1.0), and strings
    /// holding a well-formed numeric literal coerce; null, non-numeric
    /// strings, and arrays return `None`. Callers that need the aggregation
    /// null-skip rule combine this with [`Value::is_null`] to tell "null, no
    /// contribution" apart from "not coercible".
    #[allow(clippy::cast_precision_loss)]
    pub fn to_f64(&self) -> Option<f64> {
        match self {
            Self::Integer(i) => Some(*i as f64),
            Self::Float(f) => Some(*f),
            Self::Bool(b) => Some(if *b { 1.0 } else { 0.0 }),
            Self::String(s) => parse_numeric_literal(s),
            Self::Null | Self::Array(_) => None,
        }
    }

    /// The comparison class a value sorts into when compared against a value
    /// of a different kind. Integers and floats share the numeric class.
    const fn sort_class(&self) -> u8 {
        match self {
            Self::Null => 0,
            Self::Integer(_) | Self::Float(_) => 1,
            Self::Bool(_) => 2,
            Self::String(_) => 3,
            Self::Array(_) => 4,
        }
    }

    /// Three-way total order across all value kinds.
    ///
    /// Values of different kinds order by sort class (null < numeric <
    /// boolean < string < array). Within the numeric class, integer/float
    /// pairs compare with full i64 precision; NaN orders below every other
    /// float and equal to itself, keeping the order total. Arrays compare
    /// element-wise, shorter prefix first.
    pub fn total_cmp(&self, other: &Self) -> Ordering {
        let class_a = self.sort_class();
        let class_b = other.sort_class();
        if class_a != class_b {
            return class_a.cmp(&class_b);
        }

        match (self, other) {
            (Self::Null, Self::Null) => Ordering::Equal,
            (Self::Integer(a), Self::Integer(b)) => a.cmp(b),
            (Self::Float(a), Self::Float(b)) => float_cmp(*a, *b),
            (Self::Integer(a), Self::Float(b)) => int_float_cmp(*a, *b),
            (Self::Float(a), Self::Integer(b)) => int_float_cmp(*b, *a).reverse(),
            (Self::Bool(a), Self::Bool(b)) => a.cmp(b),
            (Self::String(a), Self::String(b)) => a.cmp(b),
            (Self::Array(a), Self::Array(b)) => {
                for (x, y) in a.iter().zip(b.iter()) {
                    let ord = x.total_cmp(y);
                    if ord != Ordering::Equal {
                        return ord;
                    }
                }
                a.len().cmp(&b.len())
            }
            // Same sort class always hits one of the arms above.
            _ => Ordering::Equal,
        }
    }
}

/// Compare two floats as a total order: NaN sorts below every other float
/// and equal to itself.
fn float_cmp(a: f64, b: f64) -> Ordering {
    if a.is_nan() {
        if b.is_nan() {
            Ordering::Equal
        } else {
            Ordering::Less
        }
    } else if b.is_nan() {
        Ordering::Greater
    } else {
        a.partial_cmp(&b).unwrap_or(Ordering::Equal)
    }
}

/// Compare an integer with a float, preserving precision for large i64
/// values. The naive `(i as f64).partial_cmp(&r)` loses precision for
/// |i| > 2^53.
#[allow(clippy::cast_precision_loss, clippy::cast_possible_truncation)]
fn int_float_cmp(i: i64, r: f64) -> Ordering {
    if r.is_nan() {
        // NaN sorts below every numeric value.
        return Ordering::Greater;
    }
    // If r is out of i64 range, the answer is obvious.
    if r < -9_223_372_036_854_775_808.0 {
        return Ordering::Greater;
    }
    if r >= 9_223_372_036_854_775_808.0 {
        return Ordering::Less;
    }
    // Truncate float to integer and compare integer parts.
    let y = r as i64;
    match i.cmp(&y) {
        Ordering::Less => Ordering::Less,
        Ordering::Greater => Ordering::Greater,
        // Integer parts equal — use float comparison as tiebreaker.
        Ordering::Equal => {
            let s = i as f64;
            s.partial_cmp(&r).unwrap_or(Ordering::Equal)
        }
    }
}

/// Parse a numeric string literal: trimmed, integer or float syntax.
///
/// Written-out "inf"/"nan" spellings are rejected; they are not numeric
/// literals in the query language.
fn parse_numeric_literal(s: &str) -> Option<f64> {
    let trimmed = s.trim();
    if trimmed.is_empty() {
        return None;
    }
    let f = trimmed.parse::<f64>().ok()?;
    if !f.is_finite() || f.is_nan() {
        let lower = trimmed.to_ascii_lowercase();
        if lower.contains("inf") || lower.contains("nan") {
            return None;
        }
    }
    Some(f)
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        self.total_cmp(other) == Ordering::Equal
    }
}

impl Eq for Value {}

impl PartialOrd for Value {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.total_cmp(other))
    }
}

impl Ord for Value {
    fn cmp(&self, other: &Self) -> Ordering {
        self.total_cmp(other)
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Null => f.write_str("null"),
            Self::Integer(i) => write!(f, "{i}"),
            Self::Float(v) => f.write_str(&format_float(*v)),
            Self::Bool(b) => write!(f, "{b}"),
            Self::String(s) => write!(f, "'{s}'"),
            Self::Array(items) => {
                f.write_str("[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{item}")?;
                }
                f.write_str("]")
            }
        }
    }
}

/// Render a float with an explicit decimal point so float output is
/// distinguishable from integer output (`2.0`, not `2`).
fn format_float(f: f64) -> String {
    if f.is_nan() {
        return "NaN".to_owned();
    }
    if f.is_infinite() {
        return if f.is_sign_positive() {
            "Inf".to_owned()
        } else {
            "-Inf".to_owned()
        };
    }
    if f == f.trunc() && f.abs() < 1e15 {
        format!("{f:.1}")
    } else {
        format!("{f}")
    }
}

impl From<i64> for Value {
    fn from(i: i64) -> Self {
        Self::Integer(i)
    }
}

impl From<i32> for Value {
    fn from(i: i32) -> Self {
        Self::Integer(i64::from(i))
    }
}

impl From<f64> for Value {
    fn from(f: f64) -> Self {
        Self::Float(f)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Self::Bool(b)
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Self::String(s)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Self::String(s.to_owned())
    }
}

impl From<Vec<Value>> for Value {
    fn from(items: Vec<Value>) -> Self {
        Self::Array(items)
    }
}

impl<T: Into<Self>> From<Option<T>> for Value {
    fn from(opt: Option<T>) -> Self {
        match opt {
            Some(v) => v.into(),
            None => Self::Null,
        }
    }
}

#[cfg(test)]
#[allow(clippy::float_cmp)]
mod tests {
    use super::*;

    #[test]
    fn null_properties() {
        let v = Value::Null;
        assert!(v.is_null());
        assert_eq!(v.to_f64(), None);
        assert_eq!(v.type_name(), "null");
        assert_eq!(v.to_string(), "null");
    }

    #[test]
    fn integer_properties() {
        let v = Value::Integer(42);
        assert!(!v.is_null());
        assert_eq!(v.as_integer(), Some(42));
        assert_eq!(v.to_f64(), Some(42.0));
        assert_eq!(v.to_string(), "42");
    }

    #[test]
    fn float_properties() {
        let v = Value::Float(2.5);
        assert_eq!(v.as_float(), Some(2.5));
        assert_eq!(v.to_f64(), Some(2.5));
        assert_eq!(v.to_string(), "2.5");
    }

    #[test]
    fn bool_coercion() {
        assert_eq!(Value::Bool(true).to_f64(), Some(1.0));
        assert_eq!(Value::Bool(false).to_f64(), Some(0.0));
    }

    #[test]
    fn numeric_string_coercion() {
        assert_eq!(Value::from("123").to_f64(), Some(123.0));
        assert_eq!(Value::from(" 2.5 ").to_f64(), Some(2.5));
        assert_eq!(Value::from("-1e3").to_f64(), Some(-1000.0));
        assert_eq!(Value::from("hello").to_f64(), None);
        assert_eq!(Value::from("").to_f64(), None);
        assert_eq!(Value::from("inf").to_f64(), None);
        assert_eq!(Value::from("NaN").to_f64(), None);
    }

    #[test]
    fn array_is_not_coercible() {
        let v = Value::Array(vec![Value::Integer(1)]);
        assert_eq!(v.to_f64(), None);
        assert_eq!(v.type_name(), "array");
    }

    #[test]
    fn sort_class_order() {
        let null = Value::Null;
        let int = Value::Integer(0);
        let flo = Value::Float(0.5);
        let boolean = Value::Bool(false);
        let string = Value::String(String::new());
        let array = Value::Array(vec![]);

        assert!(null < int);
        assert!(int < boolean);
        assert!(flo < boolean);
        assert!(boolean < string);
        assert!(string < array);
    }

    #[test]
    fn mixed_numeric_comparison() {
        assert_eq!(
            Value::Integer(3).total_cmp(&Value::Float(3.0)),
            Ordering::Equal
        );
        assert!(Value::Integer(1) < Value::Float(1.5));
        assert!(Value::Float(1.5) < Value::Integer(2));
    }

    #[test]
    fn int_float_precision_at_i64_boundary() {
        // i64::MAX cast to f64 rounds up to 9223372036854775808.0; the naive
        // cast-and-compare would report Equal here.
        let imax = Value::Integer(i64::MAX);
        let fmax = Value::Float(9_223_372_036_854_775_808.0);
        assert_eq!(imax.total_cmp(&fmax), Ordering::Less);
        assert_eq!(fmax.total_cmp(&imax), Ordering::Greater);
    }

    #[test]
    fn nan_ordering_is_total() {
        let nan = Value::Float(f64::NAN);
        let zero = Value::Float(0.0);
        let int = Value::Integer(-5);

        assert_eq!(nan.total_cmp(&nan), Ordering::Equal);
        assert_eq!(nan.total_cmp(&zero), Ordering::Less);
        assert_eq!(zero.total_cmp(&nan), Ordering::Greater);
        assert_eq!(nan.total_cmp(&int), Ordering::Less);
        assert_eq!(int.total_cmp(&nan), Ordering::Greater);
    }

    #[test]
    fn array_comparison() {
        let a = Value::Array(vec![Value::Integer(1), Value::Integer(2)]);
        let b = Value::Array(vec![Value::Integer(1), Value::Integer(3)]);
        let prefix = Value::Array(vec![Value::Integer(1)]);

        assert!(a < b);
        assert!(prefix < a);
        assert_eq!(a.total_cmp(&a.clone()), Ordering::Equal);
    }

    #[test]
    fn string_comparison() {
        assert!(Value::from("apple") < Value::from("banana"));
        assert_eq!(
            Value::from("same").total_cmp(&Value::from("same")),
            Ordering::Equal
        );
    }

    #[test]
    fn equality_follows_comparator() {
        assert_eq!(Value::Integer(1), Value::Float(1.0));
        assert_ne!(Value::Integer(1), Value::from("1"));
        assert_eq!(Value::Null, Value::Null);
    }

    #[test]
    fn display_formatting() {
        assert_eq!(Value::Null.to_string(), "null");
        assert_eq!(Value::Integer(-7).to_string(), "-7");
        assert_eq!(Value::Float(2.0).to_string(), "2.0");
        assert_eq!(Value::Float(0.25).to_string(), "0.25");
        assert_eq!(Value::Bool(true).to_string(), "true");
        assert_eq!(Value::from("hi").to_string(), "'hi'");
        assert_eq!(
            Value::Array(vec![Value::Integer(1), Value::from("a")]).to_string(),
            "[1, 'a']"
        );
    }

    #[test]
    fn from_conversions() {
        assert_eq!(Value::from(42i64).as_integer(), Some(42));
        assert_eq!(Value::from(42i32).as_integer(), Some(42));
        assert_eq!(Value::from(1.5f64).as_float(), Some(1.5));
        assert_eq!(Value::from(true).as_bool(), Some(true));
        assert_eq!(Value::from("hello").as_str(), Some("hello"));
        assert_eq!(Value::from(String::from("world")).as_str(), Some("world"));
        assert!(Value::from(None::<i64>).is_null());
        assert_eq!(Value::from(Some(42i64)).as_integer(), Some(42));

        let arr = Value::from(vec![Value::Integer(1)]);
        assert_eq!(arr.as_array().map(<[Value]>::len), Some(1));
    }

    #[test]
    fn sorting_with_comparator_is_stable_under_clone() {
        let mut values = vec![
            Value::from("b"),
            Value::Integer(2),
            Value::Null,
            Value::Float(1.5),
            Value::Bool(false),
            Value::from("a"),
        ];
        values.sort_by(|a, b| a.total_cmp(b));
        let kinds: Vec<&str> = values.iter().map(Value::type_name).collect();
        assert_eq!(
            kinds,
            vec!["null", "float", "integer", "boolean", "string", "string"]
        );
    }
}
