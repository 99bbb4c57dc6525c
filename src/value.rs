//! The Value type, a loosely typed representation of any Rison document

use std::fmt;
use std::str::FromStr;

use indexmap::IndexMap;

use crate::error::Error;

mod de;
mod ser;

/// An insertion-ordered map of string keys to Rison values.
///
/// Entry order is exactly the order in which keys first appeared, whether in
/// source text or through `insert` calls; the encoder never re-sorts it.
pub type Map = IndexMap<String, Value>;

/// Any valid Rison value.
#[derive(Clone, Debug, Default, PartialEq)]
pub enum Value {
    /// The `!n` literal.
    #[default]
    Null,
    /// The `!t` and `!f` literals.
    Bool(bool),
    /// A number, either an exact integer or a decimal.
    Number(Number),
    /// A string, bare or quoted in the source.
    String(String),
    /// A `!(...)` list.
    Array(Vec<Value>),
    /// A `(...)` object.
    Object(Map),
}

impl Value {
    /// Returns `true` if this value is null.
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Returns the boolean if this is a `Bool`.
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// Returns a reference to the number if this is a `Number`.
    pub fn as_number(&self) -> Option<&Number> {
        match self {
            Value::Number(n) => Some(n),
            _ => None,
        }
    }

    /// Returns the value as an `i64` if this is an integer in range.
    pub fn as_i64(&self) -> Option<i64> {
        self.as_number().and_then(Number::as_i64)
    }

    /// Returns the value as a `u64` if this is a non-negative integer.
    pub fn as_u64(&self) -> Option<u64> {
        self.as_number().and_then(Number::as_u64)
    }

    /// Returns the value as an `f64` if this is any number.
    pub fn as_f64(&self) -> Option<f64> {
        self.as_number().and_then(Number::as_f64)
    }

    /// Returns a reference to the string if this is a `String`.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    /// Returns a reference to the elements if this is an `Array`.
    pub fn as_array(&self) -> Option<&Vec<Value>> {
        match self {
            Value::Array(array) => Some(array),
            _ => None,
        }
    }

    /// Returns a reference to the entries if this is an `Object`.
    pub fn as_object(&self) -> Option<&Map> {
        match self {
            Value::Object(object) => Some(object),
            _ => None,
        }
    }
}

impl fmt::Display for Value {
    /// Formats the value as canonical Rison text.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = crate::ser::to_string(self).map_err(|_| fmt::Error)?;
        f.write_str(&text)
    }
}

impl FromStr for Value {
    type Err = Error;

    fn from_str(s: &str) -> Result<Value, Error> {
        crate::de::from_str(s)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<Number> for Value {
    fn from(n: Number) -> Self {
        Value::Number(n)
    }
}

impl From<f64> for Value {
    /// A non-finite number has no Rison representation and becomes `Null`.
    fn from(f: f64) -> Self {
        Number::from_f64(f).map_or(Value::Null, Value::Number)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(s.to_owned())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::String(s)
    }
}

impl From<Map> for Value {
    fn from(map: Map) -> Self {
        Value::Object(map)
    }
}

impl<T: Into<Value>> From<Vec<T>> for Value {
    fn from(values: Vec<T>) -> Self {
        Value::Array(values.into_iter().map(Into::into).collect())
    }
}

/// A Rison number.
///
/// Integers and decimals are distinct kinds, so an integer round-trips
/// without growing a decimal point. The parser only ever produces the
/// decimal kind for values with a fractional part.
#[derive(Clone, Copy, PartialEq)]
pub struct Number {
    n: N,
}

#[derive(Clone, Copy, PartialEq)]
enum N {
    PosInt(u64),
    /// Always below zero.
    NegInt(i64),
    /// Always finite.
    Float(f64),
}

impl Number {
    /// Create a `Number` from an `f64`; returns `None` for NaN and
    /// infinities, which the grammar cannot represent.
    pub fn from_f64(f: f64) -> Option<Number> {
        if f.is_finite() {
            Some(Number { n: N::Float(f) })
        } else {
            None
        }
    }

    /// Returns `true` if this is an integer in `i64` range.
    pub fn is_i64(&self) -> bool {
        match self.n {
            N::PosInt(v) => v <= i64::MAX as u64,
            N::NegInt(_) => true,
            N::Float(_) => false,
        }
    }

    /// Returns `true` if this is a non-negative integer.
    pub fn is_u64(&self) -> bool {
        matches!(self.n, N::PosInt(_))
    }

    /// Returns `true` if this is a decimal.
    pub fn is_f64(&self) -> bool {
        matches!(self.n, N::Float(_))
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self.n {
            N::PosInt(v) => i64::try_from(v).ok(),
            N::NegInt(v) => Some(v),
            N::Float(_) => None,
        }
    }

    pub fn as_u64(&self) -> Option<u64> {
        match self.n {
            N::PosInt(v) => Some(v),
            N::NegInt(_) | N::Float(_) => None,
        }
    }

    /// The value as an `f64`, lossy for integers above 2^53.
    pub fn as_f64(&self) -> Option<f64> {
        match self.n {
            N::PosInt(v) => Some(v as f64),
            N::NegInt(v) => Some(v as f64),
            N::Float(v) => Some(v),
        }
    }
}

impl fmt::Display for Number {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.n {
            N::PosInt(v) => fmt::Display::fmt(&v, f),
            N::NegInt(v) => fmt::Display::fmt(&v, f),
            N::Float(v) => fmt::Display::fmt(&v, f),
        }
    }
}

impl fmt::Debug for Number {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Number({self})")
    }
}

macro_rules! impl_from_unsigned {
    ($($ty:ty),*) => {
        $(
            impl From<$ty> for Number {
                fn from(u: $ty) -> Self {
                    Number { n: N::PosInt(u as u64) }
                }
            }

            impl From<$ty> for Value {
                fn from(u: $ty) -> Self {
                    Value::Number(u.into())
                }
            }
        )*
    };
}

macro_rules! impl_from_signed {
    ($($ty:ty),*) => {
        $(
            impl From<$ty> for Number {
                fn from(i: $ty) -> Self {
                    if i < 0 {
                        Number { n: N::NegInt(i as i64) }
                    } else {
                        Number { n: N::PosInt(i as u64) }
                    }
                }
            }

            impl From<$ty> for Value {
                fn from(i: $ty) -> Self {
                    Value::Number(i.into())
                }
            }
        )*
    };
}

impl_from_unsigned!(u8, u16, u32, u64, usize);
impl_from_signed!(i8, i16, i32, i64, isize);

#[cfg(test)]
mod test {
    use super::{Map, Number, Value};

    #[test]
    fn accessors() {
        assert!(Value::Null.is_null());
        assert_eq!(Value::Bool(true).as_bool(), Some(true));
        assert_eq!(Value::from(7u64).as_u64(), Some(7));
        assert_eq!(Value::from(-7i64).as_i64(), Some(-7));
        assert_eq!(Value::from(-7i64).as_u64(), None);
        assert_eq!(Value::from(2.5).as_f64(), Some(2.5));
        assert_eq!(Value::from("hi").as_str(), Some("hi"));
        assert!(Value::Null.as_array().is_none());
    }

    #[test]
    fn integer_and_decimal_are_distinct() {
        assert_ne!(
            Value::from(3u64),
            Value::Number(Number::from_f64(3.0).unwrap())
        );
        assert!(Value::from(3u64).as_number().unwrap().is_u64());
        assert!(Value::from(3.0).as_number().unwrap().is_f64());
    }

    #[test]
    fn non_finite_from_f64_is_rejected() {
        assert!(Number::from_f64(f64::NAN).is_none());
        assert!(Number::from_f64(f64::NEG_INFINITY).is_none());
        assert_eq!(Value::from(f64::NAN), Value::Null);
    }

    #[test]
    fn display_is_canonical_text() {
        let mut map = Map::new();
        map.insert("a".into(), Value::from(1u64));
        map.insert("b".into(), Value::from(vec!["x", "y"]));
        let value = Value::Object(map);

        assert_eq!(value.to_string(), "(a:1,b:!(x,y))");
    }

    #[test]
    fn from_str_parses() {
        let value: Value = "!(1,2.5,!t)".parse().unwrap();

        assert_eq!(
            value,
            Value::Array(vec![
                Value::from(1u64),
                Value::from(2.5),
                Value::Bool(true),
            ])
        );
    }

    #[test]
    fn integral_decimal_parses_as_integer() {
        let value: Value = "3.0".parse().unwrap();

        assert_eq!(value, Value::from(3u64));
    }
}
