//! Deserialize Rison text to Rust data structures

mod read;

use std::collections::HashSet;

use serde::de::value::{BorrowedStrDeserializer, StrDeserializer};

use crate::error::{Code, Error, Result};

pub use read::{IoRead, Read, Reference, SliceRead, StrRead};
pub(crate) use read::{is_id_char, is_id_start};

const DEFAULT_MAX_DEPTH: usize = 128;

/// How the deserializer treats a key that occurs twice within one object.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum DuplicateKeys {
    /// A repeated key is a [`DuplicateKey`](crate::error::Code::DuplicateKey)
    /// error.
    #[default]
    Forbid,
    /// Both entries are handed to the target; for map-like targets the last
    /// value wins.
    LastWins,
}

/// Configuration for a [`Deserializer`].
#[derive(Clone, Copy, Debug)]
pub struct Config {
    /// Object/array nesting accepted before the decode aborts with
    /// [`DepthLimitExceeded`](crate::error::Code::DepthLimitExceeded).
    pub max_depth: usize,
    /// Policy for a key occurring twice within one object.
    pub duplicate_keys: DuplicateKeys,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            max_depth: DEFAULT_MAX_DEPTH,
            duplicate_keys: DuplicateKeys::Forbid,
        }
    }
}

/// A deserializer for Rison into Rust values
pub struct Deserializer<R> {
    read: R,
    scratch: Vec<u8>,
    config: Config,
    depth: usize,
}

impl<R: std::io::Read> Deserializer<IoRead<R>> {
    /// Create a Rison deserializer from an `io::Read`
    pub fn from_reader(reader: R) -> Self {
        Self::new(IoRead::new(reader))
    }
}

impl<'a> Deserializer<SliceRead<'a>> {
    /// Create a Rison deserializer from a `&[u8]`
    pub fn from_slice(slice: &'a [u8]) -> Self {
        Self::new(SliceRead::new(slice))
    }
}

impl<'a> Deserializer<StrRead<'a>> {
    /// Create a Rison deserializer from a `&str`
    pub fn from_str(s: &'a str) -> Self {
        Self::new(StrRead::new(s))
    }
}

/// A parsed object key, replayed to the key seed once the duplicate-key
/// policy has seen it.
enum ObjectKey<'de> {
    Borrowed(&'de str),
    Owned(String),
}

impl<'de> ObjectKey<'de> {
    fn as_str(&self) -> &str {
        match self {
            ObjectKey::Borrowed(s) => s,
            ObjectKey::Owned(s) => s,
        }
    }
}

impl<'de, R: Read<'de>> Deserializer<R> {
    fn new(read: R) -> Self {
        Self::with_config(read, Config::default())
    }

    /// Create a Rison deserializer with an explicit [`Config`].
    pub fn with_config(read: R, config: Config) -> Self {
        Self {
            read,
            scratch: Vec::new(),
            config,
            depth: 0,
        }
    }

    fn peek(&mut self) -> Result<Option<u8>> {
        self.read.peek()
    }

    fn eat_char(&mut self) {
        self.read.discard();
    }

    /// Skip insignificant whitespace and return the first byte after it.
    fn parse_whitespace(&mut self) -> Result<Option<u8>> {
        loop {
            match self.peek()? {
                Some(b' ' | b'\t' | b'\n' | b'\r') => self.eat_char(),
                other => return Ok(other),
            }
        }
    }

    /// Check that nothing but trailing whitespace remains.
    pub fn end(&mut self) -> Result<()> {
        match self.parse_whitespace()? {
            Some(_) => Err(Error::new(Code::TrailingChars, self.read.position())),
            None => Ok(()),
        }
    }

    fn begin_nested(&mut self) -> Result<()> {
        self.depth += 1;
        if self.depth > self.config.max_depth {
            return Err(Error::new(
                Code::DepthLimitExceeded(self.config.max_depth),
                self.read.position(),
            ));
        }
        Ok(())
    }

    fn end_nested(&mut self) {
        self.depth -= 1;
    }

    fn end_seq(&mut self) -> Result<()> {
        match self.parse_whitespace()? {
            Some(b')') => {
                self.eat_char();
                Ok(())
            }
            Some(_) => Err(Error::new(
                Code::ExpectedListSepOrEnd,
                self.read.position(),
            )),
            None => Err(Error::new(Code::EofList, self.read.position())),
        }
    }

    fn end_map(&mut self) -> Result<()> {
        match self.parse_whitespace()? {
            Some(b')') => {
                self.eat_char();
                Ok(())
            }
            Some(_) => Err(Error::new(
                Code::ExpectedObjectSepOrEnd,
                self.read.position(),
            )),
            None => Err(Error::new(Code::EofObject, self.read.position())),
        }
    }

    /// Parse an object key: a bare identifier or a quoted string.
    fn parse_object_key(&mut self) -> Result<ObjectKey<'de>> {
        match self.parse_whitespace()? {
            Some(b'\'') => {
                self.eat_char();
                self.scratch.clear();
                match self.read.parse_str(&mut self.scratch)? {
                    Reference::Borrowed(s) => Ok(ObjectKey::Borrowed(s)),
                    Reference::Copied(s) => Ok(ObjectKey::Owned(s.to_owned())),
                }
            }
            Some(b) if is_id_char(b) => {
                self.scratch.clear();
                match self.read.parse_ident(&mut self.scratch)? {
                    Reference::Borrowed(s) => Ok(ObjectKey::Borrowed(s)),
                    Reference::Copied(s) => Ok(ObjectKey::Owned(s.to_owned())),
                }
            }
            Some(_) => Err(Error::new(Code::ExpectedKey, self.read.position())),
            None => Err(Error::new(Code::EofObject, self.read.position())),
        }
    }

    /// Parse a bare token that starts with a digit or `-`. The whole token
    /// must match `-? digits ('.' digits)?`; the grammar has no exponent
    /// form. A decimal with an integral value folds to the integer visit so
    /// `3.0` and `3` decode identically.
    fn parse_number<V>(&mut self, visitor: V) -> Result<V::Value>
    where
        V: serde::de::Visitor<'de>,
    {
        let start = self.read.position();
        self.scratch.clear();
        let token = match self.read.parse_ident(&mut self.scratch)? {
            Reference::Borrowed(t) => t,
            Reference::Copied(t) => t,
        };

        let bytes = token.as_bytes();
        let mut i = usize::from(bytes[0] == b'-');
        let int_start = i;
        while i < bytes.len() && bytes[i].is_ascii_digit() {
            i += 1;
        }
        if i == int_start {
            return Err(Error::new(Code::InvalidNumber, start));
        }
        let mut is_float = false;
        if i < bytes.len() && bytes[i] == b'.' {
            is_float = true;
            i += 1;
            let frac_start = i;
            while i < bytes.len() && bytes[i].is_ascii_digit() {
                i += 1;
            }
            if i == frac_start {
                return Err(Error::new(Code::InvalidNumber, start));
            }
        }
        if i != bytes.len() {
            return Err(Error::new(Code::InvalidNumber, start));
        }

        if !is_float {
            if bytes[0] == b'-' {
                if let Ok(n) = token.parse::<i64>() {
                    return visitor.visit_i64(n);
                }
            } else if let Ok(n) = token.parse::<u64>() {
                return visitor.visit_u64(n);
            }
        }

        // Decimal literals, and integer literals too large for 64 bits.
        let v: f64 = token
            .parse()
            .map_err(|_| Error::new(Code::InvalidNumber, start))?;
        if !v.is_finite() {
            return Err(Error::new(Code::NumberOutOfRange, start));
        }
        visit_f64_folded(v, visitor)
    }
}

/// Largest magnitude at which every integral `f64` is exact.
const FLOAT_INT_MAX: f64 = 9_007_199_254_740_992.0; // 2^53

fn visit_f64_folded<'de, V>(v: f64, visitor: V) -> Result<V::Value>
where
    V: serde::de::Visitor<'de>,
{
    if v.fract() == 0.0 && v.abs() <= FLOAT_INT_MAX {
        if v < 0.0 {
            visitor.visit_i64(v as i64)
        } else {
            visitor.visit_u64(v as u64)
        }
    } else {
        visitor.visit_f64(v)
    }
}

impl<'de, 'a, R: Read<'de>> serde::de::Deserializer<'de> for &'a mut Deserializer<R> {
    type Error = Error;

    fn deserialize_any<V>(self, visitor: V) -> Result<V::Value>
    where
        V: serde::de::Visitor<'de>,
    {
        match self.parse_whitespace()? {
            Some(b'!') => {
                self.eat_char();
                let peek = self
                    .peek()?
                    .ok_or_else(|| Error::new(Code::EofMarker, self.read.position()))?;
                match peek {
                    b'n' => {
                        self.eat_char();
                        visitor.visit_unit()
                    }
                    b't' => {
                        self.eat_char();
                        visitor.visit_bool(true)
                    }
                    b'f' => {
                        self.eat_char();
                        visitor.visit_bool(false)
                    }
                    b'(' => {
                        self.begin_nested()?;
                        self.eat_char();
                        let ret = visitor.visit_seq(SeqAccess::new(self))?;
                        self.end_seq()?;
                        self.end_nested();
                        Ok(ret)
                    }
                    _ => Err(Error::new(Code::InvalidMarker, self.read.position())),
                }
            }
            Some(b'-' | b'0'..=b'9') => self.parse_number(visitor),
            Some(b'\'') => {
                self.eat_char();
                self.scratch.clear();
                match self.read.parse_str(&mut self.scratch)? {
                    Reference::Borrowed(s) => visitor.visit_borrowed_str(s),
                    Reference::Copied(s) => visitor.visit_str(s),
                }
            }
            Some(b'(') => {
                self.begin_nested()?;
                self.eat_char();
                let ret = visitor.visit_map(MapAccess::new(self))?;
                self.end_map()?;
                self.end_nested();
                Ok(ret)
            }
            Some(b) if is_id_char(b) => {
                self.scratch.clear();
                match self.read.parse_ident(&mut self.scratch)? {
                    Reference::Borrowed(s) => visitor.visit_borrowed_str(s),
                    Reference::Copied(s) => visitor.visit_str(s),
                }
            }
            Some(b) => Err(Error::new(
                Code::UnexpectedCharacter(b as char),
                self.read.position(),
            )),
            None => Err(Error::new(Code::EofValue, self.read.position())),
        }
    }

    fn deserialize_option<V>(self, visitor: V) -> Result<V::Value>
    where
        V: serde::de::Visitor<'de>,
    {
        if self.parse_whitespace()? == Some(b'!') && self.read.peek2()? == Some(b'n') {
            self.eat_char();
            self.eat_char();
            visitor.visit_none()
        } else {
            visitor.visit_some(self)
        }
    }

    fn deserialize_newtype_struct<V>(self, _name: &'static str, visitor: V) -> Result<V::Value>
    where
        V: serde::de::Visitor<'de>,
    {
        visitor.visit_newtype_struct(self)
    }

    /// A unit variant is a plain string; a variant with a payload is a
    /// single-entry object `(variant:payload)`.
    fn deserialize_enum<V>(
        self,
        _name: &'static str,
        _variants: &'static [&'static str],
        visitor: V,
    ) -> Result<V::Value>
    where
        V: serde::de::Visitor<'de>,
    {
        match self.parse_whitespace()? {
            Some(b'(') => {
                self.begin_nested()?;
                self.eat_char();
                let value = visitor.visit_enum(VariantAccess::new(self))?;
                self.end_map()?;
                self.end_nested();
                Ok(value)
            }
            Some(_) => visitor.visit_enum(UnitVariantAccess::new(self)),
            None => Err(Error::new(Code::EofValue, self.read.position())),
        }
    }

    serde::forward_to_deserialize_any! {
        bool i8 i16 i32 i64 i128 u8 u16 u32 u64 u128 f32 f64 char str string
        bytes byte_buf unit unit_struct seq tuple
        tuple_struct map struct identifier ignored_any
    }
}

struct MapAccess<'d, R: 'd> {
    de: &'d mut Deserializer<R>,
    first: bool,
    seen: HashSet<String>,
}

impl<'a, R: 'a> MapAccess<'a, R> {
    fn new(de: &'a mut Deserializer<R>) -> Self {
        MapAccess {
            de,
            first: true,
            seen: HashSet::new(),
        }
    }
}

impl<'de, 'a, R: Read<'de> + 'a> serde::de::MapAccess<'de> for MapAccess<'a, R> {
    type Error = Error;

    fn next_key_seed<K>(&mut self, seed: K) -> Result<Option<K::Value>>
    where
        K: serde::de::DeserializeSeed<'de>,
    {
        match self.de.parse_whitespace()? {
            Some(b')') => return Ok(None),
            Some(b',') if !self.first => {
                self.de.eat_char();
                if self.de.parse_whitespace()? == Some(b')') {
                    return Err(Error::new(Code::TrailingSep, self.de.read.position()));
                }
            }
            Some(_) => {
                if self.first {
                    self.first = false;
                } else {
                    return Err(Error::new(
                        Code::ExpectedObjectSepOrEnd,
                        self.de.read.position(),
                    ));
                }
            }
            None => {
                return Err(Error::new(Code::EofObject, self.de.read.position()));
            }
        };

        let offset = self.de.read.position();
        let key = self.de.parse_object_key()?;
        if self.de.config.duplicate_keys == DuplicateKeys::Forbid
            && !self.seen.insert(key.as_str().to_owned())
        {
            return Err(Error::new(
                Code::DuplicateKey(key.as_str().to_owned()),
                offset,
            ));
        }
        match key {
            ObjectKey::Borrowed(s) => seed.deserialize(BorrowedStrDeserializer::new(s)).map(Some),
            ObjectKey::Owned(s) => seed.deserialize(StrDeserializer::new(&s)).map(Some),
        }
    }

    fn next_value_seed<V>(&mut self, seed: V) -> Result<V::Value>
    where
        V: serde::de::DeserializeSeed<'de>,
    {
        match self.de.parse_whitespace()? {
            Some(b':') => {
                self.de.eat_char();
            }
            Some(_) => {
                return Err(Error::new(Code::ExpectedColon, self.de.read.position()));
            }
            None => {
                return Err(Error::new(Code::EofObject, self.de.read.position()));
            }
        }
        seed.deserialize(&mut *self.de)
    }
}

struct SeqAccess<'d, R: 'd> {
    de: &'d mut Deserializer<R>,
    first: bool,
}

impl<'a, R: 'a> SeqAccess<'a, R> {
    fn new(de: &'a mut Deserializer<R>) -> Self {
        SeqAccess { de, first: true }
    }
}

impl<'de, 'a, R: Read<'de> + 'a> serde::de::SeqAccess<'de> for SeqAccess<'a, R> {
    type Error = Error;

    fn next_element_seed<T>(&mut self, seed: T) -> Result<Option<T::Value>>
    where
        T: serde::de::DeserializeSeed<'de>,
    {
        match self.de.parse_whitespace()? {
            Some(b')') => return Ok(None),
            Some(b',') if !self.first => {
                self.de.eat_char();
                if self.de.parse_whitespace()? == Some(b')') {
                    return Err(Error::new(Code::TrailingSep, self.de.read.position()));
                }
            }
            Some(_) => {
                if self.first {
                    self.first = false;
                } else {
                    return Err(Error::new(
                        Code::ExpectedListSepOrEnd,
                        self.de.read.position(),
                    ));
                }
            }
            None => {
                return Err(Error::new(Code::EofList, self.de.read.position()));
            }
        };

        seed.deserialize(&mut *self.de).map(Some)
    }
}

struct VariantAccess<'d, R: 'd> {
    de: &'d mut Deserializer<R>,
}

impl<'a, R: 'a> VariantAccess<'a, R> {
    fn new(de: &'a mut Deserializer<R>) -> Self {
        VariantAccess { de }
    }
}

impl<'de, 'a, R: Read<'de> + 'a> serde::de::EnumAccess<'de> for VariantAccess<'a, R> {
    type Error = Error;
    type Variant = Self;

    fn variant_seed<V>(self, seed: V) -> Result<(V::Value, Self)>
    where
        V: serde::de::DeserializeSeed<'de>,
    {
        let key = self.de.parse_object_key()?;
        let variant = match key {
            ObjectKey::Borrowed(s) => seed.deserialize(BorrowedStrDeserializer::new(s))?,
            ObjectKey::Owned(s) => seed.deserialize(StrDeserializer::new(&s))?,
        };
        match self.de.parse_whitespace()? {
            Some(b':') => {
                self.de.eat_char();
                Ok((variant, self))
            }
            Some(_) => Err(Error::new(Code::ExpectedColon, self.de.read.position())),
            None => Err(Error::new(Code::EofObject, self.de.read.position())),
        }
    }
}

impl<'de, 'a, R: Read<'de> + 'a> serde::de::VariantAccess<'de> for VariantAccess<'a, R> {
    type Error = Error;

    fn unit_variant(self) -> Result<()> {
        serde::de::Deserialize::deserialize(self.de)
    }

    fn newtype_variant_seed<T>(self, seed: T) -> Result<T::Value>
    where
        T: serde::de::DeserializeSeed<'de>,
    {
        seed.deserialize(self.de)
    }

    fn tuple_variant<V>(self, _len: usize, visitor: V) -> Result<V::Value>
    where
        V: serde::de::Visitor<'de>,
    {
        serde::de::Deserializer::deserialize_seq(self.de, visitor)
    }

    fn struct_variant<V>(self, _fields: &'static [&'static str], visitor: V) -> Result<V::Value>
    where
        V: serde::de::Visitor<'de>,
    {
        serde::de::Deserializer::deserialize_map(self.de, visitor)
    }
}

struct UnitVariantAccess<'d, R: 'd> {
    de: &'d mut Deserializer<R>,
}

impl<'a, R: 'a> UnitVariantAccess<'a, R> {
    fn new(de: &'a mut Deserializer<R>) -> Self {
        UnitVariantAccess { de }
    }
}

impl<'de, 'a, R: Read<'de> + 'a> serde::de::EnumAccess<'de> for UnitVariantAccess<'a, R> {
    type Error = Error;
    type Variant = Self;

    fn variant_seed<V>(self, seed: V) -> Result<(V::Value, Self)>
    where
        V: serde::de::DeserializeSeed<'de>,
    {
        let variant = seed.deserialize(&mut *self.de)?;
        Ok((variant, self))
    }
}

impl<'de, 'a, R: Read<'de> + 'a> serde::de::VariantAccess<'de> for UnitVariantAccess<'a, R> {
    type Error = Error;

    fn unit_variant(self) -> Result<()> {
        Ok(())
    }

    fn newtype_variant_seed<T>(self, _seed: T) -> Result<T::Value>
    where
        T: serde::de::DeserializeSeed<'de>,
    {
        Err(serde::de::Error::invalid_type(
            serde::de::Unexpected::UnitVariant,
            &"newtype variant",
        ))
    }

    fn tuple_variant<V>(self, _len: usize, _visitor: V) -> Result<V::Value>
    where
        V: serde::de::Visitor<'de>,
    {
        Err(serde::de::Error::invalid_type(
            serde::de::Unexpected::UnitVariant,
            &"tuple variant",
        ))
    }

    fn struct_variant<V>(self, _fields: &'static [&'static str], _visitor: V) -> Result<V::Value>
    where
        V: serde::de::Visitor<'de>,
    {
        Err(serde::de::Error::invalid_type(
            serde::de::Unexpected::UnitVariant,
            &"struct variant",
        ))
    }
}

fn from_trait<'de, R, T>(read: R, config: Config) -> Result<T>
where
    R: Read<'de>,
    T: serde::de::Deserialize<'de>,
{
    let mut de = Deserializer::with_config(read, config);
    let value = serde::de::Deserialize::deserialize(&mut de)?;

    de.end()?;

    Ok(value)
}

/// Deserialize an instance of `T` from a byte slice of Rison
pub fn from_slice<'a, T>(v: &'a [u8]) -> Result<T>
where
    T: serde::de::Deserialize<'a>,
{
    from_trait(SliceRead::new(v), Config::default())
}

/// Deserialize an instance of `T` from a byte slice of Rison with an
/// explicit [`Config`]
pub fn from_slice_with<'a, T>(v: &'a [u8], config: Config) -> Result<T>
where
    T: serde::de::Deserialize<'a>,
{
    from_trait(SliceRead::new(v), config)
}

/// Deserialize an instance of `T` from a string of Rison
pub fn from_str<'a, T>(v: &'a str) -> Result<T>
where
    T: serde::de::Deserialize<'a>,
{
    from_trait(StrRead::new(v), Config::default())
}

/// Deserialize an instance of `T` from a string of Rison with an explicit
/// [`Config`]
pub fn from_str_with<'a, T>(v: &'a str, config: Config) -> Result<T>
where
    T: serde::de::Deserialize<'a>,
{
    from_trait(StrRead::new(v), config)
}

/// Deserialize an instance of `T` from an IO stream of Rison
pub fn from_reader<'a, T, I>(v: I) -> Result<T>
where
    T: serde::de::Deserialize<'a>,
    I: std::io::Read,
{
    from_trait(IoRead::new(v), Config::default())
}

/// Deserialize an instance of `T` from an IO stream of Rison with an
/// explicit [`Config`]
pub fn from_reader_with<'a, T, I>(v: I, config: Config) -> Result<T>
where
    T: serde::de::Deserialize<'a>,
    I: std::io::Read,
{
    from_trait(IoRead::new(v), config)
}

#[cfg(test)]
mod test {
    use super::{Config, DuplicateKeys};
    use crate::error::Code;
    use crate::value::{Map, Value};

    #[test]
    fn deserialize_true() {
        let v: bool = super::from_str("!t").unwrap();

        assert!(v);
    }

    #[test]
    fn deserialize_false() {
        let v: bool = super::from_str("!f").unwrap();

        assert!(!v);
    }

    #[test]
    fn deserialize_unit() {
        let v: () = super::from_str("!n").unwrap();

        assert_eq!(v, ());
    }

    #[test]
    fn fail_deserialize_bool_trailing() {
        let v: super::Result<bool> = super::from_str("!ff");

        assert!(matches!(v, Err(_)));
    }

    #[test]
    fn fail_deserialize_invalid_marker() {
        let err = super::from_str::<bool>("!x").unwrap_err();

        assert!(matches!(err.code(), Code::InvalidMarker));
    }

    #[test]
    fn deserialize_integer() {
        let v: u32 = super::from_str("12").unwrap();

        assert_eq!(v, 12);
    }

    #[test]
    fn deserialize_negative_integer() {
        let v: i64 = super::from_str("-42").unwrap();

        assert_eq!(v, -42);
    }

    #[test]
    fn deserialize_integer_with_leading_zeros() {
        let v: u32 = super::from_str("007").unwrap();

        assert_eq!(v, 7);
    }

    #[test]
    fn fail_deserialize_nonintegral_as_integer() {
        let v: super::Result<u32> = super::from_str("12.4");

        assert!(matches!(v, Err(_)));
    }

    #[test]
    fn deserialize_integral_float() {
        let v: f64 = super::from_str("12").unwrap();

        assert_eq!(v, 12.0);
    }

    #[test]
    fn deserialize_float() {
        let v: f64 = super::from_str("12.4").unwrap();

        assert_eq!(v, 12.4);
    }

    #[test]
    fn deserialize_integral_decimal_as_integer() {
        let v: i32 = super::from_str("3.0").unwrap();

        assert_eq!(v, 3);
    }

    #[test]
    fn fail_deserialize_float_exponent() {
        let err = super::from_str::<f64>("12.4e4").unwrap_err();

        assert!(matches!(err.code(), Code::InvalidNumber));
    }

    #[test]
    fn fail_deserialize_number_with_garbage() {
        let err = super::from_str::<Value>("1a").unwrap_err();

        assert!(matches!(err.code(), Code::InvalidNumber));
    }

    #[test]
    fn fail_deserialize_number_without_fraction_digits() {
        let err = super::from_str::<Value>("1.").unwrap_err();

        assert!(matches!(err.code(), Code::InvalidNumber));
    }

    #[test]
    fn fail_deserialize_lone_minus() {
        let err = super::from_str::<Value>("-").unwrap_err();

        assert!(matches!(err.code(), Code::InvalidNumber));
    }

    #[test]
    fn deserialize_quoted_empty_string() {
        let v: String = super::from_str("''").unwrap();

        assert_eq!(v, "");
    }

    #[test]
    fn deserialize_quoted_string() {
        let v: String = super::from_str("'hello, rison'").unwrap();

        assert_eq!(v, "hello, rison");
    }

    #[test]
    fn deserialize_quoted_string_with_escapes() {
        let v: String = super::from_str("'hello, !'rison!'!!'").unwrap();

        assert_eq!(v, "hello, 'rison'!");
    }

    #[test]
    fn deserialize_ident_string() {
        let v: String = super::from_str("hellorison").unwrap();

        assert_eq!(v, "hellorison");
    }

    #[test]
    fn deserialize_non_ascii_ident_string() {
        let v: String = super::from_str("café").unwrap();

        assert_eq!(v, "café");
    }

    #[test]
    fn deserialize_borrowed_str() {
        let v: &str = super::from_str("'hello'").unwrap();

        assert_eq!(v, "hello");

        let v: &str = super::from_str("hello").unwrap();

        assert_eq!(v, "hello");
    }

    #[test]
    fn fail_deserialize_invalid_escape() {
        let err = super::from_str::<String>("'a!z'").unwrap_err();

        assert!(matches!(err.code(), Code::InvalidEscape));
    }

    #[test]
    fn fail_deserialize_unterminated_string() {
        let err = super::from_str::<String>("'abc").unwrap_err();

        assert!(matches!(err.code(), Code::EofString));
    }

    #[test]
    fn deserialize_none() {
        let v: Option<String> = super::from_str("!n").unwrap();

        assert_eq!(v, None);
    }

    #[test]
    fn deserialize_some_ident_string() {
        let v: Option<String> = super::from_str("hellorison").unwrap();

        assert_eq!(v, Some("hellorison".into()));
    }

    #[test]
    fn deserialize_some_bool() {
        let v: Option<bool> = super::from_str("!t").unwrap();

        assert_eq!(v, Some(true));
    }

    #[test]
    fn deserialize_some_list() {
        let v: Option<Vec<u8>> = super::from_str("!(1,2)").unwrap();

        assert_eq!(v, Some(vec![1, 2]));
    }

    #[test]
    fn deserialize_empty_struct() {
        #[derive(serde::Deserialize)]
        struct Empty {}
        let _v: Empty = super::from_str("()").unwrap();
    }

    #[test]
    fn deserialize_struct() {
        #[derive(serde::Deserialize, Debug, PartialEq, Eq)]
        struct Full {
            a: String,
            b: String,
        }
        let v: Full = super::from_str("(a:hello,b:world)").unwrap();

        assert_eq!(
            v,
            Full {
                a: "hello".into(),
                b: "world".into()
            }
        );
    }

    #[test]
    fn deserialize_struct_with_whitespace() {
        #[derive(serde::Deserialize, Debug, PartialEq, Eq)]
        struct Full {
            a: String,
            b: String,
        }
        let v: Full = super::from_str(" ( a : hello ,\n b : world ) ").unwrap();

        assert_eq!(
            v,
            Full {
                a: "hello".into(),
                b: "world".into()
            }
        );
    }

    #[test]
    fn deserialize_struct_ignoring_unknown_field() {
        #[derive(serde::Deserialize, Debug, PartialEq, Eq)]
        struct Partial {
            a: String,
        }
        let v: Partial = super::from_str("(a:hello,b:!(1,2))").unwrap();

        assert_eq!(v, Partial { a: "hello".into() });
    }

    #[test]
    fn deserialize_struct_with_optional_present() {
        #[derive(serde::Deserialize, Debug, PartialEq, Eq)]
        struct Full {
            a: String,
            b: Option<String>,
        }
        let v: Full = super::from_str("(a:hello,b:world)").unwrap();

        assert_eq!(
            v,
            Full {
                a: "hello".into(),
                b: Some("world".into())
            }
        );
    }

    #[test]
    fn deserialize_struct_with_optional_missing() {
        #[derive(serde::Deserialize, Debug, PartialEq, Eq)]
        struct Full {
            a: String,
            b: Option<String>,
        }
        let v: Full = super::from_str("(a:hello)").unwrap();

        assert_eq!(
            v,
            Full {
                a: "hello".into(),
                b: None
            }
        );
    }

    #[test]
    fn deserialize_newtype_struct() {
        #[derive(serde::Deserialize, Debug, PartialEq, Eq)]
        struct Wrapper(String);
        let v: Wrapper = super::from_str("hello").unwrap();

        assert_eq!(v, Wrapper("hello".into()));
    }

    #[test]
    fn deserialize_map() {
        let v: std::collections::HashMap<String, String> =
            super::from_str("(a:hello,b:world)").unwrap();

        let expected = vec![("a".into(), "hello".into()), ("b".into(), "world".into())]
            .into_iter()
            .collect();
        assert_eq!(v, expected);
    }

    #[test]
    fn deserialize_map_with_numeric_looking_key() {
        let v: std::collections::HashMap<String, u8> = super::from_str("(1:2)").unwrap();

        let expected = vec![("1".into(), 2)].into_iter().collect();
        assert_eq!(v, expected);
    }

    #[test]
    fn deserialize_tuple() {
        let v: (String, String) = super::from_str("!(hello,world)").unwrap();

        assert_eq!(v, ("hello".into(), "world".into()));
    }

    #[test]
    fn deserialize_unit_enum_variant() {
        #[derive(serde::Deserialize, Debug, PartialEq, Eq)]
        enum Mode {
            Fast,
            Slow,
        }
        let v: Mode = super::from_str("Fast").unwrap();
        assert_eq!(v, Mode::Fast);

        let v: Mode = super::from_str("'Slow'").unwrap();
        assert_eq!(v, Mode::Slow);
    }

    #[test]
    fn deserialize_newtype_enum_variant() {
        #[derive(serde::Deserialize, Debug, PartialEq, Eq)]
        enum Count {
            Exactly(u32),
        }
        let v: Count = super::from_str("(Exactly:7)").unwrap();

        assert_eq!(v, Count::Exactly(7));
    }

    #[test]
    fn deserialize_tuple_enum_variant() {
        #[derive(serde::Deserialize, Debug, PartialEq, Eq)]
        enum Pair {
            Both(u8, u8),
        }
        let v: Pair = super::from_str("(Both:!(1,2))").unwrap();

        assert_eq!(v, Pair::Both(1, 2));
    }

    #[test]
    fn deserialize_struct_enum_variant() {
        #[derive(serde::Deserialize, Debug, PartialEq, Eq)]
        enum Shape {
            Rect { w: u32, h: u32 },
        }
        let v: Shape = super::from_str("(Rect:(w:3,h:4))").unwrap();

        assert_eq!(v, Shape::Rect { w: 3, h: 4 });
    }

    #[test]
    fn deserialize_value_literals() {
        assert_eq!(super::from_str::<Value>("!t").unwrap(), Value::Bool(true));
        assert_eq!(super::from_str::<Value>("!f").unwrap(), Value::Bool(false));
        assert_eq!(super::from_str::<Value>("!n").unwrap(), Value::Null);
        assert_eq!(
            super::from_str::<Value>("!(1,2,3)").unwrap(),
            Value::from(vec![1u64, 2, 3])
        );
        assert_eq!(
            super::from_str::<Value>("'it!'s'").unwrap(),
            Value::String("it's".into())
        );
        assert_eq!(super::from_str::<Value>("!()").unwrap(), Value::Array(vec![]));
        assert_eq!(
            super::from_str::<Value>("()").unwrap(),
            Value::Object(Map::new())
        );
    }

    #[test]
    fn deserialize_value_object() {
        let v: Value = super::from_str("(a:1,b:2)").unwrap();

        let mut expected = Map::new();
        expected.insert("a".into(), Value::from(1u64));
        expected.insert("b".into(), Value::from(2u64));
        assert_eq!(v, Value::Object(expected));
    }

    #[test]
    fn deserialize_value_string() {
        let v: Value = super::from_str("helloworld").unwrap();

        assert_eq!(v, Value::String("helloworld".into()));
    }

    #[test]
    fn deserialize_value_map() {
        let v: Value = super::from_str("(hello:!(a,b,c),world:'it works')").unwrap();

        let mut expected = Map::new();
        expected.insert(
            "hello".into(),
            Value::Array(vec!["a".into(), "b".into(), "c".into()]),
        );
        expected.insert("world".into(), Value::String("it works".into()));
        assert_eq!(v, Value::Object(expected));
    }

    #[test]
    fn deserialize_value_map_from_io() {
        let v: Value = super::from_reader(b"(hello:!(a,b,c),world:'it works')" as &[_]).unwrap();

        let mut expected = Map::new();
        expected.insert(
            "hello".into(),
            Value::Array(vec!["a".into(), "b".into(), "c".into()]),
        );
        expected.insert("world".into(), Value::String("it works".into()));
        assert_eq!(v, Value::Object(expected));
    }

    #[test]
    fn fail_deserialize_trailing_characters() {
        let err = super::from_str::<bool>("!t!t").unwrap_err();

        assert!(matches!(err.code(), Code::TrailingChars));
        assert_eq!(err.position().unwrap().offset, 2);
    }

    #[test]
    fn fail_deserialize_trailing_comma_in_list() {
        let err = super::from_str::<Value>("!(1,)").unwrap_err();

        assert!(matches!(err.code(), Code::TrailingSep));
    }

    #[test]
    fn fail_deserialize_trailing_comma_in_object() {
        let err = super::from_str::<Value>("(a:1,)").unwrap_err();

        assert!(matches!(err.code(), Code::TrailingSep));
    }

    #[test]
    fn fail_deserialize_missing_colon() {
        let err = super::from_str::<Value>("(a 1)").unwrap_err();

        assert!(matches!(err.code(), Code::ExpectedColon));
    }

    #[test]
    fn fail_deserialize_duplicate_key() {
        let err = super::from_str::<Value>("(a:1,a:2)").unwrap_err();

        assert!(matches!(err.code(), Code::DuplicateKey(key) if key == "a"));
        assert_eq!(err.position().unwrap().offset, 5);
    }

    #[test]
    fn fail_deserialize_duplicate_key_mixed_quoting() {
        let err = super::from_str::<Value>("(a:1,'a':2)").unwrap_err();

        assert!(matches!(err.code(), Code::DuplicateKey(key) if key == "a"));
    }

    #[test]
    fn deserialize_duplicate_key_last_wins() {
        let config = Config {
            duplicate_keys: DuplicateKeys::LastWins,
            ..Config::default()
        };
        let v: Value = super::from_str_with("(a:1,a:2)", config).unwrap();

        let mut expected = Map::new();
        expected.insert("a".into(), Value::from(2u64));
        assert_eq!(v, Value::Object(expected));
    }

    #[test]
    fn fail_deserialize_past_depth_limit() {
        let mut text = String::new();
        for _ in 0..200 {
            text.push_str("!(");
        }
        text.push('1');
        for _ in 0..200 {
            text.push(')');
        }
        let err = super::from_str::<Value>(&text).unwrap_err();

        assert!(matches!(err.code(), Code::DepthLimitExceeded(128)));
    }

    #[test]
    fn deserialize_within_depth_limit() {
        let mut text = String::new();
        for _ in 0..100 {
            text.push_str("!(");
        }
        text.push('1');
        for _ in 0..100 {
            text.push(')');
        }
        let _v: Value = super::from_str(&text).unwrap();
    }

    #[test]
    fn fail_deserialize_past_configured_depth_limit() {
        let config = Config {
            max_depth: 2,
            ..Config::default()
        };
        let err = super::from_str_with::<Value>("(a:!(!(1)))", config).unwrap_err();

        assert!(matches!(err.code(), Code::DepthLimitExceeded(2)));
    }
}
