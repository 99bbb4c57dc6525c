//! Serialize Rust data structures to canonical Rison text

use std::io::{self, Write};

use serde::ser::{self, Serialize};

use crate::de::{is_id_char, is_id_start};
use crate::error::{Code, Error, Result};

/// A serializer for Rust values into Rison
pub struct Serializer<W> {
    writer: W,
}

impl<W: io::Write> Serializer<W> {
    /// Create a Rison serializer writing to `writer`
    pub fn new(writer: W) -> Self {
        Serializer { writer }
    }

    /// Unwrap the inner writer
    pub fn into_inner(self) -> W {
        self.writer
    }

    fn write_integer<I: itoa::Integer>(&mut self, value: I) -> Result<()> {
        let mut buf = itoa::Buffer::new();
        self.writer
            .write_all(buf.format(value).as_bytes())
            .map_err(Error::io)
    }

    fn write_f64(&mut self, value: f64) -> Result<()> {
        if !value.is_finite() {
            return Err(Error::ser(Code::NonFiniteNumber));
        }
        // `Display` for floats is the shortest decimal expansion that
        // round-trips and never switches to scientific notation, which the
        // grammar lacks. An integral float prints without its `.`.
        write!(self.writer, "{value}").map_err(Error::io)
    }

    fn write_string(&mut self, value: &str) -> Result<()> {
        if is_bare(value) {
            return self.writer.write_all(value.as_bytes()).map_err(Error::io);
        }
        let bytes = value.as_bytes();
        self.writer.write_all(b"'").map_err(Error::io)?;
        let mut start = 0;
        for (i, &b) in bytes.iter().enumerate() {
            if b == b'\'' || b == b'!' {
                self.writer.write_all(&bytes[start..i]).map_err(Error::io)?;
                self.writer.write_all(b"!").map_err(Error::io)?;
                start = i;
            }
        }
        self.writer.write_all(&bytes[start..]).map_err(Error::io)?;
        self.writer.write_all(b"'").map_err(Error::io)
    }
}

/// A string may be written without quotes only if it is non-empty, contains
/// no reserved byte, and does not start like a number, so the bare form can
/// never be read back as anything but the same string.
fn is_bare(value: &str) -> bool {
    let bytes = value.as_bytes();
    match bytes.first() {
        Some(&first) if is_id_start(first) => bytes.iter().all(|&b| is_id_char(b)),
        _ => false,
    }
}

impl<'a, W: io::Write> ser::Serializer for &'a mut Serializer<W> {
    type Ok = ();
    type Error = Error;

    type SerializeSeq = Compound<'a, W>;
    type SerializeTuple = Compound<'a, W>;
    type SerializeTupleStruct = Compound<'a, W>;
    type SerializeTupleVariant = Compound<'a, W>;
    type SerializeMap = Compound<'a, W>;
    type SerializeStruct = Compound<'a, W>;
    type SerializeStructVariant = Compound<'a, W>;

    fn serialize_bool(self, v: bool) -> Result<()> {
        self.writer
            .write_all(if v { b"!t" } else { b"!f" })
            .map_err(Error::io)
    }

    fn serialize_i8(self, v: i8) -> Result<()> {
        self.write_integer(v)
    }

    fn serialize_i16(self, v: i16) -> Result<()> {
        self.write_integer(v)
    }

    fn serialize_i32(self, v: i32) -> Result<()> {
        self.write_integer(v)
    }

    fn serialize_i64(self, v: i64) -> Result<()> {
        self.write_integer(v)
    }

    fn serialize_u8(self, v: u8) -> Result<()> {
        self.write_integer(v)
    }

    fn serialize_u16(self, v: u16) -> Result<()> {
        self.write_integer(v)
    }

    fn serialize_u32(self, v: u32) -> Result<()> {
        self.write_integer(v)
    }

    fn serialize_u64(self, v: u64) -> Result<()> {
        self.write_integer(v)
    }

    fn serialize_f32(self, v: f32) -> Result<()> {
        if !v.is_finite() {
            return Err(Error::ser(Code::NonFiniteNumber));
        }
        write!(self.writer, "{v}").map_err(Error::io)
    }

    fn serialize_f64(self, v: f64) -> Result<()> {
        self.write_f64(v)
    }

    fn serialize_char(self, v: char) -> Result<()> {
        let mut buf = [0u8; 4];
        self.write_string(v.encode_utf8(&mut buf))
    }

    fn serialize_str(self, v: &str) -> Result<()> {
        self.write_string(v)
    }

    fn serialize_bytes(self, v: &[u8]) -> Result<()> {
        self.collect_seq(v)
    }

    fn serialize_none(self) -> Result<()> {
        self.serialize_unit()
    }

    fn serialize_some<T>(self, value: &T) -> Result<()>
    where
        T: ?Sized + Serialize,
    {
        value.serialize(self)
    }

    fn serialize_unit(self) -> Result<()> {
        self.writer.write_all(b"!n").map_err(Error::io)
    }

    fn serialize_unit_struct(self, _name: &'static str) -> Result<()> {
        self.serialize_unit()
    }

    fn serialize_unit_variant(
        self,
        _name: &'static str,
        _variant_index: u32,
        variant: &'static str,
    ) -> Result<()> {
        self.write_string(variant)
    }

    fn serialize_newtype_struct<T>(self, _name: &'static str, value: &T) -> Result<()>
    where
        T: ?Sized + Serialize,
    {
        value.serialize(self)
    }

    fn serialize_newtype_variant<T>(
        self,
        _name: &'static str,
        _variant_index: u32,
        variant: &'static str,
        value: &T,
    ) -> Result<()>
    where
        T: ?Sized + Serialize,
    {
        self.writer.write_all(b"(").map_err(Error::io)?;
        self.write_string(variant)?;
        self.writer.write_all(b":").map_err(Error::io)?;
        value.serialize(&mut *self)?;
        self.writer.write_all(b")").map_err(Error::io)
    }

    fn serialize_seq(self, _len: Option<usize>) -> Result<Self::SerializeSeq> {
        self.writer.write_all(b"!(").map_err(Error::io)?;
        Ok(Compound {
            ser: self,
            first: true,
            close: b")",
        })
    }

    fn serialize_tuple(self, len: usize) -> Result<Self::SerializeTuple> {
        self.serialize_seq(Some(len))
    }

    fn serialize_tuple_struct(
        self,
        _name: &'static str,
        len: usize,
    ) -> Result<Self::SerializeTupleStruct> {
        self.serialize_seq(Some(len))
    }

    fn serialize_tuple_variant(
        self,
        _name: &'static str,
        _variant_index: u32,
        variant: &'static str,
        _len: usize,
    ) -> Result<Self::SerializeTupleVariant> {
        self.writer.write_all(b"(").map_err(Error::io)?;
        self.write_string(variant)?;
        self.writer.write_all(b":!(").map_err(Error::io)?;
        Ok(Compound {
            ser: self,
            first: true,
            close: b"))",
        })
    }

    fn serialize_map(self, _len: Option<usize>) -> Result<Self::SerializeMap> {
        self.writer.write_all(b"(").map_err(Error::io)?;
        Ok(Compound {
            ser: self,
            first: true,
            close: b")",
        })
    }

    fn serialize_struct(self, _name: &'static str, len: usize) -> Result<Self::SerializeStruct> {
        self.serialize_map(Some(len))
    }

    fn serialize_struct_variant(
        self,
        _name: &'static str,
        _variant_index: u32,
        variant: &'static str,
        _len: usize,
    ) -> Result<Self::SerializeStructVariant> {
        self.writer.write_all(b"(").map_err(Error::io)?;
        self.write_string(variant)?;
        self.writer.write_all(b":(").map_err(Error::io)?;
        Ok(Compound {
            ser: self,
            first: true,
            close: b"))",
        })
    }
}

/// State for an in-progress list, object or variant payload.
pub struct Compound<'a, W> {
    ser: &'a mut Serializer<W>,
    first: bool,
    close: &'static [u8],
}

impl<'a, W: io::Write> Compound<'a, W> {
    fn write_separator(&mut self) -> Result<()> {
        if self.first {
            self.first = false;
            Ok(())
        } else {
            self.ser.writer.write_all(b",").map_err(Error::io)
        }
    }
}

impl<'a, W: io::Write> ser::SerializeSeq for Compound<'a, W> {
    type Ok = ();
    type Error = Error;

    fn serialize_element<T>(&mut self, value: &T) -> Result<()>
    where
        T: ?Sized + Serialize,
    {
        self.write_separator()?;
        value.serialize(&mut *self.ser)
    }

    fn end(self) -> Result<()> {
        self.ser.writer.write_all(self.close).map_err(Error::io)
    }
}

impl<'a, W: io::Write> ser::SerializeTuple for Compound<'a, W> {
    type Ok = ();
    type Error = Error;

    fn serialize_element<T>(&mut self, value: &T) -> Result<()>
    where
        T: ?Sized + Serialize,
    {
        ser::SerializeSeq::serialize_element(self, value)
    }

    fn end(self) -> Result<()> {
        ser::SerializeSeq::end(self)
    }
}

impl<'a, W: io::Write> ser::SerializeTupleStruct for Compound<'a, W> {
    type Ok = ();
    type Error = Error;

    fn serialize_field<T>(&mut self, value: &T) -> Result<()>
    where
        T: ?Sized + Serialize,
    {
        ser::SerializeSeq::serialize_element(self, value)
    }

    fn end(self) -> Result<()> {
        ser::SerializeSeq::end(self)
    }
}

impl<'a, W: io::Write> ser::SerializeTupleVariant for Compound<'a, W> {
    type Ok = ();
    type Error = Error;

    fn serialize_field<T>(&mut self, value: &T) -> Result<()>
    where
        T: ?Sized + Serialize,
    {
        ser::SerializeSeq::serialize_element(self, value)
    }

    fn end(self) -> Result<()> {
        ser::SerializeSeq::end(self)
    }
}

impl<'a, W: io::Write> ser::SerializeMap for Compound<'a, W> {
    type Ok = ();
    type Error = Error;

    fn serialize_key<T>(&mut self, key: &T) -> Result<()>
    where
        T: ?Sized + Serialize,
    {
        self.write_separator()?;
        key.serialize(MapKeySerializer { ser: self.ser })
    }

    fn serialize_value<T>(&mut self, value: &T) -> Result<()>
    where
        T: ?Sized + Serialize,
    {
        self.ser.writer.write_all(b":").map_err(Error::io)?;
        value.serialize(&mut *self.ser)
    }

    fn end(self) -> Result<()> {
        self.ser.writer.write_all(self.close).map_err(Error::io)
    }
}

impl<'a, W: io::Write> ser::SerializeStruct for Compound<'a, W> {
    type Ok = ();
    type Error = Error;

    fn serialize_field<T>(&mut self, key: &'static str, value: &T) -> Result<()>
    where
        T: ?Sized + Serialize,
    {
        ser::SerializeMap::serialize_entry(self, key, value)
    }

    fn end(self) -> Result<()> {
        ser::SerializeMap::end(self)
    }
}

impl<'a, W: io::Write> ser::SerializeStructVariant for Compound<'a, W> {
    type Ok = ();
    type Error = Error;

    fn serialize_field<T>(&mut self, key: &'static str, value: &T) -> Result<()>
    where
        T: ?Sized + Serialize,
    {
        ser::SerializeMap::serialize_entry(self, key, value)
    }

    fn end(self) -> Result<()> {
        ser::SerializeMap::end(self)
    }
}

/// Serializes object keys, which the grammar restricts to strings.
struct MapKeySerializer<'a, W> {
    ser: &'a mut Serializer<W>,
}

fn key_must_be_string() -> Error {
    Error::ser(Code::KeyMustBeString)
}

impl<'a, W: io::Write> ser::Serializer for MapKeySerializer<'a, W> {
    type Ok = ();
    type Error = Error;

    type SerializeSeq = ser::Impossible<(), Error>;
    type SerializeTuple = ser::Impossible<(), Error>;
    type SerializeTupleStruct = ser::Impossible<(), Error>;
    type SerializeTupleVariant = ser::Impossible<(), Error>;
    type SerializeMap = ser::Impossible<(), Error>;
    type SerializeStruct = ser::Impossible<(), Error>;
    type SerializeStructVariant = ser::Impossible<(), Error>;

    fn serialize_str(self, v: &str) -> Result<()> {
        self.ser.write_string(v)
    }

    fn serialize_char(self, v: char) -> Result<()> {
        let mut buf = [0u8; 4];
        self.ser.write_string(v.encode_utf8(&mut buf))
    }

    fn serialize_unit_variant(
        self,
        _name: &'static str,
        _variant_index: u32,
        variant: &'static str,
    ) -> Result<()> {
        self.ser.write_string(variant)
    }

    fn serialize_newtype_struct<T>(self, _name: &'static str, value: &T) -> Result<()>
    where
        T: ?Sized + Serialize,
    {
        value.serialize(self)
    }

    fn serialize_bool(self, _v: bool) -> Result<()> {
        Err(key_must_be_string())
    }

    fn serialize_i8(self, _v: i8) -> Result<()> {
        Err(key_must_be_string())
    }

    fn serialize_i16(self, _v: i16) -> Result<()> {
        Err(key_must_be_string())
    }

    fn serialize_i32(self, _v: i32) -> Result<()> {
        Err(key_must_be_string())
    }

    fn serialize_i64(self, _v: i64) -> Result<()> {
        Err(key_must_be_string())
    }

    fn serialize_u8(self, _v: u8) -> Result<()> {
        Err(key_must_be_string())
    }

    fn serialize_u16(self, _v: u16) -> Result<()> {
        Err(key_must_be_string())
    }

    fn serialize_u32(self, _v: u32) -> Result<()> {
        Err(key_must_be_string())
    }

    fn serialize_u64(self, _v: u64) -> Result<()> {
        Err(key_must_be_string())
    }

    fn serialize_f32(self, _v: f32) -> Result<()> {
        Err(key_must_be_string())
    }

    fn serialize_f64(self, _v: f64) -> Result<()> {
        Err(key_must_be_string())
    }

    fn serialize_bytes(self, _v: &[u8]) -> Result<()> {
        Err(key_must_be_string())
    }

    fn serialize_none(self) -> Result<()> {
        Err(key_must_be_string())
    }

    fn serialize_some<T>(self, _value: &T) -> Result<()>
    where
        T: ?Sized + Serialize,
    {
        Err(key_must_be_string())
    }

    fn serialize_unit(self) -> Result<()> {
        Err(key_must_be_string())
    }

    fn serialize_unit_struct(self, _name: &'static str) -> Result<()> {
        Err(key_must_be_string())
    }

    fn serialize_newtype_variant<T>(
        self,
        _name: &'static str,
        _variant_index: u32,
        _variant: &'static str,
        _value: &T,
    ) -> Result<()>
    where
        T: ?Sized + Serialize,
    {
        Err(key_must_be_string())
    }

    fn serialize_seq(self, _len: Option<usize>) -> Result<Self::SerializeSeq> {
        Err(key_must_be_string())
    }

    fn serialize_tuple(self, _len: usize) -> Result<Self::SerializeTuple> {
        Err(key_must_be_string())
    }

    fn serialize_tuple_struct(
        self,
        _name: &'static str,
        _len: usize,
    ) -> Result<Self::SerializeTupleStruct> {
        Err(key_must_be_string())
    }

    fn serialize_tuple_variant(
        self,
        _name: &'static str,
        _variant_index: u32,
        _variant: &'static str,
        _len: usize,
    ) -> Result<Self::SerializeTupleVariant> {
        Err(key_must_be_string())
    }

    fn serialize_map(self, _len: Option<usize>) -> Result<Self::SerializeMap> {
        Err(key_must_be_string())
    }

    fn serialize_struct(self, _name: &'static str, _len: usize) -> Result<Self::SerializeStruct> {
        Err(key_must_be_string())
    }

    fn serialize_struct_variant(
        self,
        _name: &'static str,
        _variant_index: u32,
        _variant: &'static str,
        _len: usize,
    ) -> Result<Self::SerializeStructVariant> {
        Err(key_must_be_string())
    }
}

/// Serialize `value` as Rison text into `writer`
pub fn to_writer<W, T>(writer: W, value: &T) -> Result<()>
where
    W: io::Write,
    T: ?Sized + Serialize,
{
    let mut ser = Serializer::new(writer);
    value.serialize(&mut ser)
}

/// Serialize `value` as a Rison byte vector
pub fn to_vec<T>(value: &T) -> Result<Vec<u8>>
where
    T: ?Sized + Serialize,
{
    let mut out = Vec::with_capacity(128);
    to_writer(&mut out, value)?;
    Ok(out)
}

/// Serialize `value` as a Rison string
pub fn to_string<T>(value: &T) -> Result<String>
where
    T: ?Sized + Serialize,
{
    let out = to_vec(value)?;

    // # Safety
    // The serializer only ever emits complete UTF-8 sequences: literal
    // ASCII tokens and the bytes of `str` values, satisfying the safety
    // preconditions of `String::from_utf8_unchecked`.
    Ok(unsafe { String::from_utf8_unchecked(out) })
}

#[cfg(test)]
mod test {
    use crate::value::{Map, Number, Value};

    #[test]
    fn serialize_literals() {
        assert_eq!(super::to_string(&true).unwrap(), "!t");
        assert_eq!(super::to_string(&false).unwrap(), "!f");
        assert_eq!(super::to_string(&()).unwrap(), "!n");
        assert_eq!(super::to_string(&Option::<u8>::None).unwrap(), "!n");
    }

    #[test]
    fn serialize_integers() {
        assert_eq!(super::to_string(&42u8).unwrap(), "42");
        assert_eq!(super::to_string(&-17i64).unwrap(), "-17");
        assert_eq!(super::to_string(&0u64).unwrap(), "0");
    }

    #[test]
    fn serialize_floats() {
        assert_eq!(super::to_string(&12.4f64).unwrap(), "12.4");
        assert_eq!(super::to_string(&-0.25f64).unwrap(), "-0.25");
    }

    #[test]
    fn serialize_integral_float_without_point() {
        assert_eq!(super::to_string(&3.0f64).unwrap(), "3");
    }

    #[test]
    fn fail_serialize_non_finite_float() {
        let err = super::to_string(&f64::NAN).unwrap_err();
        assert!(matches!(err.code(), crate::error::Code::NonFiniteNumber));

        assert!(super::to_string(&f64::INFINITY).is_err());
    }

    #[test]
    fn serialize_bare_string() {
        assert_eq!(super::to_string("hellorison").unwrap(), "hellorison");
        assert_eq!(super::to_string("true").unwrap(), "true");
        assert_eq!(super::to_string("café").unwrap(), "café");
    }

    #[test]
    fn serialize_quoted_string() {
        assert_eq!(super::to_string("it's").unwrap(), "'it!'s'");
        assert_eq!(super::to_string("bang!").unwrap(), "'bang!!'");
        assert_eq!(super::to_string("hello, rison").unwrap(), "'hello, rison'");
        assert_eq!(super::to_string("").unwrap(), "''");
    }

    #[test]
    fn serialize_numeric_looking_string_quoted() {
        assert_eq!(super::to_string("42").unwrap(), "'42'");
        assert_eq!(super::to_string("-x").unwrap(), "'-x'");
        assert_eq!(super::to_string("1a").unwrap(), "'1a'");
    }

    #[test]
    fn serialize_list() {
        assert_eq!(super::to_string(&[1u8, 2, 3]).unwrap(), "!(1,2,3)");
        assert_eq!(super::to_string(&Vec::<u8>::new()).unwrap(), "!()");
    }

    #[test]
    fn serialize_tuple() {
        assert_eq!(
            super::to_string(&("hello", "world")).unwrap(),
            "!(hello,world)"
        );
    }

    #[test]
    fn serialize_struct() {
        #[derive(serde::Serialize)]
        struct Full {
            a: &'static str,
            b: Option<u32>,
            c: Option<u32>,
        }
        let v = Full {
            a: "hello",
            b: Some(7),
            c: None,
        };

        assert_eq!(super::to_string(&v).unwrap(), "(a:hello,b:7,c:!n)");
    }

    #[test]
    fn serialize_empty_struct() {
        #[derive(serde::Serialize)]
        struct Empty {}

        assert_eq!(super::to_string(&Empty {}).unwrap(), "()");
    }

    #[test]
    fn serialize_map_in_insertion_order() {
        let mut map = Map::new();
        map.insert("z".into(), Value::from(1u64));
        map.insert("a".into(), Value::from(2u64));

        assert_eq!(super::to_string(&map).unwrap(), "(z:1,a:2)");
    }

    #[test]
    fn serialize_quoted_key() {
        let mut map = Map::new();
        map.insert("it's".into(), Value::Bool(true));

        assert_eq!(super::to_string(&map).unwrap(), "('it!'s':!t)");
    }

    #[test]
    fn fail_serialize_non_string_key() {
        let map: std::collections::BTreeMap<u32, u32> = [(1, 2)].into_iter().collect();
        let err = super::to_string(&map).unwrap_err();

        assert!(matches!(err.code(), crate::error::Code::KeyMustBeString));
    }

    #[test]
    fn serialize_enum_variants() {
        #[derive(serde::Serialize)]
        enum Shape {
            Point,
            Circle(u32),
            Rect(u32, u32),
            Label { text: &'static str },
        }

        assert_eq!(super::to_string(&Shape::Point).unwrap(), "Point");
        assert_eq!(super::to_string(&Shape::Circle(3)).unwrap(), "(Circle:3)");
        assert_eq!(
            super::to_string(&Shape::Rect(3, 4)).unwrap(),
            "(Rect:!(3,4))"
        );
        assert_eq!(
            super::to_string(&Shape::Label { text: "hi" }).unwrap(),
            "(Label:(text:hi))"
        );
    }

    #[test]
    fn serialize_value_tree() {
        let mut inner = Map::new();
        inner.insert("id".into(), Value::from(7u64));
        inner.insert("name".into(), Value::String("it works".into()));
        let value = Value::Array(vec![
            Value::Null,
            Value::Bool(true),
            Value::Number(Number::from_f64(2.5).unwrap()),
            Value::Object(inner),
        ]);

        assert_eq!(
            super::to_string(&value).unwrap(),
            "!(!n,!t,2.5,(id:7,name:'it works'))"
        );
    }

    #[test]
    fn serialize_to_writer_and_vec() {
        let mut out = Vec::new();
        super::to_writer(&mut out, &[1u8, 2]).unwrap();
        assert_eq!(out, b"!(1,2)");

        assert_eq!(super::to_vec(&true).unwrap(), b"!t");
    }
}
