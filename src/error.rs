//! Error reporting for Rison serialization and deserialization

use std::fmt;

/// A coarse classification of an [`Error`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Category {
    /// The underlying reader or writer failed.
    Io,
    /// The input is not valid Rison.
    Syntax,
    /// The input is valid Rison but does not fit the target type, or the
    /// value being serialized has no Rison representation.
    Data,
    /// The input ended before a complete value was read.
    Eof,
}

/// The precise cause of an [`Error`].
#[derive(Debug)]
#[non_exhaustive]
pub enum Code {
    /// Error constructed through `serde`'s `custom` entry points, including
    /// type mismatches reported by `Deserialize` implementations.
    Message(String),
    /// I/O failure in the underlying reader or writer.
    Io(std::io::Error),
    /// EoF where a value was expected.
    EofValue,
    /// EoF directly after a `!` marker.
    EofMarker,
    /// EoF while parsing a list.
    EofList,
    /// EoF while parsing an object.
    EofObject,
    /// EoF before the closing quote of a string.
    EofString,
    /// Missing `:` between an object key and its value.
    ExpectedColon,
    /// Missing `,` or `)` after a list element.
    ExpectedListSepOrEnd,
    /// Missing `,` or `)` after an object entry.
    ExpectedObjectSepOrEnd,
    /// A byte that cannot begin an object key.
    ExpectedKey,
    /// A byte that cannot begin a value.
    UnexpectedCharacter(char),
    /// A `!` followed by anything other than `t`, `f`, `n` or `(`.
    InvalidMarker,
    /// A `!` escape inside a quoted string not followed by `!` or `'`.
    InvalidEscape,
    /// A bare token starting like a number but not forming a valid literal.
    InvalidNumber,
    /// A numeric literal too large to represent.
    NumberOutOfRange,
    /// Input that is not valid UTF-8.
    InvalidUnicode,
    /// The same key twice within one object.
    DuplicateKey(String),
    /// A `,` directly before `)`.
    TrailingSep,
    /// Non-whitespace input after the top-level value.
    TrailingChars,
    /// Nesting beyond the configured maximum depth; carries the limit.
    DepthLimitExceeded(usize),
    /// Attempt to serialize a NaN or infinite number.
    NonFiniteNumber,
    /// Attempt to serialize a map whose keys are not strings.
    KeyMustBeString,
}

/// A byte offset into the input text.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Position {
    pub offset: usize,
}

impl From<usize> for Position {
    fn from(offset: usize) -> Self {
        Position { offset }
    }
}

/// An error produced while serializing or deserializing Rison.
#[derive(Debug)]
pub struct Error {
    pub(crate) code: Code,
    pub(crate) position: Option<Position>,
}

impl Error {
    pub(crate) fn new(code: Code, offset: usize) -> Self {
        Error {
            code,
            position: Some(Position { offset }),
        }
    }

    pub(crate) fn ser(code: Code) -> Self {
        Error {
            code,
            position: None,
        }
    }

    pub(crate) fn io(error: std::io::Error) -> Self {
        Error::ser(Code::Io(error))
    }

    /// The precise cause of this error.
    pub fn code(&self) -> &Code {
        &self.code
    }

    /// The byte offset at which this error was detected, if it arose from
    /// reading input.
    pub fn position(&self) -> Option<Position> {
        self.position
    }

    pub fn classify(&self) -> Category {
        match self.code {
            Code::Message(_) | Code::NonFiniteNumber | Code::KeyMustBeString => Category::Data,
            Code::Io(_) => Category::Io,
            Code::EofValue
            | Code::EofMarker
            | Code::EofList
            | Code::EofObject
            | Code::EofString => Category::Eof,
            Code::ExpectedColon
            | Code::ExpectedListSepOrEnd
            | Code::ExpectedObjectSepOrEnd
            | Code::ExpectedKey
            | Code::UnexpectedCharacter(_)
            | Code::InvalidMarker
            | Code::InvalidEscape
            | Code::InvalidNumber
            | Code::NumberOutOfRange
            | Code::InvalidUnicode
            | Code::DuplicateKey(_)
            | Code::TrailingSep
            | Code::TrailingChars
            | Code::DepthLimitExceeded(_) => Category::Syntax,
        }
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.code {
            Code::Message(msg) => f.write_str(msg)?,
            Code::Io(err) => fmt::Display::fmt(err, f)?,
            Code::EofValue => f.write_str("EoF while parsing a value")?,
            Code::EofMarker => f.write_str("EoF while parsing a marker")?,
            Code::EofList => f.write_str("EoF while parsing a list")?,
            Code::EofObject => f.write_str("EoF while parsing an object")?,
            Code::EofString => f.write_str("EoF while parsing a quoted string")?,
            Code::ExpectedColon => f.write_str("expected `:`")?,
            Code::ExpectedListSepOrEnd | Code::ExpectedObjectSepOrEnd => {
                f.write_str("expected `,` or `)`")?
            }
            Code::ExpectedKey => f.write_str("expected object key")?,
            Code::UnexpectedCharacter(ch) => write!(f, "unexpected character `{ch}`")?,
            Code::InvalidMarker => f.write_str("invalid marker")?,
            Code::InvalidEscape => f.write_str("invalid escape")?,
            Code::InvalidNumber => f.write_str("invalid number")?,
            Code::NumberOutOfRange => f.write_str("number out of range")?,
            Code::InvalidUnicode => f.write_str("invalid unicode code point")?,
            Code::DuplicateKey(key) => write!(f, "duplicate key `{key}`")?,
            Code::TrailingSep => f.write_str("trailing comma")?,
            Code::TrailingChars => f.write_str("trailing characters")?,
            Code::DepthLimitExceeded(limit) => {
                write!(f, "maximum nesting depth of {limit} exceeded")?
            }
            Code::NonFiniteNumber => f.write_str("cannot represent a non-finite number")?,
            Code::KeyMustBeString => f.write_str("map key must be a string")?,
        }
        if let Some(position) = self.position {
            write!(f, " at offset {}", position.offset)?;
        }
        Ok(())
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match &self.code {
            Code::Io(err) => Some(err),
            _ => None,
        }
    }
}

impl serde::de::Error for Error {
    fn custom<T>(msg: T) -> Self
    where
        T: fmt::Display,
    {
        Error::ser(Code::Message(msg.to_string()))
    }
}

impl serde::ser::Error for Error {
    fn custom<T>(msg: T) -> Self
    where
        T: fmt::Display,
    {
        Error::ser(Code::Message(msg.to_string()))
    }
}

pub type Result<T> = std::result::Result<T, Error>;
