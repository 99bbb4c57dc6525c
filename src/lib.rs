//! Rison is a data serialization format based on JSON, optimized for
//! compactness in URIs.
//!
//! The format supported by this implementation is based on the documentation
//! and implementations found below:
//! - <https://github.com/Nanonid/rison>
//! - <https://github.com/w33ble/rison-node>
//!
//! The serializer and deserializer implementations are broadly inspired by
//! the existing `serde_json` library which provides a `serde` serializer and
//! deserializer for the standard JSON format.
//!
//! Rison text is grammatically complete before percent-encoding: embedding
//! the output in a URI, and percent-decoding a query string before handing
//! it to [`from_str`], are the caller's responsibility.
//!
//! ```
//! use rison::Value;
//!
//! let value: Value = rison::from_str("(active:!t,ids:!(1,2))").unwrap();
//! assert_eq!(value.as_object().unwrap()["ids"], Value::from(vec![1u64, 2]));
//! assert_eq!(rison::to_string(&value).unwrap(), "(active:!t,ids:!(1,2))");
//! ```

pub mod de;
pub mod error;
pub mod ser;
pub mod value;

#[doc(inline)]
pub use error::{Error, Result};

#[doc(inline)]
pub use de::{
    from_reader, from_reader_with, from_slice, from_slice_with, from_str, from_str_with, Config,
    Deserializer, DuplicateKeys,
};

#[doc(inline)]
pub use ser::{to_string, to_vec, to_writer, Serializer};

#[doc(inline)]
pub use value::{Map, Number, Value};
