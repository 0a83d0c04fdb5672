//! This crate provides functionality for serializing and deserializing the
//! subset of the Adobe AMF0 encoding that RTMP command messages are built
//! from, as described in
//! <https://wwwimages2.adobe.com/content/dam/acom/en/devnet/pdf/amf0-file-format-specification.pdf>
//!
//! The encode side is deliberately primitive based (one call per tag, with
//! objects bracketed explicitly) so that command payloads come out with a
//! deterministic field order.  The decode side can either materialize full
//! [`Amf0Value`]s or, via the [`scan`] module, walk raw bytes without
//! decoding them.
//!
//! # Examples
//! ```
//! use std::io::Cursor;
//! use strobe_amf0::{Amf0Value, Amf0Writer, deserialize};
//!
//! let mut writer = Amf0Writer::new();
//! writer.write_string("connect").unwrap();
//! writer.write_number(1.0).unwrap();
//! writer.write_object_start();
//! writer.write_field_name("app").unwrap();
//! writer.write_string("live").unwrap();
//! writer.write_object_end().unwrap();
//!
//! let bytes = writer.into_bytes();
//! let mut cursor = Cursor::new(&bytes[..]);
//! let values = deserialize(&mut cursor).unwrap();
//!
//! assert_eq!(values[0], Amf0Value::Utf8String("connect".to_string()));
//! assert_eq!(values[1], Amf0Value::Number(1.0));
//! ```

mod deserialization;
mod errors;
mod serialization;

pub mod scan;

pub use deserialization::deserialize;
pub use errors::{Amf0DeserializationError, Amf0SerializationError};
pub use serialization::Amf0Writer;

use std::collections::HashMap;

/// An enum representing the different supported types of AMF0 values
#[derive(PartialEq, Debug, Clone)]
pub enum Amf0Value {
    Number(f64),
    Boolean(bool),
    Utf8String(String),
    Object(HashMap<String, Amf0Value>),
    Null,
}

impl Amf0Value {
    pub fn get_number(self) -> Option<f64> {
        match self {
            Amf0Value::Number(value) => Some(value),
            _ => None,
        }
    }

    pub fn get_boolean(self) -> Option<bool> {
        match self {
            Amf0Value::Boolean(value) => Some(value),
            _ => None,
        }
    }

    pub fn get_string(self) -> Option<String> {
        match self {
            Amf0Value::Utf8String(value) => Some(value),
            _ => None,
        }
    }

    pub fn get_object_properties(self) -> Option<HashMap<String, Amf0Value>> {
        match self {
            Amf0Value::Object(properties) => Some(properties),
            _ => None,
        }
    }
}

mod markers {
    pub const NUMBER_MARKER: u8 = 0;
    pub const BOOLEAN_MARKER: u8 = 1;
    pub const STRING_MARKER: u8 = 2;
    pub const OBJECT_MARKER: u8 = 3;
    pub const NULL_MARKER: u8 = 5;
    pub const ECMA_ARRAY_MARKER: u8 = 8;
    pub const OBJECT_END_MARKER: u8 = 9;
    pub const STRICT_ARRAY_MARKER: u8 = 10;
    pub const UTF_8_EMPTY_MARKER: u16 = 0;
}
