//! Module contains functionality for serializing values into bytes based
//! on the AMF0 specification
//! (http://wwwimages.adobe.com/content/dam/Adobe/en/devnet/amf/pdf/amf0-file-format-specification.pdf)
//!
//! Serialization is primitive based: every call appends exactly one tag
//! (or one object bracket), and objects are written as an explicit
//! start / field name / value / end sequence.  This keeps the byte layout
//! of a written payload fully determined by the call order, which the
//! RTMP command encoding relies on.

use crate::errors::Amf0SerializationError;
use crate::markers;
use byteorder::{BigEndian, WriteBytesExt};

/// Appends AMF0 encoded values to a growing byte buffer
pub struct Amf0Writer {
    bytes: Vec<u8>,
}

impl Amf0Writer {
    pub fn new() -> Amf0Writer {
        Amf0Writer { bytes: Vec::new() }
    }

    /// Consumes the writer, returning the encoded bytes
    pub fn into_bytes(self) -> Vec<u8> {
        self.bytes
    }

    pub fn write_number(&mut self, value: f64) -> Result<(), Amf0SerializationError> {
        self.bytes.push(markers::NUMBER_MARKER);
        self.bytes.write_f64::<BigEndian>(value)?;
        Ok(())
    }

    pub fn write_boolean(&mut self, value: bool) {
        self.bytes.push(markers::BOOLEAN_MARKER);
        self.bytes.push(value as u8);
    }

    pub fn write_string(&mut self, value: &str) -> Result<(), Amf0SerializationError> {
        if value.len() > (u16::max_value() as usize) {
            return Err(Amf0SerializationError::NormalStringTooLong);
        }

        self.bytes.push(markers::STRING_MARKER);
        self.bytes.write_u16::<BigEndian>(value.len() as u16)?;
        self.bytes.extend(value.as_bytes());
        Ok(())
    }

    pub fn write_null(&mut self) {
        self.bytes.push(markers::NULL_MARKER);
    }

    pub fn write_object_start(&mut self) {
        self.bytes.push(markers::OBJECT_MARKER);
    }

    /// Writes the name of the next object field.  Must be followed by
    /// exactly one value write, and is only valid between an object start
    /// and an object end.
    pub fn write_field_name(&mut self, name: &str) -> Result<(), Amf0SerializationError> {
        if name.len() > (u16::max_value() as usize) {
            return Err(Amf0SerializationError::NormalStringTooLong);
        }

        self.bytes.write_u16::<BigEndian>(name.len() as u16)?;
        self.bytes.extend(name.as_bytes());
        Ok(())
    }

    pub fn write_object_end(&mut self) -> Result<(), Amf0SerializationError> {
        // an object is terminated by a zero length field name plus the end marker
        self.bytes
            .write_u16::<BigEndian>(markers::UTF_8_EMPTY_MARKER)?;
        self.bytes.push(markers::OBJECT_END_MARKER);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::Amf0Writer;
    use crate::errors::Amf0SerializationError;
    use crate::markers;
    use byteorder::{BigEndian, WriteBytesExt};

    #[test]
    fn can_write_number() {
        let number: f64 = 332.0;

        let mut writer = Amf0Writer::new();
        writer.write_number(number).unwrap();
        let result = writer.into_bytes();

        let mut expected = vec![];
        expected.write_u8(markers::NUMBER_MARKER).unwrap();
        expected.write_f64::<BigEndian>(number).unwrap();

        assert_eq!(result, expected);
    }

    #[test]
    fn can_write_true_boolean() {
        let mut writer = Amf0Writer::new();
        writer.write_boolean(true);
        let result = writer.into_bytes();

        assert_eq!(result, vec![markers::BOOLEAN_MARKER, 1]);
    }

    #[test]
    fn can_write_false_boolean() {
        let mut writer = Amf0Writer::new();
        writer.write_boolean(false);
        let result = writer.into_bytes();

        assert_eq!(result, vec![markers::BOOLEAN_MARKER, 0]);
    }

    #[test]
    fn can_write_string() {
        let value = "test";

        let mut writer = Amf0Writer::new();
        writer.write_string(value).unwrap();
        let result = writer.into_bytes();

        let mut expected = vec![];
        expected.write_u8(markers::STRING_MARKER).unwrap();
        expected.write_u16::<BigEndian>(value.len() as u16).unwrap();
        expected.extend(value.as_bytes());

        assert_eq!(result, expected);
    }

    #[test]
    fn can_write_null() {
        let mut writer = Amf0Writer::new();
        writer.write_null();
        let result = writer.into_bytes();

        assert_eq!(result, vec![markers::NULL_MARKER]);
    }

    #[test]
    fn can_write_object_with_field_order_preserved() {
        const NUMBER: f64 = 332.0;

        let mut writer = Amf0Writer::new();
        writer.write_object_start();
        writer.write_field_name("app").unwrap();
        writer.write_string("live").unwrap();
        writer.write_field_name("test").unwrap();
        writer.write_number(NUMBER).unwrap();
        writer.write_object_end().unwrap();
        let result = writer.into_bytes();

        let mut expected = vec![];
        expected.push(markers::OBJECT_MARKER);
        expected.write_u16::<BigEndian>(3).unwrap();
        expected.extend("app".as_bytes());
        expected.push(markers::STRING_MARKER);
        expected.write_u16::<BigEndian>(4).unwrap();
        expected.extend("live".as_bytes());
        expected.write_u16::<BigEndian>(4).unwrap();
        expected.extend("test".as_bytes());
        expected.push(markers::NUMBER_MARKER);
        expected.write_f64::<BigEndian>(NUMBER).unwrap();
        expected
            .write_u16::<BigEndian>(markers::UTF_8_EMPTY_MARKER)
            .unwrap();
        expected.push(markers::OBJECT_END_MARKER);

        assert_eq!(result, expected);
    }

    #[test]
    fn error_when_string_length_greater_than_u16() {
        let mut value = String::new();
        let max = (u16::max_value() as u32) + 1;
        for _ in 0..max {
            value.push('a');
        }

        let mut writer = Amf0Writer::new();
        let result = writer.write_string(&value);

        assert!(match result {
            Err(Amf0SerializationError::NormalStringTooLong) => true,
            _ => false,
        });
    }
}
