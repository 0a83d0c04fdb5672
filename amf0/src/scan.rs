//! Helpers for walking raw AMF0 bytes without decoding them into values.
//!
//! RTMP status notifications arrive as a command name, a transaction id,
//! and then one or more objects.  Callers usually only care about a single
//! field of one of those objects (`code`, `level`, `description`), so these
//! functions allow skipping values and scanning object fields in place.

use crate::errors::Amf0DeserializationError;
use crate::markers;

/// Returns the number of bytes one AMF0 value occupies, without decoding it.
///
/// Object-like values are walked recursively.  Truncated input, a malformed
/// object terminator, or a nested value running past the end of the buffer
/// all produce an error.
pub fn tag_size(data: &[u8]) -> Result<usize, Amf0DeserializationError> {
    let marker = match data.first() {
        Some(x) => *x,
        None => return Err(Amf0DeserializationError::UnexpectedEof),
    };

    match marker {
        markers::NUMBER_MARKER => checked_size(data, 9),
        markers::BOOLEAN_MARKER => checked_size(data, 2),
        markers::NULL_MARKER => Ok(1),
        markers::STRING_MARKER => {
            let length = read_u16(data, 1)? as usize;
            checked_size(data, 3 + length)
        }
        markers::OBJECT_MARKER => fields_size(data, 1),
        markers::ECMA_ARRAY_MARKER | markers::STRICT_ARRAY_MARKER => {
            // both array forms carry a 4 byte count before object style fields
            if data.len() < 5 {
                return Err(Amf0DeserializationError::UnexpectedEof);
            }

            fields_size(data, 5)
        }
        _ => Err(Amf0DeserializationError::UnknownMarker { marker }),
    }
}

/// Scans the first object in `data` for the named field, returning its value
/// rendered as a display string: numbers in decimal, booleans as
/// `"true"`/`"false"`, strings verbatim.
///
/// Any values preceding the object (such as a command name and transaction
/// id) are skipped.  Returns `None` when the field is absent, the value is
/// not a renderable primitive, or the bytes are malformed.
pub fn get_field_value(data: &[u8], name: &str) -> Option<String> {
    let mut index = 0;
    while index < data.len()
        && data[index] != markers::OBJECT_MARKER
        && data[index] != markers::ECMA_ARRAY_MARKER
    {
        index += tag_size(&data[index..]).ok()?;
    }

    if index >= data.len() {
        return None;
    }

    if data[index] == markers::ECMA_ARRAY_MARKER {
        index += 4;
    }

    index += 1;
    loop {
        let name_length = read_u16(data, index).ok()? as usize;
        index += 2;
        if name_length == 0 {
            return None;
        }

        if index + name_length > data.len() {
            return None;
        }

        let field = &data[index..index + name_length];
        index += name_length;

        if field == name.as_bytes() {
            return render_value(&data[index..]);
        }

        index += tag_size(&data[index..]).ok()?;
    }
}

fn render_value(data: &[u8]) -> Option<String> {
    match *data.first()? {
        markers::NUMBER_MARKER => {
            if data.len() < 9 {
                return None;
            }

            let mut bits = 0_u64;
            for byte in &data[1..9] {
                bits = (bits << 8) | u64::from(*byte);
            }

            Some(format!("{}", f64::from_bits(bits)))
        }

        markers::BOOLEAN_MARKER => {
            let value = *data.get(1)?;
            Some(if value != 0 { "true" } else { "false" }.to_string())
        }

        markers::STRING_MARKER => {
            let length = read_u16(data, 1).ok()? as usize;
            if 3 + length > data.len() {
                return None;
            }

            String::from_utf8(data[3..3 + length].to_vec()).ok()
        }

        _ => None,
    }
}

fn fields_size(data: &[u8], start: usize) -> Result<usize, Amf0DeserializationError> {
    let mut index = start;
    loop {
        let name_length = read_u16(data, index)? as usize;
        index += 2;

        if name_length == 0 {
            match data.get(index) {
                Some(&markers::OBJECT_END_MARKER) => return Ok(index + 1),
                Some(&marker) => {
                    return Err(Amf0DeserializationError::UnknownMarker { marker });
                }
                None => return Err(Amf0DeserializationError::UnexpectedEof),
            }
        }

        if index + name_length > data.len() {
            return Err(Amf0DeserializationError::UnexpectedEof);
        }

        index += name_length;
        index += tag_size(&data[index..])?;
    }
}

fn checked_size(data: &[u8], size: usize) -> Result<usize, Amf0DeserializationError> {
    if data.len() < size {
        return Err(Amf0DeserializationError::UnexpectedEof);
    }

    Ok(size)
}

fn read_u16(data: &[u8], index: usize) -> Result<u16, Amf0DeserializationError> {
    if index + 2 > data.len() {
        return Err(Amf0DeserializationError::UnexpectedEof);
    }

    Ok(((data[index] as u16) << 8) | data[index + 1] as u16)
}
