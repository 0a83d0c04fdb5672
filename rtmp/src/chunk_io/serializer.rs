use super::chunk_header::{ChunkHeader, ChunkHeaderFormat};
use crate::chunk_io::ChunkSerializationError;
use crate::messages::MessagePayload;
use byteorder::{BigEndian, LittleEndian, WriteBytesExt};
use std::cmp::min;
use std::collections::HashMap;
use std::io::{Cursor, Write};

const INITIAL_MAX_CHUNK_SIZE: u32 = 128;
const MAX_INITIAL_TIMESTAMP: u32 = 16777215;
const MAX_MESSAGE_LENGTH: usize = 16777215;

/// Serializes RTMP messages into RTMP chunks.
///
/// The serializer keeps the write-direction header history: for every
/// channel the full header of the last message sent on it.  When the next
/// message on a channel repeats fields of the previous one, a smaller
/// header encoding is chosen and the receiver reconstructs the omitted
/// fields from its own copy of the history.  Because of this, all messages
/// for one peer must go through the same serializer instance.
pub struct ChunkSerializer {
    previous_headers: HashMap<u32, ChunkHeader>,
    max_chunk_size: u32,
}

impl ChunkSerializer {
    /// Creates a new `ChunkSerializer`.
    ///
    /// Per the RTMP specification the serializer starts with a max chunk
    /// payload size of 128 bytes.
    pub fn new() -> ChunkSerializer {
        ChunkSerializer {
            previous_headers: HashMap::new(),
            max_chunk_size: INITIAL_MAX_CHUNK_SIZE,
        }
    }

    /// Changes the maximum number of payload bytes placed in a single
    /// chunk.  The peer must have been told about the change (via a chunk
    /// size message) or it will fail to deserialize everything after it.
    pub fn set_max_chunk_size(&mut self, new_size: u32) -> Result<(), ChunkSerializationError> {
        if new_size == 0 || new_size > 2147483647 {
            return Err(ChunkSerializationError::InvalidMaxChunkSize {
                chunk_size: new_size,
            });
        }

        self.max_chunk_size = new_size;
        Ok(())
    }

    pub fn max_chunk_size(&self) -> u32 {
        self.max_chunk_size
    }

    /// Turns an RTMP message into the bytes of one or more RTMP chunks,
    /// ready to be sent over the transport.
    ///
    /// The smallest header encoding the receiver can unambiguously
    /// interpret is selected automatically.  Setting `force_uncompressed`
    /// bypasses the compression and always emits a full 12 byte header;
    /// some servers and encoders require that for the first message of a
    /// stream even when a compressed header would be decodable.
    pub fn serialize(
        &mut self,
        message: &MessagePayload,
        force_uncompressed: bool,
    ) -> Result<Vec<u8>, ChunkSerializationError> {
        if message.data.len() > MAX_MESSAGE_LENGTH {
            return Err(ChunkSerializationError::MessageTooLong {
                size: message.data.len() as u32,
            });
        }

        if message.channel_id < 2 || message.channel_id > 65599 {
            return Err(ChunkSerializationError::InvalidChannelId {
                channel_id: message.channel_id,
            });
        }

        let mut header = ChunkHeader {
            channel_id: message.channel_id,
            timestamp: message.timestamp,
            timestamp_delta: 0,
            message_length: message.data.len() as u32,
            type_id: message.type_id,
            message_stream_id: message.message_stream_id,
        };

        let format = if force_uncompressed {
            ChunkHeaderFormat::Full
        } else {
            match self.previous_headers.get(&header.channel_id) {
                None => ChunkHeaderFormat::Full,
                Some(previous_header) => {
                    header.timestamp_delta = (message.timestamp - previous_header.timestamp).value;
                    get_header_format(&header, previous_header)
                }
            }
        };

        if format == ChunkHeaderFormat::Full {
            // a full header transmits an absolute time, so the recorded
            // delta restarts at zero on both sides
            header.timestamp_delta = 0;
        }

        let mut bytes = Cursor::new(Vec::new());
        add_basic_header(&mut bytes, format, header.channel_id)?;
        add_initial_timestamp(&mut bytes, format, &header)?;
        add_message_length_and_type_id(&mut bytes, format, &header)?;
        add_message_stream_id(&mut bytes, format, &header)?;
        add_extended_timestamp(&mut bytes, format, &header)?;

        // Payloads larger than the max chunk size are split into slices,
        // each after the first preceded by a continuation marker (the one
        // byte header form for the same channel).
        for (index, slice) in message.data.chunks(self.max_chunk_size as usize).enumerate() {
            if index > 0 {
                add_basic_header(&mut bytes, ChunkHeaderFormat::Empty, header.channel_id)?;
            }

            bytes.write_all(slice)?;
        }

        self.previous_headers.insert(header.channel_id, header);
        Ok(bytes.into_inner())
    }
}

fn get_header_format(current_header: &ChunkHeader, previous_header: &ChunkHeader) -> ChunkHeaderFormat {
    if current_header.message_stream_id != previous_header.message_stream_id {
        return ChunkHeaderFormat::Full;
    }

    if current_header.type_id != previous_header.type_id
        || current_header.message_length != previous_header.message_length
    {
        return ChunkHeaderFormat::TimeDeltaWithoutMessageStreamId;
    }

    if current_header.timestamp_delta != previous_header.timestamp_delta {
        return ChunkHeaderFormat::TimeDeltaOnly;
    }

    ChunkHeaderFormat::Empty
}

fn add_basic_header(
    bytes: &mut dyn Write,
    format: ChunkHeaderFormat,
    csid: u32,
) -> Result<(), ChunkSerializationError> {
    let format_mask = match format {
        ChunkHeaderFormat::Full => 0b00000000,
        ChunkHeaderFormat::TimeDeltaWithoutMessageStreamId => 0b01000000,
        ChunkHeaderFormat::TimeDeltaOnly => 0b10000000,
        ChunkHeaderFormat::Empty => 0b11000000,
    };

    if csid <= 63 {
        bytes.write_u8(format_mask | csid as u8)?;
    } else if csid <= 319 {
        // escape 0: one following byte holds csid - 64
        bytes.write_u8(format_mask)?;
        bytes.write_u8((csid - 64) as u8)?;
    } else {
        // escape 1: two following little endian bytes hold csid - 64
        bytes.write_u8(format_mask | 1)?;
        bytes.write_u16::<LittleEndian>((csid - 64) as u16)?;
    }

    Ok(())
}

fn add_initial_timestamp(
    bytes: &mut dyn Write,
    format: ChunkHeaderFormat,
    header: &ChunkHeader,
) -> Result<(), ChunkSerializationError> {
    if format == ChunkHeaderFormat::Empty {
        return Ok(());
    }

    let value = timestamp_field_value(format, header);
    bytes.write_u24::<BigEndian>(min(value, MAX_INITIAL_TIMESTAMP))?;
    Ok(())
}

fn add_message_length_and_type_id(
    bytes: &mut dyn Write,
    format: ChunkHeaderFormat,
    header: &ChunkHeader,
) -> Result<(), ChunkSerializationError> {
    if format == ChunkHeaderFormat::Empty || format == ChunkHeaderFormat::TimeDeltaOnly {
        return Ok(());
    }

    bytes.write_u24::<BigEndian>(header.message_length)?;
    bytes.write_u8(header.type_id.into())?;
    Ok(())
}

fn add_message_stream_id(
    bytes: &mut dyn Write,
    format: ChunkHeaderFormat,
    header: &ChunkHeader,
) -> Result<(), ChunkSerializationError> {
    if format != ChunkHeaderFormat::Full {
        return Ok(());
    }

    bytes.write_u32::<LittleEndian>(header.message_stream_id)?;
    Ok(())
}

fn add_extended_timestamp(
    bytes: &mut dyn Write,
    format: ChunkHeaderFormat,
    header: &ChunkHeader,
) -> Result<(), ChunkSerializationError> {
    if format == ChunkHeaderFormat::Empty {
        return Ok(());
    }

    let value = timestamp_field_value(format, header);
    if value < MAX_INITIAL_TIMESTAMP {
        return Ok(());
    }

    bytes.write_u32::<BigEndian>(value)?;
    Ok(())
}

fn timestamp_field_value(format: ChunkHeaderFormat, header: &ChunkHeader) -> u32 {
    match format {
        ChunkHeaderFormat::Full => header.timestamp.value,
        _ => header.timestamp_delta,
    }
}
