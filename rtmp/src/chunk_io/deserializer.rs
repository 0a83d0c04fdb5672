use super::chunk_header::{ChunkHeader, ChunkHeaderFormat};
use crate::chunk_io::ChunkDeserializationError;
use crate::messages::{MessagePayload, PacketType};
use byteorder::{BigEndian, LittleEndian, ReadBytesExt};
use bytes::BytesMut;
use std::collections::HashMap;
use std::io::Cursor;
use std::mem;

const INITIAL_MAX_CHUNK_SIZE: usize = 128;
const MAX_INITIAL_TIMESTAMP: u32 = 16777215;

/// Deserializes bytes representing RTMP chunks back into RTMP messages.
///
/// The deserializer keeps the read-direction header history, so every byte
/// received from a peer must be fed to the same instance; chunks routinely
/// rely on headers established by earlier chunks.  A message split across
/// several chunks must arrive contiguously, with each follow-up chunk
/// introduced by the one byte continuation marker for the same channel -
/// anything else is a framing error, and no resynchronization is attempted.
pub struct ChunkDeserializer {
    max_chunk_size: usize,
    current_header_format: ChunkHeaderFormat,
    current_header: ChunkHeader,
    current_timestamp_field: u32,
    current_stage: ParseStage,
    current_payload_data: BytesMut,
    buffer: BytesMut,
    previous_headers: HashMap<u32, ChunkHeader>,
}

enum ParsedValue<T> {
    NotEnoughBytes,
    Value { val: T, next_index: u32 },
}

enum ParseStage {
    BasicHeader,
    InitialTimestamp,
    MessageLength,
    MessageTypeId,
    MessageStreamId,
    ExtendedTimestamp,
    MessagePayload,
    ContinuationMarker,
}

#[derive(Eq, PartialEq, Debug)]
enum ParseStageResult {
    Success,
    NotEnoughBytes,
}

impl ChunkDeserializer {
    /// Creates a new `ChunkDeserializer` expecting chunks with the
    /// specification's initial max payload size of 128 bytes.
    pub fn new() -> ChunkDeserializer {
        ChunkDeserializer {
            max_chunk_size: INITIAL_MAX_CHUNK_SIZE,
            current_header_format: ChunkHeaderFormat::Full,
            current_header: ChunkHeader::new(),
            current_timestamp_field: 0,
            current_stage: ParseStage::BasicHeader,
            current_payload_data: BytesMut::new(),
            buffer: BytesMut::with_capacity(4096),
            previous_headers: HashMap::new(),
        }
    }

    /// Attempts to read one complete RTMP message from the passed in bytes.
    ///
    /// Bytes that do not yet form a complete message are buffered and
    /// `Ok(None)` is returned.  If the bytes contain more than one message
    /// only the first is returned; callers should keep invoking this with
    /// an empty slice until `None` comes back, since passing the same bytes
    /// twice corrupts the stream.
    ///
    /// When the peer announces a chunk size change, `set_max_chunk_size`
    /// must be called before the next message is read or payload slicing
    /// will be computed with the wrong bounds.
    pub fn get_next_message(
        &mut self,
        bytes: &[u8],
    ) -> Result<Option<MessagePayload>, ChunkDeserializationError> {
        self.buffer.extend_from_slice(bytes);

        loop {
            let mut complete_message = None;
            let result = match self.current_stage {
                ParseStage::BasicHeader => self.form_header()?,
                ParseStage::InitialTimestamp => self.get_initial_timestamp()?,
                ParseStage::MessageLength => self.get_message_length()?,
                ParseStage::MessageTypeId => self.get_message_type_id()?,
                ParseStage::MessageStreamId => self.get_message_stream_id()?,
                ParseStage::ExtendedTimestamp => self.get_extended_timestamp()?,
                ParseStage::MessagePayload => self.get_message_data(&mut complete_message)?,
                ParseStage::ContinuationMarker => self.get_continuation_marker()?,
            };

            if result == ParseStageResult::NotEnoughBytes || complete_message.is_some() {
                return Ok(complete_message);
            }
        }
    }

    /// Tells the deserializer that the peer will start sending chunks with
    /// a different max payload size.  Should only be called in reaction to
    /// a chunk size message from the peer.
    pub fn set_max_chunk_size(&mut self, new_size: usize) -> Result<(), ChunkDeserializationError> {
        if new_size == 0 || new_size > 2147483647 {
            return Err(ChunkDeserializationError::InvalidMaxChunkSize {
                chunk_size: new_size,
            });
        }

        self.max_chunk_size = new_size;
        Ok(())
    }

    pub fn max_chunk_size(&self) -> usize {
        self.max_chunk_size
    }

    fn form_header(&mut self) -> Result<ParseStageResult, ChunkDeserializationError> {
        if self.buffer.is_empty() {
            return Ok(ParseStageResult::NotEnoughBytes);
        }

        let format = get_format(self.buffer[0]);
        let (csid, next_index) = match get_csid(&self.buffer[..]) {
            ParsedValue::NotEnoughBytes => return Ok(ParseStageResult::NotEnoughBytes),
            ParsedValue::Value { val, next_index } => (val, next_index),
        };

        self.current_header = match format {
            ChunkHeaderFormat::Full => {
                let mut new_header = ChunkHeader::new();
                new_header.channel_id = csid;
                new_header
            }

            // compressed headers resolve their missing fields from the
            // channel's previous header
            _ => match self.previous_headers.remove(&csid) {
                None => return Err(ChunkDeserializationError::NoPreviousChunkOnStream { csid }),
                Some(header) => header,
            },
        };

        self.current_header_format = format;
        let _ = self.buffer.split_to(next_index as usize);
        self.current_stage = ParseStage::InitialTimestamp;
        Ok(ParseStageResult::Success)
    }

    fn get_initial_timestamp(&mut self) -> Result<ParseStageResult, ChunkDeserializationError> {
        if self.current_header_format == ChunkHeaderFormat::Empty {
            // no timestamp field at all; the previous delta is reused verbatim
            self.current_header.timestamp =
                self.current_header.timestamp + self.current_header.timestamp_delta;
            self.current_stage = ParseStage::MessageLength;
            return Ok(ParseStageResult::Success);
        }

        if self.buffer.len() < 3 {
            return Ok(ParseStageResult::NotEnoughBytes);
        }

        {
            let bytes = self.buffer.split_to(3);
            let mut cursor = Cursor::new(bytes);
            self.current_timestamp_field = cursor.read_u24::<BigEndian>()?;
        }

        self.current_stage = ParseStage::MessageLength;
        Ok(ParseStageResult::Success)
    }

    fn get_message_length(&mut self) -> Result<ParseStageResult, ChunkDeserializationError> {
        if self.current_header_format == ChunkHeaderFormat::TimeDeltaOnly
            || self.current_header_format == ChunkHeaderFormat::Empty
        {
            self.current_stage = ParseStage::MessageTypeId;
            return Ok(ParseStageResult::Success);
        }

        if self.buffer.len() < 3 {
            return Ok(ParseStageResult::NotEnoughBytes);
        }

        {
            let bytes = self.buffer.split_to(3);
            let mut cursor = Cursor::new(bytes);
            self.current_header.message_length = cursor.read_u24::<BigEndian>()?;
        }

        self.current_stage = ParseStage::MessageTypeId;
        Ok(ParseStageResult::Success)
    }

    fn get_message_type_id(&mut self) -> Result<ParseStageResult, ChunkDeserializationError> {
        if self.current_header_format == ChunkHeaderFormat::TimeDeltaOnly
            || self.current_header_format == ChunkHeaderFormat::Empty
        {
            self.current_stage = ParseStage::MessageStreamId;
            return Ok(ParseStageResult::Success);
        }

        if self.buffer.is_empty() {
            return Ok(ParseStageResult::NotEnoughBytes);
        }

        self.current_header.type_id = PacketType::from(self.buffer[0]);
        let _ = self.buffer.split_to(1);
        self.current_stage = ParseStage::MessageStreamId;
        Ok(ParseStageResult::Success)
    }

    fn get_message_stream_id(&mut self) -> Result<ParseStageResult, ChunkDeserializationError> {
        if self.current_header_format != ChunkHeaderFormat::Full {
            self.current_stage = ParseStage::ExtendedTimestamp;
            return Ok(ParseStageResult::Success);
        }

        if self.buffer.len() < 4 {
            return Ok(ParseStageResult::NotEnoughBytes);
        }

        {
            let bytes = self.buffer.split_to(4);
            let mut cursor = Cursor::new(bytes);
            self.current_header.message_stream_id = cursor.read_u32::<LittleEndian>()?;
        }

        self.current_stage = ParseStage::ExtendedTimestamp;
        Ok(ParseStageResult::Success)
    }

    fn get_extended_timestamp(&mut self) -> Result<ParseStageResult, ChunkDeserializationError> {
        if self.current_header_format == ChunkHeaderFormat::Empty {
            self.current_stage = ParseStage::MessagePayload;
            return Ok(ParseStageResult::Success);
        }

        let mut field = self.current_timestamp_field;
        if field == MAX_INITIAL_TIMESTAMP {
            // sentinel value: the real time is in a 4 byte field that follows
            if self.buffer.len() < 4 {
                return Ok(ParseStageResult::NotEnoughBytes);
            }

            let bytes = self.buffer.split_to(4);
            let mut cursor = Cursor::new(bytes);
            field = cursor.read_u32::<BigEndian>()?;
        }

        if self.current_header_format == ChunkHeaderFormat::Full {
            self.current_header.timestamp.set(field);
            self.current_header.timestamp_delta = 0;
        } else {
            self.current_header.timestamp = self.current_header.timestamp + field;
            self.current_header.timestamp_delta = field;
        }

        self.current_stage = ParseStage::MessagePayload;
        Ok(ParseStageResult::Success)
    }

    fn get_message_data(
        &mut self,
        message_to_return: &mut Option<MessagePayload>,
    ) -> Result<ParseStageResult, ChunkDeserializationError> {
        let total_length = self.current_header.message_length as usize;
        let remaining = total_length - self.current_payload_data.len();
        let slice_length = std::cmp::min(remaining, self.max_chunk_size);

        if self.buffer.len() < slice_length {
            return Ok(ParseStageResult::NotEnoughBytes);
        }

        let bytes = self.buffer.split_to(slice_length);
        self.current_payload_data.extend_from_slice(&bytes[..]);

        if self.current_payload_data.len() < total_length {
            // more chunks must follow, each introduced by a continuation marker
            self.current_stage = ParseStage::ContinuationMarker;
            return Ok(ParseStageResult::Success);
        }

        let data = mem::replace(&mut self.current_payload_data, BytesMut::new());
        let header = mem::replace(&mut self.current_header, ChunkHeader::new());

        *message_to_return = Some(MessagePayload {
            channel_id: header.channel_id,
            timestamp: header.timestamp,
            type_id: header.type_id,
            message_stream_id: header.message_stream_id,
            data: data.freeze(),
        });

        // cycle the completed header into the history so the next message on
        // this channel can compress against all of its fields
        self.previous_headers.insert(header.channel_id, header);
        self.current_stage = ParseStage::BasicHeader;
        Ok(ParseStageResult::Success)
    }

    fn get_continuation_marker(&mut self) -> Result<ParseStageResult, ChunkDeserializationError> {
        if self.buffer.is_empty() {
            return Ok(ParseStageResult::NotEnoughBytes);
        }

        let first_byte = self.buffer[0];
        let format = get_format(first_byte);
        let (csid, next_index) = match get_csid(&self.buffer[..]) {
            ParsedValue::NotEnoughBytes => return Ok(ParseStageResult::NotEnoughBytes),
            ParsedValue::Value { val, next_index } => (val, next_index),
        };

        if format != ChunkHeaderFormat::Empty || csid != self.current_header.channel_id {
            return Err(ChunkDeserializationError::InvalidContinuationMarker {
                expected_csid: self.current_header.channel_id,
                first_byte,
            });
        }

        let _ = self.buffer.split_to(next_index as usize);
        self.current_stage = ParseStage::MessagePayload;
        Ok(ParseStageResult::Success)
    }
}

fn get_format(byte: u8) -> ChunkHeaderFormat {
    const TYPE_0_MASK: u8 = 0b00000000;
    const TYPE_1_MASK: u8 = 0b01000000;
    const TYPE_2_MASK: u8 = 0b10000000;
    const FORMAT_MASK: u8 = 0b11000000;

    match byte & FORMAT_MASK {
        TYPE_0_MASK => ChunkHeaderFormat::Full,
        TYPE_1_MASK => ChunkHeaderFormat::TimeDeltaWithoutMessageStreamId,
        TYPE_2_MASK => ChunkHeaderFormat::TimeDeltaOnly,
        _ => ChunkHeaderFormat::Empty,
    }
}

fn get_csid(buffer: &[u8]) -> ParsedValue<u32> {
    const CSID_MASK: u8 = 0b00111111;

    if buffer.is_empty() {
        return ParsedValue::NotEnoughBytes;
    }

    match buffer[0] & CSID_MASK {
        0 => {
            if buffer.len() < 2 {
                ParsedValue::NotEnoughBytes
            } else {
                ParsedValue::Value {
                    val: buffer[1] as u32 + 64,
                    next_index: 2,
                }
            }
        }

        1 => {
            if buffer.len() < 3 {
                ParsedValue::NotEnoughBytes
            } else {
                ParsedValue::Value {
                    val: (buffer[2] as u32 * 256) + buffer[1] as u32 + 64,
                    next_index: 3,
                }
            }
        }

        x => ParsedValue::Value {
            val: x as u32,
            next_index: 1,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chunk_io::ChunkSerializer;
    use crate::time::RtmpTimestamp;
    use byteorder::{BigEndian, LittleEndian, WriteBytesExt};
    use bytes::Bytes;
    use std::io::{Cursor, Write};

    #[test]
    fn can_read_type_0_chunk_with_small_chunk_stream_id() {
        let bytes = form_type_0_chunk(50, 25, 5, 3, &[1, 2, 3], INITIAL_MAX_CHUNK_SIZE);

        let mut deserializer = ChunkDeserializer::new();
        let result = deserializer.get_next_message(&bytes).unwrap().unwrap();

        assert_eq!(result.channel_id, 50, "Incorrect channel id");
        assert_eq!(result.type_id, PacketType::BytesRead, "Incorrect type id");
        assert_eq!(result.timestamp, RtmpTimestamp::new(25), "Incorrect timestamp");
        assert_eq!(result.message_stream_id, 5, "Incorrect message stream id");
        assert_eq!(&result.data[..], &[1, 2, 3], "Incorrect data");
    }

    #[test]
    fn can_read_type_0_chunk_with_medium_chunk_stream_id() {
        let bytes = form_type_0_chunk(500, 25, 5, 3, &[1, 2, 3], INITIAL_MAX_CHUNK_SIZE);

        let mut deserializer = ChunkDeserializer::new();
        let result = deserializer.get_next_message(&bytes).unwrap().unwrap();

        assert_eq!(result.channel_id, 500, "Incorrect channel id");
        assert_eq!(&result.data[..], &[1, 2, 3], "Incorrect data");
    }

    #[test]
    fn can_read_type_0_chunk_with_large_chunk_stream_id() {
        let bytes = form_type_0_chunk(50000, 25, 5, 3, &[1, 2, 3], INITIAL_MAX_CHUNK_SIZE);

        let mut deserializer = ChunkDeserializer::new();
        let result = deserializer.get_next_message(&bytes).unwrap().unwrap();

        assert_eq!(result.channel_id, 50000, "Incorrect channel id");
        assert_eq!(&result.data[..], &[1, 2, 3], "Incorrect data");
    }

    #[test]
    fn can_read_type_0_chunk_with_extended_timestamp() {
        let bytes = form_type_0_chunk(50, 16777216, 5, 3, &[1, 2, 3], INITIAL_MAX_CHUNK_SIZE);

        let mut deserializer = ChunkDeserializer::new();
        let result = deserializer.get_next_message(&bytes).unwrap().unwrap();

        assert_eq!(result.timestamp, RtmpTimestamp::new(16777216), "Incorrect timestamp");
        assert_eq!(&result.data[..], &[1, 2, 3], "Incorrect data");
    }

    #[test]
    fn can_read_type_1_chunk_applying_delta() {
        let chunk_0_bytes = form_type_0_chunk(50, 25, 5, 3, &[1, 2, 3], INITIAL_MAX_CHUNK_SIZE);
        let chunk_1_bytes = form_type_1_chunk(50, 10, 4, &[1, 2, 3]);

        let mut deserializer = ChunkDeserializer::new();
        let _ = deserializer.get_next_message(&chunk_0_bytes).unwrap().unwrap();
        let result = deserializer.get_next_message(&chunk_1_bytes).unwrap().unwrap();

        assert_eq!(result.type_id, PacketType::Ping, "Incorrect type id");
        assert_eq!(result.timestamp, RtmpTimestamp::new(35), "Incorrect timestamp");
        assert_eq!(result.message_stream_id, 5, "Incorrect message stream id");
    }

    #[test]
    fn can_read_type_2_chunk_inheriting_length_and_type() {
        let chunk_0_bytes = form_type_0_chunk(50, 25, 5, 3, &[1, 2, 3], INITIAL_MAX_CHUNK_SIZE);
        let chunk_1_bytes = form_type_1_chunk(50, 10, 4, &[1, 2, 3]);
        let chunk_2_bytes = form_type_2_chunk(50, 11, &[4, 5, 6]);

        let mut deserializer = ChunkDeserializer::new();
        let _ = deserializer.get_next_message(&chunk_0_bytes).unwrap().unwrap();
        let _ = deserializer.get_next_message(&chunk_1_bytes).unwrap().unwrap();
        let result = deserializer.get_next_message(&chunk_2_bytes).unwrap().unwrap();

        assert_eq!(result.type_id, PacketType::Ping, "Incorrect type id");
        assert_eq!(result.timestamp, RtmpTimestamp::new(46), "Incorrect timestamp");
        assert_eq!(&result.data[..], &[4, 5, 6], "Incorrect data");
    }

    #[test]
    fn can_read_type_3_chunk_inheriting_delta() {
        let chunk_0_bytes = form_type_0_chunk(50, 25, 5, 3, &[1, 2, 3], INITIAL_MAX_CHUNK_SIZE);
        let chunk_1_bytes = form_type_1_chunk(50, 10, 4, &[1, 2, 3]);
        let chunk_2_bytes = form_type_2_chunk(50, 11, &[4, 5, 6]);
        let chunk_3_bytes = form_type_3_chunk(50, &[7, 8, 9]);

        let mut deserializer = ChunkDeserializer::new();
        let _ = deserializer.get_next_message(&chunk_0_bytes).unwrap().unwrap();
        let _ = deserializer.get_next_message(&chunk_1_bytes).unwrap().unwrap();
        let _ = deserializer.get_next_message(&chunk_2_bytes).unwrap().unwrap();
        let result = deserializer.get_next_message(&chunk_3_bytes).unwrap().unwrap();

        assert_eq!(result.type_id, PacketType::Ping, "Incorrect type id");
        assert_eq!(result.timestamp, RtmpTimestamp::new(57), "Incorrect timestamp");
        assert_eq!(&result.data[..], &[7, 8, 9], "Incorrect data");
    }

    #[test]
    fn can_read_message_spread_across_multiple_deserialization_calls() {
        let all_bytes = form_type_0_chunk(50, 25, 5, 3, &[1, 2, 3], INITIAL_MAX_CHUNK_SIZE);
        let (first, second) = all_bytes.split_at(all_bytes.len() / 2);

        let mut deserializer = ChunkDeserializer::new();
        match deserializer.get_next_message(first).unwrap() {
            Some(x) => panic!("Expected None but received {:?}", x),
            None => (),
        };

        let result = deserializer.get_next_message(second).unwrap().unwrap();
        assert_eq!(&result.data[..], &[1, 2, 3], "Incorrect data");
    }

    #[test]
    fn can_read_message_exceeding_maximum_chunk_size() {
        let payload = [100_u8; 500];
        let bytes = form_type_0_chunk(50, 25, 5, 3, &payload, 100);

        let mut deserializer = ChunkDeserializer::new();
        deserializer.set_max_chunk_size(100).unwrap();
        let result = deserializer.get_next_message(&bytes).unwrap().unwrap();

        assert_eq!(result.timestamp, RtmpTimestamp::new(25), "Incorrect timestamp");
        assert_eq!(&result.data[..], &payload[..], "Incorrect data");
    }

    #[test]
    fn error_when_continuation_marker_is_missing() {
        // payload of 5 with a chunk size of 4 requires a continuation marker
        // after the fourth byte, which this byte stream does not contain
        let mut cursor = Cursor::new(Vec::new());
        cursor.write_u8(50).unwrap();
        cursor.write_u24::<BigEndian>(25).unwrap();
        cursor.write_u24::<BigEndian>(5).unwrap();
        cursor.write_u8(9).unwrap();
        cursor.write_u32::<LittleEndian>(1).unwrap();
        cursor.write_all(&[1, 2, 3, 4, 5]).unwrap();

        let mut deserializer = ChunkDeserializer::new();
        deserializer.set_max_chunk_size(4).unwrap();
        match deserializer.get_next_message(&cursor.into_inner()) {
            Err(ChunkDeserializationError::InvalidContinuationMarker {
                expected_csid: 50,
                first_byte: 5,
            }) => (),
            x => panic!("Expected InvalidContinuationMarker error, instead got {:?}", x),
        }
    }

    #[test]
    fn error_when_continuation_marker_has_wrong_channel() {
        let mut cursor = Cursor::new(Vec::new());
        cursor.write_u8(50).unwrap();
        cursor.write_u24::<BigEndian>(25).unwrap();
        cursor.write_u24::<BigEndian>(5).unwrap();
        cursor.write_u8(9).unwrap();
        cursor.write_u32::<LittleEndian>(1).unwrap();
        cursor.write_all(&[1, 2, 3, 4]).unwrap();
        cursor.write_u8(0b11000000 | 51).unwrap();
        cursor.write_all(&[5]).unwrap();

        let mut deserializer = ChunkDeserializer::new();
        deserializer.set_max_chunk_size(4).unwrap();
        match deserializer.get_next_message(&cursor.into_inner()) {
            Err(ChunkDeserializationError::InvalidContinuationMarker {
                expected_csid: 50,
                ..
            }) => (),
            x => panic!("Expected InvalidContinuationMarker error, instead got {:?}", x),
        }
    }

    #[test]
    fn error_when_compressed_header_arrives_with_no_history() {
        let bytes = form_type_2_chunk(50, 11, &[1, 2, 3]);

        let mut deserializer = ChunkDeserializer::new();
        match deserializer.get_next_message(&bytes) {
            Err(ChunkDeserializationError::NoPreviousChunkOnStream { csid: 50 }) => (),
            x => panic!("Expected NoPreviousChunkOnStream error, instead got {:?}", x),
        }
    }

    #[test]
    fn error_when_setting_chunk_size_too_large() {
        const CHUNK_SIZE_VALUE: usize = 2147483648;
        let mut deserializer = ChunkDeserializer::new();
        match deserializer.set_max_chunk_size(CHUNK_SIZE_VALUE) {
            Err(ChunkDeserializationError::InvalidMaxChunkSize {
                chunk_size: CHUNK_SIZE_VALUE,
            }) => (),
            x => panic!("Unexpected set max chunk size result of {:?}", x),
        }
    }

    #[test]
    fn serialized_messages_round_trip_for_any_channel_and_chunk_size() {
        for &csid in &[2_u32, 50, 319, 320, 50000] {
            for &chunk_size in &[1_u32, 7, 128, 4096] {
                let mut serializer = ChunkSerializer::new();
                let mut deserializer = ChunkDeserializer::new();
                serializer.set_max_chunk_size(chunk_size).unwrap();
                deserializer.set_max_chunk_size(chunk_size as usize).unwrap();

                let messages = vec![
                    test_message(csid, 100, PacketType::Video, 5, vec![1; 300]),
                    test_message(csid, 150, PacketType::Video, 5, vec![2; 300]),
                    test_message(csid, 200, PacketType::Video, 5, vec![3; 300]),
                    test_message(csid, 16777400, PacketType::Audio, 5, vec![4; 10]),
                ];

                for message in messages {
                    let bytes = serializer.serialize(&message, false).unwrap();
                    let result = deserializer
                        .get_next_message(&bytes)
                        .unwrap()
                        .unwrap_or_else(|| {
                            panic!("No message returned for csid {} chunk size {}", csid, chunk_size)
                        });

                    assert_eq!(result, message, "Round trip failed for csid {} chunk size {}", csid, chunk_size);
                }
            }
        }
    }

    #[test]
    fn can_read_zero_length_message() {
        let bytes = form_type_0_chunk(50, 25, 5, 3, &[], INITIAL_MAX_CHUNK_SIZE);

        let mut deserializer = ChunkDeserializer::new();
        let result = deserializer.get_next_message(&bytes).unwrap().unwrap();

        assert_eq!(result.data.len(), 0, "Expected an empty payload");
    }

    fn test_message(
        channel_id: u32,
        timestamp: u32,
        type_id: PacketType,
        message_stream_id: u32,
        data: Vec<u8>,
    ) -> MessagePayload {
        MessagePayload {
            channel_id,
            timestamp: RtmpTimestamp::new(timestamp),
            type_id,
            message_stream_id,
            data: Bytes::from(data),
        }
    }

    fn write_basic_header(cursor: &mut Cursor<Vec<u8>>, format_mask: u8, csid: u32) {
        if csid < 64 {
            cursor.write_u8(format_mask | csid as u8).unwrap();
        } else if csid < 320 {
            cursor.write_u8(format_mask).unwrap();
            cursor.write_u8((csid - 64) as u8).unwrap();
        } else {
            cursor.write_u8(format_mask | 1).unwrap();
            cursor.write_u16::<LittleEndian>((csid - 64) as u16).unwrap();
        }
    }

    fn form_type_0_chunk(
        csid: u32,
        timestamp: u32,
        message_stream_id: u32,
        type_id: u8,
        payload: &[u8],
        max_chunk_length: usize,
    ) -> Vec<u8> {
        let mut cursor = Cursor::new(Vec::new());
        write_basic_header(&mut cursor, 0b00000000, csid);

        let standard_timestamp = if timestamp >= 16777215 {
            16777215
        } else {
            timestamp
        };
        cursor.write_u24::<BigEndian>(standard_timestamp).unwrap();
        cursor.write_u24::<BigEndian>(payload.len() as u32).unwrap();
        cursor.write_u8(type_id).unwrap();
        cursor.write_u32::<LittleEndian>(message_stream_id).unwrap();

        if timestamp >= 16777215 {
            cursor.write_u32::<BigEndian>(timestamp).unwrap();
        }

        // slices beyond the first need a continuation marker between them
        for (index, slice) in payload.chunks(max_chunk_length).enumerate() {
            if index > 0 {
                write_basic_header(&mut cursor, 0b11000000, csid);
            }

            cursor.write_all(slice).unwrap();
        }

        cursor.into_inner()
    }

    fn form_type_1_chunk(csid: u32, delta: u32, type_id: u8, payload: &[u8]) -> Vec<u8> {
        let mut cursor = Cursor::new(Vec::new());
        write_basic_header(&mut cursor, 0b01000000, csid);
        cursor.write_u24::<BigEndian>(delta).unwrap();
        cursor.write_u24::<BigEndian>(payload.len() as u32).unwrap();
        cursor.write_u8(type_id).unwrap();
        cursor.write_all(payload).unwrap();

        cursor.into_inner()
    }

    fn form_type_2_chunk(csid: u32, delta: u32, payload: &[u8]) -> Vec<u8> {
        let mut cursor = Cursor::new(Vec::new());
        write_basic_header(&mut cursor, 0b10000000, csid);
        cursor.write_u24::<BigEndian>(delta).unwrap();
        cursor.write_all(payload).unwrap();

        cursor.into_inner()
    }

    fn form_type_3_chunk(csid: u32, payload: &[u8]) -> Vec<u8> {
        let mut cursor = Cursor::new(Vec::new());
        write_basic_header(&mut cursor, 0b11000000, csid);
        cursor.write_all(payload).unwrap();

        cursor.into_inner()
    }
}
