use crate::messages::PacketType;
use crate::time::RtmpTimestamp;

/// The four chunk header encodings, from largest to smallest.  Every field
/// a smaller encoding omits is inherited from the previous message on the
/// same channel.
#[derive(Eq, PartialEq, Debug, Copy, Clone)]
pub enum ChunkHeaderFormat {
    /// Format 0, 12 byte header: timestamp, length, type, and stream id
    Full,

    /// Format 1, 8 byte header: timestamp delta, length, and type
    TimeDeltaWithoutMessageStreamId,

    /// Format 2, 4 byte header: timestamp delta only
    TimeDeltaOnly,

    /// Format 3, 1 byte header: everything inherited
    Empty,
}

/// One per-channel history entry: the full header of the last message that
/// was read or written on that channel, used to resolve the inherited
/// fields of compressed headers.
#[derive(Debug, Clone)]
pub struct ChunkHeader {
    pub channel_id: u32,
    /// Absolute time of the last message
    pub timestamp: RtmpTimestamp,
    /// The delta the last message's timestamp field carried (zero after a
    /// full header, which transmits an absolute time instead)
    pub timestamp_delta: u32,
    pub message_length: u32,
    pub type_id: PacketType,
    pub message_stream_id: u32,
}

impl ChunkHeader {
    pub fn new() -> ChunkHeader {
        ChunkHeader {
            channel_id: 0,
            timestamp: RtmpTimestamp::new(0),
            timestamp_delta: 0,
            message_length: 0,
            type_id: PacketType::Unknown(0),
            message_stream_id: 0,
        }
    }
}
