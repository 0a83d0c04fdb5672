use crate::messages::PacketType;
use crate::time::RtmpTimestamp;
use bytes::Bytes;

/// Represents one raw RTMP message
#[derive(PartialEq, Debug, Clone)]
pub struct MessagePayload {
    /// The logical multiplexing lane the message travels on.  Independent
    /// of the message stream id; many messages on different streams can
    /// share a channel and vice versa.
    pub channel_id: u32,
    pub timestamp: RtmpTimestamp,
    pub type_id: PacketType,
    /// Auxiliary stream identifier carried by media messages
    pub message_stream_id: u32,
    pub data: Bytes,
}

impl MessagePayload {
    pub fn new() -> MessagePayload {
        MessagePayload {
            channel_id: 0,
            timestamp: RtmpTimestamp::new(0),
            type_id: PacketType::Unknown(0),
            message_stream_id: 0,
            data: Bytes::new(),
        }
    }
}
