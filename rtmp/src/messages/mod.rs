/*!
This module contains the message model shared by the framing layer and the
session layer.

A [`MessagePayload`] is one discrete protocol message: a payload kind, a
timestamp, the multiplexing channel it travels on, the message stream it
belongs to, and opaque payload bytes.  What those bytes mean is up to the
layer that produced or consumes them.
*/

mod message_payload;

pub use self::message_payload::MessagePayload;

/// Channel for protocol level bookkeeping (byte counts, pings, bandwidth)
pub const NETWORK_CHANNEL: u32 = 2;

/// Channel for connection level commands (connect, createStream, ...)
pub const SYSTEM_CHANNEL: u32 = 3;

/// Channel audio data is published on
pub const AUDIO_CHANNEL: u32 = 4;

/// Channel video data is published on
pub const VIDEO_CHANNEL: u32 = 6;

/// Channel for commands scoped to a media stream (play, publish)
pub const SOURCE_CHANNEL: u32 = 8;

/// The kind of payload an RTMP message carries
#[derive(Eq, PartialEq, Debug, Copy, Clone)]
pub enum PacketType {
    /// Announces a change of the sender's maximum chunk payload size
    ChunkSize,

    /// Reports the total number of bytes received so far
    BytesRead,

    /// User control events (stream begin, ping request/response, ...)
    Ping,

    /// Window size after which the peer expects a bytes read report
    ServerBandwidth,

    /// Requests that the receiver limit its output bandwidth
    ClientBandwidth,

    /// Audio data
    Audio,

    /// Video data
    Video,

    /// AMF0 encoded data message (onMetaData and friends)
    Notify,

    /// Shared object events
    SharedObject,

    /// AMF0 encoded command message (invoke)
    Invoke,

    /// A run of FLV records used for stream metadata
    Metadata,

    /// Any type id this implementation does not interpret
    Unknown(u8),
}

impl From<u8> for PacketType {
    fn from(byte: u8) -> PacketType {
        match byte {
            1 => PacketType::ChunkSize,
            3 => PacketType::BytesRead,
            4 => PacketType::Ping,
            5 => PacketType::ServerBandwidth,
            6 => PacketType::ClientBandwidth,
            8 => PacketType::Audio,
            9 => PacketType::Video,
            18 => PacketType::Notify,
            19 => PacketType::SharedObject,
            20 => PacketType::Invoke,
            22 => PacketType::Metadata,
            x => PacketType::Unknown(x),
        }
    }
}

impl From<PacketType> for u8 {
    fn from(packet_type: PacketType) -> u8 {
        match packet_type {
            PacketType::ChunkSize => 1,
            PacketType::BytesRead => 3,
            PacketType::Ping => 4,
            PacketType::ServerBandwidth => 5,
            PacketType::ClientBandwidth => 6,
            PacketType::Audio => 8,
            PacketType::Video => 9,
            PacketType::Notify => 18,
            PacketType::SharedObject => 19,
            PacketType::Invoke => 20,
            PacketType::Metadata => 22,
            PacketType::Unknown(x) => x,
        }
    }
}
