use crate::chunk_io::{ChunkDeserializationError, ChunkSerializationError};
use crate::handshake::HandshakeError;
use crate::sessions::ClientState;
use std::io;
use strobe_amf0::{Amf0DeserializationError, Amf0SerializationError};
use thiserror::Error;

/// Represents the type of error a client session can encounter
#[derive(Debug, Error)]
pub enum ClientSessionError {
    /// Encountered when an error occurs while deserializing incoming chunks
    #[error("An error occurred deserializing incoming data: {0}")]
    ChunkDeserializationError(#[from] ChunkDeserializationError),

    /// Encountered when an error occurs while serializing outbound messages
    #[error("An error occurred serializing outbound messages: {0}")]
    ChunkSerializationError(#[from] ChunkSerializationError),

    /// Encountered when a command payload cannot be encoded
    #[error("An error occurred encoding a command payload: {0}")]
    Amf0SerializationError(#[from] Amf0SerializationError),

    /// Encountered when a command payload sent by the server cannot be decoded
    #[error("An error occurred decoding a command payload: {0}")]
    Amf0DeserializationError(#[from] Amf0DeserializationError),

    #[error("The handshake failed: {0}")]
    HandshakeError(#[from] HandshakeError),

    #[error("An IO error occurred on the transport: {0}")]
    Io(#[from] io::Error),

    /// The peer closed the transport mid conversation
    #[error("The transport was closed by the peer")]
    ConnectionClosed,

    /// Encountered if a request is made, or a response is received, while
    /// the session is not in a valid state for it
    #[error("The request could not be performed while the session is in the {current_state:?} state")]
    SessionInInvalidState { current_state: ClientState },

    /// A control packet was shorter than its fixed fields
    #[error("Received a type {type_id} packet of {size} bytes, shorter than its fixed fields")]
    PayloadTooShort { type_id: u8, size: usize },

    /// The peer announced a chunk size no conforming implementation may use
    #[error("The peer announced an invalid chunk size of {size}")]
    InvalidChunkSize { size: u32 },

    /// The peer announced a zero bandwidth window
    #[error("The peer announced an invalid window size of {size}")]
    InvalidWindowSize { size: u32 },

    /// A response to createStream should carry the allocated stream id as a
    /// numeric argument.  Without it there is no way to address the stream
    /// for playback or publishing.
    #[error("The server sent a create stream success result without a stream id")]
    CreateStreamResponseHadNoStreamNumber,

    /// The server replied to a command with an error, or reported an error
    /// status on the stream
    #[error("The server reported an error: {description}")]
    ServerError { description: String },

    /// The server ended the stream before playback or publishing began
    #[error("The stream was stopped before playback or publishing could begin")]
    StoppedBeforeStart,
}
