use std::io;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ChunkSerializationError {
    /// A message payload must fit the 24 bit length field
    #[error("The message payload was {size} bytes but only 16,777,215 bytes are supported")]
    MessageTooLong { size: u32 },

    /// Channel ids 0 and 1 are escape codes in the wire format and ids
    /// above 65599 cannot be represented at all
    #[error("Channel id {channel_id} is outside the encodable range of 2 through 65599")]
    InvalidChannelId { channel_id: u32 },

    #[error("A max chunk size of {chunk_size} is not valid (must be between 1 and 2,147,483,647)")]
    InvalidMaxChunkSize { chunk_size: u32 },

    #[error("An IO error occurred: {0}")]
    Io(#[from] io::Error),
}
