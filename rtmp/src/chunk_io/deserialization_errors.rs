use std::io;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ChunkDeserializationError {
    /// A compressed chunk header arrived on a channel we have no previous
    /// header for, so the inherited fields cannot be resolved
    #[error("Received a compressed chunk header on csid {csid} with no previous chunk on that channel")]
    NoPreviousChunkOnStream { csid: u32 },

    /// A message was split across chunks but the byte between two chunks
    /// was not the continuation marker for the message's channel.  There is
    /// no way to resynchronize after this, the stream must be torn down.
    #[error("Expected a continuation marker for channel {expected_csid} but found byte {first_byte:#04x}")]
    InvalidContinuationMarker { expected_csid: u32, first_byte: u8 },

    #[error("A max chunk size of {chunk_size} is not valid (must be between 1 and 2,147,483,647)")]
    InvalidMaxChunkSize { chunk_size: usize },

    #[error("An IO error occurred: {0}")]
    Io(#[from] io::Error),
}
