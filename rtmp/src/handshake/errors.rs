use std::io;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum HandshakeError {
    /// The server's first byte announced a protocol version this
    /// implementation does not speak
    #[error("The peer sent a version id of {version} but only version 3 is supported")]
    BadVersionId { version: u8 },

    /// The server's first block carried no digest we could validate under
    /// either offset scheme, so the peer is not a compatible server
    #[error("No valid digest was found in the server's first handshake block")]
    ServerDigestNotFound,

    /// The server's echo block was not signed with the digest we imprinted,
    /// which means the block was forged or corrupted in transit
    #[error("The signature of the server's echo block did not match")]
    SignatureMismatch,

    #[error("An IO error occurred: {0}")]
    Io(#[from] io::Error),
}
