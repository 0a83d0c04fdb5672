//! A client side implementation of the RTMP protocol.
//!
//! The crate is split along the protocol's own seams:
//!
//! * [`chunk_io`] translates between discrete protocol messages and the
//!   chunked wire format, keeping the per-channel header compression state
//!   for each direction.
//! * [`handshake`] performs the three stage digest handshake that starts
//!   every connection.
//! * [`messages`] holds the message model shared by the other layers.
//! * [`sessions`] drives a blocking transport through the connect, play,
//!   and publish flows, exposing the stream as an FLV byte stream.
//!
//! The crate never opens sockets itself; anything implementing
//! `std::io::Read + std::io::Write` can act as the transport.

pub mod chunk_io;
pub mod handshake;
pub mod messages;
pub mod sessions;
pub mod time;
