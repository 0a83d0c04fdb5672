/// This module contains the client session: the state machine that drives a
/// blocking transport through the connect, play, and publish flows and
/// exposes the resulting media as an FLV byte stream.
mod client;

pub use self::client::ClientSession;
pub use self::client::ClientSessionConfig;
pub use self::client::ClientSessionError;
pub use self::client::ClientState;
pub use self::client::PlaybackStart;
pub use self::client::PublishRequestType;
