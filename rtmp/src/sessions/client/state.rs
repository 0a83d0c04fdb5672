/// The lifecycle of a client session.
///
/// Transitions run monotonically down this list, except that an error or
/// teardown can jump straight to `Stopped` from anywhere.  Playback
/// sessions skip `Releasing` and `FcPublish`, which only exist to prepare a
/// server for an incoming publish.
#[derive(Clone, Copy, Eq, PartialEq, Debug)]
pub enum ClientState {
    /// Fresh session, nothing has been sent yet
    Start,

    /// The handshake completed and the connect command can be issued
    Handshaked,

    /// releaseStream was issued to free a possibly lingering stream name
    Releasing,

    /// FCPublish was issued to announce the upcoming publish
    FcPublish,

    /// createStream is outstanding
    Connecting,

    /// The server allocated a stream and play or publish was issued
    Ready,

    /// The server confirmed playback has started
    Playing,

    /// The server confirmed publishing has started
    Publishing,

    /// The stream has ended; reads return end of stream from now on
    Stopped,
}
