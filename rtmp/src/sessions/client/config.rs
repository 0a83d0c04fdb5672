use super::PublishRequestType;
use crate::handshake::DEFAULT_FILL_SEED;

/// Which kind of stream a playback session asks the server for
#[derive(Clone, Copy, Eq, PartialEq, Debug)]
pub enum PlaybackStart {
    /// Play a live stream if one exists, fall back to a recorded one
    Any,

    /// Only play a live stream
    Live,

    /// Only play a recorded stream, from its beginning
    Recorded,
}

impl PlaybackStart {
    /// The start number the play command carries on the wire
    pub(crate) fn as_play_argument(self) -> f64 {
        match self {
            PlaybackStart::Any => -2000.0,
            PlaybackStart::Live => -1000.0,
            PlaybackStart::Recorded => 0.0,
        }
    }
}

/// Configuration options that govern how a RTMP client session operates
#[derive(Clone)]
pub struct ClientSessionConfig {
    /// Name of the application to connect to on the server
    pub app: String,

    /// Path of the stream within the application to play or publish
    pub playpath: String,

    /// Full rtmp:// url of the target, announced in the connect command
    /// when present
    pub tc_url: Option<String>,

    /// Url of the swf player announced in the connect command when present
    pub swf_url: Option<String>,

    /// Url of the embedding web page, announced for playback sessions
    pub page_url: Option<String>,

    /// Stream name to subscribe to.  When unset, live playback subscribes
    /// to the playpath itself.
    pub subscribe: Option<String>,

    pub flash_version: String,
    pub playback_start: PlaybackStart,
    pub publish_type: PublishRequestType,

    /// Buffer length in milliseconds reported to the server once playback
    /// is requested
    pub playback_buffer_length_ms: u32,

    /// Window size announced to the server before createStream
    pub window_ack_size: u32,

    /// Seed for the handshake's pseudorandom fill.  The same seed always
    /// produces the same handshake blocks.
    pub handshake_seed: u64,
}

impl ClientSessionConfig {
    /// Creates a new configuration object with default values
    pub fn new() -> ClientSessionConfig {
        ClientSessionConfig {
            app: String::new(),
            playpath: String::new(),
            tc_url: None,
            swf_url: None,
            page_url: None,
            subscribe: None,
            flash_version: "LNX 9,0,124,2".to_string(),
            playback_start: PlaybackStart::Any,
            publish_type: PublishRequestType::Live,
            playback_buffer_length_ms: 3_000,
            window_ack_size: 2_500_000,
            handshake_seed: DEFAULT_FILL_SEED,
        }
    }
}
