mod config;
mod errors;
mod publish_request_type;
mod state;


pub use self::config::{ClientSessionConfig, PlaybackStart};
pub use self::errors::ClientSessionError;
pub use self::publish_request_type::PublishRequestType;
pub use self::state::ClientState;

use crate::chunk_io::{ChunkDeserializer, ChunkSerializer};
use crate::handshake::Handshake;
use crate::messages::{
    MessagePayload, PacketType, AUDIO_CHANNEL, NETWORK_CHANNEL, SOURCE_CHANNEL, SYSTEM_CHANNEL,
    VIDEO_CHANNEL,
};
use crate::time::RtmpTimestamp;
use byteorder::{BigEndian, WriteBytesExt};
use bytes::Bytes;
use log::{debug, error, warn};
use std::cmp::min;
use std::collections::HashMap;
use std::io::{self, Cursor, Read, Write};
use strobe_amf0::{deserialize, scan, Amf0Value, Amf0Writer};

/// The file header an FLV byte stream opens with
const FLV_HEADER: [u8; 13] = [b'F', b'L', b'V', 1, 5, 0, 0, 0, 9, 0, 0, 0, 0];

/// Size of the record header every FLV tag starts with
const FLV_TAG_HEADER_SIZE: usize = 11;

/// Bytes read between reports until the server announces its own window
const DEFAULT_CLIENT_REPORT_SIZE: u64 = 1_048_576;

/// The wire encoding of the AMF string "@setDataFrame"
const SET_DATA_FRAME: &[u8] = &[
    2, 0, 13, b'@', b's', b'e', b't', b'D', b'a', b't', b'a', b'F', b'r', b'a', b'm', b'e',
];

#[derive(Eq, PartialEq, Copy, Clone, Debug)]
enum SessionMode {
    Playback,
    Publish,
}

/// A media packet being assembled from the caller's FLV byte stream
struct OutboundMessage {
    channel_id: u32,
    type_id: PacketType,
    timestamp: RtmpTimestamp,
    data: Vec<u8>,
    remaining: usize,
    force_uncompressed: bool,
}

/// A blocking RTMP client session over any `Read + Write` transport.
///
/// The session owns the transport and both chunk codecs.  After
/// [`play`](ClientSession::play) succeeds, [`read`](ClientSession::read)
/// yields an FLV byte stream reassembled from the incoming media packets;
/// after [`publish`](ClientSession::publish) succeeds,
/// [`write`](ClientSession::write) accepts an FLV byte stream and slices it
/// back into media packets.  `std::io::Read` and `std::io::Write` are also
/// implemented in terms of those methods, so the session can be handed
/// directly to container code expecting ordinary streams.
///
/// Everything is synchronous: each call blocks on the transport until it
/// can make progress or fails.  Timeouts and interruption are the
/// transport's responsibility.  Nothing is retried internally - any error
/// leaves the session unusable, and reconnecting means building a new
/// session on a fresh transport.
pub struct ClientSession<T: Read + Write> {
    transport: T,
    config: ClientSessionConfig,
    mode: SessionMode,
    state: ClientState,
    serializer: ChunkSerializer,
    deserializer: ChunkDeserializer,

    transaction_counter: u64,
    tracked_calls: HashMap<u64, String>,
    stream_id: u32,

    bytes_read: u64,
    last_bytes_read: u64,
    client_report_size: u64,
    server_window: u32,

    // reassembled byte stream handed out by read()
    flv_data: Vec<u8>,
    flv_offset: usize,

    // resumable slicer state for write()
    out_skip_bytes: usize,
    out_tag_header: [u8; FLV_TAG_HEADER_SIZE],
    out_tag_header_bytes: usize,
    out_message: Option<OutboundMessage>,
}

impl<T: Read + Write> ClientSession<T> {
    /// Creates a session over a freshly opened transport.  Nothing is sent
    /// until `play` or `publish` is called.
    pub fn new(config: ClientSessionConfig, transport: T) -> ClientSession<T> {
        let server_window = config.window_ack_size;

        ClientSession {
            transport,
            config,
            mode: SessionMode::Playback,
            state: ClientState::Start,
            serializer: ChunkSerializer::new(),
            deserializer: ChunkDeserializer::new(),
            transaction_counter: 0,
            tracked_calls: HashMap::new(),
            stream_id: 0,
            bytes_read: 0,
            last_bytes_read: 0,
            client_report_size: DEFAULT_CLIENT_REPORT_SIZE,
            server_window,
            flv_data: Vec::new(),
            flv_offset: 0,
            out_skip_bytes: 0,
            out_tag_header: [0; FLV_TAG_HEADER_SIZE],
            out_tag_header_bytes: 0,
            out_message: None,
        }
    }

    pub fn state(&self) -> ClientState {
        self.state
    }

    /// Connects to the server and requests playback of the configured
    /// playpath.  Blocks until the server confirms playback has started,
    /// after which `read` yields the stream as FLV bytes.
    pub fn play(&mut self) -> Result<(), ClientSessionError> {
        self.begin(SessionMode::Playback)
    }

    /// Connects to the server and requests publishing of the configured
    /// playpath.  Blocks until the server confirms publishing has started,
    /// after which `write` accepts the stream as FLV bytes.
    pub fn publish(&mut self) -> Result<(), ClientSessionError> {
        self.begin(SessionMode::Publish)
    }

    fn begin(&mut self, mode: SessionMode) -> Result<(), ClientSessionError> {
        if self.state != ClientState::Start {
            return Err(ClientSessionError::SessionInInvalidState {
                current_state: self.state,
            });
        }

        self.mode = mode;

        Handshake::with_seed(self.config.handshake_seed).perform(&mut self.transport)?;
        self.state = ClientState::Handshaked;
        self.send_connect()?;

        loop {
            self.process_next_message()?;

            match self.state {
                ClientState::Playing => {
                    // seed the file header the container layer expects, in
                    // front of anything that may already have arrived
                    let mut data = Vec::with_capacity(FLV_HEADER.len() + self.flv_data.len());
                    data.extend_from_slice(&FLV_HEADER);
                    data.extend_from_slice(&self.flv_data);
                    self.flv_data = data;
                    self.flv_offset = 0;
                    return Ok(());
                }

                ClientState::Publishing => {
                    // the caller's byte stream opens with the same file
                    // header, which has no packet representation
                    self.out_skip_bytes = FLV_HEADER.len();
                    return Ok(());
                }

                ClientState::Stopped => return Err(ClientSessionError::StoppedBeforeStart),
                _ => (),
            }
        }
    }

    /// Copies reassembled FLV bytes into `buf`, blocking on the transport
    /// until at least some are available.  Returns `Ok(0)` once the server
    /// has ended the stream.
    pub fn read(&mut self, buf: &mut [u8]) -> Result<usize, ClientSessionError> {
        if buf.is_empty() {
            return Ok(0);
        }

        loop {
            let available = self.flv_data.len() - self.flv_offset;
            if available > 0 {
                let count = min(available, buf.len());
                buf[..count].copy_from_slice(&self.flv_data[self.flv_offset..self.flv_offset + count]);
                self.flv_offset += count;
                return Ok(count);
            }

            if self.state == ClientState::Stopped {
                return Ok(0);
            }

            if self.state != ClientState::Playing {
                return Err(ClientSessionError::SessionInInvalidState {
                    current_state: self.state,
                });
            }

            self.process_next_message()?;
        }
    }

    /// Accepts FLV bytes from the caller, slicing them at tag boundaries
    /// into media packets.  Partial tags are buffered, so the caller may
    /// split the stream at any byte position.
    pub fn write(&mut self, buf: &[u8]) -> Result<usize, ClientSessionError> {
        if self.state != ClientState::Publishing {
            return Err(ClientSessionError::SessionInInvalidState {
                current_state: self.state,
            });
        }

        let mut input = buf;
        while !input.is_empty() {
            if self.out_skip_bytes > 0 {
                // currently skipping the file header or a tag's backlink,
                // neither of which has a packet representation
                let skip = min(self.out_skip_bytes, input.len());
                self.out_skip_bytes -= skip;
                input = &input[skip..];
                continue;
            }

            if self.out_message.is_none() {
                let copy = min(FLV_TAG_HEADER_SIZE - self.out_tag_header_bytes, input.len());
                self.out_tag_header[self.out_tag_header_bytes..self.out_tag_header_bytes + copy]
                    .copy_from_slice(&input[..copy]);
                self.out_tag_header_bytes += copy;
                input = &input[copy..];

                if self.out_tag_header_bytes < FLV_TAG_HEADER_SIZE {
                    break;
                }

                self.start_outbound_message()?;
                continue;
            }

            let completed = match self.out_message.as_mut() {
                Some(message) => {
                    let copy = min(message.remaining, input.len());
                    message.data.extend_from_slice(&input[..copy]);
                    message.remaining -= copy;
                    input = &input[copy..];
                    message.remaining == 0
                }

                None => false,
            };

            if completed {
                if let Some(message) = self.out_message.take() {
                    self.out_skip_bytes = 4; // the backlink that trails every tag
                    self.out_tag_header_bytes = 0;
                    let stream_id = self.stream_id;
                    self.send_message(
                        message.channel_id,
                        message.type_id,
                        message.timestamp,
                        stream_id,
                        message.data,
                        message.force_uncompressed,
                    )?;
                }
            }
        }

        Ok(buf.len())
    }

    /// Tears the session down, sending the best effort unpublish and
    /// delete commands when a stream had been set up.  Send failures are
    /// logged rather than returned; after this call the session is
    /// `Stopped` and a second close sends nothing.
    pub fn close(&mut self) -> Result<(), ClientSessionError> {
        if self.mode == SessionMode::Publish
            && matches!(
                self.state,
                ClientState::Connecting | ClientState::Ready | ClientState::Publishing
            )
        {
            if let Err(error) = self.send_fcunpublish() {
                warn!("Failed to send FCUnpublish during teardown: {}", error);
            }
        }

        if matches!(
            self.state,
            ClientState::Releasing
                | ClientState::FcPublish
                | ClientState::Connecting
                | ClientState::Ready
                | ClientState::Playing
                | ClientState::Publishing
        ) {
            if let Err(error) = self.send_delete_stream() {
                warn!("Failed to send deleteStream during teardown: {}", error);
            }
        }

        self.state = ClientState::Stopped;
        Ok(())
    }

    // ------------------------------------------------------------------
    // receive path

    /// Reads one message from the peer, performs the bandwidth accounting,
    /// and reacts to it
    fn process_next_message(&mut self) -> Result<(), ClientSessionError> {
        let message = self.read_message()?;
        self.maybe_send_bytes_read_report(message.timestamp)?;
        self.handle_message(message)
    }

    fn read_message(&mut self) -> Result<MessagePayload, ClientSessionError> {
        loop {
            if let Some(message) = self.deserializer.get_next_message(&[])? {
                return Ok(message);
            }

            let mut buffer = [0_u8; 4096];
            let count = self.transport.read(&mut buffer)?;
            if count == 0 {
                return Err(ClientSessionError::ConnectionClosed);
            }

            self.bytes_read = self.bytes_read.wrapping_add(count as u64);
            if let Some(message) = self.deserializer.get_next_message(&buffer[..count])? {
                return Ok(message);
            }
        }
    }

    fn maybe_send_bytes_read_report(
        &mut self,
        timestamp: RtmpTimestamp,
    ) -> Result<(), ClientSessionError> {
        if self.bytes_read - self.last_bytes_read > self.client_report_size {
            debug!("Sending bytes read report ({} bytes)", self.bytes_read);
            let mut data = Vec::new();
            data.write_u32::<BigEndian>(self.bytes_read as u32)?;
            self.send_message(
                NETWORK_CHANNEL,
                PacketType::BytesRead,
                timestamp + 1,
                0,
                data,
                false,
            )?;
            self.last_bytes_read = self.bytes_read;
        }

        Ok(())
    }

    fn handle_message(&mut self, message: MessagePayload) -> Result<(), ClientSessionError> {
        match message.type_id {
            PacketType::ChunkSize => self.handle_chunk_size(&message),
            PacketType::Ping => self.handle_ping(&message),
            PacketType::ClientBandwidth => self.handle_client_bandwidth(&message),
            PacketType::ServerBandwidth => self.handle_server_bandwidth(&message),
            PacketType::Invoke => self.handle_invoke(&message),

            // the peer acknowledging our bytes needs no reaction
            PacketType::BytesRead => Ok(()),

            PacketType::Audio | PacketType::Video => {
                if self.mode == SessionMode::Playback && !message.data.is_empty() {
                    self.append_flv_data(&message, 0);
                }

                Ok(())
            }

            PacketType::Notify => {
                if self.mode == SessionMode::Playback && !message.data.is_empty() {
                    self.handle_notify(&message);
                }

                Ok(())
            }

            PacketType::Metadata => {
                if self.mode == SessionMode::Playback && !message.data.is_empty() {
                    self.handle_metadata(&message);
                }

                Ok(())
            }

            other => {
                debug!("Ignoring packet with unhandled type {:?}", other);
                Ok(())
            }
        }
    }

    fn handle_chunk_size(&mut self, message: &MessagePayload) -> Result<(), ClientSessionError> {
        let size = read_u32_field(message)?;
        if size == 0 || size > 2147483647 {
            return Err(ClientSessionError::InvalidChunkSize { size });
        }

        if self.mode == SessionMode::Publish {
            // mirror the change back so our outgoing chunking matches the
            // size the peer just announced
            self.send_message(
                message.channel_id,
                PacketType::ChunkSize,
                message.timestamp,
                message.message_stream_id,
                message.data.to_vec(),
                false,
            )?;
            self.serializer.set_max_chunk_size(size)?;
        }

        self.deserializer.set_max_chunk_size(size as usize)?;
        debug!("New incoming chunk size = {}", size);
        Ok(())
    }

    fn handle_ping(&mut self, message: &MessagePayload) -> Result<(), ClientSessionError> {
        if message.data.len() < 2 {
            return Err(ClientSessionError::PayloadTooShort {
                type_id: message.type_id.into(),
                size: message.data.len(),
            });
        }

        let event = ((message.data[0] as u16) << 8) | message.data[1] as u16;
        match event {
            6 => {
                if message.data.len() < 6 {
                    return Err(ClientSessionError::PayloadTooShort {
                        type_id: message.type_id.into(),
                        size: message.data.len(),
                    });
                }

                let mut data = Vec::new();
                data.write_u16::<BigEndian>(7)?;
                data.extend_from_slice(&message.data[2..6]);
                self.send_message(
                    NETWORK_CHANNEL,
                    PacketType::Ping,
                    message.timestamp + 1,
                    0,
                    data,
                    false,
                )?;
            }

            26 => warn!("Ignoring SWFVerification request"),
            _ => (),
        }

        Ok(())
    }

    fn handle_client_bandwidth(&mut self, message: &MessagePayload) -> Result<(), ClientSessionError> {
        let size = read_u32_field(message)?;
        if size == 0 {
            return Err(ClientSessionError::InvalidWindowSize { size });
        }

        debug!("Client bandwidth = {}", size);
        self.client_report_size = (size >> 1) as u64;
        Ok(())
    }

    fn handle_server_bandwidth(&mut self, message: &MessagePayload) -> Result<(), ClientSessionError> {
        let size = read_u32_field(message)?;
        if size == 0 {
            return Err(ClientSessionError::InvalidWindowSize { size });
        }

        debug!("Server bandwidth = {}", size);
        self.server_window = size;
        Ok(())
    }

    fn handle_invoke(&mut self, message: &MessagePayload) -> Result<(), ClientSessionError> {
        let mut cursor = Cursor::new(&message.data[..]);
        let mut values = deserialize(&mut cursor)?.into_iter();

        let name = match values.next() {
            Some(Amf0Value::Utf8String(name)) => name,
            _ => {
                warn!("Received an invoke with no command name");
                return Ok(());
            }
        };

        let transaction_id = match values.next() {
            Some(Amf0Value::Number(id)) => id,
            _ => 0.0,
        };

        match name.as_str() {
            "_result" => self.handle_invoke_result(transaction_id, values.collect()),
            "_error" => self.handle_invoke_error(transaction_id, &message.data),
            "onStatus" => self.handle_invoke_status(&message.data),
            "onBWDone" => self.send_check_bw(),
            other => {
                debug!("Ignoring unhandled command '{}'", other);
                Ok(())
            }
        }
    }

    fn handle_invoke_result(
        &mut self,
        transaction_id: f64,
        arguments: Vec<Amf0Value>,
    ) -> Result<(), ClientSessionError> {
        let method = match self.tracked_calls.remove(&(transaction_id as u64)) {
            Some(method) => method,
            None => {
                // replies to calls we are not tracking (or that a quirky
                // server answered twice) carry no information for us
                debug!("Ignoring result for untracked transaction {}", transaction_id);
                return Ok(());
            }
        };

        match method.as_str() {
            "connect" => {
                debug!("Connection request accepted");
                match self.mode {
                    SessionMode::Publish => {
                        self.send_release_stream()?;
                        self.state = ClientState::Releasing;
                        self.send_fcpublish()?;
                        self.state = ClientState::FcPublish;
                    }

                    SessionMode::Playback => {
                        self.send_window_ack_size()?;
                    }
                }

                self.send_create_stream()?;
                self.state = ClientState::Connecting;

                if self.mode == SessionMode::Playback {
                    let subscribe_target = match (&self.config.subscribe, self.config.playback_start) {
                        (Some(name), _) => Some(name.clone()),
                        (None, PlaybackStart::Live) => Some(self.config.playpath.clone()),
                        _ => None,
                    };

                    if let Some(name) = subscribe_target {
                        self.send_fcsubscribe(&name)?;
                    }
                }

                Ok(())
            }

            "createStream" => {
                let stream_id = match arguments
                    .into_iter()
                    .rev()
                    .find_map(|value| value.get_number())
                {
                    Some(number) => number,
                    None => return Err(ClientSessionError::CreateStreamResponseHadNoStreamNumber),
                };

                self.stream_id = stream_id as u32;
                debug!("Server allocated stream id {}", self.stream_id);

                match self.mode {
                    SessionMode::Publish => self.send_publish()?,
                    SessionMode::Playback => {
                        self.send_play()?;
                        self.send_buffer_length()?;
                    }
                }

                self.state = ClientState::Ready;
                Ok(())
            }

            other => {
                debug!("Ignoring result for '{}'", other);
                Ok(())
            }
        }
    }

    fn handle_invoke_error(
        &mut self,
        transaction_id: f64,
        data: &[u8],
    ) -> Result<(), ClientSessionError> {
        let method = self.tracked_calls.remove(&(transaction_id as u64));
        let description = scan::get_field_value(data, "description")
            .or_else(|| scan::get_field_value(data, "code"))
            .unwrap_or_default();

        match method.as_deref() {
            Some(name)
                if name == "_checkbw"
                    || name == "releaseStream"
                    || name == "FCPublish"
                    || name == "FCSubscribe" =>
            {
                // historical server artifacts; these calls routinely error
                // on servers that never implemented them
                warn!("Ignoring server error reply to {}: {}", name, description);
                Ok(())
            }

            _ => {
                error!("Server error: {}", description);
                Err(ClientSessionError::ServerError { description })
            }
        }
    }

    fn handle_invoke_status(&mut self, data: &[u8]) -> Result<(), ClientSessionError> {
        // skip the command name and transaction id to reach the info object
        let mut index = scan::tag_size(data)?;
        index += scan::tag_size(&data[index..])?;
        let info = &data[index..];

        if let Some(level) = scan::get_field_value(info, "level") {
            if level == "error" {
                let description = scan::get_field_value(info, "description")
                    .filter(|value| !value.is_empty())
                    .or_else(|| scan::get_field_value(info, "code"))
                    .unwrap_or_default();
                error!("Server error: {}", description);

                // the stream objects are gone as far as the server is
                // concerned, so teardown must not be attempted later
                self.state = ClientState::Stopped;
                return Err(ClientSessionError::ServerError { description });
            }
        }

        if let Some(code) = scan::get_field_value(info, "code") {
            debug!("onStatus code '{}'", code);
            match code.as_str() {
                "NetStream.Play.Start" => self.state = ClientState::Playing,
                "NetStream.Publish.Start" => self.state = ClientState::Publishing,
                "NetStream.Play.Stop" => self.state = ClientState::Stopped,
                "NetStream.Play.UnpublishNotify" => self.state = ClientState::Stopped,
                _ => (),
            }
        }

        Ok(())
    }

    // ------------------------------------------------------------------
    // media read path

    /// Wraps a media payload in an FLV tag and appends it to the byte
    /// stream handed out by `read`
    fn append_flv_data(&mut self, message: &MessagePayload, skip: usize) {
        let data = &message.data[skip..];
        let timestamp = message.timestamp.value;

        self.compact_flv_buffer();
        write_flv_tag_header(
            &mut self.flv_data,
            message.type_id.into(),
            data.len() as u32,
            timestamp,
        );
        self.flv_data.extend_from_slice(data);
        push_u32_be(&mut self.flv_data, FLV_TAG_HEADER_SIZE as u32 + data.len() as u32);
    }

    fn handle_notify(&mut self, message: &MessagePayload) {
        // publishers prefix their data messages with @setDataFrame, which
        // is a server side convention the byte stream must not contain
        let skip = if message.data.starts_with(SET_DATA_FRAME) {
            SET_DATA_FRAME.len()
        } else {
            0
        };

        self.append_flv_data(message, skip);
    }

    /// Copies a run of FLV records out of a metadata packet, rebasing each
    /// embedded record's relative timestamp to the session clock
    fn handle_metadata(&mut self, message: &MessagePayload) {
        self.compact_flv_buffer();

        let data = &message.data[..];
        let mut index = 0;
        let mut timestamp = message.timestamp.value;
        let mut previous_time: Option<u32> = None;

        while index + FLV_TAG_HEADER_SIZE <= data.len() {
            let record_type = data[index];
            let size = read_u24_be(&data[index + 1..]);
            let record_time = read_u24_be(&data[index + 4..]) | (data[index + 7] as u32) << 24;

            // stream id bytes, payload, and backlink are copied verbatim
            let rest = size as usize + 3 + 4;
            if index + 8 + rest > data.len() {
                warn!("Dropping incomplete flv record at the end of a metadata packet");
                break;
            }

            timestamp = match previous_time {
                Some(previous) => timestamp.wrapping_add(record_time.wrapping_sub(previous)),
                None => timestamp,
            };
            previous_time = Some(record_time);

            self.flv_data.push(record_type);
            push_u24_be(&mut self.flv_data, size);
            push_u24_be(&mut self.flv_data, timestamp & 0xFFFFFF);
            self.flv_data.push((timestamp >> 24) as u8);
            self.flv_data.extend_from_slice(&data[index + 8..index + 8 + rest]);

            index += 8 + rest;
        }
    }

    /// Restarts the staging buffer when everything in it has been read out
    fn compact_flv_buffer(&mut self) {
        if self.flv_offset == self.flv_data.len() {
            self.flv_data.clear();
            self.flv_offset = 0;
        }
    }

    // ------------------------------------------------------------------
    // media write path

    /// Parses the 11 byte tag header accumulated from the caller's byte
    /// stream and opens the packet the tag's payload will stream into
    fn start_outbound_message(&mut self) -> Result<(), ClientSessionError> {
        let header = self.out_tag_header;
        let type_id = PacketType::from(header[0]);
        let size = read_u24_be(&header[1..]) as usize;
        let timestamp = read_u24_be(&header[4..]) | (header[7] as u32) << 24;

        let channel_id = if type_id == PacketType::Video {
            VIDEO_CHANNEL
        } else {
            AUDIO_CHANNEL
        };

        // the first media tag of a stream and every data tag must go out
        // with a full header; some servers refuse compressed ones there
        let is_media = type_id == PacketType::Audio || type_id == PacketType::Video;
        let force_uncompressed = (is_media && timestamp == 0) || type_id == PacketType::Notify;

        let mut data = Vec::with_capacity(size + SET_DATA_FRAME.len());
        if type_id == PacketType::Notify {
            data.extend_from_slice(SET_DATA_FRAME);
        }

        self.out_message = Some(OutboundMessage {
            channel_id,
            type_id,
            timestamp: RtmpTimestamp::new(timestamp),
            data,
            remaining: size,
            force_uncompressed,
        });

        Ok(())
    }

    // ------------------------------------------------------------------
    // outgoing commands

    fn send_message(
        &mut self,
        channel_id: u32,
        type_id: PacketType,
        timestamp: RtmpTimestamp,
        message_stream_id: u32,
        data: Vec<u8>,
        force_uncompressed: bool,
    ) -> Result<(), ClientSessionError> {
        let payload = MessagePayload {
            channel_id,
            timestamp,
            type_id,
            message_stream_id,
            data: Bytes::from(data),
        };

        let bytes = self.serializer.serialize(&payload, force_uncompressed)?;
        self.transport.write_all(&bytes)?;
        Ok(())
    }

    fn send_command(
        &mut self,
        channel_id: u32,
        message_stream_id: u32,
        data: Vec<u8>,
    ) -> Result<(), ClientSessionError> {
        self.send_message(
            channel_id,
            PacketType::Invoke,
            RtmpTimestamp::new(0),
            message_stream_id,
            data,
            false,
        )
    }

    fn create_transaction(&mut self, method: &str, track: bool) -> u64 {
        self.transaction_counter += 1;
        if track {
            self.tracked_calls
                .insert(self.transaction_counter, method.to_string());
        }

        self.transaction_counter
    }

    fn send_connect(&mut self) -> Result<(), ClientSessionError> {
        let transaction_id = self.create_transaction("connect", true);

        let mut writer = Amf0Writer::new();
        writer.write_string("connect")?;
        writer.write_number(transaction_id as f64)?;
        writer.write_object_start();
        writer.write_field_name("app")?;
        writer.write_string(&self.config.app)?;

        if self.mode == SessionMode::Publish {
            writer.write_field_name("type")?;
            writer.write_string("nonprivate")?;
        }

        writer.write_field_name("flashVer")?;
        writer.write_string(&self.config.flash_version)?;

        if let Some(ref swf_url) = self.config.swf_url {
            writer.write_field_name("swfUrl")?;
            writer.write_string(swf_url)?;
        }

        if let Some(ref tc_url) = self.config.tc_url {
            writer.write_field_name("tcUrl")?;
            writer.write_string(tc_url)?;
        }

        if self.mode == SessionMode::Playback {
            writer.write_field_name("fpad")?;
            writer.write_boolean(false);
            writer.write_field_name("capabilities")?;
            writer.write_number(15.0)?;

            // all audio codecs minus the two the protocol never assigned
            writer.write_field_name("audioCodecs")?;
            writer.write_number(4071.0)?;
            writer.write_field_name("videoCodecs")?;
            writer.write_number(252.0)?;
            writer.write_field_name("videoFunction")?;
            writer.write_number(1.0)?;

            if let Some(ref page_url) = self.config.page_url {
                writer.write_field_name("pageUrl")?;
                writer.write_string(page_url)?;
            }
        }

        writer.write_object_end()?;
        self.send_command(SYSTEM_CHANNEL, 0, writer.into_bytes())
    }

    fn send_release_stream(&mut self) -> Result<(), ClientSessionError> {
        debug!("Releasing stream");
        let transaction_id = self.create_transaction("releaseStream", true);

        let mut writer = Amf0Writer::new();
        writer.write_string("releaseStream")?;
        writer.write_number(transaction_id as f64)?;
        writer.write_null();
        writer.write_string(&self.config.playpath)?;
        self.send_command(SYSTEM_CHANNEL, 0, writer.into_bytes())
    }

    fn send_fcpublish(&mut self) -> Result<(), ClientSessionError> {
        debug!("FCPublish stream");
        let transaction_id = self.create_transaction("FCPublish", true);

        let mut writer = Amf0Writer::new();
        writer.write_string("FCPublish")?;
        writer.write_number(transaction_id as f64)?;
        writer.write_null();
        writer.write_string(&self.config.playpath)?;
        self.send_command(SYSTEM_CHANNEL, 0, writer.into_bytes())
    }

    fn send_fcunpublish(&mut self) -> Result<(), ClientSessionError> {
        debug!("Unpublishing stream");
        let transaction_id = self.create_transaction("FCUnpublish", false);

        let mut writer = Amf0Writer::new();
        writer.write_string("FCUnpublish")?;
        writer.write_number(transaction_id as f64)?;
        writer.write_null();
        writer.write_string(&self.config.playpath)?;
        self.send_command(SYSTEM_CHANNEL, 0, writer.into_bytes())
    }

    fn send_fcsubscribe(&mut self, subscribe: &str) -> Result<(), ClientSessionError> {
        let transaction_id = self.create_transaction("FCSubscribe", true);

        let mut writer = Amf0Writer::new();
        writer.write_string("FCSubscribe")?;
        writer.write_number(transaction_id as f64)?;
        writer.write_null();
        writer.write_string(subscribe)?;
        self.send_command(SYSTEM_CHANNEL, 0, writer.into_bytes())
    }

    fn send_create_stream(&mut self) -> Result<(), ClientSessionError> {
        debug!("Creating stream");
        let transaction_id = self.create_transaction("createStream", true);

        let mut writer = Amf0Writer::new();
        writer.write_string("createStream")?;
        writer.write_number(transaction_id as f64)?;
        writer.write_null();
        self.send_command(SYSTEM_CHANNEL, 0, writer.into_bytes())
    }

    fn send_delete_stream(&mut self) -> Result<(), ClientSessionError> {
        debug!("Deleting stream");
        let transaction_id = self.create_transaction("deleteStream", false);

        let mut writer = Amf0Writer::new();
        writer.write_string("deleteStream")?;
        writer.write_number(transaction_id as f64)?;
        writer.write_null();
        writer.write_number(self.stream_id as f64)?;
        self.send_command(SYSTEM_CHANNEL, 0, writer.into_bytes())
    }

    fn send_play(&mut self) -> Result<(), ClientSessionError> {
        debug!("Sending play command for '{}'", self.config.playpath);
        let transaction_id = self.create_transaction("play", true);

        let mut writer = Amf0Writer::new();
        writer.write_string("play")?;
        writer.write_number(transaction_id as f64)?;
        writer.write_null();
        writer.write_string(&self.config.playpath)?;
        writer.write_number(self.config.playback_start.as_play_argument())?;

        let stream_id = self.stream_id;
        self.send_command(SOURCE_CHANNEL, stream_id, writer.into_bytes())
    }

    fn send_publish(&mut self) -> Result<(), ClientSessionError> {
        debug!("Sending publish command for '{}'", self.config.playpath);
        let transaction_id = self.create_transaction("publish", true);

        let mut writer = Amf0Writer::new();
        writer.write_string("publish")?;
        writer.write_number(transaction_id as f64)?;
        writer.write_null();
        writer.write_string(&self.config.playpath)?;
        writer.write_string(self.config.publish_type.as_argument())?;

        let stream_id = self.stream_id;
        self.send_command(SOURCE_CHANNEL, stream_id, writer.into_bytes())
    }

    fn send_check_bw(&mut self) -> Result<(), ClientSessionError> {
        let transaction_id = self.create_transaction("_checkbw", true);

        let mut writer = Amf0Writer::new();
        writer.write_string("_checkbw")?;
        writer.write_number(transaction_id as f64)?;
        writer.write_null();
        self.send_command(SYSTEM_CHANNEL, 0, writer.into_bytes())
    }

    /// Tells the server the byte window after which we expect it to send
    /// its own bytes read reports
    fn send_window_ack_size(&mut self) -> Result<(), ClientSessionError> {
        let mut data = Vec::new();
        data.write_u32::<BigEndian>(self.server_window)?;
        self.send_message(
            NETWORK_CHANNEL,
            PacketType::ServerBandwidth,
            RtmpTimestamp::new(0),
            0,
            data,
            false,
        )
    }

    /// Reports the client's playback buffer length for the active stream
    fn send_buffer_length(&mut self) -> Result<(), ClientSessionError> {
        let mut data = Vec::new();
        data.write_u16::<BigEndian>(3)?;
        data.write_u32::<BigEndian>(self.stream_id)?;
        data.write_u32::<BigEndian>(self.config.playback_buffer_length_ms)?;
        self.send_message(
            NETWORK_CHANNEL,
            PacketType::Ping,
            RtmpTimestamp::new(1),
            0,
            data,
            false,
        )
    }
}

impl<T: Read + Write> Read for ClientSession<T> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        ClientSession::read(self, buf).map_err(|error| io::Error::new(io::ErrorKind::Other, error))
    }
}

impl<T: Read + Write> Write for ClientSession<T> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        ClientSession::write(self, buf).map_err(|error| io::Error::new(io::ErrorKind::Other, error))
    }

    fn flush(&mut self) -> io::Result<()> {
        self.transport.flush()
    }
}

fn read_u32_field(message: &MessagePayload) -> Result<u32, ClientSessionError> {
    if message.data.len() < 4 {
        return Err(ClientSessionError::PayloadTooShort {
            type_id: message.type_id.into(),
            size: message.data.len(),
        });
    }

    Ok(((message.data[0] as u32) << 24)
        | ((message.data[1] as u32) << 16)
        | ((message.data[2] as u32) << 8)
        | message.data[3] as u32)
}

fn read_u24_be(data: &[u8]) -> u32 {
    ((data[0] as u32) << 16) | ((data[1] as u32) << 8) | data[2] as u32
}

fn push_u24_be(buffer: &mut Vec<u8>, value: u32) {
    buffer.push((value >> 16) as u8);
    buffer.push((value >> 8) as u8);
    buffer.push(value as u8);
}

fn push_u32_be(buffer: &mut Vec<u8>, value: u32) {
    buffer.push((value >> 24) as u8);
    buffer.push((value >> 16) as u8);
    buffer.push((value >> 8) as u8);
    buffer.push(value as u8);
}

/// The 11 byte record header that fronts every FLV tag: type, 24 bit size,
/// split 32 bit timestamp, and a zeroed stream id
fn write_flv_tag_header(buffer: &mut Vec<u8>, type_id: u8, size: u32, timestamp: u32) {
    buffer.push(type_id);
    push_u24_be(buffer, size);
    push_u24_be(buffer, timestamp & 0xFFFFFF);
    buffer.push((timestamp >> 24) as u8);
    push_u24_be(buffer, 0);
}
