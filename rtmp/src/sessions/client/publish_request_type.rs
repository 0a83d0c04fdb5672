/// The kinds of publishing a client can request from a server
#[derive(Clone, Copy, Eq, PartialEq, Debug)]
pub enum PublishRequestType {
    /// Stream is live and is not recorded on the server
    Live,

    /// Stream should be recorded on the server
    Record,

    /// Stream should be appended to an existing recording
    Append,
}

impl PublishRequestType {
    /// The string argument the publish command carries on the wire
    pub(crate) fn as_argument(self) -> &'static str {
        match self {
            PublishRequestType::Live => "live",
            PublishRequestType::Record => "record",
            PublishRequestType::Append => "append",
        }
    }
}
