/*!
This module translates between discrete RTMP messages and the chunked wire
format.

Chunking exists so that many logical streams can share one transport with
very small framing overhead once headers start repeating: each chunk header
only carries the fields that differ from the previous message on the same
channel.  That makes the codecs stateful - every byte sent to a peer must go
through the same `ChunkSerializer`, and every byte received from it through
the same `ChunkDeserializer`, since either side can rely on state
established by earlier chunks.  The two directions keep independent header
histories and must never share one codec instance.
*/

mod chunk_header;
mod deserialization_errors;
mod deserializer;
mod serialization_errors;
mod serializer;

pub use self::deserialization_errors::ChunkDeserializationError;
pub use self::deserializer::ChunkDeserializer;
pub use self::serialization_errors::ChunkSerializationError;
pub use self::serializer::ChunkSerializer;
