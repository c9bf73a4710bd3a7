//! Length-prefixed message readers and generators.
//!
//! Three message kinds share one design:
//! - 16/32-bit big-endian integers ([`Uint16Message`], [`Uint32Message`])
//! - arrays of NUL-terminated strings behind a 16-bit length ([`ArrayMessage`])
//! - raw blobs behind a 32-bit length ([`ScalarMessage`])
//!
//! Readers are fed arbitrary chunks and report how much of each chunk
//! belonged to the current message. A message delivered whole in one chunk is
//! returned as a view into that chunk; a split message is assembled in the
//! reader's buffer. Generators turn values into borrowed fragments for
//! [`msgio_transport::write_all_vectored`], so payloads are never copied on
//! the way out either.

pub mod array;
pub mod codec;
pub mod error;
pub mod integer;
pub mod reader;
pub mod scalar;
pub mod view;
pub mod writer;

pub use array::{ArrayMessage, ARRAY_HEADER_SIZE, MAX_ARRAY_BODY};
pub use codec::{
    decode_array, decode_scalar, encode_array, encode_scalar, ArrayCodec, ScalarCodec,
};
pub use error::{FrameError, ReadError, Result};
pub use integer::{IntMessage, Uint16Message, Uint32Message, WireInt};
pub use reader::{feed_all, MessageReader};
pub use scalar::{ScalarMessage, MAX_SCALAR_BODY, SCALAR_HEADER_SIZE};
pub use view::{split_pairs, split_pairs_map, ArrayView, Segments, View};
pub use writer::MessageWriter;
