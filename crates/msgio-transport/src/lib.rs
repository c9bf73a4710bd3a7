//! Scatter/gather writer for message fragments.
//!
//! This is the lowest layer of msgio. Given one or more ordered collections of
//! byte fragments it writes all of them to a descriptor with `writev(2)`,
//! splitting the work into groups of at most `IOV_MAX` vectors and absorbing
//! partial writes and "would block" conditions along the way.
//!
//! - [`write_all_vectored`] waits for writability on the calling thread.
//! - `write_all_vectored_async` (feature `async`) waits through tokio.

pub mod batch;
pub mod config;
pub mod error;
pub mod traits;
pub mod writev;

#[cfg(all(unix, feature = "async"))]
pub mod async_fd;

pub use batch::{GroupCursor, WriteBatch};
pub use config::{system_max_vectors, WriterConfig, FALLBACK_MAX_VECTORS};
pub use error::{Result, TransportError};
pub use traits::VectoredSink;
pub use writev::{write_all_vectored, write_all_vectored_with_config};

#[cfg(unix)]
pub use traits::FdSink;

#[cfg(all(unix, feature = "async"))]
pub use async_fd::write_all_vectored_async;
