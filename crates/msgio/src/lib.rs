//! Zero-copy message readers and scatter/gather writers for length-prefixed
//! IPC protocols.
//!
//! # Crate Structure
//!
//! - [`transport`]: `writev(2)` batching with `IOV_MAX` grouping and partial-write recovery
//! - [`frame`]: Incremental integer, array and scalar message readers and generators
//!
//! ```
//! use msgio::frame::ArrayMessage;
//!
//! let mut header = [0u8; 2];
//! let mut fragments = Vec::new();
//! ArrayMessage::generate(&[&b"GET"[..], &b"/"[..]], &mut header, &mut fragments).unwrap();
//! let wire = fragments.concat();
//!
//! let mut reader = ArrayMessage::new();
//! reader.feed(&wire);
//! assert_eq!(reader.value().unwrap().get(1), Some(&b"/"[..]));
//! ```

/// Re-export transport types.
pub mod transport {
    pub use msgio_transport::*;
}

/// Re-export frame types.
pub mod frame {
    pub use msgio_frame::*;
}
