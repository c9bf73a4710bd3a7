use msgio_transport::TransportError;

/// Failure state of an incremental reader.
///
/// A reader in this state reports `done()` and `has_error()` until `reset()`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum ReadError {
    /// The length header exceeds the configured maximum size.
    #[error("message too large ({size} bytes, max {max})")]
    TooLarge { size: u32, max: u32 },
}

/// Errors that can occur while encoding, decoding or sending messages.
#[derive(Debug, thiserror::Error)]
pub enum FrameError {
    /// A received length header exceeds the configured maximum size.
    #[error("message too large ({size} bytes, max {max})")]
    TooLarge { size: usize, max: usize },

    /// A value handed to a generator does not fit the message's length field.
    #[error("argument too large ({size} bytes, max {max})")]
    ArgumentTooLarge { size: usize, max: usize },

    /// The vectorized writer failed.
    #[error("frame transport error: {0}")]
    Transport(#[from] TransportError),

    /// The byte stream under a framed codec failed.
    #[error("frame I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The stream ended before a complete message was received.
    #[error("connection closed (incomplete message)")]
    ConnectionClosed,
}

impl From<ReadError> for FrameError {
    fn from(err: ReadError) -> Self {
        match err {
            ReadError::TooLarge { size, max } => FrameError::TooLarge {
                size: size as usize,
                max: max as usize,
            },
        }
    }
}

pub type Result<T> = std::result::Result<T, FrameError>;
