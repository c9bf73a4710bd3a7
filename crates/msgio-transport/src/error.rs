/// Errors that can occur while flushing fragments to a descriptor.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    /// The combined size of all fragments exceeds the largest single write.
    #[error("total fragment size too large ({size} bytes, max {max})")]
    TooLarge { size: usize, max: usize },

    /// The write primitive failed with something other than "would block".
    #[error("transport I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The write primitive reported more bytes than were handed to it.
    #[error("writev() returned an unexpected result ({written} bytes written, {remaining} remaining)")]
    UnexpectedWrite { written: usize, remaining: usize },
}

impl TransportError {
    /// The OS error code behind this failure, if any.
    pub fn raw_os_error(&self) -> Option<i32> {
        match self {
            TransportError::Io(err) => err.raw_os_error(),
            _ => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, TransportError>;
