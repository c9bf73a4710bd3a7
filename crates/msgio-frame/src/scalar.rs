use zeroize::Zeroize;

use crate::error::{FrameError, ReadError, Result};
use crate::integer::Uint32Message;
use crate::view::View;

/// Scalar header: 32-bit big-endian body length.
pub const SCALAR_HEADER_SIZE: usize = 4;

/// Largest body a scalar message can describe.
pub const MAX_SCALAR_BODY: usize = u32::MAX as usize;

#[derive(Debug, Clone, Copy)]
enum Body<'a> {
    Empty,
    Input(&'a [u8]),
    Buffered,
}

#[derive(Debug, Clone, Copy)]
enum State<'a> {
    ReadingHeader,
    ReadingBody,
    Done(Body<'a>),
    Failed(ReadError),
}

/// Incremental reader and generator for scalar messages: a 32-bit
/// big-endian length followed by that many raw bytes.
///
/// Like [`ArrayMessage`](crate::ArrayMessage), a message that arrives in a
/// single [`feed`](Self::feed) is returned without copying.
#[derive(Debug)]
pub struct ScalarMessage<'a> {
    header: Uint32Message,
    state: State<'a>,
    buffer: Vec<u8>,
    max_size: u32,
}

impl Default for ScalarMessage<'_> {
    fn default() -> Self {
        Self::new()
    }
}

impl<'a> ScalarMessage<'a> {
    pub fn new() -> Self {
        Self {
            header: Uint32Message::new(),
            state: State::ReadingHeader,
            buffer: Vec::new(),
            max_size: 0,
        }
    }

    /// A reader that rejects bodies longer than `max_size` bytes (0 = unbounded).
    pub fn with_max_size(max_size: u32) -> Self {
        let mut msg = Self::new();
        msg.max_size = max_size;
        msg
    }

    pub fn set_max_size(&mut self, max_size: u32) {
        self.max_size = max_size;
    }

    pub fn max_size(&self) -> u32 {
        self.max_size
    }

    pub fn reset(&mut self) {
        self.state = State::ReadingHeader;
        self.header.reset();
        self.buffer.clear();
    }

    /// Like [`reset`](Self::reset), but first zeroes the whole internal
    /// buffer allocation. Use after reading secrets.
    pub fn reset_and_wipe(&mut self) {
        self.buffer.zeroize();
        self.reset();
    }

    /// Reset and rebind to input with a different lifetime, keeping the
    /// configuration and buffer allocation.
    pub fn recycle<'b>(self) -> ScalarMessage<'b> {
        let mut next = ScalarMessage {
            header: self.header,
            state: State::ReadingHeader,
            buffer: self.buffer,
            max_size: self.max_size,
        };
        next.reset();
        next
    }

    /// Consume message bytes from the front of `data`; returns the count.
    pub fn feed(&mut self, data: &'a [u8]) -> usize {
        let mut consumed = 0;

        while consumed < data.len() && !self.done() {
            let rest = &data[consumed..];
            match self.state {
                State::ReadingHeader => {
                    consumed += self.header.feed(rest);
                    if self.header.done() {
                        self.state = self.state_after_header();
                    }
                }
                State::ReadingBody => {
                    let size = self.header.value() as usize;
                    if self.buffer.is_empty() && rest.len() >= size {
                        self.state = State::Done(Body::Input(&rest[..size]));
                        consumed += size;
                    } else {
                        let take = rest.len().min(size - self.buffer.len());
                        if self.buffer.capacity() < size {
                            self.buffer.reserve_exact(size - self.buffer.len());
                        }
                        self.buffer.extend_from_slice(&rest[..take]);
                        consumed += take;
                        if self.buffer.len() == size {
                            self.state = State::Done(Body::Buffered);
                        }
                    }
                }
                State::Done(_) | State::Failed(_) => break,
            }
        }

        consumed
    }

    fn state_after_header(&self) -> State<'a> {
        let size = self.header.value();
        if self.max_size > 0 && size > self.max_size {
            State::Failed(ReadError::TooLarge {
                size,
                max: self.max_size,
            })
        } else if size == 0 {
            State::Done(Body::Empty)
        } else {
            State::ReadingBody
        }
    }

    pub fn done(&self) -> bool {
        matches!(self.state, State::Done(_) | State::Failed(_))
    }

    pub fn has_error(&self) -> bool {
        matches!(self.state, State::Failed(_))
    }

    pub fn error(&self) -> Option<ReadError> {
        match self.state {
            State::Failed(err) => Some(err),
            _ => None,
        }
    }

    /// The decoded bytes, or `None` until a message completed successfully.
    pub fn value(&self) -> Option<View<'_>> {
        match self.state {
            State::Done(Body::Empty) => Some(View::Input(&[])),
            State::Done(Body::Input(bytes)) => Some(View::Input(bytes)),
            State::Done(Body::Buffered) => Some(View::Buffered(&self.buffer)),
            _ => None,
        }
    }

    /// Encode `data` as a scalar message: `[header][data]`.
    ///
    /// An empty `data` produces the header alone.
    pub fn generate<'f>(
        data: &'f [u8],
        header: &'f mut [u8; SCALAR_HEADER_SIZE],
        out: &mut Vec<&'f [u8]>,
    ) -> Result<()> {
        let size = checked_size(data.len())?;
        Uint32Message::generate(header, size);
        let header: &'f [u8] = header;
        out.push(header);
        if !data.is_empty() {
            out.push(data);
        }
        Ok(())
    }

    /// Encode several blobs as one scalar message whose body is their
    /// concatenation: `[header][b0][b1]...`.
    pub fn generate_many<'f>(
        blobs: &[&'f [u8]],
        header: &'f mut [u8; SCALAR_HEADER_SIZE],
        out: &mut Vec<&'f [u8]>,
    ) -> Result<()> {
        let mut total = 0usize;
        for blob in blobs {
            checked_size(blob.len())?;
            total = total.saturating_add(blob.len());
        }
        let size = checked_size(total)?;

        Uint32Message::generate(header, size);
        let header: &'f [u8] = header;
        out.reserve(blobs.len() + 1);
        out.push(header);
        out.extend_from_slice(blobs);
        Ok(())
    }
}

fn checked_size(len: usize) -> Result<u32> {
    u32::try_from(len).map_err(|_| FrameError::ArgumentTooLarge {
        size: len,
        max: MAX_SCALAR_BODY,
    })
}
