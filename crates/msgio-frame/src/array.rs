use crate::error::{FrameError, ReadError, Result};
use crate::integer::Uint16Message;
use crate::view::{scan_segments, ArrayView, Span, View};

/// Array header: 16-bit big-endian body length.
pub const ARRAY_HEADER_SIZE: usize = 2;

/// Largest body an array message can describe.
pub const MAX_ARRAY_BODY: usize = u16::MAX as usize;

const TERMINATOR: &[u8] = b"\0";

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

/// Incremental reader and generator for array messages.
///
/// Wire format:
/// ```text
/// ┌───────────────┬──────────────────────────────────────┐
/// │ Length (2B BE)│ item0 \0 item1 \0 ... itemN \0       │
/// └───────────────┴──────────────────────────────────────┘
/// ```
/// A length of 0 is an empty array.
///
/// `'a` is the lifetime of the bytes passed to [`feed`](Self::feed). When a
/// whole message arrives in one call the decoded items borrow those bytes
/// directly; otherwise they borrow the reader's own buffer.
#[derive(Debug)]
pub struct ArrayMessage<'a> {
    header: Uint16Message,
    state: State<'a>,
    buffer: Vec<u8>,
    spans: Vec<Span>,
    max_size: u16,
    to_reserve: u16,
}

impl Default for ArrayMessage<'_> {
    fn default() -> Self {
        Self::new()
    }
}

impl<'a> ArrayMessage<'a> {
    pub fn new() -> Self {
        Self {
            header: Uint16Message::new(),
            state: State::ReadingHeader,
            buffer: Vec::new(),
            spans: Vec::new(),
            max_size: 0,
            to_reserve: 0,
        }
    }

    /// A reader that rejects bodies longer than `max_size` bytes (0 = unbounded).
    pub fn with_max_size(max_size: u16) -> Self {
        let mut msg = Self::new();
        msg.set_max_size(max_size);
        msg
    }

    /// Expect about `count` items per message. Kept across resets.
    pub fn reserve(&mut self, count: u16) {
        self.to_reserve = count;
        self.spans.reserve(count as usize);
    }

    /// Reject bodies longer than `max_size` bytes. 0 means unbounded.
    pub fn set_max_size(&mut self, max_size: u16) {
        self.max_size = max_size;
    }

    pub fn max_size(&self) -> u16 {
        self.max_size
    }

    /// Prepare to read the next message. Invalidates every previous result.
    pub fn reset(&mut self) {
        self.state = State::ReadingHeader;
        self.header.reset();
        self.buffer.clear();
        self.spans.clear();
        self.spans.reserve(self.to_reserve as usize);
    }

    /// Reset and rebind to input with a different lifetime, keeping the
    /// configuration and any allocated buffers.
    pub fn recycle<'b>(self) -> ArrayMessage<'b> {
        let mut next = ArrayMessage {
            header: self.header,
            state: State::ReadingHeader,
            buffer: self.buffer,
            spans: self.spans,
            max_size: self.max_size,
            to_reserve: self.to_reserve,
        };
        next.reset();
        next
    }

    /// Consume message bytes from the front of `data`.
    ///
    /// Returns how many bytes belonged to this message. Once [`done`](Self::done)
    /// is true every further call returns 0 until [`reset`](Self::reset).
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
                        let body = &rest[..size];
                        scan_segments(body, &mut self.spans);
                        self.state = State::Done(Body::Input(body));
                        consumed += size;
                    } else {
                        let take = rest.len().min(size - self.buffer.len());
                        if self.buffer.capacity() < size {
                            self.buffer.reserve_exact(size - self.buffer.len());
                        }
                        self.buffer.extend_from_slice(&rest[..take]);
                        consumed += take;
                        if self.buffer.len() == size {
                            scan_segments(&self.buffer, &mut self.spans);
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
                size: size as u32,
                max: self.max_size as u32,
            })
        } else if size == 0 {
            State::Done(Body::Empty)
        } else {
            State::ReadingBody
        }
    }

    /// True once a message was decoded or an error was found.
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

    /// The decoded items, or `None` until a message completed successfully.
    pub fn value(&self) -> Option<ArrayView<'_>> {
        let body = match self.state {
            State::Done(Body::Empty) => View::Input(&[]),
            State::Done(Body::Input(bytes)) => View::Input(bytes),
            State::Done(Body::Buffered) => View::Buffered(&self.buffer),
            _ => return None,
        };
        Some(ArrayView::new(body, &self.spans))
    }

    /// Number of fragments [`generate`](Self::generate) produces for `count` items.
    pub fn output_size(count: usize) -> usize {
        count * 2 + 1
    }

    /// Encode `items` as an array message without copying them.
    ///
    /// Writes the length header into `header` and appends exactly
    /// [`output_size(items.len())`](Self::output_size) fragments to `out`:
    /// `[header][item0]["\0"][item1]["\0"]...`. The fragments borrow `header`
    /// and `items`, which must therefore outlive the write.
    pub fn generate<'f>(
        items: &[&'f [u8]],
        header: &'f mut [u8; ARRAY_HEADER_SIZE],
        out: &mut Vec<&'f [u8]>,
    ) -> Result<()> {
        let size = items
            .iter()
            .try_fold(0usize, |acc, item| acc.checked_add(item.len() + 1))
            .unwrap_or(usize::MAX);
        if size > MAX_ARRAY_BODY {
            return Err(FrameError::ArgumentTooLarge {
                size,
                max: MAX_ARRAY_BODY,
            });
        }

        Uint16Message::generate(header, size as u16);
        let header: &'f [u8] = header;
        out.reserve(Self::output_size(items.len()));
        out.push(header);
        for &item in items {
            out.push(item);
            out.push(TERMINATOR);
        }
        Ok(())
    }
}
