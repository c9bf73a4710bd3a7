use crate::array::ArrayMessage;
use crate::error::{ReadError, Result};
use crate::integer::{IntMessage, WireInt};
use crate::scalar::ScalarMessage;
use crate::view::{ArrayView, View};

/// Common interface of the incremental readers.
///
/// `'a` is the lifetime of the input handed to [`feed`](Self::feed).
pub trait MessageReader<'a> {
    /// Decoded message, borrowing the reader.
    type Output<'v>
    where
        Self: 'v;

    /// Consume bytes from the front of `data`; returns how many were used.
    fn feed(&mut self, data: &'a [u8]) -> usize;

    /// True once a message was decoded or an error was found.
    fn done(&self) -> bool;

    fn has_error(&self) -> bool {
        self.error().is_some()
    }

    fn error(&self) -> Option<ReadError> {
        None
    }

    /// The decoded message once done without error.
    fn value(&self) -> Option<Self::Output<'_>>;

    /// Forget the current message and start over.
    fn reset(&mut self);
}

impl<'a, T: WireInt> MessageReader<'a> for IntMessage<T> {
    type Output<'v>
        = T
    where
        Self: 'v;

    fn feed(&mut self, data: &'a [u8]) -> usize {
        IntMessage::feed(self, data)
    }

    fn done(&self) -> bool {
        IntMessage::done(self)
    }

    fn value(&self) -> Option<T> {
        IntMessage::done(self).then(|| IntMessage::value(self))
    }

    fn reset(&mut self) {
        IntMessage::reset(self)
    }
}

impl<'a> MessageReader<'a> for ArrayMessage<'a> {
    type Output<'v>
        = ArrayView<'v>
    where
        Self: 'v;

    fn feed(&mut self, data: &'a [u8]) -> usize {
        ArrayMessage::feed(self, data)
    }

    fn done(&self) -> bool {
        ArrayMessage::done(self)
    }

    fn has_error(&self) -> bool {
        ArrayMessage::has_error(self)
    }

    fn error(&self) -> Option<ReadError> {
        ArrayMessage::error(self)
    }

    fn value(&self) -> Option<ArrayView<'_>> {
        ArrayMessage::value(self)
    }

    fn reset(&mut self) {
        ArrayMessage::reset(self)
    }
}

impl<'a> MessageReader<'a> for ScalarMessage<'a> {
    type Output<'v>
        = View<'v>
    where
        Self: 'v;

    fn feed(&mut self, data: &'a [u8]) -> usize {
        ScalarMessage::feed(self, data)
    }

    fn done(&self) -> bool {
        ScalarMessage::done(self)
    }

    fn has_error(&self) -> bool {
        ScalarMessage::has_error(self)
    }

    fn error(&self) -> Option<ReadError> {
        ScalarMessage::error(self)
    }

    fn value(&self) -> Option<View<'_>> {
        ScalarMessage::value(self)
    }

    fn reset(&mut self) {
        ScalarMessage::reset(self)
    }
}

/// Feed `data` to `reader`, calling `on_message` for every message it
/// completes and resetting the reader after each one.
///
/// A message cut off at the end of `data` stays in progress inside the
/// reader, so the next chunk can continue it. Returns the number of bytes
/// consumed, which is all of `data` unless the reader failed; in that case
/// the error is returned and the reader is left in its failed state.
pub fn feed_all<'a, R, F>(reader: &mut R, mut data: &'a [u8], mut on_message: F) -> Result<usize>
where
    R: MessageReader<'a> + ?Sized,
    F: FnMut(&R),
{
    let mut consumed = 0;

    loop {
        let used = reader.feed(data);
        consumed += used;
        data = &data[used..];

        if !reader.done() {
            return Ok(consumed);
        }
        if let Some(err) = reader.error() {
            return Err(err.into());
        }
        on_message(reader);
        reader.reset();

        if data.is_empty() {
            return Ok(consumed);
        }
    }
}
