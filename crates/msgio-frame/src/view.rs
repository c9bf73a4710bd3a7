//! Borrowed results of array and scalar readers.
//!
//! A reader hands out its decoded message without copying whenever it can.
//! [`View`] records where the bytes live:
//!
//! - [`View::Input`] points into the slice that was passed to `feed()`. It is
//!   produced when a whole message arrived in one call with nothing buffered
//!   before it.
//! - [`View::Buffered`] points into the reader's own accumulation buffer. It is
//!   produced when the message was split across several `feed()` calls.
//!
//! Both borrow the reader, so neither can be held across `reset()`.

use std::collections::HashMap;
use std::ops::Deref;

/// Bytes of a decoded message, tagged with their owner.
#[derive(Debug, Clone, Copy)]
pub enum View<'v> {
    /// Borrowed from the caller's input.
    Input(&'v [u8]),
    /// Borrowed from the reader's internal buffer.
    Buffered(&'v [u8]),
}

impl<'v> View<'v> {
    pub fn as_bytes(&self) -> &'v [u8] {
        match *self {
            View::Input(bytes) | View::Buffered(bytes) => bytes,
        }
    }

    /// True when the bytes were never copied out of the caller's input.
    pub fn is_zero_copy(&self) -> bool {
        matches!(self, View::Input(_))
    }

    /// Re-tag a sub-range with the same origin.
    pub(crate) fn slice(&self, start: usize, end: usize) -> View<'v> {
        match *self {
            View::Input(bytes) => View::Input(&bytes[start..end]),
            View::Buffered(bytes) => View::Buffered(&bytes[start..end]),
        }
    }
}

impl Deref for View<'_> {
    type Target = [u8];

    fn deref(&self) -> &[u8] {
        self.as_bytes()
    }
}

impl AsRef<[u8]> for View<'_> {
    fn as_ref(&self) -> &[u8] {
        self.as_bytes()
    }
}

/// Position of one NUL-terminated segment inside an array body.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Span {
    start: u16,
    end: u16,
}

impl Span {
    pub(crate) fn range(self) -> std::ops::Range<usize> {
        self.start as usize..self.end as usize
    }
}

/// Record every NUL-terminated segment of `body` into `spans`.
///
/// Bytes after the last NUL do not form a segment.
pub(crate) fn scan_segments(body: &[u8], spans: &mut Vec<Span>) {
    debug_assert!(body.len() <= u16::MAX as usize);
    let mut start = 0usize;
    while let Some(pos) = body[start..].iter().position(|&b| b == 0) {
        let end = start + pos;
        spans.push(Span {
            start: start as u16,
            end: end as u16,
        });
        start = end + 1;
    }
}

/// Decoded segments of an array message.
#[derive(Debug, Clone, Copy)]
pub struct ArrayView<'v> {
    body: View<'v>,
    spans: &'v [Span],
}

impl<'v> ArrayView<'v> {
    pub(crate) fn new(body: View<'v>, spans: &'v [Span]) -> Self {
        Self { body, spans }
    }

    /// Number of segments.
    pub fn len(&self) -> usize {
        self.spans.len()
    }

    pub fn is_empty(&self) -> bool {
        self.spans.is_empty()
    }

    /// Segment `index`, without its terminator.
    pub fn get(&self, index: usize) -> Option<&'v [u8]> {
        self.spans
            .get(index)
            .map(|span| &self.body.as_bytes()[span.range()])
    }

    /// Segment `index` tagged with its origin.
    pub fn view(&self, index: usize) -> Option<View<'v>> {
        self.spans
            .get(index)
            .map(|span| self.body.slice(span.start as usize, span.end as usize))
    }

    /// Segments in order of appearance.
    pub fn iter(&self) -> Segments<'v> {
        Segments {
            body: self.body.as_bytes(),
            spans: self.spans.iter(),
        }
    }

    /// Segments paired up as `(key, value)`; a trailing unpaired key is dropped.
    pub fn pairs(&self) -> impl Iterator<Item = (&'v [u8], &'v [u8])> + 'v {
        let body = self.body.as_bytes();
        self.spans.chunks_exact(2).map(move |pair| {
            (&body[pair[0].range()], &body[pair[1].range()])
        })
    }

    /// Segment pairs collected into a map; a repeated key keeps its last value.
    pub fn pair_map(&self) -> HashMap<&'v [u8], &'v [u8]> {
        self.pairs().collect()
    }

    /// True when every segment points into the caller's input.
    pub fn is_zero_copy(&self) -> bool {
        self.body.is_zero_copy()
    }

    /// Copy every segment out.
    pub fn to_vec(&self) -> Vec<Vec<u8>> {
        self.iter().map(<[u8]>::to_vec).collect()
    }
}

impl<'v> IntoIterator for ArrayView<'v> {
    type Item = &'v [u8];
    type IntoIter = Segments<'v>;

    fn into_iter(self) -> Segments<'v> {
        self.iter()
    }
}

/// Iterator over the segments of an [`ArrayView`].
#[derive(Debug, Clone)]
pub struct Segments<'v> {
    body: &'v [u8],
    spans: std::slice::Iter<'v, Span>,
}

impl<'v> Iterator for Segments<'v> {
    type Item = &'v [u8];

    fn next(&mut self) -> Option<&'v [u8]> {
        self.spans
            .next()
            .map(|span| &self.body[span.range()])
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.spans.size_hint()
    }
}

impl ExactSizeIterator for Segments<'_> {}

/// Split `key\0value\0key\0value\0...` into pairs.
///
/// A key without a terminated value is ignored, as is anything after the
/// final NUL. Repeated keys are all returned in wire order; use
/// [`split_pairs_map`] for lookup semantics.
pub fn split_pairs(data: &[u8]) -> Vec<(&[u8], &[u8])> {
    let mut pairs = Vec::new();
    let mut fields = data.split(|&b| b == 0);
    let terminated = data.iter().filter(|&&b| b == 0).count();

    for _ in 0..terminated / 2 {
        match (fields.next(), fields.next()) {
            (Some(key), Some(value)) => pairs.push((key, value)),
            _ => break,
        }
    }
    pairs
}

/// Like [`split_pairs`], collected into a map. A repeated key keeps its last value.
pub fn split_pairs_map(data: &[u8]) -> HashMap<&[u8], &[u8]> {
    split_pairs(data).into_iter().collect()
}
