//! Planning for multi-call vectored writes.
//!
//! A single `writev(2)` call accepts at most `IOV_MAX` vectors, so a batch of
//! fragments is split into consecutive groups. Each group is flushed through a
//! [`GroupCursor`]: an index into the immutable fragment list plus an offset
//! into the fragment that was only partly sent.

use std::io::IoSlice;

use crate::config::WriterConfig;
use crate::error::{Result, TransportError};

/// A flattened, size-checked list of fragments ready to be written.
#[derive(Debug)]
pub struct WriteBatch<'a> {
    fragments: Vec<&'a [u8]>,
    total_size: usize,
    max_vectors: usize,
}

impl<'a> WriteBatch<'a> {
    /// Flatten `collections` in order and check the combined size.
    pub fn new(collections: &[&[&'a [u8]]], config: &WriterConfig) -> Result<Self> {
        let count = collections.iter().map(|c| c.len()).sum();
        let mut fragments = Vec::with_capacity(count);
        let mut total_size = 0usize;

        for fragment in collections.iter().flat_map(|c| c.iter()) {
            total_size = total_size
                .checked_add(fragment.len())
                .ok_or(TransportError::TooLarge {
                    size: usize::MAX,
                    max: config.max_total_size,
                })?;
            fragments.push(*fragment);
        }

        if total_size > config.max_total_size {
            return Err(TransportError::TooLarge {
                size: total_size,
                max: config.max_total_size,
            });
        }

        Ok(Self {
            fragments,
            total_size,
            max_vectors: config.max_vectors.max(1),
        })
    }

    /// Combined size of every fragment.
    pub fn total_size(&self) -> usize {
        self.total_size
    }

    /// Number of fragments across all collections.
    pub fn fragment_count(&self) -> usize {
        self.fragments.len()
    }

    /// True when there is nothing to write at all.
    pub fn is_empty(&self) -> bool {
        self.fragments.is_empty()
    }

    /// Vectors per group.
    pub fn max_vectors(&self) -> usize {
        self.max_vectors
    }

    /// `ceil(fragment_count / max_vectors)`.
    pub fn group_count(&self) -> usize {
        self.fragments.len().div_ceil(self.max_vectors)
    }

    /// Fresh cursors for each group, in write order.
    pub fn groups(&self) -> impl Iterator<Item = GroupCursor<'_, 'a>> + '_ {
        self.fragments.chunks(self.max_vectors).map(GroupCursor::new)
    }
}

/// Progress through one group of at most `max_vectors` fragments.
#[derive(Debug, Clone)]
pub struct GroupCursor<'b, 'a> {
    fragments: &'b [&'a [u8]],
    index: usize,
    offset: usize,
    remaining: usize,
}

impl<'b, 'a> GroupCursor<'b, 'a> {
    fn new(fragments: &'b [&'a [u8]]) -> Self {
        Self {
            fragments,
            index: 0,
            offset: 0,
            remaining: fragments.iter().map(|f| f.len()).sum(),
        }
    }

    /// Bytes of this group not yet accepted by the destination.
    pub fn remaining(&self) -> usize {
        self.remaining
    }

    /// True once every byte of the group has been written.
    pub fn is_done(&self) -> bool {
        self.remaining == 0
    }

    /// Number of vectors the next write attempt will carry.
    pub fn pending_vectors(&self) -> usize {
        self.fragments.len() - self.index
    }

    /// Replace the contents of `out` with vectors for the unsent bytes.
    pub fn fill(&self, out: &mut Vec<IoSlice<'a>>) {
        out.clear();
        let Some((first, rest)) = self.fragments[self.index..].split_first() else {
            return;
        };
        let first: &'a [u8] = *first;
        out.push(IoSlice::new(&first[self.offset..]));
        out.extend(rest.iter().map(|fragment| IoSlice::new(*fragment)));
    }

    /// Record that `written` more bytes were accepted.
    ///
    /// Fully sent fragments are skipped and a partly sent one keeps an offset,
    /// so the next [`fill`](Self::fill) starts exactly at the first unsent byte.
    pub fn advance(&mut self, written: usize) -> Result<()> {
        if written > self.remaining {
            return Err(TransportError::UnexpectedWrite {
                written,
                remaining: self.remaining,
            });
        }
        self.remaining -= written;

        let mut left = written;
        while left > 0 {
            let unsent = self.fragments[self.index].len() - self.offset;
            if left >= unsent {
                left -= unsent;
                self.index += 1;
                self.offset = 0;
            } else {
                self.offset += left;
                left = 0;
            }
        }
        Ok(())
    }
}
