use std::io::{self, ErrorKind, IoSlice};
use std::os::fd::AsRawFd;

use tokio::io::unix::AsyncFd;
use tracing::trace;

use crate::batch::WriteBatch;
use crate::config::WriterConfig;
use crate::error::{Result, TransportError};
use crate::traits::writev;

/// Async counterpart of [`write_all_vectored_with_config`](crate::write_all_vectored_with_config).
///
/// Writability waits go through the tokio reactor, so the task yields instead
/// of parking a thread. The descriptor inside `fd` must be in non-blocking mode.
pub async fn write_all_vectored_async<T: AsRawFd>(
    fd: &AsyncFd<T>,
    collections: &[&[&[u8]]],
    config: &WriterConfig,
) -> Result<usize> {
    let batch = WriteBatch::new(collections, config)?;
    if batch.is_empty() {
        return Ok(0);
    }

    let mut slices: Vec<IoSlice<'_>> =
        Vec::with_capacity(batch.max_vectors().min(batch.fragment_count()));

    for (index, mut group) in batch.groups().enumerate() {
        while !group.is_done() {
            let mut guard = fd.writable().await?;
            group.fill(&mut slices);

            match guard.try_io(|inner| writev(inner.as_raw_fd(), &slices)) {
                Ok(Ok(0)) => return Err(io::Error::from(ErrorKind::WriteZero).into()),
                Ok(Ok(written)) => {
                    group.advance(written)?;
                    if !group.is_done() {
                        trace!(
                            group = index,
                            written,
                            remaining = group.remaining(),
                            "partial vectored write"
                        );
                    }
                }
                Ok(Err(err)) if err.kind() == ErrorKind::Interrupted => continue,
                Ok(Err(err)) => return Err(TransportError::Io(err)),
                Err(_would_block) => {
                    trace!(group = index, "vectored write would block");
                }
            }
        }
    }

    Ok(batch.total_size())
}
