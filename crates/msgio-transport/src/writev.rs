use std::io::{self, ErrorKind, IoSlice};

use tracing::trace;

use crate::batch::WriteBatch;
use crate::config::WriterConfig;
use crate::error::{Result, TransportError};
use crate::traits::VectoredSink;

/// Write every fragment of every collection, in order, using the system limits.
///
/// See [`write_all_vectored_with_config`].
pub fn write_all_vectored<S>(sink: &mut S, collections: &[&[&[u8]]]) -> Result<usize>
where
    S: VectoredSink + ?Sized,
{
    write_all_vectored_with_config(sink, collections, &WriterConfig::default())
}

/// Write every fragment of every collection, in order, before returning.
///
/// The fragments are sent with as few scatter/gather calls as the vector limit
/// allows. "Would block" and partial writes are absorbed by waiting for the
/// sink to become writable again; any other failure is returned as-is. Bytes
/// already accepted before a failure stay sent.
///
/// Returns the total number of bytes written. An empty input returns `Ok(0)`
/// without touching the sink.
pub fn write_all_vectored_with_config<S>(
    sink: &mut S,
    collections: &[&[&[u8]]],
    config: &WriterConfig,
) -> Result<usize>
where
    S: VectoredSink + ?Sized,
{
    let batch = WriteBatch::new(collections, config)?;
    if batch.is_empty() {
        return Ok(0);
    }

    let mut slices: Vec<IoSlice<'_>> =
        Vec::with_capacity(batch.max_vectors().min(batch.fragment_count()));

    for (index, mut group) in batch.groups().enumerate() {
        if group.is_done() {
            continue;
        }

        sink.wait_writable()?;
        loop {
            group.fill(&mut slices);
            match sink.write_vectored(&slices) {
                Ok(0) => return Err(io::Error::from(ErrorKind::WriteZero).into()),
                Ok(written) => {
                    group.advance(written)?;
                    if group.is_done() {
                        break;
                    }
                    trace!(
                        group = index,
                        written,
                        remaining = group.remaining(),
                        "partial vectored write"
                    );
                    sink.wait_writable()?;
                }
                Err(err) if err.kind() == ErrorKind::Interrupted => continue,
                Err(err) if err.kind() == ErrorKind::WouldBlock => {
                    trace!(group = index, "vectored write would block");
                    sink.wait_writable()?;
                }
                Err(err) => return Err(TransportError::Io(err)),
            }
        }
    }

    Ok(batch.total_size())
}

#[cfg(test)]
mod tests {
    use std::collections::VecDeque;

    use proptest::prelude::*;

    use super::*;

    /// What the scripted sink does on its next write attempt.
    #[derive(Debug, Clone, Copy)]
    enum Step {
        Accept(usize),
        WouldBlock,
        Interrupted,
        Fail(ErrorKind),
    }

    #[derive(Default)]
    struct ScriptedSink {
        script: VecDeque<Step>,
        data: Vec<u8>,
        writes: usize,
        waits: usize,
        max_vectors_seen: usize,
    }

    impl ScriptedSink {
        fn with_script(steps: impl IntoIterator<Item = Step>) -> Self {
            Self {
                script: steps.into_iter().collect(),
                ..Self::default()
            }
        }
    }

    impl VectoredSink for ScriptedSink {
        fn write_vectored(&mut self, bufs: &[IoSlice<'_>]) -> io::Result<usize> {
            self.writes += 1;
            self.max_vectors_seen = self.max_vectors_seen.max(bufs.len());

            let limit = match self.script.pop_front() {
                None => usize::MAX,
                Some(Step::Accept(n)) => n,
                Some(Step::WouldBlock) => return Err(io::Error::from(ErrorKind::WouldBlock)),
                Some(Step::Interrupted) => return Err(io::Error::from(ErrorKind::Interrupted)),
                Some(Step::Fail(kind)) => return Err(io::Error::from(kind)),
            };

            let mut accepted = 0;
            for buf in bufs {
                let take = buf.len().min(limit - accepted);
                self.data.extend_from_slice(&buf[..take]);
                accepted += take;
                if accepted == limit {
                    break;
                }
            }
            Ok(accepted)
        }

        fn wait_writable(&mut self) -> io::Result<()> {
            self.waits += 1;
            Ok(())
        }
    }

    fn config(max_vectors: usize) -> WriterConfig {
        WriterConfig::default().with_max_vectors(max_vectors)
    }

    #[test]
    fn writes_single_collection() {
        let mut sink = ScriptedSink::default();
        let frags: &[&[u8]] = &[b"hello ", b"world", b"\n"];

        let written = write_all_vectored(&mut sink, &[frags]).unwrap();

        assert_eq!(written, 12);
        assert_eq!(sink.data, b"hello world\n");
        assert_eq!(sink.writes, 1);
    }

    #[test]
    fn writes_multiple_collections_in_order() {
        let mut sink = ScriptedSink::default();
        let first: &[&[u8]] = &[b"hello ", b"world", b"\n"];
        let second: &[&[u8]] = &[b"another ", b"message\n"];

        let written = write_all_vectored(&mut sink, &[first, second]).unwrap();

        assert_eq!(written, 28);
        assert_eq!(sink.data, b"hello world\nanother message\n");
    }

    #[test]
    fn empty_input_makes_no_system_call() {
        let mut sink = ScriptedSink::default();
        assert_eq!(write_all_vectored(&mut sink, &[]).unwrap(), 0);

        let none: &[&[u8]] = &[];
        assert_eq!(write_all_vectored(&mut sink, &[none, none]).unwrap(), 0);

        assert_eq!(sink.writes, 0);
        assert_eq!(sink.waits, 0);
    }

    #[test]
    fn splits_into_groups_of_max_vectors() {
        let mut sink = ScriptedSink::default();
        let frags: Vec<&[u8]> = vec![&b"ab"[..]; 9];

        let written =
            write_all_vectored_with_config(&mut sink, &[frags.as_slice()], &config(4)).unwrap();

        assert_eq!(written, 18);
        assert_eq!(sink.data, b"ab".repeat(9));
        assert_eq!(sink.writes, 3);
        assert_eq!(sink.max_vectors_seen, 4);
    }

    #[test]
    fn partial_write_mid_fragment_resumes() {
        let mut sink = ScriptedSink::with_script([Step::Accept(3), Step::Accept(4)]);
        let frags: &[&[u8]] = &[b"hello", b"world"];

        let written = write_all_vectored(&mut sink, &[frags]).unwrap();

        assert_eq!(written, 10);
        assert_eq!(sink.data, b"helloworld");
        assert_eq!(sink.writes, 3);
    }

    #[test]
    fn partial_write_on_fragment_boundary_resumes() {
        let mut sink = ScriptedSink::with_script([Step::Accept(5)]);
        let frags: &[&[u8]] = &[b"hello", b"world"];

        write_all_vectored(&mut sink, &[frags]).unwrap();

        assert_eq!(sink.data, b"helloworld");
        assert_eq!(sink.writes, 2);
    }

    #[test]
    fn write_ending_on_group_boundary_moves_to_next_group() {
        // First group is "aabb"; the sink accepts exactly that.
        let mut sink = ScriptedSink::with_script([Step::Accept(4), Step::Accept(4)]);
        let frags: &[&[u8]] = &[b"aa", b"bb", b"cc", b"dd"];

        let written = write_all_vectored_with_config(&mut sink, &[frags], &config(2)).unwrap();

        assert_eq!(written, 8);
        assert_eq!(sink.data, b"aabbccdd");
        assert_eq!(sink.writes, 2);
    }

    #[test]
    fn would_block_waits_without_error() {
        let mut sink =
            ScriptedSink::with_script([Step::WouldBlock, Step::WouldBlock, Step::Accept(2)]);
        let frags: &[&[u8]] = &[b"abcd"];

        write_all_vectored(&mut sink, &[frags]).unwrap();

        assert_eq!(sink.data, b"abcd");
        assert_eq!(sink.writes, 4);
        // initial wait, two would-blocks, one partial write
        assert_eq!(sink.waits, 4);
    }

    #[test]
    fn interrupted_write_retries_immediately() {
        let mut sink = ScriptedSink::with_script([Step::Interrupted]);
        let frags: &[&[u8]] = &[b"retry"];

        write_all_vectored(&mut sink, &[frags]).unwrap();

        assert_eq!(sink.data, b"retry");
        assert_eq!(sink.waits, 1);
    }

    #[test]
    fn hard_error_is_surfaced_and_not_rolled_back() {
        let mut sink =
            ScriptedSink::with_script([Step::Accept(3), Step::Fail(ErrorKind::BrokenPipe)]);
        let frags: &[&[u8]] = &[b"hello", b"world"];

        let err = write_all_vectored(&mut sink, &[frags]).unwrap_err();

        assert!(matches!(err, TransportError::Io(e) if e.kind() == ErrorKind::BrokenPipe));
        assert_eq!(sink.data, b"hel");
    }

    #[test]
    fn zero_byte_write_is_an_error() {
        let mut sink = ScriptedSink::with_script([Step::Accept(0)]);
        let frags: &[&[u8]] = &[b"x"];

        let err = write_all_vectored(&mut sink, &[frags]).unwrap_err();
        assert!(matches!(err, TransportError::Io(e) if e.kind() == ErrorKind::WriteZero));
    }

    #[test]
    fn oversized_batch_is_rejected_before_writing() {
        let mut sink = ScriptedSink::default();
        let frags: &[&[u8]] = &[b"0123456789"];
        let cfg = WriterConfig {
            max_vectors: 16,
            max_total_size: 4,
        };

        let err = write_all_vectored_with_config(&mut sink, &[frags], &cfg).unwrap_err();

        assert!(matches!(err, TransportError::TooLarge { size: 10, max: 4 }));
        assert_eq!(sink.writes, 0);
    }

    #[test]
    fn groups_of_empty_fragments_are_skipped() {
        let mut sink = ScriptedSink::default();
        let frags: &[&[u8]] = &[b"", b"", b"ab", b"cd"];

        let written = write_all_vectored_with_config(&mut sink, &[frags], &config(2)).unwrap();

        assert_eq!(written, 4);
        assert_eq!(sink.data, b"abcd");
        assert_eq!(sink.writes, 1);
    }

    #[test]
    fn works_through_dyn_sink() {
        let mut sink = ScriptedSink::default();
        let dyn_sink: &mut dyn VectoredSink = &mut sink;
        let frags: &[&[u8]] = &[b"dyn"];

        write_all_vectored(dyn_sink, &[frags]).unwrap();
        assert_eq!(sink.data, b"dyn");
    }

    #[test]
    #[cfg(unix)]
    fn flushes_large_batch_through_nonblocking_socket() {
        use std::io::Read;
        use std::os::unix::net::UnixStream;

        use crate::traits::FdSink;

        let (left, mut right) = UnixStream::pair().unwrap();
        left.set_nonblocking(true).unwrap();

        let chunks: Vec<Vec<u8>> = (0..3000u32)
            .map(|i| vec![(i % 251) as u8; 700 + (i as usize % 13)])
            .collect();
        let frags: Vec<&[u8]> = chunks.iter().map(Vec::as_slice).collect();
        let expected: Vec<u8> = chunks.concat();
        let expected_len = expected.len();

        let reader = std::thread::spawn(move || {
            let mut received = vec![0u8; expected_len];
            right.read_exact(&mut received).unwrap();
            received
        });

        let mut sink = FdSink::from_fd(&left);
        let written =
            write_all_vectored_with_config(&mut sink, &[frags.as_slice()], &config(64)).unwrap();

        assert_eq!(written, expected_len);
        assert_eq!(reader.join().unwrap(), expected);
    }

    #[test]
    #[cfg(unix)]
    fn closed_peer_surfaces_os_error() {
        use std::os::unix::net::UnixStream;

        use crate::traits::FdSink;

        let (left, right) = UnixStream::pair().unwrap();
        drop(right);

        let mut sink = FdSink::from_fd(&left);
        let frags: &[&[u8]] = &[b"gone"];
        let err = write_all_vectored(&mut sink, &[frags]).unwrap_err();

        assert!(matches!(&err, TransportError::Io(e) if e.kind() == ErrorKind::BrokenPipe));
        assert_eq!(err.raw_os_error(), Some(libc::EPIPE));
    }

    proptest! {
        #[test]
        fn output_matches_concatenation_under_any_partial_writes(
            chunks in prop::collection::vec(prop::collection::vec(any::<u8>(), 0..40), 0..60),
            max_vectors in 1usize..8,
            caps in prop::collection::vec(1usize..64, 0..200),
        ) {
            let frags: Vec<&[u8]> = chunks.iter().map(Vec::as_slice).collect();
            let mut sink = ScriptedSink::with_script(caps.into_iter().map(Step::Accept));

            let written = write_all_vectored_with_config(
                &mut sink,
                &[frags.as_slice()],
                &config(max_vectors),
            )
            .unwrap();

            let expected = chunks.concat();
            prop_assert_eq!(written, expected.len());
            prop_assert_eq!(sink.data, expected);
            prop_assert!(sink.max_vectors_seen <= max_vectors);
        }
    }
}
