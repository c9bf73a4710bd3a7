use msgio_transport::{write_all_vectored_with_config, VectoredSink, WriterConfig};
use tracing::trace;

use crate::array::{ArrayMessage, ARRAY_HEADER_SIZE};
use crate::error::Result;
use crate::integer::{Uint16Message, Uint32Message};
use crate::scalar::{ScalarMessage, SCALAR_HEADER_SIZE};

/// Generates messages and flushes them through the vectorized writer.
///
/// Every `send_*` call writes the complete message before returning, waiting
/// on the sink as often as needed. Payloads are never copied.
pub struct MessageWriter<S> {
    inner: S,
    config: WriterConfig,
}

impl<S: VectoredSink> MessageWriter<S> {
    /// Create a new message writer with the system vector limits.
    pub fn new(inner: S) -> Self {
        Self::with_config(inner, WriterConfig::default())
    }

    /// Create a new message writer with explicit configuration.
    pub fn with_config(inner: S, config: WriterConfig) -> Self {
        Self { inner, config }
    }

    /// Send one array message. Returns the bytes written.
    pub fn send_array(&mut self, items: &[&[u8]]) -> Result<usize> {
        let mut header = [0u8; ARRAY_HEADER_SIZE];
        let mut fragments = Vec::with_capacity(ArrayMessage::output_size(items.len()));
        ArrayMessage::generate(items, &mut header, &mut fragments)?;
        self.flush(&[fragments.as_slice()])
    }

    /// Send one scalar message.
    pub fn send_scalar(&mut self, data: &[u8]) -> Result<usize> {
        let mut header = [0u8; SCALAR_HEADER_SIZE];
        let mut fragments = Vec::with_capacity(2);
        ScalarMessage::generate(data, &mut header, &mut fragments)?;
        self.flush(&[fragments.as_slice()])
    }

    /// Send one scalar message whose body is the concatenation of `blobs`.
    pub fn send_scalar_parts(&mut self, blobs: &[&[u8]]) -> Result<usize> {
        let mut header = [0u8; SCALAR_HEADER_SIZE];
        let mut fragments = Vec::with_capacity(blobs.len() + 1);
        ScalarMessage::generate_many(blobs, &mut header, &mut fragments)?;
        self.flush(&[fragments.as_slice()])
    }

    /// Send several scalar messages back to back in one batch.
    pub fn send_scalars(&mut self, blobs: &[&[u8]]) -> Result<usize> {
        let mut headers = vec![[0u8; SCALAR_HEADER_SIZE]; blobs.len()];
        let mut fragments = Vec::with_capacity(blobs.len() * 2);
        for (header, &blob) in headers.iter_mut().zip(blobs) {
            ScalarMessage::generate(blob, header, &mut fragments)?;
        }
        self.flush(&[fragments.as_slice()])
    }

    /// Send a 16-bit integer.
    pub fn send_u16(&mut self, value: u16) -> Result<usize> {
        let mut buf = [0u8; 2];
        Uint16Message::generate(&mut buf, value);
        let fragment: &[&[u8]] = &[&buf];
        self.flush(&[fragment])
    }

    /// Send a 32-bit integer.
    pub fn send_u32(&mut self, value: u32) -> Result<usize> {
        let mut buf = [0u8; 4];
        Uint32Message::generate(&mut buf, value);
        let fragment: &[&[u8]] = &[&buf];
        self.flush(&[fragment])
    }

    /// Write pre-generated fragment collections in order.
    pub fn send_all(&mut self, collections: &[&[&[u8]]]) -> Result<usize> {
        self.flush(collections)
    }

    fn flush(&mut self, collections: &[&[&[u8]]]) -> Result<usize> {
        let written = write_all_vectored_with_config(&mut self.inner, collections, &self.config)?;
        trace!(collections = collections.len(), written, "messages flushed");
        Ok(written)
    }

    /// Borrow the underlying sink.
    pub fn get_ref(&self) -> &S {
        &self.inner
    }

    /// Mutably borrow the underlying sink.
    pub fn get_mut(&mut self) -> &mut S {
        &mut self.inner
    }

    /// Consume the writer and return the inner sink.
    pub fn into_inner(self) -> S {
        self.inner
    }

    /// Current writer configuration.
    pub fn config(&self) -> &WriterConfig {
        &self.config
    }
}

impl<S> std::fmt::Debug for MessageWriter<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MessageWriter")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use std::io::{self, ErrorKind, IoSlice};

    use msgio_transport::TransportError;

    use super::*;
    use crate::error::FrameError;
    use crate::reader::feed_all;

    #[derive(Default)]
    struct CollectingSink {
        data: Vec<u8>,
        writes: usize,
        chunk: Option<usize>,
        fail: Option<ErrorKind>,
    }

    impl VectoredSink for CollectingSink {
        fn write_vectored(&mut self, bufs: &[IoSlice<'_>]) -> io::Result<usize> {
            self.writes += 1;
            if let Some(kind) = self.fail {
                return Err(io::Error::from(kind));
            }
            let limit = self.chunk.unwrap_or(usize::MAX);
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
            Ok(())
        }
    }

    #[test]
    fn send_array_writes_wire_format() {
        let mut writer = MessageWriter::new(CollectingSink::default());
        let written = writer.send_array(&[b"GET", b"/", b"HTTP/1.1"]).unwrap();

        assert_eq!(written, 17);
        assert_eq!(writer.get_ref().data, b"\x00\x0FGET\0/\0HTTP/1.1\0");
        assert_eq!(writer.get_ref().writes, 1);
    }

    #[test]
    fn send_scalar_and_integers() {
        let mut writer = MessageWriter::new(CollectingSink::default());
        writer.send_scalar(b"hi").unwrap();
        writer.send_scalar(b"").unwrap();
        writer.send_u16(0x0102).unwrap();
        writer.send_u32(7).unwrap();

        assert_eq!(
            writer.into_inner().data,
            b"\x00\x00\x00\x02hi\x00\x00\x00\x00\x01\x02\x00\x00\x00\x07"
        );
    }

    #[test]
    fn send_scalar_parts_is_one_message() {
        let mut writer = MessageWriter::new(CollectingSink::default());
        writer.send_scalar_parts(&[b"ab", b"cd"]).unwrap();
        assert_eq!(writer.get_ref().data, b"\x00\x00\x00\x04abcd");
    }

    #[test]
    fn send_scalars_batches_into_one_write() {
        let mut writer = MessageWriter::new(CollectingSink::default());
        writer.send_scalars(&[b"one", b"two", b"three"]).unwrap();

        let sink = writer.into_inner();
        assert_eq!(sink.writes, 1);

        let mut reader = ScalarMessage::new();
        let mut seen = Vec::new();
        feed_all(&mut reader, &sink.data, |msg| {
            seen.push(msg.value().unwrap().to_vec());
        })
        .unwrap();
        assert_eq!(seen, vec![b"one".to_vec(), b"two".to_vec(), b"three".to_vec()]);
    }

    #[test]
    fn small_vector_limit_and_partial_writes_still_deliver_everything() {
        let sink = CollectingSink {
            chunk: Some(3),
            ..CollectingSink::default()
        };
        let config = WriterConfig::default().with_max_vectors(2);
        let mut writer = MessageWriter::with_config(sink, config);

        let items: &[&[u8]] = &[b"alpha", b"beta", b"gamma", b"delta"];
        let written = writer.send_array(items).unwrap();

        let data = &writer.get_ref().data;
        assert_eq!(written, data.len());
        let mut reader = ArrayMessage::new();
        reader.feed(data);
        assert_eq!(reader.value().unwrap().to_vec(), vec![
            b"alpha".to_vec(),
            b"beta".to_vec(),
            b"gamma".to_vec(),
            b"delta".to_vec(),
        ]);
        assert_eq!(writer.config().max_vectors, 2);
    }

    #[test]
    fn send_all_keeps_collection_order() {
        let mut writer = MessageWriter::new(CollectingSink::default());
        let first: &[&[u8]] = &[b"a", b"b"];
        let second: &[&[u8]] = &[b"c"];
        assert_eq!(writer.send_all(&[first, second]).unwrap(), 3);
        assert_eq!(writer.get_ref().data, b"abc");
    }

    #[test]
    fn oversized_array_fails_before_writing() {
        let big = vec![b'x'; 70_000];
        let mut writer = MessageWriter::new(CollectingSink::default());

        let err = writer.send_array(&[big.as_slice()]).unwrap_err();
        assert!(matches!(err, FrameError::ArgumentTooLarge { .. }));
        assert_eq!(writer.get_ref().writes, 0);
    }

    #[test]
    fn sink_errors_surface_as_transport_errors() {
        let sink = CollectingSink {
            fail: Some(ErrorKind::BrokenPipe),
            ..CollectingSink::default()
        };
        let mut writer = MessageWriter::new(sink);

        let err = writer.send_scalar(b"x").unwrap_err();
        match err {
            FrameError::Transport(TransportError::Io(io)) => {
                assert_eq!(io.kind(), ErrorKind::BrokenPipe)
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn accessors_and_into_inner() {
        let mut writer = MessageWriter::new(CollectingSink::default());
        writer.get_mut().writes = 5;
        assert_eq!(writer.get_ref().writes, 5);
        assert!(format!("{writer:?}").contains("MessageWriter"));
        let _inner = writer.into_inner();
    }

    #[cfg(unix)]
    #[test]
    fn writes_through_fd_sink() {
        use std::io::Read;
        use std::os::unix::net::UnixStream;

        use msgio_transport::FdSink;

        let (left, mut right) = UnixStream::pair().unwrap();
        let mut writer = MessageWriter::new(FdSink::from_fd(&left));
        writer.send_array(&[b"k", b"v"]).unwrap();
        drop(writer);
        drop(left);

        let mut wire = Vec::new();
        right.read_to_end(&mut wire).unwrap();
        assert_eq!(wire, b"\x00\x04k\0v\0");
    }
}
