//! Owned-buffer encoding and decoding on top of `bytes`.
//!
//! The incremental readers borrow their input. When messages come from a
//! growable buffer instead (for example under `tokio_util::codec`), these
//! helpers decode straight out of a [`BytesMut`] and hand back cheap
//! reference-counted [`Bytes`] slices of it.

use bytes::{Buf, BufMut, Bytes, BytesMut};

use crate::array::{ARRAY_HEADER_SIZE, MAX_ARRAY_BODY};
use crate::error::{FrameError, Result};
use crate::scalar::{MAX_SCALAR_BODY, SCALAR_HEADER_SIZE};
use crate::view::scan_segments;

/// Encode `items` as one array message.
pub fn encode_array<T: AsRef<[u8]>>(items: &[T], dst: &mut BytesMut) -> Result<()> {
    let size = items
        .iter()
        .try_fold(0usize, |acc, item| acc.checked_add(item.as_ref().len() + 1))
        .unwrap_or(usize::MAX);
    if size > MAX_ARRAY_BODY {
        return Err(FrameError::ArgumentTooLarge {
            size,
            max: MAX_ARRAY_BODY,
        });
    }

    dst.reserve(ARRAY_HEADER_SIZE + size);
    dst.put_u16(size as u16);
    for item in items {
        dst.put_slice(item.as_ref());
        dst.put_u8(0);
    }
    Ok(())
}

/// Decode one array message from the front of `src`.
///
/// Returns `Ok(None)` if the buffer doesn't contain a complete message yet.
/// On success, consumes the message bytes from the buffer. `max_size` of 0
/// accepts any body length.
pub fn decode_array(src: &mut BytesMut, max_size: u16) -> Result<Option<Vec<Bytes>>> {
    if src.len() < ARRAY_HEADER_SIZE {
        return Ok(None);
    }

    let size = u16::from_be_bytes([src[0], src[1]]);
    if max_size > 0 && size > max_size {
        return Err(FrameError::TooLarge {
            size: size as usize,
            max: max_size as usize,
        });
    }

    let total = ARRAY_HEADER_SIZE + size as usize;
    if src.len() < total {
        src.reserve(total - src.len());
        return Ok(None);
    }

    src.advance(ARRAY_HEADER_SIZE);
    let body = src.split_to(size as usize).freeze();

    let mut spans = Vec::new();
    scan_segments(&body, &mut spans);
    Ok(Some(spans.into_iter().map(|span| body.slice(span.range())).collect()))
}

/// Encode `data` as one scalar message.
pub fn encode_scalar(data: &[u8], dst: &mut BytesMut) -> Result<()> {
    let size = u32::try_from(data.len()).map_err(|_| FrameError::ArgumentTooLarge {
        size: data.len(),
        max: MAX_SCALAR_BODY,
    })?;

    dst.reserve(SCALAR_HEADER_SIZE + data.len());
    dst.put_u32(size);
    dst.put_slice(data);
    Ok(())
}

/// Decode one scalar message from the front of `src`.
///
/// Same contract as [`decode_array`].
pub fn decode_scalar(src: &mut BytesMut, max_size: u32) -> Result<Option<Bytes>> {
    if src.len() < SCALAR_HEADER_SIZE {
        return Ok(None);
    }

    let size = u32::from_be_bytes([src[0], src[1], src[2], src[3]]);
    if max_size > 0 && size > max_size {
        return Err(FrameError::TooLarge {
            size: size as usize,
            max: max_size as usize,
        });
    }

    let total = SCALAR_HEADER_SIZE + size as usize;
    if src.len() < total {
        src.reserve(total - src.len());
        return Ok(None);
    }

    src.advance(SCALAR_HEADER_SIZE);
    Ok(Some(src.split_to(size as usize).freeze()))
}

/// Array message codec over owned buffers.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ArrayCodec {
    max_size: u16,
}

impl ArrayCodec {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_max_size(max_size: u16) -> Self {
        Self { max_size }
    }

    pub fn max_size(&self) -> u16 {
        self.max_size
    }
}

/// Scalar message codec over owned buffers.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ScalarCodec {
    max_size: u32,
}

impl ScalarCodec {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_max_size(max_size: u32) -> Self {
        Self { max_size }
    }

    pub fn max_size(&self) -> u32 {
        self.max_size
    }
}

#[cfg(feature = "async")]
mod tokio_codec {
    use bytes::{Bytes, BytesMut};
    use tokio_util::codec::{Decoder, Encoder};

    use super::{decode_array, decode_scalar, encode_array, encode_scalar, ArrayCodec, ScalarCodec};
    use crate::error::FrameError;

    impl Decoder for ArrayCodec {
        type Item = Vec<Bytes>;
        type Error = FrameError;

        fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
            decode_array(src, self.max_size)
        }

        fn decode_eof(&mut self, buf: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
            match self.decode(buf)? {
                Some(items) => Ok(Some(items)),
                None if buf.is_empty() => Ok(None),
                None => Err(FrameError::ConnectionClosed),
            }
        }
    }

    impl<T: AsRef<[u8]>> Encoder<Vec<T>> for ArrayCodec {
        type Error = FrameError;

        fn encode(&mut self, items: Vec<T>, dst: &mut BytesMut) -> Result<(), Self::Error> {
            encode_array(&items, dst)
        }
    }

    impl Decoder for ScalarCodec {
        type Item = Bytes;
        type Error = FrameError;

        fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
            decode_scalar(src, self.max_size)
        }

        fn decode_eof(&mut self, buf: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
            match self.decode(buf)? {
                Some(data) => Ok(Some(data)),
                None if buf.is_empty() => Ok(None),
                None => Err(FrameError::ConnectionClosed),
            }
        }
    }

    impl Encoder<Bytes> for ScalarCodec {
        type Error = FrameError;

        fn encode(&mut self, data: Bytes, dst: &mut BytesMut) -> Result<(), Self::Error> {
            encode_scalar(&data, dst)
        }
    }

    impl Encoder<&[u8]> for ScalarCodec {
        type Error = FrameError;

        fn encode(&mut self, data: &[u8], dst: &mut BytesMut) -> Result<(), Self::Error> {
            encode_scalar(data, dst)
        }
    }

    #[cfg(test)]
    mod tests {
        use futures_util::{SinkExt, StreamExt};
        use tokio_util::codec::{FramedRead, FramedWrite};

        use super::*;

        #[tokio::test]
        async fn arrays_through_framed_io() {
            let (client, server) = tokio::io::duplex(16);
            let mut tx = FramedWrite::new(client, ArrayCodec::new());
            let mut rx = FramedRead::new(server, ArrayCodec::new());

            let writer = tokio::spawn(async move {
                tx.send(vec![&b"GET"[..], b"/"]).await.unwrap();
                tx.send(Vec::<&[u8]>::new()).await.unwrap();
                tx.send(vec![Bytes::from_static(b"PATH"), Bytes::new()])
                    .await
                    .unwrap();
            });

            let first = rx.next().await.unwrap().unwrap();
            assert_eq!(first, vec![Bytes::from_static(b"GET"), Bytes::from_static(b"/")]);
            assert!(rx.next().await.unwrap().unwrap().is_empty());
            let third = rx.next().await.unwrap().unwrap();
            assert_eq!(third, vec![Bytes::from_static(b"PATH"), Bytes::new()]);

            writer.await.unwrap();
            assert!(rx.next().await.is_none());
        }

        #[tokio::test]
        async fn scalars_through_framed_io() {
            let (client, server) = tokio::io::duplex(8);
            let mut tx = FramedWrite::new(client, ScalarCodec::new());
            let mut rx = FramedRead::new(server, ScalarCodec::with_max_size(1024));

            let payload = vec![0xA5u8; 300];
            let expected = payload.clone();
            let writer = tokio::spawn(async move {
                tx.send(Bytes::from(payload)).await.unwrap();
                tx.send(Bytes::new()).await.unwrap();
            });

            assert_eq!(rx.next().await.unwrap().unwrap(), expected);
            assert!(rx.next().await.unwrap().unwrap().is_empty());
            writer.await.unwrap();
        }

        #[tokio::test]
        async fn truncated_stream_is_connection_closed() {
            let (mut client, server) = tokio::io::duplex(64);
            let mut rx = FramedRead::new(server, ScalarCodec::new());

            tokio::io::AsyncWriteExt::write_all(&mut client, &[0, 0, 0, 9, b'x'])
                .await
                .unwrap();
            drop(client);

            let err = rx.next().await.unwrap().unwrap_err();
            assert!(matches!(err, FrameError::ConnectionClosed));
        }

        struct FailingRead;

        impl tokio::io::AsyncRead for FailingRead {
            fn poll_read(
                self: std::pin::Pin<&mut Self>,
                _cx: &mut std::task::Context<'_>,
                _buf: &mut tokio::io::ReadBuf<'_>,
            ) -> std::task::Poll<std::io::Result<()>> {
                std::task::Poll::Ready(Err(std::io::Error::from(
                    std::io::ErrorKind::ConnectionReset,
                )))
            }
        }

        #[tokio::test]
        async fn stream_read_failure_is_io_error() {
            let mut rx = FramedRead::new(FailingRead, ScalarCodec::new());

            let err = rx.next().await.unwrap().unwrap_err();
            match err {
                FrameError::Io(source) => {
                    assert_eq!(source.kind(), std::io::ErrorKind::ConnectionReset)
                }
                other => panic!("expected Io, got {other:?}"),
            }
        }

        #[tokio::test]
        async fn oversized_frame_is_rejected() {
            let (mut client, server) = tokio::io::duplex(64);
            let mut rx = FramedRead::new(server, ArrayCodec::with_max_size(2));

            tokio::io::AsyncWriteExt::write_all(&mut client, b"\x00\x04ab\0\0")
                .await
                .unwrap();

            let err = rx.next().await.unwrap().unwrap_err();
            assert!(matches!(err, FrameError::TooLarge { size: 4, max: 2 }));
        }
    }
}
