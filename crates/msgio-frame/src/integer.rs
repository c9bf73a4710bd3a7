//! Fixed-width big-endian integers.
//!
//! These never fail: any `size_of::<T>()` bytes form a valid value. They are
//! also the length headers of array (16-bit) and scalar (32-bit) messages.

mod sealed {
    pub trait Sealed {}
    impl Sealed for u16 {}
    impl Sealed for u32 {}
}

/// An unsigned integer with a fixed big-endian wire encoding.
pub trait WireInt: Copy + Default + std::fmt::Debug + sealed::Sealed {
    /// Encoded width in bytes.
    const SIZE: usize;

    /// Byte array holding one encoded value.
    type Bytes: AsRef<[u8]> + AsMut<[u8]> + Copy + Default + std::fmt::Debug;

    fn from_be(bytes: Self::Bytes) -> Self;

    fn to_be(self) -> Self::Bytes;
}

impl WireInt for u16 {
    const SIZE: usize = 2;
    type Bytes = [u8; 2];

    fn from_be(bytes: [u8; 2]) -> Self {
        u16::from_be_bytes(bytes)
    }

    fn to_be(self) -> [u8; 2] {
        self.to_be_bytes()
    }
}

impl WireInt for u32 {
    const SIZE: usize = 4;
    type Bytes = [u8; 4];

    fn from_be(bytes: [u8; 4]) -> Self {
        u32::from_be_bytes(bytes)
    }

    fn to_be(self) -> [u8; 4] {
        self.to_be_bytes()
    }
}

/// Incremental reader for one big-endian integer.
#[derive(Debug, Clone, Copy, Default)]
pub struct IntMessage<T: WireInt> {
    buf: T::Bytes,
    consumed: usize,
    value: T,
}

/// Reader for 16-bit big-endian integers.
pub type Uint16Message = IntMessage<u16>;

/// Reader for 32-bit big-endian integers.
pub type Uint32Message = IntMessage<u32>;

impl<T: WireInt> IntMessage<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Consume as many bytes as the integer still needs from the front of
    /// `data`. Returns the number consumed; 0 once the integer is complete.
    pub fn feed(&mut self, data: &[u8]) -> usize {
        let take = data.len().min(T::SIZE - self.consumed);
        self.buf.as_mut()[self.consumed..self.consumed + take].copy_from_slice(&data[..take]);
        self.consumed += take;
        if take > 0 && self.done() {
            self.value = T::from_be(self.buf);
        }
        take
    }

    pub fn done(&self) -> bool {
        self.consumed == T::SIZE
    }

    /// The decoded value. Only meaningful once [`done`](Self::done).
    pub fn value(&self) -> T {
        self.value
    }

    pub fn reset(&mut self) {
        self.consumed = 0;
    }

    /// Write `value` into `buf` in network byte order.
    pub fn generate(buf: &mut T::Bytes, value: T) {
        *buf = value.to_be();
    }
}
