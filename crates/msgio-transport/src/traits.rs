use std::io::{self, IoSlice};

#[cfg(unix)]
use std::os::fd::{AsFd, AsRawFd, BorrowedFd, RawFd};

/// A destination that accepts scatter/gather writes.
///
/// Implementations must report "not ready now" as [`io::ErrorKind::WouldBlock`]
/// so the writer can tell it apart from hard failures, and must provide a way
/// to wait until another write attempt is worthwhile.
pub trait VectoredSink {
    /// Attempt a single vectored write, returning the number of bytes accepted.
    fn write_vectored(&mut self, bufs: &[IoSlice<'_>]) -> io::Result<usize>;

    /// Wait until the destination is writable.
    fn wait_writable(&mut self) -> io::Result<()>;
}

impl<S: VectoredSink + ?Sized> VectoredSink for &mut S {
    fn write_vectored(&mut self, bufs: &[IoSlice<'_>]) -> io::Result<usize> {
        (**self).write_vectored(bufs)
    }

    fn wait_writable(&mut self) -> io::Result<()> {
        (**self).wait_writable()
    }
}

/// A [`VectoredSink`] over a borrowed file descriptor.
///
/// Writes go straight to `writev(2)` and waits use `poll(2)`, so the
/// descriptor is typically a non-blocking socket or pipe. The sink never owns
/// the descriptor; closing it from elsewhere makes the next wait or write fail.
#[cfg(unix)]
pub struct FdSink<'fd> {
    fd: BorrowedFd<'fd>,
}

#[cfg(unix)]
impl<'fd> FdSink<'fd> {
    /// Wrap a borrowed descriptor.
    pub fn new(fd: BorrowedFd<'fd>) -> Self {
        Self { fd }
    }

    /// Borrow the descriptor of any fd-backed handle (sockets, pipes, files).
    pub fn from_fd<T: AsFd + ?Sized>(handle: &'fd T) -> Self {
        Self::new(handle.as_fd())
    }

    /// The raw descriptor number, for diagnostics.
    pub fn raw_fd(&self) -> RawFd {
        self.fd.as_raw_fd()
    }
}

#[cfg(unix)]
impl VectoredSink for FdSink<'_> {
    fn write_vectored(&mut self, bufs: &[IoSlice<'_>]) -> io::Result<usize> {
        writev(self.fd.as_raw_fd(), bufs)
    }

    fn wait_writable(&mut self) -> io::Result<()> {
        poll_writable(self.fd.as_raw_fd())
    }
}

#[cfg(unix)]
impl std::fmt::Debug for FdSink<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FdSink")
            .field("fd", &self.fd.as_raw_fd())
            .finish()
    }
}

/// One `writev(2)` call. Errors come straight from `errno`.
#[cfg(unix)]
pub(crate) fn writev(fd: RawFd, bufs: &[IoSlice<'_>]) -> io::Result<usize> {
    let count = bufs.len().min(libc::c_int::MAX as usize) as libc::c_int;

    // SAFETY: `IoSlice` is guaranteed ABI-compatible with `iovec` on Unix, every
    // slice borrows live memory for the duration of the call, and `count` never
    // exceeds `bufs.len()`. writev(2) only reads from the vectors.
    let rc = unsafe { libc::writev(fd, bufs.as_ptr().cast::<libc::iovec>(), count) };

    if rc < 0 {
        Err(io::Error::last_os_error())
    } else {
        Ok(rc as usize)
    }
}

/// Block the calling thread in `poll(2)` until `fd` is writable.
///
/// Hang-ups and socket errors count as "writable": the following write
/// surfaces the real reason. A descriptor closed underneath us reports `EBADF`.
#[cfg(unix)]
pub(crate) fn poll_writable(fd: RawFd) -> io::Result<()> {
    let mut pfd = libc::pollfd {
        fd,
        events: libc::POLLOUT,
        revents: 0,
    };

    loop {
        // SAFETY: `pfd` is a valid, exclusively borrowed pollfd and we pass a
        // count of exactly one entry.
        let rc = unsafe { libc::poll(&mut pfd, 1, -1) };
        if rc < 0 {
            let err = io::Error::last_os_error();
            if err.kind() == io::ErrorKind::Interrupted {
                continue;
            }
            return Err(err);
        }
        if pfd.revents & libc::POLLNVAL != 0 {
            return Err(io::Error::from_raw_os_error(libc::EBADF));
        }
        return Ok(());
    }
}
