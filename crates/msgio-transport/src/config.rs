use std::sync::OnceLock;

/// Vector count used when the platform will not tell us its `IOV_MAX`.
pub const FALLBACK_MAX_VECTORS: usize = 1024;

/// Limits applied when planning a vectored write.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WriterConfig {
    /// Maximum number of vectors handed to a single `writev(2)` call.
    pub max_vectors: usize,
    /// Maximum combined size of one batch. Default: `SSIZE_MAX`.
    pub max_total_size: usize,
}

impl WriterConfig {
    /// Limits reported by the running system.
    pub fn from_system() -> Self {
        Self {
            max_vectors: system_max_vectors(),
            max_total_size: isize::MAX as usize,
        }
    }

    /// Same limits with a different vector count per call.
    pub fn with_max_vectors(mut self, max_vectors: usize) -> Self {
        self.max_vectors = max_vectors;
        self
    }
}

impl Default for WriterConfig {
    fn default() -> Self {
        Self::from_system()
    }
}

/// `sysconf(_SC_IOV_MAX)`, queried once per process.
pub fn system_max_vectors() -> usize {
    static IOV_MAX: OnceLock<usize> = OnceLock::new();
    *IOV_MAX.get_or_init(query_iov_max)
}

#[cfg(unix)]
fn query_iov_max() -> usize {
    // SAFETY: sysconf has no preconditions; it only reads system configuration.
    let value = unsafe { libc::sysconf(libc::_SC_IOV_MAX) };
    if value > 0 {
        value as usize
    } else {
        FALLBACK_MAX_VECTORS
    }
}

#[cfg(not(unix))]
fn query_iov_max() -> usize {
    FALLBACK_MAX_VECTORS
}
