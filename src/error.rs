//! The taxonomy of failures the runtime can report.
//!
//! Every fallible entry point in this crate returns `Result<T, RtError>`
//! internally; the public, ARMCI-style entry points (the bare-name family in
//! [`crate`]) route that `Result` through [`crate::context::fatal`], which
//! logs the error and aborts the job via the transport's abort primitive.
//! Callers that need to observe a specific failure kind without killing the
//! process use the `try_`-prefixed mirror of each entry point.

/// Every way a runtime call can fail.
///
/// # Standard section(s)
///
/// Corresponds one-to-one with the error taxonomy of the fatal-by-default
/// design: nothing here is recoverable by the crate itself, only by the
/// caller of a `try_`-prefixed entry point.
#[derive(Debug, thiserror::Error)]
pub enum RtError {
    /// A remote address does not resolve to any registered slice at the
    /// named target, or the requested byte range exceeds the slice.
    #[error("invalid address 0x{addr:x} at rank {target} ({reason})")]
    InvalidAddress {
        /// The address that failed to resolve.
        addr: usize,
        /// The rank it was resolved against.
        target: i32,
        /// Human-readable detail (out of range vs. unregistered).
        reason: &'static str,
    },

    /// An accumulate byte count was not a positive multiple of the element
    /// size, or a size argument that must be positive was zero or negative.
    #[error("bad size {size} ({reason})")]
    BadSize {
        /// The offending size in bytes.
        size: i64,
        /// Human-readable detail.
        reason: &'static str,
    },

    /// An accumulate datatype tag was not one of the supported types.
    #[error("unsupported datatype tag {tag}")]
    UnsupportedDataType {
        /// The raw tag value the caller passed.
        tag: i32,
    },

    /// An RMW op tag was not one of the four supported operations.
    #[error("unsupported rmw op tag {tag}")]
    UnsupportedOp {
        /// The raw tag value the caller passed.
        tag: i32,
    },

    /// The transport's pinned/registrable heap could not satisfy an
    /// allocation request.
    #[error("out of memory allocating {size} bytes")]
    OutOfMemory {
        /// The size in bytes that could not be allocated.
        size: usize,
    },

    /// A collective call (group or mutex-array creation) was invoked with
    /// arguments that were not identical across all members of the parent.
    #[error("group mismatch: {detail}")]
    GroupMismatch {
        /// Human-readable detail about which argument diverged.
        detail: String,
    },

    /// An epoch was opened on a `(window, target)` pair that already had
    /// an epoch open on this initiator.
    #[error("epoch already open for target {target}")]
    EpochBusy {
        /// The target rank whose epoch was already open.
        target: i32,
    },

    /// A mutex operation was attempted before `create_mutexes` or after
    /// `destroy_mutexes`.
    #[error("no mutex array is live")]
    NoMutexes,

    /// `destroy_mutexes` was called a second time without an intervening
    /// `create_mutexes`.
    #[error("mutex array already destroyed")]
    DoubleDestroy,

    /// The underlying transport reported a failure outside this crate's
    /// own taxonomy (communicator duplication, window construction, …).
    #[error("transport failure: {0}")]
    Transport(String),
}

impl RtError {
    /// The exit code `error()` should abort the job with.
    ///
    /// Mirrors the legacy convention of a small, stable per-kind integer
    /// rather than `errno`-style values, since the transport's abort
    /// primitive takes an arbitrary caller-supplied code.
    pub fn code(&self) -> i32 {
        match self {
            RtError::InvalidAddress { .. } => 1,
            RtError::BadSize { .. } => 2,
            RtError::UnsupportedDataType { .. } => 3,
            RtError::UnsupportedOp { .. } => 4,
            RtError::OutOfMemory { .. } => 5,
            RtError::GroupMismatch { .. } => 6,
            RtError::EpochBusy { .. } => 7,
            RtError::NoMutexes => 8,
            RtError::DoubleDestroy => 9,
            RtError::Transport(_) => 100,
        }
    }
}

/// Result alias used throughout the crate.
pub type Result<T> = std::result::Result<T, RtError>;
