//! One-sided data movement: contiguous, strided, and generalized
//! I/O-vector transfers.
//!
//! # Standard section(s)
//!
//! Implements components 4.D and 4.E. Every entry point here resolves its
//! remote address through [`crate::registry::lookup`] before issuing any
//! one-sided call, so a caller-supplied address that does not name a live
//! slice at the named target fails with [`crate::error::RtError::InvalidAddress`]
//! instead of reaching the transport.

pub mod contig;
pub mod strided;

use crate::error::{Result, RtError};
use crate::group::Rank;
use crate::registry::{lookup, Record, Slice};

/// Resolve `addr` against `target`'s slice of `record`, checking that the
/// `len`-byte range starting at `addr` lies entirely within it, and return
/// the window displacement to address it at.
pub(crate) fn resolve(record: Record, target: Rank, addr: usize, len: usize) -> Result<usize> {
    let slice: Slice = record.slice(target);
    if len == 0 {
        return Err(RtError::BadSize { size: 0, reason: "zero-length transfer" });
    }
    if addr < slice.base || addr + len > slice.base + slice.size {
        return Err(RtError::InvalidAddress { addr, target, reason: "range exceeds registered slice" });
    }
    Ok(addr - slice.base)
}

/// Resolve `addr` against `target` via a fresh [`lookup`] rather than a
/// known record, for entry points that are only given an address (the
/// legacy convention never threads a `Record` through the public API).
pub(crate) fn resolve_any(target: Rank, addr: usize, len: usize) -> Result<(Record, usize)> {
    let record = lookup(addr, target)
        .ok_or(RtError::InvalidAddress { addr, target, reason: "no registered slice contains this address" })?;
    let disp = resolve(record, target, addr, len)?;
    Ok((record, disp))
}
