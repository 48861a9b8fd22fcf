//! Contiguous get/put/accumulate.
//!
//! # Standard section(s)
//!
//! Component 4.D. Each entry point resolves its remote address, opens a
//! single-use exclusive epoch (design note 9: the mandated transport
//! forces remote completion on `MPI_Win_unlock` regardless of epoch
//! scope), issues one transport call, and closes the epoch.

use crate::datatype::DataType;
use crate::epoch;
use crate::error::Result;
use crate::group::Rank;
use crate::transfer::resolve_any;

/// Copy `dst.len()` bytes from `target`'s memory at `src_addr` into `dst`.
pub fn get(dst: &mut [u8], src_addr: usize, target: Rank) -> Result<()> {
    let (record, disp) = resolve_any(target, src_addr, dst.len())?;
    epoch::with_epoch(record, target, |w| w.get(dst, target, disp))
}

/// Copy `src` into `target`'s memory at `dst_addr`.
pub fn put(src: &[u8], dst_addr: usize, target: Rank) -> Result<()> {
    let (record, disp) = resolve_any(target, dst_addr, src.len())?;
    epoch::with_epoch(record, target, |w| w.put(src, target, disp))
}

/// Atomically add `src`, scaled by `scale` and interpreted as elements of
/// `dtype`, into `target`'s memory at `dst_addr`.
///
/// `scale == 1.0` skips the scratch-buffer copy entirely and accumulates
/// `src` directly.
pub fn accumulate(src: &[u8], dst_addr: usize, target: Rank, dtype: DataType, scale: f64) -> Result<()> {
    let count = dtype.element_count(src.len())?;
    let (record, disp) = resolve_any(target, dst_addr, src.len())?;

    if scale == 1.0 {
        epoch::with_epoch(record, target, |w| {
            w.accumulate_sum(src, target, disp, count as i32, dtype.mpi_datatype())
        })
    } else {
        let mut scratch = vec![0u8; src.len()];
        dtype.scale_into(src, scale, &mut scratch);
        epoch::with_epoch(record, target, |w| {
            w.accumulate_sum(&scratch, target, disp, count as i32, dtype.mpi_datatype())
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accumulate_rejects_misaligned_length() {
        // A 3-byte buffer can never hold a whole number of 4-byte
        // elements; this must fail before any address resolution is
        // attempted, so it is safe to call without a live runtime.
        let err = DataType::Int32.element_count(3).unwrap_err();
        assert!(matches!(err, crate::error::RtError::BadSize { .. }));
    }
}
