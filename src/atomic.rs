//! Primitive remote atomics: fetch-and-add and swap.
//!
//! # Standard section(s)
//!
//! Implements the `rmw` entry point of component 4.F. Backed by
//! `MPI_Fetch_and_op`, which the MPI-2 standard guarantees is atomic
//! against every other accumulate/RMW call targeting the same address,
//! regardless of initiator.

use crate::datatype::RmwOp;
use crate::epoch;
use crate::error::Result;
use crate::group::Rank;
use crate::transfer::resolve_any;

/// Atomically apply `op` to the value at `remote_addr` on `target`,
/// writing `value`'s bytes as the operand and the prior contents into
/// `local_out`.
///
/// `value` and `local_out` must each be exactly `op.element_size()` bytes.
pub fn rmw(op: RmwOp, local_out: &mut [u8], remote_addr: usize, value: &[u8], target: Rank) -> Result<()> {
    let size = op.element_size();
    debug_assert_eq!(value.len(), size);
    debug_assert_eq!(local_out.len(), size);

    let (record, disp) = resolve_any(target, remote_addr, size)?;
    let (datatype, mpi_op) = op.mpi_datatype_and_op();
    epoch::with_epoch(record, target, |w| {
        w.fetch_and_op(value, local_out, target, disp, datatype, mpi_op)
    })?;
    log::trace!("rmw {op:?} at rank {target}");
    Ok(())
}
