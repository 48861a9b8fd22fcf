//! Fences and barriers.
//!
//! # Standard section(s)
//!
//! Implements component 4.G. Every one-sided primitive in this crate
//! already guarantees remote completion by the time it returns (each opens
//! and closes its own MPI-2 access epoch), so `fence`/`all_fence` have
//! nothing left to wait for under the transport semantics this runtime
//! assumes and are no-ops. `barrier` still performs a real collective
//! synchronization over the default group.

use crate::error::Result;
use crate::group::Rank;

/// Wait for remote completion of outstanding one-sided calls against
/// `target`. A no-op: see the module documentation.
pub fn fence(_target: Rank) -> Result<()> {
    Ok(())
}

/// Wait for remote completion of outstanding one-sided calls against every
/// target. A no-op: see the module documentation.
pub fn all_fence() -> Result<()> {
    Ok(())
}

/// `all_fence` followed by a collective barrier over the default group.
///
/// On return, every participant observes all writes by every other
/// participant that returned from a matching one-sided call before that
/// participant entered this barrier.
pub fn barrier() -> Result<()> {
    all_fence()?;
    crate::context::get_default().barrier();
    Ok(())
}
