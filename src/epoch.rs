//! Access epoch manager.
//!
//! # Standard section(s)
//!
//! Implements component 4.C. An access epoch is the `(window, target,
//! mode)` triple opened by `access_start`/`begin_remote` and closed by the
//! matching `access_end`/`end_remote`; at most one epoch may be open per
//! `(record, target)` pair per initiator at a time, matching MPI-2's own
//! restriction that a target's window segment carry at most one
//! conflicting access epoch from a given origin.
//!
//! Every one-sided primitive in [`crate::transfer`], [`crate::atomic`], and
//! [`crate::scalar`] opens and closes its own remote epoch around a single
//! call rather than relying on a caller-held epoch, since the transport
//! this runtime is built on (`MPI_Win_lock`/`MPI_Win_unlock`) forces remote
//! completion at `unlock` regardless. `access_start`/`access_end` exist for
//! callers that want to batch several operations against the same target
//! under one epoch.

use std::cell::RefCell;
use std::collections::HashSet;

use crate::error::{Result, RtError};
use crate::ffi::Window;
use crate::group::Rank;
use crate::registry::{self, Record};

thread_local! {
    // (record id's address identity is the window pointer, which we don't
    // expose; key on (Record, target) via the Record's Eq/Hash-free Copy
    // identity through a Vec scan, since the expected number of
    // simultaneously open epochs is tiny).
    static OPEN: RefCell<HashSet<(usize, Rank)>> = RefCell::new(HashSet::new());
}

fn record_key(record: Record) -> usize {
    // `Record` has no public accessor for its index; `with_window` gives a
    // stable pointer to key on instead of needing one.
    record.with_window(|w| w as *const Window as usize)
}

/// Open an exclusive access epoch against `target`'s slice of `record`.
///
/// Fails with [`RtError::EpochBusy`] if this initiator already has an
/// epoch open against the same `(record, target)` pair.
pub fn access_start(record: Record, target: Rank) -> Result<()> {
    let key = (record_key(record), target);
    let already_open = OPEN.with(|o| !o.borrow_mut().insert(key));
    if already_open {
        return Err(RtError::EpochBusy { target });
    }
    record.with_window(|w| w.lock_exclusive(target));
    Ok(())
}

/// Close the epoch opened by [`access_start`], guaranteeing completion of
/// every one-sided call issued against `target` inside it.
pub fn access_end(record: Record, target: Rank) -> Result<()> {
    let key = (record_key(record), target);
    let was_open = OPEN.with(|o| o.borrow_mut().remove(&key));
    if !was_open {
        return Err(RtError::EpochBusy { target });
    }
    record.with_window(|w| w.unlock(target));
    Ok(())
}

/// Open an exclusive local epoch on the caller's own slice at `local_ptr`,
/// permitting direct loads/stores that stay coherent with one-sided
/// operations issued by other participants against the same slice.
pub fn access_start_local(local_ptr: usize) -> Result<()> {
    let record = registry::lookup_own(local_ptr)
        .ok_or(RtError::InvalidAddress { addr: local_ptr, target: -1, reason: "not this process's own registered slice" })?;
    access_start(record, record.group().rank())
}

/// Close the epoch opened by [`access_start_local`].
pub fn access_end_local(local_ptr: usize) -> Result<()> {
    let record = registry::lookup_own(local_ptr)
        .ok_or(RtError::InvalidAddress { addr: local_ptr, target: -1, reason: "not this process's own registered slice" })?;
    access_end(record, record.group().rank())
}

/// Run `f` inside a freshly opened and closed epoch against `target`,
/// for primitives that complete in a single one-sided call.
///
/// Fails with [`RtError::EpochBusy`] if an epoch is already open against
/// `(record, target)`: a self-contained primitive opening its own epoch
/// should never collide with itself, but a caller that left an
/// [`access_start`] epoch open across a call that does not expect one must
/// see that as a catchable error through the `try_`-prefixed entry points
/// this backs, not a panic.
pub(crate) fn with_epoch<R>(record: Record, target: Rank, f: impl FnOnce(&Window) -> R) -> Result<R> {
    access_start(record, target)?;
    let result = record.with_window(f);
    access_end(record, target)?;
    Ok(result)
}
