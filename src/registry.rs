//! Memory-region registry: symmetric allocation and address resolution.
//!
//! An [`AllocationRecord`] (exposed to callers as the opaque [`Record`]
//! handle) is produced by a collective [`malloc_group`] and torn down by a
//! matching [`free_group`]. Every member holds the complete slice table, so
//! [`lookup`] can resolve a remote address supplied by any participant
//! without further communication.
//!
//! # Standard section(s)
//!
//! Implements component 4.B. The collective allocation algorithm follows
//! the design level description verbatim: local allocate, collective
//! window construction, all-gather of base addresses, insert into every
//! member's registry.

use std::cell::RefCell;
use std::collections::HashMap;

use conv::ValueInto;
use mpi::traits::{Communicator, CommunicatorCollectives, Equivalence};

use crate::error::{Result, RtError};
use crate::ffi::Window;
use crate::group::{Group, Rank};

/// This process's contribution to an allocation record: a base address
/// (opaque at every participant but the one it names) and a byte count.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Slice {
    /// Address of the first byte of this slice, as seen by the owning
    /// participant. Only locally dereferenceable at that participant.
    pub base: usize,
    /// Number of bytes in this slice; may be zero.
    pub size: usize,
}

impl Slice {
    fn contains(&self, addr: usize) -> bool {
        self.size > 0 && addr >= self.base && addr < self.base + self.size
    }
}

struct AllocationEntry {
    group: Group,
    window: Window,
    /// Indexed by group-local rank.
    slices: Vec<Slice>,
    /// Kept alive so the window's registered memory stays valid; never
    /// resized after construction; the local slice's address is stable as
    /// long as this lives.
    #[allow(dead_code)]
    local_buf: Vec<u8>,
}

thread_local! {
    static REGIONS: RefCell<Vec<Option<AllocationEntry>>> = const { RefCell::new(Vec::new()) };
    static LOCAL_ALLOCS: RefCell<HashMap<usize, Vec<u8>>> = RefCell::new(HashMap::new());
}

/// An opaque handle to a live allocation record.
///
/// Internally just an index into the process-local registry table; see
/// design note 9 ("Raw-pointer remote addressing → typed handles").
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct Record(usize);

impl Record {
    /// The group this record is bound to.
    pub fn group(&self) -> Group {
        with_entry(self.0, |e| e.group).expect("operation on a freed Record")
    }

    /// The slice table entry for `rank` within this record's group.
    pub fn slice(&self, rank: Rank) -> Slice {
        with_entry(self.0, |e| e.slices[rank as usize]).expect("operation on a freed Record")
    }

    pub(crate) fn with_window<R>(&self, f: impl FnOnce(&Window) -> R) -> R {
        with_entry(self.0, |e| f(&e.window)).expect("operation on a freed Record")
    }
}

fn with_entry<R>(id: usize, f: impl FnOnce(&AllocationEntry) -> R) -> Option<R> {
    REGIONS.with(|r| r.borrow().get(id).and_then(|e| e.as_ref()).map(f))
}

/// Allocate and zero-fill `size` bytes without letting the global allocator
/// abort the process on failure, so an oversized request surfaces as
/// [`RtError::OutOfMemory`] to a `try_`-prefixed caller instead of killing
/// the job out from under the fatal-by-default convention.
fn try_alloc_zeroed(size: usize) -> Result<Vec<u8>> {
    let mut buf = Vec::new();
    buf.try_reserve_exact(size).map_err(|_| RtError::OutOfMemory { size })?;
    buf.resize(size, 0);
    Ok(buf)
}

/// Collectively allocate `size` bytes per member of `group`, returning the
/// record and the base address contributed by every member (group-local
/// rank order).
///
/// `size` may be zero: the participant contributes no memory but can
/// still address the record.
pub fn malloc_group(size: usize, group: Group) -> Result<(Record, Vec<usize>)> {
    // `BadSize::size` reports an `i64`; guard the conversion instead of
    // truncating silently if a caller ever asks for an allocation past
    // `i64::MAX` bytes.
    let _: i64 = size
        .value_into()
        .map_err(|_| RtError::BadSize { size: i64::MAX, reason: "allocation size overflows a signed 64-bit count" })?;

    let mut local_buf = try_alloc_zeroed(size)?;
    let local_base = local_buf.as_mut_ptr() as usize;

    let window = group.with_comm(|comm| Window::create(comm, &mut local_buf));

    let group_size = group.size() as usize;
    let mut bases = vec![0usize; group_size];
    let mut sizes = vec![0usize; group_size];
    group.with_comm(|comm| {
        all_gather_usize(comm, local_base, &mut bases);
        all_gather_usize(comm, size, &mut sizes);
    });

    let slices: Vec<Slice> = bases.iter().zip(sizes.iter()).map(|(&base, &size)| Slice { base, size }).collect();

    let id = REGIONS.with(|r| {
        let mut r = r.borrow_mut();
        r.push(Some(AllocationEntry { group, window, slices, local_buf }));
        r.len() - 1
    });

    log::debug!("malloc_group: {size} bytes/member over a group of {group_size}, record id {id}");
    Ok((Record(id), bases))
}

/// Destroy an allocation record, collective over its bound group.
///
/// `any_local_base` is accepted (rather than the `Record` itself) to
/// mirror the legacy `ARMCI_Free(ptr)` convention of freeing by address;
/// it is resolved via [`lookup`] against the caller's own rank in the
/// record's group.
pub fn free_group(any_local_base: usize, group: Group) -> Result<()> {
    let record = lookup(any_local_base, group.rank())
        .ok_or(RtError::InvalidAddress { addr: any_local_base, target: group.rank(), reason: "not a registered base" })?;
    REGIONS.with(|r| {
        let mut r = r.borrow_mut();
        if let Some(slot) = r.get_mut(record.0) {
            *slot = None;
        }
    });
    log::debug!("free_group: record {}", record.0);
    Ok(())
}

/// Drop every live allocation record. Called once by
/// [`crate::context::finalize`].
pub(crate) fn shutdown() {
    REGIONS.with(|r| r.borrow_mut().clear());
    LOCAL_ALLOCS.with(|l| l.borrow_mut().clear());
}

/// Resolve `(addr, rank)` to the allocation record whose slice at `rank`
/// brackets `addr`.
///
/// Scans from the most recently created record backwards, since hot
/// application loops typically revisit their most recent allocations; the
/// expected number of simultaneously live regions is small enough that an
/// interval tree (mentioned as an acceptable acceleration in the design)
/// would not pay for its own bookkeeping.
pub fn lookup(addr: usize, rank: Rank) -> Option<Record> {
    REGIONS.with(|r| {
        let r = r.borrow();
        let slice_tables = r.iter().enumerate().map(|(id, entry)| (id, entry.as_ref().map(|e| e.slices.as_slice())));
        find_bracketing(slice_tables, addr, rank).map(Record)
    })
}

/// Scan `slice_tables` (one optional slice table per record id, oldest
/// first) newest-first for the record whose slice at `rank` brackets
/// `addr`.
///
/// Factored out of [`lookup`] so the scan order and bracketing logic can be
/// exercised without a live allocation record (window, group) behind it.
fn find_bracketing<'a>(
    slice_tables: impl DoubleEndedIterator<Item = (usize, Option<&'a [Slice]>)>,
    addr: usize,
    rank: Rank,
) -> Option<usize> {
    slice_tables.rev().find_map(|(id, slices)| {
        let slice = slices?.get(rank as usize)?;
        slice.contains(addr).then_some(id)
    })
}

/// Resolve `addr` to the record this process's own slice belongs to,
/// without needing to know which group (and therefore which group-local
/// rank) owns it ahead of time.
///
/// Used by the public `access_start`/`access_end` entry points, which take
/// only a local pointer the caller already holds.
pub(crate) fn lookup_own(addr: usize) -> Option<Record> {
    REGIONS.with(|r| {
        let r = r.borrow();
        r.iter().enumerate().rev().find_map(|(id, entry)| {
            let base = entry.local_buf.as_ptr() as usize;
            (addr >= base && addr < base + entry.local_buf.len()).then_some(Record(id))
        })
    })
}

/// Allocate `size` bytes of process-local scratch memory, outside the
/// registry.
pub fn malloc_local(size: usize) -> usize {
    let buf = vec![0u8; size];
    let addr = buf.as_ptr() as usize;
    LOCAL_ALLOCS.with(|l| l.borrow_mut().insert(addr, buf));
    addr
}

/// Free memory obtained from [`malloc_local`].
pub fn free_local(ptr: usize) -> Result<()> {
    LOCAL_ALLOCS
        .with(|l| l.borrow_mut().remove(&ptr))
        .map(|_| ())
        .ok_or(RtError::InvalidAddress { addr: ptr, target: -1, reason: "not a malloc_local pointer" })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn find_bracketing_locates_the_record_containing_an_address() {
        let table = [Slice { base: 0x1000, size: 16 }];
        let tables: Vec<(usize, Option<&[Slice]>)> = vec![(0, Some(&table))];

        assert_eq!(find_bracketing(tables.clone().into_iter(), 0x1000, 0), Some(0));
        assert_eq!(find_bracketing(tables.clone().into_iter(), 0x100f, 0), Some(0));
        assert_eq!(find_bracketing(tables.clone().into_iter(), 0x1010, 0), None);
        assert_eq!(find_bracketing(tables.clone().into_iter(), 0x0fff, 0), None);
        assert_eq!(find_bracketing(tables.into_iter(), 0x1000, 1), None);
    }

    #[test]
    fn find_bracketing_prefers_the_most_recently_created_record() {
        let older = [Slice { base: 0x2000, size: 16 }];
        let newer = [Slice { base: 0x2000, size: 16 }];
        let tables: Vec<(usize, Option<&[Slice]>)> = vec![(0, Some(&older)), (1, Some(&newer))];

        assert_eq!(find_bracketing(tables.into_iter(), 0x2000, 0), Some(1));
    }

    #[test]
    fn find_bracketing_skips_freed_records() {
        let live = [Slice { base: 0x3000, size: 16 }];
        let tables: Vec<(usize, Option<&[Slice]>)> = vec![(0, None), (1, Some(&live))];

        assert_eq!(find_bracketing(tables.into_iter(), 0x3000, 0), Some(1));
    }

    #[test]
    fn zero_size_slice_contains_nothing() {
        assert!(!Slice { base: 0x3000, size: 0 }.contains(0x3000));
    }
}

fn all_gather_usize<C: Communicator>(comm: &C, value: usize, out: &mut [usize]) {
    // `usize` has no stable MPI representation; the address space this
    // runs in is 64-bit in every supported configuration, so the exchange
    // goes over the wire as `u64`.
    let value = value as u64;
    let mut raw = vec![0u64; out.len()];
    comm.all_gather_into(&value, &mut raw[..]);
    for (slot, v) in out.iter_mut().zip(raw) {
        *slot = v as usize;
    }
}

// `u64` already implements `Equivalence` in the transport crate; this
// marker keeps the `use` above honest about why `all_gather_usize` compiles
// without a custom datatype.
const _: fn() = || {
    fn assert_equivalence<T: Equivalence>() {}
    assert_equivalence::<u64>();
};
