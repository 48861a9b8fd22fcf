//! Distributed fair mutex array.
//!
//! # Standard section(s)
//!
//! Implements the mutex half of component 4.F. Each mutex is a pair of
//! `i64` counters — `next_ticket` and `now_serving` — hosted in a
//! collectively allocated record, one pair per mutex per participant so
//! `lock(i, owner)` can target any participant's copy. Acquiring ticket
//! `t` means spinning on `now_serving` until it reads `t`; `unlock`
//! advances `now_serving` by one. Fetch-and-add on `next_ticket` is the
//! only contended operation, so waiters never race each other for a slot.

use std::cell::RefCell;
use std::thread;
use std::time::Duration;

use crate::atomic::rmw;
use crate::datatype::RmwOp;
use crate::error::{Result, RtError};
use crate::group::{Group, Rank};
use crate::registry::{self, Record};
use crate::sync;

const TICKET_BYTES: usize = 8;
const SERVING_BYTES: usize = 8;

struct MutexArray {
    record: Record,
    group: Group,
    count: usize,
}

thread_local! {
    static ARRAY: RefCell<Option<MutexArray>> = const { RefCell::new(None) };
}

fn ticket_addr(base: usize, index: usize) -> usize {
    base + index * (TICKET_BYTES + SERVING_BYTES)
}

fn serving_addr(base: usize, index: usize) -> usize {
    ticket_addr(base, index) + TICKET_BYTES
}

/// Collectively allocate `count` mutexes per member of `group`, all
/// initially unlocked (ticket 0 is immediately served).
pub fn create_mutexes(count: usize, group: Group) -> Result<()> {
    crate::context::check_collective_agreement("create_mutexes", group, count)?;
    if ARRAY.with(|a| a.borrow().is_some()) {
        return Err(RtError::GroupMismatch { detail: "create_mutexes called while an array is already live".into() });
    }
    let bytes_per_member = count * (TICKET_BYTES + SERVING_BYTES);
    let (record, _bases) = registry::malloc_group(bytes_per_member, group)?;
    group.barrier();
    ARRAY.with(|a| *a.borrow_mut() = Some(MutexArray { record, group, count }));
    log::debug!("create_mutexes: {count} mutexes per member");
    Ok(())
}

/// Collectively destroy the live mutex array.
pub fn destroy_mutexes() -> Result<()> {
    let array = ARRAY.with(|a| a.borrow_mut().take());
    let Some(array) = array else {
        return Err(RtError::DoubleDestroy);
    };
    array.group.barrier();
    registry::free_group(array.record.slice(array.group.rank()).base, array.group)?;
    log::debug!("destroy_mutexes");
    Ok(())
}

fn with_array<R>(f: impl FnOnce(&MutexArray) -> Result<R>) -> Result<R> {
    ARRAY.with(|a| match &*a.borrow() {
        Some(arr) => f(arr),
        None => Err(RtError::NoMutexes),
    })
}

/// Acquire mutex `index` hosted at `owner`, blocking with bounded-progress
/// polling until this caller's ticket is served.
pub fn lock(index: usize, owner: Rank) -> Result<()> {
    with_array(|arr| {
        if index >= arr.count {
            return Err(RtError::InvalidAddress { addr: index, target: owner, reason: "mutex index out of range" });
        }
        let base = arr.record.slice(owner).base;
        let mut ticket = [0u8; TICKET_BYTES];
        rmw(RmwOp::FetchAndAddI64, &mut ticket, ticket_addr(base, index), &1i64.to_ne_bytes(), owner)?;
        let my_ticket = i64::from_ne_bytes(ticket);

        loop {
            let mut serving = [0u8; SERVING_BYTES];
            rmw(RmwOp::FetchAndAddI64, &mut serving, serving_addr(base, index), &0i64.to_ne_bytes(), owner)?;
            if i64::from_ne_bytes(serving) == my_ticket {
                break;
            }
            // Bounded-progress polling: yield to the transport and the OS
            // scheduler between spins rather than hammering the network.
            sync::fence(owner)?;
            thread::sleep(Duration::from_micros(50));
        }
        log::trace!("lock({index}, {owner}): acquired ticket {my_ticket}");
        Ok(())
    })
}

/// Release mutex `index` hosted at `owner`, admitting the next waiter.
pub fn unlock(index: usize, owner: Rank) -> Result<()> {
    with_array(|arr| {
        if index >= arr.count {
            return Err(RtError::InvalidAddress { addr: index, target: owner, reason: "mutex index out of range" });
        }
        let base = arr.record.slice(owner).base;
        let mut prior = [0u8; SERVING_BYTES];
        rmw(RmwOp::FetchAndAddI64, &mut prior, serving_addr(base, index), &1i64.to_ne_bytes(), owner)?;
        log::trace!("unlock({index}, {owner})");
        Ok(())
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ticket_and_serving_addresses_are_disjoint() {
        let base = 0x1000;
        assert_eq!(ticket_addr(base, 0), 0x1000);
        assert_eq!(serving_addr(base, 0), 0x1008);
        assert_eq!(ticket_addr(base, 1), 0x1010);
    }
}
