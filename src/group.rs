//! Group registry: participant subsets and the process-wide default group.
//!
//! A [`Group`] is a cheap, `Copy` handle into a process-local table of live
//! communicators; the table itself, not the handle, owns the transport
//! resources. This follows the same typed-handle discipline design note 9
//! applies to remote addresses: the handle is validated against the table
//! on every use rather than carrying a raw, possibly-dangling communicator.
//!
//! Groups form a tree rooted at the world group; every allocation is bound
//! to exactly one group, and one group at a time is the process-wide
//! *default group* consulted by the `malloc`/`malloc_group` family when the
//! caller does not name one explicitly.
//!
//! # Standard section(s)
//!
//! Corresponds to component 4.A: group creation is collective over the
//! parent's members, and a group's local rank is the position of the
//! caller's world rank within the caller-supplied member list (list order,
//! not sorted).

use std::cell::RefCell;

use mpi::ffi::MPI_Comm;
use mpi::topology::{SimpleCommunicator, UserCommunicator};
use mpi::traits::{AsRaw, Communicator as _, Group as MpiGroup};

use crate::error::{Result, RtError};

/// Identifies a process within a group. Mirrors the transport's own rank
/// type so no translation is needed at the FFI boundary.
pub type Rank = i32;

/// Either the duplicated world communicator or a communicator produced by
/// splitting a parent group. Forwards [`mpi::traits::Communicator`] so the
/// window and collective code elsewhere in the crate can stay generic over
/// which flavor backs a particular [`Group`].
pub(crate) enum CommHandle {
    World(SimpleCommunicator),
    Sub(UserCommunicator),
}

unsafe impl AsRaw for CommHandle {
    type Raw = MPI_Comm;

    fn as_raw(&self) -> Self::Raw {
        match self {
            CommHandle::World(c) => c.as_raw(),
            CommHandle::Sub(c) => c.as_raw(),
        }
    }
}

impl mpi::traits::Communicator for CommHandle {}

struct GroupEntry {
    comm: CommHandle,
    /// World ranks of members, in group-local rank order.
    members: Vec<Rank>,
}

thread_local! {
    // A process participates in the runtime on exactly one logical thread
    // (see the concurrency model); the table lives in a `thread_local` so
    // the lack of `Sync` is enforced by the type system rather than left
    // as a documentation note.
    static GROUPS: RefCell<Vec<Option<GroupEntry>>> = const { RefCell::new(Vec::new()) };
    static DEFAULT: RefCell<usize> = const { RefCell::new(0) };
}

/// Slot reserved for the world group, populated by [`init_world`].
pub(crate) const WORLD_ID: usize = 0;

/// A handle into the process-local group table.
///
/// `Group::is_active` distinguishes a live handle from the inactive
/// sentinel returned to a process excluded from a `group_create` call's
/// member list.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct Group(usize);

impl Group {
    pub(crate) fn world() -> Group {
        Group(WORLD_ID)
    }

    fn with_entry<R>(&self, f: impl FnOnce(&GroupEntry) -> R) -> Option<R> {
        GROUPS.with(|g| g.borrow().get(self.0).and_then(|e| e.as_ref()).map(f))
    }

    /// Whether this handle refers to a live group, as opposed to the
    /// sentinel returned to a process excluded from the group's members.
    pub fn is_active(&self) -> bool {
        GROUPS.with(|g| matches!(g.borrow().get(self.0), Some(Some(_))))
    }

    /// Number of participants in the group.
    ///
    /// Panics on the inactive sentinel: callers must not query a group
    /// handle they were not admitted to.
    pub fn size(&self) -> Rank {
        self.with_entry(|e| e.comm.size()).expect("group_size on inactive group handle")
    }

    /// This process's rank within the group.
    pub fn rank(&self) -> Rank {
        self.with_entry(|e| e.comm.rank()).expect("group_rank on inactive group handle")
    }

    /// Translate a group-local rank to its world rank.
    pub fn absolute_id(&self, group_rank: Rank) -> Rank {
        self.with_entry(|e| e.members[group_rank as usize])
            .expect("absolute_id on inactive group handle")
    }

    /// Block until every member of this group has entered the barrier.
    pub fn barrier(&self) {
        self.with_entry(|e| e.comm.barrier()).expect("barrier on inactive group handle");
    }

    /// Run `f` with a reference to the underlying transport communicator,
    /// for window creation and one-sided/collective calls elsewhere in the
    /// crate.
    pub(crate) fn with_comm<R>(&self, f: impl FnOnce(&CommHandle) -> R) -> R {
        self.with_entry(|e| f(&e.comm)).expect("operation on inactive group handle")
    }
}

/// Populate the world group at rank 0 of the table. Called once by
/// [`crate::context::init`].
pub(crate) fn init_world(comm: SimpleCommunicator) {
    let size = comm.size();
    GROUPS.with(|g| {
        let mut g = g.borrow_mut();
        debug_assert!(g.is_empty(), "init_world called twice");
        g.push(Some(GroupEntry { members: (0..size).collect(), comm: CommHandle::World(comm) }));
    });
    DEFAULT.with(|d| *d.borrow_mut() = WORLD_ID);
}

/// Drop every live group, including the world group. Called once by
/// [`crate::context::finalize`].
pub(crate) fn shutdown() {
    GROUPS.with(|g| g.borrow_mut().clear());
}

/// Create a new group, collective over every member of `parent`.
///
/// `member_ranks` lists world ranks (if `parent` is the world group) or
/// parent-local ranks (otherwise) of the processes to include, in the
/// order they should receive group-local ranks 0, 1, 2, …
///
/// Every caller in `parent` must pass byte-identical `member_ranks`
/// (checked via the `strict-collectives` debug hash, see
/// [`crate::context::check_collective_agreement`]); divergence surfaces as
/// [`RtError::GroupMismatch`]. A process whose own rank does not appear in
/// `member_ranks` receives [`Group::is_active`] `== false`.
pub fn group_create(parent: Group, member_ranks: &[Rank]) -> Result<Group> {
    if !parent.is_active() {
        return Err(RtError::GroupMismatch { detail: "group_create on an inactive parent group".into() });
    }

    crate::context::check_collective_agreement("group_create", parent, member_ranks)?;

    let parent_size = parent.size();
    for &r in member_ranks {
        if r < 0 || r >= parent_size {
            return Err(RtError::GroupMismatch {
                detail: format!("member rank {r} out of range for parent of size {parent_size}"),
            });
        }
    }

    let new_comm = parent.with_comm(|comm| {
        let subgroup = comm.group().include(member_ranks);
        comm.split_by_subgroup_collective(&subgroup)
    });

    let entry = new_comm.map(|comm| GroupEntry {
        members: member_ranks.iter().map(|&r| parent.absolute_id(r)).collect(),
        comm: CommHandle::Sub(comm),
    });
    let is_active = entry.is_some();

    let id = GROUPS.with(|g| {
        let mut g = g.borrow_mut();
        g.push(entry);
        g.len() - 1
    });

    // An inactive handle still occupies a table slot so its id stays
    // distinct from any later active group's id.
    debug_assert_eq!(is_active, GROUPS.with(|g| g.borrow()[id].is_some()));
    Ok(Group(id))
}

/// Create a group whose parent is [`crate::context::get_default`].
pub fn group_create_child(member_ranks: &[Rank]) -> Result<Group> {
    group_create(crate::context::get_default(), member_ranks)
}

/// Destroy a group handle, releasing its transport communicator. A no-op
/// on the inactive sentinel.
pub fn group_free(group: Group) {
    GROUPS.with(|g| {
        let mut g = g.borrow_mut();
        if let Some(slot) = g.get_mut(group.0) {
            *slot = None;
        }
    });
}

/// The implicit root group containing every participant.
pub fn get_world() -> Group {
    Group::world()
}

/// The group consulted by allocation calls that do not name one
/// explicitly.
pub fn get_default() -> Group {
    Group(DEFAULT.with(|d| *d.borrow()))
}

/// Change the process-wide default group.
pub fn set_default(group: Group) {
    DEFAULT.with(|d| *d.borrow_mut() = group.0);
}
