//! A partitioned global-address-space runtime over one-sided MPI-2
//! communication.
//!
//! Every participant is a single OS process holding a logical handle into
//! process-wide state (the world/default group, live allocation records,
//! the mutex array) behind `thread_local` storage, matching the
//! single-logical-thread concurrency model this runtime assumes (see the
//! crate's design notes).
//!
//! # API convention
//!
//! Every fallible operation has two forms at the crate root:
//!
//! - The bare name (`get`, `put`, `group_create`, …) aborts the job via
//!   [`error`] on failure, matching the legacy fatal-by-default
//!   convention this runtime is modeled on.
//! - The `try_`-prefixed mirror (`try_get`, `try_put`, `try_group_create`,
//!   …) returns [`Result<T>`] instead, for callers — notably tests — that
//!   need to observe a specific failure kind without killing the process.
//!
//! `init`/`init_args`/`finalize`/`cleanup`/`error` have no fallible
//! mirror: initialization failure and the abort sink itself are not
//! recoverable by definition.

mod atomic;
mod context;
pub mod datatype;
mod epoch;
pub mod error;
mod ffi;
mod group;
mod handle;
mod mutex;
mod registry;
mod scalar;
mod sync;
mod transfer;

pub use datatype::{DataType, RmwOp};
pub use error::{Result, RtError};
pub use group::{Group, Rank};
pub use handle::Handle;
pub use registry::{Record, Slice};
pub use transfer::strided::IovSegment;

use context::fatal;

// ---------------------------------------------------------------------
// 4.I Initialization / shutdown
// ---------------------------------------------------------------------

/// Duplicate the world communicator and populate the world group.
pub fn init() -> error::Result<()> {
    context::init()
}

/// Same as [`init`], forwarding `args` to the transport's own start-up.
pub fn init_args(args: &mut Vec<String>) -> error::Result<()> {
    context::init_args(args)
}

/// Release the world group and every registry this runtime owns.
pub fn finalize() {
    context::finalize()
}

/// Release any resources `finalize` does not. A no-op; see
/// [`context::cleanup`].
pub fn cleanup() {
    context::cleanup()
}

/// The process-wide fatal error sink: logs `msg` and aborts the job with
/// `code`. Never returns.
pub fn error(msg: &str, code: i32) -> ! {
    context::error(msg, code)
}

/// The implicit root group containing every participant.
pub fn get_world() -> Group {
    context::get_world()
}

/// The group consulted by allocation calls that do not name one
/// explicitly.
pub fn get_default() -> Group {
    context::get_default()
}

/// Change the process-wide default group.
pub fn set_default(group: Group) {
    context::set_default(group)
}

// ---------------------------------------------------------------------
// 4.A Groups
// ---------------------------------------------------------------------

/// Create a new group, collective over every member of `parent`. Aborts
/// on a `GroupMismatch`; see [`try_group_create`] to observe the error.
pub fn group_create(parent: Group, member_ranks: &[Rank]) -> Group {
    fatal(try_group_create(parent, member_ranks))
}

/// `Result`-returning mirror of [`group_create`].
pub fn try_group_create(parent: Group, member_ranks: &[Rank]) -> error::Result<Group> {
    group::group_create(parent, member_ranks)
}

/// Create a group whose parent is [`get_default`].
pub fn group_create_child(member_ranks: &[Rank]) -> Group {
    fatal(try_group_create_child(member_ranks))
}

/// `Result`-returning mirror of [`group_create_child`].
pub fn try_group_create_child(member_ranks: &[Rank]) -> error::Result<Group> {
    group::group_create_child(member_ranks)
}

/// Destroy a group handle. A no-op on the inactive sentinel.
pub fn group_free(group: Group) {
    group::group_free(group)
}

/// This process's rank within `group`.
pub fn group_rank(group: Group) -> Rank {
    group.rank()
}

/// Number of participants in `group`.
pub fn group_size(group: Group) -> Rank {
    group.size()
}

/// Translate `group_rank` within `group` to its world rank.
pub fn absolute_id(group: Group, group_rank: Rank) -> Rank {
    group.absolute_id(group_rank)
}

// ---------------------------------------------------------------------
// 4.B Memory-region registry
// ---------------------------------------------------------------------

/// Collectively allocate `size` bytes per member of `group`, returning the
/// record and every member's base address. Aborts on failure.
pub fn malloc_group(size: usize, group: Group) -> (Record, Vec<usize>) {
    fatal(try_malloc_group(size, group))
}

/// `Result`-returning mirror of [`malloc_group`].
pub fn try_malloc_group(size: usize, group: Group) -> error::Result<(Record, Vec<usize>)> {
    registry::malloc_group(size, group)
}

/// Destroy an allocation record, collective over its bound group. Aborts
/// on failure.
pub fn free_group(any_local_base: usize, group: Group) {
    fatal(try_free_group(any_local_base, group))
}

/// `Result`-returning mirror of [`free_group`].
pub fn try_free_group(any_local_base: usize, group: Group) -> error::Result<()> {
    registry::free_group(any_local_base, group)
}

/// Allocate `size` bytes of process-local scratch memory, outside the
/// registry.
pub fn malloc_local(size: usize) -> usize {
    registry::malloc_local(size)
}

/// Free memory obtained from [`malloc_local`]. Aborts on failure.
pub fn free_local(ptr: usize) {
    fatal(try_free_local(ptr))
}

/// `Result`-returning mirror of [`free_local`].
pub fn try_free_local(ptr: usize) -> error::Result<()> {
    registry::free_local(ptr)
}

/// Resolve `(addr, rank)` to the allocation record whose slice at `rank`
/// brackets `addr`, if any.
pub fn lookup(addr: usize, rank: Rank) -> Option<Record> {
    registry::lookup(addr, rank)
}

// ---------------------------------------------------------------------
// 4.D Contiguous transfer
// ---------------------------------------------------------------------

/// Copy `dst.len()` bytes from `target`'s memory at `src_addr` into `dst`.
/// Aborts on failure.
pub fn get(dst: &mut [u8], src_addr: usize, target: Rank) {
    fatal(try_get(dst, src_addr, target))
}

/// `Result`-returning mirror of [`get`].
pub fn try_get(dst: &mut [u8], src_addr: usize, target: Rank) -> error::Result<()> {
    transfer::contig::get(dst, src_addr, target)
}

/// Copy `src` into `target`'s memory at `dst_addr`. Aborts on failure.
pub fn put(src: &[u8], dst_addr: usize, target: Rank) {
    fatal(try_put(src, dst_addr, target))
}

/// `Result`-returning mirror of [`put`].
pub fn try_put(src: &[u8], dst_addr: usize, target: Rank) -> error::Result<()> {
    transfer::contig::put(src, dst_addr, target)
}

/// Atomically add `src`, scaled by `scale` and interpreted as elements of
/// `dtype`, into `target`'s memory at `dst_addr`. Aborts on failure.
pub fn acc(src: &[u8], dst_addr: usize, target: Rank, dtype: DataType, scale: f64) {
    fatal(try_acc(src, dst_addr, target, dtype, scale))
}

/// `Result`-returning mirror of [`acc`].
pub fn try_acc(src: &[u8], dst_addr: usize, target: Rank, dtype: DataType, scale: f64) -> error::Result<()> {
    transfer::contig::accumulate(src, dst_addr, target, dtype, scale)
}

// ---------------------------------------------------------------------
// 4.E Strided / generalized I/O-vector transfer
// ---------------------------------------------------------------------

/// Strided get over an N-dimensional box; see
/// [`transfer::strided::get_strided`] for the parameter layout. Aborts on
/// failure.
pub fn get_strided(dst: &mut [u8], dst_strides: &[usize], src_addr: usize, src_strides: &[usize], counts: &[usize], target: Rank) {
    fatal(try_get_strided(dst, dst_strides, src_addr, src_strides, counts, target))
}

/// `Result`-returning mirror of [`get_strided`].
pub fn try_get_strided(
    dst: &mut [u8],
    dst_strides: &[usize],
    src_addr: usize,
    src_strides: &[usize],
    counts: &[usize],
    target: Rank,
) -> error::Result<()> {
    transfer::strided::get_strided(dst, dst_strides, src_addr, src_strides, counts, target)
}

/// Strided put. Aborts on failure.
pub fn put_strided(src: &[u8], src_strides: &[usize], dst_addr: usize, dst_strides: &[usize], counts: &[usize], target: Rank) {
    fatal(try_put_strided(src, src_strides, dst_addr, dst_strides, counts, target))
}

/// `Result`-returning mirror of [`put_strided`].
pub fn try_put_strided(
    src: &[u8],
    src_strides: &[usize],
    dst_addr: usize,
    dst_strides: &[usize],
    counts: &[usize],
    target: Rank,
) -> error::Result<()> {
    transfer::strided::put_strided(src, src_strides, dst_addr, dst_strides, counts, target)
}

/// Strided accumulate. Aborts on failure.
#[allow(clippy::too_many_arguments)]
pub fn acc_strided(
    src: &[u8],
    src_strides: &[usize],
    dst_addr: usize,
    dst_strides: &[usize],
    counts: &[usize],
    target: Rank,
    dtype: DataType,
    scale: f64,
) {
    fatal(try_acc_strided(src, src_strides, dst_addr, dst_strides, counts, target, dtype, scale))
}

/// `Result`-returning mirror of [`acc_strided`].
#[allow(clippy::too_many_arguments)]
pub fn try_acc_strided(
    src: &[u8],
    src_strides: &[usize],
    dst_addr: usize,
    dst_strides: &[usize],
    counts: &[usize],
    target: Rank,
    dtype: DataType,
    scale: f64,
) -> error::Result<()> {
    transfer::strided::acc_strided(src, src_strides, dst_addr, dst_strides, counts, target, dtype, scale)
}

/// Generalized I/O-vector get: each segment copies bytes from `target`'s
/// memory into `local_buf` at the segment's local offsets. Aborts on
/// failure.
pub fn get_iov(local_buf: &mut [u8], segments: &[IovSegment], target: Rank) {
    fatal(try_get_iov(local_buf, segments, target))
}

/// `Result`-returning mirror of [`get_iov`].
pub fn try_get_iov(local_buf: &mut [u8], segments: &[IovSegment], target: Rank) -> error::Result<()> {
    transfer::strided::get_iov(local_buf, segments, target)
}

/// Generalized I/O-vector put: each segment copies bytes from `local_buf`
/// at the segment's local offsets into `target`'s memory. Aborts on
/// failure.
pub fn put_iov(local_buf: &[u8], segments: &[IovSegment], target: Rank) {
    fatal(try_put_iov(local_buf, segments, target))
}

/// `Result`-returning mirror of [`put_iov`].
pub fn try_put_iov(local_buf: &[u8], segments: &[IovSegment], target: Rank) -> error::Result<()> {
    transfer::strided::put_iov(local_buf, segments, target)
}

// ---------------------------------------------------------------------
// 4.F Atomics & mutexes
// ---------------------------------------------------------------------

/// Atomic read-modify-write at `remote_addr` on `target`. Aborts on
/// failure.
pub fn rmw(op: RmwOp, local_out: &mut [u8], remote_addr: usize, value: &[u8], target: Rank) {
    fatal(try_rmw(op, local_out, remote_addr, value, target))
}

/// `Result`-returning mirror of [`rmw`].
pub fn try_rmw(op: RmwOp, local_out: &mut [u8], remote_addr: usize, value: &[u8], target: Rank) -> error::Result<()> {
    atomic::rmw(op, local_out, remote_addr, value, target)
}

/// Collectively allocate `count` mutexes per member of `group`. Aborts on
/// failure.
pub fn create_mutexes(count: usize, group: Group) {
    fatal(try_create_mutexes(count, group))
}

/// `Result`-returning mirror of [`create_mutexes`].
pub fn try_create_mutexes(count: usize, group: Group) -> error::Result<()> {
    mutex::create_mutexes(count, group)
}

/// Collectively destroy the live mutex array. Aborts on failure.
pub fn destroy_mutexes() {
    fatal(try_destroy_mutexes())
}

/// `Result`-returning mirror of [`destroy_mutexes`].
pub fn try_destroy_mutexes() -> error::Result<()> {
    mutex::destroy_mutexes()
}

/// Acquire mutex `index` hosted at `owner`. Aborts on failure.
pub fn lock(index: usize, owner: Rank) {
    fatal(try_lock(index, owner))
}

/// `Result`-returning mirror of [`lock`].
pub fn try_lock(index: usize, owner: Rank) -> error::Result<()> {
    mutex::lock(index, owner)
}

/// Release mutex `index` hosted at `owner`. Aborts on failure.
pub fn unlock(index: usize, owner: Rank) {
    fatal(try_unlock(index, owner))
}

/// `Result`-returning mirror of [`unlock`].
pub fn try_unlock(index: usize, owner: Rank) -> error::Result<()> {
    mutex::unlock(index, owner)
}

// ---------------------------------------------------------------------
// 4.C Access-epoch manager (local self-access epochs)
// ---------------------------------------------------------------------

/// Open an exclusive local epoch on the caller's own slice at `local_ptr`,
/// permitting direct loads/stores that stay coherent with one-sided
/// operations issued by other participants. Aborts on failure.
pub fn access_start(local_ptr: usize) {
    fatal(try_access_start(local_ptr))
}

/// `Result`-returning mirror of [`access_start`].
pub fn try_access_start(local_ptr: usize) -> error::Result<()> {
    epoch::access_start_local(local_ptr)
}

/// Close the epoch opened by [`access_start`]. Aborts on failure.
pub fn access_end(local_ptr: usize) {
    fatal(try_access_end(local_ptr))
}

/// `Result`-returning mirror of [`access_end`].
pub fn try_access_end(local_ptr: usize) -> error::Result<()> {
    epoch::access_end_local(local_ptr)
}

// ---------------------------------------------------------------------
// 4.G Fences & barriers
// ---------------------------------------------------------------------

/// Wait for remote completion of outstanding one-sided calls against
/// `target`. A no-op under this runtime's transport assumptions. Aborts
/// on failure.
pub fn fence(target: Rank) {
    fatal(try_fence(target))
}

/// `Result`-returning mirror of [`fence`].
pub fn try_fence(target: Rank) -> error::Result<()> {
    sync::fence(target)
}

/// Wait for remote completion of outstanding one-sided calls against
/// every target. A no-op. Aborts on failure.
pub fn all_fence() {
    fatal(try_all_fence())
}

/// `Result`-returning mirror of [`all_fence`].
pub fn try_all_fence() -> error::Result<()> {
    sync::all_fence()
}

/// `all_fence` followed by a collective barrier over the default group.
/// Aborts on failure.
pub fn barrier() {
    fatal(try_barrier())
}

/// `Result`-returning mirror of [`barrier`].
pub fn try_barrier() -> error::Result<()> {
    sync::barrier()
}

// ---------------------------------------------------------------------
// 4.H Scalar value ops
// ---------------------------------------------------------------------

macro_rules! scalar_entry_points {
    ($put:ident, $try_put:ident, $get:ident, $try_get:ident, $t:ty) => {
        #[doc = concat!("Write a single `", stringify!($t), "`. Aborts on failure.")]
        pub fn $put(value: $t, remote_addr: usize, target: Rank) {
            fatal(scalar::$put(value, remote_addr, target))
        }

        #[doc = concat!("`Result`-returning mirror of [`", stringify!($put), "`].")]
        pub fn $try_put(value: $t, remote_addr: usize, target: Rank) -> error::Result<()> {
            scalar::$put(value, remote_addr, target)
        }

        #[doc = concat!("Read a single `", stringify!($t), "`. Aborts on failure.")]
        pub fn $get(remote_addr: usize, target: Rank) -> $t {
            fatal(scalar::$get(remote_addr, target))
        }

        #[doc = concat!("`Result`-returning mirror of [`", stringify!($get), "`].")]
        pub fn $try_get(remote_addr: usize, target: Rank) -> error::Result<$t> {
            scalar::$get(remote_addr, target)
        }
    };
}

scalar_entry_points!(put_value_i32, try_put_value_i32, get_value_i32, try_get_value_i32, i32);
scalar_entry_points!(put_value_i64, try_put_value_i64, get_value_i64, try_get_value_i64, i64);
scalar_entry_points!(put_value_f32, try_put_value_f32, get_value_f32, try_get_value_f32, f32);
scalar_entry_points!(put_value_f64, try_put_value_f64, get_value_f64, try_get_value_f64, f64);

// ---------------------------------------------------------------------
// 4.K Non-blocking handle mirror
// ---------------------------------------------------------------------

pub use handle::{init_handle, test, wait, wait_all};

/// Non-blocking contiguous get. Aborts on failure.
pub fn nb_get(dst: &mut [u8], src_addr: usize, target: Rank) -> Handle {
    fatal(handle::nb_get(dst, src_addr, target))
}

/// Non-blocking contiguous put. Aborts on failure.
pub fn nb_put(src: &[u8], dst_addr: usize, target: Rank) -> Handle {
    fatal(handle::nb_put(src, dst_addr, target))
}

/// Non-blocking contiguous accumulate. Aborts on failure.
pub fn nb_acc(src: &[u8], dst_addr: usize, target: Rank, dtype: DataType, scale: f64) -> Handle {
    fatal(handle::nb_acc(src, dst_addr, target, dtype, scale))
}

/// Non-blocking strided get. Aborts on failure.
pub fn nb_get_strided(dst: &mut [u8], dst_strides: &[usize], src_addr: usize, src_strides: &[usize], counts: &[usize], target: Rank) -> Handle {
    fatal(handle::nb_get_strided(dst, dst_strides, src_addr, src_strides, counts, target))
}

/// Non-blocking strided put. Aborts on failure.
pub fn nb_put_strided(src: &[u8], src_strides: &[usize], dst_addr: usize, dst_strides: &[usize], counts: &[usize], target: Rank) -> Handle {
    fatal(handle::nb_put_strided(src, src_strides, dst_addr, dst_strides, counts, target))
}

/// Non-blocking strided accumulate. Aborts on failure.
#[allow(clippy::too_many_arguments)]
pub fn nb_acc_strided(
    src: &[u8],
    src_strides: &[usize],
    dst_addr: usize,
    dst_strides: &[usize],
    counts: &[usize],
    target: Rank,
    dtype: DataType,
    scale: f64,
) -> Handle {
    fatal(handle::nb_acc_strided(src, src_strides, dst_addr, dst_strides, counts, target, dtype, scale))
}

/// Non-blocking generalized I/O-vector get. Aborts on failure.
pub fn nb_get_iov(local_buf: &mut [u8], segments: &[IovSegment], target: Rank) -> Handle {
    fatal(handle::nb_get_iov(local_buf, segments, target))
}

/// Non-blocking generalized I/O-vector put. Aborts on failure.
pub fn nb_put_iov(local_buf: &[u8], segments: &[IovSegment], target: Rank) -> Handle {
    fatal(handle::nb_put_iov(local_buf, segments, target))
}
