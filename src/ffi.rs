//! Raw one-sided (RMA) bindings.
//!
//! The safe `mpi` crate this runtime otherwise sits on wraps two-sided
//! send/recv, collectives, and group/communicator management, but not
//! `MPI_Win_*`/`MPI_Get`/`MPI_Put`/`MPI_Accumulate`/`MPI_Fetch_and_op`. This
//! module wraps those directly from `mpi-sys`, in the same style the safe
//! crate uses for its own two-sided calls: an `unsafe` FFI call per
//! function, a `Drop` impl that frees the underlying handle, and no
//! attempt to recover from a transport-reported failure (the transport's
//! own `MPI_Errhandler` is left at the MPI-2 default of aborting).
//!
//! Nothing here is exposed outside the crate; [`crate::registry`] and
//! [`crate::epoch`] are the only callers.

use std::os::raw::c_void;

use mpi_sys as sys;

use crate::group::CommHandle;
use mpi::traits::AsRaw;

/// A one-sided window over the union of every member's local slice.
///
/// Construction is collective over the owning group's communicator
/// (`MPI_Win_create`); the local buffer passed in must outlive the window.
pub(crate) struct Window(sys::MPI_Win);

unsafe impl Send for Window {}

impl Window {
    /// Wrap `local` (this process's contribution, possibly empty) into a
    /// window over `comm`.
    pub(crate) fn create(comm: &CommHandle, local: &mut [u8]) -> Window {
        let mut win: sys::MPI_Win = std::ptr::null_mut();
        unsafe {
            sys::MPI_Win_create(
                local.as_mut_ptr() as *mut c_void,
                local.len() as sys::MPI_Aint,
                1,
                sys::RSMPI_INFO_NULL,
                comm.as_raw(),
                &mut win,
            );
        }
        Window(win)
    }

    /// Open an exclusive epoch on `target`'s segment of this window.
    ///
    /// # Standard section(s)
    ///
    /// Backs [`crate::epoch`]'s remote epochs: one MPI-2 RMA access epoch
    /// per `(window, target)` pair, matching the at-most-one-open
    /// invariant the epoch manager enforces above this layer.
    pub(crate) fn lock_exclusive(&self, target: i32) {
        unsafe {
            sys::MPI_Win_lock(sys::MPI_LOCK_EXCLUSIVE as i32, target, 0, self.0);
        }
    }

    /// Close the epoch opened by [`Window::lock_exclusive`], guaranteeing
    /// remote completion of every one-sided call issued inside it.
    pub(crate) fn unlock(&self, target: i32) {
        unsafe {
            sys::MPI_Win_unlock(target, self.0);
        }
    }

    /// `MPI_Get`: copy `len` bytes starting at `disp` on `target` into
    /// `dst`. Must be called inside a matching epoch.
    pub(crate) fn get(&self, dst: &mut [u8], target: i32, disp: usize) {
        unsafe {
            sys::MPI_Get(
                dst.as_mut_ptr() as *mut c_void,
                dst.len() as i32,
                sys::RSMPI_BYTE,
                target,
                disp as sys::MPI_Aint,
                dst.len() as i32,
                sys::RSMPI_BYTE,
                self.0,
            );
        }
    }

    /// `MPI_Put`: copy `src.len()` bytes from `src` to `disp` on `target`.
    /// Must be called inside a matching epoch.
    pub(crate) fn put(&self, src: &[u8], target: i32, disp: usize) {
        unsafe {
            sys::MPI_Put(
                src.as_ptr() as *mut c_void,
                src.len() as i32,
                sys::RSMPI_BYTE,
                target,
                disp as sys::MPI_Aint,
                src.len() as i32,
                sys::RSMPI_BYTE,
                self.0,
            );
        }
    }

    /// `MPI_Accumulate` with `MPI_SUM`: element-wise atomic add of `src`
    /// (already scaled by the caller if needed) into `target`'s memory at
    /// `disp`, interpreted as `count` elements of `datatype`. Must be
    /// called inside a matching epoch.
    pub(crate) fn accumulate_sum(
        &self,
        src: &[u8],
        target: i32,
        disp: usize,
        count: i32,
        datatype: sys::MPI_Datatype,
    ) {
        unsafe {
            sys::MPI_Accumulate(
                src.as_ptr() as *mut c_void,
                count,
                datatype,
                target,
                disp as sys::MPI_Aint,
                count,
                datatype,
                sys::RSMPI_SUM,
                self.0,
            );
        }
    }

    /// `MPI_Fetch_and_op`: atomic read-modify-write of a single element of
    /// `datatype` at `disp` on `target`, returning its prior contents.
    /// `op` is `MPI_SUM` for fetch-and-add or `MPI_REPLACE` for swap. Must
    /// be called inside a matching epoch.
    pub(crate) fn fetch_and_op(
        &self,
        value: &[u8],
        result: &mut [u8],
        target: i32,
        disp: usize,
        datatype: sys::MPI_Datatype,
        op: sys::MPI_Op,
    ) {
        unsafe {
            sys::MPI_Fetch_and_op(
                value.as_ptr() as *mut c_void,
                result.as_mut_ptr() as *mut c_void,
                datatype,
                target,
                disp as sys::MPI_Aint,
                op,
                self.0,
            );
        }
    }
}

impl Drop for Window {
    fn drop(&mut self) {
        unsafe {
            sys::MPI_Win_free(&mut self.0);
        }
    }
}

/// `MPI_SUM`, exposed for the accumulate datatype table in
/// [`crate::datatype`].
pub(crate) fn mpi_sum() -> sys::MPI_Op {
    unsafe { sys::RSMPI_SUM }
}

/// `MPI_REPLACE`, used by swap RMW ops.
pub(crate) fn mpi_replace() -> sys::MPI_Op {
    unsafe { sys::RSMPI_REPLACE }
}
