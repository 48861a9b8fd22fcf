//! Accumulate datatypes and read-modify-write operation tags.
//!
//! # Standard section(s)
//!
//! Implements the datatype and RMW-op tag vocabulary referenced throughout
//! component 4.D (accumulate) and 4.F (fetch-and-op). The original spec
//! text describes "five" accumulate datatypes but enumerates six; this
//! keeps all six (int32, int64, float32, float64, and the two complex
//! variants, the complex ones gated behind the `complex` feature) rather
//! than silently dropping one to make the prose and the enum agree.

use mpi_sys as sys;

use crate::error::{Result, RtError};
use crate::ffi;

/// An accumulate element type, as named by the tag a caller passes to
/// `accumulate`/`accumulate_strided`/`accumulate_iov`.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum DataType {
    Int32,
    Int64,
    Float32,
    Float64,
    #[cfg(feature = "complex")]
    ComplexFloat,
    #[cfg(feature = "complex")]
    ComplexDouble,
}

impl DataType {
    /// Decode a caller-supplied tag, per the taxonomy's six accumulate
    /// types (0..=5; 4 and 5 require the `complex` feature).
    pub fn from_tag(tag: i32) -> Result<DataType> {
        match tag {
            0 => Ok(DataType::Int32),
            1 => Ok(DataType::Int64),
            2 => Ok(DataType::Float32),
            3 => Ok(DataType::Float64),
            #[cfg(feature = "complex")]
            4 => Ok(DataType::ComplexFloat),
            #[cfg(feature = "complex")]
            5 => Ok(DataType::ComplexDouble),
            _ => Err(RtError::UnsupportedDataType { tag }),
        }
    }

    /// Size in bytes of one element of this type.
    pub fn element_size(self) -> usize {
        match self {
            DataType::Int32 => 4,
            DataType::Int64 => 8,
            DataType::Float32 => 4,
            DataType::Float64 => 8,
            #[cfg(feature = "complex")]
            DataType::ComplexFloat => 8,
            #[cfg(feature = "complex")]
            DataType::ComplexDouble => 16,
        }
    }

    /// The transport datatype constant one-sided accumulate/fetch-and-op
    /// calls must tag the element with.
    pub(crate) fn mpi_datatype(self) -> sys::MPI_Datatype {
        unsafe {
            match self {
                DataType::Int32 => sys::RSMPI_INT32_T,
                DataType::Int64 => sys::RSMPI_INT64_T,
                DataType::Float32 => sys::RSMPI_FLOAT,
                DataType::Float64 => sys::RSMPI_DOUBLE,
                #[cfg(feature = "complex")]
                DataType::ComplexFloat => sys::RSMPI_C_FLOAT_COMPLEX,
                #[cfg(feature = "complex")]
                DataType::ComplexDouble => sys::RSMPI_C_DOUBLE_COMPLEX,
            }
        }
    }

    /// Validate that `bytes` holds a whole number of elements of this type,
    /// returning the element count.
    pub fn element_count(self, bytes: usize) -> Result<usize> {
        let size = self.element_size();
        if bytes == 0 || bytes % size != 0 {
            return Err(RtError::BadSize { size: bytes as i64, reason: "not a positive multiple of the element size" });
        }
        Ok(bytes / size)
    }

    /// Multiply every element of `buf` (interpreted as this type) by
    /// `scale`, writing the result into `scratch`. Used by the scaled
    /// accumulate path when `scale != 1`, since MPI's `MPI_Accumulate` has
    /// no scaling primitive of its own.
    ///
    /// `scratch` must be at least as long as `buf`.
    pub(crate) fn scale_into(self, buf: &[u8], scale: f64, scratch: &mut [u8]) {
        debug_assert_eq!(buf.len(), scratch.len());
        match self {
            DataType::Int32 => scale_as::<i32>(buf, scratch, |v| (v as f64 * scale) as i32),
            DataType::Int64 => scale_as::<i64>(buf, scratch, |v| (v as f64 * scale) as i64),
            DataType::Float32 => scale_as::<f32>(buf, scratch, |v| v * scale as f32),
            DataType::Float64 => scale_as::<f64>(buf, scratch, |v| v * scale),
            #[cfg(feature = "complex")]
            DataType::ComplexFloat => {
                scale_as::<num_complex::Complex32>(buf, scratch, |v| v * (scale as f32))
            }
            #[cfg(feature = "complex")]
            DataType::ComplexDouble => scale_as::<num_complex::Complex64>(buf, scratch, |v| v * scale),
        }
    }
}

/// Reinterpret `buf`/`scratch` as `[T]`, apply `f` element-wise.
///
/// # Safety
///
/// Every call site passes a plain numeric (or `num_complex::Complex<_>`)
/// type with no invalid bit patterns and whose size evenly divides the
/// buffer length, guaranteed by [`DataType::element_count`] at the API
/// boundary before any buffer reaches this function.
fn scale_as<T: Copy>(buf: &[u8], scratch: &mut [u8], f: impl Fn(T) -> T) {
    let size = std::mem::size_of::<T>();
    for (src, dst) in buf.chunks_exact(size).zip(scratch.chunks_exact_mut(size)) {
        let mut raw = std::mem::MaybeUninit::<T>::uninit();
        unsafe {
            std::ptr::copy_nonoverlapping(src.as_ptr(), raw.as_mut_ptr() as *mut u8, size);
            let scaled = f(raw.assume_init());
            std::ptr::copy_nonoverlapping(&scaled as *const T as *const u8, dst.as_mut_ptr(), size);
        }
    }
}

/// A read-modify-write operation tag, as named by the tag a caller passes
/// to `rmw`.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum RmwOp {
    FetchAndAddI32,
    FetchAndAddI64,
    SwapI32,
    SwapI64,
}

impl RmwOp {
    pub fn from_tag(tag: i32) -> Result<RmwOp> {
        match tag {
            0 => Ok(RmwOp::FetchAndAddI32),
            1 => Ok(RmwOp::FetchAndAddI64),
            2 => Ok(RmwOp::SwapI32),
            3 => Ok(RmwOp::SwapI64),
            _ => Err(RtError::UnsupportedOp { tag }),
        }
    }

    /// Element width in bytes.
    pub fn element_size(self) -> usize {
        match self {
            RmwOp::FetchAndAddI32 | RmwOp::SwapI32 => 4,
            RmwOp::FetchAndAddI64 | RmwOp::SwapI64 => 8,
        }
    }

    pub(crate) fn mpi_datatype_and_op(self) -> (sys::MPI_Datatype, sys::MPI_Op) {
        unsafe {
            match self {
                RmwOp::FetchAndAddI32 => (sys::RSMPI_INT32_T, ffi::mpi_sum()),
                RmwOp::FetchAndAddI64 => (sys::RSMPI_INT64_T, ffi::mpi_sum()),
                RmwOp::SwapI32 => (sys::RSMPI_INT32_T, ffi::mpi_replace()),
                RmwOp::SwapI64 => (sys::RSMPI_INT64_T, ffi::mpi_replace()),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn element_count_rejects_misaligned_bytes() {
        assert!(DataType::Float64.element_count(12).is_err());
        assert_eq!(DataType::Float64.element_count(16).unwrap(), 2);
    }

    #[test]
    fn scale_into_doubles_i32_elements() {
        let buf = 7i32.to_ne_bytes();
        let mut scratch = [0u8; 4];
        DataType::Int32.scale_into(&buf, 2.0, &mut scratch);
        assert_eq!(i32::from_ne_bytes(scratch), 14);
    }

    #[test]
    fn rmw_op_tags_round_trip() {
        assert_eq!(RmwOp::from_tag(0).unwrap(), RmwOp::FetchAndAddI32);
        assert!(RmwOp::from_tag(9).is_err());
    }
}
