//! N-dimensional strided and generalized I/O-vector transfers.
//!
//! # Standard section(s)
//!
//! Implements component 4.E. A strided descriptor addresses an
//! `L`-dimensional box: `count[0]` is the contiguous leaf length in bytes,
//! `count[1..=L]` is the number of segments along each outer dimension,
//! and `src_strides`/`dst_strides` (length `L`) give the byte distance
//! between successive segments along each of those dimensions. The box is
//! walked depth-first and each leaf handed to the contiguous engine;
//! ordering across leaves is unconstrained, matching the guarantee that
//! only aggregate completion at end-of-call is promised.

use smallvec::SmallVec;

use crate::datatype::DataType;
use crate::error::{Result, RtError};
use crate::group::Rank;
use crate::transfer::contig;

/// Inline capacity for stride/count vectors: most strided transfers in
/// practice describe 2D or 3D boxes.
const INLINE_DIMS: usize = 4;

fn validate(src_strides: &[usize], dst_strides: &[usize], counts: &[usize]) -> Result<usize> {
    let l = src_strides.len();
    if dst_strides.len() != l || counts.len() != l + 1 {
        return Err(RtError::BadSize {
            size: l as i64,
            reason: "stride/count vector length mismatch",
        });
    }
    if counts[0] == 0 {
        return Err(RtError::BadSize { size: 0, reason: "zero-length leaf segment" });
    }
    Ok(l)
}

/// Walk the box described by `counts`/`src_strides`/`dst_strides`,
/// invoking `leaf(src_off, dst_off)` once per contiguous segment.
fn walk(src_strides: &[usize], dst_strides: &[usize], counts: &[usize], mut leaf: impl FnMut(usize, usize)) {
    let dims = src_strides.len();
    // index[k] tracks how far along dimension k+1 the walk currently is.
    let mut index: SmallVec<[usize; INLINE_DIMS]> = SmallVec::from_elem(0, dims);
    loop {
        let src_off: usize = index.iter().zip(src_strides).map(|(&i, &s)| i * s).sum();
        let dst_off: usize = index.iter().zip(dst_strides).map(|(&i, &s)| i * s).sum();
        leaf(src_off, dst_off);

        // Odometer increment over the outer dimensions, outermost last so
        // the innermost (index[0], i.e. count[1]) varies fastest.
        let mut k = 0;
        loop {
            if k == dims {
                return;
            }
            index[k] += 1;
            if index[k] < counts[k + 1] {
                break;
            }
            index[k] = 0;
            k += 1;
        }
    }
}

/// Copy the box described by `counts` (leaf length followed by per-dimension
/// segment counts) from `target`'s memory, walking `src_strides` remotely
/// and `dst_strides` into `dst` locally.
pub fn get_strided(
    dst: &mut [u8],
    dst_strides: &[usize],
    src_addr: usize,
    src_strides: &[usize],
    counts: &[usize],
    target: Rank,
) -> Result<()> {
    let leaf_len = counts[0];
    validate(src_strides, dst_strides, counts)?;
    let mut err = None;
    walk(src_strides, dst_strides, counts, |src_off, dst_off| {
        if err.is_some() {
            return;
        }
        if dst_off + leaf_len > dst.len() {
            err = Some(RtError::BadSize { size: leaf_len as i64, reason: "destination box exceeds local buffer" });
            return;
        }
        if let Err(e) = contig::get(&mut dst[dst_off..dst_off + leaf_len], src_addr + src_off, target) {
            err = Some(e);
        }
    });
    err.map_or(Ok(()), Err)
}

/// Copy the box described by `counts` from `src` into `target`'s memory.
pub fn put_strided(
    src: &[u8],
    src_strides: &[usize],
    dst_addr: usize,
    dst_strides: &[usize],
    counts: &[usize],
    target: Rank,
) -> Result<()> {
    let leaf_len = counts[0];
    validate(src_strides, dst_strides, counts)?;
    let mut err = None;
    walk(src_strides, dst_strides, counts, |src_off, dst_off| {
        if err.is_some() {
            return;
        }
        if src_off + leaf_len > src.len() {
            err = Some(RtError::BadSize { size: leaf_len as i64, reason: "source box exceeds local buffer" });
            return;
        }
        if let Err(e) = contig::put(&src[src_off..src_off + leaf_len], dst_addr + dst_off, target) {
            err = Some(e);
        }
    });
    err.map_or(Ok(()), Err)
}

/// Accumulate the box described by `counts` from `src` into `target`'s
/// memory.
pub fn acc_strided(
    src: &[u8],
    src_strides: &[usize],
    dst_addr: usize,
    dst_strides: &[usize],
    counts: &[usize],
    target: Rank,
    dtype: DataType,
    scale: f64,
) -> Result<()> {
    let leaf_len = counts[0];
    validate(src_strides, dst_strides, counts)?;
    let mut err = None;
    walk(src_strides, dst_strides, counts, |src_off, dst_off| {
        if err.is_some() {
            return;
        }
        if src_off + leaf_len > src.len() {
            err = Some(RtError::BadSize { size: leaf_len as i64, reason: "source box exceeds local buffer" });
            return;
        }
        if let Err(e) = contig::accumulate(&src[src_off..src_off + leaf_len], dst_addr + dst_off, target, dtype, scale) {
            err = Some(e);
        }
    });
    err.map_or(Ok(()), Err)
}

/// One descriptor of the generalized I/O-vector form: `count` independent
/// `bytes`-length transfers. `local_offsets` gives, for each transfer, the
/// byte offset into the caller's single local buffer; `remote_addrs` gives
/// the matching remote address. The two are always the same length.
pub struct IovSegment {
    pub local_offsets: Vec<usize>,
    pub remote_addrs: Vec<usize>,
    pub bytes: usize,
}

impl IovSegment {
    fn check(&self) -> Result<()> {
        if self.local_offsets.len() != self.remote_addrs.len() {
            return Err(RtError::BadSize { size: self.bytes as i64, reason: "I/O-vector address count mismatch" });
        }
        Ok(())
    }
}

/// Generalized I/O-vector get: copies `seg.bytes` from `target`'s memory at
/// each `remote_addr` into `local_buf` at the matching `local_offset`,
/// equivalent to issuing every pair sequentially; no ordering across pairs
/// or across descriptors is guaranteed, matching the box-walk entry points
/// above.
pub fn get_iov(local_buf: &mut [u8], segments: &[IovSegment], target: Rank) -> Result<()> {
    for seg in segments {
        seg.check()?;
        for (&local_off, &remote_addr) in seg.local_offsets.iter().zip(&seg.remote_addrs) {
            let dst = local_buf
                .get_mut(local_off..local_off + seg.bytes)
                .ok_or(RtError::BadSize { size: seg.bytes as i64, reason: "I/O-vector local offset exceeds local buffer" })?;
            contig::get(dst, remote_addr, target)?;
        }
    }
    Ok(())
}

/// Generalized I/O-vector put: copies `seg.bytes` from `local_buf` at each
/// `local_offset` to `target`'s memory at the matching `remote_addr`.
pub fn put_iov(local_buf: &[u8], segments: &[IovSegment], target: Rank) -> Result<()> {
    for seg in segments {
        seg.check()?;
        for (&local_off, &remote_addr) in seg.local_offsets.iter().zip(&seg.remote_addrs) {
            let src = local_buf
                .get(local_off..local_off + seg.bytes)
                .ok_or(RtError::BadSize { size: seg.bytes as i64, reason: "I/O-vector local offset exceeds local buffer" })?;
            contig::put(src, remote_addr, target)?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn walk_visits_every_leaf_in_a_2d_box() {
        // 3 segments of 2 elements each: counts = [leaf_len, 3], one stride
        // dimension.
        let mut visits = Vec::new();
        walk(&[8], &[8], &[8, 3], |s, d| visits.push((s, d)));
        assert_eq!(visits, vec![(0, 0), (8, 8), (16, 16)]);
    }

    #[test]
    fn walk_visits_every_leaf_in_a_3d_box() {
        let mut visits = Vec::new();
        walk(&[8, 32], &[8, 32], &[8, 2, 3], |s, d| visits.push((s, d)));
        assert_eq!(visits.len(), 6);
        assert!(visits.contains(&(32 + 8, 32 + 8)));
    }

    #[test]
    fn validate_rejects_mismatched_lengths() {
        assert!(validate(&[8], &[8, 16], &[8, 2]).is_err());
        assert!(validate(&[8], &[8], &[8]).is_err());
    }

    #[test]
    fn iov_segment_rejects_mismatched_address_counts() {
        let seg = IovSegment { local_offsets: vec![0, 8], remote_addrs: vec![100], bytes: 8 };
        assert!(matches!(seg.check(), Err(RtError::BadSize { .. })));
    }
}
