//! Typed single-element put/get, a zero-scratch convenience over the
//! contiguous transfer engine.
//!
//! # Standard section(s)
//!
//! Implements component 4.H. Each function is exactly a contiguous
//! put/get of `size_of::<T>()` bytes; no accumulate semantics apply.

use crate::error::Result;
use crate::group::Rank;
use crate::transfer::contig;

macro_rules! scalar_ops {
    ($put:ident, $get:ident, $t:ty) => {
        #[doc = concat!("Write a single `", stringify!($t), "` to `target`'s memory at `remote_addr`.")]
        pub fn $put(value: $t, remote_addr: usize, target: Rank) -> Result<()> {
            contig::put(&value.to_ne_bytes(), remote_addr, target)
        }

        #[doc = concat!("Read a single `", stringify!($t), "` from `target`'s memory at `remote_addr`.")]
        pub fn $get(remote_addr: usize, target: Rank) -> Result<$t> {
            let mut buf = [0u8; std::mem::size_of::<$t>()];
            contig::get(&mut buf, remote_addr, target)?;
            Ok(<$t>::from_ne_bytes(buf))
        }
    };
}

scalar_ops!(put_value_i32, get_value_i32, i32);
scalar_ops!(put_value_i64, get_value_i64, i64);
scalar_ops!(put_value_f32, get_value_f32, f32);
scalar_ops!(put_value_f64, get_value_f64, f64);
