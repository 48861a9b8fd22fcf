//! Seed test 4: strided 3D copy.
//!
//! Writes a small 3D box of `i32` elements to a neighbor's memory via
//! `put_strided` and reads it back via `get_strided`, checking the box
//! arrives byte-for-byte equal to issuing every leaf transfer
//! individually.
//!
//! Requires an actual multi-process launch, e.g.
//! `mpirun -n 2 cargo test --test strided_copy`.

const ELEM: usize = 4;
const DIM0: usize = 2; // contiguous elements per leaf
const DIM1: usize = 3; // segments along the first strided dimension
const DIM2: usize = 2; // segments along the second strided dimension

fn make_box() -> Vec<u8> {
    let mut buf = vec![0u8; DIM0 * DIM1 * DIM2 * ELEM];
    for (i, chunk) in buf.chunks_exact_mut(ELEM).enumerate() {
        chunk.copy_from_slice(&(i as i32).to_ne_bytes());
    }
    buf
}

#[test]
fn strided_box_round_trips_through_a_neighbor() {
    let _ = env_logger::builder().is_test(true).try_init();
    pgas_rt::init().expect("init");

    let world = pgas_rt::get_world();
    let size = world.size();
    let rank = world.rank();
    let target = (rank + 1) % size;

    let box_bytes = DIM0 * DIM1 * DIM2 * ELEM;
    let (_record, bases) = pgas_rt::try_malloc_group(box_bytes, world).expect("malloc_group");
    world.barrier();

    let src = make_box();
    let leaf = DIM0 * ELEM;
    let src_strides = [leaf, leaf * DIM1];
    let dst_strides = [leaf, leaf * DIM1];
    let counts = [leaf, DIM1, DIM2];

    pgas_rt::try_put_strided(&src, &src_strides, bases[target as usize], &dst_strides, &counts, target)
        .expect("put_strided");
    world.barrier();

    let mut dst = vec![0u8; box_bytes];
    pgas_rt::try_get_strided(&mut dst, &dst_strides, bases[rank as usize], &src_strides, &counts, rank)
        .expect("get_strided");

    assert_eq!(dst, src, "strided round trip must be byte-for-byte identical to the source box");

    pgas_rt::try_free_group(bases[rank as usize], world).expect("free_group");
    pgas_rt::finalize();
}
