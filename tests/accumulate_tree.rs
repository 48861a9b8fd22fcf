//! Seed test 2: accumulate tree.
//!
//! Every participant accumulates its own rank into a single shared
//! counter hosted at rank 0; the final value must equal the triangular
//! sum `0 + 1 + … + (size-1)` regardless of the order accumulates land in.
//!
//! Requires an actual multi-process launch, e.g.
//! `mpirun -n 4 cargo test --test accumulate_tree`.

#[test]
fn concurrent_accumulates_sum_exactly() {
    let _ = env_logger::builder().is_test(true).try_init();
    pgas_rt::init().expect("init");

    let world = pgas_rt::get_world();
    let size = world.size();
    let rank = world.rank();

    let (_record, bases) = pgas_rt::try_malloc_group(std::mem::size_of::<i32>(), world).expect("malloc_group");
    if rank == 0 {
        pgas_rt::try_put(&0i32.to_ne_bytes(), bases[0], 0).expect("zero-init counter");
    }
    world.barrier();

    pgas_rt::try_acc(&rank.to_ne_bytes(), bases[0], 0, pgas_rt::DataType::Int32, 1.0).expect("acc");
    world.barrier();

    let mut buf = [0u8; 4];
    pgas_rt::try_get(&mut buf, bases[0], 0).expect("get");
    let expected = size * (size - 1) / 2;
    assert_eq!(i32::from_ne_bytes(buf), expected);

    pgas_rt::try_free_group(bases[rank as usize], world).expect("free_group");
    pgas_rt::finalize();
}
