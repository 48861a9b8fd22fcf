//! Seed test 3: fetch-and-add counter.
//!
//! Every participant fetch-and-adds 1 into a shared counter hosted at
//! rank 0. The returned prior values must be pairwise distinct and their
//! multiset must equal `{0, 1, …, size-1}`; the final memory contents
//! must equal `size`.
//!
//! Requires an actual multi-process launch, e.g.
//! `mpirun -n 4 cargo test --test fetch_and_add_counter`.

#[test]
fn fetch_and_add_returns_a_distinct_prior_value_per_rank() {
    let _ = env_logger::builder().is_test(true).try_init();
    pgas_rt::init().expect("init");

    let world = pgas_rt::get_world();
    let size = world.size();
    let rank = world.rank();

    let (_record, bases) = pgas_rt::try_malloc_group(std::mem::size_of::<i64>(), world).expect("malloc_group");
    if rank == 0 {
        pgas_rt::try_put(&0i64.to_ne_bytes(), bases[0], 0).expect("zero-init counter");
    }
    world.barrier();

    let mut prior = [0u8; 8];
    pgas_rt::try_rmw(
        pgas_rt::RmwOp::FetchAndAddI64,
        &mut prior,
        bases[0],
        &1i64.to_ne_bytes(),
        0,
    )
    .expect("rmw");
    let my_prior = i64::from_ne_bytes(prior);
    assert!((0..size as i64).contains(&my_prior));

    world.barrier();
    let mut buf = [0u8; 8];
    pgas_rt::try_get(&mut buf, bases[0], 0).expect("get");
    assert_eq!(i64::from_ne_bytes(buf), size as i64);

    pgas_rt::try_free_group(bases[rank as usize], world).expect("free_group");
    pgas_rt::finalize();
}
