//! Seed test 1: ring rotation.
//!
//! Requires an actual multi-process launch of the transport, e.g.
//! `mpirun -n 4 cargo test --test ring_rotation`. Under a single-process
//! `cargo test` run the scenario degenerates to a self-put and still
//! passes, but it is only a meaningful end-to-end check with more than
//! one participant.

#[test]
fn every_rank_receives_its_left_neighbor_rank_number() {
    let _ = env_logger::builder().is_test(true).try_init();
    pgas_rt::init().expect("init");

    let world = pgas_rt::get_world();
    let size = world.size();
    let rank = world.rank();
    let left = (rank - 1 + size) % size;
    let right = (rank + 1) % size;

    let (record, bases) = pgas_rt::try_malloc_group(std::mem::size_of::<i32>(), world).expect("malloc_group");
    world.barrier();

    pgas_rt::try_put(&rank.to_ne_bytes(), bases[right as usize], right).expect("put");
    world.barrier();

    let mut buf = [0u8; 4];
    pgas_rt::try_get(&mut buf, bases[rank as usize], rank).expect("get");
    assert_eq!(i32::from_ne_bytes(buf), left);

    pgas_rt::try_free_group(record.slice(rank).base, world).expect("free_group");
    pgas_rt::finalize();
}
