//! Seed test 5: mutex critical section.
//!
//! Every participant repeatedly locks mutex 0 (hosted at rank 0),
//! increments a shared counter by a non-atomic read-modify-write, and
//! unlocks. If the mutex provides mutual exclusion the final count must
//! equal `size * ITERATIONS` exactly; a race would corrupt it.
//!
//! Requires an actual multi-process launch, e.g.
//! `mpirun -n 4 cargo test --test mutex_critical_section`.

const ITERATIONS: i32 = 20;

#[test]
fn mutex_serializes_a_non_atomic_increment() {
    let _ = env_logger::builder().is_test(true).try_init();
    pgas_rt::init().expect("init");

    let world = pgas_rt::get_world();
    let size = world.size();
    let rank = world.rank();

    let (_record, bases) = pgas_rt::try_malloc_group(std::mem::size_of::<i32>(), world).expect("malloc_group");
    if rank == 0 {
        pgas_rt::try_put(&0i32.to_ne_bytes(), bases[0], 0).expect("zero-init counter");
    }
    pgas_rt::try_create_mutexes(1, world).expect("create_mutexes");
    world.barrier();

    for _ in 0..ITERATIONS {
        pgas_rt::try_lock(0, 0).expect("lock");
        let mut buf = [0u8; 4];
        pgas_rt::try_get(&mut buf, bases[0], 0).expect("get");
        let value = i32::from_ne_bytes(buf) + 1;
        pgas_rt::try_put(&value.to_ne_bytes(), bases[0], 0).expect("put");
        pgas_rt::try_unlock(0, 0).expect("unlock");
    }
    world.barrier();

    let mut buf = [0u8; 4];
    pgas_rt::try_get(&mut buf, bases[0], 0).expect("get");
    assert_eq!(i32::from_ne_bytes(buf), size * ITERATIONS);

    pgas_rt::try_destroy_mutexes().expect("destroy_mutexes");
    pgas_rt::try_free_group(bases[rank as usize], world).expect("free_group");
    pgas_rt::finalize();
}
