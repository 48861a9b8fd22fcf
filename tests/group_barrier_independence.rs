//! Seed test 6: group barrier independence.
//!
//! Splits the world into even- and odd-ranked subgroups and checks that
//! each subgroup's barrier only synchronizes its own members: every
//! member observes the correct subgroup size and can translate its
//! subgroup-local rank back to its world rank via `absolute_id`.
//!
//! Requires an actual multi-process launch with at least 2 participants,
//! e.g. `mpirun -n 4 cargo test --test group_barrier_independence`.

#[test]
fn subgroup_membership_and_barrier_are_independent_of_the_world_group() {
    let _ = env_logger::builder().is_test(true).try_init();
    pgas_rt::init().expect("init");

    let world = pgas_rt::get_world();
    let size = world.size();
    let rank = world.rank();

    let evens: Vec<pgas_rt::Rank> = (0..size).step_by(2).collect();
    let odds: Vec<pgas_rt::Rank> = (1..size).step_by(2).collect();
    let my_parity = if evens.contains(&rank) { &evens } else { &odds };

    let sub = pgas_rt::try_group_create(world, my_parity).expect("group_create");
    assert!(sub.is_active(), "every world rank is a member of exactly one parity subgroup");
    assert_eq!(sub.size() as usize, my_parity.len());

    let expected_local_rank = my_parity.iter().position(|&r| r == rank).unwrap() as pgas_rt::Rank;
    assert_eq!(sub.rank(), expected_local_rank);
    assert_eq!(sub.absolute_id(sub.rank()), rank);

    sub.barrier();
    world.barrier();

    pgas_rt::group_free(sub);
    pgas_rt::finalize();
}
