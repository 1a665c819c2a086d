use lamellar::active_messaging::prelude::*;
use lamellar::darc::prelude::*;

use rand::prelude::*;

use std::collections::HashSet;

use betweenness::graph::BcGraph;
use betweenness::phases::{init, run_source, PhaseTimes};
use betweenness::serial;
use betweenness::sources::select_sources;
use betweenness::sync::{BcState, WorkAccum};

fn compute_bc(
    world: &LamellarWorld,
    num_nodes: usize,
    edges: &[(u32, u32)],
    sources: &[u64],
) -> Vec<f32> {
    let graph = BcGraph::from_edges(num_nodes, edges, world.my_pe(), world.num_pes());
    let state = Darc::new(world.team(), BcState::new(num_nodes)).unwrap();
    let accum = WorkAccum::new(world);

    init::init_graph(&state);
    world.barrier();

    let mut times = PhaseTimes::default();
    for &src in sources {
        run_source(world, &graph, &state, &accum, src, 10000, &mut times);
    }

    (0..num_nodes)
        .map(|v| state.vertices[v].bc.load())
        .collect()
}

fn assert_close(actual: &[f32], expected: &[f32]) {
    assert_eq!(actual.len(), expected.len());
    for (v, (a, e)) in actual.iter().zip(expected.iter()).enumerate() {
        let tolerance = 1e-4 * e.abs().max(1.0);
        assert!(
            (a - e).abs() <= tolerance,
            "vertex {v}: got {a}, expected {e}"
        );
    }
}

fn all_sources(num_nodes: usize) -> Vec<u64> {
    (0..num_nodes as u64).collect()
}

fn random_graph(num_nodes: usize, num_edges: usize, seed: u64) -> Vec<(u32, u32)> {
    let mut rng = StdRng::seed_from_u64(seed);
    let mut picked = HashSet::new();
    while picked.len() < num_edges {
        let u = rng.gen_range(0..num_nodes as u32);
        let v = rng.gen_range(0..num_nodes as u32);
        if u != v {
            picked.insert((u, v));
        }
    }
    let mut edges: Vec<_> = picked.into_iter().collect();
    edges.sort_unstable();
    edges
}

#[test]
fn bc_pipeline() {
    let world = lamellar::LamellarWorldBuilder::new().build();

    // triangle: every pair has a unique direct shortest path
    let bc = compute_bc(&world, 3, &[(0, 1), (1, 2), (0, 2)], &all_sources(3));
    assert_close(&bc, &[0.0, 0.0, 0.0]);

    // path of four: the middle vertices each sit on two paths
    let bc = compute_bc(&world, 4, &[(0, 1), (1, 2), (2, 3)], &all_sources(4));
    assert_close(&bc, &[0.0, 2.0, 2.0, 0.0]);

    // diamond from a single source: two equal-length paths split the credit
    let bc = compute_bc(&world, 4, &[(0, 1), (0, 2), (1, 3), (2, 3)], &[0]);
    assert_close(&bc, &[0.0, 0.5, 0.5, 0.0]);

    // disconnected pairs: unreached vertices contribute nothing
    let bc = compute_bc(&world, 4, &[(0, 1), (2, 3)], &all_sources(4));
    assert_close(&bc, &[0.0, 0.0, 0.0, 0.0]);

    // self loops are never shortest-path edges
    let bc = compute_bc(&world, 2, &[(0, 0), (0, 1)], &all_sources(2));
    assert_close(&bc, &[0.0, 0.0]);

    // sampled sources are stable between runs, and so are the scores
    let edges = random_graph(1000, 5000, 42);
    let sources = select_sources(1000, false, 0, 5);
    assert_eq!(sources, select_sources(1000, false, 0, 5));
    let first = compute_bc(&world, 1000, &edges, &sources);
    let second = compute_bc(&world, 1000, &edges, &sources);
    assert_close(&first, &second);

    // exact run over every source against the serial reference
    let edges = random_graph(60, 240, 7);
    let got = compute_bc(&world, 60, &edges, &all_sources(60));
    let want = serial::betweenness(60, &edges, &all_sources(60));
    assert_close(&got, &want);
}
