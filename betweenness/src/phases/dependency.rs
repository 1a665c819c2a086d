use lamellar::active_messaging::prelude::*;
use lamellar::darc::prelude::*;

use rayon::prelude::*;

use std::sync::atomic::{AtomicUsize, Ordering};

use crate::graph::BcGraph;
use crate::sync::{sync, BcState, Field, Reduce, WorkAccum};
use crate::vertex::{TokenState, INF};

/// Back-propagate Brandes dependencies from the DAG leaves toward the source.
///
/// A `Ready` vertex is a leaf of the remaining DAG (`nsucc == 0`); it pushes
/// `(sigma(t) / sigma(s)) * (1 + delta(s))` into each predecessor `t` through
/// the `trim2`/`to_add_f` buffers and retires. Edges into the current source
/// are skipped, so the source keeps its successor count — the endpoints of a
/// path carry no centrality.
pub fn run(
    world: &LamellarWorld,
    graph: &BcGraph,
    state: &Darc<BcState>,
    accum: &WorkAccum,
    src: u64,
    max_iterations: u32,
) {
    let active = graph.local_range_with_edges();
    let num_vertices = state.num_vertices();
    let mut iterations = 0;

    // seed: vertices that finished path counting with no successors are the
    // initial leaves
    (0..num_vertices).into_par_iter().for_each(|v| {
        let vs = &state.vertices[v];
        if vs.dist.load(Ordering::Relaxed) != INF
            && vs.nsucc.load(Ordering::Relaxed) == 0
            && vs.dep_token.load() == TokenState::Waiting
        {
            vs.dep_token.store(TokenState::Ready);
        }
    });
    world.barrier();

    loop {
        accum.reset();
        world.barrier();

        // propagate from the current leaves
        let work = AtomicUsize::new(0);
        active.par_iter().for_each(|&s| {
            let s = s as usize;
            let vs = &state.vertices[s];
            if vs.dist.load(Ordering::Relaxed) == INF || !vs.dep_token.is_ready() {
                return;
            }
            assert_eq!(
                vs.nsucc.load(Ordering::Relaxed),
                0,
                "vertex {s} propagated dependency with unsettled successors"
            );

            let dist_s = vs.dist.load(Ordering::Relaxed);
            let sigma_s = vs.sigma.load(Ordering::Relaxed) as f32;
            let delta_s = vs.delta.load();
            for &t in graph.out_edges(s) {
                if t as u64 == src {
                    continue;
                }
                let t = t as usize;
                let td = &state.vertices[t];
                if td.dist.load(Ordering::Relaxed) + 1 == dist_s {
                    let sigma_t = td.sigma.load(Ordering::Relaxed) as f32;
                    td.trim2.fetch_add(1, Ordering::Relaxed);
                    td.to_add_f.fetch_add((sigma_t / sigma_s) * (1.0 + delta_s));
                    state.mark(Field::Trim2, t);
                    state.mark(Field::ToAddF, t);
                    work.fetch_add(1, Ordering::Relaxed);
                }
            }
            vs.dep_token.store(TokenState::Done);
        });
        accum.add(work.into_inner());

        // settle consumed successors
        sync(world, graph, state, Field::Trim2, Reduce::Add);
        (0..num_vertices).into_par_iter().for_each(|v| {
            let vs = &state.vertices[v];
            let trim2 = vs.trim2.load(Ordering::Relaxed);
            if trim2 > 0 {
                vs.nsucc.fetch_sub(trim2, Ordering::Relaxed);
                vs.trim2.store(0, Ordering::Relaxed);
            }
        });

        // fold pushed contributions into delta
        sync(world, graph, state, Field::ToAddF, Reduce::Add);
        (0..num_vertices).into_par_iter().for_each(|v| {
            let vs = &state.vertices[v];
            let to_add_f = vs.to_add_f.load();
            if to_add_f > 0.0 {
                vs.delta.fetch_add(to_add_f);
                vs.to_add_f.store(0.0);
            }
        });

        // newly settled vertices become the next round's leaves
        (0..num_vertices).into_par_iter().for_each(|v| {
            let vs = &state.vertices[v];
            if vs.dist.load(Ordering::Relaxed) != INF
                && vs.nsucc.load(Ordering::Relaxed) == 0
                && vs.dep_token.load() == TokenState::Waiting
            {
                vs.dep_token.store(TokenState::Ready);
            }
        });

        iterations += 1;
        if accum.reduce(world) == 0 {
            break;
        }
        if iterations >= max_iterations {
            panic!("dependency propagation did not settle within {iterations} supersteps");
        }
    }
}
