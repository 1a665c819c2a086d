use lamellar::active_messaging::prelude::*;
use lamellar::darc::prelude::*;

use rayon::prelude::*;

use std::sync::atomic::{AtomicUsize, Ordering};

use crate::graph::BcGraph;
use crate::sync::{sync, BcState, Field, Reduce, WorkAccum};
use crate::vertex::INF;

/// Pull-style hop-distance relaxation from the current source.
///
/// Each superstep every owned vertex with edges reads its stored out-neighbors
/// (its predecessors in the input orientation) and lowers its own distance;
/// the lowered distances are then min-reduced and re-broadcast. Terminates
/// when no PE lowered anything in a whole superstep.
pub fn run(
    world: &LamellarWorld,
    graph: &BcGraph,
    state: &Darc<BcState>,
    accum: &WorkAccum,
    max_iterations: u32,
) {
    let active = graph.local_range_with_edges();
    let mut iterations = 0;

    loop {
        accum.reset();
        world.barrier();

        let work = AtomicUsize::new(0);
        active.par_iter().for_each(|&s| {
            let s = s as usize;
            let vs = &state.vertices[s];
            let cur = vs.dist.load(Ordering::Relaxed);
            let mut best = cur;
            for &t in graph.out_edges(s) {
                let nd = 1 + state.vertices[t as usize].dist.load(Ordering::Relaxed);
                if nd < best {
                    best = nd;
                }
            }
            if best < cur {
                vs.dist.fetch_min(best, Ordering::Relaxed);
                state.mark(Field::Dist, s);
                work.fetch_add(1, Ordering::Relaxed);
            }
        });
        accum.add(work.into_inner());

        sync(world, graph, state, Field::Dist, Reduce::Min);

        iterations += 1;
        if accum.reduce(world) == 0 {
            break;
        }
        if iterations >= max_iterations {
            panic!("bfs did not settle within {iterations} supersteps");
        }
    }

    debug_assert!(
        graph
            .local_range()
            .all(|v| state.vertices[v].dist.load(Ordering::Relaxed) <= INF),
        "distance above the unreached marker"
    );
}
