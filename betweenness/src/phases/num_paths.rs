use lamellar::active_messaging::prelude::*;
use lamellar::darc::prelude::*;

use rayon::prelude::*;

use std::sync::atomic::{AtomicUsize, Ordering};

use crate::graph::BcGraph;
use crate::sync::{sync, BcState, Field, Reduce, WorkAccum};
use crate::vertex::{TokenState, INF};

/// Propagate shortest-path counts down the DAG.
///
/// A vertex only consumes a predecessor whose token is `Ready`, i.e. whose
/// own count is final, so counts always grow through finalized values and no
/// per-edge ordering is needed. Consumptions are deferred through the
/// `trim`/`to_add` buffers, reconciled, and applied on every mirror
/// identically, which keeps `npred` and `sigma` consistent across PEs without
/// ever shipping them directly.
pub fn run(
    world: &LamellarWorld,
    graph: &BcGraph,
    state: &Darc<BcState>,
    accum: &WorkAccum,
    max_iterations: u32,
) {
    let active = graph.local_range_with_edges();
    let num_vertices = state.num_vertices();
    let mut iterations = 0;

    loop {
        accum.reset();
        world.barrier();

        // propagate: pull counts from finalized predecessors
        let work = AtomicUsize::new(0);
        active.par_iter().for_each(|&s| {
            let s = s as usize;
            let vs = &state.vertices[s];
            if vs.dist.load(Ordering::Relaxed) == INF || vs.npred.load(Ordering::Relaxed) == 0 {
                return;
            }
            let dist_s = vs.dist.load(Ordering::Relaxed);
            let mut consumed = 0;
            let mut gathered = 0;
            for &t in graph.out_edges(s) {
                let td = &state.vertices[t as usize];
                if td.sp_token.is_ready() && td.dist.load(Ordering::Relaxed) + 1 == dist_s {
                    consumed += 1;
                    gathered += td.sigma.load(Ordering::Relaxed);
                }
            }
            if consumed > 0 {
                vs.trim.fetch_add(consumed, Ordering::Relaxed);
                vs.to_add.fetch_add(gathered, Ordering::Relaxed);
                state.mark(Field::Trim, s);
                state.mark(Field::ToAdd, s);
                work.fetch_add(consumed as usize, Ordering::Relaxed);
            }
        });
        accum.add(work.into_inner());

        // settle consumed predecessors
        sync(world, graph, state, Field::Trim, Reduce::Add);
        (0..num_vertices).into_par_iter().for_each(|v| {
            let vs = &state.vertices[v];
            let trim = vs.trim.load(Ordering::Relaxed);
            if trim > 0 {
                vs.npred.fetch_sub(trim, Ordering::Relaxed);
                vs.trim.store(0, Ordering::Relaxed);
            }
        });

        // fold gathered counts into sigma
        sync(world, graph, state, Field::ToAdd, Reduce::Add);
        (0..num_vertices).into_par_iter().for_each(|v| {
            let vs = &state.vertices[v];
            let to_add = vs.to_add.load(Ordering::Relaxed);
            if to_add > 0 {
                vs.sigma.fetch_add(to_add, Ordering::Relaxed);
                vs.to_add.store(0, Ordering::Relaxed);
            }
        });

        // token handoff: finalized vertices may feed their successors for
        // exactly one round; leaves keep the token for dependency propagation
        (0..num_vertices).into_par_iter().for_each(|v| {
            let vs = &state.vertices[v];
            if vs.dist.load(Ordering::Relaxed) == INF {
                return;
            }
            match vs.sp_token.load() {
                TokenState::Ready => {
                    if vs.npred.load(Ordering::Relaxed) == 0
                        && vs.nsucc.load(Ordering::Relaxed) != 0
                    {
                        vs.sp_token.store(TokenState::Done);
                    }
                }
                TokenState::Waiting => {
                    if vs.npred.load(Ordering::Relaxed) == 0 {
                        vs.sp_token.store(TokenState::Ready);
                    }
                }
                TokenState::Done => {}
            }
        });

        iterations += 1;
        if accum.reduce(world) == 0 {
            break;
        }
        if iterations >= max_iterations {
            panic!("shortest-path counting did not settle within {iterations} supersteps");
        }
    }
}
