use lamellar::active_messaging::prelude::*;
use lamellar::darc::prelude::*;

use rayon::prelude::*;

use std::sync::atomic::Ordering;

use crate::graph::BcGraph;
use crate::sync::{sync, BcState, Field, Reduce};
use crate::vertex::INF;

/// Count the shortest-path DAG degrees in a single superstep: for every stored
/// edge `(s, t)` with `dist(t) + 1 == dist(s)`, `t` is a predecessor of `s`,
/// so `npred(s)` and `nsucc(t)` each gain one. `nsucc` lands on replicas of
/// remote vertices and is add-reduced to the owner afterwards.
pub fn run(world: &LamellarWorld, graph: &BcGraph, state: &Darc<BcState>) {
    let active = graph.local_range_with_edges();

    active.par_iter().for_each(|&s| {
        let s = s as usize;
        let vs = &state.vertices[s];
        let dist_s = vs.dist.load(Ordering::Relaxed);
        if dist_s == INF {
            return;
        }
        for &t in graph.out_edges(s) {
            let t = t as usize;
            let td = &state.vertices[t];
            if td.dist.load(Ordering::Relaxed) + 1 == dist_s {
                vs.npred.fetch_add(1, Ordering::Relaxed);
                state.mark(Field::Npred, s);
                td.nsucc.fetch_add(1, Ordering::Relaxed);
                state.mark(Field::Nsucc, t);
            }
        }
    });

    sync(world, graph, state, Field::Npred, Reduce::Add);
    sync(world, graph, state, Field::Nsucc, Reduce::Add);
}
