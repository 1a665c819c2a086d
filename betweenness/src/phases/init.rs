use rayon::prelude::*;

use std::sync::atomic::Ordering;

use crate::sync::BcState;
use crate::vertex::{TokenState, INF};

/// Whole-graph reset, run once before the first source of a run. Unlike the
/// per-source reset this also zeroes the persistent scores.
pub fn init_graph(state: &BcState) {
    (0..state.num_vertices()).into_par_iter().for_each(|v| {
        let vs = &state.vertices[v];
        vs.bc.store(0.0);
        vs.dist.store(INF, Ordering::Relaxed);
        vs.sigma.store(0, Ordering::Relaxed);
        vs.npred.store(0, Ordering::Relaxed);
        vs.nsucc.store(0, Ordering::Relaxed);
        vs.delta.store(0.0);
        vs.trim.store(0, Ordering::Relaxed);
        vs.to_add.store(0, Ordering::Relaxed);
        vs.trim2.store(0, Ordering::Relaxed);
        vs.to_add_f.store(0.0);
        vs.sp_token.store(TokenState::Waiting);
        vs.dep_token.store(TokenState::Waiting);
    });
}

/// Per-source reset over the full mirror: mark the source, unreach everyone
/// else, rewind the phase tokens. `npred` must already be zero everywhere —
/// the previous source's path counting drained it — so a nonzero value here
/// is a bug in a phase, not in the input.
///
/// `nsucc` is zeroed without a matching assertion: the previous source vertex
/// legitimately keeps its successor count, since dependency propagation never
/// trims edges pointing at the source.
pub fn init_iteration(state: &BcState, src: u64) {
    (0..state.num_vertices()).into_par_iter().for_each(|v| {
        let vs = &state.vertices[v];

        assert_eq!(
            vs.npred.load(Ordering::Relaxed),
            0,
            "vertex {v} entered reset with unsettled predecessors"
        );

        vs.nsucc.store(0, Ordering::Relaxed);

        if v as u64 == src {
            vs.dist.store(0, Ordering::Relaxed);
            vs.sigma.store(1, Ordering::Relaxed);
            vs.sp_token.store(TokenState::Ready);
        } else {
            vs.dist.store(INF, Ordering::Relaxed);
            vs.sigma.store(0, Ordering::Relaxed);
            vs.sp_token.store(TokenState::Waiting);
        }
        vs.dep_token.store(TokenState::Waiting);
    });
}
