use lamellar::active_messaging::prelude::*;
use lamellar::darc::prelude::*;

use std::time::{Duration, Instant};

use crate::graph::BcGraph;
use crate::sync::{BcState, WorkAccum};

pub mod bc;
pub mod bfs;
pub mod dependency;
pub mod init;
pub mod num_paths;
pub mod pred_succ;

/// Wall time spent in each phase, accumulated over all sources of a run.
#[derive(Debug, Default, Clone)]
pub struct PhaseTimes {
    pub reset: Duration,
    pub bfs: Duration,
    pub pred_succ: Duration,
    pub num_paths: Duration,
    pub dependency: Duration,
    pub accumulate: Duration,
}

impl PhaseTimes {
    pub fn describe(&self) {
        println!("Time in iteration reset:            {:?}", self.reset);
        println!("Time in bfs:                        {:?}", self.bfs);
        println!("Time in pred/succ counting:         {:?}", self.pred_succ);
        println!("Time in shortest-path counting:     {:?}", self.num_paths);
        println!("Time in dependency propagation:     {:?}", self.dependency);
        println!("Time in score accumulation:         {:?}", self.accumulate);
    }
}

/// One full per-source pipeline: reset, distances, DAG degrees, path counts,
/// dependencies, and the fold into the persistent scores. Collective; every
/// PE walks the same sources in the same order.
pub fn run_source(
    world: &LamellarWorld,
    graph: &BcGraph,
    state: &Darc<BcState>,
    accum: &WorkAccum,
    src: u64,
    max_iterations: u32,
    times: &mut PhaseTimes,
) {
    let timer = Instant::now();
    init::init_iteration(state, src);
    world.barrier();
    times.reset += timer.elapsed();

    let timer = Instant::now();
    bfs::run(world, graph, state, accum, max_iterations);
    times.bfs += timer.elapsed();

    let timer = Instant::now();
    pred_succ::run(world, graph, state);
    times.pred_succ += timer.elapsed();

    let timer = Instant::now();
    num_paths::run(world, graph, state, accum, max_iterations);
    times.num_paths += timer.elapsed();

    let timer = Instant::now();
    dependency::run(world, graph, state, accum, src, max_iterations);
    times.dependency += timer.elapsed();

    let timer = Instant::now();
    bc::accumulate(state);
    world.barrier();
    times.accumulate += timer.elapsed();
}
