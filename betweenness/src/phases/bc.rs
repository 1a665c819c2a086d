use lamellar::active_messaging::prelude::*;
use lamellar::darc::prelude::*;

use rayon::prelude::*;

use std::sync::atomic::Ordering;

use crate::graph::BcGraph;
use crate::sync::BcState;

/// Fold the finalized dependencies into the persistent scores and drain the
/// dependency field for the next source. Runs over the full mirror so every
/// PE's copy of the scores stays consistent.
pub fn accumulate(state: &BcState) {
    (0..state.num_vertices()).into_par_iter().for_each(|v| {
        let vs = &state.vertices[v];
        let delta = vs.delta.load();
        if delta > 0.0 {
            vs.bc.fetch_add(delta);
            vs.delta.store(0.0);
        }
    });
}

/// Global score digest pooled onto PE 0.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct BcSummary {
    max: f32,
    min: f32,
    sum: f64,
}

impl BcSummary {
    pub fn new() -> Self {
        BcSummary {
            max: 0.0,
            min: f32::MAX / 4.0,
            sum: 0.0,
        }
    }

    pub fn reset(&mut self) {
        *self = BcSummary::new();
    }

    pub fn fold(&mut self, max: f32, min: f32, sum: f64) {
        self.max = self.max.max(max);
        self.min = self.min.min(min);
        self.sum += sum;
    }

    pub fn max(&self) -> f32 {
        self.max
    }

    pub fn min(&self) -> f32 {
        self.min
    }

    pub fn sum(&self) -> f64 {
        self.sum
    }

    pub fn snapshot(&self) -> BcSummary {
        self.clone()
    }
}

#[lamellar::AmData(Clone, Debug)]
struct SummaryAm {
    summary: LocalRwDarc<BcSummary>,
    max: f32,
    min: f32,
    sum: f64,
}

#[lamellar::am]
impl LamellarAM for SummaryAm {
    async fn exec(self) {
        let mut summary = self.summary.write().await;
        summary.fold(self.max, self.min, self.sum);
    }
}

/// Reduce max/min/sum of the owned scores onto PE 0 and print them there.
/// Collective; the returned digest is only meaningful on PE 0.
pub fn sanity(
    world: &LamellarWorld,
    graph: &BcGraph,
    state: &BcState,
    summary: &LocalRwDarc<BcSummary>,
) -> BcSummary {
    world.block_on(summary.write()).reset();
    world.barrier();

    let mut local_max = 0f32;
    let mut local_min = f32::MAX / 4.0;
    let mut local_sum = 0f64;
    for v in graph.local_range() {
        let bc = state.vertices[v].bc.load();
        local_max = local_max.max(bc);
        local_min = local_min.min(bc);
        local_sum += bc as f64;
    }

    let _ = world.exec_am_pe(
        0,
        SummaryAm {
            summary: summary.clone(),
            max: local_max,
            min: local_min,
            sum: local_sum,
        },
    );
    world.wait_all();
    world.barrier();

    let digest = world.block_on(summary.read()).snapshot();
    if graph.my_pe() == 0 {
        println!("Max BC is {}", digest.max());
        println!("Min BC is {}", digest.min());
        println!("BC sum is {}", digest.sum());
    }
    digest
}
