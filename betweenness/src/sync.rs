use lamellar::active_messaging::prelude::*;
use lamellar::array::prelude::*;
use lamellar::darc::prelude::*;

use std::sync::atomic::Ordering;

use crate::bitset::AtomicBitSet;
use crate::graph::BcGraph;
use crate::vertex::{VertexState, INF};

/// Per-vertex fields that get reconciled across PEs. Canonical fields that are
/// only ever changed by applying an already-reconciled delta (`sigma`, `delta`,
/// `bc`, the tokens) never appear here.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum Field {
    Dist,
    Npred,
    Nsucc,
    Trim,
    ToAdd,
    Trim2,
    ToAddF,
}

const NUM_FIELDS: usize = 7;

impl Field {
    fn index(self) -> usize {
        match self {
            Field::Dist => 0,
            Field::Npred => 1,
            Field::Nsucc => 2,
            Field::Trim => 3,
            Field::ToAdd => 4,
            Field::Trim2 => 5,
            Field::ToAddF => 6,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum Reduce {
    Min,
    Add,
}

/// Engine state replicated on every PE: the full vertex mirror plus one dirty
/// bitset per reconcilable field. Shared with the sync active messages through
/// a `Darc`.
#[derive(Debug)]
pub struct BcState {
    pub vertices: Vec<VertexState>,
    bitsets: Vec<AtomicBitSet>,
}

impl BcState {
    pub fn new(num_vertices: usize) -> Self {
        BcState {
            vertices: (0..num_vertices).map(|_| VertexState::new()).collect(),
            bitsets: (0..NUM_FIELDS)
                .map(|_| AtomicBitSet::new(num_vertices))
                .collect(),
        }
    }

    pub fn num_vertices(&self) -> usize {
        self.vertices.len()
    }

    pub fn mark(&self, field: Field, v: usize) {
        self.bitsets[field.index()].set(v);
    }

    pub fn bits(&self, field: Field) -> &AtomicBitSet {
        &self.bitsets[field.index()]
    }

    pub fn clear_all_bitsets(&self) {
        for bits in &self.bitsets {
            bits.clear();
        }
    }

    fn load_raw(&self, field: Field, v: usize) -> u32 {
        let vs = &self.vertices[v];
        match field {
            Field::Dist => vs.dist.load(Ordering::Relaxed),
            Field::Npred => vs.npred.load(Ordering::Relaxed),
            Field::Nsucc => vs.nsucc.load(Ordering::Relaxed),
            Field::Trim => vs.trim.load(Ordering::Relaxed),
            Field::ToAdd => vs.to_add.load(Ordering::Relaxed),
            Field::Trim2 => vs.trim2.load(Ordering::Relaxed),
            Field::ToAddF => vs.to_add_f.load_raw(),
        }
    }

    fn store_raw(&self, field: Field, v: usize, raw: u32) {
        let vs = &self.vertices[v];
        match field {
            Field::Dist => vs.dist.store(raw, Ordering::Relaxed),
            Field::Npred => vs.npred.store(raw, Ordering::Relaxed),
            Field::Nsucc => vs.nsucc.store(raw, Ordering::Relaxed),
            Field::Trim => vs.trim.store(raw, Ordering::Relaxed),
            Field::ToAdd => vs.to_add.store(raw, Ordering::Relaxed),
            Field::Trim2 => vs.trim2.store(raw, Ordering::Relaxed),
            Field::ToAddF => vs.to_add_f.store_raw(raw),
        }
    }

    /// Ship a replica's contribution: read the slot and reset it to the
    /// reduction identity.
    fn take_raw(&self, field: Field, v: usize) -> u32 {
        let vs = &self.vertices[v];
        match field {
            Field::Dist => vs.dist.swap(INF, Ordering::Relaxed),
            Field::Npred => vs.npred.swap(0, Ordering::Relaxed),
            Field::Nsucc => vs.nsucc.swap(0, Ordering::Relaxed),
            Field::Trim => vs.trim.swap(0, Ordering::Relaxed),
            Field::ToAdd => vs.to_add.swap(0, Ordering::Relaxed),
            Field::Trim2 => vs.trim2.swap(0, Ordering::Relaxed),
            Field::ToAddF => vs.to_add_f.take_raw(),
        }
    }

    /// Fold a shipped replica contribution into the owner's slot.
    fn reduce_raw(&self, field: Field, op: Reduce, v: usize, raw: u32) {
        let vs = &self.vertices[v];
        match (field, op) {
            (Field::ToAddF, Reduce::Add) => vs.to_add_f.fetch_add(f32::from_bits(raw)),
            (Field::Dist, Reduce::Min) => {
                vs.dist.fetch_min(raw, Ordering::Relaxed);
            }
            (Field::Npred, Reduce::Add) => {
                vs.npred.fetch_add(raw, Ordering::Relaxed);
            }
            (Field::Nsucc, Reduce::Add) => {
                vs.nsucc.fetch_add(raw, Ordering::Relaxed);
            }
            (Field::Trim, Reduce::Add) => {
                vs.trim.fetch_add(raw, Ordering::Relaxed);
            }
            (Field::ToAdd, Reduce::Add) => {
                vs.to_add.fetch_add(raw, Ordering::Relaxed);
            }
            (Field::Trim2, Reduce::Add) => {
                vs.trim2.fetch_add(raw, Ordering::Relaxed);
            }
            (field, op) => panic!("unsupported reduction {op:?} for {field:?}"),
        }
    }
}

const SYNC_BUF_SIZE: usize = 32768;

/// Merges replica contributions into the owning PE's slot under the requested
/// reduction and marks the slot dirty so the broadcast step picks it up.
#[lamellar::AmData(Clone, Debug)]
struct ReduceAm {
    state: Darc<BcState>,
    field: Field,
    op: Reduce,
    updates: Vec<(u32, u32)>,
}

#[lamellar::am]
impl LamellarAM for ReduceAm {
    async fn exec(self) {
        for (v, raw) in &self.updates {
            self.state.reduce_raw(self.field, self.op, *v as usize, *raw);
            self.state.mark(self.field, *v as usize);
        }
    }
}

/// Stores the owner's merged value into every PE's mirror.
#[lamellar::AmData(Clone, Debug)]
struct BroadcastAm {
    state: Darc<BcState>,
    field: Field,
    updates: Vec<(u32, u32)>,
}

#[lamellar::am]
impl LamellarAM for BroadcastAm {
    async fn exec(self) {
        for (v, raw) in &self.updates {
            self.state.store_raw(self.field, *v as usize, *raw);
        }
    }
}

/// Reconcile one delta field across all replicas: replicas ship their dirty
/// contributions to the owner (reduce), the owner re-broadcasts the merged
/// value, and the dirty bitset is cleared. Collective; every PE must call it
/// at the same superstep boundary.
pub fn sync(
    world: &LamellarWorld,
    graph: &BcGraph,
    state: &Darc<BcState>,
    field: Field,
    op: Reduce,
) {
    let num_pes = graph.num_pes();

    // reduce: bucket this PE's non-owned dirty entries per owner
    let mut per_pe: Vec<Vec<(u32, u32)>> = vec![Vec::new(); num_pes];
    state.bits(field).for_each_set(|v| {
        if !graph.is_owned(v) {
            per_pe[graph.owner_of(v)].push((v as u32, state.take_raw(field, v)));
        }
    });

    let mut reqs = vec![];
    for (pe, updates) in per_pe.into_iter().enumerate() {
        for chunk in updates.chunks(SYNC_BUF_SIZE) {
            reqs.push(world.exec_am_pe(
                pe,
                ReduceAm {
                    state: state.clone(),
                    field,
                    op,
                    updates: chunk.to_vec(),
                },
            ));
        }
    }
    world.block_on(futures::future::join_all(reqs));
    world.barrier();

    // broadcast: owned dirty entries (including ones remote PEs contributed to)
    let mut merged = Vec::new();
    state.bits(field).for_each_set(|v| {
        if graph.is_owned(v) {
            merged.push((v as u32, state.load_raw(field, v)));
        }
    });

    let mut reqs = vec![];
    for chunk in merged.chunks(SYNC_BUF_SIZE) {
        reqs.push(world.exec_am_all(BroadcastAm {
            state: state.clone(),
            field,
            updates: chunk.to_vec(),
        }));
    }
    world.block_on(futures::future::join_all(reqs));
    world.barrier();

    state.bits(field).clear();
}

/// Superstep work counter: one slot per PE, summed at the end of a superstep
/// to decide global termination.
pub struct WorkAccum {
    counts: AtomicArray<usize>,
}

impl WorkAccum {
    pub fn new(world: &LamellarWorld) -> Self {
        WorkAccum {
            counts: AtomicArray::new(world.team(), world.num_pes(), Distribution::Block),
        }
    }

    pub fn reset(&self) {
        self.counts.local_data().at(0).store(0);
    }

    pub fn add(&self, work: usize) {
        if work > 0 {
            self.counts.local_data().at(0).fetch_add(work);
        }
    }

    /// Global sum. The trailing barrier keeps any PE from resetting its slot
    /// for the next superstep while a peer is still reading this one.
    pub fn reduce(&self, world: &LamellarWorld) -> usize {
        let total = world.block_on(self.counts.sum());
        world.barrier();
        total
    }
}
