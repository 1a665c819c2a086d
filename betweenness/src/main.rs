use lamellar::active_messaging::prelude::*;
use lamellar::darc::prelude::*;

use clap::Parser;

use std::collections::HashMap;
use std::error::Error;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;
use std::time::Instant;

use betweenness::graph::BcGraph;
use betweenness::options::BcCli;
use betweenness::phases::bc::{sanity, BcSummary};
use betweenness::phases::{init, run_source, PhaseTimes};
use betweenness::sources::select_sources;
use betweenness::sync::{BcState, WorkAccum};

fn main() {
    let code = match run() {
        Ok(()) => 0,
        Err(e) => {
            eprintln!("error: {e}");
            1
        }
    };
    std::process::exit(code);
}

fn run() -> Result<(), Box<dyn Error>> {
    let world = lamellar::LamellarWorldBuilder::new().build();
    let my_pe = world.my_pe();
    let num_pes = world.num_pes();
    let cli = BcCli::parse();

    if my_pe == 0 {
        cli.describe();
    }

    let start_time_loading = Instant::now();
    let graph = BcGraph::from_file(&cli.graph_file, my_pe, num_pes)?;
    world.barrier();
    let time_to_load = start_time_loading.elapsed();

    let num_nodes = graph.num_global_vertices();
    if num_nodes == 0 {
        return Err("graph has no vertices".into());
    }
    if cli.src_node_id >= num_nodes as u64 {
        return Err(format!(
            "start source {} out of range for {} vertices",
            cli.src_node_id, num_nodes
        )
        .into());
    }
    if cli.num_of_sources > num_nodes {
        return Err(format!(
            "cannot sample {} sources from {} vertices",
            cli.num_of_sources, num_nodes
        )
        .into());
    }

    let sources = select_sources(
        num_nodes,
        cli.single_source,
        cli.src_node_id,
        cli.num_of_sources,
    );
    if my_pe == 0 && !cli.single_source && cli.num_of_sources != 0 {
        for (i, src) in sources.iter().enumerate() {
            println!("source #{i}: {src}");
        }
    }

    // replicated on every pe through the world team
    let state = Darc::new(world.team(), BcState::new(num_nodes)).unwrap();
    let accum = WorkAccum::new(&world);
    let summary = LocalRwDarc::new(world.team(), BcSummary::new()).unwrap();

    init::init_graph(&state);
    world.barrier();

    let mut times = PhaseTimes::default();
    let mut last_digest = BcSummary::new();
    let start_time_total = Instant::now();

    for run in 0..cli.num_runs {
        println!("[{my_pe}] bc run {run} called");
        let start_time_run = Instant::now();

        for (i, &src) in sources.iter().enumerate() {
            if my_pe == 0 && i % 5000 == 0 {
                println!("source {} of {}", i, sources.len());
            }
            run_source(
                &world,
                &graph,
                &state,
                &accum,
                src,
                cli.max_iterations,
                &mut times,
            );
        }

        if my_pe == 0 {
            println!("run {run} time: {:?}", start_time_run.elapsed());
        }

        last_digest = sanity(&world, &graph, &state, &summary);

        // re-init for the next run
        if run + 1 != cli.num_runs {
            state.clear_all_bitsets();
            world.barrier();
            init::init_graph(&state);
            world.barrier();
        }
    }

    let time_total = start_time_total.elapsed();

    if my_pe == 0 {
        println!();
        println!("Finished successfully");
        println!();
        println!("Number of PE's:                     {:?}", num_pes);
        println!("Vertices:                           {:?}", num_nodes);
        println!("Sources:                            {:?}", sources.len());
        println!();
        println!("Time to load graph:                 {:?}", time_to_load);
        times.describe();
        println!("Total time:                         {:?}", time_total);
        println!();
    }

    if let Some(stats_file) = &cli.stats_file {
        if my_pe == 0 {
            let mut output = HashMap::new();
            output.insert("num_pes".to_string(), num_pes.to_string());
            output.insert("vertices".to_string(), num_nodes.to_string());
            output.insert("sources".to_string(), sources.len().to_string());
            output.insert("bc_max".to_string(), last_digest.max().to_string());
            output.insert("bc_min".to_string(), last_digest.min().to_string());
            output.insert("bc_sum".to_string(), last_digest.sum().to_string());
            output.insert(
                "total_seconds".to_string(),
                time_total.as_secs_f64().to_string(),
            );
            util::RunRecord::new()
                .with_output(output)
                .append_to(Path::new(stats_file))?;
        }
    }

    if cli.verify {
        dump_scores(&graph, &state, &cli.output_prefix)?;
    }

    world.barrier();
    Ok(())
}

/// One line per owned vertex, `<global id> <score>`, into a per-PE file.
fn dump_scores(graph: &BcGraph, state: &BcState, prefix: &str) -> Result<(), Box<dyn Error>> {
    let path = format!("{}_{}.out", prefix, graph.my_pe());
    let mut file = BufWriter::new(File::create(&path)?);
    for v in graph.local_range() {
        writeln!(file, "{} {:.9}", v, state.vertices[v].bc.load())?;
    }
    Ok(())
}
