use clap::Parser;

#[derive(Parser)]
#[command(author, version, about = "Betweenness centrality over bulk-synchronous supersteps", long_about = None)]
pub struct BcCli {
    /// Input graph: .el/.tsv zero-based edge list or .mtx/.mm MatrixMarket
    #[arg(short, long)]
    pub graph_file: String,

    /// Maximum supersteps per phase before aborting
    #[arg(long = "maxIterations", default_value_t = 10000)]
    pub max_iterations: u32,

    /// Compute from a single source only
    #[arg(long = "singleSource", default_value_t = false)]
    pub single_source: bool,

    /// Starting source vertex
    #[arg(long = "srcNodeId", default_value_t = 0)]
    pub src_node_id: u64,

    /// Number of sources to sample; 0 uses every vertex
    #[arg(long = "numOfSources", default_value_t = 0)]
    pub num_of_sources: usize,

    /// Dump per-vertex scores to one file per PE
    #[arg(long, default_value_t = false)]
    pub verify: bool,

    /// Prefix for the per-PE score dump
    #[arg(long, default_value = "bc_scores")]
    pub output_prefix: String,

    /// Number of benchmark repetitions
    #[arg(short, long, default_value_t = 1)]
    pub num_runs: usize,

    /// Append a JSON run record to this file
    #[arg(long)]
    pub stats_file: Option<String>,
}

impl BcCli {
    pub fn describe(&self) {
        println!("graph file: {}", self.graph_file);
        println!("max iterations: {}", self.max_iterations);
        println!("single source: {}", self.single_source);
        println!("start source: {}", self.src_node_id);
        println!("num of sources: {}", self.num_of_sources);
        println!("num runs: {}", self.num_runs);
        println!("verify: {}", self.verify);
    }
}
