use std::error::Error;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

#[derive(Debug, serde::Deserialize, Eq, PartialEq)]
struct Edge {
    e0: u32,
    e1: u32,
}

/// Block-partitioned CSR over the transposed input edge list.
///
/// PE p owns the contiguous row range `[p * rows_per_pe, (p+1) * rows_per_pe)`
/// and stores the stored-out-edges of those rows only. Input edge `(u, v)` is
/// stored as row `v` containing `u`, so a stored edge `(s, t)` with
/// `dist(t) + 1 == dist(s)` names `t` as a shortest-path predecessor of `s` —
/// the orientation the pull-style distance relaxation needs.
#[derive(Debug)]
pub struct BcGraph {
    offsets: Vec<u64>,
    edges: Vec<u32>,
    num_global: usize,
    rows_per_pe: usize,
    row_first: usize,
    row_last: usize,
    my_pe: usize,
    num_pes: usize,
}

impl BcGraph {
    pub fn from_file(fpath: &str, my_pe: usize, num_pes: usize) -> Result<Self, Box<dyn Error>> {
        let path = Path::new(fpath);
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or_default();
        let (num_nodes, edge_list) = match ext {
            "el" | "tsv" => {
                // tab separated first, falling back to space separated
                match Self::parse_edge_list(fpath, b'\t') {
                    Ok(parsed) => parsed,
                    Err(_) => Self::parse_edge_list(fpath, b' ')?,
                }
            }
            "mm" | "mtx" => Self::parse_matrix_market(fpath)?,
            other => return Err(format!("unhandled graph format: .{other}").into()),
        };
        if my_pe == 0 {
            println!("{} nodes, {} edges loaded", num_nodes, edge_list.len());
        }
        Ok(Self::from_edges(num_nodes, &edge_list, my_pe, num_pes))
    }

    /// Zero-based whitespace separated `src dst` pairs, one per line.
    fn parse_edge_list(fpath: &str, delim: u8) -> Result<(usize, Vec<(u32, u32)>), Box<dyn Error>> {
        let mut rdr = csv::ReaderBuilder::new()
            .has_headers(false)
            .delimiter(delim)
            .from_path(Path::new(fpath))?;

        let mut edges = Vec::new();
        let mut num_nodes: usize = 0;
        for result in rdr.deserialize() {
            let edge: Edge = result?;
            num_nodes = num_nodes
                .max(edge.e0 as usize + 1)
                .max(edge.e1 as usize + 1);
            edges.push((edge.e0, edge.e1));
        }
        Ok((num_nodes, edges))
    }

    /// One-based MatrixMarket coordinate format, kept directed.
    fn parse_matrix_market(fpath: &str) -> Result<(usize, Vec<(u32, u32)>), Box<dyn Error>> {
        let file = File::open(Path::new(fpath))?;
        let rdr = BufReader::new(file);
        let mut lines = rdr
            .lines()
            .map(|l| l.unwrap())
            .skip_while(|l| l.starts_with("%"));
        let header = lines.next().ok_or("empty matrix market file")?;
        let vals = header.split_whitespace().collect::<Vec<_>>();
        assert_eq!(vals[0], vals[1]);
        let num_nodes: usize = vals[0].parse()?;

        let mut edges = Vec::new();
        for line in lines {
            let vals = line.split_whitespace().collect::<Vec<_>>();
            if vals.len() < 2 {
                continue;
            }
            let e0: u32 = vals[0].parse::<u32>()? - 1;
            let e1: u32 = vals[1].parse::<u32>()? - 1;
            edges.push((e0, e1));
        }
        Ok((num_nodes, edges))
    }

    /// Build this PE's partition from an in-memory edge list. Edges are in the
    /// input orientation; the transpose happens here.
    pub fn from_edges(
        num_nodes: usize,
        edge_list: &[(u32, u32)],
        my_pe: usize,
        num_pes: usize,
    ) -> Self {
        let rows_per_pe = (num_nodes + num_pes - 1) / num_pes.max(1);
        let row_first = (rows_per_pe * my_pe).min(num_nodes);
        let row_last = (row_first + rows_per_pe).min(num_nodes);

        let mut degrees = vec![0u64; row_last - row_first];
        for &(_, v) in edge_list {
            let row = v as usize;
            if row >= row_first && row < row_last {
                degrees[row - row_first] += 1;
            }
        }

        let mut offsets = vec![0u64; degrees.len() + 1];
        for (i, d) in degrees.iter().enumerate() {
            offsets[i + 1] = offsets[i] + d;
        }

        let mut edges = vec![0u32; offsets[degrees.len()] as usize];
        let mut cursor = offsets.clone();
        for &(u, v) in edge_list {
            let row = v as usize;
            if row >= row_first && row < row_last {
                edges[cursor[row - row_first] as usize] = u;
                cursor[row - row_first] += 1;
            }
        }

        BcGraph {
            offsets,
            edges,
            num_global: num_nodes,
            rows_per_pe,
            row_first,
            row_last,
            my_pe,
            num_pes,
        }
    }

    pub fn num_global_vertices(&self) -> usize {
        self.num_global
    }

    pub fn num_local_vertices(&self) -> usize {
        self.row_last - self.row_first
    }

    pub fn local_range(&self) -> std::ops::Range<usize> {
        self.row_first..self.row_last
    }

    /// Owned vertices with at least one stored out-edge, the only ones a
    /// propagation operator needs to visit.
    pub fn local_range_with_edges(&self) -> Vec<u32> {
        self.local_range()
            .filter(|&v| self.degree(v) > 0)
            .map(|v| v as u32)
            .collect()
    }

    pub fn degree(&self, v: usize) -> usize {
        debug_assert!(self.is_owned(v));
        let i = v - self.row_first;
        (self.offsets[i + 1] - self.offsets[i]) as usize
    }

    pub fn out_edges(&self, v: usize) -> &[u32] {
        debug_assert!(self.is_owned(v));
        let i = v - self.row_first;
        &self.edges[self.offsets[i] as usize..self.offsets[i + 1] as usize]
    }

    pub fn is_owned(&self, v: usize) -> bool {
        v >= self.row_first && v < self.row_last
    }

    pub fn owner_of(&self, v: usize) -> usize {
        debug_assert!(v < self.num_global);
        v / self.rows_per_pe
    }

    pub fn my_pe(&self) -> usize {
        self.my_pe
    }

    pub fn num_pes(&self) -> usize {
        self.num_pes
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transposed_single_pe() {
        // input 0->1, 0->2, 1->3, 2->3
        let edges = [(0, 1), (0, 2), (1, 3), (2, 3)];
        let g = BcGraph::from_edges(4, &edges, 0, 1);

        assert_eq!(g.num_global_vertices(), 4);
        assert_eq!(g.num_local_vertices(), 4);
        assert_eq!(g.out_edges(0), &[] as &[u32]);
        assert_eq!(g.out_edges(1), &[0]);
        assert_eq!(g.out_edges(2), &[0]);
        assert_eq!(g.out_edges(3), &[1, 2]);
        assert_eq!(g.local_range_with_edges(), vec![1, 2, 3]);
    }

    #[test]
    fn block_partition() {
        let edges = [(0, 1), (1, 2), (2, 3), (3, 4)];
        let g0 = BcGraph::from_edges(5, &edges, 0, 2);
        let g1 = BcGraph::from_edges(5, &edges, 1, 2);

        assert_eq!(g0.local_range(), 0..3);
        assert_eq!(g1.local_range(), 3..5);
        assert!(g0.is_owned(2) && !g0.is_owned(3));
        assert_eq!(g0.owner_of(2), 0);
        assert_eq!(g0.owner_of(3), 1);
        assert_eq!(g1.out_edges(3), &[2]);
        assert_eq!(g1.out_edges(4), &[3]);
        // rows 1 and 2 live on pe 0
        assert_eq!(g0.out_edges(1), &[0]);
        assert_eq!(g0.out_edges(2), &[1]);
    }

    #[test]
    fn uneven_tail_partition() {
        let g2 = BcGraph::from_edges(5, &[(0, 1)], 2, 3);
        // ceil(5/3) = 2 rows per pe; the last pe owns the single tail row
        assert_eq!(g2.local_range(), 4..5);
        assert_eq!(g2.num_local_vertices(), 1);
    }
}
