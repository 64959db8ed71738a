//!
//! Viterbi decoding
//!
//! Log-domain DP over the flat state space with back-pointer
//! traceback. One column per consumed symbol; a silent state relaxes
//! into its own column, an emitting state into the next one.
//!
//! The column sweep walks the three bands in flat order. The repeat
//! band is swept twice per column: its silent delete chains span a
//! whole repeat copy, and the second ordered pass lets a value cross
//! the copy within one column. The flanking bands have shallower
//! chains and get a single pass.
//!
use crate::common::ni;
use crate::error::{HmmError, Result};
use crate::model::{BakedState, Model};
use crate::params::DecodeParams;
use crate::path::{Path, PathStep};
use crate::prob::Prob;
use ndarray::Array2;
use petgraph::graph::DiGraph;
use petgraph::visit::EdgeRef;

/// A candidate must beat the stored value by more than this to
/// overwrite it (ties keep the earlier back-pointer).
const IMPROVEMENT_TOLERANCE: f64 = 1e-10;

///
/// DP tables of one decode: best log-probability per `(state, column)`
/// cell plus the predecessor cell that produced it.
///
struct ViterbiTables {
    delta: Array2<f64>,
    bp_row: Array2<i32>,
    bp_col: Array2<i32>,
}

impl ViterbiTables {
    fn new(n_rows: usize, n_columns: usize) -> ViterbiTables {
        ViterbiTables {
            delta: Array2::from_elem((n_rows, n_columns), f64::NEG_INFINITY),
            bp_row: Array2::from_elem((n_rows, n_columns), -1),
            bp_col: Array2::from_elem((n_rows, n_columns), -1),
        }
    }
    fn update(&mut self, row: usize, col: usize, cand: f64, from_row: usize, from_col: usize) {
        // NaN (both -inf) compares false and is skipped with the rest
        if cand - self.delta[[row, col]] > IMPROVEMENT_TOLERANCE {
            self.delta[[row, col]] = cand;
            self.bp_row[[row, col]] = from_row as i32;
            self.bp_col[[row, col]] = from_col as i32;
        }
    }
}

///
/// Relax every outgoing edge of cell `(i, t)` over the whole graph.
///
fn relax(graph: &DiGraph<BakedState, Prob>, tables: &mut ViterbiTables, i: usize, t: usize, seq: &[u8]) {
    let v = tables.delta[[i, t]];
    if v == f64::NEG_INFINITY {
        return;
    }
    let node = &graph[ni(i)];
    if node.is_silent() {
        for edge in graph.edges(ni(i)) {
            let j = edge.target().index();
            tables.update(j, t, v + edge.weight().to_log_value(), i, t);
        }
    } else if t < seq.len() {
        let emit = node.emission_prob(seq[t]).to_log_value();
        for edge in graph.edges(ni(i)) {
            let j = edge.target().index();
            tables.update(j, t + 1, v + edge.weight().to_log_value() + emit, i, t);
        }
    }
}

impl Model {
    ///
    /// Best path through the whole model and its log-probability.
    ///
    pub fn viterbi(&self, seq: &[u8]) -> Result<(f64, Path)> {
        self.viterbi_with(seq, &DecodeParams::default())
    }
    ///
    /// `viterbi` with an explicit repeat-band pass count.
    ///
    pub fn viterbi_with(&self, seq: &[u8], params: &DecodeParams) -> Result<(f64, Path)> {
        let baked = self.baked()?;
        if seq.is_empty() {
            return Err(HmmError::EmptySequence);
        }
        let graph = &baked.graph;
        let n = graph.node_count();
        let t_len = seq.len();

        let mut tables = ViterbiTables::new(n, t_len + 1);
        tables.delta[[0, 0]] = 0.0;

        for t in 0..t_len {
            for (band, &(lo, hi)) in baked.bands.iter().enumerate() {
                let passes = if band == 1 {
                    params.n_repeat_band_passes
                } else {
                    1
                };
                for _ in 0..passes {
                    for i in lo..=hi {
                        relax(graph, &mut tables, i, t, seq);
                    }
                }
            }
        }

        // closing step: the terminal boundary state may slip into end
        // without consuming input
        if n >= 2 {
            let i = n - 2;
            let v = tables.delta[[i, t_len]];
            if graph[ni(i)].is_silent() && v != f64::NEG_INFINITY {
                for edge in graph.edges(ni(i)) {
                    let j = edge.target().index();
                    if j == n - 1 {
                        tables.update(j, t_len, v + edge.weight().to_log_value(), i, t_len);
                    }
                }
            }
        }

        let logp = tables.delta[[n - 1, t_len]];
        if logp == f64::NEG_INFINITY {
            return Ok((f64::NEG_INFINITY, Path::default()));
        }

        let mut steps = Vec::with_capacity(baked.read_length.unwrap_or(t_len) + 8);
        let (mut i, mut t) = (n - 1, t_len);
        loop {
            let node = &graph[ni(i)];
            steps.push(PathStep {
                state: i,
                name: node.name().to_string(),
                silent: node.is_silent(),
            });
            if i == 0 && t == 0 {
                break;
            }
            let pi = tables.bp_row[[i, t]];
            let pt = tables.bp_col[[i, t]];
            debug_assert!(pi >= 0, "broken back-pointer chain at ({}, {})", i, t);
            if pi < 0 {
                break;
            }
            i = pi as usize;
            t = pt as usize;
        }
        steps.reverse();
        Ok((logp, Path::from_steps(steps)))
    }
    ///
    /// Best path confined to the band of one repeat copy, entered at
    /// `unit_start_<unit_id>` and left at `unit_end_<unit_id>`.
    ///
    /// The log-probability slot of the result is a placeholder `0.0`;
    /// only the path is meaningful for this variant.
    ///
    pub fn subseq_viterbi(&self, seq: &[u8], unit_id: &str) -> Result<(f64, Path)> {
        let baked = self.baked()?;
        if seq.is_empty() {
            return Err(HmmError::EmptySequence);
        }
        let unknown = || HmmError::UnknownUnit {
            unit_id: unit_id.to_string(),
        };
        if baked.bands.len() < 2 {
            return Err(unknown());
        }
        let (lo, hi) = baked.bands[1];
        let in_band = |&i: &usize| i >= lo && i <= hi;
        let a = baked
            .index_of
            .get(&format!("unit_start_{}", unit_id))
            .copied()
            .filter(in_band)
            .ok_or_else(unknown)?;
        let b = baked
            .index_of
            .get(&format!("unit_end_{}", unit_id))
            .copied()
            .filter(in_band)
            .ok_or_else(unknown)?;
        // a name-sorted bake can place the unit end before the unit
        // start; no band-confined decode exists then
        if b < a {
            return Err(unknown());
        }

        let graph = &baked.graph;
        let t_len = seq.len();
        let k = b - a + 1;
        let mut tables = ViterbiTables::new(k, t_len + 1);
        tables.delta[[0, 0]] = 0.0;

        // single ordered pass per column; the band never needs more
        // (one copy, its silent chain points forward after baking)
        for t in 0..=t_len {
            for r in 0..k - 1 {
                let v = tables.delta[[r, t]];
                if v == f64::NEG_INFINITY {
                    continue;
                }
                let node = &graph[ni(a + r)];
                if node.is_silent() {
                    for edge in graph.edges(ni(a + r)) {
                        let j = edge.target().index();
                        if j < a || j > b {
                            continue;
                        }
                        tables.update(j - a, t, v + edge.weight().to_log_value(), r, t);
                    }
                } else if t < t_len {
                    let emit = node.emission_prob(seq[t]).to_log_value();
                    for edge in graph.edges(ni(a + r)) {
                        let j = edge.target().index();
                        if j < a || j > b {
                            continue;
                        }
                        tables.update(j - a, t + 1, v + edge.weight().to_log_value() + emit, r, t);
                    }
                }
            }
        }

        if tables.delta[[k - 1, t_len]] == f64::NEG_INFINITY {
            return Ok((0.0, Path::default()));
        }
        let mut steps = Vec::new();
        let (mut r, mut t) = (k - 1, t_len);
        loop {
            let node = &graph[ni(a + r)];
            steps.push(PathStep {
                state: a + r,
                name: node.name().to_string(),
                silent: node.is_silent(),
            });
            if r == 0 && t == 0 {
                break;
            }
            let pr = tables.bp_row[[r, t]];
            let pt = tables.bp_col[[r, t]];
            debug_assert!(pr >= 0, "broken back-pointer chain at ({}, {})", r, t);
            if pr < 0 {
                break;
            }
            r = pr as usize;
            t = pt as usize;
        }
        steps.reverse();
        Ok((0.0, Path::from_steps(steps)))
    }
}
