//!
//! Forward algorithm
//!
//! Linear-domain sums over a two-column rolling buffer; the log is
//! taken once at termination. Underflow on long sequences is accepted
//! and reads back as -inf, it is not an error. Silent states never
//! accumulate mass here (their emission row is all zero), so only
//! chains of emitting states contribute.
//!
use crate::common::ni;
use crate::error::{HmmError, Result};
use crate::model::Model;
use petgraph::visit::EdgeRef;

impl Model {
    ///
    /// `log P(seq | model)`.
    ///
    /// ```text
    /// a_0[k] = t(start, k) * e_k(x[0])
    /// a_t[k] = (sum_l a_t-1[l] * t(l, k)) * e_k(x[t])
    /// result = log( sum_k a_T-1[k] * t(k, end) )
    /// ```
    ///
    /// `k` ranges over the non-sentinel states; the sum over `l` is
    /// realized by pushing each `a_t-1[l]` through its outgoing edges.
    ///
    pub fn log_probability(&self, seq: &[u8]) -> Result<f64> {
        let baked = self.baked()?;
        if seq.is_empty() {
            return Err(HmmError::EmptySequence);
        }
        let graph = &baked.graph;
        let n = graph.node_count();
        let end = n - 1;

        let mut prev = vec![0.0f64; n];
        let mut cur = vec![0.0f64; n];

        // t = 0: one hop out of the start sentinel
        for edge in graph.edges(ni(0)) {
            let j = edge.target().index();
            let node = &graph[edge.target()];
            if j == end || node.is_silent() {
                continue;
            }
            cur[j] = edge.weight().to_value() * node.emission_prob(seq[0]).to_value();
        }

        for &symbol in &seq[1..] {
            std::mem::swap(&mut prev, &mut cur);
            cur.iter_mut().for_each(|a| *a = 0.0);
            for i in 1..end {
                if prev[i] == 0.0 {
                    continue;
                }
                for edge in graph.edges(ni(i)) {
                    let j = edge.target().index();
                    let node = &graph[edge.target()];
                    if j == end || node.is_silent() {
                        continue;
                    }
                    cur[j] += prev[i] * edge.weight().to_value() * node.emission_prob(symbol).to_value();
                }
            }
        }

        let mut total = 0.0f64;
        for i in 1..end {
            if cur[i] == 0.0 {
                continue;
            }
            if let Some(edge) = graph.find_edge(ni(i), ni(end)) {
                total += cur[i] * graph[edge].to_value();
            }
        }
        if total == 0.0 {
            Ok(f64::NEG_INFINITY)
        } else {
            Ok(total.ln())
        }
    }
}
