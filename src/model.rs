//!
//! Top-level model container and the bake step
//!
//! A `Model` is an ordered list of sub-models (conventionally
//! `[suffix, repeat, prefix]`) glued by one link edge per adjacent
//! pair. `bake` freezes the whole thing into a flat `DiGraph` whose
//! node order is the global state order; all decoders run on that
//! frozen graph and are rejected while it is absent.
//!
use crate::common::{ni, NodeIndex, StateId};
use crate::error::{HmmError, Result};
use crate::params::BakeConfig;
use crate::prob::Prob;
use crate::sort;
use crate::state::{EmissionTable, State};
use crate::submodel::SubModel;
use fnv::FnvHashMap as HashMap;
use log::{debug, warn};
use ndarray::Array2;
use petgraph::dot::Dot;
use petgraph::graph::DiGraph;

///
/// Node weight of the baked graph: everything a decoder needs from a
/// state, resolved once at bake time.
///
#[derive(Clone, Debug)]
pub struct BakedState {
    name: String,
    emission: Option<EmissionTable>,
    sub_model: usize,
}

impl BakedState {
    pub fn name(&self) -> &str {
        &self.name
    }
    pub fn is_silent(&self) -> bool {
        self.emission.is_none()
    }
    pub fn sub_model(&self) -> usize {
        self.sub_model
    }
    ///
    /// Probability of emitting `symbol` (p=0 for silent states).
    ///
    pub fn emission_prob(&self, symbol: u8) -> Prob {
        match &self.emission {
            Some(table) => table.prob(symbol),
            None => Prob::zero(),
        }
    }
}

impl std::fmt::Display for BakedState {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        if self.is_silent() {
            write!(f, "{} (silent)", self.name)
        } else {
            write!(f, "{}", self.name)
        }
    }
}

///
/// The frozen flat state space produced by `bake`.
///
/// Node insertion order is the flat state order, so
/// `NodeIndex::index()` *is* the global state index.
///
pub(crate) struct Baked {
    pub(crate) graph: DiGraph<BakedState, Prob>,
    /// inclusive global index range of each sub-model
    pub(crate) bands: Vec<(usize, usize)>,
    pub(crate) index_of: HashMap<String, usize>,
    pub(crate) read_length: Option<usize>,
}

///
/// A tandem-repeat matcher HMM.
///
pub struct Model {
    name: String,
    sub_models: Vec<SubModel>,
    /// link probability of `sub_models[k].end -> sub_models[k+1].start`
    links: Vec<Prob>,
    baked: Option<Baked>,
}

impl Model {
    ///
    /// New model with a single empty sub-model of the same name.
    /// `add_state`/`add_transition` build into it until the first
    /// `concatenate`.
    ///
    pub fn new<S: Into<String>>(name: S) -> Model {
        let name = name.into();
        Model {
            sub_models: vec![SubModel::new(name.clone())],
            name,
            links: Vec::new(),
            baked: None,
        }
    }
    ///
    /// Wrap an already-built sub-model as the first section.
    ///
    pub fn from_sub_model(sub: SubModel) -> Model {
        Model {
            name: sub.name().to_string(),
            sub_models: vec![sub],
            links: Vec::new(),
            baked: None,
        }
    }
    pub fn name(&self) -> &str {
        &self.name
    }
    pub fn sub_models(&self) -> &[SubModel] {
        &self.sub_models
    }
    ///
    /// The model-level start sentinel (= first sub-model's start).
    ///
    pub fn start(&self) -> &State {
        let sub = &self.sub_models[0];
        sub.state(sub.start())
    }
    ///
    /// The model-level end sentinel (= last sub-model's end).
    ///
    pub fn end(&self) -> &State {
        let sub = self.sub_models.last().unwrap();
        sub.state(sub.end())
    }
    ///
    /// Append a state to the newest sub-model.
    ///
    pub fn add_state(&mut self, state: State) -> StateId {
        self.sub_models.last_mut().unwrap().add_state(state)
    }
    pub fn add_states<I: IntoIterator<Item = State>>(&mut self, states: I) -> Vec<StateId> {
        self.sub_models.last_mut().unwrap().add_states(states)
    }
    ///
    /// Name-addressed transition in the newest sub-model.
    ///
    pub fn add_transition(&mut self, from: &str, to: &str, prob: f64) -> Result<()> {
        self.sub_models
            .last_mut()
            .unwrap()
            .add_transition(from, to, prob)
    }
    ///
    /// Append a sub-model, linking `previous.end -> sub.start` with
    /// `transition_probability`. Invalidates any previous bake.
    ///
    pub fn concatenate(&mut self, sub: SubModel, transition_probability: f64) {
        self.sub_models.push(sub);
        self.links.push(Prob::from_prob(transition_probability));
        self.baked = None;
    }
    pub fn is_baked(&self) -> bool {
        self.baked.is_some()
    }
    ///
    /// Total number of states over all sub-models (sentinels included).
    ///
    pub fn n_states(&self) -> usize {
        self.sub_models.iter().map(|s| s.n_states()).sum()
    }
    ///
    /// Freeze the model with default options (canonical topology sort).
    ///
    pub fn bake(&mut self) {
        self.bake_with(BakeConfig::default())
    }
    ///
    /// Freeze the model:
    /// sort each sub-model, assign contiguous global indices in
    /// sub-model order, merge all transition tables and link edges
    /// into one flat graph.
    ///
    /// Total over well-formed input; re-baking an already-baked model
    /// reproduces the same ordering and indexing.
    ///
    pub fn bake_with(&mut self, config: BakeConfig) {
        for sub in &mut self.sub_models {
            if config.sort_by_name {
                sort::sort_by_name(sub);
            } else {
                sort::sort_canonical(sub);
            }
        }

        let n = self.n_states();
        let mut graph = DiGraph::with_capacity(n, 4 * n);
        let mut index_of = HashMap::default();
        let mut bands = Vec::with_capacity(self.sub_models.len());
        // node index of (sub-model, arena id)
        let mut globals: Vec<Vec<NodeIndex>> = Vec::with_capacity(self.sub_models.len());

        for (k, sub) in self.sub_models.iter().enumerate() {
            let first = graph.node_count();
            let mut map = vec![ni(0); sub.n_states()];
            for &id in sub.order() {
                let s = sub.state(id);
                let node = graph.add_node(BakedState {
                    name: s.name().to_string(),
                    emission: s.emission().copied(),
                    sub_model: k,
                });
                index_of.insert(s.name().to_string(), node.index());
                map[id] = node;
            }
            bands.push((first, graph.node_count() - 1));
            globals.push(map);
        }

        for (k, sub) in self.sub_models.iter().enumerate() {
            for &a in sub.order() {
                for (b, p) in sub.transitions_from(a) {
                    // absent and zero edges are the same thing downstream
                    if !p.is_zero() {
                        graph.add_edge(globals[k][a], globals[k][b], p);
                    }
                }
            }
        }
        for (k, &p) in self.links.iter().enumerate() {
            let from = globals[k][self.sub_models[k].end()];
            let to = globals[k + 1][self.sub_models[k + 1].start()];
            if !p.is_zero() {
                graph.add_edge(from, to, p);
            }
        }

        debug!(
            "baked model {}: {} states, {} edges, {} sub-models",
            self.name,
            graph.node_count(),
            graph.edge_count(),
            self.sub_models.len()
        );
        self.baked = Some(Baked {
            graph,
            bands,
            index_of,
            read_length: config.read_length,
        });
    }
    ///
    /// The frozen state space, or NotBaked.
    ///
    pub(crate) fn baked(&self) -> Result<&Baked> {
        self.baked.as_ref().ok_or(HmmError::NotBaked)
    }
    ///
    /// Global index of a state by name (post-bake).
    ///
    pub fn state_index(&self, name: &str) -> Option<usize> {
        self.baked
            .as_ref()
            .and_then(|baked| baked.index_of.get(name).copied())
    }
    ///
    /// Name of the state at a global index (post-bake).
    ///
    pub fn state_name(&self, index: usize) -> Result<&str> {
        let baked = self.baked()?;
        Ok(baked.graph[ni(index)].name())
    }
    ///
    /// Inclusive global index range of each sub-model.
    ///
    pub fn bands(&self) -> Result<&[(usize, usize)]> {
        Ok(&self.baked()?.bands)
    }
    ///
    /// Dense `|states| x |states|` matrix of linear transition
    /// probabilities; absent edges are 0.
    ///
    pub fn dense_transition_matrix(&self) -> Result<Array2<f64>> {
        use petgraph::visit::EdgeRef;
        let baked = self.baked()?;
        let n = baked.graph.node_count();
        let mut mat = Array2::zeros((n, n));
        for edge in baked.graph.edge_references() {
            mat[[edge.source().index(), edge.target().index()]] = edge.weight().to_value();
        }
        Ok(mat)
    }
    ///
    /// Advisory check that every outgoing row sums to 1 (tolerance
    /// 1e-4). Returns the offending `(state name, sum)` pairs; the
    /// terminal end sentinel is exempt (it has no outgoing row).
    ///
    pub fn check_sanity_of_transition_prob(&self, verbose: bool) -> Vec<(String, f64)> {
        const TOL: f64 = 1e-4;
        let mut offenders = Vec::new();
        let last = self.sub_models.len() - 1;
        for (k, sub) in self.sub_models.iter().enumerate() {
            for &id in sub.order() {
                if k == last && id == sub.end() {
                    continue;
                }
                let mut sum = sub.outgoing_sum(id);
                if k < last && id == sub.end() {
                    sum += self.links[k].to_value();
                }
                if verbose {
                    debug!("{}: outgoing sum {}", sub.state(id).name(), sum);
                }
                if (sum - 1.0).abs() > TOL {
                    warn!(
                        "state {} has outgoing transition sum {}",
                        sub.state(id).name(),
                        sum
                    );
                    offenders.push((sub.state(id).name().to_string(), sum));
                }
            }
        }
        offenders
    }
}

impl std::fmt::Display for Model {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match &self.baked {
            Some(baked) => write!(f, "{}", Dot::with_config(&baked.graph, &[])),
            None => write!(f, "{} (not baked)", self.name),
        }
    }
}
