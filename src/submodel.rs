//!
//! Pre-bake collection of states with a sparse transition table
//!
//! A `SubModel` owns its states in an arena; a `StateId` is an index
//! into that arena and stays valid while the topology sorter permutes
//! the ordering. The public surface addresses states by name.
//!
use crate::common::StateId;
use crate::error::{HmmError, Result};
use crate::prob::Prob;
use crate::state::State;
use fnv::FnvHashMap as HashMap;

///
/// One of the concatenated matchers (suffix, repeat or prefix).
///
/// * `start`/`end` are silent sentinel states, created on construction
///   and named `<name>-start` / `<name>-end`.
/// * `order` is the current ordering of all states (sentinels included);
///   the topology sorter rewrites it at bake time.
/// * `trans` maps source id to `(target id -> probability)`;
///   a missing entry reads as p=0.
///
#[derive(Clone, Debug)]
pub struct SubModel {
    name: String,
    states: Vec<State>,
    by_name: HashMap<String, StateId>,
    order: Vec<StateId>,
    trans: HashMap<StateId, HashMap<StateId, Prob>>,
    start: StateId,
    end: StateId,
}

impl SubModel {
    pub fn new<S: Into<String>>(name: S) -> SubModel {
        let name = name.into();
        let mut sub = SubModel {
            name: name.clone(),
            states: Vec::new(),
            by_name: HashMap::default(),
            order: Vec::new(),
            trans: HashMap::default(),
            start: 0,
            end: 0,
        };
        sub.start = sub.add_state(State::silent(format!("{}-start", name)));
        sub.end = sub.add_state(State::silent(format!("{}-end", name)));
        sub
    }
    pub fn name(&self) -> &str {
        &self.name
    }
    ///
    /// Append a state to the arena and the ordering.
    ///
    pub fn add_state(&mut self, state: State) -> StateId {
        let id = self.states.len();
        self.by_name.insert(state.name().to_string(), id);
        self.states.push(state);
        self.order.push(id);
        self.trans.insert(id, HashMap::default());
        id
    }
    pub fn add_states<I: IntoIterator<Item = State>>(&mut self, states: I) -> Vec<StateId> {
        states.into_iter().map(|s| self.add_state(s)).collect()
    }
    pub fn start(&self) -> StateId {
        self.start
    }
    pub fn end(&self) -> StateId {
        self.end
    }
    pub fn n_states(&self) -> usize {
        self.states.len()
    }
    pub fn state(&self, id: StateId) -> &State {
        &self.states[id]
    }
    pub fn state_id(&self, name: &str) -> Option<StateId> {
        self.by_name.get(name).copied()
    }
    ///
    /// Current ordering of all states (sentinels included).
    ///
    pub fn order(&self) -> &[StateId] {
        &self.order
    }
    pub(crate) fn set_order(&mut self, order: Vec<StateId>) {
        debug_assert_eq!(order.len(), self.states.len());
        self.order = order;
    }
    ///
    /// Write `trans[a][b] = p` without membership checks.
    /// Callers hold ids they obtained from `add_state`.
    ///
    pub fn set_transition(&mut self, a: StateId, b: StateId, prob: Prob) {
        self.trans.entry(a).or_default().insert(b, prob);
    }
    ///
    /// Checked, name-addressed variant of `set_transition`.
    ///
    pub fn add_transition(&mut self, a: &str, b: &str, prob: f64) -> Result<()> {
        let a = self.state_id(a).ok_or_else(|| HmmError::UnknownState {
            name: a.to_string(),
        })?;
        let b = self.state_id(b).ok_or_else(|| HmmError::UnknownState {
            name: b.to_string(),
        })?;
        self.set_transition(a, b, Prob::from_prob(prob));
        Ok(())
    }
    ///
    /// Transition probability `a -> b` (p=0 when the edge is absent).
    ///
    pub fn transition(&self, a: StateId, b: StateId) -> Prob {
        self.trans
            .get(&a)
            .and_then(|row| row.get(&b))
            .copied()
            .unwrap_or_else(Prob::zero)
    }
    ///
    /// Iterate the outgoing edges of `a` as `(target, probability)`.
    ///
    pub fn transitions_from(&self, a: StateId) -> impl Iterator<Item = (StateId, Prob)> + '_ {
        self.trans
            .get(&a)
            .into_iter()
            .flat_map(|row| row.iter().map(|(&b, &p)| (b, p)))
    }
    ///
    /// Linear-domain sum of the outgoing row of `a`.
    ///
    pub fn outgoing_sum(&self, a: StateId) -> f64 {
        self.transitions_from(a).map(|(_, p)| p.to_value()).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::EmissionTable;
    use approx::assert_abs_diff_eq;

    #[test]
    fn add_and_query_states() {
        let mut sub = SubModel::new("unit");
        assert_eq!(sub.n_states(), 2);
        let a = sub.add_state(State::new("M1_0", EmissionTable::dominant(b'A', 0.97, 0.01)));
        assert_eq!(sub.state_id("M1_0"), Some(a));
        assert_eq!(sub.state_id("unit-start"), Some(sub.start()));
        assert_eq!(sub.state(a).name(), "M1_0");
        assert_eq!(sub.order().len(), 3);
    }

    #[test]
    fn add_transition_unknown_state() {
        let mut sub = SubModel::new("unit");
        sub.add_state(State::silent("unit_start_0"));
        let err = sub.add_transition("unit_start_0", "nope", 1.0).unwrap_err();
        assert_eq!(
            err,
            HmmError::UnknownState {
                name: "nope".to_string()
            }
        );
        assert!(sub.add_transition("unit-start", "unit_start_0", 1.0).is_ok());
    }

    #[test]
    fn missing_edge_reads_as_zero() {
        let mut sub = SubModel::new("unit");
        let a = sub.add_state(State::silent("unit_start_0"));
        let b = sub.add_state(State::silent("unit_end_0"));
        assert!(sub.transition(a, b).is_zero());
        sub.set_transition(a, b, Prob::from_prob(0.5));
        assert_abs_diff_eq!(sub.transition(a, b).to_value(), 0.5);
        assert_abs_diff_eq!(sub.outgoing_sum(a), 0.5);
    }
}
