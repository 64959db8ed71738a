//!
//! Mock models for testing
//!
use crate::builder;
use crate::model::Model;
use crate::prob::p;
use crate::state::{EmissionTable, State};
use crate::submodel::SubModel;

///
/// `start -> A -> B -> end` where A always emits `x` and B always
/// emits `y`. The only admissible input is "xy".
///
pub fn mock_two_state() -> Model {
    let mut sub = SubModel::new("two-state");
    let a = sub.add_state(State::new("A", EmissionTable::from_pairs(&[(b'x', 1.0)])));
    let b = sub.add_state(State::new("B", EmissionTable::from_pairs(&[(b'y', 1.0)])));
    let (start, end) = (sub.start(), sub.end());
    sub.set_transition(start, a, p(1.0));
    sub.set_transition(a, b, p(1.0));
    sub.set_transition(b, end, p(1.0));
    Model::from_sub_model(sub)
}

///
/// Two disjoint two-state chains from start to end, entered with
/// probability `branch` each. Both arms emit "xy", so the Forward sum
/// is `2 * branch` while the best single path scores `branch`.
///
pub fn mock_diamond(branch: f64) -> Model {
    let mut sub = SubModel::new("diamond");
    let (start, end) = (sub.start(), sub.end());
    for arm in ["1", "2"] {
        let a = sub.add_state(State::new(
            format!("A{}", arm),
            EmissionTable::from_pairs(&[(b'x', 1.0)]),
        ));
        let b = sub.add_state(State::new(
            format!("B{}", arm),
            EmissionTable::from_pairs(&[(b'y', 1.0)]),
        ));
        sub.set_transition(start, a, p(branch));
        sub.set_transition(a, b, p(1.0));
        sub.set_transition(b, end, p(1.0));
    }
    Model::from_sub_model(sub)
}

///
/// Small read matcher: 3 bp flanks around three copies of "ACGT".
///
pub fn mock_read_matcher() -> Model {
    builder::read_matcher(b"TTG", b"ACGT", 3, b"CAA", 0.05)
}
