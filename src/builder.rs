//!
//! Ready-to-bake matcher models
//!
//! Builders for the three sections of a tandem-repeat read matcher:
//! a suffix matcher over the left flank, a repeat matcher holding
//! several copies of the unit profile, and a prefix matcher over the
//! right flank. Emissions follow the usual profile literals: uniform
//! ACGT inserts, matches dominated by the pattern base.
//!
use crate::common::StateId;
use crate::model::Model;
use crate::prob::p;
use crate::state::{EmissionTable, State};
use crate::submodel::SubModel;

/// Emission probability of the pattern base in a match state.
const MATCH_EMIT: f64 = 0.97;
/// Emission probability of each non-pattern base in a match state.
const MISMATCH_EMIT: f64 = 0.01;

///
/// Profile state columns of one unit: inserts `I0..In`, matches
/// `M1..Mn`, deletes `D1..Dn`, named with the `unit` suffix.
///
fn profile_states(
    sub: &mut SubModel,
    pattern: &[u8],
    unit: &str,
) -> (Vec<StateId>, Vec<StateId>, Vec<StateId>) {
    let n = pattern.len();
    let inserts = (0..=n)
        .map(|i| {
            sub.add_state(State::new(
                format!("I{}_{}", i, unit),
                EmissionTable::uniform_acgt(),
            ))
        })
        .collect();
    let matches = (1..=n)
        .map(|i| {
            sub.add_state(State::new(
                format!("M{}_{}", i, unit),
                EmissionTable::dominant(pattern[i - 1], MATCH_EMIT, MISMATCH_EMIT),
            ))
        })
        .collect();
    let deletes = (1..=n)
        .map(|i| sub.add_state(State::silent(format!("D{}_{}", i, unit))))
        .collect();
    (inserts, matches, deletes)
}

///
/// Matcher that accepts any suffix of `pattern` (the left flank of a
/// read that starts mid-flank): the unit entry fans out into every
/// match position.
///
pub fn suffix_matcher(pattern: &[u8], max_error_rate: f64) -> SubModel {
    assert!(!pattern.is_empty());
    let mut sub = SubModel::new("suffix");
    let n = pattern.len();
    let last = n - 1;
    let insert_error = max_error_rate * 2.0 / 5.0;
    let delete_error = max_error_rate / 5.0;

    let (inserts, matches, deletes) = profile_states(&mut sub, pattern, "suffix");
    let unit_start = sub.add_state(State::silent("suffix_start_suffix"));
    let unit_end = sub.add_state(State::silent("suffix_end_suffix"));

    sub.set_transition(sub.start(), unit_start, p(1.0));
    sub.set_transition(unit_end, sub.end(), p(1.0));

    sub.set_transition(unit_start, deletes[0], p(delete_error));
    sub.set_transition(unit_start, inserts[0], p(insert_error));
    for i in 0..n {
        sub.set_transition(
            unit_start,
            matches[i],
            p((1.0 - insert_error - delete_error) / n as f64),
        );
    }

    sub.set_transition(inserts[0], inserts[0], p(insert_error));
    sub.set_transition(inserts[0], deletes[0], p(delete_error));
    sub.set_transition(inserts[0], matches[0], p(1.0 - insert_error - delete_error));

    sub.set_transition(deletes[last], unit_end, p(1.0 - insert_error));
    sub.set_transition(deletes[last], inserts[last + 1], p(insert_error));
    sub.set_transition(matches[last], unit_end, p(1.0 - insert_error));
    sub.set_transition(matches[last], inserts[last + 1], p(insert_error));
    sub.set_transition(inserts[last + 1], inserts[last + 1], p(insert_error));
    sub.set_transition(inserts[last + 1], unit_end, p(1.0 - insert_error));

    for i in 0..n {
        sub.set_transition(matches[i], inserts[i + 1], p(insert_error));
        sub.set_transition(deletes[i], inserts[i + 1], p(insert_error));
        sub.set_transition(inserts[i + 1], inserts[i + 1], p(insert_error));
        if i < n - 1 {
            sub.set_transition(inserts[i + 1], matches[i + 1], p(1.0 - insert_error - delete_error));
            sub.set_transition(inserts[i + 1], deletes[i + 1], p(delete_error));
            sub.set_transition(matches[i], matches[i + 1], p(1.0 - insert_error - delete_error));
            sub.set_transition(matches[i], deletes[i + 1], p(delete_error));
            sub.set_transition(deletes[i], deletes[i + 1], p(delete_error));
            sub.set_transition(deletes[i], matches[i + 1], p(1.0 - insert_error - delete_error));
        }
    }
    sub
}

///
/// Matcher that accepts any prefix of `pattern` (the right flank of a
/// read that ends mid-flank): every match state may exit early into
/// the unit end.
///
pub fn prefix_matcher(pattern: &[u8], max_error_rate: f64) -> SubModel {
    assert!(!pattern.is_empty());
    let mut sub = SubModel::new("prefix");
    let n = pattern.len();
    let last = n - 1;
    let insert_error = max_error_rate * 2.0 / 5.0;
    let delete_error = max_error_rate / 5.0;
    const EARLY_EXIT: f64 = 0.01;

    let (inserts, matches, deletes) = profile_states(&mut sub, pattern, "prefix");
    let unit_start = sub.add_state(State::silent("prefix_start_prefix"));
    let unit_end = sub.add_state(State::silent("prefix_end_prefix"));

    sub.set_transition(sub.start(), unit_start, p(1.0));
    sub.set_transition(unit_end, sub.end(), p(1.0));

    sub.set_transition(unit_start, matches[0], p(1.0 - insert_error - delete_error));
    sub.set_transition(unit_start, deletes[0], p(delete_error));
    sub.set_transition(unit_start, inserts[0], p(insert_error));

    sub.set_transition(inserts[0], inserts[0], p(insert_error));
    sub.set_transition(inserts[0], deletes[0], p(delete_error));
    sub.set_transition(inserts[0], matches[0], p(1.0 - insert_error - delete_error));

    sub.set_transition(deletes[last], unit_end, p(1.0 - insert_error));
    sub.set_transition(deletes[last], inserts[last + 1], p(insert_error));
    sub.set_transition(matches[last], unit_end, p(1.0 - insert_error));
    sub.set_transition(matches[last], inserts[last + 1], p(insert_error));
    sub.set_transition(inserts[last + 1], inserts[last + 1], p(insert_error));
    sub.set_transition(inserts[last + 1], unit_end, p(1.0 - insert_error));

    for i in 0..n {
        sub.set_transition(matches[i], inserts[i + 1], p(insert_error));
        sub.set_transition(deletes[i], inserts[i + 1], p(insert_error));
        sub.set_transition(inserts[i + 1], inserts[i + 1], p(insert_error));
        if i < n - 1 {
            sub.set_transition(inserts[i + 1], matches[i + 1], p(1.0 - insert_error - delete_error));
            sub.set_transition(inserts[i + 1], deletes[i + 1], p(delete_error));
            sub.set_transition(
                matches[i],
                matches[i + 1],
                p(1.0 - insert_error - delete_error - EARLY_EXIT),
            );
            sub.set_transition(matches[i], deletes[i + 1], p(delete_error));
            sub.set_transition(matches[i], unit_end, p(EARLY_EXIT));
            sub.set_transition(deletes[i], deletes[i + 1], p(delete_error));
            sub.set_transition(deletes[i], matches[i + 1], p(1.0 - insert_error - delete_error));
        }
    }
    sub
}

///
/// `copies` chained copies of the unit profile, each fenced by its own
/// `unit_start_<k>` / `unit_end_<k>` boundary states.
///
pub fn repeats_matcher(pattern: &[u8], copies: usize) -> SubModel {
    assert!(!pattern.is_empty());
    assert!(copies > 0);
    let mut sub = SubModel::new("repeat");
    let n = pattern.len();
    let last = n - 1;

    let mut last_end: Option<StateId> = None;
    for copy in 0..copies {
        let unit = copy.to_string();
        let (inserts, matches, deletes) = profile_states(&mut sub, pattern, &unit);
        let unit_start = sub.add_state(State::silent(format!("unit_start_{}", unit)));
        let unit_end = sub.add_state(State::silent(format!("unit_end_{}", unit)));

        match last_end {
            Some(prev) => sub.set_transition(prev, unit_start, p(1.0)),
            None => sub.set_transition(sub.start(), unit_start, p(1.0)),
        }
        if copy == copies - 1 {
            sub.set_transition(unit_end, sub.end(), p(1.0));
        }

        sub.set_transition(unit_start, matches[0], p(0.98));
        sub.set_transition(unit_start, deletes[0], p(0.01));
        sub.set_transition(unit_start, inserts[0], p(0.01));

        sub.set_transition(inserts[0], inserts[0], p(0.01));
        sub.set_transition(inserts[0], deletes[0], p(0.01));
        sub.set_transition(inserts[0], matches[0], p(0.98));

        sub.set_transition(deletes[last], unit_end, p(0.99));
        sub.set_transition(deletes[last], inserts[last + 1], p(0.01));
        sub.set_transition(matches[last], unit_end, p(0.99));
        sub.set_transition(matches[last], inserts[last + 1], p(0.01));
        sub.set_transition(inserts[last + 1], inserts[last + 1], p(0.01));
        sub.set_transition(inserts[last + 1], unit_end, p(0.99));

        for i in 0..n {
            sub.set_transition(matches[i], inserts[i + 1], p(0.01));
            sub.set_transition(deletes[i], inserts[i + 1], p(0.01));
            sub.set_transition(inserts[i + 1], inserts[i + 1], p(0.01));
            if i < n - 1 {
                sub.set_transition(inserts[i + 1], matches[i + 1], p(0.98));
                sub.set_transition(inserts[i + 1], deletes[i + 1], p(0.01));
                sub.set_transition(matches[i], matches[i + 1], p(0.98));
                sub.set_transition(matches[i], deletes[i + 1], p(0.01));
                sub.set_transition(deletes[i], deletes[i + 1], p(0.01));
                sub.set_transition(deletes[i], matches[i + 1], p(0.98));
            }
        }
        last_end = Some(unit_end);
    }
    sub
}

///
/// The full `[suffix, repeat, prefix]` read matcher, ready to bake.
///
pub fn read_matcher(
    left_flank: &[u8],
    pattern: &[u8],
    copies: usize,
    right_flank: &[u8],
    max_error_rate: f64,
) -> Model {
    let mut model = Model::from_sub_model(suffix_matcher(left_flank, max_error_rate));
    model.concatenate(repeats_matcher(pattern, copies), 1.0);
    model.concatenate(prefix_matcher(right_flank, max_error_rate), 1.0);
    model
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn suffix_matcher_rows_are_stochastic() {
        let model = Model::from_sub_model(suffix_matcher(b"TTGACA", 0.05));
        assert!(model.check_sanity_of_transition_prob(false).is_empty());
    }

    #[test]
    fn prefix_matcher_rows_are_stochastic() {
        let model = Model::from_sub_model(prefix_matcher(b"GATTAC", 0.05));
        assert!(model.check_sanity_of_transition_prob(false).is_empty());
    }

    #[test]
    fn repeats_matcher_rows_are_stochastic() {
        let model = Model::from_sub_model(repeats_matcher(b"ACGT", 3));
        assert!(model.check_sanity_of_transition_prob(false).is_empty());
    }

    #[test]
    fn repeats_matcher_has_one_boundary_pair_per_copy() {
        let sub = repeats_matcher(b"ACGT", 3);
        for unit in 0..3 {
            assert!(sub.state_id(&format!("unit_start_{}", unit)).is_some());
            assert!(sub.state_id(&format!("unit_end_{}", unit)).is_some());
        }
        assert!(sub.state_id("unit_start_3").is_none());
    }

    #[test]
    fn read_matcher_has_three_sections() {
        let mut model = read_matcher(b"TTG", b"ACGT", 2, b"CAA", 0.05);
        assert_eq!(model.sub_models().len(), 3);
        model.bake();
        let bands = model.bands().unwrap();
        assert_eq!(bands.len(), 3);
        // the repeat band sits in the middle
        let (lo, hi) = bands[1];
        let first = model.state_name(lo).unwrap();
        let last = model.state_name(hi).unwrap();
        assert_eq!(first, "repeat-start");
        assert_eq!(last, "repeat-end");
    }
}
