//!
//! Topology sorter
//!
//! Rewrites a sub-model's state ordering into the canonical profile
//! order the banded decoders rely on: per repeat unit, dummy boundary
//! states first, then `I0`, then `(D_i, M_i, I_i)` triples by position.
//! Silent chains inside a unit then always point "forward" in the flat
//! index space, so a column sweep can propagate them in order.
//!
//! The profile naming grammar is `<type><index>_<unit_id>` with
//! `type` one of `I`/`M`/`D`; dummy boundary states carry a
//! `_start_<unit_id>` or `_end_<unit_id>` marker instead.
//!
use crate::common::StateId;
use crate::submodel::SubModel;
use std::collections::BTreeMap;

///
/// Profile state type in canonical intra-position order (D, M, I).
///
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ProfileType {
    Delete,
    Match,
    Insert,
}

///
/// What a state name says about the state's role in the topology.
///
#[derive(Clone, Debug, PartialEq)]
pub enum NameClass {
    /// `..._start_<unit_id>` dummy boundary
    DummyStart { unit: String },
    /// `..._end_<unit_id>` dummy boundary
    DummyEnd { unit: String },
    /// `<type><index>_<unit_id>` profile state
    Profile {
        ty: ProfileType,
        index: usize,
        unit: String,
    },
    /// anything else (sub-model sentinels are never classified by name)
    Other,
}

///
/// Parse a state name into its topology role.
///
pub fn classify(name: &str) -> NameClass {
    if let Some(pos) = name.find("_start_") {
        return NameClass::DummyStart {
            unit: name[pos + "_start_".len()..].to_string(),
        };
    }
    if let Some(pos) = name.find("_end_") {
        return NameClass::DummyEnd {
            unit: name[pos + "_end_".len()..].to_string(),
        };
    }
    let ty = match name.chars().next() {
        Some('I') => ProfileType::Insert,
        Some('M') => ProfileType::Match,
        Some('D') => ProfileType::Delete,
        _ => return NameClass::Other,
    };
    // digits up to the first underscore, the rest is the unit id
    let rest = &name[1..];
    match rest.find('_') {
        Some(sep) if sep > 0 && rest[..sep].bytes().all(|b| b.is_ascii_digit()) => {
            NameClass::Profile {
                ty,
                index: rest[..sep].parse().unwrap(),
                unit: rest[sep + 1..].to_string(),
            }
        }
        _ => NameClass::Other,
    }
}

#[derive(Default)]
struct UnitBucket {
    dummy_starts: Vec<StateId>,
    inserts: Vec<(usize, StateId)>,
    matches: Vec<(usize, StateId)>,
    deletes: Vec<(usize, StateId)>,
    dummy_ends: Vec<StateId>,
}

///
/// Canonical profile ordering:
///
/// ```text
/// start,
///   for each unit (ascending lexicographic):
///     dummy starts (input order), I0, (D_i, M_i, I_i)*, dummy ends (input order),
///   unclassified states (input order),
/// end
/// ```
///
/// No-op when the sub-model holds only its two sentinels.
///
pub fn sort_canonical(sub: &mut SubModel) {
    if sub.order().len() == 2 {
        return;
    }
    let start = sub.start();
    let end = sub.end();

    // bucket by unit key; BTreeMap gives the lexicographic unit order
    let mut units: BTreeMap<String, UnitBucket> = BTreeMap::new();
    let mut others: Vec<StateId> = Vec::new();
    for &id in sub.order() {
        if id == start || id == end {
            continue;
        }
        match classify(sub.state(id).name()) {
            NameClass::DummyStart { unit } => units.entry(unit).or_default().dummy_starts.push(id),
            NameClass::DummyEnd { unit } => units.entry(unit).or_default().dummy_ends.push(id),
            NameClass::Profile { ty, index, unit } => {
                let bucket = units.entry(unit).or_default();
                match ty {
                    ProfileType::Insert => bucket.inserts.push((index, id)),
                    ProfileType::Match => bucket.matches.push((index, id)),
                    ProfileType::Delete => bucket.deletes.push((index, id)),
                }
            }
            NameClass::Other => others.push(id),
        }
    }

    let mut order = Vec::with_capacity(sub.n_states());
    order.push(start);
    for (_, mut bucket) in units {
        order.extend(&bucket.dummy_starts);
        bucket.inserts.sort_by_key(|&(index, _)| index);
        bucket.matches.sort_by_key(|&(index, _)| index);
        bucket.deletes.sort_by_key(|&(index, _)| index);

        let mut inserts = bucket.inserts.into_iter();
        if let Some((_, i0)) = inserts.next() {
            order.push(i0);
        }
        let mut deletes = bucket.deletes.into_iter();
        let mut matches = bucket.matches.into_iter();
        loop {
            let d = deletes.next();
            let m = matches.next();
            let i = inserts.next();
            if d.is_none() && m.is_none() && i.is_none() {
                break;
            }
            order.extend(d.map(|(_, id)| id));
            order.extend(m.map(|(_, id)| id));
            order.extend(i.map(|(_, id)| id));
        }
        order.extend(&bucket.dummy_ends);
    }
    order.extend(others);
    order.push(end);
    sub.set_order(order);
}

///
/// Alternative ordering for visualization: everything between the
/// sentinels sorted by name as plain strings.
///
pub fn sort_by_name(sub: &mut SubModel) {
    if sub.order().len() == 2 {
        return;
    }
    let start = sub.start();
    let end = sub.end();
    let mut inner: Vec<StateId> = sub
        .order()
        .iter()
        .copied()
        .filter(|&id| id != start && id != end)
        .collect();
    inner.sort_by(|&a, &b| sub.state(a).name().cmp(sub.state(b).name()));

    let mut order = Vec::with_capacity(sub.n_states());
    order.push(start);
    order.extend(inner);
    order.push(end);
    sub.set_order(order);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::{EmissionTable, State};

    fn names(sub: &SubModel) -> Vec<String> {
        sub.order()
            .iter()
            .map(|&id| sub.state(id).name().to_string())
            .collect()
    }

    /// two-unit repeat matcher with states added in a scrambled order
    fn scrambled_repeat_sub_model() -> SubModel {
        let mut sub = SubModel::new("repeat");
        for unit in ["1", "0"] {
            sub.add_state(State::silent(format!("unit_end_{}", unit)));
            for i in (1..=2).rev() {
                sub.add_state(State::new(
                    format!("M{}_{}", i, unit),
                    EmissionTable::dominant(b'A', 0.97, 0.01),
                ));
                sub.add_state(State::silent(format!("D{}_{}", i, unit)));
            }
            for i in 0..=2 {
                sub.add_state(State::new(format!("I{}_{}", i, unit), EmissionTable::uniform_acgt()));
            }
            sub.add_state(State::silent(format!("unit_start_{}", unit)));
        }
        sub
    }

    #[test]
    fn classify_names() {
        assert_eq!(
            classify("M10_2"),
            NameClass::Profile {
                ty: ProfileType::Match,
                index: 10,
                unit: "2".to_string()
            }
        );
        assert_eq!(
            classify("I0_suffix"),
            NameClass::Profile {
                ty: ProfileType::Insert,
                index: 0,
                unit: "suffix".to_string()
            }
        );
        assert_eq!(
            classify("unit_start_3"),
            NameClass::DummyStart {
                unit: "3".to_string()
            }
        );
        assert_eq!(
            classify("suffix_end_suffix"),
            NameClass::DummyEnd {
                unit: "suffix".to_string()
            }
        );
        assert_eq!(classify("repeat-start"), NameClass::Other);
        assert_eq!(classify("Mx_1"), NameClass::Other);
    }

    #[test]
    fn canonical_order_per_unit() {
        let mut sub = scrambled_repeat_sub_model();
        sort_canonical(&mut sub);
        assert_eq!(
            names(&sub),
            vec![
                "repeat-start",
                "unit_start_0",
                "I0_0",
                "D1_0",
                "M1_0",
                "I1_0",
                "D2_0",
                "M2_0",
                "I2_0",
                "unit_end_0",
                "unit_start_1",
                "I0_1",
                "D1_1",
                "M1_1",
                "I1_1",
                "D2_1",
                "M2_1",
                "I2_1",
                "unit_end_1",
                "repeat-end",
            ]
        );
    }

    #[test]
    fn canonical_sort_is_idempotent() {
        let mut sub = scrambled_repeat_sub_model();
        sort_canonical(&mut sub);
        let first = names(&sub);
        sort_canonical(&mut sub);
        assert_eq!(first, names(&sub));
    }

    #[test]
    fn sentinel_only_sub_model_is_untouched() {
        let mut sub = SubModel::new("empty");
        sort_canonical(&mut sub);
        assert_eq!(names(&sub), vec!["empty-start", "empty-end"]);
    }

    #[test]
    fn name_sort_keeps_sentinels_outermost() {
        let mut sub = scrambled_repeat_sub_model();
        sort_by_name(&mut sub);
        let ns = names(&sub);
        assert_eq!(ns.first().unwrap(), "repeat-start");
        assert_eq!(ns.last().unwrap(), "repeat-end");
        let inner = &ns[1..ns.len() - 1];
        let mut sorted = inner.to_vec();
        sorted.sort();
        assert_eq!(inner, sorted.as_slice());
    }
}
