//!
//! end-to-end test of the tandem-repeat read matcher
//!
use approx::assert_abs_diff_eq;
use trphmm::prelude::*;

const LEFT: &[u8] = b"TTGACA";
const PATTERN: &[u8] = b"ACGGT";
const RIGHT: &[u8] = b"GATTAC";
const COPIES: usize = 3;

fn matcher() -> Model {
    read_matcher(LEFT, PATTERN, COPIES, RIGHT, 0.05)
}

fn perfect_read() -> Sequence {
    let mut read = LEFT.to_vec();
    for _ in 0..COPIES {
        read.extend_from_slice(PATTERN);
    }
    read.extend_from_slice(RIGHT);
    read
}

#[test]
fn transition_rows_are_stochastic() {
    let model = matcher();
    assert!(model.check_sanity_of_transition_prob(true).is_empty());
}

#[test]
fn baked_index_space_is_well_formed() {
    let mut model = matcher();
    model.bake();
    let n = model.n_states();
    assert_eq!(model.state_index("suffix-start"), Some(0));
    assert_eq!(model.state_index("prefix-end"), Some(n - 1));

    // every state resolves to a unique index inside its sub-model band
    let bands = model.bands().unwrap().to_vec();
    let mut seen = vec![false; n];
    for (k, sub) in model.sub_models().iter().enumerate() {
        let (lo, hi) = bands[k];
        for &id in sub.order() {
            let index = model.state_index(sub.state(id).name()).unwrap();
            assert!(index >= lo && index <= hi);
            assert!(!seen[index]);
            seen[index] = true;
        }
    }
    assert!(seen.iter().all(|&s| s));
}

#[test]
fn bake_twice_is_stable() {
    let mut model = matcher();
    model.bake();
    let first: Vec<String> = (0..model.n_states())
        .map(|i| model.state_name(i).unwrap().to_string())
        .collect();
    model.bake();
    let second: Vec<String> = (0..model.n_states())
        .map(|i| model.state_name(i).unwrap().to_string())
        .collect();
    assert_eq!(first, second);
}

#[test]
fn decoded_path_uses_positive_edges_only() {
    let mut model = matcher();
    model.bake();
    let read = perfect_read();
    let (logp, path) = model.viterbi(&read).unwrap();
    assert!(logp.is_finite());

    let mat = model.dense_transition_matrix().unwrap();
    for pair in path.steps().windows(2) {
        assert!(
            mat[[pair[0].state, pair[1].state]] > 0.0,
            "edge {} -> {} has zero probability",
            pair[0].name,
            pair[1].name
        );
    }
    // non-silent steps consume exactly one symbol each
    assert_eq!(path.emitted_len(), read.len());
}

#[test]
fn perfect_read_decodes_all_copies() {
    let mut model = matcher();
    model.bake();
    let read = perfect_read();
    println!("read: {}", sequence_to_string(&read));
    let (logp, path) = model.viterbi(&read).unwrap();
    assert!(logp.is_finite());
    assert_eq!(
        path.repeating_pattern_lengths(),
        vec![PATTERN.len(); COPIES]
    );
    assert_eq!(path.number_of_repeats(), COPIES);
    assert_eq!(path.left_flanking_size(), LEFT.len());
    assert_eq!(path.right_flanking_size(), RIGHT.len());

    // the repeat region slices back out of the read
    let region = &read[LEFT.len()..read.len() - RIGHT.len()];
    let segments = path.repeat_segments(region);
    for segment in &segments {
        println!("segment: {}", sequence_to_string(segment));
    }
    assert_eq!(segments, vec![PATTERN.to_vec(); COPIES]);
}

#[test]
fn read_with_deletion_still_decodes() {
    let mut model = matcher();
    model.bake();
    let mut read = perfect_read();
    // drop one base of the middle copy
    read.remove(LEFT.len() + PATTERN.len() + 2);
    let (logp, path) = model.viterbi(&read).unwrap();
    assert!(logp.is_finite());
    assert_eq!(path.emitted_len(), read.len());
    let lengths = path.repeating_pattern_lengths();
    assert_eq!(lengths.len(), COPIES);
    assert_eq!(lengths.iter().sum::<usize>(), PATTERN.len() * COPIES - 1);
}

#[test]
fn subseq_viterbi_is_confined_to_its_unit() {
    let mut model = matcher();
    model.bake();
    for unit in ["0", "1", "2"] {
        let (logp, path) = model.subseq_viterbi(PATTERN, unit).unwrap();
        assert_eq!(logp, 0.0);
        let suffix = format!("_{}", unit);
        for step in path.steps() {
            assert!(
                step.name.ends_with(&suffix),
                "state {} escaped unit {}",
                step.name,
                unit
            );
        }
        assert_eq!(
            path.steps().first().unwrap().name,
            format!("unit_start_{}", unit)
        );
        assert_eq!(
            path.steps().last().unwrap().name,
            format!("unit_end_{}", unit)
        );
    }
}

#[test]
fn concatenate_invalidates_the_bake() {
    let mut model = matcher();
    model.bake();
    assert!(model.is_baked());
    model.concatenate(SubModel::new("extra"), 1.0);
    assert!(!model.is_baked());
    assert_eq!(
        model.viterbi(&perfect_read()).unwrap_err(),
        HmmError::NotBaked
    );
    model.bake();
    assert!(model.is_baked());
}

#[test]
fn name_sorted_bake_keeps_the_index_invariants() {
    let mut model = matcher();
    model.bake_with(BakeConfig {
        read_length: Some(32),
        sort_by_name: true,
    });
    let n = model.n_states();
    assert_eq!(model.state_index("suffix-start"), Some(0));
    assert_eq!(model.state_index("prefix-end"), Some(n - 1));
    // decoders accept the alternative ordering
    assert!(model.viterbi(&perfect_read()).is_ok());
}

#[test]
fn forward_and_viterbi_agree_on_flat_chains() {
    // a flat emitting chain has a single path, so the Forward sum and
    // the best path coincide
    let mut sub = SubModel::new("chain");
    let states: Vec<_> = (0..4)
        .map(|i| {
            sub.add_state(State::new(
                format!("S{}", i),
                EmissionTable::from_pairs(&[(b"ACGT"[i], 0.9), (b'N', 0.1)]),
            ))
        })
        .collect();
    let (start, end) = (sub.start(), sub.end());
    sub.set_transition(start, states[0], p(1.0));
    for w in states.windows(2) {
        sub.set_transition(w[0], w[1], p(1.0));
    }
    sub.set_transition(states[3], end, p(1.0));
    let mut model = Model::from_sub_model(sub);
    model.bake();

    let forward = model.log_probability(b"ACGT").unwrap();
    let (viterbi, path) = model.viterbi(b"ACGT").unwrap();
    assert_abs_diff_eq!(forward, 0.9f64.ln() * 4.0, epsilon = 1e-9);
    assert_abs_diff_eq!(viterbi, forward, epsilon = 1e-9);
    assert_eq!(path.len(), 6);
}
