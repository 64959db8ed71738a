//!
//! Decoded state paths and repeat accounting
//!
//! A `Path` is the traceback output of the Viterbi engines: the
//! visited `(global index, state)` pairs in order. The accounting
//! helpers reproduce the name-driven bookkeeping the repeat caller
//! stack performs on such paths (unit boundaries are recognized by
//! their `unit_start_*` / `unit_end_*` names).
//!
use crate::common::Sequence;
use itertools::Itertools;

/// Units shorter than this many emitted bases do not count as a
/// visited repeat copy.
const MINIMUM_REQUIRED_BP_IN_REPEAT: usize = 3;

///
/// One visited state of a decoded path.
///
#[derive(Clone, Debug, PartialEq)]
pub struct PathStep {
    /// global state index in the baked model
    pub state: usize,
    pub name: String,
    pub silent: bool,
}

impl PathStep {
    pub fn is_emitting(&self) -> bool {
        !self.silent
    }
    pub fn is_match(&self) -> bool {
        self.name.starts_with('M')
    }
    pub fn is_unit_start(&self) -> bool {
        self.name.starts_with("unit_start")
    }
    pub fn is_unit_end(&self) -> bool {
        self.name.starts_with("unit_end")
    }
}

///
/// Ordered sequence of visited states, sentinels included.
///
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Path {
    steps: Vec<PathStep>,
}

impl Path {
    pub(crate) fn from_steps(steps: Vec<PathStep>) -> Path {
        Path { steps }
    }
    pub fn steps(&self) -> &[PathStep] {
        &self.steps
    }
    pub fn len(&self) -> usize {
        self.steps.len()
    }
    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }
    pub fn names(&self) -> Vec<&str> {
        self.steps.iter().map(|s| s.name.as_str()).collect()
    }
    ///
    /// Steps without the outermost model sentinels.
    ///
    fn interior(&self) -> &[PathStep] {
        if self.steps.len() >= 2 {
            &self.steps[1..self.steps.len() - 1]
        } else {
            &[]
        }
    }
    ///
    /// Number of bases emitted while traversing this path.
    ///
    pub fn emitted_len(&self) -> usize {
        self.steps.iter().filter(|s| s.is_emitting()).count()
    }
    ///
    /// Emitted bases of each fully traversed repeat copy, in order.
    ///
    pub fn repeating_pattern_lengths(&self) -> Vec<usize> {
        let states = self.interior();
        let mut lengths = Vec::new();
        let mut prev_start: Option<usize> = None;
        for i in 0..states.len() {
            if states[i].is_unit_end() {
                if let Some(start) = prev_start {
                    lengths.push(states[start..i].iter().filter(|s| s.is_emitting()).count());
                }
            }
            if states[i].is_unit_start() {
                prev_start = Some(i);
            }
        }
        lengths
    }
    ///
    /// Slice the decoded region into its repeat units.
    ///
    pub fn repeat_segments(&self, region: &[u8]) -> Vec<Sequence> {
        let mut segments = Vec::new();
        let mut added = 0;
        for len in self.repeating_pattern_lengths() {
            segments.push(region[added..added + len].to_vec());
            added += len;
        }
        segments
    }
    ///
    /// Number of repeat copies this path spans.
    ///
    /// Counts `unit_start`/`unit_end` markers, ignoring boundary units
    /// that keep fewer than 3 bp inside the read, and compensates for
    /// a read that enters its first unit mid-copy and leaves its last
    /// one mid-copy.
    ///
    pub fn number_of_repeats(&self) -> usize {
        let states = self.interior();
        let read_length = states.iter().filter(|s| s.is_emitting()).count();

        let mut starts = 0usize;
        let mut ends = 0usize;
        let mut current_bp = 0usize;
        let mut first_start: Option<usize> = None;
        let mut last_start: Option<usize> = None;
        let mut first_end: Option<usize> = None;
        let mut last_end: Option<usize> = None;
        for state in states {
            if state.is_emitting() {
                current_bp += 1;
            }
            if state.is_unit_start() && read_length - current_bp >= MINIMUM_REQUIRED_BP_IN_REPEAT {
                if first_start.is_none() {
                    first_start = Some(current_bp);
                }
                last_start = Some(current_bp);
                starts += 1;
            }
            if state.is_unit_end() && current_bp >= MINIMUM_REQUIRED_BP_IN_REPEAT {
                if first_end.is_none() {
                    first_end = Some(current_bp);
                }
                last_end = Some(current_bp);
                ends += 1;
            }
        }
        let delta = match (first_start, last_start, first_end, last_end) {
            (Some(fs), Some(ls), Some(fe), Some(le)) if fe < fs && ls > le => 1,
            _ => 0,
        };
        starts.max(ends) + delta
    }
    ///
    /// Number of match states on the path.
    ///
    pub fn number_of_matches(&self) -> usize {
        self.interior().iter().filter(|s| s.is_match()).count()
    }
    ///
    /// Bases consumed by the left-flank (suffix) matcher.
    ///
    pub fn left_flanking_size(&self) -> usize {
        self.interior()
            .iter()
            .filter(|s| s.is_emitting() && s.name.ends_with("suffix"))
            .count()
    }
    ///
    /// Bases consumed by the right-flank (prefix) matcher.
    ///
    pub fn right_flanking_size(&self) -> usize {
        self.interior()
            .iter()
            .filter(|s| s.is_emitting() && s.name.ends_with("prefix"))
            .count()
    }
    ///
    /// Align two sequences along this path: a delete inserts a gap
    /// into `y`, an insert a gap into `x`, both at the step position.
    ///
    pub fn to_alignment(&self, x: &[u8], y: &[u8]) -> (Sequence, Sequence) {
        let mut x: Sequence = x.to_vec();
        let mut y: Sequence = y.to_vec();
        for (i, step) in self.interior().iter().enumerate() {
            if step.name.starts_with('D') {
                y.insert(i, b'-');
            } else if step.name.starts_with('I') {
                x.insert(i, b'-');
            }
        }
        (x, y)
    }
}

impl std::fmt::Display for Path {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(
            f,
            "{}",
            self.steps.iter().map(|s| s.name.as_str()).join(" -> ")
        )
    }
}
