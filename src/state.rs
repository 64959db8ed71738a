//!
//! HMM states and their emission tables
//!
//! A state is silent iff it carries no emission table.
//! Emission symbols are plain bytes, so a lookup is a single
//! array access with no hashing in the decode loops.
//!
use crate::prob::Prob;

/// Number of distinct emission symbols (all byte values).
pub const N_SYMBOLS: usize = 256;

///
/// Dense symbol -> probability table of an emitting state.
///
/// Probabilities are stored log-space (`Prob`), so a zero-probability
/// symbol reads back as log 0 = -inf without special casing.
///
#[derive(Clone, Copy, PartialEq)]
pub struct EmissionTable {
    probs: [Prob; N_SYMBOLS],
}

impl EmissionTable {
    ///
    /// Table with p=0 for every symbol.
    ///
    pub fn empty() -> EmissionTable {
        EmissionTable {
            probs: [Prob::zero(); N_SYMBOLS],
        }
    }
    ///
    /// Build from sparse (symbol, probability) pairs.
    /// Symbols not listed have p=0.
    ///
    pub fn from_pairs(pairs: &[(u8, f64)]) -> EmissionTable {
        let mut table = EmissionTable::empty();
        for &(symbol, prob) in pairs {
            table.probs[symbol as usize] = Prob::from_prob(prob);
        }
        table
    }
    ///
    /// Uniform distribution over the four nucleotides.
    ///
    pub fn uniform_acgt() -> EmissionTable {
        EmissionTable::from_pairs(&[(b'A', 0.25), (b'C', 0.25), (b'G', 0.25), (b'T', 0.25)])
    }
    ///
    /// ACGT distribution dominated by one base.
    /// The three other bases share `p_other` each.
    ///
    pub fn dominant(base: u8, p_base: f64, p_other: f64) -> EmissionTable {
        let mut table =
            EmissionTable::from_pairs(&[(b'A', p_other), (b'C', p_other), (b'G', p_other), (b'T', p_other)]);
        table.probs[base as usize] = Prob::from_prob(p_base);
        table
    }
    ///
    /// Probability of emitting `symbol`.
    ///
    pub fn prob(&self, symbol: u8) -> Prob {
        self.probs[symbol as usize]
    }
}

impl std::fmt::Debug for EmissionTable {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        let nonzero: Vec<String> = (0..N_SYMBOLS)
            .filter(|&s| !self.probs[s].is_zero())
            .map(|s| format!("{}:{:.4}", s as u8 as char, self.probs[s].to_value()))
            .collect();
        write!(f, "EmissionTable({})", nonzero.join(","))
    }
}

///
/// A single HMM node.
///
/// * `name` identifies the state and encodes its profile position
///   (`M3_1`, `I0_suffix`, `unit_start_2`, ...).
/// * `emission` is absent for silent states.
///
#[derive(Clone, Debug, PartialEq)]
pub struct State {
    name: String,
    emission: Option<EmissionTable>,
}

impl State {
    ///
    /// An emitting state with the given distribution.
    ///
    pub fn new<S: Into<String>>(name: S, emission: EmissionTable) -> State {
        State {
            name: name.into(),
            emission: Some(emission),
        }
    }
    ///
    /// A silent state (no emission).
    ///
    pub fn silent<S: Into<String>>(name: S) -> State {
        State {
            name: name.into(),
            emission: None,
        }
    }
    pub fn name(&self) -> &str {
        &self.name
    }
    pub fn is_silent(&self) -> bool {
        self.emission.is_none()
    }
    pub fn emission(&self) -> Option<&EmissionTable> {
        self.emission.as_ref()
    }
    ///
    /// Probability of this state emitting `symbol`.
    /// A silent state emits nothing, so p=0 for every symbol.
    ///
    pub fn emission_prob(&self, symbol: u8) -> Prob {
        match &self.emission {
            Some(table) => table.prob(symbol),
            None => Prob::zero(),
        }
    }
}

impl std::fmt::Display for State {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        if self.is_silent() {
            write!(f, "{} (silent)", self.name)
        } else {
            write!(f, "{}", self.name)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn emission_table_lookup() {
        let t = EmissionTable::uniform_acgt();
        assert_abs_diff_eq!(t.prob(b'A').to_value(), 0.25);
        assert_abs_diff_eq!(t.prob(b'T').to_value(), 0.25);
        assert!(t.prob(b'N').is_zero());

        let d = EmissionTable::dominant(b'G', 0.97, 0.01);
        assert_abs_diff_eq!(d.prob(b'G').to_value(), 0.97);
        assert_abs_diff_eq!(d.prob(b'A').to_value(), 0.01);
    }

    #[test]
    fn silent_state_emits_nothing() {
        let s = State::silent("unit_start_0");
        assert!(s.is_silent());
        assert!(s.emission_prob(b'A').is_zero());

        let m = State::new("M1_0", EmissionTable::dominant(b'A', 0.97, 0.01));
        assert!(!m.is_silent());
        assert_abs_diff_eq!(m.emission_prob(b'A').to_value(), 0.97);
    }
}
