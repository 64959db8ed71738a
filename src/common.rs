//!
//! globally-available type aliases and short-hands
//!
pub use petgraph::graph::NodeIndex;

/// Type of DNA sequence
pub type Sequence = Vec<u8>;

/// Index of a state inside a sub-model arena.
/// Stable over topology sorting (only the ordering changes).
pub type StateId = usize;

/// Convert Sequence(Vec<u8>) into &str
/// useful in displaying
pub fn sequence_to_string(seq: &[u8]) -> &str {
    std::str::from_utf8(seq).unwrap()
}

///
/// short-hand of `NodeIndex::new`
///
pub fn ni(index: usize) -> NodeIndex {
    NodeIndex::new(index)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sequence_displays_as_str() {
        let seq: Sequence = b"ACGT".to_vec();
        assert_eq!(sequence_to_string(&seq), "ACGT");
        assert_eq!(sequence_to_string(b""), "");
    }

    #[test]
    fn node_index_shorthand() {
        assert_eq!(ni(3).index(), 3);
    }
}
