//!
//! Bake/decode configuration structs
//!
use serde::{Deserialize, Serialize};

///
/// Options of `Model::bake_with`.
///
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BakeConfig {
    ///
    /// Expected read length, used only to pre-size decoding buffers.
    ///
    pub read_length: Option<usize>,
    ///
    /// Order states by raw name instead of the canonical profile order.
    /// Meant for visualization; decoders stay correct because silent
    /// relaxation is iterated.
    ///
    pub sort_by_name: bool,
}

impl Default for BakeConfig {
    fn default() -> BakeConfig {
        BakeConfig {
            read_length: None,
            sort_by_name: false,
        }
    }
}

///
/// Options of `Model::viterbi_with`.
///
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DecodeParams {
    ///
    /// Relaxation passes over the repeat band per input column.
    ///
    /// Silent delete chains inside a repeat copy span several states;
    /// two ordered passes let a value cross one whole copy within a
    /// single column. Deeper chains may need more.
    ///
    pub n_repeat_band_passes: usize,
}

impl Default for DecodeParams {
    fn default() -> DecodeParams {
        DecodeParams {
            n_repeat_band_passes: 2,
        }
    }
}
