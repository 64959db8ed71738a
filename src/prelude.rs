//!
//! globally-available parts
//!
pub use crate::builder::{prefix_matcher, read_matcher, repeats_matcher, suffix_matcher};
pub use crate::common::{ni, sequence_to_string, Sequence, StateId};
pub use crate::error::{HmmError, Result};
pub use crate::model::Model;
pub use crate::params::{BakeConfig, DecodeParams};
pub use crate::path::{Path, PathStep};
pub use crate::prob::{lp, p, Prob};
pub use crate::state::{EmissionTable, State};
pub use crate::submodel::SubModel;
