pub mod point;
pub mod similarity;

pub use point::*;
pub use similarity::{
    apply, estimate, SequenceRole, SimilarityError, SimilarityParameters, DEGENERATE_TOLERANCE,
};
