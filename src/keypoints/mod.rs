pub mod correspondence;
pub mod keypoint;

pub use correspondence::*;
pub use keypoint::*;
