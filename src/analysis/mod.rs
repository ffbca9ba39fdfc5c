pub mod metrics;
pub mod selftest;

pub use metrics::*;
pub use selftest::*;
