pub mod overlay;
pub mod report;

pub use overlay::*;
pub use report::*;
