pub mod library;
pub mod loader;
pub mod synthetic;

pub use library::*;
pub use loader::*;
