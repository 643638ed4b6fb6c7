//! Utility modules

pub mod format;
pub mod memory_api;
pub mod validation;

pub use format::*;
pub use memory_api::*;
pub use validation::*;
