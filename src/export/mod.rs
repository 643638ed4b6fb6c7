//! Export data model consumed by report renderers

pub mod builder;
pub mod records;

pub use builder::*;
pub use records::*;
