//! Upstream payments API shapes and their normalization

pub mod normalize;
pub mod objects;

pub use normalize::timestamp_to_datetime;
pub use objects::*;
