//! Resource validation tests.

pub mod presence;
pub mod resources;
