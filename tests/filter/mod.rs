//! Filter tests against the fixture schemas.

pub mod custom_operators;
pub mod rfc_examples;
