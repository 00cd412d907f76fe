//! scim-core integration test suite
//!
//! ## Test Organization
//!
//! - `validation/` - Resource validation against the fixture schemas
//!   - `resources` - Whole-resource validation, projection and error bodies
//!   - `presence` - The presence rule across directions and inclusion lists
//! - `filter/` - Filter parsing, serialization and evaluation on RFC payloads
//! - `patch/` - PATCH paths and PATCH request validation
//! - `query/` - Query parameters, pagination and sorting
//! - `properties/` - Property tests (round trips, case-insensitivity)
//!
//! ## Test Utilities
//!
//! - `common/` - User, Group and Enterprise User schemas plus sample payloads
//!
//! ## Usage
//!
//! ```bash
//! cargo test
//! RUST_LOG=scim_core=debug cargo test -- --nocapture
//! ```

pub mod common;
pub mod filter;
pub mod patch;
pub mod properties;
pub mod query;
pub mod validation;
