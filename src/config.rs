//! Service provider capabilities that change how requests are validated.
//!
//! The layout follows the `ServiceProviderConfig` resource of RFC 7643 §5, so a
//! host can load it from the same JSON document it serves:
//!
//! ```rust
//! use scim_core::config::ServiceConfig;
//! use serde_json::json;
//!
//! let config = ServiceConfig::from_json(json!({
//!     "patch": {"supported": true},
//!     "filter": {"supported": true, "maxResults": 50},
//!     "sort": {"supported": false}
//! }))
//! .unwrap();
//! assert_eq!(config.filter.max_results, 50);
//! assert!(!config.sort.supported);
//! ```

use crate::error::ScimResult;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Default value of `filter.maxResults`.
pub const DEFAULT_MAX_RESULTS: usize = 200;

/// Capabilities consumed by query-parameter parsing and PATCH validation.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServiceConfig {
    #[serde(default)]
    pub filter: FilterConfig,
    #[serde(default)]
    pub sort: SortConfig,
    #[serde(default)]
    pub patch: PatchConfig,
}

/// The `filter` capability.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FilterConfig {
    /// Whether the `filter` query parameter is accepted
    #[serde(default = "enabled")]
    pub supported: bool,

    /// Upper bound of the `count` query parameter
    #[serde(default = "default_max_results")]
    pub max_results: usize,
}

impl Default for FilterConfig {
    fn default() -> Self {
        Self {
            supported: true,
            max_results: DEFAULT_MAX_RESULTS,
        }
    }
}

/// The `sort` capability.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SortConfig {
    #[serde(default = "enabled")]
    pub supported: bool,
}

impl Default for SortConfig {
    fn default() -> Self {
        Self { supported: true }
    }
}

/// The `patch` capability.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PatchConfig {
    #[serde(default = "enabled")]
    pub supported: bool,
}

impl Default for PatchConfig {
    fn default() -> Self {
        Self { supported: true }
    }
}

fn enabled() -> bool {
    true
}

fn default_max_results() -> usize {
    DEFAULT_MAX_RESULTS
}

impl ServiceConfig {
    /// Load the configuration from a JSON document. Missing capabilities keep
    /// their defaults; unknown members are ignored.
    pub fn from_json(value: Value) -> ScimResult<Self> {
        Ok(serde_json::from_value(value)?)
    }

    /// Load the configuration from JSON text.
    pub fn from_json_str(text: &str) -> ScimResult<Self> {
        Ok(serde_json::from_str(text)?)
    }

    pub fn with_filter(mut self, supported: bool, max_results: usize) -> Self {
        self.filter = FilterConfig {
            supported,
            max_results,
        };
        self
    }

    pub fn with_sort(mut self, supported: bool) -> Self {
        self.sort.supported = supported;
        self
    }

    pub fn with_patch(mut self, supported: bool) -> Self {
        self.patch.supported = supported;
        self
    }
}
