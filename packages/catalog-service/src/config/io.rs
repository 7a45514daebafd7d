//! YAML file schema
//!
//! Every field except `version` is optional; absent fields keep the value
//! from the layer below.

use serde::{Deserialize, Serialize};

/// YAML Schema v1
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ConfigFileV1 {
    /// Schema version (always 1 for v1)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub version: Option<u32>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub app_name: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub environment: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub log_level: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_prefix: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub bind_addr: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub database_url: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub default_page_size: Option<usize>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_page_size: Option<usize>,
}
