//! Raw specification document as it appears on disk.
//!
//! Required fields are optional here so validation can report every missing
//! field in a fixed order instead of stopping at the first serde error.

use crate::spec::schema::RouteSpec;
use serde::Deserialize;
use std::collections::BTreeMap;

#[derive(Debug, Deserialize, Default, Clone)]
#[serde(rename_all = "camelCase")]
pub struct SpecDocument {
    #[serde(default)]
    pub format_version: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub metadata: Option<BTreeMap<String, serde_json::Value>>,
    #[serde(default)]
    pub shell: Option<ShellDocument>,
    #[serde(default)]
    pub remotes: Vec<RemoteDocument>,
    #[serde(default)]
    pub apis: Vec<ApiDocument>,
}

#[derive(Debug, Deserialize, Default, Clone)]
#[serde(rename_all = "camelCase")]
pub struct ShellDocument {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub port: Option<u16>,
    #[serde(default)]
    pub theme: Option<String>,
}

#[derive(Debug, Deserialize, Default, Clone)]
#[serde(rename_all = "camelCase")]
pub struct RemoteDocument {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub port: Option<u16>,
    #[serde(default, alias = "exposedUnits")]
    pub exposed_components: Vec<String>,
    #[serde(default)]
    pub dependencies: Vec<String>,
    #[serde(default)]
    pub routes: Vec<RouteSpec>,
}

#[derive(Debug, Deserialize, Default, Clone)]
#[serde(rename_all = "camelCase")]
pub struct ApiDocument {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub port: Option<u16>,
    #[serde(default)]
    pub database: Option<String>,
    #[serde(default, alias = "specRef")]
    pub spec: Option<String>,
    #[serde(default)]
    pub routes: Vec<RouteSpec>,
}
