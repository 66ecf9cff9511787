use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::RecordSet;

/// Catalog entities in either payload shape.
///
/// The same structure is used for the `metadata` section of a delta patch and
/// for the JSON document inside the downloadable bundle.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CatalogPayload {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub categories: Option<RecordSet>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub languages: Option<RecordSet>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ai_models: Option<RecordSet>,
    /// `type -> RecordSet`; kept raw so an unknown type or a bad shape is
    /// reported per template family instead of failing the whole document.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub templates: Option<Map<String, Value>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub wrappers: Option<RecordSet>,
    /// Wrapper upserts nested in delta metadata by newer API revisions.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub upserts: Option<RecordSet>,
    #[serde(
        default,
        deserialize_with = "crate::lenient::opt_string",
        skip_serializing_if = "Option::is_none"
    )]
    pub version: Option<String>,
}

/// The `zywrap-data.json` document shipped inside the bundle archive.
pub type BundleDocument = CatalogPayload;
