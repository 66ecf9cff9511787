use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::{CatalogPayload, RecordSet};

/// Synchronization mode announced by the update-check endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(from = "String", into = "String")]
pub enum SyncMode {
    FullReset,
    DeltaUpdate,
    NoChanges,
    /// Anything else. Never applied as either known mode.
    Unknown(String),
}

impl Default for SyncMode {
    fn default() -> Self {
        SyncMode::Unknown("UNKNOWN".to_string())
    }
}

impl SyncMode {
    pub fn as_str(&self) -> &str {
        match self {
            SyncMode::FullReset => "FULL_RESET",
            SyncMode::DeltaUpdate => "DELTA_UPDATE",
            SyncMode::NoChanges => "NO_CHANGES",
            SyncMode::Unknown(raw) => raw.as_str(),
        }
    }
}

impl From<String> for SyncMode {
    fn from(raw: String) -> Self {
        match raw.as_str() {
            "FULL_RESET" => SyncMode::FullReset,
            "DELTA_UPDATE" => SyncMode::DeltaUpdate,
            "NO_CHANGES" | "UP_TO_DATE" | "NONE" => SyncMode::NoChanges,
            _ => SyncMode::Unknown(raw),
        }
    }
}

impl From<SyncMode> for String {
    fn from(mode: SyncMode) -> Self {
        match mode {
            SyncMode::Unknown(raw) => raw,
            known => known.as_str().to_string(),
        }
    }
}

impl fmt::Display for SyncMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Response of `GET /v1/sdk/export/updates?fromVersion=...`.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateCheck {
    #[serde(default)]
    pub mode: SyncMode,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub wrappers: Option<WrappersSection>,
    #[serde(default, alias = "updates", skip_serializing_if = "Option::is_none")]
    pub metadata: Option<CatalogPayload>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub deletions: Vec<Deletion>,
    #[serde(
        default,
        deserialize_with = "crate::lenient::opt_string",
        skip_serializing_if = "Option::is_none"
    )]
    pub new_version: Option<String>,
}

/// The `wrappers` object of an update check.
///
/// A full reset fills `download_url`/`version`; a delta fills
/// `upserts`/`deletes`.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WrappersSection {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub download_url: Option<String>,
    #[serde(
        default,
        deserialize_with = "crate::lenient::opt_string",
        skip_serializing_if = "Option::is_none"
    )]
    pub version: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub upserts: Option<RecordSet>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub deletes: Vec<String>,
}

/// One explicit deletion of a delta patch.
///
/// `kind` stays a raw string on the wire so an unexpected tag is reported
/// as a malformed record rather than a decode failure of the whole patch.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Deletion {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(deserialize_with = "crate::lenient::string")]
    pub code: String,
    /// Required when `kind` is `BlockTemplate`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub block_type: Option<String>,
}

/// Exact entity tags accepted in `deletions[].type`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DeletionKind {
    Wrapper,
    Category,
    Language,
    AiModel,
    BlockTemplate,
}

impl DeletionKind {
    pub fn as_str(self) -> &'static str {
        match self {
            DeletionKind::Wrapper => "Wrapper",
            DeletionKind::Category => "Category",
            DeletionKind::Language => "Language",
            DeletionKind::AiModel => "AIModel",
            DeletionKind::BlockTemplate => "BlockTemplate",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownDeletionKind(pub String);

impl fmt::Display for UnknownDeletionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown deletion type `{}`", self.0)
    }
}

impl std::error::Error for UnknownDeletionKind {}

impl FromStr for DeletionKind {
    type Err = UnknownDeletionKind;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        [
            DeletionKind::Wrapper,
            DeletionKind::Category,
            DeletionKind::Language,
            DeletionKind::AiModel,
            DeletionKind::BlockTemplate,
        ]
        .into_iter()
        .find(|k| k.as_str() == s)
        .ok_or_else(|| UnknownDeletionKind(s.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn decodes_full_reset_check() {
        let check: UpdateCheck = serde_json::from_value(json!({
            "mode": "FULL_RESET",
            "wrappers": {"downloadUrl": "https://example.test/bundle", "version": "v9"}
        }))
        .unwrap();
        assert_eq!(check.mode, SyncMode::FullReset);
        let wrappers = check.wrappers.unwrap();
        assert_eq!(wrappers.download_url.as_deref(), Some("https://example.test/bundle"));
        assert_eq!(wrappers.version.as_deref(), Some("v9"));
    }

    #[test]
    fn unknown_mode_is_preserved_verbatim() {
        let check: UpdateCheck = serde_json::from_value(json!({"mode": "MAINTENANCE"})).unwrap();
        assert_eq!(check.mode, SyncMode::Unknown("MAINTENANCE".to_string()));
        assert_eq!(String::from(check.mode), "MAINTENANCE");
    }

    #[test]
    fn missing_mode_is_unknown() {
        let check: UpdateCheck = serde_json::from_value(json!({})).unwrap();
        assert!(matches!(check.mode, SyncMode::Unknown(_)));
    }

    #[test]
    fn updates_is_an_alias_for_metadata() {
        let check: UpdateCheck = serde_json::from_value(json!({
            "mode": "DELTA_UPDATE",
            "updates": {"categories": [{"code": "a", "name": "A", "ordering": 1}]},
            "deletions": [{"type": "BlockTemplate", "code": "formal", "blockType": "tone"}],
            "newVersion": "v2"
        }))
        .unwrap();
        assert!(check.metadata.unwrap().categories.is_some());
        assert_eq!(check.deletions[0].block_type.as_deref(), Some("tone"));
        assert_eq!(check.new_version.as_deref(), Some("v2"));
    }

    #[test]
    fn numeric_codes_and_versions_decode_as_text() {
        let check: UpdateCheck = serde_json::from_value(json!({
            "mode": "DELTA_UPDATE",
            "deletions": [{"type": "Wrapper", "code": 42}],
            "newVersion": 7
        }))
        .unwrap();
        assert_eq!(check.deletions[0].code, "42");
        assert_eq!(check.new_version.as_deref(), Some("7"));

        let check: UpdateCheck = serde_json::from_value(json!({
            "mode": "FULL_RESET",
            "wrappers": {"version": 20240501}
        }))
        .unwrap();
        assert_eq!(check.wrappers.unwrap().version.as_deref(), Some("20240501"));

        let bundle: crate::BundleDocument =
            serde_json::from_value(json!({"categories": [], "version": 3})).unwrap();
        assert_eq!(bundle.version.as_deref(), Some("3"));
    }

    #[test]
    fn deletion_code_must_be_scalar() {
        let decoded = serde_json::from_value::<Deletion>(json!({"type": "Wrapper", "code": ["a"]}));
        assert!(decoded.is_err());
    }

    #[test]
    fn deletion_tags_match_exactly() {
        assert_eq!("AIModel".parse::<DeletionKind>(), Ok(DeletionKind::AiModel));
        assert!("BlockTemplateTone".parse::<DeletionKind>().is_err());
        assert!("category".parse::<DeletionKind>().is_err());
    }
}
