//! Row codec: turns remote payloads into normalized table rows.
//!
//! Every entity arrives as a [`RecordSet`], either an ordered list of records
//! that carry their own key or a mapping `code -> attributes`. Mapping
//! entries get their `ordering` from their 1-based position in document
//! order; list records without an `ordering` get the same treatment. If the
//! API reorders a mapping between calls the synthesized orderings follow.
//!
//! One malformed record fails the whole entity, so no partial row set ever
//! reaches the apply engines.

mod lax;

use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};
use std::collections::HashSet;
use zywrap_schema::{
    BlockType, CatalogPayload, Deletion, DeletionKind, RecordSet, UpdateCheck,
};

use crate::error::SyncError;
use crate::mirror::table::{self, TableSpec};
use crate::mirror::{
    AiModelRow, BlockTemplateRow, CategoryRow, LanguageRow, MirrorRow, RowKey, WrapperRow,
};

/// Every mirrored entity of one payload, normalized.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CatalogRows {
    pub categories: Vec<CategoryRow>,
    pub languages: Vec<LanguageRow>,
    pub ai_models: Vec<AiModelRow>,
    pub block_templates: Vec<BlockTemplateRow>,
    pub wrappers: Vec<WrapperRow>,
    /// Tables whose entity was missing from a bundle. A full reset leaves
    /// them alone instead of mirroring them onto an empty set.
    pub absent: Vec<&'static str>,
}

impl CatalogRows {
    /// Normalizes a bundle document (or delta metadata).
    pub fn from_payload(payload: &CatalogPayload) -> Result<Self, SyncError> {
        let wrapper_sets = [payload.wrappers.as_ref(), payload.upserts.as_ref()];
        let presence = [
            (table::CATEGORIES.name, payload.categories.is_some()),
            (table::LANGUAGES.name, payload.languages.is_some()),
            (table::AI_MODELS.name, payload.ai_models.is_some()),
            (table::BLOCK_TEMPLATES.name, payload.templates.is_some()),
            (table::WRAPPERS.name, wrapper_sets.iter().any(Option::is_some)),
        ];
        Ok(Self {
            categories: categories(payload.categories.as_ref())?,
            languages: languages(payload.languages.as_ref())?,
            ai_models: ai_models(payload.ai_models.as_ref())?,
            block_templates: block_templates(payload.templates.as_ref())?,
            wrappers: merged_wrappers(&wrapper_sets)?,
            absent: presence
                .into_iter()
                .filter_map(|(name, present)| (!present).then_some(name))
                .collect(),
        })
    }

    /// Normalizes the upsert side of a delta patch: `metadata` plus
    /// `wrappers.upserts`.
    pub fn from_delta(check: &UpdateCheck) -> Result<Self, SyncError> {
        let empty = CatalogPayload::default();
        let metadata = check.metadata.as_ref().unwrap_or(&empty);
        let wrapper_sets = [
            metadata.wrappers.as_ref(),
            metadata.upserts.as_ref(),
            check.wrappers.as_ref().and_then(|w| w.upserts.as_ref()),
        ];
        Ok(Self {
            categories: categories(metadata.categories.as_ref())?,
            languages: languages(metadata.languages.as_ref())?,
            ai_models: ai_models(metadata.ai_models.as_ref())?,
            block_templates: block_templates(metadata.templates.as_ref())?,
            wrappers: merged_wrappers(&wrapper_sets)?,
            absent: Vec::new(),
        })
    }

    pub fn is_absent(&self, table: &str) -> bool {
        self.absent.iter().any(|t| *t == table)
    }

    pub fn len(&self) -> usize {
        self.categories.len()
            + self.languages.len()
            + self.ai_models.len()
            + self.block_templates.len()
            + self.wrappers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// `{name}` objects, `{label}` objects or a bare string.
#[derive(Deserialize)]
#[serde(untagged)]
enum NamedValue {
    Plain(String),
    Object {
        #[serde(alias = "label")]
        name: String,
    },
}

impl NamedValue {
    fn into_name(self) -> String {
        match self {
            NamedValue::Plain(name) | NamedValue::Object { name } => name,
        }
    }
}

#[derive(Deserialize)]
struct ListNamed {
    #[serde(deserialize_with = "lax::string")]
    code: String,
    name: String,
    #[serde(default, deserialize_with = "lax::opt_i64")]
    ordering: Option<i64>,
}

#[derive(Deserialize)]
struct ListAiModel {
    #[serde(deserialize_with = "lax::string")]
    code: String,
    name: String,
    #[serde(default, alias = "providerId", deserialize_with = "lax::opt_string")]
    provider_id: Option<String>,
    #[serde(default, deserialize_with = "lax::opt_i64")]
    ordering: Option<i64>,
}

#[derive(Deserialize)]
struct MapAiModel {
    name: String,
    #[serde(
        rename = "provId",
        alias = "providerId",
        alias = "provider_id",
        default,
        deserialize_with = "lax::opt_string"
    )]
    prov_id: Option<String>,
    #[serde(default, deserialize_with = "lax::opt_i64")]
    ordering: Option<i64>,
}

#[derive(Deserialize)]
struct ListTemplate {
    #[serde(deserialize_with = "lax::string")]
    code: String,
    #[serde(default)]
    label: Option<String>,
    #[serde(default)]
    name: Option<String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct ListWrapper {
    #[serde(deserialize_with = "lax::string")]
    code: String,
    name: String,
    #[serde(default, deserialize_with = "lax::opt_string")]
    description: Option<String>,
    #[serde(default, alias = "category_code", deserialize_with = "lax::opt_string")]
    category_code: Option<String>,
    #[serde(default, deserialize_with = "lax::flag")]
    featured: bool,
    #[serde(default, deserialize_with = "lax::flag")]
    base: bool,
    #[serde(default, deserialize_with = "lax::opt_i64")]
    ordering: Option<i64>,
}

#[derive(Deserialize)]
struct MapWrapper {
    name: String,
    #[serde(default, alias = "description", deserialize_with = "lax::opt_string")]
    desc: Option<String>,
    #[serde(default, alias = "categoryCode", deserialize_with = "lax::opt_string")]
    cat: Option<String>,
    #[serde(default, deserialize_with = "lax::flag")]
    featured: bool,
    #[serde(default, deserialize_with = "lax::flag")]
    base: bool,
    #[serde(default, deserialize_with = "lax::opt_i64")]
    ordering: Option<i64>,
}

pub fn categories(set: Option<&RecordSet>) -> Result<Vec<CategoryRow>, SyncError> {
    normalize(
        "categories",
        set,
        |r: ListNamed, pos| {
            Ok(CategoryRow {
                code: r.code,
                name: r.name,
                ordering: r.ordering.unwrap_or(pos),
            })
        },
        |code, v: NamedValue, pos| {
            Ok(CategoryRow {
                code,
                name: v.into_name(),
                ordering: pos,
            })
        },
    )
}

pub fn languages(set: Option<&RecordSet>) -> Result<Vec<LanguageRow>, SyncError> {
    normalize(
        "languages",
        set,
        |r: ListNamed, pos| {
            Ok(LanguageRow {
                code: r.code,
                name: r.name,
                ordering: r.ordering.unwrap_or(pos),
            })
        },
        |code, v: NamedValue, pos| {
            Ok(LanguageRow {
                code,
                name: v.into_name(),
                ordering: pos,
            })
        },
    )
}

pub fn ai_models(set: Option<&RecordSet>) -> Result<Vec<AiModelRow>, SyncError> {
    normalize(
        "aiModels",
        set,
        |r: ListAiModel, pos| {
            Ok(AiModelRow {
                code: r.code,
                name: r.name,
                provider_id: r.provider_id,
                ordering: r.ordering.unwrap_or(pos),
            })
        },
        |code, m: MapAiModel, pos| {
            Ok(AiModelRow {
                code,
                name: m.name,
                provider_id: m.prov_id,
                ordering: m.ordering.unwrap_or(pos),
            })
        },
    )
}

/// `templates` is `type -> RecordSet`; the type must be a known [`BlockType`].
pub fn block_templates(
    templates: Option<&Map<String, Value>>,
) -> Result<Vec<BlockTemplateRow>, SyncError> {
    const ENTITY: &str = "templates";
    let Some(templates) = templates else {
        return Ok(Vec::new());
    };

    let mut rows = Vec::new();
    for (raw_type, raw_set) in templates {
        let block_type: BlockType = raw_type
            .parse()
            .map_err(|e: zywrap_schema::UnknownBlockType| SyncError::malformed(ENTITY, e.to_string()))?;
        if raw_set.is_null() {
            continue;
        }
        let set = RecordSet::deserialize(raw_set).map_err(|_| {
            SyncError::malformed(
                ENTITY,
                format!("`{raw_type}` is neither a list nor a mapping"),
            )
        })?;

        rows.extend(normalize(
            ENTITY,
            Some(&set),
            |r: ListTemplate, _| {
                let name = r
                    .label
                    .or(r.name)
                    .ok_or_else(|| format!("`{}` has neither label nor name", r.code))?;
                Ok(BlockTemplateRow {
                    block_type,
                    code: r.code,
                    name,
                })
            },
            |code, v: NamedValue, _| {
                Ok(BlockTemplateRow {
                    block_type,
                    code,
                    name: v.into_name(),
                })
            },
        )?);
    }
    Ok(rows)
}

pub fn wrappers(set: Option<&RecordSet>) -> Result<Vec<WrapperRow>, SyncError> {
    normalize(
        "wrappers",
        set,
        |r: ListWrapper, pos| {
            Ok(WrapperRow {
                code: r.code,
                name: r.name,
                description: r.description,
                category_code: r.category_code,
                featured: r.featured,
                base: r.base,
                ordering: r.ordering.unwrap_or(pos),
            })
        },
        |code, w: MapWrapper, pos| {
            Ok(WrapperRow {
                code,
                name: w.name,
                description: w.desc,
                category_code: w.cat,
                featured: w.featured,
                base: w.base,
                ordering: w.ordering.unwrap_or(pos),
            })
        },
    )
}

fn merged_wrappers(sets: &[Option<&RecordSet>]) -> Result<Vec<WrapperRow>, SyncError> {
    let mut rows = Vec::new();
    for set in sets.iter().flatten() {
        rows.extend(wrappers(Some(set))?);
    }
    ensure_keys("wrappers", &rows)?;
    Ok(rows)
}

fn normalize<L, M, R>(
    entity: &'static str,
    set: Option<&RecordSet>,
    from_list: impl Fn(L, i64) -> Result<R, String>,
    from_map: impl Fn(String, M, i64) -> Result<R, String>,
) -> Result<Vec<R>, SyncError>
where
    L: DeserializeOwned,
    M: DeserializeOwned,
    R: MirrorRow,
{
    let Some(set) = set else {
        return Ok(Vec::new());
    };

    let rows = match set {
        RecordSet::List(items) => items
            .iter()
            .enumerate()
            .map(|(idx, raw)| {
                let record = L::deserialize(raw).map_err(|e| {
                    SyncError::malformed(entity, format!("record #{}: {e}", idx + 1))
                })?;
                from_list(record, position(idx)).map_err(|e| SyncError::malformed(entity, e))
            })
            .collect::<Result<Vec<_>, _>>()?,
        RecordSet::Map(map) => map
            .iter()
            .enumerate()
            .map(|(idx, (code, raw))| {
                let attrs = M::deserialize(raw)
                    .map_err(|e| SyncError::malformed(entity, format!("`{code}`: {e}")))?;
                from_map(code.clone(), attrs, position(idx))
                    .map_err(|e| SyncError::malformed(entity, e))
            })
            .collect::<Result<Vec<_>, _>>()?,
    };

    ensure_keys(entity, &rows)?;
    Ok(rows)
}

fn position(idx: usize) -> i64 {
    i64::try_from(idx).map_or(i64::MAX, |i| i + 1)
}

/// Keys must be non-empty and unique within one authoritative set.
fn ensure_keys<R: MirrorRow>(entity: &'static str, rows: &[R]) -> Result<(), SyncError> {
    let mut seen = HashSet::with_capacity(rows.len());
    for row in rows {
        let key = row.key();
        if key.parts().iter().any(|p| p.trim().is_empty()) {
            return Err(SyncError::malformed(entity, format!("empty key `{key}`")));
        }
        if !seen.insert(key.clone()) {
            return Err(SyncError::malformed(entity, format!("duplicate key `{key}`")));
        }
    }
    Ok(())
}

/// Explicit deletions of a delta patch, grouped per table.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DeletionPlan {
    pub wrappers: Vec<RowKey>,
    pub block_templates: Vec<RowKey>,
    pub ai_models: Vec<RowKey>,
    pub languages: Vec<RowKey>,
    pub categories: Vec<RowKey>,
}

impl DeletionPlan {
    /// Dependents before parents: wrappers reference categories.
    pub fn in_apply_order(&self) -> [(TableSpec, &[RowKey]); 5] {
        [
            (table::WRAPPERS, self.wrappers.as_slice()),
            (table::BLOCK_TEMPLATES, self.block_templates.as_slice()),
            (table::AI_MODELS, self.ai_models.as_slice()),
            (table::LANGUAGES, self.languages.as_slice()),
            (table::CATEGORIES, self.categories.as_slice()),
        ]
    }

    pub fn len(&self) -> usize {
        self.in_apply_order().iter().map(|(_, keys)| keys.len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Dispatches `deletions[]` by exact entity tag, plus the legacy
/// `wrappers.deletes` code list.
pub fn deletions(
    list: &[Deletion],
    legacy_wrapper_codes: &[String],
) -> Result<DeletionPlan, SyncError> {
    const ENTITY: &str = "deletions";
    let mut plan = DeletionPlan::default();
    let mut seen: HashSet<(DeletionKind, RowKey)> = HashSet::new();

    let legacy = legacy_wrapper_codes.iter().map(|code| Deletion {
        kind: DeletionKind::Wrapper.as_str().to_string(),
        code: code.clone(),
        block_type: None,
    });

    for entry in list.iter().cloned().chain(legacy) {
        if entry.code.trim().is_empty() {
            return Err(SyncError::malformed(ENTITY, "deletion without a code"));
        }
        let kind: DeletionKind = entry
            .kind
            .parse()
            .map_err(|e: zywrap_schema::UnknownDeletionKind| SyncError::malformed(ENTITY, e.to_string()))?;

        let key = match kind {
            DeletionKind::BlockTemplate => {
                let raw_type = entry.block_type.as_deref().ok_or_else(|| {
                    SyncError::malformed(
                        ENTITY,
                        format!("BlockTemplate `{}` without blockType", entry.code),
                    )
                })?;
                let block_type: BlockType = raw_type
                    .parse()
                    .map_err(|e: zywrap_schema::UnknownBlockType| SyncError::malformed(ENTITY, e.to_string()))?;
                RowKey::compound([block_type.as_str(), entry.code.as_str()])
            }
            _ => RowKey::simple(entry.code.clone()),
        };

        if !seen.insert((kind, key.clone())) {
            continue;
        }
        let bucket = match kind {
            DeletionKind::Wrapper => &mut plan.wrappers,
            DeletionKind::Category => &mut plan.categories,
            DeletionKind::Language => &mut plan.languages,
            DeletionKind::AiModel => &mut plan.ai_models,
            DeletionKind::BlockTemplate => &mut plan.block_templates,
        };
        bucket.push(key);
    }

    Ok(plan)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn set(value: Value) -> RecordSet {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn list_shape_keeps_explicit_ordering() {
        let rows = categories(Some(&set(json!([
            {"code": "b", "name": "B", "ordering": 7},
            {"code": "a", "name": "A", "ordering": 3}
        ]))))
        .unwrap();
        assert_eq!(rows[0].ordering, 7);
        assert_eq!(rows[1].ordering, 3);
    }

    #[test]
    fn map_shape_synthesizes_positional_ordering() {
        let rows = languages(Some(&set(json!({"fr": "French", "en": "English", "de": "German"}))))
            .unwrap();
        let got: Vec<(&str, i64)> = rows.iter().map(|r| (r.code.as_str(), r.ordering)).collect();
        assert_eq!(got, [("fr", 1), ("en", 2), ("de", 3)]);
    }

    #[test]
    fn ai_model_shapes_map_provider() {
        let list = ai_models(Some(&set(json!([
            {"code": "gpt", "name": "GPT", "provider_id": 3, "ordering": 1},
            {"code": "cl", "name": "Claude", "ordering": 2}
        ]))))
        .unwrap();
        assert_eq!(list[0].provider_id.as_deref(), Some("3"));
        assert_eq!(list[1].provider_id, None);

        let map = ai_models(Some(&set(json!({"gpt": {"name": "GPT", "provId": "openai"}})))).unwrap();
        assert_eq!(map[0].provider_id.as_deref(), Some("openai"));
        assert_eq!(map[0].ordering, 1);
    }

    #[test]
    fn wrapper_map_uses_short_attribute_names() {
        let rows = wrappers(Some(&set(json!({
            "w1": {"name": "One", "desc": "first", "cat": "legal", "featured": 1, "base": "0"},
            "w2": {"name": "Two"}
        }))))
        .unwrap();
        assert_eq!(
            rows[0],
            WrapperRow {
                code: "w1".into(),
                name: "One".into(),
                description: Some("first".into()),
                category_code: Some("legal".into()),
                featured: true,
                base: false,
                ordering: 1,
            }
        );
        assert_eq!(rows[1].category_code, None);
        assert!(!rows[1].featured);
        assert_eq!(rows[1].ordering, 2);
    }

    #[test]
    fn templates_accept_both_shapes_per_type() {
        let templates = json!({
            "tone": {"formal": "Formal", "casual": "Casual"},
            "style": [{"code": "formal", "label": "Formal style"}, {"code": "terse", "name": "Terse"}]
        });
        let rows = block_templates(templates.as_object()).unwrap();
        assert_eq!(rows.len(), 4);
        let keys: HashSet<RowKey> = rows.iter().map(MirrorRow::key).collect();
        assert!(keys.contains(&RowKey::compound(["tone", "formal"])));
        assert!(keys.contains(&RowKey::compound(["style", "formal"])));
        let style_formal = rows
            .iter()
            .find(|r| r.block_type == BlockType::Style && r.code == "formal")
            .unwrap();
        assert_eq!(style_formal.name, "Formal style");
    }

    #[test]
    fn unknown_template_type_is_malformed() {
        let templates = json!({"mood": {"happy": "Happy"}});
        let err = block_templates(templates.as_object()).unwrap_err();
        assert!(matches!(err, SyncError::MalformedRecord { entity: "templates", .. }));
    }

    #[test]
    fn one_bad_record_fails_the_entity() {
        let err = categories(Some(&set(json!([
            {"code": "ok", "name": "Ok", "ordering": 1},
            {"name": "missing code"}
        ]))))
        .unwrap_err();
        match err {
            SyncError::MalformedRecord { entity, reason } => {
                assert_eq!(entity, "categories");
                assert!(reason.contains("#2"), "{reason}");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn duplicate_keys_are_malformed() {
        let err = wrappers(Some(&set(json!([
            {"code": "w", "name": "A"},
            {"code": "w", "name": "B"}
        ]))))
        .unwrap_err();
        assert!(matches!(err, SyncError::MalformedRecord { entity: "wrappers", .. }));
    }

    #[test]
    fn absent_entities_normalize_to_nothing() {
        let rows = CatalogRows::from_payload(&CatalogPayload::default()).unwrap();
        assert!(rows.is_empty());
        assert_eq!(rows.absent.len(), 5);

        let payload: CatalogPayload =
            serde_json::from_value(json!({"languages": {}, "upserts": []})).unwrap();
        let rows = CatalogRows::from_payload(&payload).unwrap();
        assert!(!rows.is_absent("languages"));
        assert!(!rows.is_absent("wrappers"));
        assert!(rows.is_absent("categories"));
    }

    #[test]
    fn deletions_dispatch_by_exact_tag() {
        let list: Vec<Deletion> = serde_json::from_value(json!([
            {"type": "Category", "code": "legal"},
            {"type": "AIModel", "code": "gpt"},
            {"type": "BlockTemplate", "code": "formal", "blockType": "tone"},
            {"type": "Wrapper", "code": "w1"}
        ]))
        .unwrap();
        let plan = deletions(&list, &["w1".to_string(), "w2".to_string()]).unwrap();
        assert_eq!(plan.categories, [RowKey::simple("legal")]);
        assert_eq!(plan.ai_models, [RowKey::simple("gpt")]);
        assert_eq!(plan.block_templates, [RowKey::compound(["tone", "formal"])]);
        assert_eq!(plan.wrappers, [RowKey::simple("w1"), RowKey::simple("w2")]);
        assert_eq!(plan.len(), 5);
    }

    #[test]
    fn deletion_tags_are_not_substring_matched() {
        let list: Vec<Deletion> =
            serde_json::from_value(json!([{"type": "BlockTemplateTone", "code": "formal"}])).unwrap();
        assert!(deletions(&list, &[]).is_err());

        let list: Vec<Deletion> =
            serde_json::from_value(json!([{"type": "BlockTemplate", "code": "formal"}])).unwrap();
        assert!(deletions(&list, &[]).is_err(), "blockType is required");
    }
}
