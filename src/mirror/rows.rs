//! Normalized rows, one struct per mirrored table.

use serde::Serialize;
use sqlx::Sqlite;
use sqlx::query_builder::Separated;
use zywrap_schema::BlockType;

use super::keys::RowKey;
use super::table::{self, TableSpec};

/// A row that can be written into its mirrored table.
pub trait MirrorRow: Send + Sync {
    const TABLE: TableSpec;

    fn key(&self) -> RowKey;

    /// Binds every column of [`Self::TABLE`] in declaration order.
    fn push_columns<'args>(&self, row: &mut Separated<'_, 'args, Sqlite, &'static str>);
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CategoryRow {
    pub code: String,
    pub name: String,
    pub ordering: i64,
}

impl MirrorRow for CategoryRow {
    const TABLE: TableSpec = table::CATEGORIES;

    fn key(&self) -> RowKey {
        RowKey::simple(self.code.clone())
    }

    fn push_columns<'args>(&self, row: &mut Separated<'_, 'args, Sqlite, &'static str>) {
        row.push_bind(self.code.clone())
            .push_bind(self.name.clone())
            .push_bind(self.ordering);
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LanguageRow {
    pub code: String,
    pub name: String,
    pub ordering: i64,
}

impl MirrorRow for LanguageRow {
    const TABLE: TableSpec = table::LANGUAGES;

    fn key(&self) -> RowKey {
        RowKey::simple(self.code.clone())
    }

    fn push_columns<'args>(&self, row: &mut Separated<'_, 'args, Sqlite, &'static str>) {
        row.push_bind(self.code.clone())
            .push_bind(self.name.clone())
            .push_bind(self.ordering);
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AiModelRow {
    pub code: String,
    pub name: String,
    pub provider_id: Option<String>,
    pub ordering: i64,
}

impl MirrorRow for AiModelRow {
    const TABLE: TableSpec = table::AI_MODELS;

    fn key(&self) -> RowKey {
        RowKey::simple(self.code.clone())
    }

    fn push_columns<'args>(&self, row: &mut Separated<'_, 'args, Sqlite, &'static str>) {
        row.push_bind(self.code.clone())
            .push_bind(self.name.clone())
            .push_bind(self.provider_id.clone())
            .push_bind(self.ordering);
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BlockTemplateRow {
    pub block_type: BlockType,
    pub code: String,
    pub name: String,
}

impl MirrorRow for BlockTemplateRow {
    const TABLE: TableSpec = table::BLOCK_TEMPLATES;

    fn key(&self) -> RowKey {
        RowKey::compound([self.block_type.as_str(), self.code.as_str()])
    }

    fn push_columns<'args>(&self, row: &mut Separated<'_, 'args, Sqlite, &'static str>) {
        row.push_bind(self.block_type.as_str())
            .push_bind(self.code.clone())
            .push_bind(self.name.clone());
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WrapperRow {
    pub code: String,
    pub name: String,
    pub description: Option<String>,
    pub category_code: Option<String>,
    pub featured: bool,
    pub base: bool,
    pub ordering: i64,
}

impl MirrorRow for WrapperRow {
    const TABLE: TableSpec = table::WRAPPERS;

    fn key(&self) -> RowKey {
        RowKey::simple(self.code.clone())
    }

    fn push_columns<'args>(&self, row: &mut Separated<'_, 'args, Sqlite, &'static str>) {
        row.push_bind(self.code.clone())
            .push_bind(self.name.clone())
            .push_bind(self.description.clone())
            .push_bind(self.category_code.clone())
            .push_bind(self.featured)
            .push_bind(self.base)
            .push_bind(self.ordering);
    }
}
