use super::keys::PrimaryKey;

/// Static description of one mirrored table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TableSpec {
    pub name: &'static str,
    /// Insert column order; rows bind their values in this order.
    pub columns: &'static [&'static str],
    pub primary_key: PrimaryKey,
}

impl TableSpec {
    /// Columns overwritten on conflict.
    pub fn update_columns(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.columns
            .iter()
            .copied()
            .filter(|c| !self.primary_key.contains(c))
    }

    pub fn column_list(&self) -> String {
        self.columns
            .iter()
            .map(|c| quote_ident(c))
            .collect::<Vec<_>>()
            .join(", ")
    }

    pub fn key_column_list(&self) -> String {
        self.primary_key
            .columns()
            .iter()
            .map(|c| quote_ident(c))
            .collect::<Vec<_>>()
            .join(", ")
    }
}

pub(crate) fn quote_ident(ident: &str) -> String {
    format!("\"{}\"", ident.replace('"', "\"\""))
}

pub const CATEGORIES: TableSpec = TableSpec {
    name: "categories",
    columns: &["code", "name", "ordering"],
    primary_key: PrimaryKey::Simple("code"),
};

pub const LANGUAGES: TableSpec = TableSpec {
    name: "languages",
    columns: &["code", "name", "ordering"],
    primary_key: PrimaryKey::Simple("code"),
};

pub const AI_MODELS: TableSpec = TableSpec {
    name: "ai_models",
    columns: &["code", "name", "provider_id", "ordering"],
    primary_key: PrimaryKey::Simple("code"),
};

pub const BLOCK_TEMPLATES: TableSpec = TableSpec {
    name: "block_templates",
    columns: &["type", "code", "name"],
    primary_key: PrimaryKey::Compound(&["type", "code"]),
};

pub const WRAPPERS: TableSpec = TableSpec {
    name: "wrappers",
    columns: &[
        "code",
        "name",
        "description",
        "category_code",
        "featured",
        "base",
        "ordering",
    ],
    primary_key: PrimaryKey::Simple("code"),
};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn update_columns_skip_every_key_column() {
        let cols: Vec<_> = BLOCK_TEMPLATES.update_columns().collect();
        assert_eq!(cols, ["name"]);

        let cols: Vec<_> = WRAPPERS.update_columns().collect();
        assert_eq!(cols.len(), WRAPPERS.columns.len() - 1);
        assert!(!cols.contains(&"code"));
    }

    #[test]
    fn identifiers_are_quoted() {
        assert_eq!(BLOCK_TEMPLATES.column_list(), r#""type", "code", "name""#);
        assert_eq!(BLOCK_TEMPLATES.key_column_list(), r#""type", "code""#);
    }
}
