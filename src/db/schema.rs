//! SQL DDL for initializing the database schema.
//! SQLite-first design; can be adapted for other RDBMS.

/// SQLite schema includes:
/// - mirrored catalog tables (`categories`, `languages`, `ai_models`,
///   `block_templates`, `wrappers`), keyed exactly like the remote catalog
/// - `settings` (holds the `data_version` cursor)
/// - `sync_runs` (journal of committed sync passes)
pub const SQLITE_INIT: &str = r#"
-- ---------------------------------------------------------------------------
-- Mirrored catalog
-- ---------------------------------------------------------------------------
CREATE TABLE IF NOT EXISTS categories (
    code TEXT PRIMARY KEY NOT NULL,
    name TEXT NOT NULL,
    ordering INTEGER NOT NULL
);

CREATE TABLE IF NOT EXISTS languages (
    code TEXT PRIMARY KEY NOT NULL,
    name TEXT NOT NULL,
    ordering INTEGER NOT NULL
);

CREATE TABLE IF NOT EXISTS ai_models (
    code TEXT PRIMARY KEY NOT NULL,
    name TEXT NOT NULL,
    provider_id TEXT NULL,
    ordering INTEGER NOT NULL
);

CREATE TABLE IF NOT EXISTS block_templates (
    type TEXT NOT NULL,
    code TEXT NOT NULL,
    name TEXT NOT NULL,
    PRIMARY KEY (type, code)
);

CREATE TABLE IF NOT EXISTS wrappers (
    code TEXT PRIMARY KEY NOT NULL,
    name TEXT NOT NULL,
    description TEXT NULL,
    category_code TEXT NULL REFERENCES categories(code),
    featured INTEGER NOT NULL DEFAULT 0,
    base INTEGER NOT NULL DEFAULT 0,
    ordering INTEGER NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_wrappers_category ON wrappers(category_code, ordering);

-- ---------------------------------------------------------------------------
-- Sync bookkeeping
-- ---------------------------------------------------------------------------
CREATE TABLE IF NOT EXISTS settings (
    setting_key TEXT PRIMARY KEY NOT NULL,
    setting_value TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS sync_runs (
    run_id TEXT PRIMARY KEY NOT NULL,
    mode TEXT NOT NULL,
    from_version TEXT NULL,
    to_version TEXT NULL,
    upserted INTEGER NOT NULL DEFAULT 0,
    deleted INTEGER NOT NULL DEFAULT 0,
    started_at TEXT NOT NULL, -- RFC3339
    finished_at TEXT NULL -- RFC3339
);
"#;
