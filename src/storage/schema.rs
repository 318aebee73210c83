//! Database schema definitions

/// SQL to create the key-value table backing the token store
pub const CREATE_KV_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS kv (
    key TEXT PRIMARY KEY,
    value TEXT NOT NULL,
    updated_at TEXT NOT NULL
)
"#;

/// SQL to create the code embeddings table
pub const CREATE_CODE_EMBEDDINGS_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS code_embeddings (
    id TEXT PRIMARY KEY,
    vector BLOB NOT NULL,
    metadata TEXT NOT NULL,
    updated_at TEXT NOT NULL
)
"#;

/// All schema creation statements
pub fn all_schema_statements() -> Vec<&'static str> {
    vec![CREATE_KV_TABLE, CREATE_CODE_EMBEDDINGS_TABLE]
}
