//! Database schema for the SQLite frontier

/// SQL schema for the database
pub const SCHEMA_SQL: &str = r#"
-- Every request the frontier has seen, keyed by fingerprint
CREATE TABLE IF NOT EXISTS requests (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    fingerprint TEXT NOT NULL UNIQUE,
    url TEXT NOT NULL,
    state TEXT NOT NULL,
    payload TEXT NOT NULL,
    status_code INTEGER,
    error_message TEXT,
    discovered_at TEXT NOT NULL,
    updated_at TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_requests_state ON requests(state, id);

-- Link relationships reported with crawled pages
CREATE TABLE IF NOT EXISTS links (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    from_fingerprint TEXT NOT NULL,
    to_fingerprint TEXT NOT NULL,
    UNIQUE(from_fingerprint, to_fingerprint)
);

CREATE INDEX IF NOT EXISTS idx_links_from ON links(from_fingerprint);
"#;

/// Initializes the database schema
pub fn initialize_schema(conn: &rusqlite::Connection) -> Result<(), rusqlite::Error> {
    conn.execute_batch(SCHEMA_SQL)?;
    Ok(())
}
