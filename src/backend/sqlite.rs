//! SQLite frontier implementation
//!
//! Same FIFO and deduplication policy as the memory backend, but the seen-set
//! and the queue survive restarts.

use crate::backend::schema::initialize_schema;
use crate::backend::{Backend, BackendResult};
use crate::message::{ErrorInfo, Link, Request, Response};
use crate::state::RequestState;
use chrono::Utc;
use rusqlite::{params, Connection, OptionalExtension, Transaction};
use std::path::Path;

/// SQLite-backed frontier
pub struct SqliteBackend {
    conn: Connection,
}

impl SqliteBackend {
    /// Opens (or creates) the frontier database at `path`
    pub fn new(path: &Path) -> BackendResult<Self> {
        let conn = Connection::open(path)?;

        conn.execute_batch(
            "
            PRAGMA journal_mode = WAL;
            PRAGMA synchronous = NORMAL;
            PRAGMA temp_store = MEMORY;
        ",
        )?;

        initialize_schema(&conn)?;

        Ok(Self { conn })
    }

    /// Creates an in-memory database (for testing)
    #[cfg(test)]
    pub fn new_in_memory() -> BackendResult<Self> {
        let conn = Connection::open_in_memory()?;
        initialize_schema(&conn)?;
        Ok(Self { conn })
    }

    /// Counts requests in the given state
    pub fn count_in_state(&self, state: RequestState) -> BackendResult<u64> {
        let count: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM requests WHERE state = ?1",
            params![state.to_db_string()],
            |row| row.get(0),
        )?;
        Ok(count as u64)
    }

    /// Returns the state of the request with the given fingerprint, if known
    pub fn state_of(&self, fingerprint: &str) -> BackendResult<Option<RequestState>> {
        let state: Option<String> = self
            .conn
            .query_row(
                "SELECT state FROM requests WHERE fingerprint = ?1",
                params![fingerprint],
                |row| row.get(0),
            )
            .optional()?;
        Ok(state.and_then(|s| RequestState::from_db_string(&s)))
    }

    /// Counts recorded link relationships
    pub fn count_links(&self) -> BackendResult<u64> {
        let count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM links", [], |row| row.get(0))?;
        Ok(count as u64)
    }
}

/// Inserts a request in the queued state unless its fingerprint is known
///
/// Returns true if the request was new.
fn enqueue(tx: &Transaction<'_>, request: Request) -> BackendResult<bool> {
    let request = request.with_fingerprint();
    let payload = serde_json::to_string(&request)?;
    let now = Utc::now().to_rfc3339();
    let inserted = tx.execute(
        "INSERT OR IGNORE INTO requests (fingerprint, url, state, payload, discovered_at, updated_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?5)",
        params![
            request.fingerprint(),
            request.url,
            RequestState::Queued.to_db_string(),
            payload,
            now
        ],
    )?;
    Ok(inserted == 1)
}

/// Moves a request to a terminal state, recording it if it was never queued
fn finish(
    tx: &Transaction<'_>,
    request: &Request,
    state: RequestState,
    status_code: Option<u16>,
    error_message: Option<&str>,
) -> BackendResult<()> {
    let fingerprint = request.fingerprint();
    let payload = serde_json::to_string(request)?;
    let now = Utc::now().to_rfc3339();
    tx.execute(
        "INSERT INTO requests (fingerprint, url, state, payload, status_code, error_message, discovered_at, updated_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?7)
         ON CONFLICT(fingerprint) DO UPDATE SET
            state = excluded.state,
            status_code = excluded.status_code,
            error_message = excluded.error_message,
            updated_at = excluded.updated_at",
        params![
            fingerprint,
            request.url,
            state.to_db_string(),
            payload,
            status_code,
            error_message,
            now
        ],
    )?;
    Ok(())
}

impl Backend for SqliteBackend {
    fn add_seeds(&mut self, seeds: Vec<Request>) -> BackendResult<()> {
        let tx = self.conn.transaction()?;
        let mut added = 0;
        for seed in seeds {
            if enqueue(&tx, seed)? {
                added += 1;
            }
        }
        tx.commit()?;
        tracing::debug!("Queued {} new seeds", added);
        Ok(())
    }

    fn page_crawled(&mut self, response: Response, links: Vec<Link>) -> BackendResult<()> {
        let from = response.fingerprint();
        let request = match response.request.clone() {
            Some(request) => request,
            None => {
                let mut request = Request::new(response.url.clone());
                request.meta.insert(
                    "fingerprint".to_string(),
                    serde_json::Value::String(from.clone()),
                );
                request
            }
        };

        let tx = self.conn.transaction()?;
        finish(
            &tx,
            &request,
            RequestState::Crawled,
            Some(response.status_code),
            None,
        )?;
        for link in links {
            let target = link.into_request().with_fingerprint();
            tx.execute(
                "INSERT OR IGNORE INTO links (from_fingerprint, to_fingerprint) VALUES (?1, ?2)",
                params![from, target.fingerprint()],
            )?;
            enqueue(&tx, target)?;
        }
        tx.commit()?;
        Ok(())
    }

    fn request_error(&mut self, request: Request, error: ErrorInfo) -> BackendResult<()> {
        let tx = self.conn.transaction()?;
        finish(
            &tx,
            &request,
            RequestState::Failed,
            None,
            Some(error.as_str()),
        )?;
        tx.commit()?;
        Ok(())
    }

    fn get_next_requests(&mut self, max_count: usize) -> BackendResult<Vec<Request>> {
        // SQLite treats a negative LIMIT as unbounded
        let limit = i64::try_from(max_count).unwrap_or(i64::MAX);
        let tx = self.conn.transaction()?;
        let rows: Vec<(i64, String)> = {
            let mut stmt = tx.prepare(
                "SELECT id, payload FROM requests WHERE state = ?1 ORDER BY id ASC LIMIT ?2",
            )?;
            let rows = stmt
                .query_map(
                    params![RequestState::Queued.to_db_string(), limit],
                    |row| Ok((row.get(0)?, row.get(1)?)),
                )?
                .collect::<Result<Vec<_>, _>>()?;
            rows
        };

        let now = Utc::now().to_rfc3339();
        let mut batch = Vec::with_capacity(rows.len());
        for (id, payload) in rows {
            tx.execute(
                "UPDATE requests SET state = ?1, updated_at = ?2 WHERE id = ?3",
                params![RequestState::Scheduled.to_db_string(), now, id],
            )?;
            batch.push(serde_json::from_str(&payload)?);
        }
        tx.commit()?;
        Ok(batch)
    }
}
