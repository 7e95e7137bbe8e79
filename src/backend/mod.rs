//! Frontier backends
//!
//! The backend is the decision engine behind the worker: it remembers which
//! requests it has seen, queues new ones and decides what to crawl next. The
//! worker only talks to it through the [`Backend`] trait.
//!
//! Two implementations are provided:
//! - [`MemoryBackend`]: FIFO queue with fingerprint deduplication, state is lost
//!   on restart
//! - [`SqliteBackend`]: the same policy persisted in a SQLite database

mod memory;
mod schema;
mod sqlite;

pub use memory::MemoryBackend;
pub use sqlite::SqliteBackend;

use crate::config::{BackendConfig, BackendKind};
use crate::message::{ErrorInfo, Link, Request, Response};
use std::path::Path;
use thiserror::Error;

/// Errors that can occur inside a backend
#[derive(Debug, Error)]
pub enum BackendError {
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Rejected by backend: {0}")]
    Rejected(String),

    #[error("Backend is in an unrecoverable state: {0}")]
    Unrecoverable(String),
}

impl BackendError {
    /// Returns true if the worker must stop instead of skipping the message
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::Unrecoverable(_))
    }
}

/// Result type for backend operations
pub type BackendResult<T> = Result<T, BackendError>;

/// Frontier decision engine driven by the worker
///
/// The worker owns the backend exclusively and calls it from a single task, so
/// implementations need no internal locking.
pub trait Backend {
    /// Adds seed requests to the frontier
    fn add_seeds(&mut self, seeds: Vec<Request>) -> BackendResult<()>;

    /// Records a crawled page and the links found on it
    fn page_crawled(&mut self, response: Response, links: Vec<Link>) -> BackendResult<()>;

    /// Records a request that failed to be fetched
    fn request_error(&mut self, request: Request, error: ErrorInfo) -> BackendResult<()>;

    /// Returns up to `max_count` requests to crawl next
    ///
    /// Fewer than `max_count` (including none) is a normal answer.
    fn get_next_requests(&mut self, max_count: usize) -> BackendResult<Vec<Request>>;
}

impl<B: Backend + ?Sized> Backend for Box<B> {
    fn add_seeds(&mut self, seeds: Vec<Request>) -> BackendResult<()> {
        (**self).add_seeds(seeds)
    }

    fn page_crawled(&mut self, response: Response, links: Vec<Link>) -> BackendResult<()> {
        (**self).page_crawled(response, links)
    }

    fn request_error(&mut self, request: Request, error: ErrorInfo) -> BackendResult<()> {
        (**self).request_error(request, error)
    }

    fn get_next_requests(&mut self, max_count: usize) -> BackendResult<Vec<Request>> {
        (**self).get_next_requests(max_count)
    }
}

/// Opens the backend selected by the configuration
///
/// # Returns
///
/// * `Ok(Box<dyn Backend>)` - Ready to use backend
/// * `Err(BackendError)` - The SQLite database could not be opened
pub fn open_backend(config: &BackendConfig) -> BackendResult<Box<dyn Backend>> {
    match config.kind {
        BackendKind::Memory => Ok(Box::new(MemoryBackend::new())),
        BackendKind::Sqlite => {
            let path = config.database_path.as_deref().ok_or_else(|| {
                BackendError::Unrecoverable("sqlite backend needs a database path".to_string())
            })?;
            Ok(Box::new(SqliteBackend::new(Path::new(path))?))
        }
    }
}
