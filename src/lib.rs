//! Frontier Worker: bridges a crawl frontier with a message bus
//!
//! This crate implements the worker process that drains crawl outcomes (seeds,
//! crawled pages, request errors) from an incoming topic, applies them to a
//! frontier backend, and periodically publishes the next batch of requests to an
//! outgoing topic, partitioned by domain.

pub mod backend;
pub mod bus;
pub mod config;
pub mod message;
pub mod state;
pub mod url;
pub mod worker;

use thiserror::Error;

/// Main error type for Frontier Worker operations
#[derive(Debug, Error)]
pub enum WorkerError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Backend error: {0}")]
    Backend(#[from] backend::BackendError),

    #[error("Message source error: {0}")]
    Source(#[from] bus::SourceError),

    #[error("Message sink error: {0}")]
    Sink(#[from] bus::SinkError),
}

/// Configuration-specific errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid domain pattern: {0}")]
    InvalidPattern(String),
}

/// URL-specific errors
#[derive(Debug, Error)]
pub enum UrlError {
    #[error("Failed to parse URL: {0}")]
    Parse(String),

    #[error("Missing domain in URL: {0}")]
    MissingDomain(String),
}

/// Errors raised while decoding or encoding bus payloads
#[derive(Debug, Error)]
pub enum CodecError {
    #[error("Empty payload")]
    Empty,

    #[error("Malformed payload: {0}")]
    Malformed(#[from] serde_json::Error),
}

/// Result type alias for Frontier Worker operations
pub type Result<T> = std::result::Result<T, WorkerError>;

/// Result type alias for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

/// Result type alias for URL operations
pub type UrlResult<T> = std::result::Result<T, UrlError>;

// Re-export commonly used types
pub use config::Config;
pub use message::{IncomingMessage, Link, Request, Response};
pub use url::{matches_wildcard, parse_domain};
pub use worker::FrontierWorker;
