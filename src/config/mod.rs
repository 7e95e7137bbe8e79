//! Configuration module for Frontier Worker
//!
//! This module handles loading, parsing, and validating TOML configuration files.
//!
//! # Example
//!
//! ```no_run
//! use frontier_worker::config::load_config;
//! use std::path::Path;
//!
//! let config = load_config(Path::new("worker.toml")).unwrap();
//! println!("Batch size: {}", config.worker.consumer_batch_size);
//! ```

mod parser;
mod types;
mod validation;

// Re-export types
pub use types::{BackendConfig, BackendKind, Config, ExcludeEntry, KafkaConfig, WorkerConfig};

// Re-export parser functions
pub use parser::{compute_config_hash, load_config, load_config_with_hash, parse_config};
