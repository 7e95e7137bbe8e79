//! Integration tests for the frontier worker
//!
//! The worker is driven through the in-process message source and sink, so no
//! broker is needed.

mod backend_tests;
mod worker_tests;
