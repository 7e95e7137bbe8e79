//! State module for tracking requests in the frontier
//!
//! `RequestState` records where a request is in its lifecycle: queued in the
//! frontier, handed out to fetchers, or finished with a crawl or an error.

mod request_state;

pub use request_state::RequestState;
