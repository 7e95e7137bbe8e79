//! In-memory FIFO frontier

use crate::backend::{Backend, BackendResult};
use crate::message::{ErrorInfo, Link, Request, Response};
use crate::state::RequestState;
use std::collections::{HashMap, VecDeque};

/// FIFO frontier kept in process memory
///
/// Requests are deduplicated by fingerprint: a URL seen once (as a seed, a link
/// or a crawled page) is never queued again.
#[derive(Debug, Default)]
pub struct MemoryBackend {
    queue: VecDeque<Request>,
    states: HashMap<String, RequestState>,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of requests waiting to be handed out
    pub fn queued_len(&self) -> usize {
        self.queue.len()
    }

    /// State of the request with the given fingerprint, if known
    pub fn state_of(&self, fingerprint: &str) -> Option<RequestState> {
        self.states.get(fingerprint).copied()
    }

    /// Number of known requests in the given state
    pub fn count_in_state(&self, state: RequestState) -> usize {
        self.states.values().filter(|s| **s == state).count()
    }

    fn enqueue(&mut self, request: Request) -> bool {
        let request = request.with_fingerprint();
        let fingerprint = request.fingerprint();
        if self.states.contains_key(&fingerprint) {
            return false;
        }
        self.states.insert(fingerprint, RequestState::Queued);
        self.queue.push_back(request);
        true
    }
}

impl Backend for MemoryBackend {
    fn add_seeds(&mut self, seeds: Vec<Request>) -> BackendResult<()> {
        let mut added = 0;
        for seed in seeds {
            if self.enqueue(seed) {
                added += 1;
            }
        }
        tracing::debug!("Queued {} new seeds", added);
        Ok(())
    }

    fn page_crawled(&mut self, response: Response, links: Vec<Link>) -> BackendResult<()> {
        self.states
            .insert(response.fingerprint(), RequestState::Crawled);
        for link in links {
            self.enqueue(link.into_request());
        }
        Ok(())
    }

    fn request_error(&mut self, request: Request, _error: ErrorInfo) -> BackendResult<()> {
        self.states.insert(request.fingerprint(), RequestState::Failed);
        Ok(())
    }

    fn get_next_requests(&mut self, max_count: usize) -> BackendResult<Vec<Request>> {
        let take = max_count.min(self.queue.len());
        let batch: Vec<Request> = self.queue.drain(..take).collect();
        for request in &batch {
            self.states
                .insert(request.fingerprint(), RequestState::Scheduled);
        }
        Ok(batch)
    }
}
