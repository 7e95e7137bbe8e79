//! Routing of decoded crawl outcomes to the backend

use crate::backend::{Backend, BackendError};
use crate::config::ExcludeEntry;
use crate::message::{IncomingMessage, Link};
use crate::url::{matches_any, parse_domain};
use crate::worker::stats::WorkerStats;
use tracing::{debug, error, info};

/// Decides which discovered links are dropped before reaching the backend
pub trait LinkFilter: Send + Sync {
    fn is_excluded(&self, link: &Link) -> bool;
}

impl<F> LinkFilter for F
where
    F: Fn(&Link) -> bool + Send + Sync,
{
    fn is_excluded(&self, link: &Link) -> bool {
        self(link)
    }
}

/// Configurable denylist of links
///
/// A link is excluded if its host matches one of the domain patterns (see
/// [`crate::url::matches_wildcard`]) or its URL contains one of the substrings.
#[derive(Debug, Clone, Default)]
pub struct ExclusionPolicy {
    domains: Vec<String>,
    substrings: Vec<String>,
}

impl ExclusionPolicy {
    pub fn new(domains: Vec<String>, substrings: Vec<String>) -> Self {
        Self {
            domains,
            substrings,
        }
    }

    /// Builds the policy from the `[[exclude]]` configuration entries
    pub fn from_config(entries: &[ExcludeEntry]) -> Self {
        let mut policy = Self::default();
        for entry in entries {
            if let Some(domain) = &entry.domain {
                policy.domains.push(domain.clone());
            }
            if let Some(substring) = &entry.substring {
                policy.substrings.push(substring.clone());
            }
        }
        policy
    }

    pub fn is_empty(&self) -> bool {
        self.domains.is_empty() && self.substrings.is_empty()
    }
}

impl LinkFilter for ExclusionPolicy {
    fn is_excluded(&self, link: &Link) -> bool {
        if self
            .substrings
            .iter()
            .any(|s| link.url.contains(s.as_str()))
        {
            return true;
        }
        if self.domains.is_empty() {
            return false;
        }
        // Links without a usable host are left for the backend to judge
        match parse_domain(&link.url) {
            Ok(host) => matches_any(&self.domains, &host),
            Err(_) => false,
        }
    }
}

/// Applies decoded messages to the backend
///
/// Each message results in exactly one backend call. A failing call is logged
/// and the message skipped, unless the backend reports an unrecoverable state.
pub struct ResultDispatcher {
    filter: Box<dyn LinkFilter>,
}

impl Default for ResultDispatcher {
    fn default() -> Self {
        Self::new(Box::new(ExclusionPolicy::default()))
    }
}

impl ResultDispatcher {
    pub fn new(filter: Box<dyn LinkFilter>) -> Self {
        Self { filter }
    }

    /// Dispatches one message
    ///
    /// # Returns
    ///
    /// * `Ok(())` - The backend accepted the message, or rejected it with a
    ///   recoverable error that was logged
    /// * `Err(BackendError)` - The backend is unusable; the worker must stop
    pub fn dispatch<B: Backend + ?Sized>(
        &self,
        backend: &mut B,
        message: IncomingMessage,
        stats: &mut WorkerStats,
    ) -> Result<(), BackendError> {
        let kind = message.kind();
        let (url, result) = match message {
            IncomingMessage::AddSeeds { seeds } => {
                info!("Adding {} seeds", seeds.len());
                for seed in &seeds {
                    debug!("URL: {}", seed.url);
                }
                let count = seeds.len() as u64;
                let url = seeds.first().map(|s| s.url.clone()).unwrap_or_default();
                let result = backend.add_seeds(seeds);
                if result.is_ok() {
                    stats.seeds_added += count;
                }
                (url, result)
            }
            IncomingMessage::PageCrawled { response, links } => {
                debug!("Page crawled {}", response.url);
                let total = links.len();
                let filtered: Vec<Link> = links
                    .into_iter()
                    .filter(|link| !self.filter.is_excluded(link))
                    .collect();
                stats.links_filtered += (total - filtered.len()) as u64;

                let url = response.url.clone();
                let result = backend.page_crawled(response, filtered);
                if result.is_ok() {
                    stats.pages_crawled += 1;
                }
                (url, result)
            }
            IncomingMessage::RequestError { request, error } => {
                info!("Request error {}: {}", request.url, error);
                let url = request.url.clone();
                let result = backend.request_error(request, error);
                if result.is_ok() {
                    stats.request_errors += 1;
                }
                (url, result)
            }
        };

        match result {
            Ok(()) => Ok(()),
            Err(e) if e.is_fatal() => {
                error!("Backend failed fatally on {} for {}: {}", kind, url, e);
                Err(e)
            }
            Err(e) => {
                error!("Backend error on {} for {}, message skipped: {}", kind, url, e);
                stats.backend_errors += 1;
                Ok(())
            }
        }
    }
}
