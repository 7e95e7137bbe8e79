//! Message types exchanged over the bus
//!
//! Incoming payloads are crawl outcomes produced by fetchers; outgoing payloads
//! are single requests for fetchers to crawl. The worker never mutates these
//! values, it only passes them between the bus and the backend.

mod codec;

pub use codec::{Codec, JsonCodec};

use crate::url::url_fingerprint;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Free-form metadata attached to requests, responses and links
pub type Meta = serde_json::Map<String, serde_json::Value>;

fn default_method() -> String {
    "GET".to_string()
}

/// A crawl target
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Request {
    pub url: String,

    #[serde(default = "default_method")]
    pub method: String,

    #[serde(default)]
    pub headers: HashMap<String, String>,

    #[serde(default)]
    pub cookies: HashMap<String, String>,

    #[serde(default)]
    pub meta: Meta,
}

impl Request {
    /// Creates a GET request with empty metadata
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            method: default_method(),
            headers: HashMap::new(),
            cookies: HashMap::new(),
            meta: Meta::new(),
        }
    }

    /// Returns the request fingerprint
    ///
    /// Uses `meta.fingerprint` when the producer supplied one, otherwise the
    /// fingerprint of the URL.
    pub fn fingerprint(&self) -> String {
        match self.meta.get("fingerprint").and_then(|v| v.as_str()) {
            Some(fp) => fp.to_string(),
            None => url_fingerprint(&self.url),
        }
    }

    /// Returns a copy of this request with `meta.fingerprint` filled in
    pub fn with_fingerprint(mut self) -> Self {
        if !self.meta.contains_key("fingerprint") {
            let fp = url_fingerprint(&self.url);
            self.meta
                .insert("fingerprint".to_string(), serde_json::Value::String(fp));
        }
        self
    }
}

/// The result of a fetch
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Response {
    pub url: String,

    #[serde(default = "default_status")]
    pub status_code: u16,

    #[serde(default)]
    pub headers: HashMap<String, String>,

    #[serde(default)]
    pub meta: Meta,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub body: Option<String>,

    /// The request that produced this response, when the fetcher includes it
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub request: Option<Request>,
}

fn default_status() -> u16 {
    200
}

impl Response {
    pub fn new(url: impl Into<String>, status_code: u16) -> Self {
        Self {
            url: url.into(),
            status_code,
            headers: HashMap::new(),
            meta: Meta::new(),
            body: None,
            request: None,
        }
    }

    /// Fingerprint of the originating request, or of the response URL
    pub fn fingerprint(&self) -> String {
        match &self.request {
            Some(request) => request.fingerprint(),
            None => match self.meta.get("fingerprint").and_then(|v| v.as_str()) {
                Some(fp) => fp.to_string(),
                None => url_fingerprint(&self.url),
            },
        }
    }
}

/// An outbound URL discovered on a crawled page
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Link {
    pub url: String,

    #[serde(default, skip_serializing_if = "Meta::is_empty")]
    pub meta: Meta,
}

impl Link {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            meta: Meta::new(),
        }
    }

    /// Turns the link into a request to schedule
    pub fn into_request(self) -> Request {
        let mut request = Request::new(self.url);
        request.meta = self.meta;
        request
    }
}

/// Opaque error descriptor attached to a failed request
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ErrorInfo(pub String);

impl ErrorInfo {
    pub fn new(message: impl Into<String>) -> Self {
        Self(message.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for ErrorInfo {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// A decoded incoming message
///
/// The `type` field selects the variant; an unknown value fails to decode.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum IncomingMessage {
    AddSeeds {
        seeds: Vec<Request>,
    },
    PageCrawled {
        #[serde(rename = "r", alias = "response")]
        response: Response,
        #[serde(default)]
        links: Vec<Link>,
    },
    RequestError {
        #[serde(rename = "r", alias = "request")]
        request: Request,
        error: ErrorInfo,
    },
}

impl IncomingMessage {
    /// Short name of the message kind, as it appears on the wire
    pub fn kind(&self) -> &'static str {
        match self {
            Self::AddSeeds { .. } => "add_seeds",
            Self::PageCrawled { .. } => "page_crawled",
            Self::RequestError { .. } => "request_error",
        }
    }
}
