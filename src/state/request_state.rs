/// Request state definitions for the persistent frontier
///
/// Every request the backend knows about is in exactly one of these states.
use std::fmt;

/// Represents the current state of a request in the frontier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RequestState {
    /// Request is known and waiting to be handed out in a batch
    Queued,

    /// Request was published to fetchers and no outcome has arrived yet
    Scheduled,

    /// A crawled page was reported for this request
    Crawled,

    /// A request error was reported for this request
    Failed,
}

impl RequestState {
    /// Converts the state to its database string representation
    pub fn to_db_string(&self) -> &'static str {
        match self {
            Self::Queued => "queued",
            Self::Scheduled => "scheduled",
            Self::Crawled => "crawled",
            Self::Failed => "failed",
        }
    }

    /// Parses a state from its database string representation
    ///
    /// Returns None if the string doesn't match any known state.
    pub fn from_db_string(s: &str) -> Option<Self> {
        match s {
            "queued" => Some(Self::Queued),
            "scheduled" => Some(Self::Scheduled),
            "crawled" => Some(Self::Crawled),
            "failed" => Some(Self::Failed),
            _ => None,
        }
    }
}

impl fmt::Display for RequestState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_db_string())
    }
}
