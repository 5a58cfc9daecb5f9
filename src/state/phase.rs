//! Crawl phase definitions
//!
//! A crawl invocation moves through these phases exactly once.

use crate::WebberError;
use std::fmt;

/// Represents the lifecycle phase of a crawl invocation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CrawlPhase {
    /// Crawl has been configured but not started
    Idle,

    /// Workers are draining the frontier
    Running,

    /// Frontier is empty or the page budget is exhausted (terminal)
    Drained,
}

impl CrawlPhase {
    /// Returns true if this is the terminal phase
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Drained)
    }

    /// Returns true if the crawl may move from this phase to `next`
    pub fn can_transition_to(&self, next: CrawlPhase) -> bool {
        matches!(
            (self, next),
            (Self::Idle, Self::Running) | (Self::Running, Self::Drained)
        )
    }

    /// Moves to the next phase, rejecting anything but Idle → Running → Drained
    pub fn transition(self, next: CrawlPhase) -> Result<CrawlPhase, WebberError> {
        if self.can_transition_to(next) {
            Ok(next)
        } else {
            Err(WebberError::InvalidTransition {
                from: self,
                to: next,
            })
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Running => "running",
            Self::Drained => "drained",
        }
    }
}

impl fmt::Display for CrawlPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
