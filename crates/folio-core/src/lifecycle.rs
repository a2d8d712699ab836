//! Page lifecycle states.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Identity of a persistent page.
///
/// Assigned only once a page is registered as persistent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct PageId(pub u64);

impl PageId {
    /// Parse an identity from a request parameter value.
    pub fn parse(raw: &str) -> Option<Self> {
        raw.trim().parse::<u64>().ok().map(Self)
    }

    /// Get the raw numeric value.
    pub fn get(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for PageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Lifecycle state of a page.
///
/// States only move forward. `New` and `Post` share the same rank, so a
/// page may be observed in either before its first submission.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PageState {
    /// Page created, no POST observed yet.
    #[default]
    New,
    /// Alias of `New` used by pages that distinguish the first POST.
    Post,
    /// At least one POST has been observed.
    Submit,
    /// Page-defined intermediate step between `Submit` and `Finished`.
    Step(u32),
    /// Page finished its work; it must not be scheduled again.
    Finished,
}

impl PageState {
    /// Get the state name.
    pub fn as_str(&self) -> &'static str {
        match self {
            PageState::New => "NEW",
            PageState::Post => "POST",
            PageState::Submit => "SUBMIT",
            PageState::Step(_) => "STEP",
            PageState::Finished => "FINISHED",
        }
    }

    /// Ordering rank used to enforce forward-only transitions.
    pub fn rank(&self) -> u64 {
        match self {
            PageState::New | PageState::Post => 0,
            PageState::Submit => 1,
            PageState::Step(n) => 2 + u64::from(*n),
            PageState::Finished => u64::MAX,
        }
    }

    /// Check whether this is the practical predecessor of `Submit`.
    pub fn is_new_or_post(&self) -> bool {
        matches!(self, PageState::New | PageState::Post)
    }

    /// Check whether this is the terminal state.
    pub fn is_finished(&self) -> bool {
        matches!(self, PageState::Finished)
    }

    /// Check whether moving from `self` to `next` keeps the forward-only rule.
    pub fn can_advance_to(&self, next: PageState) -> bool {
        !self.is_finished() && next.rank() >= self.rank()
    }
}

impl fmt::Display for PageState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PageState::Step(n) => write!(f, "STEP({})", n),
            other => f.write_str(other.as_str()),
        }
    }
}
