/// Crawl engine state definitions
///
/// This module defines the states the crawl engine moves through and which
/// transitions between them are legal.
use std::fmt;

/// Represents the current state of the crawl engine
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EngineState {
    /// Engine created, nothing submitted yet
    Init,

    /// Query typed and searched; listing rendering
    QuerySubmitted,

    /// Listing switched to its largest page size (or left at default)
    PageSizeExpanded,

    /// Current listing page read
    PageLoaded,

    /// Visiting the items of the current listing page
    ItemLoop,

    /// Deciding on / moving to the next listing page
    Paginating,

    /// Last page processed
    Done,
}

impl EngineState {
    /// Returns true if no further transition is possible
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Done)
    }

    /// Returns true if the engine may move from `self` to `next`
    ///
    /// Only `Paginating -> PageLoaded` goes backwards; it is what makes the
    /// item loop and pagination cycle until the last page.
    pub fn can_transition_to(&self, next: EngineState) -> bool {
        matches!(
            (self, next),
            (Self::Init, Self::QuerySubmitted)
                | (Self::QuerySubmitted, Self::PageSizeExpanded)
                | (Self::PageSizeExpanded, Self::PageLoaded)
                | (Self::PageLoaded, Self::ItemLoop)
                | (Self::ItemLoop, Self::Paginating)
                | (Self::Paginating, Self::PageLoaded)
                | (Self::Paginating, Self::Done)
        )
    }

    /// Short name used in logs
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Init => "init",
            Self::QuerySubmitted => "query_submitted",
            Self::PageSizeExpanded => "page_size_expanded",
            Self::PageLoaded => "page_loaded",
            Self::ItemLoop => "item_loop",
            Self::Paginating => "paginating",
            Self::Done => "done",
        }
    }

    /// Returns all engine states in forward order
    pub fn all_states() -> Vec<Self> {
        vec![
            Self::Init,
            Self::QuerySubmitted,
            Self::PageSizeExpanded,
            Self::PageLoaded,
            Self::ItemLoop,
            Self::Paginating,
            Self::Done,
        ]
    }
}

impl fmt::Display for EngineState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
