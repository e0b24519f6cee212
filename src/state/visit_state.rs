/// Visit state definitions for a single frontier entry
///
/// Every entry handed out by the frontier walks through these states until
/// it reaches `Done` or `Abandoned`.
use std::fmt;

/// Represents where the crawler is in processing one frontier entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum VisitState {
    // ===== Active States =====
    /// The document is being fetched
    Fetching,

    /// Setup rules and hooks are running against the loaded document
    Setup,

    /// Scraping rules are running against the current page
    Extracting,

    /// The buffer is being flushed after a page
    SavePerPage,

    /// A navigate rule is moving the document to its next page
    Navigating,

    // ===== Terminal States =====
    /// Page budget used up, nothing left to navigate to, the page did not
    /// change, or the request filter blocked the next request
    Done,

    /// The fetch or a navigation request failed
    Abandoned,
}

impl VisitState {
    /// Returns true if no further processing happens for the entry
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Done | Self::Abandoned)
    }

    /// Checks whether moving from this state to `next` is legal
    pub fn can_transition_to(&self, next: VisitState) -> bool {
        use VisitState::*;

        matches!(
            (self, next),
            (Fetching, Setup)
                | (Fetching, Done)
                | (Fetching, Abandoned)
                | (Setup, Extracting)
                | (Extracting, SavePerPage)
                | (Extracting, Navigating)
                | (Extracting, Done)
                | (SavePerPage, Navigating)
                | (SavePerPage, Done)
                | (Navigating, Extracting)
                | (Navigating, Done)
                | (Navigating, Abandoned)
        )
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Fetching => "fetching",
            Self::Setup => "setup",
            Self::Extracting => "extracting",
            Self::SavePerPage => "save_per_page",
            Self::Navigating => "navigating",
            Self::Done => "done",
            Self::Abandoned => "abandoned",
        }
    }
}

impl fmt::Display for VisitState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
