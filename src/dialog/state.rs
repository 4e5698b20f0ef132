//! Per-flow conversation states.
//!
//! Each variant carries exactly the fields collected so far, so a later
//! field can never be read before every earlier one has been set.

use crate::listings::model::{FilterSet, Listing, PropertyKind};

/// A user's in-progress conversation, one of the two flows.
#[derive(Debug, Clone, PartialEq)]
pub enum Flow {
    Upload(UploadState),
    Search(SearchState),
}

impl Flow {
    /// Fresh upload flow, at the description step.
    pub fn upload_start() -> Self {
        Self::Upload(UploadState::Description)
    }

    /// Fresh search flow: empty filter set, at the type step.
    pub fn search_start() -> Self {
        Self::Search(SearchState::start())
    }

    /// Step name for logging.
    pub fn step_name(&self) -> &'static str {
        match self {
            Self::Upload(UploadState::Description) => "description",
            Self::Upload(UploadState::Price { .. }) => "price",
            Self::Upload(UploadState::Kind { .. }) => "type",
            Self::Upload(UploadState::Location { .. }) => "location",
            Self::Upload(UploadState::Contact { .. }) => "contact",
            Self::Upload(UploadState::Photos { .. }) => "photos",
            Self::Search(SearchState::Kind { .. }) => "search_type",
            Self::Search(SearchState::PriceMin { .. }) => "search_price_min",
            Self::Search(SearchState::PriceMax { .. }) => "search_price_max",
            Self::Search(SearchState::Location { .. }) => "search_location",
            Self::Search(SearchState::Browsing { .. }) => "browsing",
        }
    }
}

/// Upload flow steps. Progresses linearly:
/// description → price → type → location → contact → photos → persisted.
#[derive(Debug, Clone, PartialEq)]
pub enum UploadState {
    Description,
    Price {
        description: String,
    },
    Kind {
        description: String,
        price: f64,
    },
    Location {
        description: String,
        price: f64,
        kind: PropertyKind,
    },
    Contact {
        description: String,
        price: f64,
        kind: PropertyKind,
        location: String,
    },
    Photos {
        description: String,
        price: f64,
        kind: PropertyKind,
        location: String,
        contact: String,
        photos: Vec<String>,
    },
}

/// Search flow steps. Filter construction walks
/// type → min price → max price → location, then browses a snapshot.
#[derive(Debug, Clone, PartialEq)]
pub enum SearchState {
    Kind {
        filters: FilterSet,
    },
    PriceMin {
        filters: FilterSet,
    },
    PriceMax {
        filters: FilterSet,
    },
    Location {
        filters: FilterSet,
    },
    /// Result browsing over the snapshot taken when the search ran.
    /// Invariant: `cursor < results.len()` whenever a page is rendered.
    Browsing {
        results: Vec<Listing>,
        cursor: usize,
    },
}

impl SearchState {
    pub fn start() -> Self {
        Self::Kind {
            filters: FilterSet::default(),
        }
    }
}
