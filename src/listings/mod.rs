//! Listing data model and repository.

pub mod model;
pub mod repo;

pub use model::{DraftListing, FilterSet, Listing, PropertyKind};
pub use repo::{ListingRepository, SupabaseRepository};
