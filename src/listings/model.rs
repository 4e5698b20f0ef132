//! Listing types: property kinds, drafts, persisted records, search filters.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// The fixed set of property types users can list or search for.
///
/// Labels are exactly what the reply keyboards show and what the store
/// persists in the `type` column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PropertyKind {
    Studio,
    #[serde(rename = "Maid's Room")]
    MaidsRoom,
    Sharing,
    #[serde(rename = "1BHK")]
    OneBhk,
    #[serde(rename = "2BHK")]
    TwoBhk,
    #[serde(rename = "3BHK")]
    ThreeBhk,
    #[serde(rename = "4BHK or more")]
    FourBhkOrMore,
    Penthouse,
    Duplex,
    Loft,
    Villa,
    Warehouse,
}

impl PropertyKind {
    /// All kinds, in keyboard display order.
    pub const ALL: [PropertyKind; 12] = [
        Self::Studio,
        Self::MaidsRoom,
        Self::Sharing,
        Self::OneBhk,
        Self::TwoBhk,
        Self::ThreeBhk,
        Self::FourBhkOrMore,
        Self::Penthouse,
        Self::Duplex,
        Self::Loft,
        Self::Villa,
        Self::Warehouse,
    ];

    /// The user-facing label (also the stored representation).
    pub fn label(&self) -> &'static str {
        match self {
            Self::Studio => "Studio",
            Self::MaidsRoom => "Maid's Room",
            Self::Sharing => "Sharing",
            Self::OneBhk => "1BHK",
            Self::TwoBhk => "2BHK",
            Self::ThreeBhk => "3BHK",
            Self::FourBhkOrMore => "4BHK or more",
            Self::Penthouse => "Penthouse",
            Self::Duplex => "Duplex",
            Self::Loft => "Loft",
            Self::Villa => "Villa",
            Self::Warehouse => "Warehouse",
        }
    }

    /// Exact-match lookup by label.
    pub fn from_label(label: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|k| k.label() == label)
    }
}

impl std::fmt::Display for PropertyKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.label())
    }
}

/// A fully collected, not-yet-persisted listing.
///
/// Only produced by the upload flow once every field has been gathered, so
/// all fields are total.
#[derive(Debug, Clone, PartialEq)]
pub struct DraftListing {
    pub description: String,
    pub price: f64,
    pub kind: PropertyKind,
    pub location: String,
    pub contact: String,
    /// Ordered Telegram photo `file_id`s, at most [`crate::config::MAX_PHOTOS`].
    pub photos: Vec<String>,
}

/// A persisted listing record from the `properties` collection.
///
/// Immutable once created; the admin verification marker is written only
/// from outside this process.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Listing {
    pub id: i64,
    pub description: String,
    pub price: f64,
    #[serde(rename = "type")]
    pub kind: PropertyKind,
    pub location: String,
    pub contact_info: String,
    pub photos: Vec<String>,
    pub created_at: DateTime<Utc>,
    pub user_id: i64,
    pub verified_by_admin: String,
}

/// Sparse search constraints. An absent key imposes no constraint, which is
/// distinct from the user explicitly answering "Any"/"Skip" (both clear the
/// key).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FilterSet {
    pub kind: Option<PropertyKind>,
    pub min_price: Option<f64>,
    pub max_price: Option<f64>,
    /// Case-insensitive substring match on the location field.
    pub location: Option<String>,
}

impl FilterSet {
    pub fn is_empty(&self) -> bool {
        self.kind.is_none()
            && self.min_price.is_none()
            && self.max_price.is_none()
            && self.location.is_none()
    }
}
