//! Result pager — renders one listing from the search snapshot.
//!
//! The snapshot is taken once, when the search executes; paging walks it
//! with a zero-based cursor and never re-queries the store.

use crate::listings::model::{FilterSet, Listing};
use crate::outbound::{CallbackAction, InlineButton};

/// Everything needed to display one result: media group caption, photo
/// references, and the follow-on inline actions.
#[derive(Debug, Clone, PartialEq)]
pub struct Page {
    pub caption: String,
    pub photos: Vec<String>,
    pub buttons: Vec<InlineButton>,
}

/// Render the listing at `cursor` out of `total` matches.
pub fn render_page(listing: &Listing, cursor: usize, total: usize) -> Page {
    debug_assert!(cursor < total);

    let caption = format!(
        "📝 {}\n💰 AED {}/month\n📍 {}\n🏠 {}\nVerified by admin: {}\nProperty {} of {}",
        listing.description,
        format_price(listing.price),
        listing.location,
        listing.kind,
        listing.verified_by_admin,
        cursor + 1,
        total,
    );

    let mut buttons = vec![
        InlineButton {
            label: "📞 Contact",
            action: CallbackAction::Contact(listing.id),
        },
        InlineButton {
            label: "🔄 New Search",
            action: CallbackAction::NewSearch,
        },
    ];
    if cursor + 1 < total {
        buttons.push(InlineButton {
            label: "👇 Next",
            action: CallbackAction::NextProperty,
        });
    }

    Page {
        caption,
        photos: listing.photos.clone(),
        buttons,
    }
}

/// The single follow-on action offered for an empty result set.
pub fn empty_result_buttons() -> Vec<InlineButton> {
    vec![InlineButton {
        label: "🔄 New Search",
        action: CallbackAction::NewSearch,
    }]
}

/// Summary of the applied filters, shown before the first result only.
pub fn filter_summary(filters: &FilterSet) -> String {
    let mut summary = String::from("🔍 Search Results\n");
    if let Some(kind) = filters.kind {
        summary.push_str(&format!("\nType: {kind}"));
    }
    if let Some(ref location) = filters.location {
        summary.push_str(&format!("\nLocation: {location}"));
    }
    if let Some(min) = filters.min_price {
        summary.push_str(&format!("\nMin Price: AED {}", format_price(min)));
    }
    if let Some(max) = filters.max_price {
        summary.push_str(&format!("\nMax Price: AED {}", format_price(max)));
    }
    summary
}

/// Price with thousands separators; fractional prices keep two decimals.
fn format_price(price: f64) -> String {
    let negative = price < 0.0;
    let abs = price.abs();
    let whole = abs.trunc() as u64;
    let fraction = abs.fract();

    let digits = whole.to_string();
    let mut grouped = String::new();
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(c);
    }

    let mut out = String::new();
    if negative {
        out.push('-');
    }
    out.push_str(&grouped);
    if fraction > 0.0 {
        out.push_str(&format!("{:.2}", fraction)[1..]);
    }
    out
}
