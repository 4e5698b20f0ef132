//! The conversation state machine.
//!
//! Pure transition logic: one user event against one flow state produces
//! the next state plus an outbound instruction. Validation failures
//! re-prompt in place and never mutate the accumulated data; terminal
//! steps hand a completed draft or filter set back to the dispatcher.

use crate::config::MAX_PHOTOS;
use crate::dialog::state::{Flow, SearchState, UploadState};
use crate::dialog::validate;
use crate::listings::model::{DraftListing, FilterSet, PropertyKind};
use crate::outbound::Keyboard;

/// One inbound user event, as seen by the machine. Menu-entry commands and
/// inline callbacks are handled by the dispatcher before the machine runs.
#[derive(Debug, Clone, PartialEq)]
pub enum Event {
    Text(String),
    /// A photo upload, as an opaque `file_id`.
    Photo(String),
}

/// An outbound instruction: message text plus keyboard.
#[derive(Debug, Clone, PartialEq)]
pub struct Reply {
    pub text: String,
    pub keyboard: Keyboard,
}

impl Reply {
    pub fn new(text: impl Into<String>, keyboard: Keyboard) -> Self {
        Self {
            text: text.into(),
            keyboard,
        }
    }

    pub fn plain(text: impl Into<String>) -> Self {
        Self::new(text, Keyboard::None)
    }
}

/// Result of feeding one event into the machine.
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    /// Session continues as `flow`; send `reply`. Covers both a successful
    /// advance and an in-place re-prompt after a validation failure.
    Continue { flow: Flow, reply: Reply },
    /// Upload flow finished: persist the draft and clear the session.
    Persist { draft: DraftListing },
    /// Filter construction finished: run the search.
    RunSearch { filters: FilterSet },
    /// Input means nothing in this state; session unchanged, no reply.
    Ignored { flow: Flow },
}

/// Feed one event into a flow.
pub fn advance(flow: Flow, event: Event) -> Outcome {
    match flow {
        Flow::Upload(state) => advance_upload(state, event),
        Flow::Search(state) => advance_search(state, event),
    }
}

/// Prompt sent when the upload flow starts (dispatcher uses it on entry).
pub fn upload_entry_reply() -> Reply {
    Reply::plain("Please provide a detailed description of the property:")
}

/// Prompt sent when the search flow starts or restarts.
pub fn search_entry_reply() -> Reply {
    Reply::new("Select property type:", Keyboard::SearchKinds)
}

fn advance_upload(state: UploadState, event: Event) -> Outcome {
    use UploadState::*;

    match (state, event) {
        (Description, Event::Text(text)) => {
            let text = text.trim();
            if text.is_empty() {
                return stay(
                    Description,
                    Reply::plain("Please provide a detailed description of the property:"),
                );
            }
            stay(
                Price {
                    description: text.to_string(),
                },
                Reply::plain("Enter the monthly price (AED):\nExample: 5000"),
            )
        }

        (Price { description }, Event::Text(text)) => match validate::parse_listing_price(&text) {
            Some(price) => stay(
                Kind { description, price },
                Reply::new("Select the property type:", Keyboard::UploadKinds),
            ),
            None => stay(
                Price { description },
                Reply::plain("Please enter a valid price in AED."),
            ),
        },

        (Kind { description, price }, Event::Text(text)) => {
            match PropertyKind::from_label(text.trim()) {
                Some(kind) => stay(
                    Location {
                        description,
                        price,
                        kind,
                    },
                    Reply::plain("Enter the location of the property:"),
                ),
                None => stay(
                    Kind { description, price },
                    Reply::new(
                        "Please select a valid property type from the keyboard.",
                        Keyboard::UploadKinds,
                    ),
                ),
            }
        }

        (
            Location {
                description,
                price,
                kind,
            },
            Event::Text(text),
        ) => stay(
            Contact {
                description,
                price,
                kind,
                location: text,
            },
            Reply::plain("Enter your contact phone number:\nExample: +971 XX XXX XXXX"),
        ),

        (
            Contact {
                description,
                price,
                kind,
                location,
            },
            Event::Text(text),
        ) => {
            if !validate::is_phone_shaped(text.trim()) {
                return stay(
                    Contact {
                        description,
                        price,
                        kind,
                        location,
                    },
                    Reply::plain("Please enter a valid phone number."),
                );
            }
            stay(
                Photos {
                    description,
                    price,
                    kind,
                    location,
                    contact: text.trim().to_string(),
                    photos: Vec::new(),
                },
                Reply::plain(format!(
                    "Please send up to {MAX_PHOTOS} photos of the property.\nType 'done' when finished."
                )),
            )
        }

        (
            Photos {
                description,
                price,
                kind,
                location,
                contact,
                photos,
            },
            Event::Photo(file_id),
        ) => {
            let mut photos = photos;
            photos.push(file_id);
            if photos.len() >= MAX_PHOTOS {
                // Extra photos beyond the cap finalize automatically.
                photos.truncate(MAX_PHOTOS);
                return Outcome::Persist {
                    draft: DraftListing {
                        description,
                        price,
                        kind,
                        location,
                        contact,
                        photos,
                    },
                };
            }
            let count = photos.len();
            stay(
                Photos {
                    description,
                    price,
                    kind,
                    location,
                    contact,
                    photos,
                },
                Reply::plain(format!(
                    "Photo {count}/{MAX_PHOTOS} received. Send more or type 'done'."
                )),
            )
        }

        (
            Photos {
                description,
                price,
                kind,
                location,
                contact,
                photos,
            },
            Event::Text(text),
        ) if text.trim() == "done" => {
            if photos.is_empty() {
                return stay(
                    Photos {
                        description,
                        price,
                        kind,
                        location,
                        contact,
                        photos,
                    },
                    Reply::plain("Please send at least one photo of the property."),
                );
            }
            Outcome::Persist {
                draft: DraftListing {
                    description,
                    price,
                    kind,
                    location,
                    contact,
                    photos,
                },
            }
        }

        // Free text during photo collection, or a photo outside the photo
        // step: not meaningful.
        (state, _) => Outcome::Ignored {
            flow: Flow::Upload(state),
        },
    }
}

fn advance_search(state: SearchState, event: Event) -> Outcome {
    use SearchState::*;

    let Event::Text(text) = event else {
        return Outcome::Ignored {
            flow: Flow::Search(state),
        };
    };
    let text = text.trim().to_string();

    match state {
        Kind { mut filters } => {
            if text == "Any" {
                filters.kind = None;
            } else if let Some(kind) = PropertyKind::from_label(&text) {
                filters.kind = Some(kind);
            } else {
                return stay_search(
                    Kind { filters },
                    Reply::new("Please select a valid property type:", Keyboard::SearchKinds),
                );
            }
            stay_search(
                PriceMin { filters },
                Reply::new("Enter minimum price in AED:", Keyboard::SkipPrice),
            )
        }

        PriceMin { mut filters } => {
            if text == "Skip" {
                filters.min_price = None;
            } else {
                match validate::parse_search_price(&text) {
                    Some(price) => filters.min_price = Some(price),
                    None => {
                        return stay_search(
                            PriceMin { filters },
                            Reply::new(
                                "Please enter a valid price or click Skip:",
                                Keyboard::SkipPrice,
                            ),
                        );
                    }
                }
            }
            stay_search(
                PriceMax { filters },
                Reply::new("Enter maximum price in AED:", Keyboard::SkipPrice),
            )
        }

        PriceMax { mut filters } => {
            if text == "Skip" {
                filters.max_price = None;
            } else {
                let price = match validate::parse_search_price(&text) {
                    Some(price) => price,
                    None => {
                        return stay_search(
                            PriceMax { filters },
                            Reply::new(
                                "Please enter a valid price or click Skip:",
                                Keyboard::SkipPrice,
                            ),
                        );
                    }
                };
                if let Some(min) = filters.min_price
                    && price < min
                {
                    return stay_search(
                        PriceMax { filters },
                        Reply::new(
                            "Maximum price must be greater than minimum price",
                            Keyboard::SkipPrice,
                        ),
                    );
                }
                filters.max_price = Some(price);
            }
            stay_search(
                Location { filters },
                Reply::new(
                    "Enter the location you're interested in:",
                    Keyboard::AnyLocation,
                ),
            )
        }

        Location { mut filters } => {
            if text == "Any" {
                filters.location = None;
            } else {
                filters.location = Some(text);
            }
            Outcome::RunSearch { filters }
        }

        // Free text while browsing results does nothing; paging is driven
        // by inline callbacks.
        Browsing { results, cursor } => Outcome::Ignored {
            flow: Flow::Search(Browsing { results, cursor }),
        },
    }
}

fn stay(state: UploadState, reply: Reply) -> Outcome {
    Outcome::Continue {
        flow: Flow::Upload(state),
        reply,
    }
}

fn stay_search(state: SearchState, reply: Reply) -> Outcome {
    Outcome::Continue {
        flow: Flow::Search(state),
        reply,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn text(s: &str) -> Event {
        Event::Text(s.to_string())
    }

    fn photo(id: &str) -> Event {
        Event::Photo(id.to_string())
    }

    /// Drive a flow through a list of events, asserting each continues.
    fn walk(mut flow: Flow, events: &[Event]) -> Flow {
        for event in events {
            match advance(flow, event.clone()) {
                Outcome::Continue { flow: next, .. } => flow = next,
                other => panic!("expected Continue, got {other:?}"),
            }
        }
        flow
    }

    fn flow_to_photos() -> Flow {
        walk(
            Flow::upload_start(),
            &[
                text("Bright studio near the marina"),
                text("5000"),
                text("Studio"),
                text("Dubai Marina"),
                text("+971 50 123 4567"),
            ],
        )
    }

    // ── Upload flow ─────────────────────────────────────────────────

    #[test]
    fn upload_walks_all_steps_in_order() {
        let flow = flow_to_photos();
        assert_eq!(flow.step_name(), "photos");

        let Flow::Upload(UploadState::Photos {
            description,
            price,
            kind,
            location,
            contact,
            photos,
        }) = flow
        else {
            panic!("expected photos step");
        };
        assert_eq!(description, "Bright studio near the marina");
        assert_eq!(price, 5000.0);
        assert_eq!(kind, PropertyKind::Studio);
        assert_eq!(location, "Dubai Marina");
        assert_eq!(contact, "+971 50 123 4567");
        assert!(photos.is_empty());
    }

    #[test]
    fn invalid_price_reprompts_without_transition() {
        let flow = walk(Flow::upload_start(), &[text("desc")]);
        let outcome = advance(flow.clone(), text("cheap"));
        let Outcome::Continue { flow: next, reply } = outcome else {
            panic!("expected Continue");
        };
        assert_eq!(next, flow);
        assert_eq!(reply.text, "Please enter a valid price in AED.");
    }

    #[test]
    fn zero_and_negative_prices_rejected() {
        let flow = walk(Flow::upload_start(), &[text("desc")]);
        for bad in ["0", "-50", "NaN", "inf"] {
            let Outcome::Continue { flow: next, .. } = advance(flow.clone(), text(bad)) else {
                panic!("expected Continue");
            };
            assert_eq!(next.step_name(), "price", "{bad:?} must not advance");
        }
    }

    #[test]
    fn unknown_property_type_reprompts() {
        let flow = walk(Flow::upload_start(), &[text("desc"), text("5000")]);
        let Outcome::Continue { flow: next, reply } = advance(flow, text("Castle")) else {
            panic!("expected Continue");
        };
        assert_eq!(next.step_name(), "type");
        assert_eq!(
            reply.text,
            "Please select a valid property type from the keyboard."
        );
        assert_eq!(reply.keyboard, Keyboard::UploadKinds);
    }

    #[test]
    fn invalid_phone_keeps_contact_step() {
        let flow = walk(
            Flow::upload_start(),
            &[text("desc"), text("5000"), text("Villa"), text("JLT")],
        );
        for bad in ["12345", "call me", "+971-ABC-456"] {
            let Outcome::Continue { flow: next, reply } = advance(flow.clone(), text(bad)) else {
                panic!("expected Continue");
            };
            assert_eq!(next.step_name(), "contact", "{bad:?} must not advance");
            assert_eq!(reply.text, "Please enter a valid phone number.");
        }
    }

    #[test]
    fn done_with_photos_persists_in_order() {
        let mut flow = flow_to_photos();
        for i in 0..3 {
            let Outcome::Continue { flow: next, reply } =
                advance(flow, photo(&format!("file_{i}")))
            else {
                panic!("expected Continue");
            };
            assert_eq!(
                reply.text,
                format!("Photo {}/10 received. Send more or type 'done'.", i + 1)
            );
            flow = next;
        }

        let Outcome::Persist { draft } = advance(flow, text("done")) else {
            panic!("expected Persist");
        };
        assert_eq!(draft.photos, vec!["file_0", "file_1", "file_2"]);
    }

    #[test]
    fn done_without_photos_reprompts() {
        let flow = flow_to_photos();
        let Outcome::Continue { flow: next, reply } = advance(flow, text("done")) else {
            panic!("expected Continue");
        };
        assert_eq!(next.step_name(), "photos");
        assert_eq!(reply.text, "Please send at least one photo of the property.");
    }

    #[test]
    fn tenth_photo_finalizes_automatically() {
        let mut flow = flow_to_photos();
        for i in 0..9 {
            let Outcome::Continue { flow: next, .. } = advance(flow, photo(&format!("file_{i}")))
            else {
                panic!("expected Continue");
            };
            flow = next;
        }
        let Outcome::Persist { draft } = advance(flow, photo("file_9")) else {
            panic!("expected Persist on the 10th photo");
        };
        assert_eq!(draft.photos.len(), 10);
    }

    #[test]
    fn free_text_during_photo_collection_is_ignored() {
        let mut flow = flow_to_photos();
        let Outcome::Continue { flow: next, .. } = advance(flow, photo("file_0")) else {
            panic!("expected Continue");
        };
        flow = next;
        let Outcome::Ignored { flow: kept } = advance(flow.clone(), text("is this enough?"))
        else {
            panic!("expected Ignored");
        };
        assert_eq!(kept, flow);
    }

    #[test]
    fn photo_outside_photo_step_is_ignored() {
        let flow = walk(Flow::upload_start(), &[text("desc")]);
        assert!(matches!(
            advance(flow, photo("early")),
            Outcome::Ignored { .. }
        ));
    }

    // ── Search flow ─────────────────────────────────────────────────

    #[test]
    fn any_and_skip_clear_filter_keys() {
        let flow = walk(Flow::search_start(), &[text("Any"), text("Skip"), text("Skip")]);
        let Outcome::RunSearch { filters } = advance(flow, text("Any")) else {
            panic!("expected RunSearch");
        };
        assert!(filters.is_empty());
    }

    #[test]
    fn full_filter_set_collected() {
        let flow = walk(
            Flow::search_start(),
            &[text("2BHK"), text("3000"), text("8000")],
        );
        let Outcome::RunSearch { filters } = advance(flow, text("Downtown")) else {
            panic!("expected RunSearch");
        };
        assert_eq!(filters.kind, Some(PropertyKind::TwoBhk));
        assert_eq!(filters.min_price, Some(3000.0));
        assert_eq!(filters.max_price, Some(8000.0));
        assert_eq!(filters.location.as_deref(), Some("Downtown"));
    }

    #[test]
    fn min_max_price_range_with_any_location() {
        let flow = walk(
            Flow::search_start(),
            &[text("Any"), text("300"), text("500")],
        );
        let Outcome::RunSearch { filters } = advance(flow, text("Any")) else {
            panic!("expected RunSearch");
        };
        assert_eq!(filters.min_price, Some(300.0));
        assert_eq!(filters.max_price, Some(500.0));
        assert_eq!(filters.kind, None);
        assert_eq!(filters.location, None);
    }

    #[test]
    fn max_below_min_rejected_and_min_retained() {
        let flow = walk(Flow::search_start(), &[text("Any"), text("500")]);
        let Outcome::Continue { flow: next, reply } = advance(flow, text("300")) else {
            panic!("expected Continue");
        };
        assert_eq!(reply.text, "Maximum price must be greater than minimum price");

        let Flow::Search(SearchState::PriceMax { filters }) = &next else {
            panic!("must stay at the max step");
        };
        assert_eq!(filters.min_price, Some(500.0));
        assert_eq!(filters.max_price, None);

        // Equal to the minimum is acceptable (inclusive bounds).
        let Outcome::Continue { flow: next, .. } = advance(next, text("500")) else {
            panic!("expected Continue");
        };
        let Flow::Search(SearchState::Location { filters }) = next else {
            panic!("expected location step");
        };
        assert_eq!(filters.max_price, Some(500.0));
    }

    #[test]
    fn max_price_skip_allowed_with_min_set() {
        let flow = walk(Flow::search_start(), &[text("Any"), text("500")]);
        let Outcome::Continue { flow: next, .. } = advance(flow, text("Skip")) else {
            panic!("expected Continue");
        };
        let Flow::Search(SearchState::Location { filters }) = next else {
            panic!("expected location step");
        };
        assert_eq!(filters.min_price, Some(500.0));
        assert_eq!(filters.max_price, None);
    }

    #[test]
    fn invalid_search_type_reprompts() {
        let Outcome::Continue { flow, reply } = advance(Flow::search_start(), text("Mansion"))
        else {
            panic!("expected Continue");
        };
        assert_eq!(flow.step_name(), "search_type");
        assert_eq!(reply.keyboard, Keyboard::SearchKinds);
    }

    #[test]
    fn zero_search_price_accepted() {
        let flow = walk(Flow::search_start(), &[text("Any")]);
        let Outcome::Continue { flow: next, .. } = advance(flow, text("0")) else {
            panic!("expected Continue");
        };
        let Flow::Search(SearchState::PriceMax { filters }) = next else {
            panic!("expected max step");
        };
        assert_eq!(filters.min_price, Some(0.0));
    }

    #[test]
    fn browsing_ignores_text_and_photos() {
        let browsing = Flow::Search(SearchState::Browsing {
            results: Vec::new(),
            cursor: 0,
        });
        assert!(matches!(
            advance(browsing.clone(), text("hello")),
            Outcome::Ignored { .. }
        ));
        assert!(matches!(
            advance(browsing, photo("p")),
            Outcome::Ignored { .. }
        ));
    }
}
