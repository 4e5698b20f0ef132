//! Outbound transport seam: the primitives the bot sends through, plus
//! keyboard and callback-action types shared by the dialog and the pager.

use async_trait::async_trait;

use crate::error::ChannelError;

/// Fixed menu-button texts. These double as the reply-keyboard labels and
/// the inbound commands that always succeed, with or without a session.
pub mod menu {
    pub const SEARCH: &str = "🏡 Search Property";
    pub const UPLOAD: &str = "📤 Upload Property";
    pub const WEBSITE: &str = "🌐 Website";
    pub const CONTACT_AGENT: &str = "📞 Contact Agent";
    pub const BACK_TO_MAIN: &str = "↩️ Back to Main Menu";
}

/// Reply/inline keyboard attached to an outgoing text message.
#[derive(Debug, Clone, PartialEq)]
pub enum Keyboard {
    /// No reply markup.
    None,
    /// Main menu reply keyboard.
    Main,
    /// The 12 property types (upload flow).
    UploadKinds,
    /// "Any" plus the 12 property types (search flow).
    SearchKinds,
    /// "Skip" (search price steps).
    SkipPrice,
    /// "Any" (search location step).
    AnyLocation,
    /// One row of inline callback buttons.
    Inline(Vec<InlineButton>),
}

/// A single inline callback button.
#[derive(Debug, Clone, PartialEq)]
pub struct InlineButton {
    pub label: &'static str,
    pub action: CallbackAction,
}

/// Inline-button callback actions.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum CallbackAction {
    /// Reveal the contact text for a listing.
    Contact(i64),
    /// Advance the result cursor.
    NextProperty,
    /// Restart the search flow.
    NewSearch,
}

impl CallbackAction {
    /// Wire representation for `callback_data`.
    pub fn data(&self) -> String {
        match self {
            Self::Contact(id) => format!("contact_{id}"),
            Self::NextProperty => "next_property".to_string(),
            Self::NewSearch => "new_search".to_string(),
        }
    }

    pub fn parse(data: &str) -> Option<Self> {
        match data {
            "next_property" => Some(Self::NextProperty),
            "new_search" => Some(Self::NewSearch),
            _ => {
                let id = data.strip_prefix("contact_")?;
                id.parse().ok().map(Self::Contact)
            }
        }
    }
}

/// The outbound primitives the dispatcher sends through. Implemented by the
/// Telegram channel and wrapped by the delivery guard; tests substitute a
/// recording fake.
#[async_trait]
pub trait Outbound: Send + Sync {
    /// Send a text message, optionally with a keyboard.
    async fn send_text(
        &self,
        chat_id: i64,
        text: &str,
        keyboard: &Keyboard,
    ) -> Result<(), ChannelError>;

    /// Send a grouped set of photos; the caption rides on the first photo.
    async fn send_media_group(
        &self,
        chat_id: i64,
        photos: &[String],
        caption: &str,
    ) -> Result<(), ChannelError>;

    /// Acknowledge an inline-button callback.
    async fn answer_callback(&self, callback_id: &str) -> Result<(), ChannelError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn callback_data_roundtrip() {
        for action in [
            CallbackAction::Contact(42),
            CallbackAction::NextProperty,
            CallbackAction::NewSearch,
        ] {
            assert_eq!(CallbackAction::parse(&action.data()), Some(action));
        }
    }

    #[test]
    fn unknown_callback_data_rejected() {
        assert_eq!(CallbackAction::parse("contact_abc"), None);
        assert_eq!(CallbackAction::parse("contact_"), None);
        assert_eq!(CallbackAction::parse("previous_property"), None);
        assert_eq!(CallbackAction::parse(""), None);
    }
}
