use uuid::Uuid;

use strum::{AsRefStr, EnumIter, EnumString, IntoStaticStr};

use crate::client::BotReply;

/// Mood colors the user can tag a message with.
///
/// At most one color is selected at a time; re-selecting the active one
/// clears it. Wire names are kebab-case.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, EnumString, EnumIter, AsRefStr, IntoStaticStr,
)]
#[strum(serialize_all = "kebab-case", ascii_case_insensitive)]
pub enum ColorTag {
    Red,
    Orange,
    Yellow,
    Green,
    Blue,
    Purple,
}

impl ColorTag {
    /// Name sent to the backend and accepted by `/color`.
    pub fn wire_name(self) -> &'static str {
        self.into()
    }

    pub fn display_name(self) -> &'static str {
        match self {
            ColorTag::Red => "Red",
            ColorTag::Orange => "Orange",
            ColorTag::Yellow => "Yellow",
            ColorTag::Green => "Green",
            ColorTag::Blue => "Blue",
            ColorTag::Purple => "Purple",
        }
    }
}

/// Author of a transcript message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    User,
    Bot,
}

/// Completion events delivered by the recommendation client for a single
/// dispatched request.
#[derive(Debug, Clone)]
pub enum ChatEvent {
    /// The backend answered with a playlist.
    Reply { request_id: Uuid, reply: BotReply },

    /// The round trip failed; `message` is the human-readable reason.
    Failed { request_id: Uuid, message: String },
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;
    use strum::IntoEnumIterator;

    #[test]
    fn wire_names_are_kebab_case() {
        assert_eq!(ColorTag::Red.wire_name(), "red");
        assert_eq!(ColorTag::Purple.wire_name(), "purple");
    }

    #[test]
    fn parsing_is_case_insensitive() {
        assert_eq!(ColorTag::from_str("Blue").unwrap(), ColorTag::Blue);
        assert_eq!(ColorTag::from_str("GREEN").unwrap(), ColorTag::Green);
        assert!(ColorTag::from_str("magenta").is_err());
    }

    #[test]
    fn every_color_round_trips_through_its_wire_name() {
        for tag in ColorTag::iter() {
            assert_eq!(ColorTag::from_str(tag.wire_name()).unwrap(), tag);
        }
    }
}
