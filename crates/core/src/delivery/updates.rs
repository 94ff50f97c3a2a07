//! Inbound Bot API types used by the long-poll front end.

use serde::Deserialize;

/// One entry returned by `getUpdates`.
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct Update {
    pub update_id: i64,
    #[serde(default)]
    pub message: Option<IncomingMessage>,
}

/// A message sent to the bot.
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct IncomingMessage {
    pub message_id: i64,
    pub chat: Chat,
    #[serde(default)]
    pub from: Option<Sender>,
    #[serde(default)]
    pub text: Option<String>,
    /// Sizes of an attached photo, smallest first.
    #[serde(default)]
    pub photo: Option<Vec<PhotoSize>>,
    #[serde(default)]
    pub reply_to_message: Option<Box<IncomingMessage>>,
}

impl IncomingMessage {
    pub fn sender_id(&self) -> Option<i64> {
        self.from.as_ref().map(|u| u.id)
    }

    /// Largest rendition of the attached photo.
    pub fn largest_photo(&self) -> Option<&PhotoSize> {
        self.photo
            .as_ref()
            .and_then(|sizes| sizes.iter().max_by_key(|p| p.width * p.height))
    }
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct Chat {
    pub id: i64,
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct Sender {
    pub id: i64,
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct PhotoSize {
    pub file_id: String,
    #[serde(default)]
    pub width: i64,
    #[serde(default)]
    pub height: i64,
}
