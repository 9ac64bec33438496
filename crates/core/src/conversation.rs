//! Conversation-related types.

use agent_land_model::ModelMessage;

/// The messages exchanged during a run, in order.
#[derive(Clone, Default, Debug, PartialEq)]
pub struct Conversation {
    pub(crate) items: Vec<Item>,
}

impl Conversation {
    pub(crate) fn push(&mut self, msg: ModelMessage) {
        let transcript = match &msg {
            ModelMessage::System(text) | ModelMessage::User(text) => {
                text.clone()
            }
            ModelMessage::Assistant { content, .. } => content.clone(),
            ModelMessage::Tool(result) => result.content.clone(),
        };
        self.items.push(Item { msg, transcript });
    }

    pub(crate) fn messages(&self) -> Vec<ModelMessage> {
        self.items.iter().map(|item| item.msg.clone()).collect()
    }

    /// Returns the items of the conversation.
    #[inline]
    pub fn items(&self) -> &[Item] {
        &self.items
    }

    /// Returns the number of items.
    #[inline]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Returns `true` if nothing has been exchanged.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

/// An item in the conversation.
#[derive(Clone, Debug, PartialEq)]
pub struct Item {
    pub(crate) msg: ModelMessage,
    pub(crate) transcript: String,
}

impl Item {
    /// Returns the underlying message.
    #[inline]
    pub fn message(&self) -> &ModelMessage {
        &self.msg
    }

    /// Returns the transcript of this item.
    ///
    /// The transcript is a string representation of the message item,
    /// which can be exported later. But transcript alone is not enough
    /// to reconstruct the message item.
    #[inline]
    pub fn transcript(&self) -> &str {
        &self.transcript
    }
}
