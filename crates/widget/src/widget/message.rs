/// Stable identifier for one logged message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct MessageId(pub u64);

impl MessageId {
    /// Creates a typed message identifier.
    pub const fn new(raw: u64) -> Self {
        Self(raw)
    }
}

/// Who authored a message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Sender {
    User,
    Bot,
}

/// One entry of the append-only conversation log.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    pub id: MessageId,
    pub sender: Sender,
    pub text: String,
    /// Citations returned with a bot reply, in backend order.
    pub sources: Option<Vec<String>>,
}

impl Message {
    pub fn user(id: MessageId, text: impl Into<String>) -> Self {
        Self {
            id,
            sender: Sender::User,
            text: text.into(),
            sources: None,
        }
    }

    pub fn bot(id: MessageId, text: impl Into<String>, sources: Option<Vec<String>>) -> Self {
        Self {
            id,
            sender: Sender::Bot,
            text: text.into(),
            sources,
        }
    }

    /// Rendered citation line, present only when the reply carried sources.
    pub fn sources_label(&self) -> Option<String> {
        self.sources
            .as_ref()
            .filter(|sources| !sources.is_empty())
            .map(|sources| format!("Sources: {}", sources.join(", ")))
    }
}
