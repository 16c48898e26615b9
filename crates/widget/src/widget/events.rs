use crate::widget::state::BackendStatus;

/// Emitted when the user presses Enter or clicks send with text typed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Submit {
    pub content: String,
}

impl Submit {
    pub fn new(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
        }
    }
}

/// Emitted when the text in the input row changes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InputEdited {
    pub value: String,
}

/// Emitted by the widget whenever the panel opens or closes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct WidgetToggled {
    pub open: bool,
}

/// Emitted once the reachability check resolves.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BackendStatusChanged {
    pub status: BackendStatus,
}
