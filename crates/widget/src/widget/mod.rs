/// Events exchanged between the widget and its child views.
pub mod events;
pub mod message;
pub mod message_input;
pub mod message_list;
pub mod scroll_manager;
/// Headless widget state and render decisions.
pub mod state;
pub mod view;

pub use events::{BackendStatusChanged, InputEdited, Submit, WidgetToggled};
pub use message::{Message, MessageId, Sender};
pub use message_input::MessageInput;
pub use message_list::MessageList;
pub use scroll_manager::ScrollManager;
pub use state::{
    BackendStatus, CompletionRejection, PendingSend, QUICK_STARTS, QuickStart, RequestToken,
    SendRejection, WidgetState,
};
pub use view::ChatWidget;
