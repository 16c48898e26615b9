use gpui::*;
use gpui_component::{
    ActiveTheme, Disableable, IconName, Sizable,
    button::{Button, ButtonVariants},
    h_flex,
    input::{Input, InputEvent, InputState},
};

use crate::widget::events::{InputEdited, Submit};

const PLACEHOLDER: &str = "Ask about placements, skills, interviews...";

/// Single-line text entry with a send button.
///
/// Enter submits. Whether submitting is allowed is decided by the owning
/// widget and pushed in through [`MessageInput::set_gates`].
pub struct MessageInput {
    input_state: Entity<InputState>,
    is_loading: bool,
    submit_enabled: bool,
    last_value: String,
}

impl EventEmitter<Submit> for MessageInput {}
impl EventEmitter<InputEdited> for MessageInput {}

impl MessageInput {
    pub fn new(window: &mut Window, cx: &mut Context<Self>) -> Self {
        let input_state = cx.new(|cx| {
            InputState::new(window, cx)
                .placeholder(PLACEHOLDER)
                .clean_on_escape()
        });

        cx.subscribe_in(
            &input_state,
            window,
            |this, _, event: &InputEvent, window, cx| {
                if let InputEvent::PressEnter { secondary: false } = event {
                    this.handle_submit(window, cx);
                }
            },
        )
        .detach();

        cx.observe(&input_state, |this, state, cx| {
            let value = state.read(cx).value().to_string();
            if value != this.last_value {
                this.last_value = value.clone();
                cx.emit(InputEdited { value });
                cx.notify();
            }
        })
        .detach();

        Self {
            input_state,
            is_loading: false,
            submit_enabled: false,
            last_value: String::new(),
        }
    }

    /// `loading` locks the text field; `submit_enabled` gates Enter and the send button.
    pub fn set_gates(&mut self, loading: bool, submit_enabled: bool, cx: &mut Context<Self>) {
        if self.is_loading != loading || self.submit_enabled != submit_enabled {
            self.is_loading = loading;
            self.submit_enabled = submit_enabled;
            cx.notify();
        }
    }

    pub fn clear(&mut self, window: &mut Window, cx: &mut Context<Self>) {
        self.input_state.update(cx, |state, cx| {
            state.set_value("", window, cx);
        });
        self.last_value.clear();
        cx.notify();
    }

    fn handle_submit(&mut self, window: &mut Window, cx: &mut Context<Self>) {
        if !self.submit_enabled {
            return;
        }

        let content = self.input_state.read(cx).value().to_string();
        cx.emit(Submit::new(content));
        self.clear(window, cx);
    }
}

impl Render for MessageInput {
    fn render(&mut self, _window: &mut Window, cx: &mut Context<Self>) -> impl IntoElement {
        let theme = cx.theme();
        let is_loading = self.is_loading;

        h_flex()
            .w_full()
            .gap_2()
            .p_3()
            .items_center()
            .border_t_1()
            .border_color(theme.border)
            .bg(theme.background)
            .child(
                div()
                    .flex_1()
                    .min_w_0()
                    .child(Input::new(&self.input_state).w_full().disabled(is_loading)),
            )
            .child(
                Button::new("send")
                    .small()
                    .primary()
                    .icon(IconName::ArrowUp)
                    .disabled(!self.submit_enabled)
                    .on_click(cx.listener(|this, _, window, cx| {
                        this.handle_submit(window, cx);
                    })),
            )
    }
}
