use std::sync::Arc;

use companion_client::{ChatBackend, ChatError, ChatResponse, StudentProfile};
use gpui::prelude::FluentBuilder as _;
use gpui::*;
use gpui_component::{
    ActiveTheme, IconName, Sizable,
    button::{Button, ButtonVariants},
    h_flex,
    label::Label,
    v_flex,
};
use gpui_tokio_bridge::Tokio;

use crate::widget::events::{BackendStatusChanged, InputEdited, Submit, WidgetToggled};
use crate::widget::state::{
    BackendStatus, PendingSend, RequestToken, SendRejection, WidgetState,
};
use crate::widget::{MessageInput, MessageList};

const PANEL_WIDTH: Pixels = px(380.);
const PANEL_HEIGHT: Pixels = px(600.);
const EDGE_OFFSET: Pixels = px(20.);

/// The floating career-help widget: a launcher button that expands into a
/// chat panel.
///
/// Owns the headless [`WidgetState`] and at most one running request task.
/// Dropping the widget drops that task.
pub struct ChatWidget {
    state: WidgetState,
    backend: Arc<dyn ChatBackend>,
    message_list: Entity<MessageList>,
    message_input: Entity<MessageInput>,
    request_task: Option<Task<()>>,
    health_task: Option<Task<()>>,
    health_checked: bool,
}

impl EventEmitter<WidgetToggled> for ChatWidget {}
impl EventEmitter<BackendStatusChanged> for ChatWidget {}

impl ChatWidget {
    pub fn new(
        backend: Arc<dyn ChatBackend>,
        profile: StudentProfile,
        window: &mut Window,
        cx: &mut Context<Self>,
    ) -> Self {
        let port = backend.config().port();
        let message_list = cx.new(MessageList::new);
        let message_input = cx.new(|cx| MessageInput::new(window, cx));

        cx.subscribe(&message_input, |this, _, event: &Submit, cx| {
            this.state.set_input(event.content.clone());
            let outcome = this.state.submit_input();
            this.dispatch(outcome, cx);
        })
        .detach();

        cx.subscribe(&message_input, |this, _, event: &InputEdited, cx| {
            this.state.set_input(event.value.clone());
            this.sync_input_gates(cx);
            cx.notify();
        })
        .detach();

        Self {
            state: WidgetState::new(profile, port),
            backend,
            message_list,
            message_input,
            request_task: None,
            health_task: None,
            health_checked: false,
        }
    }

    pub fn state(&self) -> &WidgetState {
        &self.state
    }

    pub fn open(&mut self, cx: &mut Context<Self>) {
        if self.state.is_open() {
            return;
        }

        self.state.open();
        tracing::info!("career companion opened");
        self.message_list
            .update(cx, |list, cx| list.request_scroll_to_bottom(cx));
        self.check_backend_once(cx);
        cx.emit(WidgetToggled { open: true });
        cx.notify();
    }

    pub fn close(&mut self, cx: &mut Context<Self>) {
        if !self.state.is_open() {
            return;
        }

        self.state.close();
        tracing::info!("career companion closed");
        cx.emit(WidgetToggled { open: false });
        cx.notify();
    }

    pub fn toggle(&mut self, cx: &mut Context<Self>) {
        if self.state.is_open() {
            self.close(cx);
        } else {
            self.open(cx);
        }
    }

    /// Sends `text` as if the user had typed it.
    pub fn send(&mut self, text: impl Into<String>, cx: &mut Context<Self>) {
        let outcome = self.state.begin_send(text);
        self.dispatch(outcome, cx);
    }

    /// Sends a suggestion chip or quick-start prompt and clears the typed text.
    pub fn select_suggested_action(
        &mut self,
        action: String,
        window: &mut Window,
        cx: &mut Context<Self>,
    ) {
        let outcome = self.state.select_suggested_action(action);
        if outcome.is_ok() {
            self.message_input.update(cx, |input, cx| input.clear(window, cx));
        }
        self.dispatch(outcome, cx);
    }

    fn dispatch(
        &mut self,
        outcome: Result<PendingSend, SendRejection>,
        cx: &mut Context<Self>,
    ) {
        let pending = match outcome {
            Ok(pending) => pending,
            Err(rejection) => {
                tracing::debug!(?rejection, "send rejected");
                return;
            }
        };

        self.sync_children(cx);
        cx.notify();

        let PendingSend { token, request } = pending;
        let backend = self.backend.clone();
        let request_task = Tokio::spawn(cx, async move { backend.send_chat(request).await });

        self.request_task = Some(cx.spawn(async move |this, cx| {
            let outcome = match request_task.await {
                Ok(result) => result,
                Err(error) => Err(ChatError::TaskJoin {
                    stage: "chat-request-task",
                    message: format!("{error:?}"),
                }),
            };

            let _ = this.update(cx, |this, cx| {
                this.finish_request(token, outcome, cx);
            });
        }));
    }

    fn finish_request(
        &mut self,
        token: RequestToken,
        outcome: Result<ChatResponse, ChatError>,
        cx: &mut Context<Self>,
    ) {
        if let Err(error) = &outcome {
            tracing::error!(
                stage = error.stage(),
                session_id = self.state.session_id().unwrap_or("-"),
                error = %error,
                "chat request failed"
            );
        }

        if let Err(rejection) = self.state.complete(token, outcome) {
            tracing::debug!(?rejection, "ignored stale chat completion");
            return;
        }

        self.request_task = None;
        self.sync_children(cx);
        cx.notify();
    }

    fn check_backend_once(&mut self, cx: &mut Context<Self>) {
        if self.health_checked {
            return;
        }
        self.health_checked = true;

        let backend = self.backend.clone();
        let health_task = Tokio::spawn(cx, async move { backend.health().await });

        self.health_task = Some(cx.spawn(async move |this, cx| {
            let status = match health_task.await {
                Ok(Ok(health)) if health.is_healthy() => BackendStatus::Online,
                Ok(Ok(health)) => {
                    tracing::warn!(status = %health.status, "backend reported unhealthy");
                    BackendStatus::Offline
                }
                Ok(Err(error)) => {
                    tracing::warn!(stage = error.stage(), %error, "health check failed");
                    BackendStatus::Offline
                }
                Err(error) => {
                    tracing::warn!("health check task failed: {error:?}");
                    BackendStatus::Offline
                }
            };

            let _ = this.update(cx, |this, cx| {
                this.health_task = None;
                this.state.set_backend_status(status);
                cx.emit(BackendStatusChanged { status });
                cx.notify();
            });
        }));
    }

    fn sync_children(&mut self, cx: &mut Context<Self>) {
        let typing = self.state.shows_typing_indicator();
        let messages = self.state.messages().to_vec();

        self.message_list.update(cx, |list, cx| {
            list.set_rows(&messages, typing, cx);
        });
        self.sync_input_gates(cx);
    }

    fn sync_input_gates(&mut self, cx: &mut Context<Self>) {
        let loading = self.state.is_loading();
        let submit_enabled = self.state.can_submit();

        self.message_input.update(cx, |input, cx| {
            input.set_gates(loading, submit_enabled, cx);
        });
    }

    fn render_launcher(&self, cx: &mut Context<Self>) -> AnyElement {
        Button::new("companion-launcher")
            .primary()
            .icon(IconName::CircleUser)
            .child("Career Help")
            .on_click(cx.listener(|this, _, _window, cx| {
                this.open(cx);
            }))
            .into_any_element()
    }

    fn render_header(&self, cx: &mut Context<Self>) -> impl IntoElement {
        let theme = cx.theme();

        h_flex()
            .w_full()
            .px_4()
            .py_3()
            .gap_2()
            .items_start()
            .justify_between()
            .bg(theme.primary)
            .text_color(theme.primary_foreground)
            .child(
                v_flex()
                    .gap_1()
                    .min_w_0()
                    .child(Label::new("Career Companion").font_semibold())
                    .child(Label::new(self.state.profile_summary()).text_xs())
                    .when_some(self.state.domain_badge(), |column, badge| {
                        column.child(
                            div()
                                .mt_1()
                                .px_2()
                                .py_0p5()
                                .rounded_md()
                                .bg(theme.primary_foreground.opacity(0.2))
                                .child(Label::new(badge).text_xs()),
                        )
                    }),
            )
            .child(
                Button::new("companion-close")
                    .ghost()
                    .small()
                    .icon(IconName::WindowClose)
                    .on_click(cx.listener(|this, _, _window, cx| {
                        this.close(cx);
                    })),
            )
    }

    fn render_welcome(&self, cx: &mut Context<Self>) -> impl IntoElement {
        let theme = cx.theme();

        let quick_starts = self
            .state
            .quick_starts()
            .iter()
            .enumerate()
            .map(|(index, quick_start)| {
                let prompt = quick_start.prompt;
                Button::new(("quick-start", index))
                    .small()
                    .w_full()
                    .child(quick_start.label)
                    .on_click(cx.listener(move |this, _, window, cx| {
                        this.select_suggested_action(prompt.to_string(), window, cx);
                    }))
            })
            .collect::<Vec<_>>();

        v_flex()
            .flex_1()
            .min_h_0()
            .p_4()
            .gap_3()
            .items_center()
            .justify_center()
            .child(Label::new(self.state.welcome_title()).font_semibold())
            .child(
                Label::new("How can I help with your career today?")
                    .text_sm()
                    .text_color(theme.muted_foreground),
            )
            .child(v_flex().w_full().gap_2().children(quick_starts))
    }

    fn render_suggestions(&self, cx: &mut Context<Self>) -> Option<impl IntoElement> {
        let suggestions = self.state.visible_suggestions();
        if suggestions.is_empty() {
            return None;
        }

        let theme = cx.theme();
        let chips = suggestions
            .iter()
            .enumerate()
            .map(|(index, action)| {
                let action = action.clone();
                Button::new(SharedString::from(format!("suggested-action-{index}")))
                    .small()
                    .ghost()
                    .child(action.clone())
                    .on_click(cx.listener(move |this, _, window, cx| {
                        this.select_suggested_action(action.clone(), window, cx);
                    }))
            })
            .collect::<Vec<_>>();

        Some(
            v_flex()
                .w_full()
                .px_3()
                .py_2()
                .gap_1()
                .border_t_1()
                .border_color(theme.border)
                .child(
                    Label::new("Try asking:")
                        .text_xs()
                        .text_color(theme.muted_foreground),
                )
                .child(h_flex().flex_wrap().gap_1().children(chips)),
        )
    }

    fn render_footer(&self, cx: &mut Context<Self>) -> impl IntoElement {
        let theme = cx.theme();
        let (status_label, status_color) = match self.state.backend_status() {
            BackendStatus::Unknown => ("Checking...", theme.muted_foreground),
            BackendStatus::Online => ("Online", theme.success),
            BackendStatus::Offline => ("Offline", theme.danger),
        };

        h_flex()
            .w_full()
            .px_3()
            .py_1()
            .justify_between()
            .border_t_1()
            .border_color(theme.border)
            .child(
                Label::new(self.state.footer_label())
                    .text_xs()
                    .text_color(theme.muted_foreground),
            )
            .child(
                h_flex()
                    .gap_1()
                    .items_center()
                    .child(div().size(px(6.)).rounded_full().bg(status_color))
                    .child(
                        Label::new(status_label)
                            .text_xs()
                            .text_color(theme.muted_foreground),
                    ),
            )
    }

    fn render_panel(&self, cx: &mut Context<Self>) -> AnyElement {
        let theme = cx.theme();
        let border = theme.border;
        let background = theme.background;

        let body = if self.state.shows_welcome() {
            self.render_welcome(cx).into_any_element()
        } else {
            div()
                .id("companion-message-log")
                .flex_1()
                .min_h_0()
                .child(self.message_list.clone())
                .into_any_element()
        };

        v_flex()
            .id("companion-panel")
            .w(PANEL_WIDTH)
            .h(PANEL_HEIGHT)
            .overflow_hidden()
            .rounded_lg()
            .border_1()
            .border_color(border)
            .bg(background)
            .shadow_lg()
            .child(self.render_header(cx))
            .child(body)
            .children(self.render_suggestions(cx))
            .child(self.message_input.clone())
            .child(self.render_footer(cx))
            .into_any_element()
    }
}

impl Render for ChatWidget {
    fn render(&mut self, _window: &mut Window, cx: &mut Context<Self>) -> impl IntoElement {
        let content = if self.state.is_open() {
            self.render_panel(cx)
        } else {
            self.render_launcher(cx)
        };

        div()
            .absolute()
            .bottom(EDGE_OFFSET)
            .right(EDGE_OFFSET)
            .child(content)
    }
}
