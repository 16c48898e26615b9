use std::sync::Arc;

use companion_client::ChatBackend;
use gpui::*;
use gpui_component::{ActiveTheme, Icon, IconName, h_flex, label::Label, v_flex};

use crate::settings::WidgetSettings;
use crate::widget::{BackendStatusChanged, ChatWidget, WidgetToggled};

gpui::actions!(companion, [ToggleWidget, Quit]);

/// Demo host page with the career widget floating in its bottom-right corner.
///
/// Stands in for the web page the widget is embedded into: the host owns
/// the profile and backend and only observes the widget through events.
pub struct CompanionHost {
    widget: Entity<ChatWidget>,
    endpoint: SharedString,
}

impl CompanionHost {
    pub fn new(
        settings: &WidgetSettings,
        backend: Arc<dyn ChatBackend>,
        window: &mut Window,
        cx: &mut Context<Self>,
    ) -> Self {
        let profile = settings.profile.clone();
        let widget = cx.new(|cx| ChatWidget::new(backend, profile, window, cx));

        cx.subscribe(&widget, |_, _, event: &WidgetToggled, _cx| {
            tracing::debug!(open = event.open, "widget toggled");
        })
        .detach();

        cx.subscribe(&widget, |_, _, event: &BackendStatusChanged, cx| {
            tracing::info!(status = ?event.status, "backend status resolved");
            cx.notify();
        })
        .detach();

        Self {
            widget,
            endpoint: settings.endpoint.clone().into(),
        }
    }

    fn toggle_widget(&mut self, cx: &mut Context<Self>) {
        self.widget.update(cx, |widget, cx| widget.toggle(cx));
    }
}

impl Render for CompanionHost {
    fn render(&mut self, _window: &mut Window, cx: &mut Context<Self>) -> impl IntoElement {
        let theme = cx.theme();

        div()
            .id("companion-host")
            .size_full()
            .relative()
            .bg(theme.background)
            .on_action(cx.listener(|this, _: &ToggleWidget, _window, cx| {
                this.toggle_widget(cx);
            }))
            .child(
                v_flex()
                    .size_full()
                    .child(self.render_top_bar(cx))
                    .child(self.render_page(cx)),
            )
            .child(self.widget.clone())
    }
}

impl CompanionHost {
    fn render_top_bar(&self, cx: &Context<Self>) -> impl IntoElement {
        let theme = cx.theme();

        h_flex()
            .id("host-top-bar")
            .w_full()
            .h(px(44.))
            .flex_shrink_0()
            .px_4()
            .gap_2()
            .items_center()
            .justify_between()
            .border_b_1()
            .border_color(theme.border)
            .child(
                h_flex()
                    .gap_2()
                    .items_center()
                    .child(Icon::new(IconName::CircleUser).size(px(16.)))
                    .child(Label::new("Placement Portal").text_sm()),
            )
            .child(
                div()
                    .id("host-endpoint")
                    .px_2()
                    .py_1()
                    .rounded_full()
                    .bg(theme.muted)
                    .border_1()
                    .border_color(theme.border)
                    .text_xs()
                    .text_color(theme.muted_foreground)
                    .child(self.endpoint.clone()),
            )
    }

    fn render_page(&self, cx: &Context<Self>) -> impl IntoElement {
        let theme = cx.theme();

        v_flex()
            .id("host-page")
            .flex_1()
            .min_h_0()
            .p_8()
            .gap_3()
            .child(Label::new("Campus Placement Cell").text_xl().font_semibold())
            .child(
                Label::new("Drives, internships and preparation resources for final-year students.")
                    .text_sm()
                    .text_color(theme.muted_foreground),
            )
            .child(
                Label::new("Open Career Help in the corner, or press cmd-k, to talk to the companion.")
                    .text_sm()
                    .text_color(theme.muted_foreground),
            )
    }
}
