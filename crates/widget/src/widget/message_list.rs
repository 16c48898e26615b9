use std::collections::hash_map::DefaultHasher;
use std::collections::{HashMap, HashSet};
use std::hash::Hasher;
use std::ops::Range;
use std::rc::Rc;

use gpui::prelude::FluentBuilder as _;
use gpui::*;
use gpui_component::{ActiveTheme, h_flex, label::Label, v_flex, v_virtual_list};

use crate::widget::message::{Message, MessageId, Sender};
use crate::widget::scroll_manager::ScrollManager;

const DEFAULT_CONTENT_WIDTH: Pixels = px(340.);
const LIST_HORIZONTAL_PADDING: Pixels = px(12.);
const CONTENT_WIDTH_CHANGE_EPSILON: f32 = 1.0;
const BUBBLE_MAX_WIDTH: Pixels = px(280.);
const BUBBLE_PADDING_X: Pixels = px(12.);
const BUBBLE_PADDING_Y: Pixels = px(8.);
const SOURCES_ROW_HEIGHT: Pixels = px(16.);
const SOURCES_ROW_GAP: Pixels = px(4.);
const TYPING_ROW_HEIGHT: Pixels = px(36.);
const ESTIMATED_TEXT_LINE_HEIGHT: Pixels = px(18.);
const ESTIMATED_CHAR_WIDTH: f32 = 7.0;

/// Size-cache key; the typing indicator has no message id of its own.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
enum RowKey {
    Message(MessageId),
    Typing,
}

#[derive(Debug, Clone)]
enum Row {
    Message(Message),
    Typing,
}

impl Row {
    fn key(&self) -> RowKey {
        match self {
            Row::Message(message) => RowKey::Message(message.id),
            Row::Typing => RowKey::Typing,
        }
    }
}

struct SizeCacheEntry {
    layout_hash: u64,
    height: Pixels,
    measured: bool,
}

/// Scrolling conversation log, newest row at the bottom.
pub struct MessageList {
    rows: Vec<Row>,
    item_sizes: Rc<Vec<Size<Pixels>>>,
    scroll_manager: ScrollManager,
    size_cache: HashMap<RowKey, SizeCacheEntry>,
    content_width: Option<Pixels>,
}

impl MessageList {
    pub fn new(_cx: &mut Context<Self>) -> Self {
        Self {
            rows: Vec::new(),
            item_sizes: Rc::new(Vec::new()),
            scroll_manager: ScrollManager::new(),
            size_cache: HashMap::new(),
            content_width: None,
        }
    }

    /// Replaces the rendered log; a trailing typing row is shown while `typing`.
    pub fn set_rows(&mut self, messages: &[Message], typing: bool, cx: &mut Context<Self>) {
        let mut rows = messages
            .iter()
            .cloned()
            .map(Row::Message)
            .collect::<Vec<_>>();
        if typing {
            rows.push(Row::Typing);
        }

        self.rows = rows;
        self.rebuild_item_sizes();
        self.scroll_manager.observe_rows(messages.len(), typing);
        cx.notify();
    }

    pub fn request_scroll_to_bottom(&mut self, cx: &mut Context<Self>) {
        self.scroll_manager.request_scroll_to_bottom();
        cx.notify();
    }

    fn update_content_width(&mut self, cx: &mut Context<Self>) {
        let list_width = self.scroll_manager.bounds_width();
        if list_width <= Pixels::ZERO {
            return;
        }

        let next_content_width = max_pixels(px(1.), list_width - LIST_HORIZONTAL_PADDING * 2);
        let width_changed = self.content_width.is_none_or(|current| {
            (f32::from(current) - f32::from(next_content_width)).abs()
                > CONTENT_WIDTH_CHANGE_EPSILON
        });

        if width_changed {
            self.content_width = Some(next_content_width);
            for entry in self.size_cache.values_mut() {
                entry.measured = false;
            }

            self.rebuild_item_sizes();
            cx.notify();
        }
    }

    fn rebuild_item_sizes(&mut self) {
        let content_width = self.content_width.unwrap_or(DEFAULT_CONTENT_WIDTH);
        let mut active_keys = HashSet::with_capacity(self.rows.len());
        let mut sizes = Vec::with_capacity(self.rows.len());

        for row in &self.rows {
            let key = row.key();
            let next_hash = layout_hash(row);
            let estimated_height = estimate_row_height(row, content_width);

            let entry = self.size_cache.entry(key).or_insert(SizeCacheEntry {
                layout_hash: next_hash,
                height: estimated_height,
                measured: false,
            });

            if entry.layout_hash != next_hash {
                entry.layout_hash = next_hash;
                entry.height = estimated_height;
                entry.measured = false;
            } else if !entry.measured {
                entry.height = estimated_height;
            }

            sizes.push(size(px(0.), entry.height));
            active_keys.insert(key);
        }

        self.size_cache.retain(|key, _| active_keys.contains(key));
        self.item_sizes = Rc::new(sizes);
    }

    fn measure_visible_items(
        &mut self,
        visible_range: Range<usize>,
        window: &mut Window,
        cx: &mut Context<Self>,
    ) {
        if self.rows.is_empty() {
            return;
        }

        let content_width = self.content_width.unwrap_or(DEFAULT_CONTENT_WIDTH);
        let available_space = size(
            AvailableSpace::Definite(content_width),
            AvailableSpace::MinContent,
        );
        let mut updated = false;

        for index in visible_range {
            let Some(row) = self.rows.get(index).cloned() else {
                continue;
            };

            let mut element = self.render_row(&row, cx);
            let measured_height = element.layout_as_root(available_space, window, cx).height;
            let Some(entry) = self.size_cache.get_mut(&row.key()) else {
                continue;
            };
            if !entry.measured || pixels_changed(entry.height, measured_height) {
                entry.height = measured_height;
                updated = true;
            }
            entry.measured = true;
        }

        if updated {
            self.rebuild_item_sizes();
            cx.notify();
        }
    }

    fn render_row(&self, row: &Row, cx: &mut Context<Self>) -> AnyElement {
        match row {
            Row::Message(message) => self.render_message(message, cx),
            Row::Typing => self.render_typing(cx),
        }
    }

    fn render_message(&self, message: &Message, cx: &mut Context<Self>) -> AnyElement {
        let theme = cx.theme();
        let text = if message.text.is_empty() {
            " ".to_string()
        } else {
            message.text.clone()
        };

        if message.sender == Sender::User {
            return v_flex()
                .w_full()
                .items_end()
                .child(
                    div()
                        .max_w(BUBBLE_MAX_WIDTH)
                        .px(BUBBLE_PADDING_X)
                        .py(BUBBLE_PADDING_Y)
                        .rounded_lg()
                        .bg(theme.primary)
                        .text_color(theme.primary_foreground)
                        .child(Label::new(text).text_sm()),
                )
                .into_any_element();
        }

        v_flex()
            .w_full()
            .items_start()
            .gap(SOURCES_ROW_GAP)
            .child(
                div()
                    .max_w(BUBBLE_MAX_WIDTH)
                    .px(BUBBLE_PADDING_X)
                    .py(BUBBLE_PADDING_Y)
                    .rounded_lg()
                    .bg(theme.muted)
                    .text_color(theme.foreground)
                    .child(Label::new(text).text_sm()),
            )
            .when_some(message.sources_label(), |column, label| {
                column.child(
                    Label::new(label)
                        .text_xs()
                        .text_color(theme.muted_foreground),
                )
            })
            .into_any_element()
    }

    fn render_typing(&self, cx: &mut Context<Self>) -> AnyElement {
        let theme = cx.theme();
        let dot = || div().size(px(6.)).rounded_full().bg(theme.muted_foreground);

        h_flex()
            .w_full()
            .child(
                h_flex()
                    .gap_1()
                    .px(BUBBLE_PADDING_X)
                    .py(BUBBLE_PADDING_Y)
                    .rounded_lg()
                    .bg(theme.muted)
                    .child(dot())
                    .child(dot())
                    .child(dot()),
            )
            .into_any_element()
    }
}

impl Render for MessageList {
    fn render(&mut self, _window: &mut Window, cx: &mut Context<Self>) -> impl IntoElement {
        self.update_content_width(cx);
        if self.scroll_manager.apply_pending_scroll() {
            cx.notify();
        }

        v_flex().size_full().min_h_0().child(
            v_virtual_list(
                cx.entity().clone(),
                "companion-message-list",
                self.item_sizes.clone(),
                |this, visible_range, window, cx| {
                    this.update_content_width(cx);
                    this.measure_visible_items(visible_range.clone(), window, cx);
                    visible_range
                        .filter_map(|index| {
                            this.rows
                                .get(index)
                                .cloned()
                                .map(|row| this.render_row(&row, cx))
                        })
                        .collect::<Vec<_>>()
                },
            )
            .size_full()
            .px_3()
            .py_3()
            .gap_3()
            .track_scroll(self.scroll_manager.handle()),
        )
    }
}

fn layout_hash(row: &Row) -> u64 {
    let mut hasher = DefaultHasher::new();

    match row {
        Row::Typing => hasher.write_u8(0),
        Row::Message(message) => {
            hasher.write_u8(1);
            hasher.write_u64(message.id.0);
            hasher.write_u8(match message.sender {
                Sender::User => 0,
                Sender::Bot => 1,
            });
            hasher.write(message.text.as_bytes());
            if let Some(label) = message.sources_label() {
                hasher.write(label.as_bytes());
            }
        }
    }

    hasher.finish()
}

fn estimate_row_height(row: &Row, content_width: Pixels) -> Pixels {
    let message = match row {
        Row::Typing => return TYPING_ROW_HEIGHT,
        Row::Message(message) => message,
    };

    let bubble_width = min_pixels(content_width, BUBBLE_MAX_WIDTH);
    let text_width = max_pixels(px(1.), bubble_width - BUBBLE_PADDING_X * 2);
    let mut height = estimate_text_height(&message.text, text_width) + BUBBLE_PADDING_Y * 2;

    if message.sources_label().is_some() {
        height += SOURCES_ROW_GAP + SOURCES_ROW_HEIGHT;
    }

    height
}

fn estimate_text_height(content: &str, width: Pixels) -> Pixels {
    if content.is_empty() {
        return ESTIMATED_TEXT_LINE_HEIGHT;
    }

    let chars_per_line = (f32::from(width) / ESTIMATED_CHAR_WIDTH).floor().max(1.0) as usize;

    let mut line_count = 0usize;
    for line in content.lines() {
        let char_count = line.chars().count().max(1);
        line_count += char_count.div_ceil(chars_per_line);
    }

    if content.ends_with('\n') {
        line_count += 1;
    }

    ESTIMATED_TEXT_LINE_HEIGHT * line_count.max(1)
}

fn max_pixels(a: Pixels, b: Pixels) -> Pixels {
    if f32::from(a) >= f32::from(b) { a } else { b }
}

fn min_pixels(a: Pixels, b: Pixels) -> Pixels {
    if f32::from(a) <= f32::from(b) { a } else { b }
}

fn pixels_changed(a: Pixels, b: Pixels) -> bool {
    (f32::from(a) - f32::from(b)).abs() > 0.5
}
