#![deny(unsafe_code)]

/// Floating career-guidance chat widget built with GPUI and gpui-component.
///
/// The widget itself lives in [`widget`]; [`app`] is a small host window
/// used to run it standalone.
pub mod app;
/// Settings persistence.
pub mod settings;
/// Widget state, views and events.
pub mod widget;
