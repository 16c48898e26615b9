use gpui::*;
use gpui_component::Root;
use tracing_subscriber::EnvFilter;

use career_companion::app::{CompanionHost, Quit, ToggleWidget};
use career_companion::settings::SettingsStore;

/// Boots the demo host window.
///
/// Settings are loaded before the event loop so the backend can be built
/// once; a backend that cannot be built is fatal.
fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let settings_store = SettingsStore::load();
    let settings = settings_store.settings();
    tracing::info!(
        endpoint = %settings.endpoint,
        config = ?settings_store.config_path(),
        "loaded settings"
    );

    let backend = match companion_client::create_backend(settings.backend_config()) {
        Ok(backend) => backend,
        Err(error) => {
            tracing::error!(stage = error.stage(), "failed to create chat backend: {error}");
            std::process::exit(1);
        }
    };

    let app = Application::new().with_assets(gpui_component_assets::Assets);

    app.run(move |cx| {
        gpui_tokio_bridge::init(cx);

        // Must run before any Root is created.
        gpui_component::init(cx);
        settings.apply_theme(None, cx);

        cx.on_action(|_: &Quit, cx| {
            cx.quit();
        });

        cx.bind_keys([
            KeyBinding::new("cmd-q", Quit, None),
            KeyBinding::new("cmd-k", ToggleWidget, None),
        ]);

        cx.spawn(async move |cx| {
            cx.update(|cx| {
                let options = WindowOptions {
                    window_bounds: Some(WindowBounds::Windowed(Bounds::centered(
                        None,
                        size(px(1100.), px(760.)),
                        cx,
                    ))),
                    ..Default::default()
                };

                cx.open_window(options, |window, cx| {
                    let host = cx.new(|cx| CompanionHost::new(&settings, backend, window, cx));
                    cx.new(|cx| Root::new(host, window, cx))
                })
                .expect("failed to open main window");

                cx.activate(true);
            })
        })
        .detach();
    });
}
