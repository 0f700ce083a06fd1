#![cfg_attr(
    all(target_os = "windows", not(debug_assertions)),
    windows_subsystem = "windows"
)]

mod api;
mod config;
mod console;
pub mod i18n;
pub mod icons;
pub mod logger;
mod profile;
mod profile_editor;
mod status;

use api::MemosClient;
use config::ConnectionConfig;
use console::AdminConsole;
use gpui::*;
use gpui_component::*;
use std::sync::Arc;

#[cfg(target_os = "linux")]
const MEMOS_ADMIN_LINUX_BACKEND_ENV: &str = "MEMOS_ADMIN_LINUX_BACKEND";
const DEFAULT_WINDOW_WIDTH: f32 = 720.;
const DEFAULT_WINDOW_HEIGHT: f32 = 760.;

gpui::actions!(
    memos_admin,
    [
        RefreshStatusMenu,
        CustomizeServerMenu,
        EnableLoggingMenu,
        DisableLoggingMenu,
        OpenLogsMenu
    ]
);

pub(crate) fn configure_app_menus(cx: &mut App, i18n: i18n::I18n) {
    let mut items = vec![
        MenuItem::action(i18n.refresh_button, RefreshStatusMenu),
        MenuItem::action(i18n.customize_button, CustomizeServerMenu),
        MenuItem::separator(),
    ];

    if logger::file_logging_enabled() {
        items.extend([
            MenuItem::action(i18n.open_logs_button, OpenLogsMenu),
            MenuItem::separator(),
            MenuItem::action(i18n.disable_logging_button, DisableLoggingMenu),
        ]);
    } else {
        items.push(MenuItem::action(
            i18n.enable_logging_button,
            EnableLoggingMenu,
        ));
    }

    cx.set_menus(vec![Menu {
        name: i18n.app_title.into(),
        items,
    }]);
}

#[cfg(target_os = "linux")]
fn running_inside_wsl() -> bool {
    if std::env::var_os("WSL_DISTRO_NAME").is_some() || std::env::var_os("WSL_INTEROP").is_some()
    {
        return true;
    }

    std::fs::read_to_string("/proc/sys/kernel/osrelease")
        .map(|release| release.to_ascii_lowercase().contains("microsoft"))
        .unwrap_or(false)
}

#[cfg(target_os = "linux")]
fn has_non_empty_env(key: &str) -> bool {
    std::env::var_os(key).is_some_and(|value| !value.is_empty())
}

#[cfg(target_os = "linux")]
fn configure_linux_display_backend() {
    let requested_backend = std::env::var(MEMOS_ADMIN_LINUX_BACKEND_ENV)
        .ok()
        .map(|value| value.trim().to_ascii_lowercase());

    match requested_backend.as_deref() {
        Some("wayland") => {
            crate::debug_log!(
                "[linux] backend override: {}=wayland",
                MEMOS_ADMIN_LINUX_BACKEND_ENV
            );
            return;
        }
        Some("x11") => {
            if has_non_empty_env("WAYLAND_DISPLAY") {
                // Safe here: this runs before any threads are spawned.
                unsafe { std::env::remove_var("WAYLAND_DISPLAY") };
            }
            crate::debug_log!(
                "[linux] backend override: {}=x11",
                MEMOS_ADMIN_LINUX_BACKEND_ENV
            );
            return;
        }
        Some("auto") | None => {}
        Some(other) => {
            crate::debug_log!(
                "[linux] invalid {} value '{}', expected auto/x11/wayland; using auto",
                MEMOS_ADMIN_LINUX_BACKEND_ENV,
                other
            );
        }
    }

    if running_inside_wsl() && has_non_empty_env("WAYLAND_DISPLAY") && has_non_empty_env("DISPLAY")
    {
        // Safe here: this runs before any threads are spawned.
        unsafe { std::env::remove_var("WAYLAND_DISPLAY") };
        crate::debug_log!(
            "[linux] detected WSL with DISPLAY and WAYLAND_DISPLAY; forcing X11. set {}=wayland to override",
            MEMOS_ADMIN_LINUX_BACKEND_ENV
        );
    }
}

fn main() {
    logger::initialize();
    #[cfg(target_os = "linux")]
    configure_linux_display_backend();

    let config = ConnectionConfig::load();
    let client = match MemosClient::new(&config) {
        Ok(client) => Arc::new(client),
        Err(err) => {
            crate::error_log!("[api] {:#}", err);
            return;
        }
    };

    let app = Application::new().with_assets(icons::Assets);
    let language = i18n::Language::detect();
    let i18n = i18n::I18n::new(language);

    app.run(move |cx| {
        configure_app_menus(cx, i18n);

        gpui_component::init(cx);
        Theme::change(cx.window_appearance(), None, cx);
        cx.on_window_closed(|cx| {
            if cx.windows().is_empty() {
                cx.quit();
            }
        })
        .detach();

        cx.spawn(async move |cx| {
            let window_bounds = cx.update(|app| {
                WindowBounds::centered(
                    size(px(DEFAULT_WINDOW_WIDTH), px(DEFAULT_WINDOW_HEIGHT)),
                    app,
                )
            })?;

            let window_options = WindowOptions {
                titlebar: Some(TitleBar::title_bar_options()),
                window_decorations: Some(WindowDecorations::Client),
                window_bounds: Some(window_bounds),
                ..WindowOptions::default()
            };

            cx.open_window(window_options, |window, cx| {
                let view = cx.new(|cx| AdminConsole::new(client, window, cx));
                cx.new(|cx| Root::new(view, window, cx))
            })?;
            Ok::<_, anyhow::Error>(())
        })
        .detach();

        cx.activate(true);
    });
}
