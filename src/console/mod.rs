mod profile_dialog;

use crate::api::{MemosClient, SettingsApi};
use crate::i18n::{I18n, Language};
use crate::icons::IconName;
use crate::profile::Appearance;
use crate::status::{StatusStore, SystemStatus, SystemStatusStore};
use crate::{
    CustomizeServerMenu, DisableLoggingMenu, EnableLoggingMenu, OpenLogsMenu, RefreshStatusMenu,
    configure_app_menus,
};
use gpui::prelude::FluentBuilder as _;
use gpui::*;
use gpui_component::{button::*, *};
use std::path::PathBuf;
use std::rc::Rc;
use std::sync::Arc;

pub use self::profile_dialog::{ProfileDialog, ProfileDialogEvent, StoreRefreshedHook};

const CONSOLE_CONTENT_WIDTH: f32 = 520.;
const FIELD_LABEL_WIDTH: f32 = 150.;

/// First non-empty line of an error chain, shortened for inline display.
pub(crate) fn summarize_error(raw: &str) -> String {
    const MAX_LEN: usize = 120;
    let mut message = raw
        .lines()
        .find(|line| !line.trim().is_empty())
        .unwrap_or(raw)
        .trim()
        .to_string();
    if message.is_empty() {
        message = "unknown error".to_string();
    }
    if message.chars().count() > MAX_LEN {
        message = message.chars().take(MAX_LEN - 3).collect();
        message.push_str("...");
    }
    message
}

fn theme_mode_for(appearance: &Appearance, window: &Window) -> ThemeMode {
    match appearance {
        Appearance::Light => ThemeMode::Light,
        Appearance::Dark => ThemeMode::Dark,
        Appearance::System | Appearance::Other(_) => ThemeMode::from(window.appearance()),
    }
}

pub struct AdminConsole {
    focus_handle: FocusHandle,
    language: Language,
    client: Arc<MemosClient>,
    store: Arc<SystemStatusStore>,
    refreshing: bool,
    refresh_error: Option<String>,
    applied_appearance: Option<Appearance>,
    profile_dialog: Option<Entity<ProfileDialog>>,
    _profile_dialog_subscription: Option<Subscription>,
    _window_appearance_subscription: Subscription,
    needs_root_refocus: bool,
}

impl AdminConsole {
    pub fn new(client: Arc<MemosClient>, window: &mut Window, cx: &mut Context<Self>) -> Self {
        let store = Arc::new(SystemStatusStore::new(client.clone()));
        let window_appearance_subscription =
            cx.observe_window_appearance(window, |this, window, cx| {
                if this
                    .applied_appearance
                    .as_ref()
                    .is_some_and(Appearance::follows_system)
                {
                    Theme::change(ThemeMode::from(window.appearance()), Some(window), cx);
                }
            });

        let mut console = Self {
            focus_handle: cx.focus_handle(),
            language: Language::detect(),
            client,
            store,
            refreshing: false,
            refresh_error: None,
            applied_appearance: None,
            profile_dialog: None,
            _profile_dialog_subscription: None,
            _window_appearance_subscription: window_appearance_subscription,
            needs_root_refocus: true,
        };
        console.refresh_status(window, cx);
        console
    }

    fn i18n(&self) -> I18n {
        I18n::new(self.language)
    }

    fn refresh_status(&mut self, window: &mut Window, cx: &mut Context<Self>) {
        if self.refreshing {
            return;
        }
        self.refreshing = true;
        cx.notify();

        let store = self.store.clone();
        cx.spawn_in(window, async move |this, cx| {
            let result = cx
                .background_executor()
                .spawn(async move { store.refresh_system_status() })
                .await;

            let _ = this.update_in(cx, |this, window, cx| {
                this.refreshing = false;
                match result {
                    Ok(()) => {
                        this.refresh_error = None;
                        this.apply_server_appearance(window, cx);
                    }
                    Err(err) => {
                        let message = format!("{err:#}");
                        crate::error_log!("[status] refresh failed: {}", message);
                        this.refresh_error = Some(summarize_error(&message));
                    }
                }
                cx.notify();
            });
        })
        .detach();
    }

    fn apply_server_appearance(&mut self, window: &mut Window, cx: &mut Context<Self>) {
        let appearance = self.store.customized_profile().appearance;
        if self.applied_appearance.as_ref() == Some(&appearance) {
            return;
        }
        Theme::change(theme_mode_for(&appearance, window), Some(window), cx);
        self.applied_appearance = Some(appearance);
    }

    fn open_profile_dialog(&mut self, window: &mut Window, cx: &mut Context<Self>) {
        if self.profile_dialog.is_some() {
            return;
        }
        if !self.store.snapshot().supports_customized_profile() {
            return;
        }

        let store: Arc<dyn StatusStore> = self.store.clone();
        let api: Arc<dyn SettingsApi> = self.client.clone();
        let language = self.language;
        let on_store_refreshed = self.store_refreshed_hook(cx);
        let dialog = cx.new(|cx| {
            ProfileDialog::new(store, api, language, on_store_refreshed, window, cx)
        });
        let subscription = cx.subscribe_in(
            &dialog,
            window,
            |this, _, event: &ProfileDialogEvent, _, cx| match event {
                ProfileDialogEvent::Saved | ProfileDialogEvent::Dismissed => {
                    this.close_profile_dialog(cx)
                }
            },
        );

        self.profile_dialog = Some(dialog);
        self._profile_dialog_subscription = Some(subscription);
        cx.notify();
    }

    /// A save may outlive its dialog, so the console picks up the refreshed
    /// store through a weak handle rather than the dialog's events.
    fn store_refreshed_hook(&self, cx: &mut Context<Self>) -> StoreRefreshedHook {
        let console = cx.weak_entity();
        Rc::new(move |window: &mut Window, cx: &mut App| {
            let _ = console.update(cx, |this, cx| {
                this.refresh_error = None;
                this.apply_server_appearance(window, cx);
                cx.notify();
            });
        })
    }

    fn close_profile_dialog(&mut self, cx: &mut Context<Self>) {
        let had_dialog = self.profile_dialog.take().is_some();
        self._profile_dialog_subscription = None;
        if had_dialog {
            self.needs_root_refocus = true;
            cx.notify();
        }
    }

    fn open_logs_directory(&self) {
        let log_file_path = crate::logger::log_file_path();
        let log_dir = log_file_path
            .parent()
            .map(PathBuf::from)
            .unwrap_or(log_file_path);

        let status = {
            #[cfg(target_os = "macos")]
            {
                std::process::Command::new("open").arg(&log_dir).status()
            }
            #[cfg(target_os = "windows")]
            {
                std::process::Command::new("explorer")
                    .arg(&log_dir)
                    .status()
            }
            #[cfg(all(unix, not(target_os = "macos")))]
            {
                std::process::Command::new("xdg-open")
                    .arg(&log_dir)
                    .status()
            }
        };

        match status {
            Ok(exit_status) if exit_status.success() => {
                crate::debug_log!("[log] opened logs directory: {}", log_dir.display());
            }
            Ok(exit_status) => {
                crate::debug_log!(
                    "[log] failed to open logs directory: {} | exit={}",
                    log_dir.display(),
                    exit_status
                );
            }
            Err(err) => {
                crate::debug_log!(
                    "[log] failed to open logs directory: {} | {}",
                    log_dir.display(),
                    err
                );
            }
        }
    }

    fn render_field_row(label: &'static str, value: SharedString, cx: &App) -> Div {
        div()
            .w_full()
            .flex()
            .items_start()
            .gap_3()
            .child(
                div()
                    .w(px(FIELD_LABEL_WIDTH))
                    .flex_shrink_0()
                    .text_sm()
                    .text_color(cx.theme().muted_foreground)
                    .child(label),
            )
            .child(
                div()
                    .flex_1()
                    .min_w(px(0.))
                    .text_sm()
                    .text_color(cx.theme().foreground)
                    .whitespace_normal()
                    .child(value),
            )
    }

    fn render_section(title: &'static str, cx: &App) -> Div {
        div()
            .w_full()
            .v_flex()
            .gap_2()
            .child(
                div()
                    .text_sm()
                    .text_color(cx.theme().muted_foreground)
                    .child(title),
            )
    }

    fn render_card(cx: &App) -> Div {
        div()
            .w_full()
            .rounded_md()
            .border_1()
            .border_color(cx.theme().border)
            .p_3()
            .v_flex()
            .gap_2()
    }

    fn render_status_section(&self, status: &SystemStatus, cx: &mut Context<Self>) -> Div {
        let i18n = self.i18n();
        let or_empty = |value: &str| -> SharedString {
            if value.trim().is_empty() {
                i18n.empty_value.into()
            } else {
                value.to_string().into()
            }
        };
        let host = status
            .host
            .as_ref()
            .map(|host| {
                if host.nickname.is_empty() {
                    host.username.clone()
                } else {
                    format!("{} ({})", host.nickname, host.username)
                }
            })
            .unwrap_or_default();

        Self::render_section(i18n.status_section, cx).child(
            Self::render_card(cx)
                .child(Self::render_field_row(
                    i18n.connection_label,
                    self.client.base_url().to_string().into(),
                    cx,
                ))
                .child(Self::render_field_row(
                    i18n.server_version_label,
                    or_empty(&status.profile.version),
                    cx,
                ))
                .child(Self::render_field_row(
                    i18n.server_mode_label,
                    or_empty(&status.profile.mode),
                    cx,
                ))
                .child(Self::render_field_row(i18n.server_host_label, or_empty(&host), cx))
                .child(Self::render_field_row(
                    i18n.allow_sign_up_label,
                    if status.allow_sign_up {
                        i18n.yes_label.into()
                    } else {
                        i18n.no_label.into()
                    },
                    cx,
                )),
        )
    }

    fn render_profile_section(&self, status: &SystemStatus, cx: &mut Context<Self>) -> Div {
        let i18n = self.i18n();
        let profile = &status.customized_profile;
        let or_empty = |value: &str| -> SharedString {
            if value.trim().is_empty() {
                i18n.empty_value.into()
            } else {
                value.to_string().into()
            }
        };
        let supported = status.supports_customized_profile();
        let can_customize = supported && self.store.is_loaded();

        Self::render_section(i18n.profile_section, cx).child(
            Self::render_card(cx)
                .child(Self::render_field_row(
                    i18n.profile_name_label,
                    or_empty(&profile.name),
                    cx,
                ))
                .child(Self::render_field_row(
                    i18n.profile_logo_url_label,
                    or_empty(&profile.logo_url),
                    cx,
                ))
                .child(Self::render_field_row(
                    i18n.profile_description_label,
                    or_empty(&profile.description),
                    cx,
                ))
                .child(Self::render_field_row(
                    i18n.profile_locale_label,
                    profile.locale.display_name().to_string().into(),
                    cx,
                ))
                .child(Self::render_field_row(
                    i18n.profile_appearance_label,
                    i18n.appearance_label(&profile.appearance).to_string().into(),
                    cx,
                ))
                .child(Self::render_field_row(
                    i18n.profile_external_url_label,
                    or_empty(&profile.external_url),
                    cx,
                ))
                .when(!supported, |this| {
                    this.child(
                        div()
                            .text_xs()
                            .text_color(cx.theme().muted_foreground)
                            .whitespace_normal()
                            .child(i18n.customize_unsupported(&status.profile.version)),
                    )
                })
                .child(
                    div().w_full().flex().justify_end().child(
                        Button::new("console-customize")
                            .small()
                            .primary()
                            .icon(Icon::new(IconName::Edit))
                            .label(i18n.customize_button)
                            .disabled(!can_customize)
                            .on_click(cx.listener(|this, _, window, cx| {
                                this.open_profile_dialog(window, cx);
                            })),
                    ),
                ),
        )
    }

    fn render_profile_dialog_overlay(&self, cx: &mut Context<Self>) -> Option<AnyElement> {
        let dialog = self.profile_dialog.clone()?;

        Some(
            div()
                .id("profile-dialog-overlay")
                .absolute()
                .top_0()
                .left_0()
                .right_0()
                .bottom_0()
                .bg(cx.theme().background.opacity(0.45))
                .on_scroll_wheel(cx.listener(|_, _: &ScrollWheelEvent, _, cx| {
                    cx.stop_propagation();
                }))
                .on_mouse_down(
                    MouseButton::Left,
                    cx.listener(|this, _, _, cx| {
                        this.close_profile_dialog(cx);
                    }),
                )
                .child(
                    div()
                        .absolute()
                        .top_0()
                        .left_0()
                        .right_0()
                        .bottom_0()
                        .v_flex()
                        .items_center()
                        .justify_center()
                        .child(dialog),
                )
                .into_any_element(),
        )
    }
}

impl Focusable for AdminConsole {
    fn focus_handle(&self, _cx: &App) -> FocusHandle {
        self.focus_handle.clone()
    }
}

impl Render for AdminConsole {
    fn render(&mut self, window: &mut Window, cx: &mut Context<Self>) -> impl IntoElement {
        if self.profile_dialog.is_none() && self.needs_root_refocus {
            self.needs_root_refocus = false;
            window.focus(&self.focus_handle);
        }

        let i18n = self.i18n();
        window.set_window_title(i18n.app_title);

        let status = self.store.snapshot();
        let status_line: Option<SharedString> = if let Some(error) = self.refresh_error.as_ref() {
            Some(i18n.status_refresh_failed(error).into())
        } else if self.refreshing {
            Some(i18n.status_loading.into())
        } else {
            None
        };
        let status_section = self.render_status_section(&status, cx);
        let profile_section = self.render_profile_section(&status, cx);
        let profile_dialog = self.render_profile_dialog_overlay(cx);
        let notification_layer = Root::render_notification_layer(window, cx);

        div()
            .size_full()
            .on_action(cx.listener(|this, _: &RefreshStatusMenu, window, cx| {
                this.refresh_status(window, cx);
            }))
            .on_action(cx.listener(|this, _: &CustomizeServerMenu, window, cx| {
                this.open_profile_dialog(window, cx);
            }))
            .on_action(cx.listener(|this, _: &EnableLoggingMenu, _, cx| {
                if crate::logger::enable_file_logging() {
                    configure_app_menus(cx, this.i18n());
                }
            }))
            .on_action(cx.listener(|this, _: &DisableLoggingMenu, _, cx| {
                crate::logger::disable_file_logging();
                configure_app_menus(cx, this.i18n());
            }))
            .on_action(cx.listener(|this, _: &OpenLogsMenu, _, _| {
                this.open_logs_directory();
            }))
            .child(
                div()
                    .v_flex()
                    .size_full()
                    .bg(cx.theme().background)
                    .relative()
                    .track_focus(&self.focus_handle)
                    .child(
                        TitleBar::new().child(
                            div()
                                .text_sm()
                                .text_color(cx.theme().foreground)
                                .child(i18n.app_title),
                        ),
                    )
                    .child(
                        div()
                            .id("console-body")
                            .flex_1()
                            .min_h(px(0.))
                            .w_full()
                            .overflow_y_scroll()
                            .v_flex()
                            .items_center()
                            .p_4()
                            .child(
                                div()
                                    .w(px(CONSOLE_CONTENT_WIDTH))
                                    .v_flex()
                                    .gap_4()
                                    .child(
                                        div()
                                            .w_full()
                                            .flex()
                                            .items_center()
                                            .justify_between()
                                            .gap_2()
                                            .child(
                                                div()
                                                    .flex_1()
                                                    .min_w(px(0.))
                                                    .text_xs()
                                                    .text_color(if self.refresh_error.is_some() {
                                                        cx.theme().danger
                                                    } else {
                                                        cx.theme().muted_foreground
                                                    })
                                                    .whitespace_normal()
                                                    .children(status_line),
                                            )
                                            .child(
                                                Button::new("console-refresh")
                                                    .small()
                                                    .ghost()
                                                    .icon(Icon::new(if self.refreshing {
                                                        IconName::LoaderCircle
                                                    } else {
                                                        IconName::Refresh
                                                    }))
                                                    .label(i18n.refresh_button)
                                                    .disabled(self.refreshing)
                                                    .on_click(cx.listener(
                                                        |this, _, window, cx| {
                                                            this.refresh_status(window, cx);
                                                        },
                                                    )),
                                            ),
                                    )
                                    .child(status_section)
                                    .child(profile_section),
                            ),
                    )
                    .when_some(profile_dialog, |this, dialog| this.child(dialog))
                    .children(notification_layer),
            )
    }
}
