use crate::api::SettingsApi;
use crate::i18n::{I18n, Language};
use crate::icons::IconName;
use crate::profile::{Appearance, Locale, ProfileField};
use crate::profile_editor::{ProfileEditor, ProfileError, SaveOutcome};
use crate::status::StatusStore;
use gpui::prelude::FluentBuilder as _;
use gpui::*;
use gpui_component::input::{Input, InputEvent, InputState};
use gpui_component::notification::Notification;
use gpui_component::select::{SearchableVec, Select, SelectEvent, SelectState};
use gpui_component::{button::*, *};
use std::rc::Rc;
use std::sync::Arc;

use super::summarize_error;

const PROFILE_DIALOG_WIDTH: f32 = 360.;

type LabelSelect = SelectState<SearchableVec<SharedString>>;

/// Runs on the window after a save has refreshed the status store, whether
/// or not the dialog is still open.
pub type StoreRefreshedHook = Rc<dyn Fn(&mut Window, &mut App)>;

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ProfileDialogEvent {
    Saved,
    Dismissed,
}

pub struct ProfileDialog {
    language: Language,
    editor: ProfileEditor,
    api: Arc<dyn SettingsApi>,
    store: Arc<dyn StatusStore>,
    on_store_refreshed: StoreRefreshedHook,
    locale_choices: Vec<Locale>,
    appearance_choices: Vec<Appearance>,
    name_input: Entity<InputState>,
    logo_url_input: Entity<InputState>,
    description_input: Entity<InputState>,
    external_url_input: Entity<InputState>,
    locale_select: Entity<LabelSelect>,
    appearance_select: Entity<LabelSelect>,
    error_message: Option<String>,
    needs_focus: bool,
    _subscriptions: Vec<Subscription>,
}

impl EventEmitter<ProfileDialogEvent> for ProfileDialog {}

impl ProfileDialog {
    pub fn new(
        store: Arc<dyn StatusStore>,
        api: Arc<dyn SettingsApi>,
        language: Language,
        on_store_refreshed: StoreRefreshedHook,
        window: &mut Window,
        cx: &mut Context<Self>,
    ) -> Self {
        let i18n = I18n::new(language);
        let editor = ProfileEditor::new(store.customized_profile());

        let name_input = cx.new(|cx| InputState::new(window, cx).placeholder("memos"));
        let logo_url_input = cx.new(|cx| InputState::new(window, cx).placeholder("/logo.webp"));
        let description_input = cx.new(|cx| InputState::new(window, cx));
        let external_url_input =
            cx.new(|cx| InputState::new(window, cx).placeholder("https://"));

        let locale_choices = editor.draft().locale.choices_including();
        let appearance_choices = editor.draft().appearance.choices_including();

        let locale_items: Vec<SharedString> = locale_choices
            .iter()
            .map(|locale| SharedString::from(locale.display_name().to_string()))
            .collect();
        let locale_select = cx.new(|cx| {
            SelectState::new(SearchableVec::new(locale_items), None, window, cx)
        });
        let appearance_items: Vec<SharedString> = appearance_choices
            .iter()
            .map(|appearance| SharedString::from(i18n.appearance_label(appearance).to_string()))
            .collect();
        let appearance_select = cx.new(|cx| {
            SelectState::new(SearchableVec::new(appearance_items), None, window, cx)
        });

        let subscriptions = vec![
            Self::subscribe_text_input(&name_input, ProfileField::Name, cx),
            Self::subscribe_text_input(&logo_url_input, ProfileField::LogoUrl, cx),
            Self::subscribe_text_input(&description_input, ProfileField::Description, cx),
            Self::subscribe_text_input(&external_url_input, ProfileField::ExternalUrl, cx),
            cx.subscribe(
                &locale_select,
                |this, _, event: &SelectEvent<SearchableVec<SharedString>>, cx| {
                    let SelectEvent::Confirm(label) = event;
                    let Some(locale) = label.as_ref().and_then(|label| {
                        this.locale_choices
                            .iter()
                            .find(|locale| locale.display_name() == &***label)
                            .cloned()
                    }) else {
                        return;
                    };
                    this.on_field_change(ProfileField::Locale(locale), cx);
                },
            ),
            cx.subscribe(
                &appearance_select,
                |this, _, event: &SelectEvent<SearchableVec<SharedString>>, cx| {
                    let SelectEvent::Confirm(label) = event;
                    let i18n = this.i18n();
                    let Some(appearance) = label.as_ref().and_then(|label| {
                        this.appearance_choices
                            .iter()
                            .find(|appearance| i18n.appearance_label(appearance) == &***label)
                            .cloned()
                    }) else {
                        return;
                    };
                    this.on_field_change(ProfileField::Appearance(appearance), cx);
                },
            ),
        ];

        let mut dialog = Self {
            language,
            editor,
            api,
            store,
            on_store_refreshed,
            locale_choices,
            appearance_choices,
            name_input,
            logo_url_input,
            description_input,
            external_url_input,
            locale_select,
            appearance_select,
            error_message: None,
            needs_focus: true,
            _subscriptions: subscriptions,
        };
        dialog.sync_inputs_from_draft(window, cx);
        dialog
    }

    fn i18n(&self) -> I18n {
        I18n::new(self.language)
    }

    fn subscribe_text_input(
        input: &Entity<InputState>,
        field: fn(String) -> ProfileField,
        cx: &mut Context<Self>,
    ) -> Subscription {
        cx.subscribe(input, move |this, input, event: &InputEvent, cx| {
            if !matches!(event, InputEvent::Change) {
                return;
            }
            let value = input.read(cx).value().to_string();
            this.on_field_change(field(value), cx);
        })
    }

    fn on_field_change(&mut self, field: ProfileField, cx: &mut Context<Self>) {
        let next = self.editor.draft().with_field(field.clone());
        if &next == self.editor.draft() {
            return;
        }
        self.editor.set_field(field);
        cx.notify();
    }

    /// Pushes the draft into every widget. Used on open and after a restore.
    fn sync_inputs_from_draft(&mut self, window: &mut Window, cx: &mut Context<Self>) {
        let draft = self.editor.draft().clone();
        let text_fields = [
            (&self.name_input, draft.name.clone()),
            (&self.logo_url_input, draft.logo_url.clone()),
            (&self.description_input, draft.description.clone()),
            (&self.external_url_input, draft.external_url.clone()),
        ];
        for (input, value) in text_fields {
            input.update(cx, |input, cx| {
                input.set_value(value, window, cx);
            });
        }

        let locale_label = SharedString::from(draft.locale.display_name().to_string());
        self.locale_select.update(cx, |state, cx| {
            state.set_selected_value(&locale_label, window, cx);
        });
        let appearance_label =
            SharedString::from(self.i18n().appearance_label(&draft.appearance).to_string());
        self.appearance_select.update(cx, |state, cx| {
            state.set_selected_value(&appearance_label, window, cx);
        });
    }

    fn restore_defaults(&mut self, window: &mut Window, cx: &mut Context<Self>) {
        self.editor.restore_defaults();
        self.error_message = None;
        self.sync_inputs_from_draft(window, cx);
        cx.notify();
    }

    fn dismiss(&mut self, cx: &mut Context<Self>) {
        cx.emit(ProfileDialogEvent::Dismissed);
    }

    fn save(&mut self, window: &mut Window, cx: &mut Context<Self>) {
        let i18n = self.i18n();
        let request = match self.editor.begin_save() {
            Ok(request) => request,
            Err(ProfileError::EmptyName) => {
                window.push_notification(Notification::error(i18n.profile_name_required), cx);
                return;
            }
            Err(ProfileError::SaveInFlight) => return,
            Err(err) => {
                crate::error_log!("[profile] cannot prepare save: {}", err);
                self.error_message = Some(i18n.profile_update_failed(&err.to_string()));
                cx.notify();
                return;
            }
        };
        self.error_message = None;
        cx.notify();

        crate::debug_log!("[profile] saving customized profile: {}", request.payload());
        let api = self.api.clone();
        let store = self.store.clone();
        let on_store_refreshed = self.on_store_refreshed.clone();
        cx.spawn_in(window, async move |this, cx| {
            let result = cx
                .background_executor()
                .spawn(async move { request.submit(api.as_ref(), store.as_ref()) })
                .await;

            if result.is_ok() {
                let _ = cx.update(|window, cx| on_store_refreshed(window, cx));
            }
            let _ = this.update_in(cx, |this, window, cx| {
                this.on_save_finished(result, window, cx);
            });
        })
        .detach();
    }

    fn on_save_finished(
        &mut self,
        result: anyhow::Result<()>,
        window: &mut Window,
        cx: &mut Context<Self>,
    ) {
        let i18n = self.i18n();
        match self.editor.finish_save(result) {
            SaveOutcome::Saved => {
                window.push_notification(Notification::success(i18n.profile_update_succeeded), cx);
                cx.emit(ProfileDialogEvent::Saved);
            }
            SaveOutcome::Failed { message } => {
                crate::error_log!("[profile] save failed: {}", message);
                self.error_message = Some(i18n.profile_update_failed(&summarize_error(&message)));
            }
        }
        cx.notify();
    }

    fn render_label(&self, label: &'static str, cx: &App) -> Div {
        div()
            .text_sm()
            .text_color(cx.theme().foreground)
            .child(label)
    }
}

impl Render for ProfileDialog {
    fn render(&mut self, window: &mut Window, cx: &mut Context<Self>) -> impl IntoElement {
        if self.needs_focus {
            self.needs_focus = false;
            self.name_input
                .update(cx, |input, cx| input.focus(window, cx));
        }

        let i18n = self.i18n();
        let saving = self.editor.is_saving();

        div()
            .id("profile-dialog")
            .w(px(PROFILE_DIALOG_WIDTH))
            .v_flex()
            .gap_3()
            .popover_style(cx)
            .p_4()
            .on_mouse_down(
                MouseButton::Left,
                cx.listener(|_, _, _, cx| {
                    cx.stop_propagation();
                }),
            )
            .capture_key_down(cx.listener(|this, event: &KeyDownEvent, window, cx| {
                let key = event.keystroke.key.as_str();
                if key == "escape" {
                    this.dismiss(cx);
                    cx.stop_propagation();
                    return;
                }
                if key == "enter" && event.keystroke.modifiers.secondary() {
                    this.save(window, cx);
                    cx.stop_propagation();
                }
            }))
            .child(
                div()
                    .w_full()
                    .flex()
                    .items_center()
                    .justify_between()
                    .child(
                        div()
                            .text_lg()
                            .text_color(cx.theme().foreground)
                            .child(i18n.customize_dialog_title),
                    )
                    .child(
                        Button::new("profile-dialog-close")
                            .ghost()
                            .small()
                            .icon(Icon::new(IconName::Close).text_color(cx.theme().foreground))
                            .on_click(cx.listener(|this, _, _, cx| {
                                this.dismiss(cx);
                            })),
                    ),
            )
            .child(div().h(px(1.)).bg(cx.theme().border))
            .child(
                div()
                    .v_flex()
                    .gap_1()
                    .child(
                        div()
                            .flex()
                            .items_center()
                            .gap_1()
                            .child(self.render_label(i18n.profile_name_label, cx))
                            .child(
                                div()
                                    .text_xs()
                                    .text_color(cx.theme().muted_foreground)
                                    .child(format!("({})", i18n.customize_name_default_hint)),
                            ),
                    )
                    .child(Input::new(&self.name_input).small())
                    .child(self.render_label(i18n.profile_logo_url_label, cx).mt_2())
                    .child(Input::new(&self.logo_url_input).small())
                    .child(self.render_label(i18n.profile_description_label, cx).mt_2())
                    .child(Input::new(&self.description_input).small())
                    .child(self.render_label(i18n.profile_external_url_label, cx).mt_2())
                    .child(Input::new(&self.external_url_input).small())
                    .child(self.render_label(i18n.profile_locale_label, cx).mt_2())
                    .child(Select::new(&self.locale_select).small())
                    .child(self.render_label(i18n.profile_appearance_label, cx).mt_2())
                    .child(Select::new(&self.appearance_select).small()),
            )
            .when_some(self.error_message.clone(), |this, message| {
                this.child(
                    div()
                        .text_xs()
                        .text_color(cx.theme().danger)
                        .whitespace_normal()
                        .child(message),
                )
            })
            .child(
                div()
                    .mt_2()
                    .w_full()
                    .flex()
                    .items_center()
                    .justify_between()
                    .gap_2()
                    .child(
                        Button::new("profile-dialog-restore")
                            .small()
                            .outline()
                            .label(i18n.restore_button)
                            .disabled(saving)
                            .on_click(cx.listener(|this, _, window, cx| {
                                this.restore_defaults(window, cx);
                            })),
                    )
                    .child(
                        div()
                            .flex()
                            .items_center()
                            .gap_2()
                            .child(
                                Button::new("profile-dialog-cancel")
                                    .small()
                                    .ghost()
                                    .label(i18n.cancel_button)
                                    .on_click(cx.listener(|this, _, _, cx| {
                                        this.dismiss(cx);
                                    })),
                            )
                            .child(
                                Button::new("profile-dialog-save")
                                    .small()
                                    .primary()
                                    .label(if saving {
                                        i18n.saving_button
                                    } else {
                                        i18n.save_button
                                    })
                                    .disabled(saving)
                                    .on_click(cx.listener(|this, _, window, cx| {
                                        this.save(window, cx);
                                    })),
                            ),
                    ),
            )
    }
}
