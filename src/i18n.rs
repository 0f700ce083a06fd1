use crate::profile::Appearance;
use rust_embed::RustEmbed;
use serde::Deserialize;
use std::ops::Deref;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Language {
    ZhCn,
    EnUs,
}

impl Language {
    pub fn detect() -> Self {
        if let Some(locale_tag) = sys_locale::get_locale() {
            return Self::from_locale_tag(&locale_tag);
        }

        Self::EnUs
    }

    fn from_locale_tag(raw: &str) -> Self {
        let tag = raw.trim().to_ascii_lowercase();
        if tag.is_empty() {
            return Self::EnUs;
        }

        let is_chinese = tag.starts_with("zh")
            || tag == "cn"
            || tag.starts_with("cn_")
            || tag.starts_with("cn-")
            || tag.contains("_zh")
            || tag.contains("-zh");
        if is_chinese {
            return Self::ZhCn;
        }

        Self::EnUs
    }

    fn file_name(self) -> &'static str {
        match self {
            Self::ZhCn => "zh_CN.json",
            Self::EnUs => "en_US.json",
        }
    }
}

/// Bundled copies used when no locale directory is found on disk.
#[derive(RustEmbed)]
#[folder = "./assets/i18n"]
struct EmbeddedLocales;

macro_rules! locale_message_fields {
    ($macro:ident) => {
        $macro! {
            app_title,
            connection_label,
            status_loading,
            status_refresh_failed,
            status_section,
            server_version_label,
            server_mode_label,
            server_host_label,
            allow_sign_up_label,
            yes_label,
            no_label,
            profile_section,
            profile_name_label,
            profile_logo_url_label,
            profile_description_label,
            profile_locale_label,
            profile_appearance_label,
            profile_external_url_label,
            empty_value,
            refresh_button,
            customize_button,
            customize_unsupported,
            customize_dialog_title,
            customize_name_default_hint,
            appearance_light,
            appearance_dark,
            appearance_system,
            restore_button,
            cancel_button,
            save_button,
            saving_button,
            profile_name_required,
            profile_update_succeeded,
            profile_update_failed,
            open_logs_button,
            enable_logging_button,
            disable_logging_button,
        }
    };
}

macro_rules! define_raw_locale_messages {
    ($($field:ident),+ $(,)?) => {
        #[derive(Debug, Deserialize)]
        #[serde(deny_unknown_fields)]
        struct RawLocaleMessages {
            $(
                $field: String,
            )+
        }
    };
}

macro_rules! define_locale_messages {
    ($($field:ident),+ $(,)?) => {
        #[derive(Debug)]
        pub struct LocaleMessages {
            $(
                pub $field: &'static str,
            )+
        }
    };
}

macro_rules! impl_from_raw_locale_messages {
    ($($field:ident),+ $(,)?) => {
        impl From<RawLocaleMessages> for LocaleMessages {
            fn from(raw: RawLocaleMessages) -> Self {
                Self {
                    $(
                        $field: leak_str(raw.$field),
                    )+
                }
            }
        }
    };
}

locale_message_fields!(define_raw_locale_messages);
locale_message_fields!(define_locale_messages);
locale_message_fields!(impl_from_raw_locale_messages);

fn leak_str(value: String) -> &'static str {
    Box::leak(value.into_boxed_str())
}

static ZH_CN_MESSAGES: OnceLock<LocaleMessages> = OnceLock::new();
static EN_US_MESSAGES: OnceLock<LocaleMessages> = OnceLock::new();

#[derive(Clone, Copy, Debug)]
pub struct I18n {
    messages: &'static LocaleMessages,
}

impl I18n {
    pub fn new(lang: Language) -> Self {
        Self {
            messages: messages_for(lang),
        }
    }

    pub fn status_refresh_failed(self, message: &str) -> String {
        format_template(
            self.status_refresh_failed,
            &[("message", message.to_string())],
        )
    }

    pub fn customize_unsupported(self, version: &str) -> String {
        format_template(
            self.customize_unsupported,
            &[("version", version.to_string())],
        )
    }

    pub fn profile_update_failed(self, message: &str) -> String {
        format_template(
            self.profile_update_failed,
            &[("message", message.to_string())],
        )
    }

    /// Unknown stored values are shown as-is.
    pub fn appearance_label(self, appearance: &Appearance) -> &str {
        match appearance {
            Appearance::Light => self.appearance_light,
            Appearance::Dark => self.appearance_dark,
            Appearance::System => self.appearance_system,
            Appearance::Other(raw) => raw,
        }
    }

    pub fn appearance_from_label(self, label: &str) -> Option<Appearance> {
        Appearance::ALL
            .into_iter()
            .find(|appearance| self.appearance_label(appearance) == label)
    }
}

impl Deref for I18n {
    type Target = LocaleMessages;

    fn deref(&self) -> &Self::Target {
        self.messages
    }
}

fn messages_for(lang: Language) -> &'static LocaleMessages {
    match lang {
        Language::ZhCn => ZH_CN_MESSAGES.get_or_init(|| load_messages(Language::ZhCn)),
        Language::EnUs => EN_US_MESSAGES.get_or_init(|| load_messages(Language::EnUs)),
    }
}

/// Tries every source of the locale file in order, then English.
fn load_messages(lang: Language) -> LocaleMessages {
    for (origin, raw) in locale_sources(lang.file_name()) {
        match parse_messages(&raw) {
            Ok(messages) => {
                crate::debug_log!("[i18n] loaded {} from {}", lang.file_name(), origin);
                return messages;
            }
            Err(err) => crate::debug_log!("[i18n] skipping {}: {}", origin, err),
        }
    }

    if lang != Language::EnUs {
        return load_messages(Language::EnUs);
    }
    panic!("no usable {} in overrides or embedded assets", lang.file_name());
}

fn parse_messages(raw: &str) -> Result<LocaleMessages, serde_json::Error> {
    serde_json::from_str::<RawLocaleMessages>(raw).map(LocaleMessages::from)
}

/// Origin and contents of each readable copy of `file_name`: overrides on
/// disk first, the embedded copy last.
fn locale_sources(file_name: &str) -> Vec<(String, String)> {
    let mut sources: Vec<(String, String)> = locale_override_dirs()
        .into_iter()
        .map(|dir| dir.join(file_name))
        .filter(|path| path.is_file())
        .filter_map(|path| match std::fs::read_to_string(&path) {
            Ok(raw) => Some((path.display().to_string(), raw)),
            Err(err) => {
                crate::debug_log!("[i18n] cannot read {}: {}", path.display(), err);
                None
            }
        })
        .collect();

    if let Some(file) = EmbeddedLocales::get(file_name) {
        match String::from_utf8(file.data.into_owned()) {
            Ok(raw) => sources.push((format!("embedded:{file_name}"), raw)),
            Err(err) => crate::debug_log!("[i18n] embedded {} is not utf-8: {}", file_name, err),
        }
    }
    sources
}

/// `Contents/Resources/i18n` inside a macOS bundle.
fn bundle_resources_dir(current_exe: &Path) -> Option<PathBuf> {
    let macos_dir = current_exe.parent()?;
    let contents_dir = macos_dir.parent()?;
    (macos_dir.ends_with("MacOS") && contents_dir.ends_with("Contents"))
        .then(|| contents_dir.join("Resources").join("i18n"))
}

fn locale_override_dirs() -> Vec<PathBuf> {
    let mut dirs = Vec::new();
    if let Ok(current_exe) = std::env::current_exe() {
        dirs.extend(bundle_resources_dir(&current_exe));
        dirs.extend(current_exe.parent().map(|dir| dir.join("i18n")));
    }
    if let Ok(current_dir) = std::env::current_dir() {
        dirs.push(current_dir.join("assets").join("i18n"));
    }
    dirs
}

fn format_template(template: &str, vars: &[(&str, String)]) -> String {
    let mut output = template.to_string();
    for (key, value) in vars {
        let token = format!("{{{key}}}");
        output = output.replace(&token, value);
    }
    output
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn detects_language_from_locale_tag() {
        assert_eq!(Language::from_locale_tag("zh-Hans-CN"), Language::ZhCn);
        assert_eq!(Language::from_locale_tag("zh_CN.UTF-8"), Language::ZhCn);
        assert_eq!(Language::from_locale_tag("en-US"), Language::EnUs);
        assert_eq!(Language::from_locale_tag("de_DE"), Language::EnUs);
        assert_eq!(Language::from_locale_tag(""), Language::EnUs);
    }

    #[test]
    fn fills_template_variables() {
        assert_eq!(
            format_template("failed: {message} ({message})", &[("message", "boom".into())]),
            "failed: boom (boom)"
        );
        assert_eq!(format_template("no vars", &[]), "no vars");
    }

    #[test]
    fn bundled_locales_have_every_message() {
        for lang in [Language::EnUs, Language::ZhCn] {
            let file = EmbeddedLocales::get(lang.file_name()).unwrap();
            let raw = std::str::from_utf8(&file.data).unwrap();
            let messages = parse_messages(raw).unwrap();
            assert!(!messages.app_title.is_empty());
            assert!(messages.profile_update_failed.contains("{message}"));
            assert!(messages.customize_unsupported.contains("{version}"));
        }
    }

    #[test]
    fn embedded_copy_is_the_last_source() {
        let sources = locale_sources(Language::EnUs.file_name());
        assert_eq!(
            sources.last().map(|(origin, _)| origin.as_str()),
            Some("embedded:en_US.json")
        );
        assert!(locale_sources("xx_XX.json").is_empty());
    }

    #[test]
    fn finds_bundle_resources_only_inside_an_app_bundle() {
        assert_eq!(
            bundle_resources_dir(Path::new("/Applications/Memos Admin.app/Contents/MacOS/memos-admin")),
            Some(PathBuf::from("/Applications/Memos Admin.app/Contents/Resources/i18n"))
        );
        assert_eq!(bundle_resources_dir(Path::new("/usr/bin/memos-admin")), None);
    }

    #[test]
    fn appearance_labels_map_back() {
        let i18n = I18n::new(Language::EnUs);
        for appearance in Appearance::ALL {
            let label = i18n.appearance_label(&appearance).to_string();
            assert_eq!(i18n.appearance_from_label(&label), Some(appearance));
        }
        assert_eq!(i18n.appearance_label(&Appearance::Other("auto".into())), "auto");
        assert_eq!(i18n.appearance_from_label("auto"), None);
    }
}
