use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

/// Name of the system setting that stores the customized profile.
pub const CUSTOMIZED_PROFILE_SETTING: &str = "customized-profile";

const DEFAULT_NAME: &str = "memos";
const DEFAULT_LOGO_URL: &str = "/logo.webp";

/// A server locale tag. Tags this client does not know are kept verbatim so
/// that saving a profile never rewrites them.
#[derive(Clone, Debug, Default, Eq, PartialEq, Hash)]
pub enum Locale {
    #[default]
    En,
    Zh,
    Vi,
    Fr,
    Nl,
    Sv,
    De,
    Es,
    Uk,
    Ru,
    It,
    Hant,
    Tr,
    Ko,
    Sl,
    Other(String),
}

impl Locale {
    pub const ALL: [Locale; 15] = [
        Self::En,
        Self::Zh,
        Self::Vi,
        Self::Fr,
        Self::Nl,
        Self::Sv,
        Self::De,
        Self::Es,
        Self::Uk,
        Self::Ru,
        Self::It,
        Self::Hant,
        Self::Tr,
        Self::Ko,
        Self::Sl,
    ];

    pub fn tag(&self) -> &str {
        match self {
            Self::En => "en",
            Self::Zh => "zh",
            Self::Vi => "vi",
            Self::Fr => "fr",
            Self::Nl => "nl",
            Self::Sv => "sv",
            Self::De => "de",
            Self::Es => "es",
            Self::Uk => "uk",
            Self::Ru => "ru",
            Self::It => "it",
            Self::Hant => "hant",
            Self::Tr => "tr",
            Self::Ko => "ko",
            Self::Sl => "sl",
            Self::Other(tag) => tag,
        }
    }

    /// Endonym shown in the locale picker. Unknown tags show the tag itself.
    pub fn display_name(&self) -> &str {
        match self {
            Self::En => "English",
            Self::Zh => "简体中文",
            Self::Vi => "Tiếng Việt",
            Self::Fr => "Français",
            Self::Nl => "Nederlands",
            Self::Sv => "Svenska",
            Self::De => "Deutsch",
            Self::Es => "Español",
            Self::Uk => "Українська",
            Self::Ru => "Русский",
            Self::It => "Italiano",
            Self::Hant => "繁體中文",
            Self::Tr => "Türkçe",
            Self::Ko => "한국어",
            Self::Sl => "Slovenščina",
            Self::Other(tag) => tag,
        }
    }

    pub fn is_known(&self) -> bool {
        !matches!(self, Self::Other(_))
    }

    /// Picker entries: every known locale, plus `self` when it is unknown.
    pub fn choices_including(&self) -> Vec<Locale> {
        let mut choices = Self::ALL.to_vec();
        if !self.is_known() {
            choices.push(self.clone());
        }
        choices
    }

    /// Exact tag match against the known locales.
    pub fn from_tag(tag: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|locale| locale.tag() == tag)
    }
}

impl From<String> for Locale {
    fn from(raw: String) -> Self {
        Self::from_tag(&raw).unwrap_or(Self::Other(raw))
    }
}

impl Serialize for Locale {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.tag())
    }
}

impl<'de> Deserialize<'de> for Locale {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        String::deserialize(deserializer).map(Self::from)
    }
}

/// Theme preference. Values other than the three known ones (older servers
/// stored `auto`) are kept verbatim and rendered like `System`.
#[derive(Clone, Debug, Default, Eq, PartialEq, Hash)]
pub enum Appearance {
    Light,
    Dark,
    #[default]
    System,
    Other(String),
}

impl Appearance {
    pub const ALL: [Appearance; 3] = [Self::Light, Self::Dark, Self::System];

    pub fn as_str(&self) -> &str {
        match self {
            Self::Light => "light",
            Self::Dark => "dark",
            Self::System => "system",
            Self::Other(raw) => raw,
        }
    }

    pub fn is_known(&self) -> bool {
        !matches!(self, Self::Other(_))
    }

    pub fn choices_including(&self) -> Vec<Appearance> {
        let mut choices = Self::ALL.to_vec();
        if !self.is_known() {
            choices.push(self.clone());
        }
        choices
    }

    /// Whether the theme should follow the OS window appearance.
    pub fn follows_system(&self) -> bool {
        matches!(self, Self::System | Self::Other(_))
    }
}

impl From<String> for Appearance {
    fn from(raw: String) -> Self {
        match raw.as_str() {
            "light" => Self::Light,
            "dark" => Self::Dark,
            "system" => Self::System,
            _ => Self::Other(raw),
        }
    }
}

impl Serialize for Appearance {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for Appearance {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        String::deserialize(deserializer).map(Self::from)
    }
}

/// Server branding and defaults shown to every visitor of a memos instance.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CustomizedProfile {
    pub name: String,
    pub logo_url: String,
    pub description: String,
    pub locale: Locale,
    pub appearance: Appearance,
    pub external_url: String,
}

impl Default for CustomizedProfile {
    fn default() -> Self {
        Self {
            name: DEFAULT_NAME.to_string(),
            logo_url: DEFAULT_LOGO_URL.to_string(),
            description: String::new(),
            locale: Locale::En,
            appearance: Appearance::System,
            external_url: String::new(),
        }
    }
}

impl CustomizedProfile {
    pub fn to_setting_value(&self) -> Result<String> {
        serde_json::to_string(self).context("failed to serialize customized profile")
    }

    pub fn from_setting_value(raw: &str) -> Result<Self> {
        serde_json::from_str(raw).context("failed to parse customized profile")
    }

    /// Returns a copy with exactly one field replaced.
    pub fn with_field(&self, field: ProfileField) -> Self {
        let mut next = self.clone();
        match field {
            ProfileField::Name(value) => next.name = value,
            ProfileField::LogoUrl(value) => next.logo_url = value,
            ProfileField::Description(value) => next.description = value,
            ProfileField::Locale(value) => next.locale = value,
            ProfileField::Appearance(value) => next.appearance = value,
            ProfileField::ExternalUrl(value) => next.external_url = value,
        }
        next
    }
}

/// A single edit coming from one of the dialog's inputs.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum ProfileField {
    Name(String),
    LogoUrl(String),
    Description(String),
    Locale(Locale),
    Appearance(Appearance),
    ExternalUrl(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> CustomizedProfile {
        CustomizedProfile {
            name: "My Server".into(),
            logo_url: "/x.png".into(),
            description: "hi".into(),
            locale: Locale::En,
            appearance: Appearance::Dark,
            external_url: String::new(),
        }
    }

    #[test]
    fn default_profile_values() {
        let profile = CustomizedProfile::default();
        assert_eq!(profile.name, "memos");
        assert_eq!(profile.logo_url, "/logo.webp");
        assert_eq!(profile.description, "");
        assert_eq!(profile.locale, Locale::En);
        assert_eq!(profile.appearance, Appearance::System);
        assert_eq!(profile.external_url, "");
    }

    #[test]
    fn serializes_with_camel_case_keys() {
        let value: serde_json::Value =
            serde_json::from_str(&sample().to_setting_value().unwrap()).unwrap();
        assert_eq!(
            value,
            serde_json::json!({
                "name": "My Server",
                "logoUrl": "/x.png",
                "description": "hi",
                "locale": "en",
                "appearance": "dark",
                "externalUrl": "",
            })
        );
    }

    #[test]
    fn setting_value_decodes_to_same_profile() {
        let profile = sample().with_field(ProfileField::Locale(Locale::Hant));
        let raw = profile.to_setting_value().unwrap();
        assert_eq!(CustomizedProfile::from_setting_value(&raw).unwrap(), profile);
    }

    #[test]
    fn missing_values_fall_back_to_defaults() {
        let profile = CustomizedProfile::from_setting_value(r#"{"name":"srv"}"#).unwrap();
        assert_eq!(profile.name, "srv");
        assert_eq!(profile.logo_url, "/logo.webp");
        assert_eq!(profile.locale, Locale::En);
        assert_eq!(profile.appearance, Appearance::System);
        assert_eq!(profile.external_url, "");
    }

    #[test]
    fn unknown_locale_and_appearance_survive_a_save() {
        let stored = CustomizedProfile::from_setting_value(
            r#"{"name":"srv","locale":"ja","appearance":"auto"}"#,
        )
        .unwrap();
        assert_eq!(stored.locale, Locale::Other("ja".into()));
        assert_eq!(stored.appearance, Appearance::Other("auto".into()));
        assert!(stored.appearance.follows_system());

        let renamed = stored.with_field(ProfileField::Name("renamed".into()));
        let value: serde_json::Value =
            serde_json::from_str(&renamed.to_setting_value().unwrap()).unwrap();
        assert_eq!(value["name"], "renamed");
        assert_eq!(value["locale"], "ja");
        assert_eq!(value["appearance"], "auto");
    }

    #[test]
    fn with_field_touches_only_one_field() {
        let base = sample();
        let edited = base.with_field(ProfileField::Description("changed".into()));
        assert_eq!(edited.description, "changed");
        assert_eq!(
            CustomizedProfile {
                description: base.description.clone(),
                ..edited.clone()
            },
            base
        );

        let edited = base.with_field(ProfileField::Appearance(Appearance::Light));
        assert_eq!(edited.appearance, Appearance::Light);
        assert_eq!(edited.name, base.name);
        assert_eq!(edited.logo_url, base.logo_url);
        assert_eq!(edited.locale, base.locale);
    }

    #[test]
    fn picker_choices_keep_stored_unknown_value() {
        assert_eq!(Locale::Ko.choices_including(), Locale::ALL.to_vec());
        let choices = Locale::Other("ja".into()).choices_including();
        assert_eq!(choices.len(), Locale::ALL.len() + 1);
        assert_eq!(choices.last(), Some(&Locale::Other("ja".into())));

        assert_eq!(Appearance::Dark.choices_including().len(), 3);
        assert_eq!(
            Appearance::Other("auto".into()).choices_including().last(),
            Some(&Appearance::Other("auto".into()))
        );
    }

    #[test]
    fn locale_lookup() {
        assert_eq!(Locale::from_tag("hant"), Some(Locale::Hant));
        assert_eq!(Locale::from_tag("ZH"), None);
        assert_eq!(Locale::from("pt-BR".to_string()), Locale::Other("pt-BR".into()));
        assert_eq!(Locale::Other("pt-BR".into()).display_name(), "pt-BR");
        assert!(Locale::ALL.iter().all(Locale::is_known));
    }
}
