//! Draft state behind the customized profile dialog.
//!
//! The editor owns a private copy of the profile. Nothing is written back
//! to the status store; a save serializes the draft, upserts it through
//! [`SettingsApi`] and then asks the [`StatusStore`] to refresh.

use crate::api::SettingsApi;
use crate::profile::{CUSTOMIZED_PROFILE_SETTING, CustomizedProfile, ProfileField};
use crate::status::StatusStore;
use anyhow::Result;
use thiserror::Error;

#[derive(Debug, Error, Eq, PartialEq)]
pub enum ProfileError {
    #[error("server name must not be empty")]
    EmptyName,
    #[error("a save is already in progress")]
    SaveInFlight,
    #[error("failed to serialize profile: {0}")]
    Serialize(String),
}

/// A validated, serialized draft ready to be sent to the server.
#[derive(Clone, Debug)]
pub struct SaveRequest {
    payload: String,
}

impl SaveRequest {
    pub fn payload(&self) -> &str {
        &self.payload
    }

    /// Upserts the setting, then refreshes the store. The two steps run in
    /// order and the refresh is skipped when the upsert fails.
    pub fn submit(&self, api: &dyn SettingsApi, store: &dyn StatusStore) -> Result<()> {
        api.upsert_setting(CUSTOMIZED_PROFILE_SETTING, &self.payload)?;
        store.refresh_system_status()
    }
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub enum SaveOutcome {
    Saved,
    Failed { message: String },
}

#[derive(Clone, Debug)]
pub struct ProfileEditor {
    draft: CustomizedProfile,
    saving: bool,
}

impl ProfileEditor {
    pub fn new(initial: CustomizedProfile) -> Self {
        Self {
            draft: initial,
            saving: false,
        }
    }

    pub fn draft(&self) -> &CustomizedProfile {
        &self.draft
    }

    pub fn is_saving(&self) -> bool {
        self.saving
    }

    pub fn set_field(&mut self, field: ProfileField) {
        self.draft = self.draft.with_field(field);
    }

    pub fn restore_defaults(&mut self) {
        self.draft = CustomizedProfile::default();
    }

    pub fn begin_save(&mut self) -> Result<SaveRequest, ProfileError> {
        if self.saving {
            return Err(ProfileError::SaveInFlight);
        }
        if self.draft.name.is_empty() {
            return Err(ProfileError::EmptyName);
        }

        let payload = self
            .draft
            .to_setting_value()
            .map_err(|err| ProfileError::Serialize(err.to_string()))?;
        self.saving = true;
        Ok(SaveRequest { payload })
    }

    pub fn finish_save(&mut self, result: Result<()>) -> SaveOutcome {
        self.saving = false;
        match result {
            Ok(()) => SaveOutcome::Saved,
            Err(err) => SaveOutcome::Failed {
                message: format!("{err:#}"),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::profile::{Appearance, Locale};
    use anyhow::anyhow;
    use std::sync::Mutex;

    #[derive(Default)]
    struct RecordingApi {
        calls: Mutex<Vec<(String, String)>>,
        fail: bool,
    }

    impl SettingsApi for RecordingApi {
        fn upsert_setting(&self, name: &str, value: &str) -> Result<()> {
            self.calls
                .lock()
                .unwrap()
                .push((name.to_string(), value.to_string()));
            if self.fail {
                return Err(anyhow!("network unreachable"));
            }
            Ok(())
        }
    }

    #[derive(Default)]
    struct FakeStore {
        profile: CustomizedProfile,
        refreshes: Mutex<usize>,
    }

    impl StatusStore for FakeStore {
        fn customized_profile(&self) -> CustomizedProfile {
            self.profile.clone()
        }

        fn refresh_system_status(&self) -> Result<()> {
            *self.refreshes.lock().unwrap() += 1;
            Ok(())
        }
    }

    fn my_server() -> CustomizedProfile {
        CustomizedProfile {
            name: "My Server".into(),
            logo_url: "/x.png".into(),
            description: "hi".into(),
            locale: Locale::En,
            appearance: Appearance::Dark,
            external_url: String::new(),
        }
    }

    fn run_save(editor: &mut ProfileEditor, api: &RecordingApi, store: &FakeStore) -> SaveOutcome {
        let request = editor.begin_save().unwrap();
        let result = request.submit(api, store);
        editor.finish_save(result)
    }

    #[test]
    fn seeds_draft_from_store() {
        let store = FakeStore {
            profile: my_server(),
            ..FakeStore::default()
        };
        let editor = ProfileEditor::new(store.customized_profile());
        assert_eq!(editor.draft(), &my_server());
        assert!(!editor.is_saving());
    }

    #[test]
    fn empty_name_never_reaches_the_api() {
        let api = RecordingApi::default();
        let mut editor = ProfileEditor::new(CustomizedProfile::default());
        editor.set_field(ProfileField::Name(String::new()));

        assert_eq!(editor.begin_save().unwrap_err(), ProfileError::EmptyName);
        assert!(!editor.is_saving());
        assert!(api.calls.lock().unwrap().is_empty());
    }

    #[test]
    fn whitespace_name_is_accepted() {
        let mut editor = ProfileEditor::new(CustomizedProfile::default());
        editor.set_field(ProfileField::Name(" ".into()));
        assert!(editor.begin_save().is_ok());
    }

    #[test]
    fn successful_save_upserts_draft_then_refreshes() {
        let api = RecordingApi::default();
        let store = FakeStore::default();
        let mut editor = ProfileEditor::new(store.customized_profile());
        editor.set_field(ProfileField::Name("My Server".into()));
        editor.set_field(ProfileField::LogoUrl("/x.png".into()));
        editor.set_field(ProfileField::Description("hi".into()));
        editor.set_field(ProfileField::Appearance(Appearance::Dark));

        assert_eq!(run_save(&mut editor, &api, &store), SaveOutcome::Saved);

        let calls = api.calls.lock().unwrap();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].0, "customized-profile");
        assert_eq!(
            CustomizedProfile::from_setting_value(&calls[0].1).unwrap(),
            my_server()
        );
        assert_eq!(*store.refreshes.lock().unwrap(), 1);
        assert!(!editor.is_saving());
    }

    #[test]
    fn failed_upsert_keeps_draft_and_skips_refresh() {
        let api = RecordingApi {
            fail: true,
            ..RecordingApi::default()
        };
        let store = FakeStore::default();
        let mut editor = ProfileEditor::new(my_server());

        let outcome = run_save(&mut editor, &api, &store);
        assert!(matches!(
            outcome,
            SaveOutcome::Failed { ref message } if message.contains("network unreachable")
        ));
        assert_eq!(editor.draft(), &my_server());
        assert_eq!(*store.refreshes.lock().unwrap(), 0);
        assert!(!editor.is_saving());
    }

    #[test]
    fn second_save_is_rejected_while_in_flight() {
        let mut editor = ProfileEditor::new(my_server());
        let request = editor.begin_save().unwrap();
        assert!(editor.is_saving());
        assert_eq!(editor.begin_save().unwrap_err(), ProfileError::SaveInFlight);

        let api = RecordingApi::default();
        let store = FakeStore::default();
        editor.finish_save(request.submit(&api, &store));
        assert!(editor.begin_save().is_ok());
    }

    #[test]
    fn request_outlives_a_cancelled_editor() {
        let api = RecordingApi::default();
        let store = FakeStore::default();
        let mut editor = ProfileEditor::new(my_server());
        let request = editor.begin_save().unwrap();
        drop(editor);

        request.submit(&api, &store).unwrap();
        assert_eq!(api.calls.lock().unwrap().len(), 1);
        assert_eq!(*store.refreshes.lock().unwrap(), 1);
    }

    #[test]
    fn restore_defaults_discards_any_edit() {
        let mut editor = ProfileEditor::new(my_server());
        editor.set_field(ProfileField::Locale(Locale::Ko));
        editor.set_field(ProfileField::ExternalUrl("https://notes.example.com".into()));
        editor.restore_defaults();
        assert_eq!(editor.draft(), &CustomizedProfile::default());
    }

    #[test]
    fn editing_one_field_leaves_the_rest() {
        let mut editor = ProfileEditor::new(my_server());
        editor.set_field(ProfileField::ExternalUrl("https://notes.example.com".into()));
        let draft = editor.draft();
        assert_eq!(draft.external_url, "https://notes.example.com");
        assert_eq!(
            CustomizedProfile {
                external_url: String::new(),
                ..draft.clone()
            },
            my_server()
        );
    }

    #[test]
    fn payload_matches_draft_at_begin() {
        let mut editor = ProfileEditor::new(my_server());
        let request = editor.begin_save().unwrap();
        editor.set_field(ProfileField::Name("later edit".into()));
        assert_eq!(
            CustomizedProfile::from_setting_value(request.payload()).unwrap(),
            my_server()
        );
    }
}
