use crate::api::StatusApi;
use crate::profile::CustomizedProfile;
use anyhow::Result;
use semver::Version;
use serde::Deserialize;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, RwLock};

/// First server release that understands the `customized-profile` setting.
const CUSTOMIZED_PROFILE_MIN_VERSION: Version = Version::new(0, 8, 0);

#[derive(Clone, Debug, Default, Deserialize, Eq, PartialEq)]
#[serde(default)]
pub struct ServerProfile {
    pub mode: String,
    pub version: String,
}

#[derive(Clone, Debug, Default, Deserialize, Eq, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct HostUser {
    pub username: String,
    pub nickname: String,
}

#[derive(Clone, Debug, Default, Deserialize, Eq, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct SystemStatus {
    pub host: Option<HostUser>,
    pub profile: ServerProfile,
    pub allow_sign_up: bool,
    pub customized_profile: CustomizedProfile,
}

impl SystemStatus {
    /// Unknown or non-semver versions (dev builds) are assumed to be new enough.
    pub fn supports_customized_profile(&self) -> bool {
        let raw = self.profile.version.trim();
        let raw = raw.trim_start_matches(|ch| ch == 'v' || ch == 'V');
        match Version::parse(raw) {
            Ok(version) => version >= CUSTOMIZED_PROFILE_MIN_VERSION,
            Err(_) => true,
        }
    }
}

/// Process-wide view of the server status that dialogs read from.
pub trait StatusStore: Send + Sync {
    fn customized_profile(&self) -> CustomizedProfile;
    fn refresh_system_status(&self) -> Result<()>;
}

pub struct SystemStatusStore {
    api: Arc<dyn StatusApi>,
    status: RwLock<SystemStatus>,
    loaded: AtomicBool,
}

impl SystemStatusStore {
    pub fn new(api: Arc<dyn StatusApi>) -> Self {
        Self {
            api,
            status: RwLock::new(SystemStatus::default()),
            loaded: AtomicBool::new(false),
        }
    }

    pub fn snapshot(&self) -> SystemStatus {
        match self.status.read() {
            Ok(status) => status.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    /// Whether at least one refresh has succeeded.
    pub fn is_loaded(&self) -> bool {
        self.loaded.load(Ordering::Relaxed)
    }

    fn replace(&self, next: SystemStatus) {
        match self.status.write() {
            Ok(mut status) => *status = next,
            Err(poisoned) => *poisoned.into_inner() = next,
        }
        self.loaded.store(true, Ordering::Relaxed);
    }
}

impl StatusStore for SystemStatusStore {
    fn customized_profile(&self) -> CustomizedProfile {
        match self.status.read() {
            Ok(status) => status.customized_profile.clone(),
            Err(poisoned) => poisoned.into_inner().customized_profile.clone(),
        }
    }

    fn refresh_system_status(&self) -> Result<()> {
        let next = self.api.fetch_system_status()?;
        crate::debug_log!(
            "[status] refreshed: version={} mode={} profile={}",
            next.profile.version,
            next.profile.mode,
            next.customized_profile.name
        );
        self.replace(next);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::profile::Appearance;
    use anyhow::anyhow;
    use std::sync::Mutex;

    struct ScriptedStatusApi {
        responses: Mutex<Vec<Result<SystemStatus>>>,
    }

    impl ScriptedStatusApi {
        fn new(responses: Vec<Result<SystemStatus>>) -> Arc<Self> {
            Arc::new(Self {
                responses: Mutex::new(responses),
            })
        }
    }

    impl StatusApi for ScriptedStatusApi {
        fn fetch_system_status(&self) -> Result<SystemStatus> {
            self.responses.lock().unwrap().remove(0)
        }
    }

    fn status_named(name: &str, version: &str) -> SystemStatus {
        SystemStatus {
            profile: ServerProfile {
                mode: "prod".into(),
                version: version.into(),
            },
            customized_profile: CustomizedProfile {
                name: name.into(),
                appearance: Appearance::Light,
                ..CustomizedProfile::default()
            },
            ..SystemStatus::default()
        }
    }

    #[test]
    fn starts_with_default_profile() {
        let store = SystemStatusStore::new(ScriptedStatusApi::new(Vec::new()));
        assert!(!store.is_loaded());
        assert_eq!(store.customized_profile(), CustomizedProfile::default());
    }

    #[test]
    fn refresh_replaces_cached_status() {
        let store = SystemStatusStore::new(ScriptedStatusApi::new(vec![Ok(status_named(
            "team notes",
            "0.9.0",
        ))]));
        store.refresh_system_status().unwrap();
        assert!(store.is_loaded());
        assert_eq!(store.customized_profile().name, "team notes");
        assert_eq!(store.snapshot().profile.version, "0.9.0");
    }

    #[test]
    fn failed_refresh_keeps_previous_status() {
        let store = SystemStatusStore::new(ScriptedStatusApi::new(vec![
            Ok(status_named("first", "0.9.0")),
            Err(anyhow!("connection refused")),
        ]));
        store.refresh_system_status().unwrap();
        assert!(store.refresh_system_status().is_err());
        assert_eq!(store.customized_profile().name, "first");
    }

    #[test]
    fn customized_profile_support_by_version() {
        assert!(status_named("a", "0.9.1").supports_customized_profile());
        assert!(status_named("a", "v0.8.0").supports_customized_profile());
        assert!(!status_named("a", "0.7.3").supports_customized_profile());
        assert!(status_named("a", "dev").supports_customized_profile());
        assert!(status_named("a", "").supports_customized_profile());
    }

    #[test]
    fn decodes_sparse_status() {
        let status: SystemStatus = serde_json::from_str(
            r#"{"host":{"id":1,"username":"admin"},"allowSignUp":true,"dbSize":4096}"#,
        )
        .unwrap();
        assert_eq!(status.host.map(|host| host.username), Some("admin".to_string()));
        assert!(status.allow_sign_up);
        assert_eq!(status.customized_profile, CustomizedProfile::default());
    }
}
