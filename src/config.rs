use std::path::PathBuf;

const LOCAL_STATE_DB_DIR_NAME: &str = "memos_admin_db";
const CONNECTION_TREE: &str = "connection";
const CONNECTION_KEY_SERVER_URL: &str = "server_url";
const CONNECTION_KEY_ACCESS_TOKEN: &str = "access_token";
const SERVER_URL_ENV: &str = "MEMOS_SERVER_URL";
const ACCESS_TOKEN_ENV: &str = "MEMOS_ACCESS_TOKEN";
pub const DEFAULT_SERVER_URL: &str = "http://localhost:5230";

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ConnectionConfig {
    pub server_url: String,
    pub access_token: Option<String>,
}

impl Default for ConnectionConfig {
    fn default() -> Self {
        Self {
            server_url: DEFAULT_SERVER_URL.to_string(),
            access_token: None,
        }
    }
}

impl ConnectionConfig {
    /// Environment first, then the local state db, then defaults.
    pub fn load() -> Self {
        let store = open_connection_store();
        let config = Self::resolve(
            std::env::var(SERVER_URL_ENV).ok(),
            std::env::var(ACCESS_TOKEN_ENV).ok(),
            store.as_ref(),
        );
        if let Some(store) = store.as_ref() {
            config.persist(store);
        }
        crate::debug_log!(
            "[config] server={} token={}",
            config.server_url,
            if config.access_token.is_some() { "set" } else { "unset" }
        );
        config
    }

    fn resolve(
        env_server_url: Option<String>,
        env_access_token: Option<String>,
        store: Option<&sled::Tree>,
    ) -> Self {
        let stored = |key: &str| {
            store
                .and_then(|store| store.get(key).ok().flatten())
                .and_then(|raw| String::from_utf8(raw.to_vec()).ok())
        };

        let server_url = env_server_url
            .and_then(|raw| normalize_server_url(&raw))
            .or_else(|| stored(CONNECTION_KEY_SERVER_URL).and_then(|raw| normalize_server_url(&raw)))
            .unwrap_or_else(|| DEFAULT_SERVER_URL.to_string());
        let access_token = env_access_token
            .and_then(|raw| normalize_token(&raw))
            .or_else(|| stored(CONNECTION_KEY_ACCESS_TOKEN).and_then(|raw| normalize_token(&raw)));

        Self {
            server_url,
            access_token,
        }
    }

    fn persist(&self, store: &sled::Tree) {
        if let Err(err) = store.insert(CONNECTION_KEY_SERVER_URL, self.server_url.as_bytes()) {
            crate::debug_log!("[config] persist server url failed: {}", err);
        }
        let token_result = match self.access_token.as_deref() {
            Some(token) => store.insert(CONNECTION_KEY_ACCESS_TOKEN, token.as_bytes()).map(|_| ()),
            None => store.remove(CONNECTION_KEY_ACCESS_TOKEN).map(|_| ()),
        };
        if let Err(err) = token_result {
            crate::debug_log!("[config] persist access token failed: {}", err);
        }
        if let Err(err) = store.flush() {
            crate::debug_log!("[config] flush connection store failed: {}", err);
        }
    }
}

fn normalize_server_url(raw: &str) -> Option<String> {
    let trimmed = raw.trim().trim_end_matches('/');
    if trimmed.is_empty() {
        return None;
    }
    Some(trimmed.to_string())
}

fn normalize_token(raw: &str) -> Option<String> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }
    Some(trimmed.to_string())
}

/// Per-user directory for the local state db, logs and the logging toggle.
pub fn app_data_dir() -> PathBuf {
    if let Some(app_data) = std::env::var_os("APPDATA") {
        return PathBuf::from(app_data).join("memos-admin");
    }
    if let Some(home) = std::env::var_os("HOME") {
        return PathBuf::from(home).join(".memos-admin");
    }
    std::env::temp_dir().join("memos-admin")
}

fn local_state_db_path() -> PathBuf {
    app_data_dir().join(LOCAL_STATE_DB_DIR_NAME)
}

fn open_connection_store() -> Option<sled::Tree> {
    let db_path = local_state_db_path();
    if let Some(parent) = db_path.parent()
        && std::fs::create_dir_all(parent).is_err()
    {
        crate::debug_log!("[store] create dir failed: {}", parent.to_string_lossy());
        return None;
    }

    let db = match sled::open(&db_path) {
        Ok(db) => db,
        Err(err) => {
            crate::debug_log!(
                "[store] open db failed: {} | {}",
                db_path.to_string_lossy(),
                err
            );
            return None;
        }
    };

    match db.open_tree(CONNECTION_TREE) {
        Ok(tree) => Some(tree),
        Err(err) => {
            crate::debug_log!("[store] open tree failed: {} | {}", CONNECTION_TREE, err);
            None
        }
    }
}
