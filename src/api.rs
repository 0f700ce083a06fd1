use crate::config::ConnectionConfig;
use crate::status::SystemStatus;
use anyhow::{Context, Result, anyhow};
use reqwest::blocking::{Client, RequestBuilder};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::time::Duration;

const SYSTEM_SETTING_PATH: &str = "/api/system/setting";
const SYSTEM_STATUS_PATH: &str = "/api/status";
const HTTP_USER_AGENT: &str = concat!("memos-admin/", env!("CARGO_PKG_VERSION"));

/// Write access to the server's generic key/value system settings.
pub trait SettingsApi: Send + Sync {
    fn upsert_setting(&self, name: &str, value: &str) -> Result<()>;
}

pub trait StatusApi: Send + Sync {
    fn fetch_system_status(&self) -> Result<SystemStatus>;
}

#[derive(Debug, Serialize)]
struct SystemSettingUpsert<'a> {
    name: &'a str,
    value: &'a str,
}

#[derive(Debug, Deserialize)]
struct Envelope<T> {
    data: T,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    #[serde(default)]
    message: String,
    #[serde(default)]
    error: String,
}

pub struct MemosClient {
    http: Client,
    base_url: String,
    access_token: Option<String>,
}

impl MemosClient {
    pub fn new(config: &ConnectionConfig) -> Result<Self> {
        // Requests are not timed out locally; the transport decides when to give up.
        let http = Client::builder()
            .timeout(None::<Duration>)
            .user_agent(HTTP_USER_AGENT)
            .build()
            .context("failed to create memos http client")?;

        Ok(Self {
            http,
            base_url: config.server_url.clone(),
            access_token: config.access_token.clone(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn endpoint(&self, path: &str) -> String {
        endpoint_url(&self.base_url, path)
    }

    fn authorize(&self, request: RequestBuilder) -> RequestBuilder {
        match self.access_token.as_deref() {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }

    fn execute(&self, request: RequestBuilder, what: &str) -> Result<String> {
        let response = self
            .authorize(request)
            .send()
            .with_context(|| format!("failed to request {what}"))?;

        let status = response.status();
        let body = response
            .text()
            .with_context(|| format!("failed to read {what} response"))?;
        if !status.is_success() {
            return Err(anyhow!(
                "{what} request failed: {} {}",
                status,
                summarize_error_body(&body)
            ));
        }

        Ok(body)
    }

    fn send<T: DeserializeOwned>(&self, request: RequestBuilder, what: &str) -> Result<T> {
        let body = self.execute(request, what)?;
        decode_envelope(&body).with_context(|| format!("failed to parse {what} response"))
    }
}

impl SettingsApi for MemosClient {
    fn upsert_setting(&self, name: &str, value: &str) -> Result<()> {
        let request = self
            .http
            .post(self.endpoint(SYSTEM_SETTING_PATH))
            .json(&SystemSettingUpsert { name, value });
        // The echoed setting is not needed; the status refresh picks up the new value.
        self.execute(request, "system setting upsert").map(|_| ())
    }
}

impl StatusApi for MemosClient {
    fn fetch_system_status(&self) -> Result<SystemStatus> {
        let request = self.http.get(self.endpoint(SYSTEM_STATUS_PATH));
        self.send(request, "system status")
    }
}

fn endpoint_url(base_url: &str, path: &str) -> String {
    format!("{}{}", base_url.trim_end_matches('/'), path)
}

fn decode_envelope<T: DeserializeOwned>(body: &str) -> Result<T> {
    let envelope: Envelope<T> = serde_json::from_str(body)?;
    Ok(envelope.data)
}

fn summarize_error_body(body: &str) -> String {
    match serde_json::from_str::<ErrorBody>(body) {
        Ok(parsed) if !parsed.message.is_empty() => parsed.message,
        Ok(parsed) if !parsed.error.is_empty() => parsed.error,
        _ => body.trim().to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::profile::Appearance;

    #[test]
    fn endpoint_joins_without_double_slash() {
        assert_eq!(
            endpoint_url("http://localhost:5230/", SYSTEM_STATUS_PATH),
            "http://localhost:5230/api/status"
        );
        assert_eq!(
            endpoint_url("https://memos.example.com/sub", SYSTEM_SETTING_PATH),
            "https://memos.example.com/sub/api/system/setting"
        );
    }

    #[test]
    fn upsert_body_shape() {
        let body = serde_json::to_value(SystemSettingUpsert {
            name: "customized-profile",
            value: "{\"name\":\"memos\"}",
        })
        .unwrap();
        assert_eq!(
            body,
            serde_json::json!({
                "name": "customized-profile",
                "value": "{\"name\":\"memos\"}",
            })
        );
    }

    #[test]
    fn decodes_status_envelope() {
        let status: SystemStatus = decode_envelope(
            r#"{"data":{"profile":{"mode":"prod","version":"0.9.1"},
                "customizedProfile":{"name":"notes","appearance":"dark"}}}"#,
        )
        .unwrap();
        assert_eq!(status.profile.version, "0.9.1");
        assert_eq!(status.customized_profile.name, "notes");
        assert_eq!(status.customized_profile.appearance, Appearance::Dark);
    }

    #[test]
    fn rejects_body_without_envelope() {
        assert!(decode_envelope::<SystemStatus>(r#"{"profile":{}}"#).is_err());
    }

    #[test]
    fn error_body_summary() {
        assert_eq!(
            summarize_error_body(r#"{"message":"Unauthorized"}"#),
            "Unauthorized"
        );
        assert_eq!(summarize_error_body(r#"{"error":"bad request"}"#), "bad request");
        assert_eq!(summarize_error_body("  gateway down \n"), "gateway down");
    }
}
