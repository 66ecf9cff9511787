use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use std::time::Duration;
use url::Url;

/// Export API settings.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RemoteConfig {
    /// Bearer token for the export API (required by `sync` and `download`).
    /// TOML: `remote.api_key`.
    #[serde(default)]
    #[serde(deserialize_with = "deserialize_string_lax")]
    pub api_key: String,

    /// Update-check endpoint, queried with `?fromVersion=`.
    #[serde(default = "default_updates_url")]
    pub updates_url: Url,

    /// Full bundle endpoint used by the `download` command.
    #[serde(default = "default_bundle_url")]
    pub bundle_url: Url,

    #[serde(default = "default_connect_timeout_secs")]
    pub connect_timeout_secs: u64,

    /// Upper bound for a whole request, bundle download included.
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,

    /// Optional HTTP proxy. Example: `http://127.0.0.1:1080`.
    #[serde(default)]
    pub proxy: Option<Url>,

    /// Transport retries of a GET that answered 5xx. Sync passes themselves
    /// are never retried automatically.
    #[serde(default = "default_retry_max_times")]
    pub retry_max_times: usize,
}

impl Default for RemoteConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            updates_url: default_updates_url(),
            bundle_url: default_bundle_url(),
            connect_timeout_secs: default_connect_timeout_secs(),
            request_timeout_secs: default_request_timeout_secs(),
            proxy: None,
            retry_max_times: default_retry_max_times(),
        }
    }
}

impl RemoteConfig {
    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

fn deserialize_string_lax<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    let v = Value::deserialize(deserializer)?;

    match v {
        Value::String(s) => Ok(s),
        Value::Number(n) => Ok(n.to_string()),
        _ => Err(serde::de::Error::custom(
            "expected a string or a number for remote.api_key",
        )),
    }
}

fn default_updates_url() -> Url {
    Url::parse("https://api.zywrap.com/v1/sdk/export/updates").expect("valid default updates url")
}

fn default_bundle_url() -> Url {
    Url::parse("https://api.zywrap.com/v1/sdk/export/").expect("valid default bundle url")
}

fn default_connect_timeout_secs() -> u64 {
    10
}

fn default_request_timeout_secs() -> u64 {
    60
}

fn default_retry_max_times() -> usize {
    2
}
