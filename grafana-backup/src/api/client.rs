//! Authenticated HTTP access to the Grafana API.
//!
//! Every request is a Basic-auth GET against `{base_url}/api/{resource}`.
//! A non-200 response is a transport-tier failure: the server's `message`
//! field is logged and the error aborts the backup pass. There is no retry
//! or backoff; timeouts are whatever the client library defaults to.

use serde_json::Value;
use tracing::{debug, error};

use super::models::{find_folder, DashboardSummary, Folder};
use crate::config::{FolderSelector, HostConfig};
use crate::utils::errors::{BackupError, Result};

pub struct GrafanaClient {
    base_url: String,
    username: String,
    password: String,
    http: reqwest::Client,
}

impl GrafanaClient {
    /// Build a client for one host. TLS verification is disabled only when
    /// the host config says so.
    pub fn new(host: &HostConfig) -> Result<Self> {
        let http = reqwest::Client::builder()
            .danger_accept_invalid_certs(!host.verify_ssl)
            .build()?;

        Ok(Self {
            base_url: host.url.trim_end_matches('/').to_string(),
            username: host.username.clone(),
            password: host.password.clone(),
            http,
        })
    }

    /// HTTP GET returning the decoded JSON body.
    pub async fn get(&self, resource: &str) -> Result<Value> {
        let url = api_url(&self.base_url, resource);
        debug!("GET {}", url);

        let response = self
            .http
            .get(&url)
            .basic_auth(&self.username, Some(&self.password))
            .send()
            .await?;

        let status = response.status();
        let text = response.text().await?;

        if status != reqwest::StatusCode::OK {
            let message = serde_json::from_str::<Value>(&text)
                .ok()
                .and_then(|body| {
                    body.get("message")
                        .and_then(Value::as_str)
                        .map(str::to_string)
                })
                .unwrap_or_else(|| text.clone());
            error!(
                "Request failed - HTTP error {}: {}",
                status.as_u16(),
                message
            );
            return Err(BackupError::Api {
                status: status.as_u16(),
                message,
            });
        }

        Ok(serde_json::from_str(&text)?)
    }

    /// Dashboards present in a certain folder.
    pub async fn list_dashboards(&self, folder_id: i64) -> Result<Vec<DashboardSummary>> {
        let body = self
            .get(&format!("search?folderIds={}&type=dash-db", folder_id))
            .await?;
        Ok(serde_json::from_value(body)?)
    }

    /// Full JSON definition of a single dashboard.
    pub async fn dashboard_detail(&self, uid: &str) -> Result<Value> {
        self.get(&format!("dashboards/uid/{}", uid)).await
    }

    /// Resolve the configured folder selector against the server's folder
    /// listing.
    pub async fn resolve_folder(&self, selector: &FolderSelector) -> Result<Folder> {
        let body = self.get("folders/").await?;
        let folders: Vec<Folder> = serde_json::from_value(body)?;
        find_folder(&folders, selector)
    }
}

/// `{base_url}/api/{resource}`
fn api_url(base_url: &str, resource: &str) -> String {
    format!("{}/api/{}", base_url, resource)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn host(url: &str, verify_ssl: bool) -> HostConfig {
        HostConfig {
            name: "prod".to_string(),
            url: url.to_string(),
            username: "u".to_string(),
            password: "p".to_string(),
            verify_ssl,
            folder: None,
        }
    }

    #[test]
    fn test_api_url() {
        assert_eq!(
            api_url("http://g", "search?folderIds=7&type=dash-db"),
            "http://g/api/search?folderIds=7&type=dash-db"
        );
        assert_eq!(api_url("http://g", "folders/"), "http://g/api/folders/");
    }

    #[test]
    fn test_trailing_slash_stripped_from_base_url() {
        let client = GrafanaClient::new(&host("http://g/", true)).unwrap();
        assert_eq!(client.base_url, "http://g");
    }

    #[test]
    fn test_client_builds_without_tls_verification() {
        assert!(GrafanaClient::new(&host("https://g", false)).is_ok());
    }
}
