use std::time::Duration;

use reqwest::{Client, StatusCode};
use serde::Deserialize;

use qfs_common::{FileSystemInfo, HostFailure, Member};

use crate::error::MgmtError;
use crate::types::{QueryOutcome, SharedFsManager};

/// Management backend reached over the management daemon's JSON API.
#[derive(Clone)]
pub struct HttpManager {
    http: Client,
    base_url: String,
}

#[derive(Debug, Deserialize)]
struct MembersResponse {
    #[serde(default)]
    members: Vec<Member>,
    #[serde(default)]
    failures: Vec<HostFailure>,
}

#[derive(Debug, Deserialize)]
struct RemoveResponse {
    #[serde(default)]
    failures: Vec<HostFailure>,
}

#[derive(Debug, Deserialize)]
struct HostnameResponse {
    hostname: String,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    error: ErrorDetail,
}

#[derive(Debug, Deserialize)]
struct ErrorDetail {
    message: String,
}

impl HttpManager {
    pub fn new(base_url: &str) -> Result<Self, MgmtError> {
        let http = Client::builder()
            .connect_timeout(Duration::from_secs(3))
            .timeout(Duration::from_secs(30))
            .build()?;
        Ok(Self::with_client(http, base_url))
    }

    pub fn with_client(http: Client, base_url: &str) -> Self {
        Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    fn url(&self, host: &str, rest: &str) -> String {
        format!(
            "{}/hosts/{}{}",
            self.base_url,
            urlencoding::encode(host),
            rest
        )
    }

    /// Map a non-success response to an error, keeping the daemon's message.
    async fn check(host: &str, resp: reqwest::Response) -> Result<reqwest::Response, MgmtError> {
        let status = resp.status();
        if status.is_success() {
            return Ok(resp);
        }
        let text = resp.text().await.unwrap_or_default();
        let message = serde_json::from_str::<ErrorBody>(&text)
            .map(|b| b.error.message)
            .unwrap_or(text);

        Err(match status {
            StatusCode::NOT_FOUND => MgmtError::not_found(host, message),
            StatusCode::BAD_GATEWAY
            | StatusCode::SERVICE_UNAVAILABLE
            | StatusCode::GATEWAY_TIMEOUT => MgmtError::unreachable(host, message),
            _ => MgmtError::Rejected(message),
        })
    }

    /// Connect failures and timeouts mean the host is down, not that the
    /// daemon answered badly.
    fn send_error(host: &str, err: reqwest::Error) -> MgmtError {
        if err.is_connect() || err.is_timeout() {
            MgmtError::unreachable(host, err.to_string())
        } else {
            MgmtError::from(err)
        }
    }

    async fn fetch_members(
        &self,
        coordinator: &str,
        fs_name: &str,
    ) -> Result<MembersResponse, MgmtError> {
        let url = self.url(
            coordinator,
            &format!("/shared/{}/members", urlencoding::encode(fs_name)),
        );
        let resp = self
            .http
            .get(&url)
            .send()
            .await
            .map_err(|e| Self::send_error(coordinator, e))?;
        let resp = Self::check(coordinator, resp).await?;
        Ok(resp.json().await?)
    }

    async fn delete_member(
        &self,
        coordinator: &str,
        fs_name: &str,
        host: &str,
    ) -> Result<RemoveResponse, MgmtError> {
        let url = self.url(
            coordinator,
            &format!(
                "/shared/{}/members/{}",
                urlencoding::encode(fs_name),
                urlencoding::encode(host)
            ),
        );
        let resp = self
            .http
            .delete(&url)
            .send()
            .await
            .map_err(|e| Self::send_error(coordinator, e))?;
        let resp = Self::check(coordinator, resp).await?;
        Ok(resp.json().await?)
    }

    async fn post_mount_op(&self, host: &str, fs_name: &str, op: &str) -> Result<(), MgmtError> {
        let url = self.url(
            host,
            &format!("/filesystems/{}/{op}", urlencoding::encode(fs_name)),
        );
        let resp = self.http.post(&url).send().await?;
        Self::check(host, resp).await?;
        Ok(())
    }
}

#[async_trait::async_trait]
impl SharedFsManager for HttpManager {
    async fn shared_members(&self, coordinator: &str, fs_name: &str) -> QueryOutcome<Vec<Member>> {
        match self.fetch_members(coordinator, fs_name).await {
            Ok(body) => QueryOutcome::from_parts(body.members, body.failures),
            Err(e) => {
                tracing::warn!(coordinator, fs = fs_name, error=%e, "shared members query failed");
                QueryOutcome::Failed(e)
            }
        }
    }

    async fn file_systems(&self, host: &str) -> Result<Vec<FileSystemInfo>, MgmtError> {
        let resp = self.http.get(self.url(host, "/filesystems")).send().await?;
        Ok(Self::check(host, resp).await?.json().await?)
    }

    async fn mount(&self, host: &str, fs_name: &str) -> Result<(), MgmtError> {
        self.post_mount_op(host, fs_name, "mount").await
    }

    async fn unmount(&self, host: &str, fs_name: &str) -> Result<(), MgmtError> {
        self.post_mount_op(host, fs_name, "unmount").await
    }

    async fn server_hostname(&self, host: &str) -> Result<String, MgmtError> {
        let resp = self.http.get(self.url(host, "/hostname")).send().await?;
        let body: HostnameResponse = Self::check(host, resp).await?.json().await?;
        Ok(body.hostname)
    }

    async fn remove_member(
        &self,
        coordinator: &str,
        fs_name: &str,
        host: &str,
    ) -> QueryOutcome<()> {
        match self.delete_member(coordinator, fs_name, host).await {
            Ok(body) => QueryOutcome::from_parts((), body.failures),
            Err(e) => {
                tracing::warn!(coordinator, fs = fs_name, host, error=%e, "remove member failed");
                QueryOutcome::Failed(e)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_url_encodes_segments() {
        let mgr = HttpManager::with_client(Client::new(), "http://mgmt:8080/api/");
        assert_eq!(
            mgr.url("srv 1", "/filesystems"),
            "http://mgmt:8080/api/hosts/srv%201/filesystems"
        );
    }

    #[test]
    fn test_remove_response_failures() {
        let body: RemoveResponse = serde_json::from_str(
            r#"{"failures":[{"host":"cl1","message":"connection timed out"}]}"#,
        )
        .unwrap();
        let outcome = QueryOutcome::from_parts((), body.failures);
        assert_eq!(outcome.failures()[0].host, "cl1");

        let empty: RemoveResponse = serde_json::from_str("{}").unwrap();
        assert!(QueryOutcome::from_parts((), empty.failures).is_complete());
    }

    #[test]
    fn test_members_response_defaults() {
        let body: MembersResponse = serde_json::from_str(r#"{"members":[]}"#).unwrap();
        assert!(body.members.is_empty());
        assert!(body.failures.is_empty());
    }
}
