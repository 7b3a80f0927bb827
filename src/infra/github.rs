use async_trait::async_trait;
use base64::prelude::{BASE64_STANDARD, Engine as _};
use chrono::{DateTime, Utc};
use reqwest::{
    Client, RequestBuilder, Response, StatusCode,
    header::{ACCEPT, AUTHORIZATION, USER_AGENT},
};
use serde::Deserialize;
use tracing::debug;

use crate::config::GithubTarget;
use crate::domain::revision::RevisionRef;
use crate::error::{AppError, AppResult};
use crate::services::RemoteStateService;

pub const DEFAULT_API_URL: &str = "https://api.github.com";
const WEB_URL: &str = "https://github.com";
const GITHUB_MEDIA_TYPE: &str = "application/vnd.github+json";

pub struct GitHubClient {
    http: Client,
    api_url: String,
    target: GithubTarget,
    token: Option<String>,
}

impl GitHubClient {
    pub fn new(target: GithubTarget, token: Option<String>, api_url: Option<String>) -> Self {
        Self {
            http: Client::new(),
            api_url: api_url
                .unwrap_or_else(|| DEFAULT_API_URL.to_string())
                .trim_end_matches('/')
                .to_string(),
            target,
            token: token.filter(|token| !token.trim().is_empty()),
        }
    }

    fn commits_endpoint(&self) -> String {
        format!(
            "{}/repos/{}/{}/commits",
            self.api_url, self.target.owner, self.target.repo
        )
    }

    fn contents_endpoint(&self) -> String {
        format!(
            "{}/repos/{}/{}/contents/{}",
            self.api_url,
            self.target.owner,
            self.target.repo,
            self.target.file_path.trim_start_matches('/')
        )
    }

    fn request(&self, url: String) -> RequestBuilder {
        let request = self
            .http
            .get(url)
            .header(ACCEPT, GITHUB_MEDIA_TYPE)
            .header(
                USER_AGENT,
                concat!("changelog-notifier/", env!("CARGO_PKG_VERSION")),
            );
        match &self.token {
            Some(token) => request.header(AUTHORIZATION, format!("Bearer {token}")),
            None => request,
        }
    }

    /// Sends the request; a 404 maps to `Ok(None)`.
    async fn send(
        &self,
        request: RequestBuilder,
        activity: &str,
    ) -> AppResult<Option<Response>> {
        let response = request.send().await.map_err(|err| {
            AppError::RemoteUnavailable(format!("failed to call GitHub while {activity}: {err}"))
        })?;

        let status = response.status();
        if status == StatusCode::NOT_FOUND {
            debug!(activity, "GitHub returned 404");
            return Ok(None);
        }
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "<unable to read response>".to_string());
            return Err(AppError::RemoteUnavailable(format!(
                "GitHub responded with {status} while {activity}: {}",
                body.trim()
            )));
        }
        Ok(Some(response))
    }
}

#[async_trait]
impl RemoteStateService for GitHubClient {
    async fn fetch_latest_revision(&self) -> AppResult<Option<RevisionRef>> {
        let activity = "listing commits";
        let request = self.request(self.commits_endpoint()).query(&[
            ("path", self.target.file_path.as_str()),
            ("per_page", "1"),
        ]);
        let Some(response) = self.send(request, activity).await? else {
            return Ok(None);
        };

        let commits: Vec<CommitPayload> = response
            .json()
            .await
            .map_err(|err| parse_error(activity, err))?;

        Ok(commits.into_iter().next().map(RevisionRef::from))
    }

    async fn fetch_file_content(&self) -> AppResult<Option<String>> {
        let activity = "fetching file content";
        let request = self.request(self.contents_endpoint());
        let Some(response) = self.send(request, activity).await? else {
            return Ok(None);
        };

        // Directories come back as arrays, so decode loosely first.
        let payload: serde_json::Value = response
            .json()
            .await
            .map_err(|err| parse_error(activity, err))?;
        if !payload.is_object() {
            debug!(path = %self.target.file_path, "tracked path is not a file");
            return Ok(None);
        }
        let file: ContentPayload =
            serde_json::from_value(payload).map_err(|err| parse_error(activity, err))?;

        if file.encoding.as_deref() == Some("none") {
            // Files over 1 MB are not inlined by the contents API.
            debug!(path = %self.target.file_path, "file too large for inline content");
            return Ok(None);
        }
        match file.content {
            Some(content) => decode_content(&content, file.encoding.as_deref()).map(Some),
            None => Ok(None),
        }
    }

    fn history_url(&self) -> String {
        format!(
            "{WEB_URL}/{}/{}/commits/HEAD/{}",
            self.target.owner,
            self.target.repo,
            self.target.file_path.trim_start_matches('/')
        )
    }
}

fn parse_error(activity: &str, err: impl std::fmt::Display) -> AppError {
    AppError::RemoteUnavailable(format!(
        "failed to parse GitHub response while {activity}: {err}"
    ))
}

/// Decodes a contents-API payload into UTF-8 text.
fn decode_content(content: &str, encoding: Option<&str>) -> AppResult<String> {
    match encoding.unwrap_or("base64") {
        "base64" => {
            let compact: String = content.split_whitespace().collect();
            let bytes = BASE64_STANDARD.decode(compact).map_err(|err| {
                AppError::RemoteUnavailable(format!(
                    "GitHub returned invalid base64 content: {err}"
                ))
            })?;
            Ok(String::from_utf8_lossy(&bytes).into_owned())
        }
        "utf-8" | "utf8" | "" => Ok(content.to_string()),
        other => Err(AppError::RemoteUnavailable(format!(
            "unsupported content encoding '{other}'"
        ))),
    }
}

#[derive(Deserialize)]
struct CommitPayload {
    sha: String,
    commit: CommitDetails,
    html_url: Option<String>,
}

#[derive(Deserialize)]
struct CommitDetails {
    #[serde(default)]
    message: String,
    author: Option<CommitAuthor>,
}

#[derive(Deserialize)]
struct CommitAuthor {
    name: Option<String>,
    date: Option<DateTime<Utc>>,
}

impl From<CommitPayload> for RevisionRef {
    fn from(payload: CommitPayload) -> Self {
        let (author, authored_at) = match payload.commit.author {
            Some(author) => (author.name, author.date),
            None => (None, None),
        };
        Self {
            message: payload.commit.message,
            author,
            authored_at,
            html_url: payload.html_url,
            ..RevisionRef::new(payload.sha)
        }
    }
}

#[derive(Deserialize)]
struct ContentPayload {
    content: Option<String>,
    encoding: Option<String>,
}

#[cfg(test)]
mod tests {
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    use super::*;

    /// Answers every request with the same status line and JSON body.
    async fn stub_api(status: &str, body: &str) -> String {
        let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
        let addr = listener.local_addr().expect("local addr");
        let response = format!(
            "HTTP/1.1 {status}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
            body.len()
        );
        tokio::spawn(async move {
            while let Ok((mut socket, _)) = listener.accept().await {
                let mut request = Vec::new();
                let mut buf = [0u8; 1024];
                while !request.windows(4).any(|w| w == b"\r\n\r\n") {
                    match socket.read(&mut buf).await {
                        Ok(0) | Err(_) => break,
                        Ok(n) => request.extend_from_slice(&buf[..n]),
                    }
                }
                let _ = socket.write_all(response.as_bytes()).await;
                let _ = socket.shutdown().await;
            }
        });
        format!("http://{addr}")
    }

    async fn client_for(status: &str, body: &str) -> GitHubClient {
        local_client(&stub_api(status, body).await)
    }

    /// Talks to `url` directly even when a proxy is configured in the environment.
    fn local_client(url: &str) -> GitHubClient {
        GitHubClient {
            http: Client::builder().no_proxy().build().expect("http client"),
            ..client(Some(url))
        }
    }

    fn client(api_url: Option<&str>) -> GitHubClient {
        GitHubClient::new(
            GithubTarget {
                owner: "acme".to_string(),
                repo: "widgets".to_string(),
                file_path: "docs/CHANGELOG.md".to_string(),
            },
            None,
            api_url.map(str::to_string),
        )
    }

    #[test]
    fn builds_endpoints() {
        let client = client(Some("https://ghe.example.com/api/v3/"));
        assert_eq!(
            client.commits_endpoint(),
            "https://ghe.example.com/api/v3/repos/acme/widgets/commits"
        );
        assert_eq!(
            client.contents_endpoint(),
            "https://ghe.example.com/api/v3/repos/acme/widgets/contents/docs/CHANGELOG.md"
        );
    }

    #[test]
    fn builds_history_url() {
        assert_eq!(
            client(None).history_url(),
            "https://github.com/acme/widgets/commits/HEAD/docs/CHANGELOG.md"
        );
    }

    #[test]
    fn blank_token_is_anonymous() {
        let client = GitHubClient::new(GithubTarget::default(), Some("  ".to_string()), None);
        assert!(client.token.is_none());
    }

    #[test]
    fn decodes_wrapped_base64() {
        // GitHub wraps base64 content at 60 columns.
        let encoded = "IyMgdjEuMi4wCi0gQWRk\nZWQgZmVhdHVyZSBY\n";
        let text = decode_content(encoded, Some("base64")).expect("decodes");
        assert_eq!(text, "## v1.2.0\n- Added feature X");
    }

    #[test]
    fn rejects_invalid_base64() {
        let err = decode_content("@@not base64@@", Some("base64")).unwrap_err();
        assert!(err.is_remote_unavailable());
    }

    #[test]
    fn maps_commit_payload() {
        let raw = r#"[{
            "sha": "6dcb09b5b57875f334f61aebed695e2e4193db5e",
            "commit": {
                "message": "Update CHANGELOG.md",
                "author": { "name": "Octo Cat", "email": "octo@example.com", "date": "2024-03-01T12:00:00Z" }
            },
            "html_url": "https://github.com/acme/widgets/commit/6dcb09b"
        }]"#;
        let commits: Vec<CommitPayload> = serde_json::from_str(raw).expect("valid payload");
        let revision = RevisionRef::from(commits.into_iter().next().expect("one commit"));

        assert_eq!(revision.id, "6dcb09b5b57875f334f61aebed695e2e4193db5e");
        assert_eq!(revision.message, "Update CHANGELOG.md");
        assert_eq!(revision.author.as_deref(), Some("Octo Cat"));
        assert!(revision.authored_at.is_some());
    }

    #[test]
    fn file_payload_without_content_is_tolerated() {
        let payload = serde_json::json!({ "type": "file", "name": "CHANGELOG.md" });
        let file: ContentPayload = serde_json::from_value(payload).expect("valid payload");
        assert!(file.content.is_none());
    }

    #[tokio::test]
    async fn missing_repository_is_not_found() {
        let client = client_for("404 Not Found", r#"{"message":"Not Found"}"#).await;

        assert_eq!(client.fetch_latest_revision().await.expect("404 is not an error"), None);
        assert_eq!(client.fetch_file_content().await.expect("404 is not an error"), None);
    }

    #[tokio::test]
    async fn empty_commit_list_is_not_found() {
        let client = client_for("200 OK", "[]").await;
        assert_eq!(client.fetch_latest_revision().await.expect("empty list"), None);
    }

    #[tokio::test]
    async fn latest_commit_becomes_revision() {
        let body = r#"[{"sha":"abc123","commit":{"message":"Bump"},"html_url":null}]"#;
        let client = client_for("200 OK", body).await;

        let revision = client
            .fetch_latest_revision()
            .await
            .expect("fetch")
            .expect("revision");
        assert_eq!(revision.id, "abc123");
        assert_eq!(revision.message, "Bump");
    }

    #[tokio::test]
    async fn rate_limits_and_server_errors_are_unavailable() {
        for status in [
            "403 Forbidden",
            "429 Too Many Requests",
            "500 Internal Server Error",
            "503 Service Unavailable",
        ] {
            let client = client_for(status, r#"{"message":"API rate limit exceeded"}"#).await;

            let err = client.fetch_latest_revision().await.unwrap_err();
            assert!(err.is_remote_unavailable(), "{status}: {err}");
            let err = client.fetch_file_content().await.unwrap_err();
            assert!(err.is_remote_unavailable(), "{status}: {err}");
        }
    }

    #[tokio::test]
    async fn refused_connection_is_unavailable() {
        let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
        let addr = listener.local_addr().expect("local addr");
        drop(listener);

        let client = local_client(&format!("http://{addr}"));
        assert!(client.fetch_latest_revision().await.unwrap_err().is_remote_unavailable());
    }

    #[tokio::test]
    async fn directory_listing_is_not_found() {
        let body = r#"[{"type":"file","name":"CHANGELOG.md"}]"#;
        let client = client_for("200 OK", body).await;
        assert_eq!(client.fetch_file_content().await.expect("directory"), None);
    }

    #[tokio::test]
    async fn file_content_is_decoded() {
        let body = r#"{"type":"file","encoding":"base64","content":"IyMgdjEuMi4wCi0gQWRk\nZWQgZmVhdHVyZSBY\n"}"#;
        let client = client_for("200 OK", body).await;

        let text = client.fetch_file_content().await.expect("fetch");
        assert_eq!(text.as_deref(), Some("## v1.2.0\n- Added feature X"));
    }

    #[tokio::test]
    async fn oversized_file_is_not_found() {
        let body = r#"{"type":"file","encoding":"none","content":""}"#;
        let client = client_for("200 OK", body).await;
        assert_eq!(client.fetch_file_content().await.expect("large file"), None);
    }
}
