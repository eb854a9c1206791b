use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use url::Url;

use crate::errors::ApiError;
use crate::services::config_service::Config;

/// Request body for `POST /api/analyze`
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalyzeRequest<'a> {
    pub repo_url: &'a str,
}

/// Request body for `POST /api/chat`
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatRequest<'a> {
    pub repo_url: &'a str,
    pub message: &'a str,
}

/// Both endpoints answer with a single markdown payload.
#[derive(Debug, Deserialize)]
struct ReplyResponse {
    response: String,
}

/// The remote analysis backend, as seen by the session controller.
#[async_trait]
pub trait ReviewApi: Send + Sync {
    async fn analyze(&self, repo_url: &str) -> Result<String, ApiError>;
    async fn chat(&self, repo_url: &str, message: &str) -> Result<String, ApiError>;
}

/// HTTP client for the reviewer backend
pub struct ReviewApiClient {
    client: Client,
    base_url: Url,
}

impl ReviewApiClient {
    pub fn new(base_url: &str, timeout: Option<std::time::Duration>) -> Result<Self, ApiError> {
        let mut builder = Client::builder();
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        let client = builder
            .build()
            .map_err(|e| ApiError::Transport(format!("Failed to create HTTP client: {}", e)))?;

        let mut base_url = Url::parse(base_url)
            .map_err(|e| ApiError::Endpoint(format!("{}: {}", base_url, e)))?;
        // Endpoints are joined relative to the base, so a path prefix must
        // end in a slash to survive the join.
        if !base_url.path().ends_with('/') {
            let path = format!("{}/", base_url.path());
            base_url.set_path(&path);
        }

        Ok(Self { client, base_url })
    }

    pub fn from_config(config: &Config) -> Result<Self, ApiError> {
        Self::new(&config.api_base_url, config.request_timeout)
    }

    fn endpoint(&self, path: &str) -> Result<Url, ApiError> {
        self.base_url
            .join(path)
            .map_err(|e| ApiError::Endpoint(format!("{}: {}", path, e)))
    }

    async fn post_for_reply<B: Serialize + ?Sized>(&self, path: &str, body: &B) -> Result<String, ApiError> {
        let url = self.endpoint(path)?;
        log::debug!("POST {}", url);

        let response = self
            .client
            .post(url)
            .header("Content-Type", "application/json")
            .json(body)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();
            log::warn!("{} answered {}", path, status);
            return Err(ApiError::Status {
                status: status.as_u16(),
                body: error_text,
            });
        }

        let reply: ReplyResponse = response
            .json()
            .await
            .map_err(|e| ApiError::Decode(e.to_string()))?;

        Ok(reply.response)
    }

    /// Checks `GET /health`; any 2xx counts as healthy.
    pub async fn health(&self) -> Result<bool, ApiError> {
        let url = self.endpoint("health")?;
        match self.client.get(url).send().await {
            Ok(response) => Ok(response.status().is_success()),
            Err(e) => {
                log::error!("Reviewer backend is not reachable: {}", e);
                Err(e.into())
            }
        }
    }
}

#[async_trait]
impl ReviewApi for ReviewApiClient {
    async fn analyze(&self, repo_url: &str) -> Result<String, ApiError> {
        self.post_for_reply("api/analyze", &AnalyzeRequest { repo_url }).await
    }

    async fn chat(&self, repo_url: &str, message: &str) -> Result<String, ApiError> {
        self.post_for_reply("api/chat", &ChatRequest { repo_url, message })
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::Matcher;
    use serde_json::json;

    #[tokio::test]
    async fn analyze_posts_repo_url() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/api/analyze")
            .match_body(Matcher::Json(json!({"repoUrl": "https://github.com/a/b"})))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"response":"Hi"}"#)
            .create_async()
            .await;

        let client = ReviewApiClient::new(&server.url(), None).unwrap();
        let reply = client.analyze("https://github.com/a/b").await.unwrap();

        assert_eq!(reply, "Hi");
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn chat_posts_repo_url_and_message() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/api/chat")
            .match_body(Matcher::Json(json!({
                "repoUrl": "https://github.com/a/b",
                "message": "what does main do?"
            })))
            .with_status(200)
            .with_body(r#"{"response":"It starts the server."}"#)
            .create_async()
            .await;

        let client = ReviewApiClient::new(&server.url(), None).unwrap();
        let reply = client
            .chat("https://github.com/a/b", "what does main do?")
            .await
            .unwrap();

        assert_eq!(reply, "It starts the server.");
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn non_success_status_is_an_error() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/api/analyze")
            .with_status(500)
            .with_body("boom")
            .create_async()
            .await;

        let client = ReviewApiClient::new(&server.url(), None).unwrap();
        let err = client.analyze("https://github.com/a/b").await.unwrap_err();

        assert_eq!(
            err,
            ApiError::Status {
                status: 500,
                body: "boom".into()
            }
        );
    }

    #[tokio::test]
    async fn malformed_body_is_a_decode_error() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/api/chat")
            .with_status(200)
            .with_body(r#"{"answer":"wrong field"}"#)
            .create_async()
            .await;

        let client = ReviewApiClient::new(&server.url(), None).unwrap();
        let err = client.chat("https://github.com/a/b", "hi").await.unwrap_err();

        assert!(matches!(err, ApiError::Decode(_)));
    }

    #[tokio::test]
    async fn health_reports_status() {
        let mut server = mockito::Server::new_async().await;
        server.mock("GET", "/health").with_status(200).create_async().await;

        let client = ReviewApiClient::new(&server.url(), None).unwrap();
        assert!(client.health().await.unwrap());
    }

    #[tokio::test]
    async fn base_path_prefix_is_kept() {
        let mut server = mockito::Server::new_async().await;
        let root = server
            .mock("POST", "/api/analyze")
            .with_status(200)
            .with_body(r#"{"response":"root"}"#)
            .expect(0)
            .create_async()
            .await;
        let prefixed = server
            .mock("POST", "/reviewer/api/analyze")
            .with_status(200)
            .with_body(r#"{"response":"prefixed"}"#)
            .expect(2)
            .create_async()
            .await;
        server.mock("GET", "/reviewer/health").with_status(204).create_async().await;

        for base in [format!("{}/reviewer", server.url()), format!("{}/reviewer/", server.url())] {
            let client = ReviewApiClient::new(&base, None).unwrap();
            assert_eq!(client.analyze("https://github.com/a/b").await.unwrap(), "prefixed");
            assert!(client.health().await.unwrap());
        }

        root.assert_async().await;
        prefixed.assert_async().await;
    }

    #[test]
    fn invalid_base_url_is_rejected() {
        assert!(matches!(
            ReviewApiClient::new("not a url", None),
            Err(ApiError::Endpoint(_))
        ));
    }
}
