//! REST backend over reqwest

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, Response, StatusCode, Url};
use serde_json::Value;
use std::time::Duration;

use ftms_config::BackendConfig;

use super::{Backend, FetchParams, Resource};
use crate::{CoreError, CoreResult};

pub struct HttpBackend {
    client: Client,
    base_url: Url,
    auth_token: Option<String>,
}

impl HttpBackend {
    pub fn new(base_url: &str, auth_token: Option<String>, timeout: Duration) -> CoreResult<Self> {
        let base_url = Url::parse(base_url).map_err(|e| CoreError::ConfigError {
            message: format!("Invalid backend URL '{}': {}", base_url, e),
        })?;
        if base_url.cannot_be_a_base() {
            return Err(CoreError::ConfigError {
                message: format!("Backend URL '{}' cannot be used as a base", base_url),
            });
        }
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| CoreError::ConfigError {
                message: format!("Failed to create HTTP client: {}", e),
            })?;

        Ok(Self {
            client,
            base_url,
            auth_token: auth_token.filter(|t| !t.is_empty()),
        })
    }

    pub fn from_config(config: &BackendConfig) -> CoreResult<Self> {
        let base_url = config.base_url.as_deref().ok_or_else(|| CoreError::ConfigError {
            message: "backend.base_url is required for the http backend".to_string(),
        })?;
        Self::new(
            base_url,
            config.auth_token.clone(),
            Duration::from_secs(config.timeout_secs),
        )
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// `{base}/api/{resource path}[/{id}]`
    fn url(&self, resource: Resource, id: Option<&str>) -> Url {
        let mut url = self.base_url.clone();
        if let Ok(mut segments) = url.path_segments_mut() {
            segments.pop_if_empty().push("api");
            for part in resource.path().split('/') {
                segments.push(part);
            }
            if let Some(id) = id {
                segments.push(id);
            }
        }
        url
    }

    async fn send(&self, request: RequestBuilder, resource: Resource, id: Option<&str>) -> CoreResult<Response> {
        let request = match &self.auth_token {
            Some(token) => request.bearer_auth(token),
            None => request,
        };
        let response = request
            .send()
            .await
            .map_err(|e| CoreError::Network { message: e.to_string() })?;

        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        let message = rejection_message(&body)
            .unwrap_or_else(|| status.canonical_reason().unwrap_or("Request failed").to_string());

        if status == StatusCode::NOT_FOUND {
            if let Some(id) = id {
                return Err(CoreError::NotFound {
                    resource: resource.title().to_string(),
                    id: id.to_string(),
                });
            }
        }
        if status.is_client_error() {
            return Err(CoreError::Rejected {
                status: status.as_u16(),
                message,
            });
        }
        Err(CoreError::Network {
            message: format!("Status {}: {}", status, message),
        })
    }

    async fn json(response: Response) -> CoreResult<Value> {
        response.json::<Value>().await.map_err(|e| CoreError::Decode {
            message: e.to_string(),
        })
    }
}

/// Human-readable message from an error body: `message`, then `error`, then the raw text
fn rejection_message(body: &str) -> Option<String> {
    let body = body.trim();
    if body.is_empty() {
        return None;
    }
    if let Ok(value) = serde_json::from_str::<Value>(body) {
        for key in ["message", "error"] {
            if let Some(msg) = value.get(key).and_then(Value::as_str) {
                return Some(msg.to_string());
            }
        }
    }
    Some(body.to_string())
}

#[async_trait]
impl Backend for HttpBackend {
    fn name(&self) -> &'static str {
        "http"
    }

    async fn fetch(&self, resource: Resource, params: &FetchParams) -> CoreResult<Value> {
        let url = self.url(resource, None);
        log::debug!(target: "ftms::backend", "GET {} ({} params)", url, params.pairs().len());
        let response = self
            .send(self.client.get(url).query(params.pairs()), resource, None)
            .await?;
        Self::json(response).await
    }

    async fn create(&self, resource: Resource, body: Value) -> CoreResult<Value> {
        let url = self.url(resource, None);
        log::debug!(target: "ftms::backend", "POST {}", url);
        let response = self.send(self.client.post(url).json(&body), resource, None).await?;
        Self::json(response).await
    }

    async fn update(&self, resource: Resource, id: &str, body: Value) -> CoreResult<Value> {
        let url = self.url(resource, Some(id));
        log::debug!(target: "ftms::backend", "PUT {}", url);
        let response = self
            .send(self.client.put(url).json(&body), resource, Some(id))
            .await?;
        Self::json(response).await
    }

    async fn delete(&self, resource: Resource, id: &str) -> CoreResult<()> {
        let url = self.url(resource, Some(id));
        log::debug!(target: "ftms::backend", "DELETE {}", url);
        self.send(self.client.delete(url), resource, Some(id)).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn backend(base: &str) -> HttpBackend {
        HttpBackend::new(base, None, Duration::from_secs(2)).unwrap()
    }

    #[test]
    fn test_url_building() {
        let b = backend("https://ftms.example.com/");
        assert_eq!(
            b.url(Resource::Revenues, None).as_str(),
            "https://ftms.example.com/api/revenues"
        );
        assert_eq!(
            b.url(Resource::ReportLines, None).as_str(),
            "https://ftms.example.com/api/reports/lines"
        );
        let b = backend("https://ftms.example.com/v2");
        assert_eq!(
            b.url(Resource::LoanRequests, Some("LN 7")).as_str(),
            "https://ftms.example.com/v2/api/loan-requests/LN%207"
        );
    }

    #[test]
    fn test_configured_server_root_gets_api_prefix() {
        let config = BackendConfig {
            kind: ftms_config::BackendKind::Http,
            base_url: Some("http://localhost:4000".to_string()),
            ..Default::default()
        };
        let b = HttpBackend::from_config(&config).unwrap();
        assert_eq!(b.url(Resource::Revenues, None).as_str(), "http://localhost:4000/api/revenues");
        assert_eq!(
            b.url(Resource::ReportLines, None).as_str(),
            "http://localhost:4000/api/reports/lines"
        );
    }

    #[test]
    fn test_invalid_base_url() {
        let err = HttpBackend::new("not a url", None, Duration::from_secs(1)).err().unwrap();
        assert!(matches!(err, CoreError::ConfigError { .. }));
        let err = HttpBackend::new("mailto:finance@example.com", None, Duration::from_secs(1))
            .err()
            .unwrap();
        assert!(matches!(err, CoreError::ConfigError { .. }));
    }

    #[test]
    fn test_rejection_message() {
        assert_eq!(
            rejection_message(r#"{"message": "Insufficient budget"}"#).as_deref(),
            Some("Insufficient budget")
        );
        assert_eq!(rejection_message(r#"{"error": "Duplicate"}"#).as_deref(), Some("Duplicate"));
        assert_eq!(rejection_message("Bad request\n").as_deref(), Some("Bad request"));
        assert_eq!(rejection_message("  "), None);
    }

    #[test]
    fn test_empty_token_ignored() {
        let b = HttpBackend::new("http://localhost:9000", Some(String::new()), Duration::from_secs(1)).unwrap();
        assert!(b.auth_token.is_none());
    }

    #[tokio::test]
    async fn test_unreachable_is_network_error() {
        let b = backend("http://127.0.0.1:1");
        let err = b.fetch(Resource::Revenues, &FetchParams::new()).await.unwrap_err();
        assert!(matches!(err, CoreError::Network { .. }));
        assert!(err.is_retryable());
    }
}
