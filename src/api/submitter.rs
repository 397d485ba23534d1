//! Outbound document submission.

use async_trait::async_trait;
use reqwest::header::CONTENT_TYPE;
use reqwest::{Client, StatusCode, Url};
use tracing::{debug, warn};

use super::document::Document;
use crate::config::ClientConfig;
use crate::error::{CrptError, Result};

/// Header carrying the caller's detached signature.
pub const SIGNATURE_HEADER: &str = "Signature";

/// Trait for anything that can deliver a document to the registry.
///
/// `CrptApi` only calls this after a rate limit slot has been reserved.
#[async_trait]
pub trait DocumentSubmitter: Send + Sync {
    /// Send one document. No retries.
    async fn submit(&self, document: &Document, signature: &str) -> Result<()>;
}

/// Submits documents as JSON over HTTP.
#[derive(Debug, Clone)]
pub struct HttpDocumentSubmitter {
    client: Client,
    endpoint: Url,
}

impl HttpDocumentSubmitter {
    /// Create a submitter for the default endpoint.
    pub fn new() -> Result<Self> {
        Self::from_config(&ClientConfig::default())
    }

    /// Create a submitter for a specific endpoint with a default client.
    pub fn with_endpoint(endpoint: &str) -> Result<Self> {
        Ok(Self {
            client: Client::new(),
            endpoint: parse_endpoint(endpoint)?,
        })
    }

    /// Create a submitter from client configuration.
    pub fn from_config(config: &ClientConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(config.request_timeout())
            .connect_timeout(config.connect_timeout())
            .build()
            .map_err(|e| {
                CrptError::InvalidConfiguration(format!("Failed to build HTTP client: {}", e))
            })?;

        Ok(Self {
            client,
            endpoint: parse_endpoint(&config.endpoint)?,
        })
    }

    /// Get the endpoint documents are posted to.
    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }
}

fn parse_endpoint(endpoint: &str) -> Result<Url> {
    Url::parse(endpoint).map_err(|e| {
        CrptError::InvalidConfiguration(format!("Invalid endpoint {:?}: {}", endpoint, e))
    })
}

#[async_trait]
impl DocumentSubmitter for HttpDocumentSubmitter {
    async fn submit(&self, document: &Document, signature: &str) -> Result<()> {
        let body = serde_json::to_vec(document)?;

        debug!(
            endpoint = %self.endpoint,
            doc_id = %document.doc_id,
            bytes = body.len(),
            "Submitting document"
        );

        let response = self
            .client
            .post(self.endpoint.clone())
            .header(CONTENT_TYPE, "application/json")
            .header(SIGNATURE_HEADER, signature)
            .body(body)
            .send()
            .await?;

        let status = response.status();
        if status != StatusCode::OK {
            warn!(
                endpoint = %self.endpoint,
                status = status.as_u16(),
                "Document rejected"
            );
            return Err(CrptError::RemoteRejected {
                status: status.as_u16(),
            });
        }

        debug!(doc_id = %document.doc_id, "Document accepted");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::document::Description;
    use crate::config::DEFAULT_ENDPOINT;
    use axum::body::Bytes;
    use axum::extract::State;
    use axum::http::HeaderMap;
    use axum::routing::post;
    use axum::Router;
    use std::net::SocketAddr;
    use std::sync::{Arc, Mutex};

    const CREATE_PATH: &str = "/api/v3/lk/documents/create";

    #[derive(Debug, Clone)]
    struct Captured {
        content_type: Option<String>,
        signature: Option<String>,
        body: serde_json::Value,
    }

    #[derive(Clone)]
    struct Endpoint {
        status: axum::http::StatusCode,
        requests: Arc<Mutex<Vec<Captured>>>,
    }

    async fn create(
        State(endpoint): State<Endpoint>,
        headers: HeaderMap,
        body: Bytes,
    ) -> axum::http::StatusCode {
        let header = |name: &str| {
            headers
                .get(name)
                .and_then(|v| v.to_str().ok())
                .map(str::to_string)
        };

        endpoint.requests.lock().unwrap().push(Captured {
            content_type: header("content-type"),
            signature: header("signature"),
            body: serde_json::from_slice(&body).unwrap_or(serde_json::Value::Null),
        });

        endpoint.status
    }

    async fn spawn_endpoint(status: u16) -> (SocketAddr, Arc<Mutex<Vec<Captured>>>) {
        let requests = Arc::new(Mutex::new(Vec::new()));
        let state = Endpoint {
            status: axum::http::StatusCode::from_u16(status).unwrap(),
            requests: Arc::clone(&requests),
        };
        let app = Router::new().route(CREATE_PATH, post(create)).with_state(state);

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        (addr, requests)
    }

    fn endpoint_url(addr: SocketAddr) -> String {
        format!("http://{}{}", addr, CREATE_PATH)
    }

    fn document() -> Document {
        Document {
            description: Description {
                participant_inn: "7700000000".to_string(),
            },
            doc_id: "doc-42".to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn test_default_endpoint() {
        let submitter = HttpDocumentSubmitter::new().unwrap();
        assert_eq!(submitter.endpoint().as_str(), DEFAULT_ENDPOINT);
    }

    #[test]
    fn test_invalid_endpoint_rejected() {
        let result = HttpDocumentSubmitter::with_endpoint("not a url");
        assert!(matches!(result, Err(CrptError::InvalidConfiguration(_))));
    }

    #[tokio::test]
    async fn test_submit_sends_headers_and_body() {
        let (addr, requests) = spawn_endpoint(200).await;
        let submitter = HttpDocumentSubmitter::with_endpoint(&endpoint_url(addr)).unwrap();

        submitter.submit(&document(), "sig-abc").await.unwrap();

        let requests = requests.lock().unwrap();
        assert_eq!(requests.len(), 1);
        let captured = &requests[0];
        assert_eq!(captured.content_type.as_deref(), Some("application/json"));
        assert_eq!(captured.signature.as_deref(), Some("sig-abc"));
        assert_eq!(captured.body["doc_id"], "doc-42");
        assert_eq!(captured.body["description"]["participantInn"], "7700000000");
    }

    #[tokio::test]
    async fn test_non_ok_status_is_rejection() {
        let (addr, requests) = spawn_endpoint(429).await;
        let submitter = HttpDocumentSubmitter::with_endpoint(&endpoint_url(addr)).unwrap();

        let result = submitter.submit(&document(), "sig").await;

        assert!(matches!(
            result,
            Err(CrptError::RemoteRejected { status: 429 })
        ));
        assert_eq!(requests.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_other_success_codes_are_rejections() {
        let (addr, _requests) = spawn_endpoint(201).await;
        let submitter = HttpDocumentSubmitter::with_endpoint(&endpoint_url(addr)).unwrap();

        let result = submitter.submit(&document(), "sig").await;

        assert!(matches!(
            result,
            Err(CrptError::RemoteRejected { status: 201 })
        ));
    }

    #[tokio::test]
    async fn test_connection_refused_is_transport_failure() {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let submitter = HttpDocumentSubmitter::with_endpoint(&endpoint_url(addr)).unwrap();
        let result = submitter.submit(&document(), "sig").await;

        assert!(matches!(result, Err(CrptError::TransportFailure(_))));
    }
}
