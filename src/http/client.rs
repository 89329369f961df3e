//! Outbound HTTP client for service-to-service calls.
//!
//! Thin wrapper over the hyper-util legacy client: resolves logical service
//! names through the registry, enforces the configured request timeout, and
//! routes every request through [`PropagateTrace`] so the current trace id
//! rides along on the wire. Failures come back as [`ClientError`]; the
//! trace id used for a failed attempt stays current on the calling task for
//! whatever fallback logic runs next.

use std::sync::Arc;
use std::time::Duration;

use axum::body::{to_bytes, Body};
use axum::http::{Request, StatusCode, Uri};
use hyper_util::client::legacy::connect::HttpConnector;
use hyper_util::client::legacy::Client;
use hyper_util::rt::TokioExecutor;
use tower::ServiceExt;

use crate::discovery::registry::ServiceRegistry;
use crate::http::inject::PropagateTrace;
use crate::observability::metrics;

const MAX_RESPONSE_BYTES: usize = 2 * 1024 * 1024;

/// Downstream-call failure. Not produced by the propagation core itself.
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    #[error("unknown service '{0}'")]
    UnknownService(String),

    #[error("invalid request uri: {0}")]
    InvalidUri(#[from] axum::http::uri::InvalidUri),

    #[error("transport error calling '{service}': {source}")]
    Transport {
        service: String,
        #[source]
        source: hyper_util::client::legacy::Error,
    },

    #[error("request to '{service}' timed out after {timeout:?}")]
    Timeout { service: String, timeout: Duration },

    #[error("'{service}' responded with status {status}")]
    Status { service: String, status: StatusCode },

    #[error("failed to read response body: {0}")]
    Body(#[from] axum::Error),
}

/// Trace-propagating HTTP client over logical service names.
#[derive(Clone)]
pub struct HttpClient {
    service: PropagateTrace<Client<HttpConnector, Body>>,
    registry: Arc<ServiceRegistry>,
    timeout: Duration,
}

impl HttpClient {
    pub fn new(registry: Arc<ServiceRegistry>, timeout: Duration) -> Self {
        let client = Client::builder(TokioExecutor::new()).build(HttpConnector::new());
        Self {
            service: PropagateTrace::new(client),
            registry,
            timeout,
        }
    }

    /// GET `path` on the logical service `name`; returns the body on 2xx.
    pub async fn get(&self, name: &str, path: &str) -> Result<String, ClientError> {
        let base = self
            .registry
            .resolve(name)
            .ok_or_else(|| ClientError::UnknownService(name.to_string()))?;
        let uri: Uri = format!("{}{}", base.as_str().trim_end_matches('/'), path).parse()?;

        let mut req = Request::new(Body::empty());
        *req.uri_mut() = uri;

        // The timeout covers the whole exchange, body read included; a
        // slow-dripping upstream cannot stall past the configured limit.
        let service = self.service.clone();
        let exchange = async move {
            let response = service.oneshot(req).await.map_err(|source| {
                metrics::record_upstream_request(name, 0);
                ClientError::Transport {
                    service: name.to_string(),
                    source,
                }
            })?;
            let status = response.status();
            let body = to_bytes(Body::new(response.into_body()), MAX_RESPONSE_BYTES).await?;
            Ok::<_, ClientError>((status, body))
        };
        let (status, body) = tokio::time::timeout(self.timeout, exchange)
            .await
            .map_err(|_| {
                metrics::record_upstream_request(name, 0);
                ClientError::Timeout {
                    service: name.to_string(),
                    timeout: self.timeout,
                }
            })??;

        metrics::record_upstream_request(name, status.as_u16());
        if !status.is_success() {
            return Err(ClientError::Status {
                service: name.to_string(),
                status,
            });
        }
        Ok(String::from_utf8_lossy(&body).to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn registry_with(name: &str, url: &str) -> Arc<ServiceRegistry> {
        let registry = ServiceRegistry::new();
        registry.register(name, url.parse().unwrap());
        Arc::new(registry)
    }

    #[tokio::test]
    async fn test_unknown_service_is_an_error() {
        let client = HttpClient::new(Arc::new(ServiceRegistry::new()), Duration::from_secs(1));
        match client.get("nowhere", "/user").await {
            Err(ClientError::UnknownService(name)) => assert_eq!(name, "nowhere"),
            other => panic!("expected UnknownService, got {:?}", other.map(|_| ())),
        }
    }

    #[tokio::test]
    async fn test_timeout_covers_slow_body_read() {
        use tokio::io::AsyncWriteExt;

        // Upstream sends the response head and a partial body, then stalls.
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            if let Ok((mut socket, _)) = listener.accept().await {
                let _ = socket
                    .write_all(b"HTTP/1.1 200 OK\r\nContent-Length: 1024\r\n\r\npartial")
                    .await;
                tokio::time::sleep(Duration::from_secs(10)).await;
                let _ = socket.shutdown().await;
            }
        });

        let client = HttpClient::new(
            registry_with("backend", &format!("http://{addr}")),
            Duration::from_millis(300),
        );
        match client.get("backend", "/user").await {
            Err(ClientError::Timeout { service, timeout }) => {
                assert_eq!(service, "backend");
                assert_eq!(timeout, Duration::from_millis(300));
            }
            other => panic!("expected Timeout, got {:?}", other.map(|_| ())),
        }
    }

    #[tokio::test]
    async fn test_connection_refused_maps_to_transport() {
        // Port 1 is closed on loopback in any sane environment.
        let client = HttpClient::new(
            registry_with("backend", "http://127.0.0.1:1"),
            Duration::from_secs(2),
        );
        match client.get("backend", "/user").await {
            Err(ClientError::Transport { service, .. }) => assert_eq!(service, "backend"),
            other => panic!("expected Transport, got {:?}", other.map(|_| ())),
        }
    }
}
