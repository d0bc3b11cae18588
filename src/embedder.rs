//! Embedding provider client and vector similarity.

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_TYPE};
use serde::{Deserialize, Serialize};

use crate::{
    config::ProviderConfig,
    error::{Error, Result},
};

/// Translates text into a fixed-dimension vector. The seam for swapping
/// providers and for test doubles.
#[async_trait]
pub trait Embedder: Send + Sync {
    async fn embed(&self, text: &str) -> Result<Vec<f32>>;
}

/// Stateless client for OpenAI-style embedding endpoints.
///
/// Every call is a fresh request: no retries, no caching. A retryable failure
/// is the scheduler's business on a future pass, not this client's.
pub struct RemoteEmbedder {
    client: reqwest::Client,
    endpoint: String,
    model: String,
    has_credential: bool,
}

impl RemoteEmbedder {
    pub fn new(config: &ProviderConfig) -> Result<Self> {
        let has_credential = !config.api_key.trim().is_empty();

        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        if has_credential {
            let auth = format!("Bearer {}", config.api_key.trim());
            headers.insert(
                AUTHORIZATION,
                HeaderValue::from_str(&auth)
                    .map_err(|_| Error::Config("API key contains invalid characters".into()))?,
            );
        }

        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .default_headers(headers)
            .build()
            .map_err(|e| Error::Config(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            client,
            endpoint: config.endpoint.clone(),
            model: config.model.clone(),
            has_credential,
        })
    }
}

#[async_trait]
impl Embedder for RemoteEmbedder {
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        if !self.has_credential {
            return Err(Error::Auth);
        }

        let request = EmbeddingRequest {
            model: &self.model,
            input: text,
        };

        let response = self
            .client
            .post(&self.endpoint)
            .json(&request)
            .send()
            .await
            .map_err(|e| Error::Network(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "<body unavailable>".to_string());
            return Err(Error::Network(format!("provider returned {status}: {body}")));
        }

        let parsed: EmbeddingResponse = response
            .json()
            .await
            .map_err(|e| Error::Parse(e.to_string()))?;

        parsed
            .data
            .into_iter()
            .next()
            .map(|entry| entry.embedding)
            .ok_or_else(|| Error::Parse("response contained no embeddings".into()))
    }
}

#[derive(Serialize)]
struct EmbeddingRequest<'a> {
    model: &'a str,
    input: &'a str,
}

#[derive(Deserialize)]
struct EmbeddingResponse {
    data: Vec<EmbeddingData>,
}

#[derive(Deserialize)]
struct EmbeddingData {
    embedding: Vec<f32>,
}

/// Cosine similarity: `dot(a,b) / (|a|*|b|)`.
///
/// Returns `0.0` when the vectors differ in length or either has zero
/// magnitude. That is a defined edge case, not an error: such pairs simply
/// rank as unrelated.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() {
        return 0.0;
    }

    let mut dot = 0.0f32;
    let mut norm_a = 0.0f32;
    let mut norm_b = 0.0f32;
    for (x, y) in a.iter().zip(b) {
        dot += x * y;
        norm_a += x * x;
        norm_b += y * y;
    }

    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }
    dot / (norm_a.sqrt() * norm_b.sqrt())
}

#[cfg(test)]
mod tests {
    use std::{
        io::{Read, Write},
        net::TcpListener,
        time::Duration,
    };

    use super::*;

    #[test]
    fn similarity_of_vector_with_itself_is_one() {
        let v = vec![0.3, -1.2, 4.5];
        assert!((cosine_similarity(&v, &v) - 1.0).abs() < 1e-6);
    }

    #[test]
    fn similarity_is_symmetric() {
        let a = vec![1.0, 2.0, 3.0];
        let b = vec![-2.0, 0.5, 1.0];
        assert_eq!(cosine_similarity(&a, &b), cosine_similarity(&b, &a));
    }

    #[test]
    fn similarity_of_orthogonal_vectors_is_zero() {
        let a = vec![1.0, 0.0];
        let b = vec![0.0, 1.0];
        assert!(cosine_similarity(&a, &b).abs() < 1e-6);
    }

    #[test]
    fn similarity_of_opposite_vectors_is_minus_one() {
        let a = vec![1.0, 2.0];
        let b = vec![-1.0, -2.0];
        assert!((cosine_similarity(&a, &b) + 1.0).abs() < 1e-6);
    }

    #[test]
    fn mismatched_lengths_yield_zero() {
        assert_eq!(cosine_similarity(&[1.0, 2.0], &[1.0, 2.0, 3.0]), 0.0);
    }

    #[test]
    fn zero_vector_yields_zero() {
        assert_eq!(cosine_similarity(&[0.0, 0.0], &[1.0, 2.0]), 0.0);
        assert_eq!(cosine_similarity(&[1.0, 2.0], &[0.0, 0.0]), 0.0);
    }

    /// One-shot HTTP server on a loopback port, answering every connection
    /// with the given response.
    fn spawn_server(response: &'static str) -> String {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        std::thread::spawn(move || {
            if let Ok((mut stream, _)) = listener.accept() {
                let mut buf = [0u8; 4096];
                let _ = stream.read(&mut buf);
                let _ = stream.write_all(response.as_bytes());
            }
        });
        format!("http://{addr}")
    }

    fn test_config(endpoint: String) -> ProviderConfig {
        ProviderConfig {
            endpoint,
            model: "test-model".to_string(),
            api_key: "sk-test".to_string(),
            timeout: Duration::from_secs(5),
        }
    }

    #[tokio::test]
    async fn missing_credential_short_circuits_to_auth_error() {
        // Endpoint deliberately unroutable: no network call may happen.
        let config = ProviderConfig {
            api_key: "   ".to_string(),
            ..test_config("http://192.0.2.1:1/embeddings".to_string())
        };
        let embedder = RemoteEmbedder::new(&config).unwrap();
        let err = embedder.embed("hello").await.unwrap_err();
        assert!(matches!(err, Error::Auth));
    }

    #[tokio::test]
    async fn successful_response_yields_vector() {
        let endpoint = spawn_server(
            "HTTP/1.1 200 OK\r\ncontent-type: application/json\r\ncontent-length: 69\r\nconnection: close\r\n\r\n\
             {\"data\":[{\"embedding\":[0.1,0.2,0.3],\"index\":0,\"object\":\"embedding\"}]}",
        );
        let embedder = RemoteEmbedder::new(&test_config(endpoint)).unwrap();
        let vector = embedder.embed("hello").await.unwrap();
        assert_eq!(vector, vec![0.1, 0.2, 0.3]);
    }

    #[tokio::test]
    async fn non_success_status_is_network_error() {
        let endpoint = spawn_server(
            "HTTP/1.1 401 Unauthorized\r\ncontent-length: 0\r\nconnection: close\r\n\r\n",
        );
        let embedder = RemoteEmbedder::new(&test_config(endpoint)).unwrap();
        let err = embedder.embed("hello").await.unwrap_err();
        assert!(matches!(err, Error::Network(_)));
    }

    #[tokio::test]
    async fn undecodable_body_is_parse_error() {
        let endpoint = spawn_server(
            "HTTP/1.1 200 OK\r\ncontent-type: application/json\r\ncontent-length: 14\r\nconnection: close\r\n\r\n\
             {\"weird\":true}",
        );
        let embedder = RemoteEmbedder::new(&test_config(endpoint)).unwrap();
        let err = embedder.embed("hello").await.unwrap_err();
        assert!(matches!(err, Error::Parse(_)));
    }

    #[tokio::test]
    async fn connection_failure_is_network_error() {
        // Bind a port, then drop the listener so connections are refused.
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let endpoint = format!("http://{}", listener.local_addr().unwrap());
        drop(listener);

        let embedder = RemoteEmbedder::new(&test_config(endpoint)).unwrap();
        let err = embedder.embed("hello").await.unwrap_err();
        assert!(matches!(err, Error::Network(_)));
    }

    #[tokio::test]
    async fn empty_input_is_forwarded() {
        // The provider decides validity of empty input; here it accepts.
        let endpoint = spawn_server(
            "HTTP/1.1 200 OK\r\ncontent-type: application/json\r\ncontent-length: 65\r\nconnection: close\r\n\r\n\
             {\"data\":[{\"embedding\":[1.0,0.0],\"index\":0,\"object\":\"embedding\"}]}",
        );
        let embedder = RemoteEmbedder::new(&test_config(endpoint)).unwrap();
        let vector = embedder.embed("").await.unwrap();
        assert_eq!(vector.len(), 2);
    }
}
