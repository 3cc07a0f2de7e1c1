// src/embeddings.rs
// OpenAI-compatible embeddings API client

use crate::config::EmbeddingsConfig;
use anyhow::{Context, Result};
use std::time::Duration;
use tracing::debug;

/// HTTP timeout for embedding requests
const TIMEOUT_SECS: u64 = 30;

/// Embeddings client speaking the OpenAI wire format:
/// POST {api_url} with {"model": …, "input": [...]} →
/// {"data": [{"embedding": [...], "index": N}, …]}.
pub struct EmbeddingClient {
    api_url: String,
    model: String,
    dimensions: usize,
    batch_size: usize,
    max_chars: usize,
    http_client: reqwest::Client,
}

impl EmbeddingClient {
    pub fn new(config: &EmbeddingsConfig) -> Self {
        let http_client = reqwest::Client::builder()
            .timeout(Duration::from_secs(TIMEOUT_SECS))
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());

        Self {
            api_url: normalize_api_url(&config.api_url),
            model: config.model.clone(),
            dimensions: config.dimensions,
            batch_size: config.batch_size.max(1),
            max_chars: config.max_chars,
            http_client,
        }
    }

    pub fn dimensions(&self) -> usize {
        self.dimensions
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    pub fn batch_size(&self) -> usize {
        self.batch_size
    }

    /// Embed one batch of texts (at most `batch_size`), truncating each to
    /// `max_chars`. Vectors come back in request order; the API's `index`
    /// field is honored in case the server reorders.
    pub async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        let inputs: Vec<&str> = texts.iter().map(|t| truncate(t, self.max_chars)).collect();

        let body = serde_json::json!({
            "model": self.model,
            "input": inputs,
        });

        let response = self
            .http_client
            .post(&self.api_url)
            .json(&body)
            .send()
            .await
            .context("Embedding request failed")?;

        if !response.status().is_success() {
            let status = response.status();
            let text = response.text().await.unwrap_or_default();
            anyhow::bail!("Embedding API error {status}: {text}");
        }

        let json: serde_json::Value = response.json().await?;
        let data = json["data"]
            .as_array()
            .ok_or_else(|| anyhow::anyhow!("Malformed embedding response: missing data array"))?;

        let mut indexed: Vec<(usize, Vec<f32>)> = Vec::with_capacity(data.len());
        for (fallback_idx, item) in data.iter().enumerate() {
            let index = item["index"].as_u64().map(|i| i as usize).unwrap_or(fallback_idx);
            let values = item["embedding"]
                .as_array()
                .ok_or_else(|| anyhow::anyhow!("Malformed embedding response: missing embedding"))?;
            let vector: Vec<f32> = values
                .iter()
                .filter_map(|v| v.as_f64().map(|f| f as f32))
                .collect();
            indexed.push((index, vector));
        }
        indexed.sort_by_key(|(i, _)| *i);

        Ok(indexed.into_iter().map(|(_, v)| v).collect())
    }

    /// Embed all texts in batch-sized chunks. A failed batch degrades to
    /// `None` for each of its texts; the run continues.
    pub async fn embed_texts(&self, texts: &[String]) -> Vec<Option<Vec<f32>>> {
        let mut results: Vec<Option<Vec<f32>>> = Vec::with_capacity(texts.len());
        for chunk in texts.chunks(self.batch_size) {
            match self.embed_batch(chunk).await {
                Ok(vectors) if vectors.len() == chunk.len() => {
                    results.extend(vectors.into_iter().map(Some));
                }
                Ok(vectors) => {
                    debug!(
                        expected = chunk.len(),
                        got = vectors.len(),
                        "Embedding batch returned wrong count, skipping batch"
                    );
                    results.extend(std::iter::repeat_with(|| None).take(chunk.len()));
                }
                Err(e) => {
                    debug!("Embedding batch failed: {e}");
                    results.extend(std::iter::repeat_with(|| None).take(chunk.len()));
                }
            }
        }
        results
    }

    /// Embed a single text.
    pub async fn embed_one(&self, text: &str) -> Option<Vec<f32>> {
        let texts = [text.to_string()];
        self.embed_batch(&texts)
            .await
            .ok()
            .and_then(|mut v| if v.is_empty() { None } else { Some(v.remove(0)) })
    }

    /// Pre-flight: verify the endpoint responds and its vectors match the
    /// configured dimension. Returns (ok, human-readable detail).
    pub async fn check_connection(&self) -> (bool, String) {
        match self.embed_one("test").await {
            None => (
                false,
                format!("Could not reach embedding API at {}", self.api_url),
            ),
            Some(vector) if vector.len() != self.dimensions => (
                false,
                format!(
                    "Dimension mismatch: got {}, expected {}. \
                     Update embeddings.dimensions or run `symdex index --reembed`.",
                    vector.len(),
                    self.dimensions
                ),
            ),
            Some(vector) => (
                true,
                format!("OK (model={}, dimensions={})", self.model, vector.len()),
            ),
        }
    }
}

/// Ensure the URL targets the /embeddings endpoint.
fn normalize_api_url(api_url: &str) -> String {
    let trimmed = api_url.trim_end_matches('/');
    if trimmed.ends_with("/embeddings") {
        trimmed.to_string()
    } else {
        format!("{trimmed}/embeddings")
    }
}

/// Truncate to a char boundary at or below `max_chars` bytes.
fn truncate(text: &str, max_chars: usize) -> &str {
    if text.len() <= max_chars {
        return text;
    }
    let mut end = max_chars;
    while end > 0 && !text.is_char_boundary(end) {
        end -= 1;
    }
    &text[..end]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_api_url_appends_embeddings() {
        assert_eq!(
            normalize_api_url("http://localhost:11434/v1"),
            "http://localhost:11434/v1/embeddings"
        );
        assert_eq!(
            normalize_api_url("http://localhost:11434/v1/"),
            "http://localhost:11434/v1/embeddings"
        );
        assert_eq!(
            normalize_api_url("http://localhost:11434/v1/embeddings"),
            "http://localhost:11434/v1/embeddings"
        );
    }

    #[test]
    fn test_truncate_respects_char_boundaries() {
        let text = "héllo wörld".repeat(200);
        let cut = truncate(&text, 100);
        assert!(cut.len() <= 100);
        assert!(text.starts_with(cut));

        assert_eq!(truncate("short", 100), "short");
    }

    #[test]
    fn test_client_from_config() {
        let config = EmbeddingsConfig::default();
        let client = EmbeddingClient::new(&config);
        assert_eq!(client.dimensions(), 768);
        assert_eq!(client.batch_size(), 32);
        assert!(client.api_url.ends_with("/embeddings"));
    }

    #[tokio::test]
    async fn test_check_connection_unreachable() {
        let mut config = EmbeddingsConfig::default();
        // Port 1 on loopback refuses immediately
        config.api_url = "http://127.0.0.1:1/v1".to_string();
        let client = EmbeddingClient::new(&config);
        let (ok, msg) = client.check_connection().await;
        assert!(!ok);
        assert!(msg.contains("Could not reach"));
    }
}
