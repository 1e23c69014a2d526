use once_cell::sync::Lazy;
use serde_json::{json, Value};
use std::time::Duration;

use crate::{SemanticConfig, SemanticEmbedding, SemanticError};

// Shared HTTP client with connection pooling
static HTTP_CLIENT: Lazy<reqwest::Client> = Lazy::new(|| {
    reqwest::Client::builder()
        .connect_timeout(Duration::from_secs(10))
        .pool_max_idle_per_host(8)
        .build()
        .unwrap_or_default()
});

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum ApiProviderKind {
    HuggingFace,
    OpenAI,
    Custom,
}

/// Embeds every text with a single API request.
pub(crate) async fn semanticize_batch_via_api<D, T>(
    docs: &[(D, T)],
    cfg: &SemanticConfig,
) -> Result<Vec<SemanticEmbedding>, SemanticError>
where
    D: AsRef<str>,
    T: AsRef<str>,
{
    if docs.is_empty() {
        return Ok(Vec::new());
    }

    let url = cfg
        .api_url
        .as_deref()
        .ok_or_else(|| SemanticError::InvalidConfig("api_url is required for api mode".into()))?;

    let texts: Vec<&str> = docs.iter().map(|(_, text)| text.as_ref()).collect();
    let payload = build_api_payload(api_provider_kind(cfg), &texts, cfg);
    let response = send_api_request(url, cfg, payload).await?;
    let vectors = parse_embeddings_from_value(response)?;

    if vectors.len() != docs.len() {
        return Err(SemanticError::Inference(format!(
            "API returned {} embeddings for {} inputs",
            vectors.len(),
            docs.len()
        )));
    }

    Ok(docs
        .iter()
        .zip(vectors)
        .map(|((doc_id, _), vector)| SemanticEmbedding::from_raw(doc_id.as_ref(), vector, cfg))
        .collect())
}

fn api_provider_kind(cfg: &SemanticConfig) -> ApiProviderKind {
    let provider = cfg
        .api_provider
        .as_deref()
        .unwrap_or("custom")
        .to_ascii_lowercase();
    match provider.as_str() {
        "hf" | "huggingface" => ApiProviderKind::HuggingFace,
        "openai" | "gpt" => ApiProviderKind::OpenAI,
        _ => ApiProviderKind::Custom,
    }
}

fn build_api_payload(provider: ApiProviderKind, texts: &[&str], cfg: &SemanticConfig) -> Value {
    match provider {
        ApiProviderKind::HuggingFace => json!({ "inputs": texts }),
        ApiProviderKind::OpenAI => json!({ "input": texts, "model": cfg.model_name }),
        ApiProviderKind::Custom => json!({ "texts": texts }),
    }
}

async fn send_api_request(
    url: &str,
    cfg: &SemanticConfig,
    payload: Value,
) -> Result<Value, SemanticError> {
    let mut request = HTTP_CLIENT.post(url).json(&payload);
    if let Some(header) = cfg.api_auth_header.as_deref() {
        request = request.header(reqwest::header::AUTHORIZATION, header);
    }
    if let Some(secs) = cfg.api_timeout_secs {
        request = request.timeout(Duration::from_secs(secs));
    }

    let response = request
        .send()
        .await
        .map_err(|e| SemanticError::Download(format!("HTTP request failed: {e}")))?;

    if !response.status().is_success() {
        let status = response.status();
        let body = response.text().await.unwrap_or_default();
        return Err(SemanticError::Download(format!(
            "HTTP error {status}: {body}"
        )));
    }

    response
        .json::<Value>()
        .await
        .map_err(|e| SemanticError::Inference(format!("Invalid JSON response: {e}")))
}

/// Accepts the shapes the supported providers answer with:
/// `[[f32]]`, `[f32]`, `{"embeddings": ...}` and OpenAI's `{"data": [{"embedding": ...}]}`.
fn parse_embeddings_from_value(value: Value) -> Result<Vec<Vec<f32>>, SemanticError> {
    match value {
        Value::Object(mut map) => {
            if let Some(embeddings) = map.remove("embeddings") {
                return parse_embedding_collection(embeddings);
            }

            if let Some(Value::Array(items)) = map.remove("data") {
                return items
                    .into_iter()
                    .map(|item| match item {
                        Value::Object(mut obj) => obj
                            .remove("embedding")
                            .ok_or_else(|| {
                                SemanticError::Inference(
                                    "missing `embedding` field in data item".into(),
                                )
                            })
                            .and_then(parse_embedding_vector),
                        _ => Err(SemanticError::Inference(
                            "unexpected entry inside `data` array".into(),
                        )),
                    })
                    .collect();
            }

            Err(SemanticError::Inference(
                "unsupported API response shape".into(),
            ))
        }
        other => parse_embedding_collection(other),
    }
}

fn parse_embedding_collection(value: Value) -> Result<Vec<Vec<f32>>, SemanticError> {
    match value {
        Value::Array(items) if items.is_empty() => Ok(Vec::new()),
        Value::Array(items) if items.iter().all(Value::is_array) => {
            items.into_iter().map(parse_embedding_vector).collect()
        }
        other => parse_embedding_vector(other).map(|vec| vec![vec]),
    }
}

fn parse_embedding_vector(value: Value) -> Result<Vec<f32>, SemanticError> {
    match value {
        Value::Array(values) => values
            .into_iter()
            .map(|entry| match entry {
                Value::Number(num) => num
                    .as_f64()
                    .map(|f| f as f32)
                    .ok_or_else(|| SemanticError::Inference("non-finite embedding value".into())),
                other => Err(SemanticError::Inference(format!(
                    "embedding entries must be numbers, got {other:?}"
                ))),
            })
            .collect(),
        other => Err(SemanticError::Inference(format!(
            "embedding vector must be an array, got {other:?}"
        ))),
    }
}
