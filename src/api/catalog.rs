//! Model catalog client.
//!
//! Dataflow:
//! - On the tester's mount and on manual refresh, `list_models` and
//!   `list_showcase` run concurrently; the picker state updates once both
//!   settle.
//! - The gateway is loose about the `/api/models` shape, so it is decoded once
//!   here into a tagged union and nothing downstream re-checks it.
//! - Showcase data is optional enrichment: any failure collapses to an empty
//!   map and is never surfaced.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::{ApiClient, ApiError, Body};

pub const MODELS_ENDPOINT: &str = "/api/models";
pub const SHOWCASE_ENDPOINT: &str = "/api/models-showcase";

/// One catalog entry. Identity is `id`; everything else is display data
/// owned by the gateway.
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
pub struct ModelInfo {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub provider: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
}

/// Curated per-model metadata, joined to [`ModelInfo`] by `id`.
#[derive(Deserialize, Serialize, Debug, Clone, Default)]
pub struct ShowcaseModel {
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub provider: String,
    #[serde(default)]
    pub best_for: Vec<String>,
    #[serde(default)]
    pub strengths: Vec<String>,
    #[serde(default)]
    pub limitations: Vec<String>,
    #[serde(default)]
    pub output_specs: Option<String>,
    #[serde(default)]
    pub estimated_cost: Option<String>,
    #[serde(default)]
    pub use_cases: Vec<String>,
}

/// The `/api/models` payload shapes seen in the wild, decoded exactly once.
#[derive(Deserialize, Debug)]
#[serde(untagged)]
enum ModelsPayload {
    Array(Vec<ModelEntry>),
    WrappedModels { models: Vec<ModelEntry> },
    WrappedData { data: Vec<ModelEntry> },
    Unrecognized(Value),
}

/// Elements may be full records or bare id strings.
#[derive(Deserialize, Debug)]
#[serde(untagged)]
enum ModelEntry {
    Bare(String),
    Info(ModelInfo),
}

impl ModelEntry {
    fn into_info(self) -> ModelInfo {
        match self {
            ModelEntry::Bare(id) => ModelInfo {
                name: id.clone(),
                id,
                provider: Some("Unknown".to_string()),
                description: None,
            },
            ModelEntry::Info(info) => info,
        }
    }
}

/// Normalize a `/api/models` body into a flat model list. An unrecognized
/// shape is logged and degrades to an empty list rather than an error.
pub fn decode_models(value: Value) -> Vec<ModelInfo> {
    let payload = match serde_json::from_value::<ModelsPayload>(value) {
        Ok(payload) => payload,
        Err(e) => {
            tracing::warn!("failed to decode models payload: {e}");
            return Vec::new();
        }
    };
    let entries = match payload {
        ModelsPayload::Array(entries) => entries,
        ModelsPayload::WrappedModels { models } => models,
        ModelsPayload::WrappedData { data } => data,
        ModelsPayload::Unrecognized(other) => {
            tracing::warn!("unexpected models response shape: {other}");
            return Vec::new();
        }
    };
    entries.into_iter().map(ModelEntry::into_info).collect()
}

/// Fetch the list of available models. Transport and HTTP errors propagate;
/// shape surprises are absorbed to an empty list.
pub async fn list_models(client: &ApiClient) -> Result<Vec<ModelInfo>, ApiError> {
    match client.get(MODELS_ENDPOINT).await? {
        Body::Json(value) => Ok(decode_models(value)),
        Body::Text(text) => {
            tracing::warn!("non-JSON models response: {text}");
            Ok(Vec::new())
        }
    }
}

#[derive(Deserialize, Debug)]
struct ShowcaseResponse {
    #[serde(default)]
    categories: HashMap<String, ShowcaseCategory>,
}

#[derive(Deserialize, Debug)]
struct ShowcaseCategory {
    #[serde(default)]
    models: Vec<ShowcaseModel>,
}

fn flatten_showcase(response: ShowcaseResponse) -> HashMap<String, ShowcaseModel> {
    response
        .categories
        .into_values()
        .flat_map(|category| category.models)
        .map(|model| (model.id.clone(), model))
        .collect()
}

/// Fetch showcase metadata keyed by model id. Strictly optional enrichment:
/// every failure resolves to an empty map instead of propagating.
pub async fn list_showcase(client: &ApiClient) -> HashMap<String, ShowcaseModel> {
    let body = match client.get(SHOWCASE_ENDPOINT).await {
        Ok(body) => body,
        Err(e) => {
            tracing::warn!("showcase fetch failed: {e}");
            return HashMap::new();
        }
    };
    match body {
        Body::Json(value) => match serde_json::from_value::<ShowcaseResponse>(value) {
            Ok(response) => flatten_showcase(response),
            Err(e) => {
                tracing::warn!("failed to decode showcase payload: {e}");
                HashMap::new()
            }
        },
        Body::Text(text) => {
            tracing::warn!("non-JSON showcase response: {text}");
            HashMap::new()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::user_config::UserConfig;
    use serde_json::json;

    #[test]
    fn bare_strings_normalize_to_unknown_provider() {
        let models = decode_models(json!(["a", "b"]));
        assert_eq!(
            models,
            vec![
                ModelInfo {
                    id: "a".to_string(),
                    name: "a".to_string(),
                    provider: Some("Unknown".to_string()),
                    description: None,
                },
                ModelInfo {
                    id: "b".to_string(),
                    name: "b".to_string(),
                    provider: Some("Unknown".to_string()),
                    description: None,
                },
            ]
        );
    }

    #[test]
    fn wrapped_data_array_passes_through() {
        let models = decode_models(json!({"data": [{"id": "m1", "name": "Model One"}]}));
        assert_eq!(models.len(), 1);
        assert_eq!(models[0].id, "m1");
        assert_eq!(models[0].name, "Model One");
        assert_eq!(models[0].provider, None);
    }

    #[test]
    fn wrapped_models_key_is_accepted() {
        let models = decode_models(json!({"models": [{"id": "m2", "name": "Model Two"}, "m3"]}));
        assert_eq!(models.len(), 2);
        assert_eq!(models[1].provider.as_deref(), Some("Unknown"));
    }

    #[test]
    fn unrecognized_shape_degrades_to_empty() {
        assert!(decode_models(json!({})).is_empty());
        assert!(decode_models(json!({"count": 3})).is_empty());
        assert!(decode_models(json!(42)).is_empty());
    }

    #[test]
    fn showcase_flattens_categories_by_id() {
        let response: ShowcaseResponse = serde_json::from_value(json!({
            "categories": {
                "fast": {
                    "title": "Fast",
                    "models": [{"id": "m1", "name": "One", "provider": "Acme"}]
                },
                "smart": {
                    "models": [
                        {"id": "m2", "name": "Two", "provider": "Acme",
                         "strengths": ["reasoning"], "estimated_cost": "$0.01/1k"}
                    ]
                }
            }
        }))
        .unwrap();
        let map = flatten_showcase(response);
        assert_eq!(map.len(), 2);
        assert_eq!(map["m2"].strengths, vec!["reasoning".to_string()]);
        assert_eq!(map["m2"].estimated_cost.as_deref(), Some("$0.01/1k"));
    }

    #[tokio::test]
    async fn showcase_transport_failure_resolves_to_empty_map() {
        // Nothing listens on this port; the connection is refused immediately.
        let config = UserConfig {
            base_url: "http://127.0.0.1:9".to_string(),
            api_key: Some("test-key".to_string()),
        };
        let client = ApiClient::new(&config);
        let map = list_showcase(&client).await;
        assert!(map.is_empty());
    }
}
