//! Backend gateway contract and wire types.
//!
//! Everything the front-end sends to or receives from the recommendation
//! service goes through [`BackendGateway`]. Implementations only move bytes;
//! interpreting `success: false` is left to the coordinators.

use crate::error::{AppError, AppResult};
use crate::manifest::ColumnRef;
use crate::model::{Algorithm, ModelConfiguration, SystemType};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A dataset file read into memory from the browser.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DatasetFile {
    pub name: String,
    pub mime: String,
    pub bytes: Vec<u8>,
}

impl DatasetFile {
    pub fn new(name: impl Into<String>, mime: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            name: name.into(),
            mime: mime.into(),
            bytes,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct KaggleCredentials {
    pub username: String,
    pub key: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RemoteImportRequest {
    pub kaggle_json: KaggleCredentials,
    pub dataset_path: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CompileRequest {
    pub session_id: Option<String>,
    pub system_type: SystemType,
    pub algorithm: Algorithm,
    /// Plain names of every selected column, for backends that only read this.
    pub columns: Vec<String>,
    pub inputs: Vec<ColumnRef>,
    pub output: ColumnRef,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VisualizationRequest {
    pub session_id: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RecommendationQuery {
    /// Direct mode: one free-text value.
    InputValue(String),
    /// Advanced mode: one value per selected input column.
    Inputs(BTreeMap<String, String>),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RecommendationRequest {
    pub session_id: String,
    #[serde(flatten)]
    pub query: RecommendationQuery,
    pub n_recommendations: usize,
}

/// Common envelope fields of every JSON reply.
pub trait Reply {
    fn success(&self) -> bool;
    fn error_message(&self) -> Option<&str>;
}

/// Turns a `success: false` reply into a backend error.
pub fn ensure_success<R: Reply>(reply: R, fallback: &str) -> AppResult<R> {
    if reply.success() {
        Ok(reply)
    } else {
        Err(AppError::backend(
            reply.error_message().unwrap_or(fallback).to_string(),
        ))
    }
}

macro_rules! impl_reply {
    ($($ty:ty),* $(,)?) => {
        $(impl Reply for $ty {
            fn success(&self) -> bool {
                self.success
            }

            fn error_message(&self) -> Option<&str> {
                self.error.as_deref()
            }
        })*
    };
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct UploadResponse {
    #[serde(default)]
    pub success: bool,
    pub session_id: Option<String>,
    #[serde(default)]
    pub columns: Vec<String>,
    pub error: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct MultiUploadResponse {
    #[serde(default)]
    pub success: bool,
    pub session_id: Option<String>,
    #[serde(default)]
    pub columns: BTreeMap<String, Vec<String>>,
    pub error: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct RemoteImportResponse {
    #[serde(default)]
    pub success: bool,
    pub message: Option<String>,
    pub headers: Option<Vec<String>>,
    pub filename: Option<String>,
    pub session_id: Option<String>,
    pub error: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct CompileResponse {
    #[serde(default)]
    pub success: bool,
    pub session_id: Option<String>,
    pub error: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Visualizations {
    #[serde(default)]
    pub distribution: String,
    #[serde(default)]
    pub correlation: String,
    #[serde(default)]
    pub missing_data: String,
    #[serde(default)]
    pub trends: String,
}

impl Visualizations {
    /// `(title, base64 png)` pairs in display order.
    pub fn panels(&self) -> [(&'static str, &str); 4] {
        [
            ("Distribution", self.distribution.as_str()),
            ("Correlation", self.correlation.as_str()),
            ("Missing Data", self.missing_data.as_str()),
            ("Trends", self.trends.as_str()),
        ]
    }

    pub fn data_uri(encoded: &str) -> String {
        format!("data:image/png;base64,{}", encoded)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct VisualizationResponse {
    #[serde(default)]
    pub success: bool,
    pub visualizations: Option<Visualizations>,
    pub error: Option<String>,
}

/// One recommendation as the backend sends it. Older backends name the value
/// `name` or `Title` and the score `Score`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct RecommendationEntry {
    #[serde(alias = "name", alias = "Title")]
    pub output_value: serde_json::Value,
    #[serde(default, alias = "Score")]
    pub score: Option<f64>,
    #[serde(default)]
    pub details: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct RecommendationResponse {
    #[serde(default)]
    pub success: bool,
    #[serde(default)]
    pub recommendations: Vec<RecommendationEntry>,
    pub error: Option<String>,
}

impl_reply!(
    UploadResponse,
    MultiUploadResponse,
    RemoteImportResponse,
    CompileResponse,
    VisualizationResponse,
    RecommendationResponse,
);

/// A downloadable model file produced by the backend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportArtifact {
    pub file_name: String,
    pub bytes: Vec<u8>,
}

#[async_trait(?Send)]
pub trait BackendGateway {
    /// `POST /upload-data`
    async fn upload_single(&self, file: &DatasetFile) -> AppResult<UploadResponse>;

    /// `POST /upload-multiple`
    async fn upload_multiple(&self, files: &[DatasetFile]) -> AppResult<MultiUploadResponse>;

    /// `POST /kaggle-import`
    async fn import_remote(&self, request: &RemoteImportRequest)
        -> AppResult<RemoteImportResponse>;

    /// `POST /compile-model`
    async fn compile(&self, request: &CompileRequest) -> AppResult<CompileResponse>;

    /// `POST /get-visualizations`
    async fn visualizations(
        &self,
        request: &VisualizationRequest,
    ) -> AppResult<VisualizationResponse>;

    /// `POST /get-recommendations`
    async fn recommend(&self, request: &RecommendationRequest)
        -> AppResult<RecommendationResponse>;

    /// `POST /export-model`
    async fn export_model(&self, config: &ModelConfiguration) -> AppResult<ExportArtifact>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn direct_query_serializes_input_value() {
        let request = RecommendationRequest {
            session_id: "s1".into(),
            query: RecommendationQuery::InputValue("30".into()),
            n_recommendations: 5,
        };
        assert_eq!(
            serde_json::to_value(&request).unwrap(),
            json!({"session_id": "s1", "input_value": "30", "n_recommendations": 5})
        );
    }

    #[test]
    fn advanced_query_serializes_inputs_object() {
        let mut inputs = BTreeMap::new();
        inputs.insert("age".to_string(), "30".to_string());
        let request = RecommendationRequest {
            session_id: "s1".into(),
            query: RecommendationQuery::Inputs(inputs),
            n_recommendations: 3,
        };
        assert_eq!(
            serde_json::to_value(&request).unwrap(),
            json!({"session_id": "s1", "inputs": {"age": "30"}, "n_recommendations": 3})
        );
    }

    #[test]
    fn kaggle_request_uses_camel_case() {
        let request = RemoteImportRequest {
            kaggle_json: KaggleCredentials {
                username: "ada".into(),
                key: "k".into(),
            },
            dataset_path: "ada/movies".into(),
        };
        assert_eq!(
            serde_json::to_value(&request).unwrap(),
            json!({"kaggleJson": {"username": "ada", "key": "k"}, "datasetPath": "ada/movies"})
        );
    }

    #[test]
    fn recommendation_entries_accept_legacy_names() {
        let body = json!({
            "success": true,
            "recommendations": [
                {"output_value": "Heat", "score": 0.9},
                {"Title": "Ronin", "Score": 0.7},
                {"name": 42, "details": "year: 1998"}
            ]
        });
        let response: RecommendationResponse = serde_json::from_value(body).unwrap();
        assert_eq!(response.recommendations.len(), 3);
        assert_eq!(response.recommendations[1].score, Some(0.7));
        assert_eq!(response.recommendations[2].output_value, json!(42));
    }

    #[test]
    fn unsuccessful_reply_becomes_backend_error() {
        let reply = CompileResponse {
            success: false,
            session_id: None,
            error: Some("Column 'label' not found".into()),
        };
        assert_eq!(
            ensure_success(reply, "Error compiling model"),
            Err(AppError::backend("Column 'label' not found"))
        );

        let silent = UploadResponse::default();
        assert_eq!(
            ensure_success(silent, "Upload failed"),
            Err(AppError::backend("Upload failed"))
        );
    }
}
