//! Scripted gateway for driving the workbench in tests.

use crate::error::{AppError, AppResult};
use crate::gateway::{
    BackendGateway, CompileRequest, CompileResponse, DatasetFile, ExportArtifact,
    MultiUploadResponse, RecommendationEntry, RecommendationRequest, RecommendationResponse,
    RemoteImportRequest, RemoteImportResponse, UploadResponse, VisualizationRequest,
    VisualizationResponse, Visualizations,
};
use crate::model::ModelConfiguration;
use crate::session::{MemoryBackend, SessionBackend};
use async_trait::async_trait;
use std::cell::RefCell;
use std::collections::VecDeque;

/// Replies are consumed in FIFO order per endpoint. An endpoint with nothing
/// scripted answers with a transport error.
#[derive(Default)]
pub struct MockGateway {
    pub uploads: RefCell<VecDeque<AppResult<UploadResponse>>>,
    pub multi_uploads: RefCell<VecDeque<AppResult<MultiUploadResponse>>>,
    pub remote_imports: RefCell<VecDeque<AppResult<RemoteImportResponse>>>,
    pub compiles: RefCell<VecDeque<AppResult<CompileResponse>>>,
    pub visualizations: RefCell<VecDeque<AppResult<VisualizationResponse>>>,
    pub recommendations: RefCell<VecDeque<AppResult<RecommendationResponse>>>,
    pub exports: RefCell<VecDeque<AppResult<ExportArtifact>>>,
    calls: RefCell<Vec<&'static str>>,
    compile_requests: RefCell<Vec<CompileRequest>>,
    recommend_requests: RefCell<Vec<RecommendationRequest>>,
}

fn next<T>(queue: &RefCell<VecDeque<AppResult<T>>>, endpoint: &str) -> AppResult<T> {
    queue
        .borrow_mut()
        .pop_front()
        .unwrap_or_else(|| Err(AppError::transport(format!("no reply scripted for {}", endpoint))))
}

impl MockGateway {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn calls(&self) -> Vec<&'static str> {
        self.calls.borrow().clone()
    }

    pub fn call_count(&self, endpoint: &str) -> usize {
        self.calls.borrow().iter().filter(|c| **c == endpoint).count()
    }

    pub fn compile_requests(&self) -> Vec<CompileRequest> {
        self.compile_requests.borrow().clone()
    }

    pub fn recommend_requests(&self) -> Vec<RecommendationRequest> {
        self.recommend_requests.borrow().clone()
    }

    pub fn upload_ok(&self, session: &str, columns: &[&str]) {
        self.uploads.borrow_mut().push_back(Ok(UploadResponse {
            success: true,
            session_id: Some(session.to_string()),
            columns: columns.iter().map(|c| c.to_string()).collect(),
            error: None,
        }));
    }

    pub fn compile_ok(&self, session: &str) {
        self.compiles.borrow_mut().push_back(Ok(CompileResponse {
            success: true,
            session_id: Some(session.to_string()),
            error: None,
        }));
    }

    pub fn visualizations_ok(&self) {
        self.visualizations
            .borrow_mut()
            .push_back(Ok(VisualizationResponse {
                success: true,
                visualizations: Some(Visualizations {
                    distribution: "ZGlzdA==".into(),
                    correlation: "Y29ycg==".into(),
                    missing_data: "bWlzcw==".into(),
                    trends: "dHJlbmQ=".into(),
                }),
                error: None,
            }));
    }

    pub fn recommendations_ok(&self, values: &[&str]) {
        let recommendations = values
            .iter()
            .enumerate()
            .map(|(idx, value)| RecommendationEntry {
                output_value: serde_json::Value::String(value.to_string()),
                score: Some(1.0 - idx as f64 / 10.0),
                details: None,
            })
            .collect();
        self.recommendations
            .borrow_mut()
            .push_back(Ok(RecommendationResponse {
                success: true,
                recommendations,
                error: None,
            }));
    }

    fn record(&self, endpoint: &'static str) {
        self.calls.borrow_mut().push(endpoint);
    }
}

#[async_trait(?Send)]
impl BackendGateway for MockGateway {
    async fn upload_single(&self, _file: &DatasetFile) -> AppResult<UploadResponse> {
        self.record("upload-data");
        next(&self.uploads, "upload-data")
    }

    async fn upload_multiple(&self, _files: &[DatasetFile]) -> AppResult<MultiUploadResponse> {
        self.record("upload-multiple");
        next(&self.multi_uploads, "upload-multiple")
    }

    async fn import_remote(
        &self,
        _request: &RemoteImportRequest,
    ) -> AppResult<RemoteImportResponse> {
        self.record("kaggle-import");
        next(&self.remote_imports, "kaggle-import")
    }

    async fn compile(&self, request: &CompileRequest) -> AppResult<CompileResponse> {
        self.record("compile-model");
        self.compile_requests.borrow_mut().push(request.clone());
        next(&self.compiles, "compile-model")
    }

    async fn visualizations(
        &self,
        _request: &VisualizationRequest,
    ) -> AppResult<VisualizationResponse> {
        self.record("get-visualizations");
        next(&self.visualizations, "get-visualizations")
    }

    async fn recommend(
        &self,
        request: &RecommendationRequest,
    ) -> AppResult<RecommendationResponse> {
        self.record("get-recommendations");
        self.recommend_requests.borrow_mut().push(request.clone());
        next(&self.recommendations, "get-recommendations")
    }

    async fn export_model(&self, _config: &ModelConfiguration) -> AppResult<ExportArtifact> {
        self.record("export-model");
        next(&self.exports, "export-model")
    }
}

/// Session backend whose writes always fail, like `localStorage` over quota.
#[derive(Clone, Default)]
pub struct RejectingBackend {
    inner: MemoryBackend,
}

impl RejectingBackend {
    pub fn with_value(id: &str) -> Self {
        Self {
            inner: MemoryBackend::with_value(id),
        }
    }
}

impl SessionBackend for RejectingBackend {
    fn load(&self) -> Option<String> {
        self.inner.load()
    }

    fn store(&self, _id: &str) -> AppResult<()> {
        Err(AppError::storage("quota exceeded"))
    }

    fn remove(&self) {
        self.inner.remove();
    }
}
