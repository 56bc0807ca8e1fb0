//! `BackendGateway` over `fetch`, via gloo-net.

use crate::config::DEFAULT_EXPORT_FILENAME;
use crate::error::{AppError, AppResult};
use crate::gateway::{
    BackendGateway, CompileRequest, CompileResponse, DatasetFile, ExportArtifact,
    MultiUploadResponse, RecommendationRequest, RecommendationResponse, RemoteImportRequest,
    RemoteImportResponse, UploadResponse, VisualizationRequest, VisualizationResponse,
};
use crate::model::ModelConfiguration;
use crate::utils::content_disposition_filename;
use async_trait::async_trait;
use gloo_net::http::{Request, Response};
use log::debug;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use wasm_bindgen::JsValue;

impl From<gloo_net::Error> for AppError {
    fn from(err: gloo_net::Error) -> Self {
        AppError::transport(err.to_string())
    }
}

fn js_error(context: &str, err: JsValue) -> AppError {
    let detail = err.as_string().unwrap_or_else(|| format!("{:?}", err));
    AppError::transport(format!("{}: {}", context, detail))
}

#[derive(Deserialize)]
struct ErrorBody {
    error: Option<String>,
}

pub struct HttpGateway {
    base_url: String,
}

impl HttpGateway {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path)
    }

    async fn post_json<B, R>(&self, path: &str, body: &B) -> AppResult<R>
    where
        B: Serialize + ?Sized,
        R: DeserializeOwned,
    {
        debug!("POST /{}", path);
        let response = Request::post(&self.url(path)).json(body)?.send().await?;
        read_json(response).await
    }

    async fn post_form<R: DeserializeOwned>(
        &self,
        path: &str,
        form: web_sys::FormData,
    ) -> AppResult<R> {
        debug!("POST /{} (multipart)", path);
        let response = Request::post(&self.url(path)).body(form)?.send().await?;
        read_json(response).await
    }
}

/// Non-2xx statuses become transport errors, keeping the backend's `error`
/// text when the body has one.
async fn status_error(response: Response) -> AppError {
    let status = response.status();
    let detail = response
        .json::<ErrorBody>()
        .await
        .ok()
        .and_then(|body| body.error);
    match detail {
        Some(detail) => AppError::transport(format!("HTTP error! status: {} ({})", status, detail)),
        None => AppError::transport(format!("HTTP error! status: {}", status)),
    }
}

async fn read_json<R: DeserializeOwned>(response: Response) -> AppResult<R> {
    if !response.ok() {
        return Err(status_error(response).await);
    }
    let text = response.text().await?;
    Ok(serde_json::from_str(&text)?)
}

fn to_blob(file: &DatasetFile) -> AppResult<web_sys::Blob> {
    let array = js_sys::Uint8Array::from(file.bytes.as_slice());
    let parts = js_sys::Array::new();
    parts.push(&array.buffer());
    let options = web_sys::BlobPropertyBag::new();
    options.set_type(&file.mime);
    web_sys::Blob::new_with_u8_array_sequence_and_options(&parts, &options)
        .map_err(|e| js_error("blob", e))
}

fn form_with(files: &[(String, &DatasetFile)]) -> AppResult<web_sys::FormData> {
    let form = web_sys::FormData::new().map_err(|e| js_error("form data", e))?;
    for (field, file) in files {
        let blob = to_blob(file)?;
        form.append_with_blob_and_filename(field, &blob, &file.name)
            .map_err(|e| js_error("form data", e))?;
    }
    Ok(form)
}

#[async_trait(?Send)]
impl BackendGateway for HttpGateway {
    async fn upload_single(&self, file: &DatasetFile) -> AppResult<UploadResponse> {
        let form = form_with(&[("file".to_string(), file)])?;
        self.post_form("upload-data", form).await
    }

    async fn upload_multiple(&self, files: &[DatasetFile]) -> AppResult<MultiUploadResponse> {
        let fields: Vec<(String, &DatasetFile)> = files
            .iter()
            .enumerate()
            .map(|(idx, file)| (format!("file{}", idx), file))
            .collect();
        let form = form_with(&fields)?;
        self.post_form("upload-multiple", form).await
    }

    async fn import_remote(
        &self,
        request: &RemoteImportRequest,
    ) -> AppResult<RemoteImportResponse> {
        self.post_json("kaggle-import", request).await
    }

    async fn compile(&self, request: &CompileRequest) -> AppResult<CompileResponse> {
        self.post_json("compile-model", request).await
    }

    async fn visualizations(
        &self,
        request: &VisualizationRequest,
    ) -> AppResult<VisualizationResponse> {
        self.post_json("get-visualizations", request).await
    }

    async fn recommend(
        &self,
        request: &RecommendationRequest,
    ) -> AppResult<RecommendationResponse> {
        self.post_json("get-recommendations", request).await
    }

    async fn export_model(&self, config: &ModelConfiguration) -> AppResult<ExportArtifact> {
        debug!("POST /export-model");
        let response = Request::post(&self.url("export-model"))
            .json(config)?
            .send()
            .await?;
        if !response.ok() {
            return Err(status_error(response).await);
        }
        let file_name = response
            .headers()
            .get("content-disposition")
            .and_then(|header| content_disposition_filename(&header))
            .unwrap_or_else(|| DEFAULT_EXPORT_FILENAME.to_string());
        let bytes = response.binary().await?;
        Ok(ExportArtifact { file_name, bytes })
    }
}
