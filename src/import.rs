//! Dataset import flows: single CSV upload, multi-file upload and Kaggle import.
//!
//! Each flow is split into a `begin_*` step that validates input and stamps a
//! request token, and a `finish_*` step that applies the gateway's reply if the
//! token is still the latest. Nothing is borrowed across the network call.

use crate::config::MIN_MULTI_FILES;
use crate::error::{AppError, AppResult, ValidationError};
use crate::gateway::{
    ensure_success, DatasetFile, MultiUploadResponse, RemoteImportRequest, RemoteImportResponse,
    UploadResponse,
};
use crate::manifest::{preview_headers, ColumnManifest};
use crate::sequence::{Completion, RequestKind, RequestSequencer, RequestToken};
use crate::utils::{validate_credentials, validate_csv_file, validate_dataset_path};
use log::{info, warn};

/// Result of a successful import, handed to the workbench to fan out.
#[derive(Debug, Clone, PartialEq)]
pub struct ImportedDataset {
    pub session_id: Option<String>,
    pub manifest: ColumnManifest,
    /// What the drop zone shows: file name(s) or dataset name.
    pub label: String,
    /// Backend message worth showing the user (Kaggle import only).
    pub message: Option<String>,
}

#[derive(Debug)]
pub struct DatasetImportCoordinator {
    manifest: Option<ColumnManifest>,
    label: Option<String>,
    preview: Vec<String>,
    error: Option<AppError>,
    sequencer: RequestSequencer,
}

impl Default for DatasetImportCoordinator {
    fn default() -> Self {
        Self {
            manifest: None,
            label: None,
            preview: Vec::new(),
            error: None,
            sequencer: RequestSequencer::new(RequestKind::Import),
        }
    }
}

impl DatasetImportCoordinator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn manifest(&self) -> Option<&ColumnManifest> {
        self.manifest.as_ref()
    }

    pub fn label(&self) -> Option<&str> {
        self.label.as_deref()
    }

    /// Client-side header guess for the upload in flight.
    pub fn preview(&self) -> &[String] {
        &self.preview
    }

    pub fn error(&self) -> Option<&AppError> {
        self.error.as_ref()
    }

    pub fn is_pending(&self) -> bool {
        self.sequencer.is_pending()
    }

    pub fn begin_single(&mut self, file: &DatasetFile) -> AppResult<RequestToken> {
        validate_csv_file(file).map_err(|e| self.fail(e.into()))?;
        self.preview = preview_headers(&file.bytes);
        self.error = None;
        info!("Uploading '{}' ({} bytes)", file.name, file.bytes.len());
        Ok(self.sequencer.issue())
    }

    pub fn begin_multiple(&mut self, files: &[DatasetFile]) -> AppResult<RequestToken> {
        if files.len() < MIN_MULTI_FILES {
            return Err(self.fail(
                ValidationError::InsufficientFiles {
                    required: MIN_MULTI_FILES,
                    supplied: files.len(),
                }
                .into(),
            ));
        }
        for file in files {
            validate_csv_file(file).map_err(|e| self.fail(e.into()))?;
        }
        self.preview.clear();
        self.error = None;
        info!("Uploading {} files", files.len());
        Ok(self.sequencer.issue())
    }

    pub fn begin_remote(
        &mut self,
        username: &str,
        key: &str,
        dataset_path: &str,
    ) -> AppResult<(RequestToken, RemoteImportRequest)> {
        let credentials = validate_credentials(username, key).map_err(|e| self.fail(e.into()))?;
        let (dataset_path, _) =
            validate_dataset_path(dataset_path).map_err(|e| self.fail(e.into()))?;
        self.preview.clear();
        self.error = None;
        info!("Importing Kaggle dataset '{}'", dataset_path);
        let request = RemoteImportRequest {
            kaggle_json: credentials,
            dataset_path,
        };
        Ok((self.sequencer.issue(), request))
    }

    pub fn finish_single(
        &mut self,
        token: RequestToken,
        file_name: &str,
        response: AppResult<UploadResponse>,
    ) -> AppResult<Completion<ImportedDataset>> {
        if !self.sequencer.settle(token) {
            return Ok(Completion::Discarded);
        }
        let reply = self.settle_reply(response, "Error uploading file")?;
        let dataset = ImportedDataset {
            session_id: reply.session_id,
            manifest: ColumnManifest::flat(reply.columns),
            label: file_name.to_string(),
            message: None,
        };
        Ok(Completion::Applied(self.accept(dataset)))
    }

    pub fn finish_multiple(
        &mut self,
        token: RequestToken,
        file_names: &[String],
        response: AppResult<MultiUploadResponse>,
    ) -> AppResult<Completion<ImportedDataset>> {
        if !self.sequencer.settle(token) {
            return Ok(Completion::Discarded);
        }
        let reply = self.settle_reply(response, "Error uploading files")?;
        let dataset = ImportedDataset {
            session_id: reply.session_id,
            manifest: ColumnManifest::per_file(reply.columns),
            label: file_names.join(", "),
            message: None,
        };
        Ok(Completion::Applied(self.accept(dataset)))
    }

    pub fn finish_remote(
        &mut self,
        token: RequestToken,
        request: &RemoteImportRequest,
        response: AppResult<RemoteImportResponse>,
    ) -> AppResult<Completion<ImportedDataset>> {
        if !self.sequencer.settle(token) {
            return Ok(Completion::Discarded);
        }
        let reply = self.settle_reply(response, "Failed to import dataset")?;
        let label = reply.filename.clone().unwrap_or_else(|| {
            validate_dataset_path(&request.dataset_path)
                .map(|(_, name)| name)
                .unwrap_or_else(|_| request.dataset_path.clone())
        });
        if reply.session_id.is_none() {
            warn!("Kaggle import returned no session id");
        }
        let dataset = ImportedDataset {
            session_id: reply.session_id,
            manifest: ColumnManifest::flat(reply.headers.unwrap_or_default()),
            label,
            message: reply.message,
        };
        Ok(Completion::Applied(self.accept(dataset)))
    }

    /// Forgets the current dataset and makes in-flight imports stale.
    pub fn clear(&mut self) {
        self.manifest = None;
        self.label = None;
        self.preview.clear();
        self.error = None;
        self.sequencer.invalidate();
    }

    fn settle_reply<R: crate::gateway::Reply>(
        &mut self,
        response: AppResult<R>,
        fallback: &str,
    ) -> AppResult<R> {
        self.preview.clear();
        response
            .and_then(|reply| ensure_success(reply, fallback))
            .map_err(|e| self.fail(e))
    }

    fn accept(&mut self, dataset: ImportedDataset) -> ImportedDataset {
        info!(
            "Imported '{}' with {} columns",
            dataset.label,
            dataset.manifest.len()
        );
        self.manifest = Some(dataset.manifest.clone());
        self.label = Some(dataset.label.clone());
        self.error = None;
        dataset
    }

    fn fail(&mut self, err: AppError) -> AppError {
        warn!("Import failed: {}", err);
        self.error = Some(err.clone());
        err
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    fn csv(name: &str, body: &str) -> DatasetFile {
        DatasetFile::new(name, "text/csv", body.as_bytes().to_vec())
    }

    fn upload_ok(columns: &[&str]) -> AppResult<UploadResponse> {
        Ok(UploadResponse {
            success: true,
            session_id: Some("s1".into()),
            columns: columns.iter().map(|c| c.to_string()).collect(),
            error: None,
        })
    }

    #[test]
    fn non_csv_single_upload_is_rejected_without_token() {
        let mut import = DatasetImportCoordinator::new();
        let err = import
            .begin_single(&DatasetFile::new("a.json", "application/json", vec![]))
            .unwrap_err();
        assert!(matches!(
            err,
            AppError::Validation(ValidationError::InvalidFileKind { .. })
        ));
        assert!(!import.is_pending());
        assert_eq!(import.error(), Some(&err));
    }

    #[test]
    fn single_upload_sets_preview_then_manifest() {
        let mut import = DatasetImportCoordinator::new();
        let token = import
            .begin_single(&csv("people.csv", "age,income,label\n30,1,0\n"))
            .unwrap();
        assert_eq!(import.preview(), &["age", "income", "label"]);
        assert!(import.is_pending());

        let dataset = import
            .finish_single(token, "people.csv", upload_ok(&["age", "income", "label"]))
            .unwrap()
            .applied()
            .unwrap();
        assert_eq!(dataset.session_id.as_deref(), Some("s1"));
        assert_eq!(
            dataset.manifest,
            ColumnManifest::Flat(vec!["age".into(), "income".into(), "label".into()])
        );
        assert!(import.preview().is_empty());
        assert_eq!(import.label(), Some("people.csv"));
        assert!(!import.is_pending());
    }

    #[test]
    fn stale_upload_reply_is_discarded() {
        let mut import = DatasetImportCoordinator::new();
        let first = import.begin_single(&csv("a.csv", "x\n")).unwrap();
        let second = import.begin_single(&csv("b.csv", "y\n")).unwrap();

        let applied = import
            .finish_single(second, "b.csv", upload_ok(&["y"]))
            .unwrap();
        assert!(!applied.is_discarded());
        let stale = import.finish_single(first, "a.csv", upload_ok(&["x"])).unwrap();
        assert!(stale.is_discarded());
        assert_eq!(import.label(), Some("b.csv"));
    }

    #[test]
    fn multiple_upload_requires_two_csv_files() {
        let mut import = DatasetImportCoordinator::new();
        assert_eq!(
            import.begin_multiple(&[csv("a.csv", "")]),
            Err(AppError::Validation(ValidationError::InsufficientFiles {
                required: 2,
                supplied: 1
            }))
        );
        assert!(import
            .begin_multiple(&[csv("a.csv", ""), DatasetFile::new("b.txt", "text/plain", vec![])])
            .is_err());

        let token = import
            .begin_multiple(&[csv("movies.csv", ""), csv("ratings.csv", "")])
            .unwrap();
        let mut columns = BTreeMap::new();
        columns.insert("movies.csv".to_string(), vec!["movieId".to_string()]);
        columns.insert("ratings.csv".to_string(), vec!["userId".to_string()]);
        let dataset = import
            .finish_multiple(
                token,
                &["movies.csv".to_string(), "ratings.csv".to_string()],
                Ok(MultiUploadResponse {
                    success: true,
                    session_id: Some("multi".into()),
                    columns,
                    error: None,
                }),
            )
            .unwrap()
            .applied()
            .unwrap();
        assert!(dataset.manifest.is_multi_file());
        assert_eq!(dataset.label, "movies.csv, ratings.csv");
    }

    #[test]
    fn remote_import_validates_and_falls_back_to_dataset_name() {
        let mut import = DatasetImportCoordinator::new();
        assert_eq!(
            import.begin_remote("", "key", "a/b").unwrap_err(),
            AppError::Validation(ValidationError::InvalidCredentials)
        );
        assert!(matches!(
            import.begin_remote("ada", "key", "movielens").unwrap_err(),
            AppError::Validation(ValidationError::InvalidDatasetPath(_))
        ));

        let (token, request) = import.begin_remote("ada", "key", "grouplens/movielens").unwrap();
        let dataset = import
            .finish_remote(
                token,
                &request,
                Ok(RemoteImportResponse {
                    success: true,
                    message: Some("Dataset imported successfully".into()),
                    headers: Some(vec!["column1".into(), "column2".into()]),
                    filename: None,
                    session_id: None,
                    error: None,
                }),
            )
            .unwrap()
            .applied()
            .unwrap();
        assert_eq!(dataset.label, "movielens");
        assert_eq!(dataset.manifest.len(), 2);
        assert_eq!(dataset.message.as_deref(), Some("Dataset imported successfully"));
    }

    #[test]
    fn backend_failure_is_recorded() {
        let mut import = DatasetImportCoordinator::new();
        let token = import.begin_single(&csv("a.csv", "x\n")).unwrap();
        let err = import
            .finish_single(
                token,
                "a.csv",
                Ok(UploadResponse {
                    success: false,
                    error: Some("Empty file".into()),
                    ..Default::default()
                }),
            )
            .unwrap_err();
        assert_eq!(err, AppError::backend("Empty file"));
        assert_eq!(import.error(), Some(&err));
        assert!(import.manifest().is_none());
    }

    #[test]
    fn clear_makes_in_flight_import_stale() {
        let mut import = DatasetImportCoordinator::new();
        let token = import.begin_single(&csv("a.csv", "x\n")).unwrap();
        import.clear();
        assert!(import
            .finish_single(token, "a.csv", upload_ok(&["x"]))
            .unwrap()
            .is_discarded());
        assert!(import.manifest().is_none());
    }
}
