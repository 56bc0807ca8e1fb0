//! Application state and the async flows that tie the coordinators together.
//!
//! The UI holds one [`Workbench`] behind an `Rc`. Every flow borrows the state
//! only between awaits: validate and stamp a token, release the borrow, call
//! the gateway, then borrow again to apply the reply.

use crate::compile::{ModelConfigurationCoordinator, TypeChange};
use crate::error::{AppError, AppResult, ValidationError};
use crate::gateway::{BackendGateway, DatasetFile, ExportArtifact};
use crate::import::{DatasetImportCoordinator, ImportedDataset};
use crate::manifest::ColumnRef;
use crate::model::{Algorithm, ModelConfiguration, SystemType};
use crate::recommend::RecommendationRequestCoordinator;
use crate::selection::{ColumnSelectionModel, SlotRole};
use crate::sequence::Completion;
use crate::session::SessionStore;
use crate::visuals::VisualizationPanel;
use log::{info, warn};
use std::cell::{Ref, RefCell};
use std::rc::Rc;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeKind {
    Info,
    Error,
}

/// Transient banner message. `id` lets a dismiss timer target one notice.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub id: u64,
    pub kind: NoticeKind,
    pub text: String,
}

pub struct AppState {
    pub session: SessionStore,
    pub import: DatasetImportCoordinator,
    pub selection: ColumnSelectionModel,
    pub model: ModelConfigurationCoordinator,
    pub recommendations: RecommendationRequestCoordinator,
    pub visuals: VisualizationPanel,
    pub notice: Option<Notice>,
    notice_seq: u64,
}

impl AppState {
    pub fn new(session: SessionStore) -> Self {
        Self {
            session,
            import: DatasetImportCoordinator::new(),
            selection: ColumnSelectionModel::new(),
            model: ModelConfigurationCoordinator::new(),
            recommendations: RecommendationRequestCoordinator::new(),
            visuals: VisualizationPanel::new(),
            notice: None,
            notice_seq: 0,
        }
    }

    fn notify(&mut self, kind: NoticeKind, text: impl Into<String>) {
        self.notice_seq += 1;
        self.notice = Some(Notice {
            id: self.notice_seq,
            kind,
            text: text.into(),
        });
    }

    fn preselect_if_collaborative(&mut self) {
        let collaborative = self
            .model
            .system_type()
            .is_some_and(SystemType::uses_role_slots);
        if let (true, Some(manifest)) = (collaborative, self.import.manifest()) {
            self.selection.preselect_roles(manifest);
        }
    }

    /// Fans a fresh dataset out to everything scoped to the previous one.
    /// Returns whether a session is now active.
    fn apply_import(&mut self, dataset: ImportedDataset) -> bool {
        let persisted = match &dataset.session_id {
            Some(id) => self.session.set(id.clone()),
            None => {
                self.session.clear();
                Ok(())
            }
        };
        self.selection.reset();
        self.model.invalidate();
        self.recommendations.reset();
        self.visuals.clear();
        self.preselect_if_collaborative();

        let text = dataset
            .message
            .unwrap_or_else(|| format!("Loaded {}", dataset.label));
        match persisted {
            Ok(()) => self.notify(NoticeKind::Info, text),
            Err(err) => self.notify(NoticeKind::Error, err.to_string()),
        }
        self.session.get().is_some()
    }

    /// Drops everything tied to the current dataset.
    fn discard_dataset(&mut self) {
        self.session.clear();
        self.import.clear();
        self.selection.reset();
        self.model.invalidate();
        self.recommendations.reset();
        self.visuals.clear();
    }
}

pub struct Workbench {
    state: RefCell<AppState>,
    gateway: Rc<dyn BackendGateway>,
    listener: RefCell<Option<Rc<dyn Fn()>>>,
}

impl Workbench {
    pub fn new(gateway: Rc<dyn BackendGateway>, session: SessionStore) -> Self {
        Self {
            state: RefCell::new(AppState::new(session)),
            gateway,
            listener: RefCell::new(None),
        }
    }

    /// Registers the callback run after every state change (the UI re-render).
    pub fn subscribe(&self, listener: impl Fn() + 'static) {
        *self.listener.borrow_mut() = Some(Rc::new(listener));
    }

    pub fn state(&self) -> Ref<'_, AppState> {
        self.state.borrow()
    }

    fn with_state<R>(&self, f: impl FnOnce(&mut AppState) -> R) -> R {
        let result = {
            let mut guard = self.state.borrow_mut();
            f(&mut guard)
        };
        let listener = self.listener.borrow().clone();
        if let Some(listener) = listener {
            listener();
        }
        result
    }

    /// Shows `err` in the notice banner and hands it back.
    pub fn report(&self, err: AppError) -> AppError {
        if !err.is_validation() {
            warn!("{}", err);
        }
        self.with_state(|s| s.notify(NoticeKind::Error, err.to_string()));
        err
    }

    pub fn dismiss_notice(&self, id: u64) {
        self.with_state(|s| {
            if s.notice.as_ref().is_some_and(|n| n.id == id) {
                s.notice = None;
            }
        });
    }

    // ── model type and column selection ───────────────────────────────────

    pub fn select_system_type(&self, system_type: SystemType) {
        self.with_state(|s| match s.model.select_system_type(system_type) {
            TypeChange::Unchanged => {}
            TypeChange::Selected => {
                s.selection.reset();
                s.recommendations.reset();
                s.preselect_if_collaborative();
            }
            TypeChange::Switched => {
                info!("Model type changed, clearing dataset");
                s.discard_dataset();
            }
        });
    }

    pub fn select_algorithm(&self, algorithm: Algorithm) -> AppResult<()> {
        self.with_state(|s| s.model.select_algorithm(algorithm))
            .map_err(|e| self.report(e.into()))
    }

    pub fn toggle_input(&self, column: ColumnRef) {
        self.with_state(|s| s.selection.toggle_input(column));
    }

    pub fn set_output(&self, column: ColumnRef) {
        self.with_state(|s| s.selection.set_output(column));
    }

    pub fn assign_role(&self, role: SlotRole, column: ColumnRef) {
        self.with_state(|s| s.selection.assign(role, column));
    }

    pub fn clear_role(&self, role: SlotRole) {
        self.with_state(|s| s.selection.clear_role(role));
    }

    pub fn set_query_field(&self, key: &str, value: String) {
        self.with_state(|s| s.recommendations.set_field(key, value));
    }

    pub fn set_recommendation_count(&self, count: usize) {
        self.with_state(|s| s.recommendations.set_count(count));
    }

    // ── dataset import ────────────────────────────────────────────────────

    pub async fn import_single(&self, file: DatasetFile) -> AppResult<()> {
        let token = self
            .with_state(|s| s.import.begin_single(&file))
            .map_err(|e| self.report(e))?;
        let response = self.gateway.upload_single(&file).await;
        let completion = self
            .with_state(|s| s.import.finish_single(token, &file.name, response))
            .map_err(|e| self.report(e))?;
        self.after_import(completion, true).await
    }

    pub async fn import_multiple(&self, files: Vec<DatasetFile>) -> AppResult<()> {
        let token = self
            .with_state(|s| s.import.begin_multiple(&files))
            .map_err(|e| self.report(e))?;
        let response = self.gateway.upload_multiple(&files).await;
        let names: Vec<String> = files.iter().map(|f| f.name.clone()).collect();
        let completion = self
            .with_state(|s| s.import.finish_multiple(token, &names, response))
            .map_err(|e| self.report(e))?;
        self.after_import(completion, false).await
    }

    pub async fn import_remote(&self, username: &str, key: &str, dataset_path: &str) -> AppResult<()> {
        let (token, request) = self
            .with_state(|s| s.import.begin_remote(username, key, dataset_path))
            .map_err(|e| self.report(e))?;
        let response = self.gateway.import_remote(&request).await;
        let completion = self
            .with_state(|s| s.import.finish_remote(token, &request, response))
            .map_err(|e| self.report(e))?;
        self.after_import(completion, true).await
    }

    async fn after_import(
        &self,
        completion: Completion<ImportedDataset>,
        fetch_visuals: bool,
    ) -> AppResult<()> {
        let Completion::Applied(dataset) = completion else {
            return Ok(());
        };
        let has_session = self.with_state(|s| s.apply_import(dataset));
        if fetch_visuals && has_session {
            self.load_visualizations().await?;
        }
        Ok(())
    }

    pub async fn load_visualizations(&self) -> AppResult<()> {
        let Some((token, request)) = self.with_state(|s| s.visuals.begin(s.session.get())) else {
            return Ok(());
        };
        let response = self.gateway.visualizations(&request).await;
        self.with_state(|s| s.visuals.finish(token, response))
            .map_err(|e| self.report(e))?;
        Ok(())
    }

    // ── compile and export ────────────────────────────────────────────────

    pub async fn compile(&self) -> AppResult<()> {
        let (token, request) = self
            .with_state(|s| s.model.begin_compile(&s.selection, s.session.get()))
            .map_err(|e| self.report(e))?;
        let response = self.gateway.compile(&request).await;
        let completion = self
            .with_state(|s| s.model.finish_compile(token, response))
            .map_err(|e| self.report(e))?;
        if let Completion::Applied(compiled) = completion {
            self.with_state(|s| {
                let persisted = s.session.set(compiled.session_id);
                s.recommendations.prepare_form(&compiled.configuration);
                match persisted {
                    Ok(()) => s.notify(NoticeKind::Info, "Model compiled successfully"),
                    Err(err) => s.notify(NoticeKind::Error, err.to_string()),
                }
            });
        }
        Ok(())
    }

    /// Returns the artifact to download, or `None` if a newer export superseded it.
    pub async fn export_model(&self) -> AppResult<Option<ExportArtifact>> {
        let (token, configuration) = self
            .with_state(|s| s.model.begin_export())
            .map_err(|e| self.report(e))?;
        let response = self.gateway.export_model(&configuration).await;
        let completion = self
            .with_state(|s| s.model.finish_export(token, response))
            .map_err(|e| self.report(e))?;
        Ok(completion.applied())
    }

    pub fn configuration_json(&self) -> AppResult<String> {
        let json = self.with_state(|s| {
            let configuration = s
                .model
                .configuration()
                .ok_or(ValidationError::ModelNotCompiled)?;
            configuration
                .to_json()
                .map_err(|e| ValidationError::InvalidConfiguration(e.to_string()))
        });
        json.map_err(|e| self.report(e.into()))
    }

    /// Re-applies a saved configuration to the loaded dataset. The dataset is
    /// kept even when the saved type differs from the current one.
    pub fn restore_configuration(&self, json: &str) -> AppResult<()> {
        let configuration =
            ModelConfiguration::from_json(json).map_err(|e| self.report(e.into()))?;
        self.with_state(|s| {
            s.model.restore(&configuration);
            s.recommendations.reset();
            match s.import.manifest() {
                Some(manifest) => s.selection.restore(&configuration, manifest),
                None => s.selection.reset(),
            }
            s.notify(
                NoticeKind::Info,
                "Configuration restored, compile the model to use it",
            );
        });
        Ok(())
    }

    // ── recommendations ───────────────────────────────────────────────────

    pub async fn query_direct(&self, input: &str) -> AppResult<()> {
        let (token, request) = self
            .with_state(|s| {
                s.recommendations
                    .begin_direct(s.model.configuration(), s.session.get(), input)
            })
            .map_err(|e| self.report(e))?;
        let response = self.gateway.recommend(&request).await;
        self.with_state(|s| s.recommendations.finish(token, response))
            .map_err(|e| self.report(e))?;
        Ok(())
    }

    pub async fn query_advanced(&self) -> AppResult<()> {
        let (token, request) = self
            .with_state(|s| {
                let values = s.recommendations.field_values();
                s.recommendations
                    .begin_advanced(s.model.configuration(), s.session.get(), &values)
            })
            .map_err(|e| self.report(e))?;
        let response = self.gateway.recommend(&request).await;
        self.with_state(|s| s.recommendations.finish(token, response))
            .map_err(|e| self.report(e))?;
        Ok(())
    }
}
