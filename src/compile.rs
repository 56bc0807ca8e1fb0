//! Model type, algorithm and compile-state tracking.

use crate::error::{AppError, AppResult, ValidationError};
use crate::gateway::{ensure_success, CompileRequest, CompileResponse, ExportArtifact};
use crate::model::{Algorithm, ModelConfiguration, SystemType};
use crate::selection::ColumnSelectionModel;
use crate::sequence::{Completion, RequestKind, RequestSequencer, RequestToken};
use log::{info, warn};

#[derive(Debug, Clone, PartialEq)]
pub enum CompileState {
    Unconfigured,
    Compiling,
    Compiled(ModelConfiguration),
    /// The last compile failed; a new one may be issued right away.
    Failed(AppError),
}

/// What `select_system_type` changed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TypeChange {
    Unchanged,
    /// First selection since startup.
    Selected,
    /// Moved from one type to another; dataset-scoped state must go.
    Switched,
}

/// A compile the backend accepted.
#[derive(Debug, Clone, PartialEq)]
pub struct CompiledModel {
    pub configuration: ModelConfiguration,
    pub session_id: String,
}

#[derive(Debug)]
pub struct ModelConfigurationCoordinator {
    system_type: Option<SystemType>,
    algorithm: Option<Algorithm>,
    state: CompileState,
    in_flight: Option<(ModelConfiguration, Option<String>)>,
    compile_seq: RequestSequencer,
    export_seq: RequestSequencer,
}

impl Default for ModelConfigurationCoordinator {
    fn default() -> Self {
        Self {
            system_type: None,
            algorithm: None,
            state: CompileState::Unconfigured,
            in_flight: None,
            compile_seq: RequestSequencer::new(RequestKind::Compile),
            export_seq: RequestSequencer::new(RequestKind::Export),
        }
    }
}

impl ModelConfigurationCoordinator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn system_type(&self) -> Option<SystemType> {
        self.system_type
    }

    pub fn algorithm(&self) -> Option<Algorithm> {
        self.algorithm
    }

    /// Algorithms offered for the current system type.
    pub fn algorithm_options(&self) -> &'static [Algorithm] {
        self.system_type.map(SystemType::algorithms).unwrap_or(&[])
    }

    pub fn state(&self) -> &CompileState {
        &self.state
    }

    pub fn configuration(&self) -> Option<&ModelConfiguration> {
        match &self.state {
            CompileState::Compiled(config) => Some(config),
            _ => None,
        }
    }

    pub fn is_compiled(&self) -> bool {
        self.configuration().is_some()
    }

    pub fn is_exporting(&self) -> bool {
        self.export_seq.is_pending()
    }

    pub fn select_system_type(&mut self, system_type: SystemType) -> TypeChange {
        let change = match self.system_type {
            Some(current) if current == system_type => return TypeChange::Unchanged,
            Some(_) => TypeChange::Switched,
            None => TypeChange::Selected,
        };
        info!("System type set to {}", system_type);
        self.system_type = Some(system_type);
        if !self.algorithm.is_some_and(|a| system_type.supports(a)) {
            self.algorithm = Some(system_type.default_algorithm());
        }
        self.invalidate();
        change
    }

    pub fn select_algorithm(&mut self, algorithm: Algorithm) -> Result<(), ValidationError> {
        match self.system_type {
            Some(system_type) if system_type.supports(algorithm) => {
                self.algorithm = Some(algorithm);
                Ok(())
            }
            Some(system_type) => Err(ValidationError::InvalidConfiguration(format!(
                "{} is not available for {} systems",
                algorithm, system_type
            ))),
            None => Err(ValidationError::IncompleteSelection(
                "please choose a recommender system type first".to_string(),
            )),
        }
    }

    /// Validates the selection and moves to `Compiling`. On a validation error
    /// the state is left untouched and nothing should be sent.
    pub fn begin_compile(
        &mut self,
        selection: &ColumnSelectionModel,
        session_id: Option<&str>,
    ) -> AppResult<(RequestToken, CompileRequest)> {
        let system_type = self.system_type.ok_or_else(|| {
            ValidationError::IncompleteSelection(
                "please choose a recommender system type".to_string(),
            )
        })?;
        let algorithm = self
            .algorithm
            .filter(|a| system_type.supports(*a))
            .ok_or_else(|| {
                ValidationError::IncompleteSelection("please choose an algorithm".to_string())
            })?;
        let (inputs, output) = selection.resolve(system_type)?;

        let configuration = ModelConfiguration {
            system_type,
            algorithm,
            inputs,
            output,
        };
        let request = CompileRequest {
            session_id: session_id.map(str::to_string),
            system_type,
            algorithm,
            columns: configuration
                .inputs
                .iter()
                .chain(std::iter::once(&configuration.output))
                .map(|c| c.name.clone())
                .collect(),
            inputs: configuration.inputs.clone(),
            output: configuration.output.clone(),
        };
        info!(
            "Compiling {} model ({}) on {} input column(s)",
            system_type,
            algorithm,
            configuration.inputs.len()
        );
        self.in_flight = Some((configuration, request.session_id.clone()));
        self.state = CompileState::Compiling;
        Ok((self.compile_seq.issue(), request))
    }

    pub fn finish_compile(
        &mut self,
        token: RequestToken,
        response: AppResult<CompileResponse>,
    ) -> AppResult<Completion<CompiledModel>> {
        if !self.compile_seq.settle(token) {
            return Ok(Completion::Discarded);
        }
        let Some((configuration, sent_session)) = self.in_flight.take() else {
            return Ok(Completion::Discarded);
        };

        let outcome = response
            .and_then(|reply| ensure_success(reply, "Error compiling model"))
            .and_then(|reply| {
                reply.session_id.or(sent_session).ok_or_else(|| {
                    AppError::backend("Compile response carried no session id")
                })
            });

        match outcome {
            Ok(session_id) => {
                info!("Model compiled for session {}", session_id);
                self.state = CompileState::Compiled(configuration.clone());
                Ok(Completion::Applied(CompiledModel {
                    configuration,
                    session_id,
                }))
            }
            Err(err) => {
                warn!("Compile failed: {}", err);
                self.state = CompileState::Failed(err.clone());
                Err(err)
            }
        }
    }

    /// Drops the compiled model (new dataset or model type change).
    pub fn invalidate(&mut self) {
        self.state = CompileState::Unconfigured;
        self.in_flight = None;
        self.compile_seq.invalidate();
        self.export_seq.invalidate();
    }

    /// Re-selects type and algorithm from a saved configuration. The model
    /// still has to be compiled again.
    pub fn restore(&mut self, configuration: &ModelConfiguration) -> TypeChange {
        let change = self.select_system_type(configuration.system_type);
        self.algorithm = Some(configuration.algorithm);
        self.invalidate();
        change
    }

    pub fn begin_export(&mut self) -> AppResult<(RequestToken, ModelConfiguration)> {
        let configuration = self
            .configuration()
            .cloned()
            .ok_or(ValidationError::ModelNotCompiled)?;
        Ok((self.export_seq.issue(), configuration))
    }

    pub fn finish_export(
        &mut self,
        token: RequestToken,
        response: AppResult<ExportArtifact>,
    ) -> AppResult<Completion<ExportArtifact>> {
        if !self.export_seq.settle(token) {
            return Ok(Completion::Discarded);
        }
        let artifact = response?;
        info!(
            "Exported model as '{}' ({} bytes)",
            artifact.file_name,
            artifact.bytes.len()
        );
        Ok(Completion::Applied(artifact))
    }
}
