//! Recommendation queries against a compiled model and their display form.

use crate::config::{DEFAULT_RECOMMENDATIONS, MAX_RECOMMENDATIONS, MIN_RECOMMENDATIONS};
use crate::error::{AppError, AppResult, ValidationError};
use crate::gateway::{
    ensure_success, RecommendationEntry, RecommendationQuery, RecommendationRequest,
    RecommendationResponse,
};
use crate::manifest::ColumnRef;
use crate::model::ModelConfiguration;
use crate::sequence::{Completion, RequestKind, RequestSequencer, RequestToken};
use log::{debug, info};
use std::collections::BTreeMap;

#[derive(Debug, Clone, PartialEq)]
pub struct RecommendationItem {
    /// 1-based position in the backend's ordering.
    pub rank: usize,
    pub output_value: String,
    pub score: Option<f64>,
    pub details: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum RecommendationView {
    Idle,
    Ranked(Vec<RecommendationItem>),
    /// The backend answered but had nothing to recommend.
    Empty,
}

/// One input of the advanced query form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryField {
    pub column: ColumnRef,
    pub value: String,
}

#[derive(Debug)]
pub struct RecommendationRequestCoordinator {
    form: Vec<QueryField>,
    count: usize,
    view: RecommendationView,
    error: Option<AppError>,
    sequencer: RequestSequencer,
}

impl Default for RecommendationRequestCoordinator {
    fn default() -> Self {
        Self {
            form: Vec::new(),
            count: DEFAULT_RECOMMENDATIONS,
            view: RecommendationView::Idle,
            error: None,
            sequencer: RequestSequencer::new(RequestKind::Recommend),
        }
    }
}

impl RecommendationRequestCoordinator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn form(&self) -> &[QueryField] {
        &self.form
    }

    pub fn view(&self) -> &RecommendationView {
        &self.view
    }

    pub fn error(&self) -> Option<&AppError> {
        self.error.as_ref()
    }

    pub fn count(&self) -> usize {
        self.count
    }

    pub fn is_pending(&self) -> bool {
        self.sequencer.is_pending()
    }

    pub fn set_count(&mut self, count: usize) {
        self.count = count.clamp(MIN_RECOMMENDATIONS, MAX_RECOMMENDATIONS);
    }

    /// Rebuilds the advanced query form from a freshly compiled model. Queries
    /// still in flight against the previous model become stale.
    pub fn prepare_form(&mut self, configuration: &ModelConfiguration) {
        self.form = configuration
            .query_columns()
            .into_iter()
            .map(|column| QueryField {
                column,
                value: String::new(),
            })
            .collect();
        self.view = RecommendationView::Idle;
        self.error = None;
        self.sequencer.invalidate();
        debug!("Prepared query form with {} field(s)", self.form.len());
    }

    pub fn set_field(&mut self, key: &str, value: impl Into<String>) {
        if let Some(field) = self.form.iter_mut().find(|f| f.column.key() == key) {
            field.value = value.into();
        }
    }

    /// Current form values keyed by column key.
    pub fn field_values(&self) -> BTreeMap<String, String> {
        self.form
            .iter()
            .map(|f| (f.column.key(), f.value.clone()))
            .collect()
    }

    pub fn reset(&mut self) {
        self.form.clear();
        self.view = RecommendationView::Idle;
        self.error = None;
        self.sequencer.invalidate();
    }

    pub fn begin_direct(
        &mut self,
        configuration: Option<&ModelConfiguration>,
        session_id: Option<&str>,
        input: &str,
    ) -> AppResult<(RequestToken, RecommendationRequest)> {
        let session_id = self.require_model(configuration, session_id)?;
        let input = input.trim();
        if input.is_empty() {
            return Err(self.fail(ValidationError::EmptyQuery.into()));
        }
        info!("Requesting {} recommendations for '{}'", self.count, input);
        Ok(self.issue(session_id, RecommendationQuery::InputValue(input.to_string())))
    }

    pub fn begin_advanced(
        &mut self,
        configuration: Option<&ModelConfiguration>,
        session_id: Option<&str>,
        values: &BTreeMap<String, String>,
    ) -> AppResult<(RequestToken, RecommendationRequest)> {
        let session_id = self.require_model(configuration, session_id)?;
        let columns = configuration
            .map(ModelConfiguration::query_columns)
            .unwrap_or_default();

        let mut inputs = BTreeMap::new();
        for column in columns {
            let key = column.key();
            let value = values.get(&key).map(|v| v.trim()).unwrap_or_default();
            if value.is_empty() {
                return Err(self.fail(ValidationError::MissingQueryValue(column.name).into()));
            }
            inputs.insert(key, value.to_string());
        }
        info!(
            "Requesting {} recommendations from {} field(s)",
            self.count,
            inputs.len()
        );
        Ok(self.issue(session_id, RecommendationQuery::Inputs(inputs)))
    }

    pub fn finish(
        &mut self,
        token: RequestToken,
        response: AppResult<RecommendationResponse>,
    ) -> AppResult<Completion<RecommendationView>> {
        if !self.sequencer.settle(token) {
            return Ok(Completion::Discarded);
        }
        match response.and_then(|r| ensure_success(r, "Error getting recommendations")) {
            Ok(reply) => {
                self.view = normalize(reply.recommendations);
                self.error = None;
                Ok(Completion::Applied(self.view.clone()))
            }
            Err(err) => Err(self.fail(err)),
        }
    }

    fn require_model(
        &mut self,
        configuration: Option<&ModelConfiguration>,
        session_id: Option<&str>,
    ) -> AppResult<String> {
        match (configuration, session_id) {
            (Some(_), Some(session_id)) => Ok(session_id.to_string()),
            _ => Err(self.fail(ValidationError::ModelNotCompiled.into())),
        }
    }

    fn issue(
        &mut self,
        session_id: String,
        query: RecommendationQuery,
    ) -> (RequestToken, RecommendationRequest) {
        self.error = None;
        let request = RecommendationRequest {
            session_id,
            query,
            n_recommendations: self.count,
        };
        (self.sequencer.issue(), request)
    }

    fn fail(&mut self, err: AppError) -> AppError {
        self.error = Some(err.clone());
        err
    }
}

/// Assigns ranks from array position and flattens non-string values.
pub fn normalize(entries: Vec<RecommendationEntry>) -> RecommendationView {
    if entries.is_empty() {
        return RecommendationView::Empty;
    }
    let items = entries
        .into_iter()
        .enumerate()
        .map(|(idx, entry)| RecommendationItem {
            rank: idx + 1,
            output_value: match entry.output_value {
                serde_json::Value::String(s) => s,
                other => other.to_string(),
            },
            score: entry.score,
            details: entry.details,
        })
        .collect();
    RecommendationView::Ranked(items)
}
