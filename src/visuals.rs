//! Dataset visualization panel state.

use crate::error::{AppError, AppResult};
use crate::gateway::{ensure_success, VisualizationRequest, VisualizationResponse, Visualizations};
use crate::sequence::{Completion, RequestKind, RequestSequencer, RequestToken};
use log::{info, warn};

#[derive(Debug)]
pub struct VisualizationPanel {
    images: Option<Visualizations>,
    error: Option<AppError>,
    sequencer: RequestSequencer,
}

impl Default for VisualizationPanel {
    fn default() -> Self {
        Self {
            images: None,
            error: None,
            sequencer: RequestSequencer::new(RequestKind::Visualizations),
        }
    }
}

impl VisualizationPanel {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn images(&self) -> Option<&Visualizations> {
        self.images.as_ref()
    }

    pub fn error(&self) -> Option<&AppError> {
        self.error.as_ref()
    }

    pub fn is_pending(&self) -> bool {
        self.sequencer.is_pending()
    }

    /// Returns `None` without a session; there is nothing to plot.
    pub fn begin(&mut self, session_id: Option<&str>) -> Option<(RequestToken, VisualizationRequest)> {
        let session_id = session_id?;
        info!("Loading visualizations for session {}", session_id);
        self.error = None;
        let request = VisualizationRequest {
            session_id: session_id.to_string(),
        };
        Some((self.sequencer.issue(), request))
    }

    pub fn finish(
        &mut self,
        token: RequestToken,
        response: AppResult<VisualizationResponse>,
    ) -> AppResult<Completion<()>> {
        if !self.sequencer.settle(token) {
            return Ok(Completion::Discarded);
        }
        match response.and_then(|r| ensure_success(r, "Error loading visualizations")) {
            Ok(reply) => {
                self.images = reply.visualizations;
                Ok(Completion::Applied(()))
            }
            Err(err) => {
                warn!("Visualizations failed: {}", err);
                self.images = None;
                self.error = Some(err.clone());
                Err(err)
            }
        }
    }

    pub fn clear(&mut self) {
        self.images = None;
        self.error = None;
        self.sequencer.invalidate();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn reply() -> VisualizationResponse {
        VisualizationResponse {
            success: true,
            visualizations: Some(Visualizations {
                distribution: "AAA".into(),
                ..Visualizations::default()
            }),
            error: None,
        }
    }

    #[test]
    fn no_session_means_no_request() {
        let mut panel = VisualizationPanel::new();
        assert!(panel.begin(None).is_none());
        assert!(!panel.is_pending());
    }

    #[test]
    fn images_arrive_for_latest_request() {
        let mut panel = VisualizationPanel::new();
        let (token, request) = panel.begin(Some("s1")).unwrap();
        assert_eq!(request.session_id, "s1");
        panel.finish(token, Ok(reply())).unwrap();
        assert_eq!(panel.images().map(|v| v.distribution.as_str()), Some("AAA"));
    }

    #[test]
    fn cleared_panel_ignores_late_images() {
        let mut panel = VisualizationPanel::new();
        let (token, _) = panel.begin(Some("s1")).unwrap();
        panel.clear();
        assert!(panel.finish(token, Ok(reply())).unwrap().is_discarded());
        assert!(panel.images().is_none());
    }
}
