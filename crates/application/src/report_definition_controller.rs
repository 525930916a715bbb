use std::collections::HashSet;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use chrono::{FixedOffset, Offset, Utc};
use reporting_core::{AppError, AppResult};
use reporting_domain::{
    OnDemandReportRequest, ReportDefinition, ReportDefinitionDetails, ReportDefinitionId,
    StatusAction,
};
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use crate::report_definition_ports::{
    GeneratedReport, NavigationRoute, Navigator, ReportDefinitionClient, ReportDefinitionEvent,
    ReportGenerator, SaveOutcome,
};

mod actions;
mod load;
mod mutations;

/// Raw definition and its display projection, installed together.
#[derive(Debug, Clone, PartialEq)]
pub struct LoadedReportDefinition {
    /// Backend identifier.
    pub id: ReportDefinitionId,
    /// Raw definition as last accepted by the backend.
    pub definition: ReportDefinition,
    /// Display projection of `definition`.
    pub details: ReportDefinitionDetails,
}

#[derive(Debug, Default)]
struct ControllerState {
    current: Option<LoadedReportDefinition>,
    installed_sequence: u64,
    // Only grows; a controller lives as long as one details screen or CLI call.
    deleted_ids: HashSet<ReportDefinitionId>,
}

/// Controller behind the report definition details screen.
///
/// Holds at most one loaded definition. Loads and saves are tagged with a
/// monotonic sequence number; a completion older than the last installed
/// one is returned to its caller but never installed.
pub struct ReportDefinitionController {
    client: Arc<dyn ReportDefinitionClient>,
    generator: Arc<dyn ReportGenerator>,
    navigator: Option<Arc<dyn Navigator>>,
    display_offset: FixedOffset,
    sequence: AtomicU64,
    state: Mutex<ControllerState>,
}

impl ReportDefinitionController {
    /// Creates a controller over the backend and report generator ports.
    #[must_use]
    pub fn new(
        client: Arc<dyn ReportDefinitionClient>,
        generator: Arc<dyn ReportGenerator>,
    ) -> Self {
        Self {
            client,
            generator,
            navigator: None,
            display_offset: Utc.fix(),
            sequence: AtomicU64::new(0),
            state: Mutex::new(ControllerState::default()),
        }
    }

    /// Adds a navigator that follows delete and edit events.
    #[must_use]
    pub fn with_navigator(mut self, navigator: Arc<dyn Navigator>) -> Self {
        self.navigator = Some(navigator);
        self
    }

    /// Renders display timestamps at the given UTC offset.
    #[must_use]
    pub fn with_display_offset(mut self, display_offset: FixedOffset) -> Self {
        self.display_offset = display_offset;
        self
    }

    /// Returns the currently installed definition, if any.
    pub async fn current(&self) -> Option<LoadedReportDefinition> {
        self.state.lock().await.current.clone()
    }

    fn next_sequence(&self) -> u64 {
        self.sequence.fetch_add(1, Ordering::SeqCst) + 1
    }

    fn project(
        &self,
        id: &ReportDefinitionId,
        definition: ReportDefinition,
    ) -> LoadedReportDefinition {
        let details =
            ReportDefinitionDetails::project_with_offset(&definition, self.display_offset);
        LoadedReportDefinition {
            id: id.clone(),
            definition,
            details,
        }
    }

    /// Replaces the installed pair unless a newer operation already did.
    ///
    /// A definition whose id was deleted meanwhile is never installed and
    /// yields `NotFound`.
    async fn install(
        &self,
        sequence: u64,
        loaded: Option<LoadedReportDefinition>,
    ) -> AppResult<bool> {
        let mut state = self.state.lock().await;
        if let Some(loaded) = &loaded
            && state.deleted_ids.contains(&loaded.id)
        {
            debug!(
                report_definition_id = %loaded.id,
                sequence,
                "discarding completion for deleted report definition"
            );
            return Err(deleted_error(&loaded.id));
        }

        if sequence <= state.installed_sequence {
            debug!(
                sequence,
                installed_sequence = state.installed_sequence,
                "discarding out-of-order report definition completion"
            );
            return Ok(false);
        }

        state.installed_sequence = sequence;
        state.current = loaded;
        Ok(true)
    }

    async fn require_current(&self) -> AppResult<LoadedReportDefinition> {
        self.current()
            .await
            .ok_or_else(|| AppError::NotFound("no report definition is loaded".to_owned()))
    }

    async fn ensure_not_deleted(&self, id: &ReportDefinitionId) -> AppResult<()> {
        if self.state.lock().await.deleted_ids.contains(id) {
            return Err(deleted_error(id));
        }

        Ok(())
    }

    fn navigate(&self, route: &NavigationRoute) {
        if let Some(navigator) = &self.navigator {
            navigator.go_to(route);
        }
    }
}

fn deleted_error(id: &ReportDefinitionId) -> AppError {
    AppError::NotFound(format!("report definition '{id}' was deleted"))
}
