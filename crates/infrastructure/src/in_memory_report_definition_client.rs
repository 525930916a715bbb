use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{TimeDelta, Utc};
use reporting_application::{ReportDefinitionClient, SaveOutcome};
use reporting_core::{AppError, AppResult};
use reporting_domain::{ReportDefinition, ReportDefinitionId};
use tokio::sync::RwLock;

/// In-memory reporting backend used by tests and local tooling.
///
/// Updates are accepted only when the submitted `last_updated` matches the
/// stored document, and the accepted document is echoed back with a fresh
/// modification time.
#[derive(Default)]
pub struct InMemoryReportDefinitionClient {
    definitions: RwLock<HashMap<ReportDefinitionId, ReportDefinition>>,
}

impl InMemoryReportDefinitionClient {
    /// Creates an empty in-memory backend.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores a definition, replacing any existing document with the same id.
    pub async fn insert(&self, id: ReportDefinitionId, definition: ReportDefinition) {
        self.definitions.write().await.insert(id, definition);
    }
}

#[async_trait]
impl ReportDefinitionClient for InMemoryReportDefinitionClient {
    async fn get_report_definition(
        &self,
        id: &ReportDefinitionId,
    ) -> AppResult<ReportDefinition> {
        self.definitions
            .read()
            .await
            .get(id)
            .cloned()
            .ok_or_else(|| not_found(id))
    }

    async fn update_report_definition(
        &self,
        id: &ReportDefinitionId,
        definition: &ReportDefinition,
    ) -> AppResult<SaveOutcome> {
        let mut definitions = self.definitions.write().await;
        let stored = definitions.get(id).ok_or_else(|| not_found(id))?;

        if stored.last_updated() != definition.last_updated() {
            return Err(AppError::Conflict(format!(
                "report definition '{id}' was modified at {} and cannot be replaced by a copy from {}",
                stored.last_updated().timestamp_millis(),
                definition.last_updated().timestamp_millis()
            )));
        }

        // Stamps stay strictly increasing even when two updates land in the same millisecond.
        let floor = stored.last_updated() + TimeDelta::milliseconds(1);
        let accepted = definition.with_last_updated(Utc::now().max(floor));
        definitions.insert(id.clone(), accepted.clone());

        Ok(SaveOutcome::Echoed(accepted))
    }

    async fn delete_report_definition(&self, id: &ReportDefinitionId) -> AppResult<()> {
        self.definitions
            .write()
            .await
            .remove(id)
            .map(|_| ())
            .ok_or_else(|| not_found(id))
    }
}

fn not_found(id: &ReportDefinitionId) -> AppError {
    AppError::NotFound(format!("report definition '{id}' does not exist"))
}
