use async_trait::async_trait;
use reporting_core::AppResult;
use reporting_domain::{ReportDefinition, ReportDefinitionId};

/// Backend answer to a full-document update.
#[derive(Debug, Clone, PartialEq)]
pub enum SaveOutcome {
    /// Backend returned the stored document, including any normalization.
    Echoed(ReportDefinition),
    /// Backend accepted the document without returning it.
    Acknowledged,
}

/// Port for the reporting backend's report definition routes.
#[async_trait]
pub trait ReportDefinitionClient: Send + Sync {
    /// Fetches one definition by id.
    async fn get_report_definition(&self, id: &ReportDefinitionId)
    -> AppResult<ReportDefinition>;

    /// Replaces one definition with the full given document.
    async fn update_report_definition(
        &self,
        id: &ReportDefinitionId,
        definition: &ReportDefinition,
    ) -> AppResult<SaveOutcome>;

    /// Deletes one definition.
    async fn delete_report_definition(&self, id: &ReportDefinitionId) -> AppResult<()>;
}
