use super::*;

impl ReportDefinitionController {
    /// Fetches one definition and installs it with its display projection.
    ///
    /// On failure the previously installed pair is cleared so the caller
    /// shows an error state instead of stale details. A fetch that completes
    /// after the same id was deleted fails with `NotFound`.
    pub async fn load(&self, id: &ReportDefinitionId) -> AppResult<LoadedReportDefinition> {
        let sequence = self.next_sequence();

        let definition = match self.client.get_report_definition(id).await {
            Ok(definition) => definition,
            Err(error) => {
                warn!(
                    report_definition_id = %id,
                    category = error.category(),
                    error = %error,
                    "failed to load report definition"
                );
                self.install(sequence, None).await?;
                return Err(error);
            }
        };

        let loaded = self.project(id, definition);
        if self.install(sequence, Some(loaded.clone())).await? {
            info!(
                report_definition_id = %id,
                report_name = %loaded.definition.report_name(),
                status = loaded.definition.status().as_str(),
                "report definition loaded"
            );
        }

        Ok(loaded)
    }
}
