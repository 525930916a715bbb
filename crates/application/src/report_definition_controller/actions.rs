use super::*;

impl ReportDefinitionController {
    /// Renders a report of the installed definition for its lookback window ending now.
    pub async fn generate_report(&self) -> AppResult<GeneratedReport> {
        let current = self.require_current().await?;
        let request = OnDemandReportRequest::build(&current.definition, Utc::now())?;

        info!(
            report_definition_id = %current.id,
            time_from = request.time_from,
            time_to = request.time_to,
            "generating on-demand report"
        );

        self.generator
            .generate_report(request)
            .await
            .inspect_err(|error| {
                warn!(
                    report_definition_id = %current.id,
                    category = error.category(),
                    error = %error,
                    "failed to generate on-demand report"
                );
            })
    }

    /// Sends the shell to the edit view of one definition.
    pub async fn request_edit(&self, id: &ReportDefinitionId) -> AppResult<ReportDefinitionEvent> {
        self.ensure_not_deleted(id).await?;

        let event = ReportDefinitionEvent::EditRequested(id.clone());
        self.navigate(&event.route());
        Ok(event)
    }
}
