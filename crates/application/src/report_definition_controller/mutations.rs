use super::*;

impl ReportDefinitionController {
    /// Replaces one definition on the backend and installs the accepted document.
    ///
    /// The display projection is derived from the backend's echoed document,
    /// or from a fresh fetch when the backend only acknowledges. A rejected
    /// write leaves the installed pair untouched. When the write was
    /// acknowledged but the re-fetch fails, the installed pair is cleared
    /// because the backend already holds a newer document.
    pub async fn save(
        &self,
        id: &ReportDefinitionId,
        definition: ReportDefinition,
    ) -> AppResult<LoadedReportDefinition> {
        self.ensure_not_deleted(id).await?;
        let sequence = self.next_sequence();

        let accepted = match self.client.update_report_definition(id, &definition).await {
            Ok(SaveOutcome::Echoed(accepted)) => accepted,
            Ok(SaveOutcome::Acknowledged) => self.refetch_saved(sequence, id).await?,
            Err(error) => {
                warn!(
                    report_definition_id = %id,
                    category = error.category(),
                    error = %error,
                    "failed to save report definition"
                );
                return Err(error);
            }
        };

        let loaded = self.project(id, accepted);
        if self.install(sequence, Some(loaded.clone())).await? {
            info!(
                report_definition_id = %id,
                status = loaded.definition.status().as_str(),
                enabled = loaded.definition.is_enabled(),
                "report definition saved"
            );
        }

        Ok(loaded)
    }

    /// Enables or disables the schedule of the installed definition and saves it.
    pub async fn change_status(&self, action: StatusAction) -> AppResult<LoadedReportDefinition> {
        let current = self.require_current().await?;
        self.ensure_not_deleted(&current.id).await?;

        let updated = current.definition.with_status(action).inspect_err(|error| {
            warn!(
                report_definition_id = %current.id,
                action = action.as_str(),
                error = %error,
                "rejected report definition status change"
            );
        })?;

        self.save(&current.id, updated).await
    }

    /// Deletes one definition and sends the shell back to the list.
    pub async fn delete(&self, id: &ReportDefinitionId) -> AppResult<ReportDefinitionEvent> {
        self.ensure_not_deleted(id).await?;

        if let Err(error) = self.client.delete_report_definition(id).await {
            warn!(
                report_definition_id = %id,
                category = error.category(),
                error = %error,
                "failed to delete report definition"
            );
            return Err(error);
        }

        {
            let mut state = self.state.lock().await;
            state.deleted_ids.insert(id.clone());
            if state
                .current
                .as_ref()
                .is_some_and(|current| &current.id == id)
            {
                state.current = None;
            }
        }

        info!(report_definition_id = %id, "report definition deleted");
        let event = ReportDefinitionEvent::Deleted(id.clone());
        self.navigate(&event.route());
        Ok(event)
    }

    async fn refetch_saved(
        &self,
        sequence: u64,
        id: &ReportDefinitionId,
    ) -> AppResult<ReportDefinition> {
        debug!(
            report_definition_id = %id,
            "backend acknowledged update without a document, re-fetching"
        );

        match self.client.get_report_definition(id).await {
            Ok(accepted) => Ok(accepted),
            Err(error) => {
                warn!(
                    report_definition_id = %id,
                    category = error.category(),
                    error = %error,
                    "report definition saved but re-fetch failed"
                );
                self.install(sequence, None).await?;
                Err(error)
            }
        }
    }
}
