use chrono::{DateTime, FixedOffset, Offset, Utc};
use serde::Serialize;

use crate::{ReportDefinition, ReportDefinitionStatus, StatusAction, TriggerType};

/// Marker shown for fields that do not apply, as opposed to fields left unset.
pub const EMPTY_FIELD: &str = "\u{2014}";

const DISPLAY_DATE_FORMAT: &str = "%a %b %d %Y %-I:%M:%S %p";
const BREADCRUMB_ROOT: &str = "Reporting";

/// Primary action offered next to Delete and Edit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ReportDefinitionAction {
    /// Render a report for the lookback window right now.
    #[serde(rename = "Generate report")]
    GenerateReport,
    /// Resume a paused schedule.
    Enable,
    /// Pause a running schedule.
    Disable,
}

impl ReportDefinitionAction {
    /// Returns the button label.
    #[must_use]
    pub fn label(&self) -> &'static str {
        match self {
            Self::GenerateReport => "Generate report",
            Self::Enable => "Enable",
            Self::Disable => "Disable",
        }
    }

    /// Returns the status change this action performs, if any.
    #[must_use]
    pub fn status_action(&self) -> Option<StatusAction> {
        match self {
            Self::GenerateReport => None,
            Self::Enable => Some(StatusAction::Enable),
            Self::Disable => Some(StatusAction::Disable),
        }
    }
}

/// Read-only display projection of a report definition.
///
/// Always rebuilt from a whole [`ReportDefinition`]; never patched field by field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportDefinitionDetails {
    /// Report name.
    pub name: String,
    /// Report description.
    pub description: String,
    /// Creation time in display form.
    pub created: String,
    /// Last modification time in display form.
    pub last_updated: String,
    /// Report source kind.
    pub source: String,
    /// Source URL.
    pub base_url: String,
    /// Humanized lookback window; approximate.
    pub time_period: String,
    /// Lookback label, e.g. `Last 7 days`.
    pub time_period_label: String,
    /// Raw file format value.
    pub file_format: String,
    /// Upper-case file format label.
    pub file_format_label: String,
    /// Not provided by the backend yet.
    pub report_header: String,
    /// Not provided by the backend yet.
    pub report_footer: String,
    /// Trigger kind.
    pub trigger_type: String,
    /// Schedule type, or the empty marker without schedule.
    pub schedule_details: String,
    /// Not provided by the backend yet.
    pub alert_details: String,
    /// Delivery type.
    pub channel: String,
    /// Lifecycle status.
    pub status: String,
    /// In-app recipients, channel delivery only.
    pub kibana_recipients: String,
    /// Email recipients, channel delivery only.
    pub email_recipients: String,
    /// Email subject, channel delivery only.
    pub email_subject: String,
    /// Email body, channel delivery only.
    pub email_body: String,
    /// `True` when channel emails carry the report as attachment.
    pub report_as_attachment: String,
    /// Primary action for the trigger and status.
    pub available_action: ReportDefinitionAction,
    /// Navigation trail for the details page.
    pub breadcrumbs: Vec<String>,
}

impl ReportDefinitionDetails {
    /// Projects a definition with timestamps rendered in UTC.
    #[must_use]
    pub fn project(definition: &ReportDefinition) -> Self {
        Self::project_with_offset(definition, Utc.fix())
    }

    /// Projects a definition with timestamps rendered at the given UTC offset.
    #[must_use]
    pub fn project_with_offset(definition: &ReportDefinition, offset: FixedOffset) -> Self {
        let report_params = definition.report_params();
        let core_params = &report_params.core_params;
        let trigger = definition.trigger();
        let delivery = definition.delivery();
        let delivery_params = &delivery.delivery_params;
        let channel_only = |value: Option<String>| {
            value
                .filter(|value| delivery.is_channel() && !value.trim().is_empty())
                .unwrap_or_else(|| EMPTY_FIELD.to_owned())
        };

        let time_period = definition.time_duration().humanize();
        let available_action = match trigger.trigger_type {
            TriggerType::OnDemand => ReportDefinitionAction::GenerateReport,
            TriggerType::Schedule => match definition.status() {
                ReportDefinitionStatus::Active => ReportDefinitionAction::Disable,
                ReportDefinitionStatus::Disabled => ReportDefinitionAction::Enable,
            },
        };

        Self {
            name: report_params.report_name.clone(),
            description: report_params.description.clone(),
            created: display_time(definition.time_created(), offset),
            last_updated: display_time(definition.last_updated(), offset),
            source: report_params.report_source.clone(),
            base_url: core_params.base_url.clone(),
            time_period_label: format!("Last {time_period}"),
            time_period,
            file_format: core_params.report_format.as_str().to_owned(),
            file_format_label: core_params.report_format.display_label().to_owned(),
            report_header: EMPTY_FIELD.to_owned(),
            report_footer: EMPTY_FIELD.to_owned(),
            trigger_type: trigger.trigger_type.as_str().to_owned(),
            schedule_details: trigger
                .trigger_params
                .as_ref()
                .map_or_else(|| EMPTY_FIELD.to_owned(), |params| {
                    params.schedule_type.as_str().to_owned()
                }),
            alert_details: EMPTY_FIELD.to_owned(),
            channel: delivery.delivery_type.as_str().to_owned(),
            status: definition.status().as_str().to_owned(),
            kibana_recipients: channel_only(
                delivery_params.kibana_recipients.as_deref().map(join_list),
            ),
            email_recipients: channel_only(delivery_params.recipients.as_deref().map(join_list)),
            email_subject: channel_only(delivery_params.title.clone()),
            email_body: channel_only(delivery_params.text_description.clone()),
            report_as_attachment: if delivery.sends_attachment() {
                "True".to_owned()
            } else {
                "False".to_owned()
            },
            available_action,
            breadcrumbs: vec![
                BREADCRUMB_ROOT.to_owned(),
                format!("Report definition details: {}", definition.report_name()),
            ],
        }
    }
}

fn display_time(value: DateTime<Utc>, offset: FixedOffset) -> String {
    value
        .with_timezone(&offset)
        .format(DISPLAY_DATE_FORMAT)
        .to_string()
}

fn join_list(values: &[String]) -> String {
    values.join(", ")
}
