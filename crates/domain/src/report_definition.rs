use std::fmt::{Display, Formatter};

use chrono::{DateTime, Utc};
use reporting_core::{AppError, AppResult, NonEmptyString};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use url::Url;

use crate::LookbackDuration;

/// Opaque backend identifier of one report definition.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ReportDefinitionId(NonEmptyString);

impl ReportDefinitionId {
    /// Creates a validated report definition identifier.
    pub fn new(value: impl Into<String>) -> AppResult<Self> {
        let value = value.into();
        NonEmptyString::new(value.trim())
            .map(Self)
            .map_err(|_| AppError::Validation("report definition id must not be empty".to_owned()))
    }

    /// Returns the identifier as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

impl Display for ReportDefinitionId {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> std::fmt::Result {
        formatter.write_str(self.as_str())
    }
}

/// Rendered file format of generated reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReportFormat {
    /// Portable document format.
    Pdf,
    /// PNG screenshot.
    Png,
    /// Comma separated values export.
    Csv,
}

impl ReportFormat {
    /// Returns stable wire value.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pdf => "pdf",
            Self::Png => "png",
            Self::Csv => "csv",
        }
    }

    /// Returns the upper-case label shown next to download links.
    #[must_use]
    pub fn display_label(&self) -> &'static str {
        match self {
            Self::Pdf => "PDF",
            Self::Png => "PNG",
            Self::Csv => "CSV",
        }
    }
}

/// Source location and rendering options of a report.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CoreParams {
    /// Dashboard, visualization or saved search URL the report renders.
    pub base_url: String,
    /// Output file format.
    pub report_format: ReportFormat,
    /// Lookback window ending at generation time.
    pub time_duration: LookbackDuration,
    /// Backend fields this client does not interpret.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Descriptive report settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportParams {
    /// User-facing report name.
    pub report_name: String,
    /// Free-form description, possibly empty.
    #[serde(default)]
    pub description: String,
    /// Kind of source the report is built from (dashboard, visualization, ...).
    pub report_source: String,
    /// Source and rendering options.
    pub core_params: CoreParams,
}

/// Condition class that starts report generation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TriggerType {
    /// Generated only when a user asks for it.
    #[serde(rename = "On demand")]
    OnDemand,
    /// Generated by the backend scheduler.
    Schedule,
}

impl TriggerType {
    /// Returns stable wire value.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::OnDemand => "On demand",
            Self::Schedule => "Schedule",
        }
    }
}

/// How a scheduled trigger expresses its recurrence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ScheduleType {
    /// Fixed interval recurrence, stored in `schedule.interval`.
    Recurring,
    /// Cron expression recurrence, stored in `schedule.cron`.
    #[serde(rename = "Cron based")]
    CronBased,
}

impl ScheduleType {
    /// Returns stable wire value.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Recurring => "Recurring",
            Self::CronBased => "Cron based",
        }
    }
}

/// Fixed interval recurrence.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IntervalSchedule {
    /// Number of units between runs.
    pub period: u64,
    /// Interval unit, e.g. `Minutes` or `Days`.
    pub unit: String,
    /// First run time in epoch milliseconds.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_time: Option<i64>,
}

/// Cron expression recurrence.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CronSchedule {
    /// Cron expression.
    pub expression: String,
    /// IANA timezone the expression is evaluated in.
    pub timezone: String,
}

/// Schedule payload. Exactly one field is meaningful, selected by [`ScheduleType`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Schedule {
    /// Interval recurrence.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub interval: Option<IntervalSchedule>,
    /// Cron recurrence.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cron: Option<CronSchedule>,
}

/// Scheduling parameters of a trigger.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TriggerParams {
    /// Whether the backend scheduler runs this definition.
    #[serde(default)]
    pub enabled: bool,
    /// Recurrence kind.
    pub schedule_type: ScheduleType,
    /// Recurrence payload.
    #[serde(default)]
    pub schedule: Schedule,
    /// Backend fields this client does not interpret.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl TriggerParams {
    /// Drops the schedule field that does not belong to the schedule type.
    pub fn prune_schedule(&mut self) {
        match self.schedule_type {
            ScheduleType::Recurring => self.schedule.cron = None,
            ScheduleType::CronBased => self.schedule.interval = None,
        }
    }

    fn has_selected_schedule(&self) -> bool {
        match self.schedule_type {
            ScheduleType::Recurring => self.schedule.interval.is_some(),
            ScheduleType::CronBased => self.schedule.cron.is_some(),
        }
    }
}

/// Report trigger configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Trigger {
    /// Trigger kind.
    pub trigger_type: TriggerType,
    /// Scheduling parameters, absent for plain on-demand definitions.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub trigger_params: Option<TriggerParams>,
}

/// Delivery channel of generated reports.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum DeliveryType {
    /// Notification channel delivery with email fields.
    Channel,
    /// Any other delivery type, kept verbatim.
    Other(String),
}

impl DeliveryType {
    /// Returns stable wire value.
    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Self::Channel => "Channel",
            Self::Other(value) => value.as_str(),
        }
    }
}

impl From<String> for DeliveryType {
    fn from(value: String) -> Self {
        if value == "Channel" {
            Self::Channel
        } else {
            Self::Other(value)
        }
    }
}

impl From<DeliveryType> for String {
    fn from(value: DeliveryType) -> Self {
        match value {
            DeliveryType::Channel => "Channel".to_owned(),
            DeliveryType::Other(value) => value,
        }
    }
}

/// Email format value that attaches the rendered file.
pub const EMAIL_FORMAT_ATTACHMENT: &str = "Attachment";

/// Delivery parameters. Email fields are only meaningful for [`DeliveryType::Channel`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DeliveryParams {
    /// Dashboard users notified in-app.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kibana_recipients: Option<Vec<String>>,
    /// Email recipients.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub recipients: Option<Vec<String>>,
    /// Email subject.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    /// Email body text.
    #[serde(
        default,
        rename = "textDescription",
        alias = "text_description",
        skip_serializing_if = "Option::is_none"
    )]
    pub text_description: Option<String>,
    /// Email format, e.g. `Attachment`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email_format: Option<String>,
    /// Backend fields this client does not interpret.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Report delivery configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Delivery {
    /// Delivery kind.
    pub delivery_type: DeliveryType,
    /// Delivery parameters.
    #[serde(default)]
    pub delivery_params: DeliveryParams,
}

impl Delivery {
    /// Returns whether delivery goes through a notification channel.
    #[must_use]
    pub fn is_channel(&self) -> bool {
        self.delivery_type == DeliveryType::Channel
    }

    /// Returns whether the rendered report is attached to channel emails.
    #[must_use]
    pub fn sends_attachment(&self) -> bool {
        self.is_channel()
            && self.delivery_params.email_format.as_deref() == Some(EMAIL_FORMAT_ATTACHMENT)
    }
}

/// Lifecycle status of a report definition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ReportDefinitionStatus {
    /// Schedule is running.
    Active,
    /// Schedule is paused.
    Disabled,
}

impl ReportDefinitionStatus {
    /// Returns stable wire value.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Active => "Active",
            Self::Disabled => "Disabled",
        }
    }
}

/// User action that flips the schedule status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StatusAction {
    /// Resume the schedule.
    Enable,
    /// Pause the schedule.
    Disable,
}

impl StatusAction {
    /// Returns the button label for this action.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Enable => "Enable",
            Self::Disable => "Disable",
        }
    }

    /// Parses an action label.
    pub fn parse(value: &str) -> AppResult<Self> {
        match value {
            "Enable" => Ok(Self::Enable),
            "Disable" => Ok(Self::Disable),
            _ => Err(AppError::Validation(format!(
                "unknown status action '{value}'"
            ))),
        }
    }

    /// Returns the action that flips the given status.
    #[must_use]
    pub fn toggling(status: ReportDefinitionStatus) -> Self {
        match status {
            ReportDefinitionStatus::Active => Self::Disable,
            ReportDefinitionStatus::Disabled => Self::Enable,
        }
    }
}

/// Decoded report definition document before validation.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ReportDefinitionInput {
    /// Descriptive report settings.
    pub report_params: ReportParams,
    /// Trigger configuration.
    pub trigger: Trigger,
    /// Delivery configuration.
    pub delivery: Delivery,
    /// Lifecycle status.
    pub status: ReportDefinitionStatus,
    /// Creation timestamp.
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub time_created: DateTime<Utc>,
    /// Last modification timestamp.
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub last_updated: DateTime<Utc>,
}

/// Validated report definition as stored by the reporting backend.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "ReportDefinitionInput")]
pub struct ReportDefinition {
    report_params: ReportParams,
    trigger: Trigger,
    delivery: Delivery,
    status: ReportDefinitionStatus,
    #[serde(with = "chrono::serde::ts_milliseconds")]
    time_created: DateTime<Utc>,
    #[serde(with = "chrono::serde::ts_milliseconds")]
    last_updated: DateTime<Utc>,
}

impl ReportDefinition {
    /// Creates a validated report definition.
    pub fn new(input: ReportDefinitionInput) -> AppResult<Self> {
        let ReportDefinitionInput {
            report_params,
            trigger,
            delivery,
            status,
            time_created,
            last_updated,
        } = input;

        NonEmptyString::new(report_params.report_name.as_str()).map_err(|_| {
            AppError::Validation("report_params.report_name must not be empty".to_owned())
        })?;
        validate_base_url(report_params.core_params.base_url.as_str())?;
        validate_trigger(&trigger)?;

        Ok(Self {
            report_params,
            trigger,
            delivery,
            status,
            time_created,
            last_updated,
        })
    }

    /// Decodes and validates a backend JSON document.
    pub fn from_value(value: Value) -> AppResult<Self> {
        serde_json::from_value(value).map_err(|error| {
            AppError::Validation(format!("malformed report definition: {error}"))
        })
    }

    /// Returns descriptive report settings.
    #[must_use]
    pub fn report_params(&self) -> &ReportParams {
        &self.report_params
    }

    /// Returns the report name.
    #[must_use]
    pub fn report_name(&self) -> &str {
        self.report_params.report_name.as_str()
    }

    /// Returns the lookback window used for on-demand generation.
    #[must_use]
    pub fn time_duration(&self) -> &LookbackDuration {
        &self.report_params.core_params.time_duration
    }

    /// Returns trigger configuration.
    #[must_use]
    pub fn trigger(&self) -> &Trigger {
        &self.trigger
    }

    /// Returns delivery configuration.
    #[must_use]
    pub fn delivery(&self) -> &Delivery {
        &self.delivery
    }

    /// Returns lifecycle status.
    #[must_use]
    pub fn status(&self) -> ReportDefinitionStatus {
        self.status
    }

    /// Returns whether the backend scheduler runs this definition.
    #[must_use]
    pub fn is_enabled(&self) -> bool {
        self.trigger
            .trigger_params
            .as_ref()
            .is_some_and(|params| params.enabled)
    }

    /// Returns creation timestamp.
    #[must_use]
    pub fn time_created(&self) -> DateTime<Utc> {
        self.time_created
    }

    /// Returns last modification timestamp.
    #[must_use]
    pub fn last_updated(&self) -> DateTime<Utc> {
        self.last_updated
    }

    /// Returns a copy with the schedule enabled or disabled.
    ///
    /// Sets `trigger_params.enabled` and `status` from the action, then prunes
    /// the schedule field that does not match `schedule_type`. Pruning runs on
    /// every call, including when the document was already consistent.
    pub fn with_status(&self, action: StatusAction) -> AppResult<Self> {
        let mut updated = self.clone();
        let trigger_params = updated.trigger.trigger_params.as_mut().ok_or_else(|| {
            AppError::Validation(format!(
                "report definition '{}' has no schedule to {}",
                self.report_name(),
                action.as_str().to_lowercase()
            ))
        })?;

        let enable = action == StatusAction::Enable;
        trigger_params.enabled = enable;
        trigger_params.prune_schedule();
        updated.status = if enable {
            ReportDefinitionStatus::Active
        } else {
            ReportDefinitionStatus::Disabled
        };

        Ok(updated)
    }

    /// Returns a copy stamped with a new modification time.
    #[must_use]
    pub fn with_last_updated(&self, last_updated: DateTime<Utc>) -> Self {
        let mut updated = self.clone();
        updated.last_updated = last_updated;
        updated
    }
}

impl TryFrom<ReportDefinitionInput> for ReportDefinition {
    type Error = AppError;

    fn try_from(value: ReportDefinitionInput) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

fn validate_base_url(base_url: &str) -> AppResult<()> {
    let parsed = Url::parse(base_url).map_err(|error| {
        AppError::Validation(format!(
            "core_params.base_url '{base_url}' is not an absolute URL: {error}"
        ))
    })?;

    if parsed.cannot_be_a_base() {
        return Err(AppError::Validation(format!(
            "core_params.base_url '{base_url}' cannot carry a query"
        )));
    }

    Ok(())
}

fn validate_trigger(trigger: &Trigger) -> AppResult<()> {
    let Some(trigger_params) = trigger.trigger_params.as_ref() else {
        if trigger.trigger_type == TriggerType::Schedule {
            return Err(AppError::Validation(
                "scheduled trigger requires trigger_params".to_owned(),
            ));
        }

        return Ok(());
    };

    if !trigger_params.has_selected_schedule() {
        let field = match trigger_params.schedule_type {
            ScheduleType::Recurring => "interval",
            ScheduleType::CronBased => "cron",
        };
        return Err(AppError::Validation(format!(
            "schedule_type '{}' requires trigger_params.schedule.{field}",
            trigger_params.schedule_type.as_str()
        )));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use reporting_core::AppError;
    use serde_json::{Value, json};

    use super::{
        DeliveryType, ReportDefinition, ReportDefinitionStatus, ReportFormat, ScheduleType,
        StatusAction, TriggerType,
    };

    fn recurring_document() -> Value {
        json!({
            "report_params": {
                "report_name": "Daily sales",
                "description": "Sales dashboard snapshot",
                "report_source": "Dashboard",
                "core_params": {
                    "base_url": "http://localhost:5601/app/dashboards#/view/sales",
                    "report_format": "pdf",
                    "time_duration": "PT1H",
                    "window_width": 1440
                }
            },
            "trigger": {
                "trigger_type": "Schedule",
                "trigger_params": {
                    "enabled": true,
                    "schedule_type": "Recurring",
                    "schedule": {
                        "interval": { "period": 1, "unit": "Days", "start_time": 1_704_067_200_000_i64 }
                    },
                    "enabled_time": 1_704_067_200_000_i64
                }
            },
            "delivery": {
                "delivery_type": "Channel",
                "delivery_params": {
                    "recipients": ["ops@example.com"],
                    "title": "Daily sales",
                    "textDescription": "Attached",
                    "email_format": "Attachment"
                }
            },
            "status": "Active",
            "time_created": 1_704_067_200_000_i64,
            "last_updated": 1_704_110_400_000_i64
        })
    }

    fn decode(value: Value) -> ReportDefinition {
        ReportDefinition::from_value(value).unwrap_or_else(|error| panic!("{error}"))
    }

    #[test]
    fn decodes_backend_document() {
        let definition = decode(recurring_document());

        assert_eq!(definition.report_name(), "Daily sales");
        assert_eq!(
            definition.report_params().core_params.report_format,
            ReportFormat::Pdf
        );
        assert_eq!(definition.trigger().trigger_type, TriggerType::Schedule);
        assert_eq!(definition.delivery().delivery_type, DeliveryType::Channel);
        assert_eq!(definition.status(), ReportDefinitionStatus::Active);
        assert!(definition.is_enabled());
        assert!(definition.delivery().sends_attachment());
    }

    #[test]
    fn round_trip_preserves_unknown_backend_fields() {
        let definition = decode(recurring_document());
        let encoded = serde_json::to_value(&definition).unwrap_or(Value::Null);

        assert_eq!(encoded["report_params"]["core_params"]["window_width"], 1440);
        assert_eq!(
            encoded["trigger"]["trigger_params"]["enabled_time"],
            1_704_067_200_000_i64
        );
        assert_eq!(encoded["delivery"]["delivery_params"]["textDescription"], "Attached");
        assert_eq!(encoded["time_created"], 1_704_067_200_000_i64);
    }

    #[test]
    fn other_delivery_types_are_kept_verbatim() {
        let mut document = recurring_document();
        document["delivery"]["delivery_type"] = json!("Kibana user");
        let definition = decode(document);

        assert_eq!(
            definition.delivery().delivery_type,
            DeliveryType::Other("Kibana user".to_owned())
        );
        assert!(!definition.delivery().sends_attachment());
        let encoded = serde_json::to_value(&definition).unwrap_or(Value::Null);
        assert_eq!(encoded["delivery"]["delivery_type"], "Kibana user");
    }

    #[test]
    fn rejects_unknown_report_format() {
        let mut document = recurring_document();
        document["report_params"]["core_params"]["report_format"] = json!("docx");

        assert!(matches!(
            ReportDefinition::from_value(document),
            Err(AppError::Validation(_))
        ));
    }

    #[test]
    fn rejects_relative_base_url() {
        let mut document = recurring_document();
        document["report_params"]["core_params"]["base_url"] = json!("/app/dashboards");

        assert!(matches!(
            ReportDefinition::from_value(document),
            Err(AppError::Validation(_))
        ));
    }

    #[test]
    fn rejects_schedule_without_selected_field() {
        let mut document = recurring_document();
        document["trigger"]["trigger_params"]["schedule"] =
            json!({ "cron": { "expression": "0 * * * *", "timezone": "UTC" } });

        let result = ReportDefinition::from_value(document);
        assert!(
            matches!(result, Err(AppError::Validation(ref message)) if message.contains("schedule.interval"))
        );
    }

    #[test]
    fn rejects_scheduled_trigger_without_params() {
        let mut document = recurring_document();
        document["trigger"] = json!({ "trigger_type": "Schedule" });

        assert!(ReportDefinition::from_value(document).is_err());
    }

    #[test]
    fn rejects_missing_timestamps() {
        let mut document = recurring_document();
        if let Some(object) = document.as_object_mut() {
            object.remove("last_updated");
        }

        assert!(ReportDefinition::from_value(document).is_err());
    }

    #[test]
    fn disable_sets_flag_and_status_and_prunes_cron() {
        let mut document = recurring_document();
        document["trigger"]["trigger_params"]["schedule"]["cron"] =
            json!({ "expression": "0 * * * *", "timezone": "UTC" });
        let definition = decode(document);

        let updated = definition.with_status(StatusAction::Disable);
        assert!(updated.is_ok());
        let updated = updated.unwrap_or_else(|_| unreachable!());

        assert!(!updated.is_enabled());
        assert_eq!(updated.status(), ReportDefinitionStatus::Disabled);
        let trigger_params = updated.trigger().trigger_params.as_ref();
        assert!(trigger_params.is_some_and(|params| params.schedule.cron.is_none()));
        assert!(trigger_params.is_some_and(|params| params.schedule.interval.is_some()));

        // Input is left untouched.
        assert!(definition.is_enabled());
        assert!(
            definition
                .trigger()
                .trigger_params
                .as_ref()
                .is_some_and(|params| params.schedule.cron.is_some())
        );
    }

    #[test]
    fn enable_on_cron_schedule_prunes_interval() {
        let mut document = recurring_document();
        document["status"] = json!("Disabled");
        document["trigger"]["trigger_params"]["enabled"] = json!(false);
        document["trigger"]["trigger_params"]["schedule_type"] = json!("Cron based");
        document["trigger"]["trigger_params"]["schedule"]["cron"] =
            json!({ "expression": "0 8 * * *", "timezone": "Europe/Berlin" });
        let definition = decode(document);

        let updated = definition
            .with_status(StatusAction::Enable)
            .unwrap_or_else(|error| panic!("{error}"));

        assert!(updated.is_enabled());
        assert_eq!(updated.status(), ReportDefinitionStatus::Active);
        let params = updated.trigger().trigger_params.as_ref();
        assert_eq!(params.map(|params| params.schedule_type), Some(ScheduleType::CronBased));
        assert!(params.is_some_and(|params| params.schedule.interval.is_none()));
        assert!(params.is_some_and(|params| params.schedule.cron.is_some()));
    }

    #[test]
    fn on_demand_definition_without_schedule_cannot_toggle() {
        let mut document = recurring_document();
        document["trigger"] = json!({ "trigger_type": "On demand" });
        let definition = decode(document);

        assert!(matches!(
            definition.with_status(StatusAction::Disable),
            Err(AppError::Validation(_))
        ));
    }

    #[test]
    fn status_action_toggles_current_status() {
        assert_eq!(
            StatusAction::toggling(ReportDefinitionStatus::Active),
            StatusAction::Disable
        );
        assert_eq!(
            StatusAction::toggling(ReportDefinitionStatus::Disabled),
            StatusAction::Enable
        );
        assert_eq!(StatusAction::parse("Enable"), Ok(StatusAction::Enable));
        assert!(StatusAction::parse("Pause").is_err());
    }
}
