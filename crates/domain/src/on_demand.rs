use chrono::{DateTime, SecondsFormat, Utc};
use reporting_core::{AppError, AppResult};
use serde::{Deserialize, Serialize};

use crate::ReportDefinition;

/// Ephemeral request describing the exact window and query of an ad-hoc report.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OnDemandReportRequest {
    /// Source URL with the `_g` time range appended.
    pub query_url: String,
    /// Window start in epoch milliseconds.
    pub time_from: i64,
    /// Window end in epoch milliseconds.
    pub time_to: i64,
    /// Definition the report is rendered from.
    pub report_definition: ReportDefinition,
}

impl OnDemandReportRequest {
    /// Builds the request for the lookback window ending at `now`.
    ///
    /// The URL template is shared with the renderer:
    /// `{base_url}?_g=(time:(from:'{from}',to:'{to}'))` with ISO-8601
    /// timestamps at millisecond precision in UTC.
    pub fn build(definition: &ReportDefinition, now: DateTime<Utc>) -> AppResult<Self> {
        let from = now
            .checked_sub_signed(definition.time_duration().to_time_delta())
            .ok_or_else(|| {
                AppError::Validation(format!(
                    "lookback '{}' reaches before the supported time range",
                    definition.time_duration().as_str()
                ))
            })?;

        let query_url = format!(
            "{}?_g=(time:(from:'{}',to:'{}'))",
            definition.report_params().core_params.base_url,
            iso8601(from),
            iso8601(now)
        );

        Ok(Self {
            query_url,
            time_from: from.timestamp_millis(),
            time_to: now.timestamp_millis(),
            report_definition: definition.clone(),
        })
    }
}

fn iso8601(value: DateTime<Utc>) -> String {
    value.to_rfc3339_opts(SecondsFormat::Millis, true)
}
