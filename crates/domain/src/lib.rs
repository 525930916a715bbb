//! Report definition model, invariants and display projection.

#![forbid(unsafe_code)]

mod details;
mod lookback;
mod on_demand;
mod report_definition;

pub use details::{EMPTY_FIELD, ReportDefinitionAction, ReportDefinitionDetails};
pub use lookback::LookbackDuration;
pub use on_demand::OnDemandReportRequest;
pub use report_definition::{
    CoreParams, CronSchedule, Delivery, DeliveryParams, DeliveryType, EMAIL_FORMAT_ATTACHMENT,
    IntervalSchedule, ReportDefinition, ReportDefinitionId, ReportDefinitionInput,
    ReportDefinitionStatus, ReportFormat, ReportParams, Schedule, ScheduleType, StatusAction,
    Trigger, TriggerParams, TriggerType,
};
