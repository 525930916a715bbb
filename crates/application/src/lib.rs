//! Report definition controller and the ports it depends on.

#![forbid(unsafe_code)]

mod report_definition_controller;
mod report_definition_ports;

pub use report_definition_controller::{LoadedReportDefinition, ReportDefinitionController};
pub use report_definition_ports::{
    GeneratedReport, NavigationRoute, Navigator, ReportDefinitionClient, ReportDefinitionEvent,
    ReportGenerator, SaveOutcome,
};
