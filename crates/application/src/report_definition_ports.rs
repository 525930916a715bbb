mod client;
mod generator;
mod navigation;

pub use client::{ReportDefinitionClient, SaveOutcome};
pub use generator::{GeneratedReport, ReportGenerator};
pub use navigation::{NavigationRoute, Navigator, ReportDefinitionEvent};
