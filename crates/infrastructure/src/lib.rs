//! Infrastructure adapters for application ports.

#![forbid(unsafe_code)]

mod http_reporting_client;
mod in_memory_report_definition_client;
mod tracing_navigator;

pub use http_reporting_client::HttpReportingClient;
pub use in_memory_report_definition_client::InMemoryReportDefinitionClient;
pub use tracing_navigator::TracingNavigator;
