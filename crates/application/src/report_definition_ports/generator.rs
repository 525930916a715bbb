use async_trait::async_trait;
use reporting_core::AppResult;
use reporting_domain::OnDemandReportRequest;
use serde::{Deserialize, Serialize};

/// Rendered report artifact returned by the generator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GeneratedReport {
    /// Suggested download file name.
    pub filename: String,
    /// Report content as delivered by the renderer (text or base64).
    pub data: String,
}

/// Port for the external report renderer.
#[async_trait]
pub trait ReportGenerator: Send + Sync {
    /// Renders one on-demand report.
    async fn generate_report(&self, request: OnDemandReportRequest) -> AppResult<GeneratedReport>;
}
