use async_trait::async_trait;
use reporting_application::{
    GeneratedReport, ReportDefinitionClient, ReportGenerator, SaveOutcome,
};
use reporting_core::{AppError, AppResult};
use reporting_domain::{OnDemandReportRequest, ReportDefinition, ReportDefinitionId};
use reqwest::StatusCode;
use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::debug;
use url::Url;

const REPORT_DEFINITIONS_SEGMENT: &str = "reportDefinitions";
const GENERATE_REPORT_SEGMENT: &str = "generateReport";

#[derive(Debug, Deserialize)]
struct ReportDefinitionEnvelope {
    report_definition: ReportDefinition,
}

/// HTTP adapter for the reporting backend routes.
///
/// Calls are made once; transport failures and 5xx answers surface as
/// [`AppError::Network`] for the caller to retry on user action.
#[derive(Debug, Clone)]
pub struct HttpReportingClient {
    http_client: reqwest::Client,
    base_url: Url,
}

impl HttpReportingClient {
    /// Creates a client rooted at the reporting API base URL,
    /// e.g. `http://localhost:5601/api/reporting`.
    pub fn new(http_client: reqwest::Client, base_url: &str) -> AppResult<Self> {
        let base_url = Url::parse(base_url).map_err(|error| {
            AppError::Validation(format!("invalid reporting API base URL '{base_url}': {error}"))
        })?;

        if base_url.cannot_be_a_base() || !matches!(base_url.scheme(), "http" | "https") {
            return Err(AppError::Validation(format!(
                "reporting API base URL '{base_url}' must be an http(s) URL"
            )));
        }

        Ok(Self {
            http_client,
            base_url,
        })
    }

    fn endpoint(&self, segments: &[&str]) -> AppResult<Url> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|()| {
                AppError::Validation(format!(
                    "reporting API base URL '{}' cannot carry a path",
                    self.base_url
                ))
            })?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    fn report_definition_url(&self, id: &ReportDefinitionId) -> AppResult<Url> {
        self.endpoint(&[REPORT_DEFINITIONS_SEGMENT, id.as_str()])
    }

    async fn send(
        &self,
        request: reqwest::RequestBuilder,
        operation: &str,
    ) -> AppResult<reqwest::Response> {
        let response = request.send().await.map_err(|error| {
            AppError::Network(format!("failed to {operation}: {error}"))
        })?;

        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response
            .text()
            .await
            .unwrap_or_else(|_| "<body unavailable>".to_owned());
        Err(error_for_status(status, operation, body.as_str()))
    }
}

#[async_trait]
impl ReportDefinitionClient for HttpReportingClient {
    async fn get_report_definition(
        &self,
        id: &ReportDefinitionId,
    ) -> AppResult<ReportDefinition> {
        let url = self.report_definition_url(id)?;
        debug!(report_definition_id = %id, url = %url, "fetching report definition");

        let operation = format!("get report definition '{id}'");
        let response = self
            .send(self.http_client.get(url), operation.as_str())
            .await?;
        let body = read_body(response, operation.as_str()).await?;
        let envelope: ReportDefinitionEnvelope = decode(body.as_slice(), operation.as_str())?;

        Ok(envelope.report_definition)
    }

    async fn update_report_definition(
        &self,
        id: &ReportDefinitionId,
        definition: &ReportDefinition,
    ) -> AppResult<SaveOutcome> {
        let url = self.report_definition_url(id)?;
        debug!(report_definition_id = %id, url = %url, "replacing report definition");

        let operation = format!("update report definition '{id}'");
        let response = self
            .send(self.http_client.put(url).json(definition), operation.as_str())
            .await?;
        let body = read_body(response, operation.as_str()).await?;

        if body.iter().all(u8::is_ascii_whitespace) {
            return Ok(SaveOutcome::Acknowledged);
        }

        // Success bodies that are not JSON are plain acknowledgements.
        let Ok(mut value) = serde_json::from_slice::<Value>(body.as_slice()) else {
            debug!(report_definition_id = %id, "update acknowledged with a non-JSON body");
            return Ok(SaveOutcome::Acknowledged);
        };

        match value.get_mut("report_definition").map(Value::take) {
            Some(document) => Ok(SaveOutcome::Echoed(ReportDefinition::from_value(document)?)),
            None => Ok(SaveOutcome::Acknowledged),
        }
    }

    async fn delete_report_definition(&self, id: &ReportDefinitionId) -> AppResult<()> {
        let url = self.report_definition_url(id)?;
        debug!(report_definition_id = %id, url = %url, "deleting report definition");

        let operation = format!("delete report definition '{id}'");
        self.send(self.http_client.delete(url), operation.as_str())
            .await?;
        Ok(())
    }
}

#[async_trait]
impl ReportGenerator for HttpReportingClient {
    async fn generate_report(&self, request: OnDemandReportRequest) -> AppResult<GeneratedReport> {
        let url = self.endpoint(&[GENERATE_REPORT_SEGMENT])?;
        debug!(url = %url, query_url = %request.query_url, "requesting on-demand report");

        let operation = "generate on-demand report";
        let response = self
            .send(self.http_client.post(url).json(&request), operation)
            .await?;
        let body = read_body(response, operation).await?;
        decode(body.as_slice(), operation)
    }
}

async fn read_body(response: reqwest::Response, operation: &str) -> AppResult<Vec<u8>> {
    response
        .bytes()
        .await
        .map(|bytes| bytes.to_vec())
        .map_err(|error| {
            AppError::Network(format!("failed to read response to {operation}: {error}"))
        })
}

fn decode<T: DeserializeOwned>(body: &[u8], operation: &str) -> AppResult<T> {
    serde_json::from_slice(body).map_err(|error| {
        AppError::Validation(format!(
            "unexpected response body for {operation}: {error}"
        ))
    })
}

fn error_for_status(status: StatusCode, operation: &str, body: &str) -> AppError {
    let message = format!("{operation} returned status {}: {body}", status.as_u16());

    match status {
        StatusCode::NOT_FOUND => AppError::NotFound(message),
        StatusCode::CONFLICT | StatusCode::PRECONDITION_FAILED => AppError::Conflict(message),
        StatusCode::BAD_REQUEST | StatusCode::UNPROCESSABLE_ENTITY => {
            AppError::Validation(message)
        }
        StatusCode::TOO_MANY_REQUESTS | StatusCode::REQUEST_TIMEOUT => AppError::Network(message),
        status if status.is_server_error() => AppError::Network(message),
        _ => AppError::Internal(message),
    }
}

#[cfg(test)]
mod tests;
