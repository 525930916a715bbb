//! Command-line shell for inspecting and managing one report definition.

#![forbid(unsafe_code)]

mod config;

use std::env;
use std::sync::Arc;

use reporting_application::{ReportDefinitionController, ReportDefinitionEvent};
use reporting_core::{AppError, AppResult};
use reporting_domain::{ReportDefinitionId, StatusAction};
use reporting_infrastructure::{HttpReportingClient, TracingNavigator};
use serde_json::{Value, json};
use tracing::info;
use tracing_subscriber::EnvFilter;

use crate::config::CliConfig;

const USAGE: &str =
    "usage: reporting-cli <show|enable|disable|generate|delete|edit> <report-definition-id>";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Command {
    Show,
    ChangeStatus(StatusAction),
    Generate,
    Delete,
    Edit,
}

impl Command {
    fn parse(value: &str) -> AppResult<Self> {
        match value {
            "show" => Ok(Self::Show),
            "enable" => Ok(Self::ChangeStatus(StatusAction::Enable)),
            "disable" => Ok(Self::ChangeStatus(StatusAction::Disable)),
            "generate" => Ok(Self::Generate),
            "delete" => Ok(Self::Delete),
            "edit" => Ok(Self::Edit),
            other => Err(AppError::Validation(format!(
                "unknown command '{other}'; {USAGE}"
            ))),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct Invocation {
    command: Command,
    id: ReportDefinitionId,
}

impl Invocation {
    fn from_args(mut args: impl Iterator<Item = String>) -> AppResult<Self> {
        let command = args
            .next()
            .ok_or_else(|| AppError::Validation(USAGE.to_owned()))?;
        let id = args
            .next()
            .ok_or_else(|| AppError::Validation(format!("missing report definition id; {USAGE}")))?;

        if args.next().is_some() {
            return Err(AppError::Validation(format!("too many arguments; {USAGE}")));
        }

        Ok(Self {
            command: Command::parse(command.as_str())?,
            id: ReportDefinitionId::new(id)?,
        })
    }
}

#[tokio::main]
async fn main() -> Result<(), AppError> {
    dotenvy::dotenv().ok();
    init_tracing();

    let invocation = Invocation::from_args(env::args().skip(1))?;
    let config = CliConfig::load()?;
    let controller = build_controller(&config)?;

    info!(
        api_base_url = %config.api_base_url,
        report_definition_id = %invocation.id,
        command = ?invocation.command,
        "reporting-cli started"
    );

    let output = run(&controller, &invocation).await?;
    let rendered = serde_json::to_string_pretty(&output)
        .map_err(|error| AppError::Internal(format!("failed to render output: {error}")))?;
    println!("{rendered}");

    Ok(())
}

fn build_controller(config: &CliConfig) -> AppResult<ReportDefinitionController> {
    let http_client = reqwest::Client::builder()
        .timeout(config.http_timeout)
        .build()
        .map_err(|error| AppError::Internal(format!("failed to build HTTP client: {error}")))?;
    let reporting_client = Arc::new(HttpReportingClient::new(
        http_client,
        config.api_base_url.as_str(),
    )?);

    Ok(
        ReportDefinitionController::new(reporting_client.clone(), reporting_client)
            .with_navigator(Arc::new(TracingNavigator))
            .with_display_offset(config.display_offset),
    )
}

async fn run(controller: &ReportDefinitionController, invocation: &Invocation) -> AppResult<Value> {
    let id = &invocation.id;

    match invocation.command {
        Command::Show => {
            let loaded = controller.load(id).await?;
            to_json(&loaded.details)
        }
        Command::ChangeStatus(action) => {
            controller.load(id).await?;
            let saved = controller.change_status(action).await?;
            to_json(&saved.details)
        }
        Command::Generate => {
            controller.load(id).await?;
            let report = controller.generate_report().await?;
            to_json(&report)
        }
        Command::Delete => {
            let event = controller.delete(id).await?;
            Ok(event_json(&event))
        }
        Command::Edit => {
            let event = controller.request_edit(id).await?;
            Ok(event_json(&event))
        }
    }
}

fn to_json(value: &impl serde::Serialize) -> AppResult<Value> {
    serde_json::to_value(value)
        .map_err(|error| AppError::Internal(format!("failed to encode output: {error}")))
}

fn event_json(event: &ReportDefinitionEvent) -> Value {
    let (kind, id) = match event {
        ReportDefinitionEvent::Deleted(id) => ("deleted", id),
        ReportDefinitionEvent::EditRequested(id) => ("edit_requested", id),
    };

    json!({
        "event": kind,
        "report_definition_id": id.as_str(),
        "route": event.route().path(),
    })
}

fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .compact()
        .init();
}
