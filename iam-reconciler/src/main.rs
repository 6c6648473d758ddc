use iam_core::error::AppError;
use iam_core::observability::init_tracing;
use iam_reconciler::config::ReconcilerConfig;
use iam_reconciler::services::{ApiClientReconciler, GrantReader, connect};
use serde::Serialize;

const USAGE: &str = "usage: iam-reconciler <groups | accessible-groups <username> | auth-grants <ui-identity-id> | api-client <client-id>>";

#[tokio::main]
async fn main() -> Result<(), AppError> {
    // Load configuration - fail fast if invalid
    let config = ReconcilerConfig::from_env()?;

    init_tracing(
        &config.common.service_name,
        &config.common.log_level,
        config.common.otlp_endpoint.as_deref(),
    )?;

    tracing::info!(
        service = %config.common.service_name,
        environment = ?config.environment,
        "Starting IAM reconciler"
    );

    let service = connect(&config.identity)?;
    let args: Vec<String> = std::env::args().skip(1).collect();

    match args.iter().map(String::as_str).collect::<Vec<_>>().as_slice() {
        ["groups"] => print(&GrantReader::new(service).groups().await?),
        ["accessible-groups", username] => {
            print(&GrantReader::new(service).accessible_groups(username).await?)
        }
        ["auth-grants", ui_identity_id] => {
            print(&GrantReader::new(service).user_auth_grants(ui_identity_id).await?)
        }
        ["api-client", client_id] => {
            print(&ApiClientReconciler::new(service).import(client_id).await?)
        }
        _ => Err(AppError::BadRequest(anyhow::anyhow!(USAGE))),
    }
}

fn print<T: Serialize>(value: &T) -> Result<(), AppError> {
    let json = serde_json::to_string_pretty(value)
        .map_err(|e| AppError::InternalError(anyhow::anyhow!("Failed to render output: {}", e)))?;
    println!("{}", json);
    Ok(())
}
