use std::sync::Arc;

use lambda_runtime::{service_fn, Error, LambdaEvent};
use serde_json::Value;
use workspace_ops_lambda::adapters::control_plane::HttpControlPlane;
use workspace_ops_lambda::config::DispatcherConfig;
use workspace_ops_lambda::handlers::dispatcher::{failure_response, handle_scheduled_event};
use workspace_ops_lambda::runtime::contract::HandlerResponse;

async fn handle_request(
    event: LambdaEvent<Value>,
    config: Arc<DispatcherConfig>,
) -> Result<HandlerResponse, Error> {
    // The blocking HTTP client must be created, used and dropped off the async workers.
    tokio::task::spawn_blocking(move || {
        match HttpControlPlane::new(&config.control_plane) {
            Ok(control_plane) => handle_scheduled_event(&event.payload, &config, &control_plane),
            Err(error) => failure_response(&error),
        }
    })
    .await
    .map_err(|error| Error::from(format!("dispatcher task failed: {error}")))
}

#[tokio::main]
async fn main() -> Result<(), Error> {
    lambda_runtime::tracing::init_default_subscriber();

    let config = Arc::new(DispatcherConfig::from_env()?);
    tracing::info!(
        component = "dispatcher",
        hostname = %config.control_plane.hostname,
        tags = %config.tags,
        "configuration loaded"
    );

    lambda_runtime::run(service_fn(move |event| {
        handle_request(event, Arc::clone(&config))
    }))
    .await
}
