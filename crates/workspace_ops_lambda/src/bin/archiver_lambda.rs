use std::sync::Arc;

use lambda_runtime::{service_fn, Error, LambdaEvent};
use serde_json::Value;
use tokio::runtime::Handle;
use workspace_ops_lambda::adapters::control_plane::HttpControlPlane;
use workspace_ops_lambda::adapters::object_store::S3StateStore;
use workspace_ops_lambda::config::ArchiverConfig;
use workspace_ops_lambda::handlers::archiver::handle_run_completed_event;
use workspace_ops_lambda::runtime::contract::HandlerResponse;
use workspace_ops_lambda::runtime::error::HandlerError;

struct RuntimeDependencies {
    config: ArchiverConfig,
    s3_client: aws_sdk_s3::Client,
}

async fn handle_request(
    event: LambdaEvent<Value>,
    deps: Arc<RuntimeDependencies>,
) -> Result<HandlerResponse, Error> {
    let runtime = Handle::current();

    tokio::task::spawn_blocking(move || -> Result<HandlerResponse, HandlerError> {
        let control_plane = HttpControlPlane::new(&deps.config.control_plane)?;
        let state_store =
            S3StateStore::new(deps.config.bucket.clone(), deps.s3_client.clone(), runtime);
        handle_run_completed_event(&event.payload, &control_plane, &state_store)
    })
    .await
    .map_err(|error| Error::from(format!("archiver task failed: {error}")))?
    .map_err(Error::from)
}

#[tokio::main]
async fn main() -> Result<(), Error> {
    lambda_runtime::tracing::init_default_subscriber();

    let config = ArchiverConfig::from_env()?;
    tracing::info!(
        component = "archiver",
        hostname = %config.control_plane.hostname,
        bucket = %config.bucket,
        "configuration loaded"
    );

    let aws_config = aws_config::load_defaults(aws_config::BehaviorVersion::latest()).await;
    let deps = Arc::new(RuntimeDependencies {
        config,
        s3_client: aws_sdk_s3::Client::new(&aws_config),
    });

    lambda_runtime::run(service_fn(move |event| {
        handle_request(event, Arc::clone(&deps))
    }))
    .await
}
