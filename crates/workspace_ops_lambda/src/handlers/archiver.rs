use serde_json::Value;

use crate::adapters::control_plane::ControlPlane;
use crate::adapters::object_store::StateStore;
use crate::runtime::api_routes::{run_route, run_state_version_filter, STATE_VERSIONS_ROUTE};
use crate::runtime::contract::{
    content_fingerprint, decode_document, ArchiveSummary, Document, HandlerResponse,
    MissingStateVersion, RunCompletedEvent, RunResource, StateVersionResource,
    ARCHIVE_SUCCESS_MESSAGE, MISSING_STATE_MESSAGE,
};
use crate::runtime::error::HandlerError;
use crate::runtime::storage_keys::state_object_key;

const COMPONENT: &str = "archiver";

/// State snapshot produced by a run, downloaded and ready to persist.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchedState {
    pub state_id: String,
    pub content: Vec<u8>,
}

/// Entry point for run-completion events.
///
/// Unlike the dispatcher, errors are returned to the caller so the platform's
/// retry policy applies. A run without a state version is a 404 response, not
/// an error.
pub fn handle_run_completed_event(
    event: &Value,
    control_plane: &impl ControlPlane,
    state_store: &impl StateStore,
) -> Result<HandlerResponse, HandlerError> {
    tracing::info!(component = COMPONENT, event = %event, "received run completion event");

    archive_run_state(event, control_plane, state_store).inspect_err(|error| {
        tracing::error!(
            component = COMPONENT,
            error_kind = error.kind(),
            error = %error,
            "error processing event"
        );
    })
}

fn archive_run_state(
    event: &Value,
    control_plane: &impl ControlPlane,
    state_store: &impl StateStore,
) -> Result<HandlerResponse, HandlerError> {
    let run_event = RunCompletedEvent::from_envelope(event)?;

    let Some(state) = fetch_run_state(&run_event.run_id, control_plane)? else {
        tracing::warn!(
            component = COMPONENT,
            run_id = %run_event.run_id,
            "no state versions found for run"
        );
        return Ok(HandlerResponse::json(
            404,
            &MissingStateVersion {
                message: MISSING_STATE_MESSAGE.to_string(),
                run_id: run_event.run_id,
            },
        ));
    };

    let object_key = state_object_key(
        &run_event.environment,
        &run_event.workspace,
        &state.state_id,
    );
    state_store
        .write_object(&object_key, &state.content)
        .map_err(|message| HandlerError::Storage {
            key: object_key.clone(),
            message,
        })?;

    tracing::info!(
        component = COMPONENT,
        run_id = %run_event.run_id,
        state_id = %state.state_id,
        environment = %run_event.environment,
        workspace = %run_event.workspace,
        object_key = %object_key,
        "state file backed up"
    );

    Ok(HandlerResponse::json(
        200,
        &ArchiveSummary {
            message: ARCHIVE_SUCCESS_MESSAGE.to_string(),
            run_id: run_event.run_id,
            state_id: state.state_id,
            environment: run_event.environment,
            workspace: run_event.workspace,
            object_key,
            content_sha256: content_fingerprint(&state.content),
        },
    ))
}

/// Resolve the run's workspace, look up the state version the run produced and
/// download its content. `None` when the run produced no state version.
pub fn fetch_run_state(
    run_id: &str,
    control_plane: &impl ControlPlane,
) -> Result<Option<FetchedState>, HandlerError> {
    let route = run_route(run_id);
    let run: Document<RunResource> = decode_document(&route, control_plane.get(&route, &[])?)?;

    let response = control_plane.get(
        STATE_VERSIONS_ROUTE,
        &run_state_version_filter(run.data.workspace_id(), run_id),
    )?;
    let versions: Document<Vec<StateVersionResource>> =
        decode_document(STATE_VERSIONS_ROUTE, response)?;
    let Some(version) = versions.data.into_iter().next() else {
        return Ok(None);
    };

    let content = control_plane.download(&version.links.download)?;
    // Stored as downloaded, but it has to be a JSON document.
    serde_json::from_slice::<serde::de::IgnoredAny>(&content).map_err(|error| {
        HandlerError::malformed("state download", format!("state file is not JSON: {error}"))
    })?;

    Ok(Some(FetchedState {
        state_id: version.id,
        content,
    }))
}
