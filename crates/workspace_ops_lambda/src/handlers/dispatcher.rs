use serde_json::Value;

use crate::adapters::control_plane::ControlPlane;
use crate::config::DispatcherConfig;
use crate::runtime::api_routes::{
    production_workspaces_filter, tag_name_filter, RUNS_ROUTE, TAGS_ROUTE, WORKSPACES_ROUTE,
};
use crate::runtime::contract::{
    create_run_request, decode_document, DispatchSummary, DispatchedRun, Document,
    HandlerResponse, TagResource, WorkspaceResource, DISPATCH_SUCCESS_MESSAGE,
};
use crate::runtime::error::HandlerError;

const COMPONENT: &str = "dispatcher";

/// Entry point for the scheduled trigger.
///
/// Never fails: every error is logged and reported as a 400 response so the
/// scheduler sees a completed invocation.
pub fn handle_scheduled_event(
    event: &Value,
    config: &DispatcherConfig,
    control_plane: &impl ControlPlane,
) -> HandlerResponse {
    tracing::info!(component = COMPONENT, event = %event, "received scheduled event");

    match dispatch_runs(config, control_plane) {
        Ok(runs) => {
            tracing::info!(
                component = COMPONENT,
                runs_created = runs.len(),
                "dispatch completed"
            );
            HandlerResponse::json(
                200,
                &DispatchSummary {
                    message: DISPATCH_SUCCESS_MESSAGE.to_string(),
                    runs,
                },
            )
        }
        Err(error) => failure_response(&error),
    }
}

/// 400 response for any error raised while dispatching.
pub fn failure_response(error: &HandlerError) -> HandlerResponse {
    tracing::error!(
        component = COMPONENT,
        error_kind = error.kind(),
        error = %error,
        "dispatch failed"
    );
    HandlerResponse::error(400, error)
}

/// Resolve the configured tag, list its production workspaces and queue one run
/// per workspace in list order. The first failing run creation aborts the rest.
pub fn dispatch_runs(
    config: &DispatcherConfig,
    control_plane: &impl ControlPlane,
) -> Result<Vec<DispatchedRun>, HandlerError> {
    let tag = resolve_tag(&config.tags, control_plane)?;
    let workspaces = list_production_workspaces(&config.tags, &tag.id, control_plane)?;

    let mut runs = Vec::with_capacity(workspaces.len());
    for workspace in workspaces {
        tracing::info!(
            component = COMPONENT,
            workspace_id = %workspace.id,
            workspace_name = workspace.display_name(),
            "triggering run"
        );

        let response = control_plane.post(RUNS_ROUTE, &create_run_request(&workspace.id))?;
        // The run exists once the POST succeeded; a missing id only loses it from the summary.
        let run_id = created_run_id(&response);
        match &run_id {
            Some(run_id) => tracing::info!(
                component = COMPONENT,
                workspace_id = %workspace.id,
                run_id = %run_id,
                "run created"
            ),
            None => tracing::warn!(
                component = COMPONENT,
                workspace_id = %workspace.id,
                "run created but response carried no run id"
            ),
        }
        runs.push(DispatchedRun {
            workspace_id: workspace.id,
            workspace_name: workspace.attributes.name,
            run_id,
        });
    }

    Ok(runs)
}

fn created_run_id(response: &Value) -> Option<String> {
    response
        .pointer("/data/id")
        .and_then(Value::as_str)
        .map(str::to_string)
}

fn resolve_tag(
    tags: &str,
    control_plane: &impl ControlPlane,
) -> Result<TagResource, HandlerError> {
    let response = control_plane.get(TAGS_ROUTE, &tag_name_filter(tags))?;
    let document: Document<Vec<TagResource>> = decode_document(TAGS_ROUTE, response)?;
    document
        .data
        .into_iter()
        .next()
        .ok_or_else(|| HandlerError::not_found(format!("Missing tag '{tags}'")))
}

fn list_production_workspaces(
    tags: &str,
    tag_id: &str,
    control_plane: &impl ControlPlane,
) -> Result<Vec<WorkspaceResource>, HandlerError> {
    let response = control_plane.get(WORKSPACES_ROUTE, &production_workspaces_filter(tag_id))?;
    let document: Document<Vec<WorkspaceResource>> = decode_document(WORKSPACES_ROUTE, response)?;
    if document.data.is_empty() {
        return Err(HandlerError::not_found(format!(
            "No workspaces that match tag '{tags}' and 'production' environment type"
        )));
    }
    Ok(document.data)
}
