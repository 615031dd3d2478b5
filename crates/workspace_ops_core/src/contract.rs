use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use sha2::{Digest, Sha256};

use crate::error::HandlerError;

pub const DISPATCH_SUCCESS_MESSAGE: &str = "Event processed successfully!";
pub const ARCHIVE_SUCCESS_MESSAGE: &str = "Successfully processed state version";
pub const MISSING_STATE_MESSAGE: &str = "No state version found";

/// Top-level JSON:API envelope.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Document<T> {
    pub data: T,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct TagResource {
    pub id: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct WorkspaceAttributes {
    #[serde(default)]
    pub name: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct WorkspaceResource {
    pub id: String,
    #[serde(default)]
    pub attributes: WorkspaceAttributes,
}

impl WorkspaceResource {
    pub fn display_name(&self) -> &str {
        self.attributes.name.as_deref().unwrap_or("<unnamed>")
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ResourceIdentifier {
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
    pub id: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Relationship {
    pub data: ResourceIdentifier,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct RunRelationships {
    pub workspace: Relationship,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct RunResource {
    pub id: String,
    pub relationships: RunRelationships,
}

impl RunResource {
    pub fn workspace_id(&self) -> &str {
        &self.relationships.workspace.data.id
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct StateVersionLinks {
    pub download: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct StateVersionResource {
    pub id: String,
    pub links: StateVersionLinks,
}

/// Decode a raw control-plane response into a typed JSON:API document.
pub fn decode_document<T: DeserializeOwned>(
    target: &str,
    value: Value,
) -> Result<Document<T>, HandlerError> {
    serde_json::from_value(value).map_err(|error| HandlerError::malformed(target, error.to_string()))
}

/// Body for `POST runs` that queues a plan/apply on one workspace.
pub fn create_run_request(workspace_id: &str) -> Value {
    json!({
        "data": {
            "type": "runs",
            "relationships": {
                "workspace": {
                    "data": {
                        "type": "workspaces",
                        "id": workspace_id,
                    }
                }
            }
        }
    })
}

/// Fields of a run-completion notification, found under `detail.event`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct RunCompletedEvent {
    #[serde(rename = "run-id")]
    pub run_id: String,
    pub environment: String,
    pub workspace: String,
}

#[derive(Deserialize)]
struct RunCompletedEnvelope {
    detail: RunCompletedDetail,
}

#[derive(Deserialize)]
struct RunCompletedDetail {
    event: RunCompletedEvent,
}

impl RunCompletedEvent {
    pub fn from_envelope(event: &Value) -> Result<Self, HandlerError> {
        RunCompletedEnvelope::deserialize(event)
            .map(|envelope| envelope.detail.event)
            .map_err(|error| HandlerError::InvalidEvent(error.to_string()))
    }
}

/// Lambda-style response: `body` carries a JSON-encoded string.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct HandlerResponse {
    #[serde(rename = "statusCode")]
    pub status_code: u16,
    pub body: String,
}

impl HandlerResponse {
    /// Body types are limited to the string-only structs in this module, so
    /// encoding does not fail in practice; if it ever does, the body reports
    /// a `serialization_error` instead.
    pub fn json(status_code: u16, payload: &impl ResponseBody) -> Self {
        let body = serde_json::to_string(payload).unwrap_or_else(|error| {
            json!({
                "error": "serialization_error",
                "message": error.to_string(),
            })
            .to_string()
        });
        Self { status_code, body }
    }

    pub fn error(status_code: u16, error: &HandlerError) -> Self {
        Self::json(
            status_code,
            &ErrorBody {
                error: error.kind().to_string(),
                message: error.to_string(),
            },
        )
    }
}

mod sealed {
    pub trait Sealed {}
}

/// Payloads that may be sent as a [`HandlerResponse`] body.
pub trait ResponseBody: Serialize + sealed::Sealed {}

impl<T: sealed::Sealed + Serialize> ResponseBody for T {}

impl sealed::Sealed for DispatchSummary {}
impl sealed::Sealed for ArchiveSummary {}
impl sealed::Sealed for MissingStateVersion {}
impl sealed::Sealed for ErrorBody {}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ErrorBody {
    pub error: String,
    pub message: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct DispatchedRun {
    pub workspace_id: String,
    pub workspace_name: Option<String>,
    /// `None` when the run-creation response did not include an id.
    pub run_id: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct DispatchSummary {
    pub message: String,
    pub runs: Vec<DispatchedRun>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ArchiveSummary {
    pub message: String,
    pub run_id: String,
    pub state_id: String,
    pub environment: String,
    pub workspace: String,
    pub object_key: String,
    pub content_sha256: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct MissingStateVersion {
    pub message: String,
    pub run_id: String,
}

pub fn content_fingerprint(body: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(body);
    format!("{:x}", hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn create_run_request_references_workspace() {
        let body = create_run_request("ws-123");
        assert_eq!(body["data"]["type"], "runs");
        assert_eq!(
            body["data"]["relationships"]["workspace"]["data"],
            json!({"type": "workspaces", "id": "ws-123"})
        );
    }

    #[test]
    fn decodes_run_completed_envelope() {
        let event = json!({
            "detail": {
                "event": {
                    "run-id": "run-1",
                    "environment": "prod",
                    "workspace": "vpc-core"
                }
            }
        });

        let decoded = RunCompletedEvent::from_envelope(&event).expect("event should decode");
        assert_eq!(decoded.run_id, "run-1");
        assert_eq!(decoded.environment, "prod");
        assert_eq!(decoded.workspace, "vpc-core");
    }

    #[test]
    fn rejects_envelope_missing_run_id() {
        let event = json!({"detail": {"event": {"environment": "prod", "workspace": "w"}}});
        let error = RunCompletedEvent::from_envelope(&event).expect_err("missing run-id");
        assert_eq!(error.kind(), "invalid_event");
        assert!(error.to_string().contains("run-id"));
    }

    #[test]
    fn decodes_run_workspace_relationship() {
        let raw = json!({
            "data": {
                "id": "run-1",
                "type": "runs",
                "attributes": {"status": "applied"},
                "relationships": {
                    "workspace": {"data": {"type": "workspaces", "id": "ws-9"}}
                }
            }
        });

        let run: Document<RunResource> = decode_document("runs/run-1", raw).expect("run decodes");
        assert_eq!(run.data.workspace_id(), "ws-9");
    }

    #[test]
    fn decodes_empty_state_version_list() {
        let raw = json!({"data": [], "meta": {"pagination": {}}});
        let list: Document<Vec<StateVersionResource>> =
            decode_document("state-versions", raw).expect("list decodes");
        assert!(list.data.is_empty());
    }

    #[test]
    fn workspace_without_name_falls_back_for_display() {
        let raw = json!({"data": [{"id": "ws-1"}]});
        let list: Document<Vec<WorkspaceResource>> =
            decode_document("workspaces", raw).expect("list decodes");
        assert_eq!(list.data[0].display_name(), "<unnamed>");
    }

    #[test]
    fn malformed_document_reports_target() {
        let error = decode_document::<TagResource>("tags", json!({"data": {"name": "x"}}))
            .expect_err("missing id");
        assert_eq!(error.kind(), "malformed_response");
        assert!(error.to_string().starts_with("malformed response from tags"));
    }

    #[test]
    fn response_serializes_status_code_in_camel_case() {
        let response = HandlerResponse::json(
            404,
            &MissingStateVersion {
                message: MISSING_STATE_MESSAGE.to_string(),
                run_id: "run-1".to_string(),
            },
        );
        let value = serde_json::to_value(&response).expect("response serializes");
        assert_eq!(
            value,
            json!({
                "statusCode": 404,
                "body": "{\"message\":\"No state version found\",\"run_id\":\"run-1\"}"
            })
        );
    }

    #[test]
    fn error_response_carries_kind_and_message() {
        let response = HandlerResponse::error(400, &HandlerError::not_found("Missing tag 'vpc'"));
        let body: ErrorBody = serde_json::from_str(&response.body).expect("body should parse");
        assert_eq!(response.status_code, 400);
        assert_eq!(
            body,
            ErrorBody {
                error: "not_found".to_string(),
                message: "Missing tag 'vpc'".to_string(),
            }
        );
    }

    #[test]
    fn fingerprint_is_hex_sha256() {
        assert_eq!(
            content_fingerprint(b""),
            "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
        );
    }
}
