use reqwest::blocking::{Client, RequestBuilder, Response};
use reqwest::header::{ACCEPT, CONTENT_TYPE};
use reqwest::StatusCode;
use serde_json::Value;

use crate::config::ControlPlaneConfig;
use crate::runtime::api_routes::route_url;
use crate::runtime::error::HandlerError;

pub const JSON_API_CONTENT_TYPE: &str = "application/vnd.api+json";

const DOWNLOAD_TARGET: &str = "state download";

/// Authenticated access to the control-plane REST API.
pub trait ControlPlane {
    /// `GET <route>?<query>`; only `200 OK` counts as success.
    fn get(&self, route: &str, query: &[(&str, String)]) -> Result<Value, HandlerError>;

    /// `POST <route>` with a JSON:API body; `200` and `201` count as success.
    fn post(&self, route: &str, body: &Value) -> Result<Value, HandlerError>;

    /// Fetch a self-authorizing link (e.g. a state download URL) without the API token.
    fn download(&self, url: &str) -> Result<Vec<u8>, HandlerError>;
}

/// Blocking HTTP client for the control plane.
///
/// Built once per invocation; connections close when it is dropped.
pub struct HttpControlPlane {
    client: Client,
    base_url: String,
    token: String,
}

impl HttpControlPlane {
    pub fn new(config: &ControlPlaneConfig) -> Result<Self, HandlerError> {
        Self::with_base_url(config.api_base_url(), &config.token)
    }

    pub fn with_base_url(base_url: impl Into<String>, token: &str) -> Result<Self, HandlerError> {
        let client = Client::builder().build().map_err(|error| {
            HandlerError::upstream(
                "control plane",
                None,
                format!("failed to build HTTP client: {error}"),
            )
        })?;

        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            token: token.to_string(),
        })
    }

    fn authorized(&self, request: RequestBuilder) -> RequestBuilder {
        request
            .bearer_auth(&self.token)
            .header(CONTENT_TYPE, JSON_API_CONTENT_TYPE)
            .header(ACCEPT, JSON_API_CONTENT_TYPE)
    }
}

impl ControlPlane for HttpControlPlane {
    fn get(&self, route: &str, query: &[(&str, String)]) -> Result<Value, HandlerError> {
        let url = route_url(&self.base_url, route);
        let mut request = self.authorized(self.client.get(url));
        if !query.is_empty() {
            request = request.query(query);
        }

        let response = request
            .send()
            .map_err(|error| HandlerError::upstream(route, None, error.to_string()))?;
        read_json(route, response, &[StatusCode::OK])
    }

    fn post(&self, route: &str, body: &Value) -> Result<Value, HandlerError> {
        let url = route_url(&self.base_url, route);
        let response = self
            .authorized(self.client.post(url))
            .body(body.to_string())
            .send()
            .map_err(|error| HandlerError::upstream(route, None, error.to_string()))?;
        read_json(route, response, &[StatusCode::OK, StatusCode::CREATED])
    }

    fn download(&self, url: &str) -> Result<Vec<u8>, HandlerError> {
        // Download links are pre-signed and may embed credentials; never echo them.
        let response = self
            .client
            .get(url)
            .send()
            .map_err(|error| HandlerError::upstream(DOWNLOAD_TARGET, None, error.to_string()))?;

        let status = response.status();
        if status != StatusCode::OK {
            let body = response.text().unwrap_or_default();
            return Err(HandlerError::upstream(
                DOWNLOAD_TARGET,
                Some(status.as_u16()),
                format!("failed to download state file: {body}"),
            ));
        }

        response.bytes().map(|bytes| bytes.to_vec()).map_err(|error| {
            HandlerError::upstream(
                DOWNLOAD_TARGET,
                Some(status.as_u16()),
                format!("failed to read state file: {error}"),
            )
        })
    }
}

fn read_json(
    target: &str,
    response: Response,
    accepted: &[StatusCode],
) -> Result<Value, HandlerError> {
    let status = response.status();
    let body = response.text().map_err(|error| {
        HandlerError::upstream(
            target,
            Some(status.as_u16()),
            format!("failed to read response body: {error}"),
        )
    })?;

    if !accepted.contains(&status) {
        return Err(HandlerError::upstream(target, Some(status.as_u16()), body));
    }

    serde_json::from_str(&body).map_err(|error| HandlerError::malformed(target, error.to_string()))
}
