//! Control-plane routes and list filters used by the handlers.
//!
//! Routes are relative to the API base (`https://<host>/api/iacp/v3`); query
//! pairs are returned unencoded and left to the HTTP client to escape.

pub const API_BASE_PATH: &str = "api/iacp/v3";
pub const TAGS_ROUTE: &str = "tags";
pub const WORKSPACES_ROUTE: &str = "workspaces";
pub const RUNS_ROUTE: &str = "runs";
pub const STATE_VERSIONS_ROUTE: &str = "state-versions";
pub const PRODUCTION_ENVIRONMENT_TYPE: &str = "production";

pub type QueryPairs = Vec<(&'static str, String)>;

/// The API is always reached over HTTPS; a scheme on `hostname` is dropped.
pub fn api_base_url(hostname: &str) -> String {
    let hostname = hostname.trim();
    let host = ["https://", "http://"]
        .iter()
        .find_map(|scheme| hostname.strip_prefix(scheme))
        .unwrap_or(hostname)
        .trim_end_matches('/');
    format!("https://{host}/{API_BASE_PATH}")
}

pub fn route_url(base_url: &str, route: &str) -> String {
    format!(
        "{}/{}",
        base_url.trim_end_matches('/'),
        route.trim_start_matches('/')
    )
}

pub fn run_route(run_id: &str) -> String {
    format!("{RUNS_ROUTE}/{run_id}")
}

/// `filter[name]=in:<names>`; `names` may be a single tag or a comma-separated list.
pub fn tag_name_filter(names: &str) -> QueryPairs {
    vec![("filter[name]", format!("in:{names}"))]
}

pub fn production_workspaces_filter(tag_id: &str) -> QueryPairs {
    vec![
        ("filter[tag]", tag_id.to_string()),
        (
            "filter[environment-type]",
            PRODUCTION_ENVIRONMENT_TYPE.to_string(),
        ),
    ]
}

/// Single-page lookup of the state version a run produced in a workspace.
pub fn run_state_version_filter(workspace_id: &str, run_id: &str) -> QueryPairs {
    vec![
        ("filter[workspace]", workspace_id.to_string()),
        ("filter[run]", run_id.to_string()),
        ("page[size]", "1".to_string()),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn base_url_targets_iacp_v3_over_https() {
        assert_eq!(
            api_base_url("acme.scalr.io"),
            "https://acme.scalr.io/api/iacp/v3"
        );
        assert_eq!(
            api_base_url("https://acme.scalr.io/"),
            "https://acme.scalr.io/api/iacp/v3"
        );
    }

    #[test]
    fn plain_http_scheme_is_upgraded_to_https() {
        assert_eq!(
            api_base_url("http://acme.scalr.io"),
            "https://acme.scalr.io/api/iacp/v3"
        );
        assert_eq!(
            api_base_url(" http://acme.scalr.io/ "),
            "https://acme.scalr.io/api/iacp/v3"
        );
    }

    #[test]
    fn route_url_joins_with_single_slash() {
        assert_eq!(
            route_url("https://h/api/iacp/v3/", "/runs/run-1"),
            "https://h/api/iacp/v3/runs/run-1"
        );
    }

    #[test]
    fn tag_filter_uses_in_operator() {
        assert_eq!(
            tag_name_filter("vpc,network"),
            vec![("filter[name]", "in:vpc,network".to_string())]
        );
    }

    #[test]
    fn workspace_filter_pins_production_environment_type() {
        let query = production_workspaces_filter("tag-7");
        assert_eq!(
            query,
            vec![
                ("filter[tag]", "tag-7".to_string()),
                ("filter[environment-type]", "production".to_string()),
            ]
        );
    }

    #[test]
    fn state_version_filter_requests_one_result() {
        let query = run_state_version_filter("ws-1", "run-1");
        assert!(query.contains(&("page[size]", "1".to_string())));
        assert!(query.contains(&("filter[workspace]", "ws-1".to_string())));
        assert!(query.contains(&("filter[run]", "run-1".to_string())));
    }
}
