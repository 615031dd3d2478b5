//! Shared workspace-ops domain primitives.
//!
//! This crate owns the control-plane JSON:API contracts, route and query
//! construction, storage key layout and the error taxonomy shared by both
//! handlers. It intentionally excludes AWS SDK, HTTP client and Lambda runtime
//! concerns; those live in `workspace_ops_lambda`.

pub mod api_routes;
pub mod contract;
pub mod error;
pub mod storage_keys;
