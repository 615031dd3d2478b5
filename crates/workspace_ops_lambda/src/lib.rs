//! AWS-oriented adapters and handlers for control-plane workspace operations.
//!
//! This crate owns runtime integration details (Lambda handlers, the
//! control-plane HTTP client, configuration and storage adapters) and exposes a
//! single runtime module boundary for contract, routing and storage key
//! primitives from `workspace_ops_core`.

pub mod adapters;
pub mod config;
pub mod handlers;
pub mod runtime;
