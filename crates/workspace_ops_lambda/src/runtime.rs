pub use workspace_ops_core::{api_routes, contract, error, storage_keys};
