pub mod control_plane;
pub mod object_store;
