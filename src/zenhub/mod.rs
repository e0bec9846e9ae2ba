//! Client for the ZenHub sprint-data RPC exposed by the Frappe backend,
//! plus the canonical payload types the rest of the application works with.

pub mod api_types;
pub mod cached_client;
pub mod client;
pub mod types;
