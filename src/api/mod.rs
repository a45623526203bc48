//! HTTP surface.
//!
//! Exposes the two user actions (submit an intake, ask a question) as JSON
//! endpoints under `/api/`, plus report download, static illustrations and a
//! health check. Every AI-bound request runs on a blocking worker thread.

pub mod endpoints;
pub mod error;
pub mod extract;
pub mod router;
pub mod server;
pub mod types;

pub use router::api_router;
pub use server::{start_server_on, ApiServer, ServerSession};
pub use types::ApiContext;
