//! HTTP boundary for producers and consumers
//!
//! Routes:
//! - `POST /command`: queue one command for a (user, device)
//! - `GET /poll`: hand the next pending command to the consumer
//! - `GET /status`: consumer liveness
//! - `GET /pending`: backlog diagnostics
//! - `POST /directives`: queue every directive found in an AI reply

mod error;
mod routes;

pub use error::ApiError;
pub use routes::{router, AppState};
