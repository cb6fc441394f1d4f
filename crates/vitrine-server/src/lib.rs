//! HTTP surface over the theme pipeline.
//!
//! Authentication, CSRF, and authorization live in front of this router;
//! every handler assumes an already-authorized caller. Responses carry a
//! concise reason string sufficient to fix a rejected archive; scanner and
//! filesystem details stay in the server logs.

pub use config::ServerConfig;
pub use error::ApiError;
pub use http::build_router;

mod config;
mod error;
mod http;
