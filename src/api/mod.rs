//! HTTP API.
//!
//! Routes are nested under `/api/`. Public routes need no credentials;
//! `/api/auth/*` routes require an access token, and
//! `/api/auth/admin/*` additionally requires the admin role.
//!
//! The router is composable: `api_router()` returns a `Router` that can
//! be mounted on any axum server instance.

pub mod endpoints;
pub mod error;
pub mod middleware;
pub mod router;
pub mod server;
pub mod types;

pub use error::ApiError;
pub use router::api_router;
pub use server::{start_server, start_server_on, ApiServer};
pub use types::ApiContext;
