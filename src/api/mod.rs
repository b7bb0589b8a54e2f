//! API module
//!
//! HTTP endpoints and middleware.

pub mod middleware;
pub mod rate_limit;
pub mod routes;
pub mod state;
pub mod token;

pub use routes::create_router;
pub use state::AppState;
