//! Status and control HTTP surface

pub mod auth;
pub mod handlers;
pub mod routes;
pub mod state;

pub use auth::AdminAuth;
pub use routes::create_router;
pub use state::AppState;
