pub mod admin;
pub mod auth;
pub mod error;
pub mod messages;
pub mod middleware;
pub mod moderation;
pub mod routes;

pub use auth::{AdminCredentials, AppState, AppStateInner};
pub use error::ApiError;
pub use routes::router;
