//! HTTP surface for the onboarding workflow.

pub mod errors;
pub mod handlers;
pub mod server;

pub use self::server::AppState;
