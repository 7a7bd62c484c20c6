use super::handlers;
use crate::kyc::KycWorkflow;
use axum::routing::{get, post};
use axum::Router;
use log::info;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tower::ServiceBuilder;
use tower_http::cors::{Any, CorsLayer};

/// Shared state injected into every handler.
#[derive(Clone)]
pub struct AppState {
    pub workflow: Arc<KycWorkflow>,
}

pub fn build_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/health", get(handlers::status::health))
        .route(
            "/api/v1/kyc/aadhaar/otp",
            post(handlers::verification::initiate_aadhaar),
        )
        .route(
            "/api/v1/kyc/aadhaar/verify",
            post(handlers::verification::submit_aadhaar),
        )
        .route(
            "/api/v1/kyc/aadhaar/resend",
            post(handlers::verification::resend_aadhaar),
        )
        .route(
            "/api/v1/kyc/pan/verify",
            post(handlers::verification::verify_pan),
        )
        .route(
            "/api/v1/kyc/bank/verify",
            post(handlers::verification::check_bank_linkage),
        )
        .route(
            "/api/v1/kyc/status/:user_id",
            get(handlers::verification::kyc_status),
        )
        .layer(ServiceBuilder::new().layer(cors))
        .with_state(state)
}

pub async fn run(addr: SocketAddr, state: AppState) -> anyhow::Result<()> {
    let listener = TcpListener::bind(addr).await?;
    info!("API server listening on {addr}");
    axum::serve(listener, build_router(state)).await?;
    Ok(())
}
