use std::sync::Arc;

use anyhow::Context;
use axum::handler::HandlerWithoutStateExt;
use axum::http::HeaderValue;
use axum::Router;
use reqwest::header::{AUTHORIZATION, CONTENT_TYPE};
use reqwest::Method;
use tower::ServiceBuilder;
use tower_http::compression::CompressionLayer;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::config::Config;
use crate::helpers::app_error::AppError;
use crate::helpers::handler_404::page_not_found_handler;
use crate::helpers::token_validator::validate_token;
use crate::models::token::TokenClaims;
use crate::repositories::base_service_repo::BaseServiceRepo;
use crate::repositories::census_repo::CensusRepo;
use crate::repositories::session_repo::{Session, SessionRepo};
use crate::repositories::token_service_repo::TokenServiceRepo;

pub mod bases_controller;
pub mod health_check;
pub mod reservation_controller;
pub mod session_controller;

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub base_service: Arc<BaseServiceRepo>,
    pub token_service: Arc<TokenServiceRepo>,
    pub census: Arc<CensusRepo>,
    pub sessions: Arc<SessionRepo>,
}

pub async fn serve(app_state: AppState, config: &Config) -> anyhow::Result<()> {
    let origins = config
        .origins()
        .map(|origin| {
            origin
                .parse::<HeaderValue>()
                .with_context(|| format!("Invalid origin url: {}", origin))
        })
        .collect::<anyhow::Result<Vec<HeaderValue>>>()?;

    let application = router_endpoints(app_state)
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(
                    CorsLayer::new()
                        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
                        .allow_origin(origins)
                        .allow_headers([AUTHORIZATION, CONTENT_TYPE])
                        .allow_credentials(true),
                )
                .layer(CompressionLayer::new()),
        )
        .fallback_service(page_not_found_handler.into_service());

    info!("API server listening on: {}", config.listen_addr);
    axum::Server::bind(&config.listen_addr)
        .serve(application.into_make_service())
        .await
        .context("Error spinning up the API server")
}

pub fn router_endpoints(app_state: AppState) -> Router {
    health_check::router()
        .merge(session_controller::router(app_state.clone()))
        .merge(reservation_controller::router(app_state.clone()))
        .merge(bases_controller::router(app_state))
}

/// The session's token, provided it still passes validation.
pub fn session_token(session: &Session) -> Result<(String, TokenClaims), AppError> {
    let token = session.data.token.as_deref().ok_or(AppError::Unauthorized)?;

    match validate_token(token) {
        Ok(claims) => Ok((token.to_string(), claims)),
        Err(e) => {
            info!("Rejecting session token: {}", e);
            Err(AppError::Unauthorized)
        }
    }
}
