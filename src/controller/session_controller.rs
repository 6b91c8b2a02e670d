use axum::extract::Query;
use axum::http::header::SET_COOKIE;
use axum::http::HeaderMap;
use axum::response::{IntoResponse, Redirect, Response};
use axum::routing::{get, post};
use axum::{Extension, Json, Router};
use serde::Deserialize;
use serde_json::json;
use tracing::info;

use crate::controller::AppState;
use crate::helpers::app_error::AppError;
use crate::helpers::token_validator::validate_token;

pub fn router(app_state: AppState) -> Router {
    Router::new()
        .route("/reserve", get(redeem_code))
        .route("/logout", post(logout))
        .route_layer(Extension(app_state))
}

#[derive(Deserialize, Clone, Debug)]
pub struct RedeemQuery {
    pub code: Option<String>,
    pub reason: Option<String>,
}

/// Logs the user in, redeeming `code` at the token service when the session
/// does not already hold a valid token minted from that same code.
pub async fn redeem_code(
    Extension(app_state): Extension<AppState>,
    Query(query): Query<RedeemQuery>,
    headers: HeaderMap,
) -> Result<Response, AppError> {
    let mut session = app_state.sessions.load(&headers);
    let channel = app_state.config.reservation_channel.as_str();

    let existing = match session.data.token.as_deref().map(validate_token) {
        Some(Ok(claims)) => Some(claims),
        Some(Err(e)) => {
            info!("Discarding stale session token: {}", e);
            session.data.token = None;
            None
        }
        None => None,
    };

    let code = query
        .code
        .as_deref()
        .map(str::trim)
        .filter(|code| !code.is_empty());

    let mut logged_in = existing.is_some();

    let needs_exchange = match (code, &existing) {
        (Some(code), Some(claims)) => claims.redeem_code() != Some(code),
        (Some(_), None) => true,
        (None, _) => false,
    };

    if let (true, Some(code)) = (needs_exchange, code) {
        let exchange = app_state.token_service.exchange_code(code).await?;

        if let Some(token) = exchange.token {
            if let Err(e) = validate_token(&token) {
                info!("Token service issued an unusable token: {}", e);
                return Ok(Json(json!({
                    "error": "InvalidToken",
                    "message": "The issued token could not be used, please request a new code",
                    "channel": channel,
                }))
                .into_response());
            }
            session.data.token = Some(token);
            logged_in = true;
        } else if let Some(error) = exchange.error {
            info!("Code redemption refused: {}", error.name);
            return Ok(Json(json!({
                "error": error.name,
                "message": error.friendly_message(),
                "channel": channel,
            }))
            .into_response());
        }
    }

    if logged_in {
        let cookie = app_state.sessions.commit(session);
        return Ok(([(SET_COOKIE, cookie)], Redirect::to("/reserve/new")).into_response());
    }

    Ok(Json(json!({
        "channel": channel,
        "reason": query.reason,
    }))
    .into_response())
}

pub async fn logout(
    Extension(app_state): Extension<AppState>,
    headers: HeaderMap,
) -> impl IntoResponse {
    let session = app_state.sessions.load(&headers);
    let cookie = app_state.sessions.destroy(session);
    ([(SET_COOKIE, cookie)], Redirect::to("/reserve"))
}
