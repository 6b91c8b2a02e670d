use axum::body::Bytes;
use axum::http::header::{CACHE_CONTROL, SET_COOKIE};
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Redirect, Response};
use axum::routing::get;
use axum::{Extension, Json, Router};
use serde_json::json;
use time::format_description::well_known::Rfc3339;
use time::OffsetDateTime;
use tracing::info;

use crate::controller::{session_token, AppState};
use crate::helpers::app_error::AppError;
use crate::helpers::form_data::FormData;
use crate::helpers::token_validator::validate_token;
use crate::models::base::FacilityId;
use crate::models::reservation::{dedup_in_order, parse_unix_seconds, ReservationRequest};
use crate::models::selection::BaseSelection;

pub fn router(app_state: AppState) -> Router {
    Router::new()
        .route("/reserve/new", get(session_timer).post(create_reservation))
        .route("/reserve/success", get(reservation_summary))
        .route_layer(Extension(app_state))
}

/// Expiry of the session token, or a bounce back to the code prompt once it is gone.
pub async fn session_timer(
    Extension(app_state): Extension<AppState>,
    headers: HeaderMap,
) -> Response {
    let mut session = app_state.sessions.load(&headers);

    match session.data.token.as_deref().map(validate_token) {
        Some(Ok(claims)) => {
            let now = OffsetDateTime::now_utc().unix_timestamp();
            (
                [(CACHE_CONTROL, "public, max-age=0, must-revalidate")],
                Json(json!({
                    "validUntil": claims.exp,
                    "remainingSeconds": claims.remaining_seconds(now),
                })),
            )
                .into_response()
        }
        Some(Err(e)) => {
            info!("Session token no longer valid: {}", e);
            session.data.token = None;
            let cookie = app_state.sessions.commit(session);
            ([(SET_COOKIE, cookie)], Redirect::to("/reserve")).into_response()
        }
        None => Redirect::to("/reserve").into_response(),
    }
}

fn parse_timestamp(form: &FormData, field: &str) -> Result<i64, AppError> {
    let raw = form
        .first(field)
        .ok_or_else(|| AppError::bad_request(format!("Missing {} field", field)))?;
    parse_unix_seconds(raw)
        .ok_or_else(|| AppError::bad_request(format!("Invalid {} field", field)))
}

pub fn parse_reservation(form: &FormData) -> Result<ReservationRequest, AppError> {
    let group = form
        .first("groups")
        .ok_or_else(|| AppError::bad_request("Missing groups field"))?;
    let start_time = parse_timestamp(form, "startTimestamp")?;
    let end_time = parse_timestamp(form, "endTimestamp")?;

    let facilities = form
        .all("bases")
        .iter()
        .map(|base| base.trim().parse::<FacilityId>())
        .collect::<Result<Vec<_>, _>>()
        .map_err(|_| AppError::bad_request("Invalid bases field"))?;
    let facilities = dedup_in_order(facilities);

    let selection = BaseSelection::from_facilities(&facilities)
        .map_err(|e| AppError::bad_request(e.to_string()))?;

    ReservationRequest::new(group, selection.facility_ids(), start_time, end_time)
        .map_err(|e| AppError::bad_request(e.to_string()))
}

pub async fn create_reservation(
    Extension(app_state): Extension<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Response, AppError> {
    let mut session = app_state.sessions.load(&headers);
    let (token, _) = session_token(&session)?;

    let request = parse_reservation(&FormData::parse(&body))?;
    let result = app_state
        .base_service
        .reserve_bases(&token, &request)
        .await?;

    if !result.is_complete() {
        info!(
            "Reservation for {} partially failed, failed bases: {:?}",
            request.group_name, result.failed
        );
        return Ok((StatusCode::CONFLICT, Json(result)).into_response());
    }

    info!(
        "Reserved {:?} for {} from {} to {}",
        result.reserved, request.group_name, request.start_time, request.end_time
    );
    session.data.reservation = Some(result.reservations);
    let cookie = app_state.sessions.commit(session);

    Ok(([(SET_COOKIE, cookie)], Redirect::to("/reserve/success")).into_response())
}

pub async fn reservation_summary(
    Extension(app_state): Extension<AppState>,
    headers: HeaderMap,
) -> Response {
    let session = app_state.sessions.load(&headers);

    let reservations = match session.data.reservation {
        Some(reservations) if !reservations.is_empty() => reservations,
        _ => return Redirect::to("/").into_response(),
    };

    let facility_ids: Vec<FacilityId> = reservations
        .iter()
        .map(|reservation| reservation.facility_id)
        .collect();
    let bases = app_state.census.bases_by_ids(&facility_ids);

    let first = &reservations[0];
    let start_time = OffsetDateTime::from_unix_timestamp(first.start_time)
        .ok()
        .and_then(|start| start.format(&Rfc3339).ok());

    Json(json!({
        "channel": app_state.config.reservation_channel,
        "groupName": first.group_name,
        "startTime": start_time,
        "bases": bases,
        "reservations": reservations,
    }))
    .into_response()
}
