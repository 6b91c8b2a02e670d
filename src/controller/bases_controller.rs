use axum::extract::Query;
use axum::http::header::CACHE_CONTROL;
use axum::http::HeaderMap;
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Extension, Json, Router};
use serde::Deserialize;
use serde_json::json;
use serde_with::formats::CommaSeparator;
use serde_with::{serde_as, StringWithSeparator};

use crate::controller::{session_token, AppState};
use crate::helpers::app_error::AppError;
use crate::models::base::{Continent, FacilityId};
use crate::models::reservation::{dedup_in_order, parse_unix_seconds, AvailabilityMap};

pub fn router(app_state: AppState) -> Router {
    Router::new()
        .route("/bases", get(get_continent_bases))
        .route("/bases/availability", get(get_bases_availability))
        .route_layer(Extension(app_state))
}

#[derive(Deserialize, Clone, Debug)]
pub struct ContinentQuery {
    pub continent: Option<String>,
}

fn parse_continent(raw: &str) -> Result<Continent, AppError> {
    raw.parse::<Continent>()
        .map_err(|e| AppError::bad_request(e.to_string()))
}

pub async fn get_continent_bases(
    Extension(app_state): Extension<AppState>,
    Query(query): Query<ContinentQuery>,
) -> Result<Response, AppError> {
    let continent = match query.continent.as_deref() {
        Some(raw) => parse_continent(raw)?,
        None => Continent::default(),
    };

    Ok((
        [(CACHE_CONTROL, "max-age=3600")],
        Json(json!({
            "continent": continent,
            "zoneId": continent.zone_id(),
            "bases": app_state.census.continent_bases(continent),
        })),
    )
        .into_response())
}

#[serde_as]
#[derive(Deserialize, Clone, Debug)]
pub struct AvailabilityQuery {
    #[serde_as(as = "Option<StringWithSeparator::<CommaSeparator, FacilityId>>")]
    #[serde(default)]
    pub bases: Option<Vec<FacilityId>>,
    pub continent: Option<String>,
    pub from: Option<String>,
    pub to: Option<String>,
}

fn parse_window_edge(raw: Option<&str>, name: &str) -> Result<i64, AppError> {
    let raw = raw.ok_or_else(|| AppError::bad_request(format!("Missing {} parameter", name)))?;
    parse_unix_seconds(raw)
        .ok_or_else(|| AppError::bad_request(format!("Invalid {} parameter", name)))
}

/// Whether each base named in `bases`, or belonging to `continent`, can be
/// reserved between `from` and `to`.
pub async fn get_bases_availability(
    Extension(app_state): Extension<AppState>,
    Query(query): Query<AvailabilityQuery>,
    headers: HeaderMap,
) -> Result<Json<AvailabilityMap>, AppError> {
    let session = app_state.sessions.load(&headers);
    let (token, _) = session_token(&session)?;

    if query.bases.is_none() && query.continent.is_none() {
        return Err(AppError::bad_request("Missing bases or continent parameter"));
    }
    let from = parse_window_edge(query.from.as_deref(), "from")?;
    let to = parse_window_edge(query.to.as_deref(), "to")?;
    if to <= from {
        return Err(AppError::bad_request("to must be after from"));
    }

    let mut facility_ids = query.bases.unwrap_or_default();
    if let Some(raw) = query.continent.as_deref() {
        let continent = parse_continent(raw)?;
        facility_ids.extend(
            app_state
                .census
                .continent_bases(continent)
                .iter()
                .map(|base| base.id),
        );
    }
    let facility_ids = dedup_in_order(facility_ids);

    if facility_ids.is_empty() {
        return Ok(Json(AvailabilityMap::new()));
    }

    let availability = app_state
        .base_service
        .check_availability(&token, &facility_ids, from, to)
        .await?;

    Ok(Json(availability))
}
