//! Shared fixtures for handler and repository tests: mocked upstream
//! services, token minting and session helpers.

use std::net::TcpListener;
use std::sync::Arc;

use axum::http::header::{COOKIE, SET_COOKIE};
use axum::http::{HeaderMap, HeaderValue, StatusCode};
use axum::response::Response;
use axum::routing::post;
use axum::{Json, Router};
use jsonwebtoken::{encode, EncodingKey, Header};
use serde_json::{json, Value};
use time::OffsetDateTime;

use crate::config::Config;
use crate::controller::AppState;
use crate::repositories::base_service_repo::BaseServiceRepo;
use crate::repositories::census_repo::CensusRepo;
use crate::repositories::session_repo::{Session, SessionRepo};
use crate::repositories::token_service_repo::TokenServiceRepo;

pub const CHANNEL: &str = "https://discord.gg/ovo-reservations";

/// Facility the mocked base service always refuses.
pub const TAKEN_BASE: u32 = 999;

const CENSUS: &str = r#"{
    "Indar": [
        { "name": "The Crown", "id": 222280 },
        { "name": "Tawrich Tech Plant", "id": 211002 },
        { "name": "Crossroads Watchtower", "id": 222340 },
        { "name": "Indar Excavation", "id": 3430 },
        { "name": "Quartz Ridge Camp", "id": 219 }
    ],
    "Esamir": [{ "name": "Eisa Tech Plant", "id": 211003 }]
}"#;

/// Serves `router` on an ephemeral local port and returns its base url.
pub async fn spawn_upstream(router: Router) -> String {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    let server = axum::Server::from_tcp(listener)
        .unwrap()
        .serve(router.into_make_service());
    tokio::spawn(server);
    format!("http://{}", addr)
}

pub fn token_for(redeem_code: &str, ttl_secs: i64) -> String {
    let exp = OffsetDateTime::now_utc().unix_timestamp() + ttl_secs;
    encode(
        &Header::default(),
        &json!({
            "aud": "OvO",
            "exp": exp,
            "ovo_claims": { "redeem_code": redeem_code },
        }),
        &EncodingKey::from_secret(b"token-service"),
    )
    .unwrap()
}

/// Token service accepting the code `good`. The code `expired` is answered
/// with a token that is already past its expiry. Returns the exchange url.
pub async fn spawn_token_service() -> String {
    let url = spawn_upstream(Router::new().route(
        "/exchange",
        post(|Json(body): Json<Value>| async move {
            match body["code"].as_str() {
                Some(code @ "good") => (StatusCode::OK, Json(json!({ "token": token_for(code, 3_600) }))),
                Some(code @ "expired") => (StatusCode::OK, Json(json!({ "token": token_for(code, -60) }))),
                _ => (
                    StatusCode::BAD_REQUEST,
                    Json(json!({ "error": { "name": "CodeNoLongerValid" } })),
                ),
            }
        }),
    ))
    .await;
    format!("{}/exchange", url)
}

/// Base service that books everything except [`TAKEN_BASE`]. Returns the service url.
pub async fn spawn_base_service() -> String {
    let url = spawn_upstream(Router::new().route(
        "/bases",
        post(|Json(body): Json<Value>| async move {
            let record = |id: &Value| {
                json!({
                    "facility_id": id,
                    "group_name": body["group_name"],
                    "start_time": body["start_time"],
                    "end_time": body["end_time"],
                })
            };
            let ids = body["facility_ids"].as_array().cloned().unwrap_or_default();
            let (open, taken): (Vec<Value>, Vec<Value>) =
                ids.into_iter().partition(|id| *id != json!(TAKEN_BASE));
            let open: Vec<Value> = open.iter().map(record).collect();
            let taken: Vec<Value> = taken.iter().map(record).collect();

            if body["request_type"] == "availability" {
                Json(json!({ "result": { "possible_reservations": open, "denied_reservations": taken } }))
            } else {
                Json(json!({ "result": { "succeeded_reservations": open, "failed_reservations": taken } }))
            }
        }),
    ))
    .await;
    format!("{}/bases", url)
}

pub async fn test_state(base_service: &str, token_service: &str) -> AppState {
    let config = Config {
        environment: "development".to_string(),
        listen_addr: "127.0.0.1:0".parse().unwrap(),
        origin_urls: "http://localhost:3000".to_string(),
        base_service: base_service.to_string(),
        token_service: token_service.to_string(),
        reservation_channel: CHANNEL.to_string(),
        cookie_secret: "cookie-secret".to_string(),
        session_max_age_secs: 1_800,
        census_path: "unused.json".into(),
    };
    let client = reqwest::Client::new();

    AppState {
        base_service: Arc::new(BaseServiceRepo::new(client.clone(), base_service).unwrap()),
        token_service: Arc::new(TokenServiceRepo::new(client, token_service).unwrap()),
        census: Arc::new(CensusRepo::from_json(CENSUS).unwrap()),
        sessions: Arc::new(SessionRepo::new(
            &config.cookie_secret,
            config.session_max_age_secs,
            config.secure_cookies(),
        )),
        config: Arc::new(config),
    }
}

/// `name=value` part of the response's session cookie.
pub fn cookie_pair(response: &Response) -> String {
    response.headers()[SET_COOKIE]
        .to_str()
        .unwrap()
        .split(';')
        .next()
        .unwrap()
        .to_string()
}

/// Stores a session holding `token` and returns the cookie pair naming it.
pub fn login(state: &AppState, token: &str) -> String {
    let mut session = Session::default();
    session.data.token = Some(token.to_string());
    let set_cookie = state.sessions.commit(session);
    set_cookie.split(';').next().unwrap().to_string()
}

pub fn session_token_of(state: &AppState, cookie: &str) -> Option<String> {
    let mut headers = HeaderMap::new();
    headers.insert(COOKIE, HeaderValue::from_str(cookie).unwrap());
    state.sessions.load(&headers).data.token
}

pub async fn json_body(response: Response) -> Value {
    let bytes = hyper::body::to_bytes(response.into_body()).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}
