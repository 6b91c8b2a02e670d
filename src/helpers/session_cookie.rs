use axum::http::header::COOKIE;
use axum::http::HeaderMap;
use cookie::time::Duration;
use cookie::{Cookie, CookieJar, Key, SameSite};
use sha2::{Digest, Sha512};

pub const SESSION_COOKIE: &str = "__OvOsession";

/// Signing key for session cookies. Any secret length is accepted; it is
/// stretched to the 64 bytes `Key` needs.
pub fn session_key(secret: &str) -> Key {
    Key::from(Sha512::digest(secret.as_bytes()).as_slice())
}

fn request_jar(headers: &HeaderMap) -> CookieJar {
    let mut jar = CookieJar::new();
    headers
        .get_all(COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| Cookie::split_parse(value.to_string()))
        .filter_map(Result::ok)
        .for_each(|cookie| jar.add_original(cookie));
    jar
}

/// Session id carried by the request's session cookie, if its signature holds.
pub fn read_session_id(headers: &HeaderMap, key: &Key) -> Option<String> {
    request_jar(headers)
        .signed(key)
        .get(SESSION_COOKIE)
        .map(|cookie| cookie.value().to_string())
        .filter(|session_id| !session_id.is_empty())
}

fn build(value: String, max_age_secs: i64, secure: bool) -> Cookie<'static> {
    Cookie::build((SESSION_COOKIE, value))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Strict)
        .max_age(Duration::seconds(max_age_secs))
        .secure(secure)
        .build()
}

/// `Set-Cookie` value carrying the signed `session_id`.
pub fn session_cookie(key: &Key, session_id: &str, max_age_secs: i64, secure: bool) -> String {
    let mut jar = CookieJar::new();
    jar.signed_mut(key)
        .add(build(session_id.to_string(), max_age_secs, secure));
    jar.get(SESSION_COOKIE)
        .map(|cookie| cookie.to_string())
        .unwrap_or_default()
}

/// `Set-Cookie` value that makes the browser forget the session cookie.
pub fn removal_cookie(secure: bool) -> String {
    build(String::new(), 0, secure).to_string()
}
