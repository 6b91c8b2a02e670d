use std::sync::Arc;
use std::time::Duration;

use axum::http::HeaderMap;
use cookie::Key;
use dashmap::DashMap;
use time::OffsetDateTime;
use tokio::task::JoinHandle;
use tracing::debug;
use uuid::Uuid;

use crate::helpers::session_cookie;
use crate::models::reservation::Reservation;

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SessionData {
    pub token: Option<String>,
    /// Last fully successful reservation
    pub reservation: Option<Vec<Reservation>>,
}

#[derive(Clone, Debug, Default)]
pub struct Session {
    id: Option<String>,
    pub data: SessionData,
}

struct StoredSession {
    data: SessionData,
    expires_at: i64,
}

/// Server side sessions addressed by a signed cookie. Entries live for
/// `max_age_secs` after their last commit.
pub struct SessionRepo {
    sessions: DashMap<String, StoredSession>,
    key: Key,
    max_age_secs: i64,
    secure: bool,
}

fn now() -> i64 {
    OffsetDateTime::now_utc().unix_timestamp()
}

impl SessionRepo {
    pub fn new(secret: &str, max_age_secs: i64, secure: bool) -> Self {
        Self {
            sessions: DashMap::new(),
            key: session_cookie::session_key(secret),
            max_age_secs,
            secure,
        }
    }

    /// Session named by the request cookie, or a fresh one when the cookie is
    /// missing, forged or expired.
    pub fn load(&self, headers: &HeaderMap) -> Session {
        self.load_at(headers, now())
    }

    fn load_at(&self, headers: &HeaderMap, now: i64) -> Session {
        let Some(session_id) = session_cookie::read_session_id(headers, &self.key) else {
            return Session::default();
        };

        let expired = match self.sessions.get(&session_id) {
            Some(stored) if stored.expires_at > now => {
                return Session {
                    id: Some(session_id.clone()),
                    data: stored.data.clone(),
                }
            }
            Some(_) => true,
            None => false,
        };

        if expired {
            debug!("Dropping expired session {}", session_id);
            self.sessions.remove(&session_id);
        }
        Session::default()
    }

    /// Stores the session and returns the `Set-Cookie` value for it.
    pub fn commit(&self, session: Session) -> String {
        self.commit_at(session, now())
    }

    fn commit_at(&self, session: Session, now: i64) -> String {
        let session_id = session
            .id
            .unwrap_or_else(|| Uuid::new_v4().to_string());

        self.sessions.insert(
            session_id.clone(),
            StoredSession {
                data: session.data,
                expires_at: now + self.max_age_secs,
            },
        );

        session_cookie::session_cookie(&self.key, &session_id, self.max_age_secs, self.secure)
    }

    /// Forgets the session and returns a `Set-Cookie` value clearing it.
    pub fn destroy(&self, session: Session) -> String {
        if let Some(session_id) = session.id {
            self.sessions.remove(&session_id);
        }
        session_cookie::removal_cookie(self.secure)
    }

    pub fn purge_expired(&self) -> usize {
        self.purge_expired_at(now())
    }

    fn purge_expired_at(&self, now: i64) -> usize {
        // len() is not stable while other requests commit
        let mut purged = 0;
        self.sessions.retain(|_, stored| {
            let keep = stored.expires_at > now;
            if !keep {
                purged += 1;
            }
            keep
        });
        purged
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    /// Periodically drops sessions nobody came back for.
    pub fn spawn_sweeper(self: Arc<Self>, every: Duration) -> JoinHandle<()> {
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(every);
            loop {
                interval.tick().await;
                let purged = self.purge_expired();
                if purged > 0 {
                    debug!("Purged {} expired sessions", purged);
                }
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use axum::http::header::COOKIE;
    use axum::http::HeaderValue;

    use super::*;

    fn cookie_headers(set_cookie: &str) -> HeaderMap {
        let pair = set_cookie.split(';').next().unwrap();
        let mut headers = HeaderMap::new();
        headers.insert(COOKIE, HeaderValue::from_str(pair).unwrap());
        headers
    }

    #[test]
    fn committed_session_round_trips_through_cookie() {
        let repo = SessionRepo::new("secret", 60, false);
        let mut session = repo.load(&HeaderMap::new());
        session.data.token = Some("jwt".to_string());

        let set_cookie = repo.commit(session);
        let loaded = repo.load(&cookie_headers(&set_cookie));

        assert_eq!(loaded.data.token.as_deref(), Some("jwt"));
        assert_eq!(repo.len(), 1);
    }

    #[test]
    fn foreign_secret_does_not_resolve() {
        let repo = SessionRepo::new("secret", 60, false);
        let other = SessionRepo::new("other", 60, false);
        let mut session = Session::default();
        session.data.token = Some("jwt".to_string());

        let set_cookie = other.commit(session);
        assert_eq!(repo.load(&cookie_headers(&set_cookie)).data, SessionData::default());
    }

    #[test]
    fn sessions_expire() {
        let repo = SessionRepo::new("secret", 60, false);
        let mut session = Session::default();
        session.data.token = Some("jwt".to_string());

        let set_cookie = repo.commit_at(session, 1_000);
        let headers = cookie_headers(&set_cookie);

        assert!(repo.load_at(&headers, 1_059).data.token.is_some());
        assert!(repo.load_at(&headers, 1_060).data.token.is_none());
        assert_eq!(repo.len(), 0);
    }

    #[test]
    fn purge_drops_only_expired_sessions() {
        let repo = SessionRepo::new("secret", 60, false);
        repo.commit_at(Session::default(), 1_000);
        repo.commit_at(Session::default(), 2_000);

        assert_eq!(repo.purge_expired_at(1_500), 1);
        assert_eq!(repo.len(), 1);
    }

    #[test]
    fn purge_counts_only_its_own_removals_under_concurrent_commits() {
        let repo = SessionRepo::new("secret", 60, false);

        std::thread::scope(|scope| {
            let committer = scope.spawn(|| {
                for _ in 0..20_000 {
                    repo.commit_at(Session::default(), 10_000);
                }
            });
            while !committer.is_finished() {
                assert_eq!(repo.purge_expired_at(0), 0);
            }
        });

        assert_eq!(repo.len(), 20_000);
        assert_eq!(repo.purge_expired_at(20_000), 20_000);
    }

    #[test]
    fn destroy_clears_cookie_and_entry() {
        let repo = SessionRepo::new("secret", 60, true);
        let set_cookie = repo.commit(Session::default());
        let session = repo.load(&cookie_headers(&set_cookie));

        let cleared = repo.destroy(session);

        assert_eq!(repo.len(), 0);
        assert!(cleared.starts_with("__OvOsession=;"));
        assert!(cleared.contains("Max-Age=0"));
    }
}
