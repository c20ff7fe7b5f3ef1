//! Admin authentication: a shared password exchanged for opaque bearer
//! tokens held in a session store.

pub mod middleware;

use async_trait::async_trait;
use axum::http::{header, HeaderMap};
use chrono::{DateTime, Utc};
use moka::future::Cache;
use sha2::{Digest, Sha256};
use uuid::Uuid;

pub use middleware::{require_admin, AdminToken};

/// Issued admin session
#[derive(Debug, Clone, PartialEq)]
pub struct AdminSession {
    pub issued_at: DateTime<Utc>,
}

/// Where issued admin tokens live
#[async_trait]
pub trait SessionStore: Send + Sync {
    async fn get(&self, token: &str) -> Option<AdminSession>;

    async fn put(&self, token: String, session: AdminSession);

    async fn invalidate(&self, token: &str);
}

/// Process-local session store. Tokens never expire and are lost on restart.
#[derive(Clone)]
pub struct MemorySessionStore {
    sessions: Cache<String, AdminSession>,
}

impl MemorySessionStore {
    pub fn new() -> Self {
        Self {
            sessions: Cache::builder().max_capacity(10_000).build(),
        }
    }
}

impl Default for MemorySessionStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl SessionStore for MemorySessionStore {
    async fn get(&self, token: &str) -> Option<AdminSession> {
        self.sessions.get(token).await
    }

    async fn put(&self, token: String, session: AdminSession) {
        self.sessions.insert(token, session).await;
    }

    async fn invalidate(&self, token: &str) {
        self.sessions.invalidate(token).await;
    }
}

/// Token from an `Authorization: Bearer <token>` header
pub fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|token| !token.is_empty())
}

/// Compare passwords by digest so the comparison time does not depend on
/// how much of the candidate matches.
pub fn password_matches(candidate: &str, expected: &str) -> bool {
    Sha256::digest(candidate.as_bytes()) == Sha256::digest(expected.as_bytes())
}

/// Issue and remember a fresh admin token.
pub async fn issue_token<S: SessionStore + ?Sized>(sessions: &S) -> String {
    let token = Uuid::new_v4().simple().to_string();
    sessions
        .put(
            token.clone(),
            AdminSession {
                issued_at: Utc::now(),
            },
        )
        .await;
    token
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn test_bearer_token_parsing() {
        let mut headers = HeaderMap::new();
        assert_eq!(bearer_token(&headers), None);

        headers.insert(header::AUTHORIZATION, HeaderValue::from_static("Bearer abc123"));
        assert_eq!(bearer_token(&headers), Some("abc123"));

        headers.insert(header::AUTHORIZATION, HeaderValue::from_static("Basic abc123"));
        assert_eq!(bearer_token(&headers), None);

        headers.insert(header::AUTHORIZATION, HeaderValue::from_static("Bearer   "));
        assert_eq!(bearer_token(&headers), None);
    }

    #[test]
    fn test_password_matches() {
        assert!(password_matches("lake-travis", "lake-travis"));
        assert!(!password_matches("lake-travi", "lake-travis"));
        assert!(!password_matches("", "lake-travis"));
    }

    #[tokio::test]
    async fn test_issue_and_invalidate_token() {
        let sessions = MemorySessionStore::new();

        let token = issue_token(&sessions).await;
        assert_eq!(token.len(), 32);
        assert!(sessions.get(&token).await.is_some());

        let other = issue_token(&sessions).await;
        assert_ne!(token, other);

        sessions.invalidate(&token).await;
        assert!(sessions.get(&token).await.is_none());
        assert!(sessions.get(&other).await.is_some());
    }
}
