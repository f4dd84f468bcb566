//! Session-backed authentication.
//!
//! Sessions are opaque random tokens in an in-memory map, carried by an
//! HttpOnly cookie. Handlers receive the authenticated identity through the
//! [`AuthSession`] extractor rather than reading any ambient state; role
//! checks are a plain ordinal comparison on top of it.

use axum::{
    extract::{FromRef, FromRequestParts, State},
    http::{header, request::Parts, HeaderMap, HeaderValue},
    response::{IntoResponse, Response},
    Json,
};
use dashmap::DashMap;
use echhapa_shared::user_store::Role;
use rand::Rng;
use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::{
    error::{ApiError, ApiResult},
    state::AppState,
};

pub const SESSION_COOKIE: &str = "echhapa_session";

/// The authenticated identity for one request.
#[derive(Debug, Clone, Serialize)]
pub struct AuthSession {
    pub user_id: i64,
    pub username: String,
    pub role: Role,
}

impl AuthSession {
    /// Ordinal permission gate: error unless this session's role meets
    /// `required`.
    pub fn require(&self, required: Role) -> Result<(), ApiError> {
        if self.role.has_permission(required) {
            Ok(())
        } else {
            Err(ApiError::Forbidden)
        }
    }
}

/// Token-to-identity map. Process-local; restarting the server logs everyone
/// out, which is acceptable for an editorial tool.
#[derive(Default)]
pub struct SessionStore {
    sessions: DashMap<String, AuthSession>,
}

impl SessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn create(&self, session: AuthSession) -> String {
        let token = generate_token();
        self.sessions.insert(token.clone(), session);
        token
    }

    pub fn get(&self, token: &str) -> Option<AuthSession> {
        self.sessions.get(token).map(|entry| entry.clone())
    }

    pub fn remove(&self, token: &str) {
        self.sessions.remove(token);
    }
}

fn generate_token() -> String {
    let mut rng = rand::thread_rng();
    format!("{:032x}{:032x}", rng.gen::<u128>(), rng.gen::<u128>())
}

fn session_token(headers: &HeaderMap) -> Option<String> {
    let cookies = headers.get(header::COOKIE)?.to_str().ok()?;
    cookies.split(';').find_map(|pair| {
        let (name, value) = pair.trim().split_once('=')?;
        (name == SESSION_COOKIE).then(|| value.to_string())
    })
}

#[axum::async_trait]
impl<S> FromRequestParts<S> for AuthSession
where
    AppState: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let app = AppState::from_ref(state);
        let token = session_token(&parts.headers).ok_or(ApiError::Unauthorized)?;
        app.sessions.get(&token).ok_or(ApiError::Unauthorized)
    }
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

/// `POST /api/auth/login` — verify credentials (username or email) and issue
/// a session cookie.
pub async fn login(
    State(state): State<AppState>,
    Json(request): Json<LoginRequest>,
) -> ApiResult<Response> {
    if request.username.trim().is_empty() || request.password.is_empty() {
        return Err(ApiError::validation("username and password are required"));
    }

    let user = state
        .users
        .authenticate(request.username.trim(), &request.password)?
        .ok_or_else(|| ApiError::validation("invalid credentials"))?;

    let token = state.sessions.create(AuthSession {
        user_id: user.id,
        username: user.username.clone(),
        role: user.role,
    });
    tracing::info!(user = %user.username, "login");

    let body = Json(json!({ "success": true, "user": user }));
    let mut response = body.into_response();
    response.headers_mut().insert(
        header::SET_COOKIE,
        cookie_value(&format!("{SESSION_COOKIE}={token}; HttpOnly; Path=/; SameSite=Lax")),
    );
    Ok(response)
}

/// `POST /api/auth/logout` — drop the session and clear the cookie.
pub async fn logout(State(state): State<AppState>, headers: HeaderMap) -> Response {
    if let Some(token) = session_token(&headers) {
        state.sessions.remove(&token);
    }
    let body = Json(json!({ "success": true }));
    let mut response = body.into_response();
    response.headers_mut().insert(
        header::SET_COOKIE,
        cookie_value(&format!("{SESSION_COOKIE}=; HttpOnly; Path=/; Max-Age=0")),
    );
    response
}

/// `GET /api/auth/me` — the current identity.
pub async fn me(session: AuthSession) -> Json<serde_json::Value> {
    Json(json!({ "success": true, "user": session }))
}

fn cookie_value(value: &str) -> HeaderValue {
    HeaderValue::from_str(value).unwrap_or_else(|_| HeaderValue::from_static(""))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tokens_are_unique_and_opaque() {
        let store = SessionStore::new();
        let session = AuthSession {
            user_id: 1,
            username: "admin".to_string(),
            role: Role::Admin,
        };
        let a = store.create(session.clone());
        let b = store.create(session);
        assert_ne!(a, b);
        assert_eq!(a.len(), 64);
    }

    #[test]
    fn removed_token_no_longer_resolves() {
        let store = SessionStore::new();
        let token = store.create(AuthSession {
            user_id: 7,
            username: "editor".to_string(),
            role: Role::Editor,
        });
        assert!(store.get(&token).is_some());
        store.remove(&token);
        assert!(store.get(&token).is_none());
    }

    #[test]
    fn cookie_header_parsing_finds_our_token() {
        let mut headers = HeaderMap::new();
        headers.insert(
            header::COOKIE,
            HeaderValue::from_static("other=1; echhapa_session=abc123; theme=dark"),
        );
        assert_eq!(session_token(&headers).as_deref(), Some("abc123"));
    }
}
