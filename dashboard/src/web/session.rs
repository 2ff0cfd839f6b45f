//! Server-side sessions.
//!
//! The browser holds a signed token naming a session id; the session itself
//! (who is signed in, pending flash messages) lives in [`SessionManager`].
//! Dropping a record from the store ends the session even if its token has
//! not expired yet.

use std::marker::PhantomData;

use axum::{
    extract::{FromRef, FromRequestParts},
    http::{HeaderMap, HeaderValue, header, header::InvalidHeaderValue, request::Parts},
    response::{IntoResponse, Redirect, Response},
};
use chrono::Utc;
use dashmap::DashMap;
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use sea_orm::EntityTrait;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{ApiErr, AppState, routes};
use crate::config::{MAX_SESSION_TTL_HOURS, SessionConfig};
use crate::entity::user::{self, UserType};

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Claims {
    /// Session id
    pub sid: Uuid,
    /// Unix timestamp expiry
    pub exp: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Level {
    Info,
    Success,
    Error,
}

/// A one-shot message shown on the next page the session renders.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FlashMessage {
    pub level: Level,
    pub text: String,
}

impl FlashMessage {
    pub fn success(text: impl Into<String>) -> Self {
        Self {
            level: Level::Success,
            text: text.into(),
        }
    }

    pub fn error(text: impl Into<String>) -> Self {
        Self {
            level: Level::Error,
            text: text.into(),
        }
    }
}

#[derive(Debug, Clone)]
struct SessionRecord {
    user_id: Option<Uuid>,
    messages: Vec<FlashMessage>,
    expires_at: u64,
}

/// A freshly issued session and the cookie value that names it.
#[derive(Debug, Clone)]
pub struct IssuedSession {
    pub id: Uuid,
    pub token: String,
}

pub struct SessionManager {
    records: DashMap<Uuid, SessionRecord>,
    config: SessionConfig,
}

impl SessionManager {
    pub fn new(config: SessionConfig) -> Self {
        Self {
            records: DashMap::new(),
            config,
        }
    }

    pub fn cookie_name(&self) -> &str {
        &self.config.cookie_name
    }

    fn now() -> u64 {
        Utc::now().timestamp().max(0) as u64
    }

    /// Session lifetime in seconds, capped at [`MAX_SESSION_TTL_HOURS`].
    fn ttl_secs(&self) -> u64 {
        self.config.ttl_hours.min(MAX_SESSION_TTL_HOURS) * 3600
    }

    /// Start a new session, optionally bound to a user, seeded with messages.
    pub fn issue(
        &self,
        user_id: Option<Uuid>,
        messages: Vec<FlashMessage>,
    ) -> Result<IssuedSession, jsonwebtoken::errors::Error> {
        self.purge_expired();

        let id = Uuid::new_v4();
        let exp = Self::now().saturating_add(self.ttl_secs());
        let token = encode(
            &Header::default(),
            &Claims { sid: id, exp },
            &EncodingKey::from_secret(self.config.secret.as_bytes()),
        )?;
        self.records.insert(
            id,
            SessionRecord {
                user_id,
                messages,
                expires_at: exp,
            },
        );
        Ok(IssuedSession { id, token })
    }

    /// Map a cookie token to a live session id. Forged, expired and
    /// destroyed sessions all come back as `None`.
    pub fn resolve(&self, token: &str) -> Option<Uuid> {
        let data = decode::<Claims>(
            token,
            &DecodingKey::from_secret(self.config.secret.as_bytes()),
            &Validation::new(Algorithm::HS256),
        )
        .ok()?;
        let sid = data.claims.sid;
        let live = self
            .records
            .get(&sid)
            .is_some_and(|r| r.expires_at > Self::now());
        live.then_some(sid)
    }

    pub fn user_id(&self, sid: Uuid) -> Option<Uuid> {
        self.records.get(&sid).and_then(|r| r.user_id)
    }

    pub fn push_message(&self, sid: Uuid, message: FlashMessage) {
        if let Some(mut record) = self.records.get_mut(&sid) {
            record.messages.push(message);
        }
    }

    pub fn take_messages(&self, sid: Uuid) -> Vec<FlashMessage> {
        self.records
            .get_mut(&sid)
            .map(|mut r| std::mem::take(&mut r.messages))
            .unwrap_or_default()
    }

    /// Remove a session and return whatever messages it still held.
    pub fn destroy(&self, sid: Uuid) -> Vec<FlashMessage> {
        self.records
            .remove(&sid)
            .map(|(_, r)| r.messages)
            .unwrap_or_default()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    fn purge_expired(&self) {
        let now = Self::now();
        self.records.retain(|_, r| r.expires_at > now);
    }

    pub fn set_cookie(&self, token: &str) -> Result<HeaderValue, InvalidHeaderValue> {
        let mut cookie = format!(
            "{}={}; Path=/; HttpOnly; SameSite=Lax; Max-Age={}",
            self.config.cookie_name,
            token,
            self.ttl_secs()
        );
        if self.config.cookie_secure {
            cookie.push_str("; Secure");
        }
        HeaderValue::from_str(&cookie)
    }

    /// Session token from the cookie. Other headers never carry a session.
    pub fn token_from_headers<'a>(&self, headers: &'a HeaderMap) -> Option<&'a str> {
        headers
            .get_all(header::COOKIE)
            .iter()
            .filter_map(|h| h.to_str().ok())
            .flat_map(|h| h.split(';'))
            .filter_map(|pair| pair.trim().split_once('='))
            .find(|(name, _)| *name == self.config.cookie_name)
            .map(|(_, value)| value)
    }
}

/// Whoever is making the request: a live session (maybe) and the signed-in
/// user (maybe). The user row is re-read on every request so deleted or
/// deactivated accounts drop back to anonymous.
pub struct Visitor {
    pub session_id: Option<Uuid>,
    pub user: Option<user::Model>,
}

impl Visitor {
    pub fn is_authenticated(&self) -> bool {
        self.user.is_some()
    }
}

impl<S> FromRequestParts<S> for Visitor
where
    S: Send + Sync,
    AppState: FromRef<S>,
{
    type Rejection = ApiErr;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let state = AppState::from_ref(state);

        let Some(session_id) = state
            .sessions
            .token_from_headers(&parts.headers)
            .and_then(|token| state.sessions.resolve(token))
        else {
            return Ok(Visitor {
                session_id: None,
                user: None,
            });
        };

        let user = match state.sessions.user_id(session_id) {
            Some(user_id) => user::Entity::find_by_id(user_id)
                .one(&state.db)
                .await
                .map_err(ApiErr::internal)?
                .filter(|u| u.is_active),
            None => None,
        };

        Ok(Visitor {
            session_id: Some(session_id),
            user,
        })
    }
}

/// A signed-in user together with their session.
pub struct SignedIn {
    pub session_id: Uuid,
    pub user: user::Model,
}

impl SignedIn {
    fn from_visitor(visitor: Visitor) -> Option<Self> {
        match visitor {
            Visitor {
                session_id: Some(session_id),
                user: Some(user),
            } => Some(SignedIn { session_id, user }),
            _ => None,
        }
    }
}

/// Rejection for browser-facing guards: always back to the login page.
pub struct ToLogin;

impl IntoResponse for ToLogin {
    fn into_response(self) -> Response {
        Redirect::to(routes::LOGIN).into_response()
    }
}

/// Extractor: any signed-in user.
pub struct LoginRequired(pub SignedIn);

impl<S> FromRequestParts<S> for LoginRequired
where
    S: Send + Sync,
    AppState: FromRef<S>,
{
    type Rejection = Response;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let visitor = Visitor::from_request_parts(parts, state)
            .await
            .map_err(IntoResponse::into_response)?;
        SignedIn::from_visitor(visitor)
            .map(LoginRequired)
            .ok_or_else(|| {
                tracing::debug!(path = %parts.uri.path(), "anonymous request to guarded route");
                ToLogin.into_response()
            })
    }
}

/// Compile-time role for [`RoleRequired`].
pub trait RoleGuard {
    const ROLE: UserType;
}

pub struct CollegeAdminRole;
pub struct ProfessorRole;
pub struct StudentRole;

impl RoleGuard for CollegeAdminRole {
    const ROLE: UserType = UserType::CollegeAdmin;
}

impl RoleGuard for ProfessorRole {
    const ROLE: UserType = UserType::Professor;
}

impl RoleGuard for StudentRole {
    const ROLE: UserType = UserType::Student;
}

/// Extractor: a signed-in user whose role is exactly `R::ROLE`. Anyone else
/// is redirected to the login page.
pub struct RoleRequired<R: RoleGuard> {
    pub signed_in: SignedIn,
    _role: PhantomData<R>,
}

impl<S, R> FromRequestParts<S> for RoleRequired<R>
where
    S: Send + Sync,
    AppState: FromRef<S>,
    R: RoleGuard,
{
    type Rejection = Response;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let LoginRequired(signed_in) = LoginRequired::from_request_parts(parts, state).await?;

        if signed_in.user.user_type != R::ROLE {
            tracing::debug!(
                path = %parts.uri.path(),
                username = %signed_in.user.username,
                role = %signed_in.user.user_type,
                required = %R::ROLE,
                "role guard rejected request"
            );
            return Err(ToLogin.into_response());
        }

        Ok(RoleRequired {
            signed_in,
            _role: PhantomData,
        })
    }
}
