use axum::{
    Router,
    http::{HeaderValue, StatusCode, header},
    response::{IntoResponse, Json, Response},
    routing::{get, post},
};
use sea_orm::DatabaseConnection;
use std::sync::Arc;
use tower_http::set_header::response::SetResponseHeaderLayer;

use crate::admin;
use crate::auth::Auth;

pub mod forms;
pub mod session;
pub mod views;

use session::SessionManager;

pub mod routes {
    pub const LOGIN: &str = "/login/";
    pub const LOGOUT: &str = "/logout/";
    pub const PROFESSOR_DASHBOARD: &str = "/professor/dashboard/";
    pub const STUDENT_DASHBOARD: &str = "/student/dashboard/";
    pub const COLLEGE_ADMIN_DASHBOARD: &str = "/college_admin/dashboard/";
    /// Platform console for super admins.
    pub const ADMIN_INDEX: &str = "/admin/";
}

// ---------- shared state ----------

#[derive(Clone)]
pub struct AppState {
    pub auth: Arc<Auth>,
    pub db: DatabaseConnection,
    pub sessions: Arc<SessionManager>,
}

impl AppState {
    pub fn new(db: DatabaseConnection, sessions: SessionManager) -> Self {
        Self {
            auth: Arc::new(Auth::new(db.clone())),
            db,
            sessions: Arc::new(sessions),
        }
    }
}

// ---------- error type ----------

/// A JSON error response: `{"error": "..."}` with an HTTP status.
#[derive(Debug)]
pub struct ApiErr(StatusCode, String);

impl ApiErr {
    pub fn new(status: StatusCode, msg: impl Into<String>) -> Self {
        Self(status, msg.into())
    }

    pub fn internal(e: impl std::fmt::Display) -> Self {
        tracing::error!(error = %e, "internal error");
        Self(StatusCode::INTERNAL_SERVER_ERROR, e.to_string())
    }

    pub fn not_found(msg: impl Into<String>) -> Self {
        Self(StatusCode::NOT_FOUND, msg.into())
    }

    pub fn conflict(msg: impl Into<String>) -> Self {
        Self(StatusCode::CONFLICT, msg.into())
    }

    pub fn unprocessable(msg: impl Into<String>) -> Self {
        Self(StatusCode::UNPROCESSABLE_ENTITY, msg.into())
    }

    /// Map an insert/update failure, turning unique-key violations into 409.
    pub fn from_write(e: sea_orm::DbErr, conflict_msg: &str) -> Self {
        let msg = e.to_string();
        if msg.contains("UNIQUE") || msg.contains("unique") {
            Self::conflict(conflict_msg)
        } else if msg.contains("FOREIGN KEY") || msg.contains("foreign key") {
            Self::unprocessable("Referenced record does not exist")
        } else {
            Self::internal(e)
        }
    }

    pub fn status(&self) -> StatusCode {
        self.0
    }
}

impl IntoResponse for ApiErr {
    fn into_response(self) -> Response {
        let body = serde_json::json!({ "error": self.1 });
        (self.0, Json(body)).into_response()
    }
}

// ---------- router ----------

pub fn app_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(|| async { StatusCode::OK }))
        .route(
            routes::LOGIN,
            get(views::login_page).post(views::login_submit),
        )
        .route(routes::LOGOUT, post(views::logout))
        .route(routes::PROFESSOR_DASHBOARD, get(views::professor_dashboard))
        .route(routes::STUDENT_DASHBOARD, get(views::student_dashboard))
        .route(
            routes::COLLEGE_ADMIN_DASHBOARD,
            get(views::college_admin_dashboard),
        )
        .merge(admin::admin_router())
        .layer(SetResponseHeaderLayer::if_not_present(
            header::X_CONTENT_TYPE_OPTIONS,
            HeaderValue::from_static("nosniff"),
        ))
        .layer(SetResponseHeaderLayer::if_not_present(
            header::X_FRAME_OPTIONS,
            HeaderValue::from_static("DENY"),
        ))
        .with_state(state)
}
