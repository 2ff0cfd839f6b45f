//! Platform console for super admins: a JSON CRUD surface over every table.

use std::collections::HashMap;

use axum::{
    Router,
    extract::{FromRef, FromRequestParts},
    http::{StatusCode, request::Parts},
    response::Json,
    routing::{get, put},
};
use sea_orm::{
    ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait, PrimaryKeyTrait, QueryFilter,
    Select,
};
use uuid::Uuid;

use crate::entity::user::{self, UserType};
use crate::web::{ApiErr, AppState, session::Visitor};

pub mod college_handlers;
pub mod dto;
pub mod forms;
pub mod notification_handlers;
pub mod profile_handlers;
pub mod record_handlers;
pub mod subject_handlers;
pub mod user_handlers;

use dto::{AdminIndex, ListQuery, ModelEntry};

// ---------- guard ----------

/// Extractor: signed-in super admin. Anonymous callers get 401, other roles 403.
pub struct SuperAdmin(pub user::Model);

impl<S> FromRequestParts<S> for SuperAdmin
where
    S: Send + Sync,
    AppState: FromRef<S>,
{
    type Rejection = ApiErr;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let visitor = Visitor::from_request_parts(parts, state).await?;
        let user = visitor
            .user
            .ok_or_else(|| ApiErr::new(StatusCode::UNAUTHORIZED, "Authentication required"))?;

        if user.user_type != UserType::SuperAdmin {
            return Err(ApiErr::new(StatusCode::FORBIDDEN, "Super admin access required"));
        }

        Ok(SuperAdmin(user))
    }
}

// ---------- shared helpers ----------

/// Clamp paging parameters: page ≥ 1, page size 1..=100 (default 20).
pub fn page_params(query: &ListQuery) -> (u64, u64) {
    let page = query.page.unwrap_or(1).max(1);
    let page_size = query.page_size.unwrap_or(20).clamp(1, 100);
    (page, page_size)
}

/// Run a paginated select, returning the page and the total row count.
pub async fn fetch_page<E>(
    db: &DatabaseConnection,
    select: Select<E>,
    page: u64,
    page_size: u64,
) -> Result<(Vec<E::Model>, u64), ApiErr>
where
    E: EntityTrait,
    E::Model: Sync + 'static,
{
    let paginator = select.paginate(db, page_size);
    let total = paginator.num_items().await.map_err(ApiErr::internal)?;
    let rows = paginator
        .fetch_page(page - 1)
        .await
        .map_err(ApiErr::internal)?;
    Ok((rows, total))
}

pub async fn get_or_404<E>(
    db: &DatabaseConnection,
    id: Uuid,
    what: &str,
) -> Result<E::Model, ApiErr>
where
    E: EntityTrait,
    <E::PrimaryKey as PrimaryKeyTrait>::ValueType: From<Uuid>,
{
    E::find_by_id(id)
        .one(db)
        .await
        .map_err(ApiErr::internal)?
        .ok_or_else(|| ApiErr::not_found(format!("{what} not found")))
}

/// Batch-load rows by id into a map, for building display strings.
pub async fn load_by_ids<E, C>(
    db: &DatabaseConnection,
    column: C,
    ids: impl IntoIterator<Item = Uuid>,
    key: impl Fn(&E::Model) -> Uuid,
) -> Result<HashMap<Uuid, E::Model>, ApiErr>
where
    E: EntityTrait,
    C: ColumnTrait,
{
    let mut ids: Vec<Uuid> = ids.into_iter().collect();
    ids.sort_unstable();
    ids.dedup();
    if ids.is_empty() {
        return Ok(HashMap::new());
    }
    let rows = E::find()
        .filter(column.is_in(ids))
        .all(db)
        .await
        .map_err(ApiErr::internal)?;
    Ok(rows.into_iter().map(|m| (key(&m), m)).collect())
}

// ---------- index ----------

const REGISTERED: [(&str, &str); 8] = [
    ("College", "colleges"),
    ("User", "users"),
    ("Professor", "professors"),
    ("Student", "students"),
    ("Subject", "subjects"),
    ("Result", "results"),
    ("Attendance", "attendance"),
    ("Notification", "notifications"),
];

pub async fn index(SuperAdmin(user): SuperAdmin) -> Json<AdminIndex> {
    Json(AdminIndex {
        site: "College administration",
        user: user.display_name(),
        models: REGISTERED
            .iter()
            .map(|(name, slug)| ModelEntry {
                name,
                url: format!("/admin/api/{slug}"),
            })
            .collect(),
    })
}

// ---------- router ----------

pub fn admin_router() -> Router<AppState> {
    Router::new()
        .route("/admin/", get(index))
        // colleges
        .route(
            "/admin/api/colleges",
            get(college_handlers::list_colleges).post(college_handlers::create_college),
        )
        .route(
            "/admin/api/colleges/{id}",
            get(college_handlers::get_college)
                .put(college_handlers::update_college)
                .delete(college_handlers::delete_college),
        )
        // users
        .route(
            "/admin/api/users",
            get(user_handlers::list_users).post(user_handlers::create_user),
        )
        .route(
            "/admin/api/users/{id}",
            get(user_handlers::get_user)
                .put(user_handlers::update_user)
                .delete(user_handlers::delete_user),
        )
        .route(
            "/admin/api/users/{id}/password",
            put(user_handlers::change_password),
        )
        // role profiles
        .route(
            "/admin/api/professors",
            get(profile_handlers::list_professors).post(profile_handlers::create_professor),
        )
        .route(
            "/admin/api/professors/{user_id}",
            get(profile_handlers::get_professor).delete(profile_handlers::delete_professor),
        )
        .route(
            "/admin/api/students",
            get(profile_handlers::list_students).post(profile_handlers::create_student),
        )
        .route(
            "/admin/api/students/{user_id}",
            get(profile_handlers::get_student).delete(profile_handlers::delete_student),
        )
        // subjects
        .route(
            "/admin/api/subjects",
            get(subject_handlers::list_subjects).post(subject_handlers::create_subject),
        )
        .route(
            "/admin/api/subjects/{id}",
            get(subject_handlers::get_subject).delete(subject_handlers::delete_subject),
        )
        // academic records
        .route(
            "/admin/api/results",
            get(record_handlers::list_results).post(record_handlers::create_result),
        )
        .route(
            "/admin/api/results/{id}",
            axum::routing::delete(record_handlers::delete_result),
        )
        .route(
            "/admin/api/attendance",
            get(record_handlers::list_attendance).post(record_handlers::create_attendance),
        )
        .route(
            "/admin/api/attendance/{id}",
            axum::routing::delete(record_handlers::delete_attendance),
        )
        // notifications
        .route(
            "/admin/api/notifications",
            get(notification_handlers::list_notifications)
                .post(notification_handlers::create_notification),
        )
        .route(
            "/admin/api/notifications/{id}",
            axum::routing::delete(notification_handlers::delete_notification),
        )
        .route(
            "/admin/api/notifications/{id}/read",
            put(notification_handlers::mark_read),
        )
}

#[cfg(test)]
pub(crate) mod tests {
    use axum::{
        body::{Body, to_bytes},
        http::{Method, Request, StatusCode, header},
    };
    use migration::{Migrator, MigratorTrait};
    use sea_orm::{ActiveModelTrait, Database, Set};
    use serde::Serialize;
    use tower::ServiceExt;
    use uuid::Uuid;

    use crate::auth::NewAccount;
    use crate::config::SessionConfig;
    use crate::entity::{
        college,
        user::{self, UserType},
    };
    use crate::web::{AppState, app_router, session::SessionManager};

    /// In-memory app with a signed-in super admin.
    pub struct TestApp {
        pub state: AppState,
        pub admin_user: user::Model,
        pub admin_cookie: String,
    }

    impl TestApp {
        pub async fn new() -> Self {
            let db = Database::connect("sqlite::memory:").await.unwrap();
            Migrator::up(&db, None).await.unwrap();
            let state = AppState::new(
                db,
                SessionManager::new(SessionConfig::with_secret("admin-test-secret")),
            );
            let admin_user = state
                .auth
                .create_user(NewAccount::new("root", "pw", UserType::SuperAdmin))
                .await
                .unwrap();
            let admin_cookie = Self::cookie_for(&state, &admin_user);
            Self {
                state,
                admin_user,
                admin_cookie,
            }
        }

        fn cookie_for(state: &AppState, user: &user::Model) -> String {
            let issued = state.sessions.issue(Some(user.id), vec![]).unwrap();
            format!("{}={}", state.sessions.cookie_name(), issued.token)
        }

        /// Send as the super admin.
        pub async fn admin(&self, req: Request<Body>) -> (StatusCode, serde_json::Value) {
            self.send(req, Some(&self.admin_cookie)).await
        }

        /// Send as `user`, or anonymously.
        pub async fn as_user(
            &self,
            req: Request<Body>,
            user: Option<&user::Model>,
        ) -> (StatusCode, serde_json::Value) {
            let cookie = user.map(|u| Self::cookie_for(&self.state, u));
            self.send(req, cookie.as_deref()).await
        }

        async fn send(
            &self,
            mut req: Request<Body>,
            cookie: Option<&str>,
        ) -> (StatusCode, serde_json::Value) {
            if let Some(c) = cookie {
                req.headers_mut()
                    .insert(header::COOKIE, c.parse().unwrap());
            }
            let res = app_router(self.state.clone()).oneshot(req).await.unwrap();
            let status = res.status();
            let bytes = to_bytes(res.into_body(), usize::MAX).await.unwrap();
            let body = serde_json::from_slice(&bytes).unwrap_or(serde_json::Value::Null);
            (status, body)
        }

        pub async fn college(&self, name: &str) -> college::Model {
            college::ActiveModel {
                id: Set(Uuid::now_v7()),
                name: Set(name.to_string()),
                province: Set("Gauteng".into()),
                address: Set(None),
                contact_email: Set(None),
                phone_number: Set(None),
            }
            .insert(&self.state.db)
            .await
            .unwrap()
        }

        pub async fn user(
            &self,
            username: &str,
            role: UserType,
            college_id: Option<Uuid>,
        ) -> user::Model {
            let mut account = NewAccount::new(username, "pw", role);
            if let Some(id) = college_id {
                account = account.in_college(id);
            }
            self.state.auth.create_user(account).await.unwrap()
        }
    }

    /// JSON request; a body that serializes to `null` is sent empty.
    pub fn json_request(method: Method, uri: &str, body: impl Serialize) -> Request<Body> {
        let value = serde_json::to_value(body).unwrap();
        let builder = Request::builder().method(method).uri(uri);
        if value.is_null() {
            builder.body(Body::empty()).unwrap()
        } else {
            builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(value.to_string()))
                .unwrap()
        }
    }

    #[tokio::test]
    async fn console_rejects_anonymous_and_other_roles() {
        let app = TestApp::new().await;
        let (status, body) = app
            .as_user(json_request(Method::GET, "/admin/api/colleges", ()), None)
            .await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["error"], "Authentication required");

        for role in [UserType::CollegeAdmin, UserType::Professor, UserType::Student] {
            let user = app.user(&format!("u-{role}"), role, None).await;
            let (status, _) = app
                .as_user(json_request(Method::GET, "/admin/api/users", ()), Some(&user))
                .await;
            assert_eq!(status, StatusCode::FORBIDDEN);
        }
    }

    #[tokio::test]
    async fn index_lists_every_model() {
        let app = TestApp::new().await;
        let (status, body) = app.admin(json_request(Method::GET, "/admin/", ())).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["user"], "root");
        let models = body["models"].as_array().unwrap();
        assert_eq!(models.len(), 8);
        assert_eq!(models[0]["url"], "/admin/api/colleges");
    }

    #[tokio::test]
    async fn page_size_is_clamped() {
        let app = TestApp::new().await;
        let (_, body) = app
            .admin(json_request(Method::GET, "/admin/api/users?page=0&page_size=500", ()))
            .await;
        assert_eq!(body["page"], 1);
        assert_eq!(body["page_size"], 100);
        assert_eq!(body["total"], 1);
    }
}
