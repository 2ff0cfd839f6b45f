//! End-to-end flows through the public router: a super admin sets up a
//! college and accounts through the console, then each role signs in.

use axum::{
    Router,
    body::{Body, to_bytes},
    http::{HeaderMap, Method, Request, StatusCode, header},
};
use dashboard::config::SessionConfig;
use dashboard::entity::user::UserType;
use dashboard::web::{AppState, app_router, session::SessionManager};
use migration::{Migrator, MigratorTrait};
use sea_orm::Database;
use tower::ServiceExt;

async fn setup() -> Router {
    let db = Database::connect("sqlite::memory:").await.unwrap();
    Migrator::up(&db, None).await.unwrap();
    let state = AppState::new(
        db,
        SessionManager::new(SessionConfig::with_secret("flow-test-secret")),
    );
    state
        .auth
        .seed_super_admin("admin", "admin-pw")
        .await
        .unwrap()
        .unwrap();
    app_router(state)
}

async fn send(app: &Router, req: Request<Body>) -> (StatusCode, HeaderMap, serde_json::Value) {
    let res = app.clone().oneshot(req).await.unwrap();
    let status = res.status();
    let headers = res.headers().clone();
    let bytes = to_bytes(res.into_body(), usize::MAX).await.unwrap();
    let body = serde_json::from_slice(&bytes).unwrap_or(serde_json::Value::Null);
    (status, headers, body)
}

async fn login(app: &Router, username: &str, password: &str) -> (String, String) {
    let req = Request::builder()
        .method(Method::POST)
        .uri("/login/")
        .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
        .body(Body::from(format!("username={username}&password={password}")))
        .unwrap();
    let (status, headers, _) = send(app, req).await;
    assert_eq!(status, StatusCode::SEE_OTHER, "login for {username}");
    let location = headers[header::LOCATION].to_str().unwrap().to_string();
    let cookie = headers[header::SET_COOKIE]
        .to_str()
        .unwrap()
        .split(';')
        .next()
        .unwrap()
        .to_string();
    (cookie, location)
}

fn with_cookie(method: Method, uri: &str, cookie: &str, body: Option<serde_json::Value>) -> Request<Body> {
    let builder = Request::builder()
        .method(method)
        .uri(uri)
        .header(header::COOKIE, cookie);
    match body {
        Some(json) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(json.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    }
}

#[tokio::test]
async fn console_setup_then_each_role_lands_on_its_dashboard() {
    let app = setup().await;
    let (admin, location) = login(&app, "admin", "admin-pw").await;
    assert_eq!(location, "/admin/");

    let (status, _, college) = send(
        &app,
        with_cookie(
            Method::POST,
            "/admin/api/colleges",
            &admin,
            Some(serde_json::json!({"name": "North Campus", "province": "Gauteng"})),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);

    let accounts = [
        ("dean", "college_admin", "/college_admin/dashboard/", "College Admin"),
        ("prof", "professor", "/professor/dashboard/", "Professor"),
        ("stud", "student", "/student/dashboard/", "Student"),
    ];
    for (username, role, _, _) in accounts {
        let (status, _, _) = send(
            &app,
            with_cookie(
                Method::POST,
                "/admin/api/users",
                &admin,
                Some(serde_json::json!({
                    "username": username,
                    "user_type": role,
                    "college_id": college["id"],
                    "password1": "pw",
                    "password2": "pw",
                })),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
    }

    for (username, _, dashboard, label) in accounts {
        let (cookie, location) = login(&app, username, "pw").await;
        assert_eq!(location, dashboard);

        let (status, _, page) = send(&app, with_cookie(Method::GET, dashboard, &cookie, None)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(page["message"], format!("Welcome to the {label} Dashboard!"));
        assert_eq!(page["messages"][0]["text"], format!("Welcome, {username}!"));

        // No role may reach the console.
        let (status, _, _) = send(&app, with_cookie(Method::GET, "/admin/api/users", &cookie, None)).await;
        assert_eq!(status, StatusCode::FORBIDDEN);
    }
}

#[tokio::test]
async fn deactivated_account_loses_its_session() {
    let app = setup().await;
    let (admin, _) = login(&app, "admin", "admin-pw").await;

    let (_, _, created) = send(
        &app,
        with_cookie(
            Method::POST,
            "/admin/api/users",
            &admin,
            Some(serde_json::json!({"username": "stud", "password1": "pw", "password2": "pw"})),
        ),
    )
    .await;
    assert_eq!(created["user_type"], "student");

    let (cookie, _) = login(&app, "stud", "pw").await;
    let (status, _, _) = send(&app, with_cookie(Method::GET, "/student/dashboard/", &cookie, None)).await;
    assert_eq!(status, StatusCode::OK);

    let id = created["id"].as_str().unwrap();
    send(
        &app,
        with_cookie(
            Method::PUT,
            &format!("/admin/api/users/{id}"),
            &admin,
            Some(serde_json::json!({"is_active": false})),
        ),
    )
    .await;

    let (status, headers, _) =
        send(&app, with_cookie(Method::GET, "/student/dashboard/", &cookie, None)).await;
    assert_eq!(status, StatusCode::SEE_OTHER);
    assert_eq!(headers[header::LOCATION], "/login/");
}

#[tokio::test]
async fn logout_then_dashboard_requires_login_again() {
    let app = setup().await;
    let (admin, _) = login(&app, "admin", "admin-pw").await;
    send(
        &app,
        with_cookie(
            Method::POST,
            "/admin/api/users",
            &admin,
            Some(serde_json::json!({
                "username": "prof",
                "user_type": "professor",
                "password1": "pw",
                "password2": "pw",
            })),
        ),
    )
    .await;

    let (cookie, location) = login(&app, "prof", "pw").await;
    assert_eq!(location, UserType::Professor.dashboard_route());
    let (status, headers, _) = send(&app, with_cookie(Method::POST, "/logout/", &cookie, None)).await;
    assert_eq!(status, StatusCode::SEE_OTHER);
    assert_eq!(headers[header::LOCATION], "/login/");
    let anon = headers[header::SET_COOKIE]
        .to_str()
        .unwrap()
        .split(';')
        .next()
        .unwrap()
        .to_string();

    let (_, _, page) = send(&app, with_cookie(Method::GET, "/login/", &anon, None)).await;
    assert_eq!(page["messages"][0]["text"], "You have been logged out successfully.");

    let (status, headers, _) =
        send(&app, with_cookie(Method::GET, "/professor/dashboard/", &cookie, None)).await;
    assert_eq!(status, StatusCode::SEE_OTHER);
    assert_eq!(headers[header::LOCATION], "/login/");
}
