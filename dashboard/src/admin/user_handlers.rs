use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::Json,
};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, DatabaseConnection, EntityTrait, PaginatorTrait,
    QueryFilter, QueryOrder, Set,
};
use uuid::Uuid;

use crate::auth::AuthError;
use crate::entity::{
    college,
    user::{self, UserType},
};
use crate::web::{ApiErr, AppState};

use super::{
    SuperAdmin,
    dto::{
        ChangePasswordRequest, CreateUserRequest, ListQuery, PaginatedResponse, UpdateUserRequest,
        UserResponse,
    },
    fetch_page,
    forms::{validate_new_user, validate_user_changes},
    get_or_404, page_params,
};

const DUPLICATE_USERNAME: &str = "A user with that username already exists.";

pub async fn list_users(
    SuperAdmin(_): SuperAdmin,
    State(state): State<AppState>,
    Query(params): Query<ListQuery>,
) -> Result<Json<PaginatedResponse<UserResponse>>, ApiErr> {
    let (page, page_size) = page_params(&params);

    let mut query = user::Entity::find();

    if let Some(ref search) = params.search
        && !search.is_empty()
    {
        let s = search.as_str();
        query = query.filter(
            Condition::any()
                .add(user::Column::Username.contains(s))
                .add(user::Column::Email.contains(s))
                .add(user::Column::FirstName.contains(s))
                .add(user::Column::LastName.contains(s)),
        );
    }
    if let Some(user_type) = params.user_type {
        query = query.filter(user::Column::UserType.eq(user_type));
    }
    if let Some(college_id) = params.college_id {
        query = query.filter(user::Column::CollegeId.eq(college_id));
    }
    if let Some(is_active) = params.is_active {
        query = query.filter(user::Column::IsActive.eq(is_active));
    }

    let (users, total) = fetch_page(
        &state.db,
        query.order_by_asc(user::Column::DateJoined),
        page,
        page_size,
    )
    .await?;

    Ok(Json(PaginatedResponse {
        data: users.into_iter().map(UserResponse::from).collect(),
        total,
        page,
        page_size,
    }))
}

async fn ensure_college(db: &DatabaseConnection, college_id: Option<Uuid>) -> Result<(), ApiErr> {
    if let Some(id) = college_id {
        let exists = college::Entity::find_by_id(id)
            .one(db)
            .await
            .map_err(ApiErr::internal)?
            .is_some();
        if !exists {
            return Err(ApiErr::unprocessable(
                "college: Select a valid choice. That choice is not one of the available choices.",
            ));
        }
    }
    Ok(())
}

pub async fn create_user(
    SuperAdmin(admin): SuperAdmin,
    State(state): State<AppState>,
    Json(body): Json<CreateUserRequest>,
) -> Result<(StatusCode, Json<UserResponse>), ApiErr> {
    let account = validate_new_user(&body).map_err(|e| ApiErr::unprocessable(e.to_string()))?;
    ensure_college(&state.db, account.college_id).await?;

    let model = state.auth.create_user(account).await.map_err(|e| match e {
        AuthError::Db(db) => ApiErr::from_write(db, DUPLICATE_USERNAME),
        other => ApiErr::internal(other),
    })?;

    tracing::info!(
        username = %model.username,
        role = %model.user_type,
        by = %admin.username,
        "user created"
    );

    Ok((StatusCode::CREATED, Json(UserResponse::from(model))))
}

pub async fn get_user(
    SuperAdmin(_): SuperAdmin,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<UserResponse>, ApiErr> {
    let user = get_or_404::<user::Entity>(&state.db, id, "User").await?;
    Ok(Json(UserResponse::from(user)))
}

async fn count_super_admins(db: &DatabaseConnection) -> Result<u64, ApiErr> {
    user::Entity::find()
        .filter(user::Column::UserType.eq(UserType::SuperAdmin))
        .count(db)
        .await
        .map_err(ApiErr::internal)
}

pub async fn update_user(
    SuperAdmin(admin): SuperAdmin,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(body): Json<UpdateUserRequest>,
) -> Result<Json<UserResponse>, ApiErr> {
    let changes = validate_user_changes(&body).map_err(|e| ApiErr::unprocessable(e.to_string()))?;
    let user = get_or_404::<user::Entity>(&state.db, id, "User").await?;

    // Guard: the console must always keep at least one reachable super admin.
    let loses_super_admin = user.user_type == UserType::SuperAdmin
        && (body.user_type.is_some_and(|t| t != UserType::SuperAdmin)
            || body.is_active == Some(false));
    if loses_super_admin {
        if admin.id == id {
            return Err(ApiErr::conflict(
                "Cannot revoke your own super admin access",
            ));
        }
        if count_super_admins(&state.db).await? == 1 {
            return Err(ApiErr::conflict(
                "Cannot revoke access from the last super admin",
            ));
        }
    }

    if let Some(college_id) = body.college_id {
        ensure_college(&state.db, college_id).await?;
    }

    let mut active: user::ActiveModel = user.into();

    if let Some(username) = changes.username {
        active.username = Set(username);
    }
    if let Some(email) = changes.email {
        active.email = Set(email);
    }
    if let Some(first_name) = changes.first_name {
        active.first_name = Set(first_name);
    }
    if let Some(last_name) = changes.last_name {
        active.last_name = Set(last_name);
    }
    if let Some(user_type) = body.user_type {
        active.user_type = Set(user_type);
    }
    if let Some(college_id) = body.college_id {
        active.college_id = Set(college_id);
    }
    if let Some(is_active) = body.is_active {
        active.is_active = Set(is_active);
    }

    let updated = active
        .update(&state.db)
        .await
        .map_err(|e| ApiErr::from_write(e, DUPLICATE_USERNAME))?;

    Ok(Json(UserResponse::from(updated)))
}

pub async fn change_password(
    SuperAdmin(_): SuperAdmin,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(body): Json<ChangePasswordRequest>,
) -> Result<Json<UserResponse>, ApiErr> {
    if body.password.is_empty() {
        return Err(ApiErr::unprocessable("password: This field is required."));
    }

    let updated = state
        .auth
        .set_password(id, &body.password)
        .await
        .map_err(|e| match e {
            AuthError::NotFound => ApiErr::not_found("User not found"),
            other => ApiErr::internal(other),
        })?;

    Ok(Json(UserResponse::from(updated)))
}

/// Deleting an account removes its profiles, results, attendance and
/// received notifications; notifications it sent keep existing without a
/// sender, and subjects it taught lose their professor.
pub async fn delete_user(
    SuperAdmin(admin): SuperAdmin,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiErr> {
    let user = get_or_404::<user::Entity>(&state.db, id, "User").await?;

    // Guard: last-super-admin check takes priority so the message is unambiguous.
    if user.user_type == UserType::SuperAdmin && count_super_admins(&state.db).await? == 1 {
        return Err(ApiErr::conflict("Cannot delete the last super admin"));
    }

    if admin.id == id {
        return Err(ApiErr::conflict("Cannot delete your own account"));
    }

    let username = user.username.clone();
    let active: user::ActiveModel = user.into();
    active.delete(&state.db).await.map_err(ApiErr::internal)?;

    tracing::info!(username = %username, by = %admin.username, "user deleted");

    Ok(StatusCode::NO_CONTENT)
}

#[cfg(test)]
mod tests {
    use super::super::tests::{TestApp, json_request};
    use crate::entity::{professor, subject, user::UserType};
    use axum::http::{Method, StatusCode};
    use sea_orm::{ActiveModelTrait, EntityTrait, Set};
    use uuid::Uuid;

    #[tokio::test]
    async fn create_user_through_creation_form() {
        let app = TestApp::new().await;
        let college = app.college("North Campus").await;

        let (status, body) = app
            .admin(json_request(
                Method::POST,
                "/admin/api/users",
                serde_json::json!({
                    "username": "prof.x",
                    "email": "x@north.edu",
                    "user_type": "professor",
                    "college_id": college.id,
                    "password1": "s3cret",
                    "password2": "s3cret",
                }),
            ))
            .await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(body["user_type"], "professor");
        assert_eq!(body["college_id"], college.id.to_string());
        assert!(body.get("password_hash").is_none());

        // The new account can sign in with the chosen password.
        let user = app.state.auth.authenticate("prof.x", "s3cret").await.unwrap();
        assert_eq!(user.user_type, UserType::Professor);
    }

    #[tokio::test]
    async fn create_user_rejects_unknown_college_and_mismatch() {
        let app = TestApp::new().await;
        let (status, _) = app
            .admin(json_request(
                Method::POST,
                "/admin/api/users",
                serde_json::json!({
                    "username": "ghost",
                    "college_id": Uuid::now_v7(),
                    "password1": "a",
                    "password2": "a",
                }),
            ))
            .await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);

        let (status, body) = app
            .admin(json_request(
                Method::POST,
                "/admin/api/users",
                serde_json::json!({"username": "ghost", "password1": "a", "password2": "b"}),
            ))
            .await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert!(body["error"].as_str().unwrap().contains("didn't match"));
    }

    #[tokio::test]
    async fn create_user_rejects_malformed_identity() {
        let app = TestApp::new().await;
        let (status, body) = app
            .admin(json_request(
                Method::POST,
                "/admin/api/users",
                serde_json::json!({
                    "username": "bad name",
                    "email": "a@b..c",
                    "password1": "pw",
                    "password2": "pw",
                }),
            ))
            .await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        let error = body["error"].as_str().unwrap();
        assert!(error.contains("email: Enter a valid email address."), "{error}");
        assert!(error.contains("username: Enter a valid username."), "{error}");
    }

    #[tokio::test]
    async fn duplicate_username_conflicts() {
        let app = TestApp::new().await;
        app.user("taken", UserType::Student, None).await;
        let (status, _) = app
            .admin(json_request(
                Method::POST,
                "/admin/api/users",
                serde_json::json!({"username": "taken", "password1": "a", "password2": "a"}),
            ))
            .await;
        assert_eq!(status, StatusCode::CONFLICT);
    }

    #[tokio::test]
    async fn list_filters_by_role_and_college() {
        let app = TestApp::new().await;
        let north = app.college("North").await;
        let south = app.college("South").await;
        app.user("s1", UserType::Student, Some(north.id)).await;
        app.user("s2", UserType::Student, Some(south.id)).await;
        app.user("p1", UserType::Professor, Some(north.id)).await;

        let (_, body) = app
            .admin(json_request(Method::GET, "/admin/api/users?user_type=student", ()))
            .await;
        assert_eq!(body["total"], 2);

        let (_, body) = app
            .admin(json_request(
                Method::GET,
                &format!("/admin/api/users?college_id={}", north.id),
                (),
            ))
            .await;
        assert_eq!(body["total"], 2);

        let (_, body) = app
            .admin(json_request(Method::GET, "/admin/api/users?search=p1", ()))
            .await;
        assert_eq!(body["total"], 1);
        assert_eq!(body["data"][0]["username"], "p1");
    }

    #[tokio::test]
    async fn update_moves_user_between_colleges_and_detaches() {
        let app = TestApp::new().await;
        let north = app.college("North").await;
        let user = app.user("s1", UserType::Student, Some(north.id)).await;

        let (status, body) = app
            .admin(json_request(
                Method::PUT,
                &format!("/admin/api/users/{}", user.id),
                serde_json::json!({"college_id": null, "first_name": "Sam"}),
            ))
            .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["college_id"], serde_json::Value::Null);
        assert_eq!(body["display"], "Sam");
    }

    #[tokio::test]
    async fn demote_last_super_admin_rejected() {
        let app = TestApp::new().await;
        let (status, _) = app
            .admin(json_request(
                Method::PUT,
                &format!("/admin/api/users/{}", app.admin_user.id),
                serde_json::json!({"user_type": "student"}),
            ))
            .await;
        assert_eq!(status, StatusCode::CONFLICT);
    }

    #[tokio::test]
    async fn demote_other_super_admin_ok() {
        let app = TestApp::new().await;
        let other = app.user("root2", UserType::SuperAdmin, None).await;
        let (status, body) = app
            .admin(json_request(
                Method::PUT,
                &format!("/admin/api/users/{}", other.id),
                serde_json::json!({"user_type": "college_admin"}),
            ))
            .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["user_type"], "college_admin");
    }

    #[tokio::test]
    async fn delete_self_rejected() {
        let app = TestApp::new().await;
        app.user("root2", UserType::SuperAdmin, None).await;
        let (status, _) = app
            .admin(json_request(
                Method::DELETE,
                &format!("/admin/api/users/{}", app.admin_user.id),
                (),
            ))
            .await;
        assert_eq!(status, StatusCode::CONFLICT);
    }

    #[tokio::test]
    async fn deleting_professor_account_keeps_subjects() {
        let app = TestApp::new().await;
        let college = app.college("North").await;
        let prof = app.user("prof", UserType::Professor, Some(college.id)).await;
        professor::ActiveModel {
            user_id: Set(prof.id),
            department: Set("Mathematics".into()),
        }
        .insert(&app.state.db)
        .await
        .unwrap();
        let subject_id = Uuid::now_v7();
        subject::ActiveModel {
            id: Set(subject_id),
            name: Set("Algebra".into()),
            code: Set("MATH101".into()),
            professor_id: Set(Some(prof.id)),
            credits: Set(3),
            college_id: Set(college.id),
        }
        .insert(&app.state.db)
        .await
        .unwrap();

        let (status, _) = app
            .admin(json_request(
                Method::DELETE,
                &format!("/admin/api/users/{}", prof.id),
                (),
            ))
            .await;
        assert_eq!(status, StatusCode::NO_CONTENT);

        let subject = subject::Entity::find_by_id(subject_id)
            .one(&app.state.db)
            .await
            .unwrap()
            .expect("subject survives");
        assert_eq!(subject.professor_id, None);
        assert!(
            professor::Entity::find_by_id(prof.id)
                .one(&app.state.db)
                .await
                .unwrap()
                .is_none()
        );
    }

    #[tokio::test]
    async fn change_password_then_login() {
        let app = TestApp::new().await;
        let user = app.user("s1", UserType::Student, None).await;
        let (status, _) = app
            .admin(json_request(
                Method::PUT,
                &format!("/admin/api/users/{}/password", user.id),
                serde_json::json!({"password": "fresh"}),
            ))
            .await;
        assert_eq!(status, StatusCode::OK);
        assert!(app.state.auth.authenticate("s1", "fresh").await.is_ok());

        let (status, _) = app
            .admin(json_request(
                Method::PUT,
                &format!("/admin/api/users/{}/password", Uuid::now_v7()),
                serde_json::json!({"password": "fresh"}),
            ))
            .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }
}
