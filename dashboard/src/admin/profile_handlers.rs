//! Professor and student profiles. Both are keyed by their owning user.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::Json,
};
use sea_orm::{ActiveModelTrait, ColumnTrait, EntityTrait, QueryFilter, QueryOrder, Set};
use uuid::Uuid;

use crate::entity::{professor, student, user};
use crate::web::{ApiErr, AppState};

use super::{
    SuperAdmin,
    dto::{
        CreateProfessorRequest, CreateStudentRequest, ListQuery, PaginatedResponse,
        ProfessorResponse, StudentResponse,
    },
    fetch_page,
    forms::{validate_professor, validate_student},
    get_or_404, load_by_ids, page_params,
};

const DUPLICATE_PROFESSOR: &str = "This user already has a professor profile";
const DUPLICATE_STUDENT: &str = "This user already has a student profile, or the student ID is taken";

// ---------- professors ----------

pub async fn list_professors(
    SuperAdmin(_): SuperAdmin,
    State(state): State<AppState>,
    Query(params): Query<ListQuery>,
) -> Result<Json<PaginatedResponse<ProfessorResponse>>, ApiErr> {
    let (page, page_size) = page_params(&params);

    let mut query = professor::Entity::find();
    if let Some(ref search) = params.search
        && !search.is_empty()
    {
        query = query.filter(professor::Column::Department.contains(search.as_str()));
    }

    let (rows, total) = fetch_page(
        &state.db,
        query.order_by_asc(professor::Column::Department),
        page,
        page_size,
    )
    .await?;

    let owners = load_by_ids::<user::Entity, _>(
        &state.db,
        user::Column::Id,
        rows.iter().map(|p| p.user_id),
        |u| u.id,
    )
    .await?;

    let data = rows
        .into_iter()
        .filter_map(|p| {
            let owner = owners.get(&p.user_id)?;
            Some(ProfessorResponse::new(p, owner))
        })
        .collect();

    Ok(Json(PaginatedResponse {
        data,
        total,
        page,
        page_size,
    }))
}

pub async fn create_professor(
    SuperAdmin(_): SuperAdmin,
    State(state): State<AppState>,
    Json(body): Json<CreateProfessorRequest>,
) -> Result<(StatusCode, Json<ProfessorResponse>), ApiErr> {
    let department = validate_professor(&body).map_err(|e| ApiErr::unprocessable(e.to_string()))?;
    let owner = user::Entity::find_by_id(body.user_id)
        .one(&state.db)
        .await
        .map_err(ApiErr::internal)?
        .ok_or_else(|| ApiErr::unprocessable("user: Select a valid user."))?;

    let model = professor::ActiveModel {
        user_id: Set(owner.id),
        department: Set(department),
    }
    .insert(&state.db)
    .await
    .map_err(|e| ApiErr::from_write(e, DUPLICATE_PROFESSOR))?;

    Ok((StatusCode::CREATED, Json(ProfessorResponse::new(model, &owner))))
}

pub async fn get_professor(
    SuperAdmin(_): SuperAdmin,
    State(state): State<AppState>,
    Path(user_id): Path<Uuid>,
) -> Result<Json<ProfessorResponse>, ApiErr> {
    let model = get_or_404::<professor::Entity>(&state.db, user_id, "Professor").await?;
    let owner = get_or_404::<user::Entity>(&state.db, user_id, "User").await?;
    Ok(Json(ProfessorResponse::new(model, &owner)))
}

/// Removes the profile only. Subjects taught by this professor lose their
/// professor; the user account stays.
pub async fn delete_professor(
    SuperAdmin(_): SuperAdmin,
    State(state): State<AppState>,
    Path(user_id): Path<Uuid>,
) -> Result<StatusCode, ApiErr> {
    let model = get_or_404::<professor::Entity>(&state.db, user_id, "Professor").await?;
    let active: professor::ActiveModel = model.into();
    active.delete(&state.db).await.map_err(ApiErr::internal)?;
    Ok(StatusCode::NO_CONTENT)
}

// ---------- students ----------

pub async fn list_students(
    SuperAdmin(_): SuperAdmin,
    State(state): State<AppState>,
    Query(params): Query<ListQuery>,
) -> Result<Json<PaginatedResponse<StudentResponse>>, ApiErr> {
    let (page, page_size) = page_params(&params);

    let mut query = student::Entity::find();
    if let Some(ref search) = params.search
        && !search.is_empty()
    {
        let s = search.as_str();
        query = query.filter(
            student::Column::StudentId
                .contains(s)
                .or(student::Column::Major.contains(s)),
        );
    }

    let (rows, total) = fetch_page(
        &state.db,
        query.order_by_asc(student::Column::StudentId),
        page,
        page_size,
    )
    .await?;

    let owners = load_by_ids::<user::Entity, _>(
        &state.db,
        user::Column::Id,
        rows.iter().map(|s| s.user_id),
        |u| u.id,
    )
    .await?;

    let data = rows
        .into_iter()
        .filter_map(|s| {
            let owner = owners.get(&s.user_id)?;
            Some(StudentResponse::new(s, owner))
        })
        .collect();

    Ok(Json(PaginatedResponse {
        data,
        total,
        page,
        page_size,
    }))
}

pub async fn create_student(
    SuperAdmin(_): SuperAdmin,
    State(state): State<AppState>,
    Json(body): Json<CreateStudentRequest>,
) -> Result<(StatusCode, Json<StudentResponse>), ApiErr> {
    let fields = validate_student(&body).map_err(|e| ApiErr::unprocessable(e.to_string()))?;
    let owner = user::Entity::find_by_id(body.user_id)
        .one(&state.db)
        .await
        .map_err(ApiErr::internal)?
        .ok_or_else(|| ApiErr::unprocessable("user: Select a valid user."))?;

    let model = student::ActiveModel {
        user_id: Set(owner.id),
        student_id: Set(fields.student_id),
        major: Set(fields.major),
        enrollment_year: Set(fields.enrollment_year),
    }
    .insert(&state.db)
    .await
    .map_err(|e| ApiErr::from_write(e, DUPLICATE_STUDENT))?;

    Ok((StatusCode::CREATED, Json(StudentResponse::new(model, &owner))))
}

pub async fn get_student(
    SuperAdmin(_): SuperAdmin,
    State(state): State<AppState>,
    Path(user_id): Path<Uuid>,
) -> Result<Json<StudentResponse>, ApiErr> {
    let model = get_or_404::<student::Entity>(&state.db, user_id, "Student").await?;
    let owner = get_or_404::<user::Entity>(&state.db, user_id, "User").await?;
    Ok(Json(StudentResponse::new(model, &owner)))
}

pub async fn delete_student(
    SuperAdmin(_): SuperAdmin,
    State(state): State<AppState>,
    Path(user_id): Path<Uuid>,
) -> Result<StatusCode, ApiErr> {
    let model = get_or_404::<student::Entity>(&state.db, user_id, "Student").await?;
    let active: student::ActiveModel = model.into();
    active.delete(&state.db).await.map_err(ApiErr::internal)?;
    Ok(StatusCode::NO_CONTENT)
}

#[cfg(test)]
mod tests {
    use super::super::tests::{TestApp, json_request};
    use crate::entity::user::UserType;
    use axum::http::{Method, StatusCode};
    use uuid::Uuid;

    #[tokio::test]
    async fn professor_profile_lifecycle() {
        let app = TestApp::new().await;
        let prof = app.user("prof", UserType::Professor, None).await;

        let (status, body) = app
            .admin(json_request(
                Method::POST,
                "/admin/api/professors",
                serde_json::json!({"user_id": prof.id, "department": "Mathematics"}),
            ))
            .await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(body["username"], "prof");
        assert_eq!(body["department"], "Mathematics");

        let (status, _) = app
            .admin(json_request(
                Method::POST,
                "/admin/api/professors",
                serde_json::json!({"user_id": prof.id, "department": "Physics"}),
            ))
            .await;
        assert_eq!(status, StatusCode::CONFLICT);

        let (_, body) = app
            .admin(json_request(Method::GET, "/admin/api/professors", ()))
            .await;
        assert_eq!(body["total"], 1);

        let (status, _) = app
            .admin(json_request(
                Method::DELETE,
                &format!("/admin/api/professors/{}", prof.id),
                (),
            ))
            .await;
        assert_eq!(status, StatusCode::NO_CONTENT);

        // The account itself survives.
        let (status, _) = app
            .admin(json_request(Method::GET, &format!("/admin/api/users/{}", prof.id), ()))
            .await;
        assert_eq!(status, StatusCode::OK);
    }

    #[tokio::test]
    async fn profile_for_unknown_user_is_unprocessable() {
        let app = TestApp::new().await;
        let (status, _) = app
            .admin(json_request(
                Method::POST,
                "/admin/api/students",
                serde_json::json!({"user_id": Uuid::now_v7(), "student_id": "S1", "major": "CS"}),
            ))
            .await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    }

    #[tokio::test]
    async fn student_ids_are_unique() {
        let app = TestApp::new().await;
        let a = app.user("a", UserType::Student, None).await;
        let b = app.user("b", UserType::Student, None).await;

        let (status, body) = app
            .admin(json_request(
                Method::POST,
                "/admin/api/students",
                serde_json::json!({
                    "user_id": a.id,
                    "student_id": "2026-001",
                    "major": "Computer Science",
                    "enrollment_year": 2026,
                }),
            ))
            .await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(body["enrollment_year"], 2026);

        let (status, _) = app
            .admin(json_request(
                Method::POST,
                "/admin/api/students",
                serde_json::json!({"user_id": b.id, "student_id": "2026-001", "major": "Law"}),
            ))
            .await;
        assert_eq!(status, StatusCode::CONFLICT);

        let (_, body) = app
            .admin(json_request(Method::GET, "/admin/api/students?search=Computer", ()))
            .await;
        assert_eq!(body["total"], 1);
        assert_eq!(body["data"][0]["username"], "a");
    }

    #[tokio::test]
    async fn deleting_user_removes_student_profile() {
        let app = TestApp::new().await;
        let stud = app.user("stud", UserType::Student, None).await;
        app.admin(json_request(
            Method::POST,
            "/admin/api/students",
            serde_json::json!({"user_id": stud.id, "student_id": "S1", "major": "CS"}),
        ))
        .await;

        app.admin(json_request(
            Method::DELETE,
            &format!("/admin/api/users/{}", stud.id),
            (),
        ))
        .await;

        let (status, _) = app
            .admin(json_request(
                Method::GET,
                &format!("/admin/api/students/{}", stud.id),
                (),
            ))
            .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }
}
