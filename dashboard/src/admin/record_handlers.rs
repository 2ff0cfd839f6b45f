//! Exam results and attendance. Both rows point at a student profile, a
//! subject and a college, and are displayed through those three.

use std::collections::HashMap;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::Json,
};
use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder, Set,
};
use uuid::Uuid;

use crate::entity::{attendance, college, result, subject, user};
use crate::web::{ApiErr, AppState};

use super::{
    SuperAdmin,
    dto::{
        AttendanceResponse, CreateAttendanceRequest, CreateResultRequest, ListQuery,
        PaginatedResponse, ResultResponse,
    },
    fetch_page,
    forms::validate_result,
    get_or_404, load_by_ids, page_params,
};

const DUPLICATE_RESULT: &str =
    "Result with this Student, Subject and College already exists.";
const DUPLICATE_ATTENDANCE: &str =
    "Attendance with this Student, Subject, Date and College already exists.";

/// Rows referenced by a page of records.
struct Refs {
    students: HashMap<Uuid, user::Model>,
    subjects: HashMap<Uuid, subject::Model>,
    colleges: HashMap<Uuid, college::Model>,
}

impl Refs {
    async fn load(
        db: &DatabaseConnection,
        keys: impl Iterator<Item = (Uuid, Uuid, Uuid)> + Clone,
    ) -> Result<Self, ApiErr> {
        Ok(Self {
            students: load_by_ids::<user::Entity, _>(
                db,
                user::Column::Id,
                keys.clone().map(|k| k.0),
                |u| u.id,
            )
            .await?,
            subjects: load_by_ids::<subject::Entity, _>(
                db,
                subject::Column::Id,
                keys.clone().map(|k| k.1),
                |s| s.id,
            )
            .await?,
            colleges: load_by_ids::<college::Entity, _>(
                db,
                college::Column::Id,
                keys.map(|k| k.2),
                |c| c.id,
            )
            .await?,
        })
    }

    fn get(
        &self,
        student: Uuid,
        subject: Uuid,
        college: Uuid,
    ) -> Option<(&user::Model, &subject::Model, &college::Model)> {
        Some((
            self.students.get(&student)?,
            self.subjects.get(&subject)?,
            self.colleges.get(&college)?,
        ))
    }
}

// ---------- results ----------

pub async fn list_results(
    SuperAdmin(_): SuperAdmin,
    State(state): State<AppState>,
    Query(params): Query<ListQuery>,
) -> Result<Json<PaginatedResponse<ResultResponse>>, ApiErr> {
    let (page, page_size) = page_params(&params);

    let mut query = result::Entity::find();
    if let Some(student_id) = params.student_id {
        query = query.filter(result::Column::StudentId.eq(student_id));
    }
    if let Some(college_id) = params.college_id {
        query = query.filter(result::Column::CollegeId.eq(college_id));
    }

    let (rows, total) = fetch_page(
        &state.db,
        query.order_by_desc(result::Column::DateRecorded),
        page,
        page_size,
    )
    .await?;

    let refs = Refs::load(
        &state.db,
        rows.iter().map(|r| (r.student_id, r.subject_id, r.college_id)),
    )
    .await?;

    let data = rows
        .into_iter()
        .filter_map(|r| {
            let (student, subject, college) = refs.get(r.student_id, r.subject_id, r.college_id)?;
            let label = r.display(student, subject, college);
            Some(ResultResponse::new(r, label))
        })
        .collect();

    Ok(Json(PaginatedResponse {
        data,
        total,
        page,
        page_size,
    }))
}

pub async fn create_result(
    SuperAdmin(admin): SuperAdmin,
    State(state): State<AppState>,
    Json(body): Json<CreateResultRequest>,
) -> Result<(StatusCode, Json<ResultResponse>), ApiErr> {
    let (marks, grade) = validate_result(&body).map_err(|e| ApiErr::unprocessable(e.to_string()))?;

    let model = result::ActiveModel {
        id: Set(Uuid::now_v7()),
        student_id: Set(body.student_id),
        subject_id: Set(body.subject_id),
        college_id: Set(body.college_id),
        marks: Set(marks),
        grade: Set(grade),
        date_recorded: Set(Utc::now().naive_utc()),
    }
    .insert(&state.db)
    .await
    .map_err(|e| ApiErr::from_write(e, DUPLICATE_RESULT))?;

    let refs = Refs::load(
        &state.db,
        std::iter::once((model.student_id, model.subject_id, model.college_id)),
    )
    .await?;
    let label = refs
        .get(model.student_id, model.subject_id, model.college_id)
        .map(|(student, subject, college)| model.display(student, subject, college))
        .unwrap_or_default();

    tracing::info!(result = %label, by = %admin.username, "result recorded");

    Ok((StatusCode::CREATED, Json(ResultResponse::new(model, label))))
}

pub async fn delete_result(
    SuperAdmin(_): SuperAdmin,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiErr> {
    let model = get_or_404::<result::Entity>(&state.db, id, "Result").await?;
    let active: result::ActiveModel = model.into();
    active.delete(&state.db).await.map_err(ApiErr::internal)?;
    Ok(StatusCode::NO_CONTENT)
}

// ---------- attendance ----------

pub async fn list_attendance(
    SuperAdmin(_): SuperAdmin,
    State(state): State<AppState>,
    Query(params): Query<ListQuery>,
) -> Result<Json<PaginatedResponse<AttendanceResponse>>, ApiErr> {
    let (page, page_size) = page_params(&params);

    let mut query = attendance::Entity::find();
    if let Some(student_id) = params.student_id {
        query = query.filter(attendance::Column::StudentId.eq(student_id));
    }
    if let Some(college_id) = params.college_id {
        query = query.filter(attendance::Column::CollegeId.eq(college_id));
    }

    let (rows, total) = fetch_page(
        &state.db,
        query.order_by_desc(attendance::Column::Date),
        page,
        page_size,
    )
    .await?;

    let refs = Refs::load(
        &state.db,
        rows.iter().map(|a| (a.student_id, a.subject_id, a.college_id)),
    )
    .await?;

    let data = rows
        .into_iter()
        .filter_map(|a| {
            let (student, subject, college) = refs.get(a.student_id, a.subject_id, a.college_id)?;
            let label = a.display(student, subject, college);
            Some(AttendanceResponse::new(a, label))
        })
        .collect();

    Ok(Json(PaginatedResponse {
        data,
        total,
        page,
        page_size,
    }))
}

pub async fn create_attendance(
    SuperAdmin(_): SuperAdmin,
    State(state): State<AppState>,
    Json(body): Json<CreateAttendanceRequest>,
) -> Result<(StatusCode, Json<AttendanceResponse>), ApiErr> {
    let model = attendance::ActiveModel {
        id: Set(Uuid::now_v7()),
        student_id: Set(body.student_id),
        subject_id: Set(body.subject_id),
        college_id: Set(body.college_id),
        date: Set(body.date),
        is_present: Set(body.is_present),
    }
    .insert(&state.db)
    .await
    .map_err(|e| ApiErr::from_write(e, DUPLICATE_ATTENDANCE))?;

    let refs = Refs::load(
        &state.db,
        std::iter::once((model.student_id, model.subject_id, model.college_id)),
    )
    .await?;
    let label = refs
        .get(model.student_id, model.subject_id, model.college_id)
        .map(|(student, subject, college)| model.display(student, subject, college))
        .unwrap_or_default();

    Ok((StatusCode::CREATED, Json(AttendanceResponse::new(model, label))))
}

pub async fn delete_attendance(
    SuperAdmin(_): SuperAdmin,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiErr> {
    let model = get_or_404::<attendance::Entity>(&state.db, id, "Attendance").await?;
    let active: attendance::ActiveModel = model.into();
    active.delete(&state.db).await.map_err(ApiErr::internal)?;
    Ok(StatusCode::NO_CONTENT)
}
