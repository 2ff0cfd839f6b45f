use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::Json,
};
use sea_orm::{ActiveModelTrait, ColumnTrait, EntityTrait, QueryFilter, QueryOrder, Set};
use uuid::Uuid;

use crate::entity::{college, professor, subject};
use crate::web::{ApiErr, AppState};

use super::{
    SuperAdmin,
    dto::{CreateSubjectRequest, ListQuery, PaginatedResponse, SubjectResponse},
    fetch_page,
    forms::validate_subject,
    get_or_404, load_by_ids, page_params,
};

const DUPLICATE_CODE: &str = "Subject with this code already exists";

pub async fn list_subjects(
    SuperAdmin(_): SuperAdmin,
    State(state): State<AppState>,
    Query(params): Query<ListQuery>,
) -> Result<Json<PaginatedResponse<SubjectResponse>>, ApiErr> {
    let (page, page_size) = page_params(&params);

    let mut query = subject::Entity::find();
    if let Some(ref search) = params.search
        && !search.is_empty()
    {
        let s = search.as_str();
        query = query.filter(
            subject::Column::Name
                .contains(s)
                .or(subject::Column::Code.contains(s)),
        );
    }
    if let Some(college_id) = params.college_id {
        query = query.filter(subject::Column::CollegeId.eq(college_id));
    }

    let (rows, total) = fetch_page(
        &state.db,
        query.order_by_asc(subject::Column::Code),
        page,
        page_size,
    )
    .await?;

    let colleges = load_by_ids::<college::Entity, _>(
        &state.db,
        college::Column::Id,
        rows.iter().map(|s| s.college_id),
        |c| c.id,
    )
    .await?;

    let data = rows
        .into_iter()
        .filter_map(|s| {
            let college = colleges.get(&s.college_id)?;
            Some(SubjectResponse::new(s, college))
        })
        .collect();

    Ok(Json(PaginatedResponse {
        data,
        total,
        page,
        page_size,
    }))
}

pub async fn create_subject(
    SuperAdmin(admin): SuperAdmin,
    State(state): State<AppState>,
    Json(body): Json<CreateSubjectRequest>,
) -> Result<(StatusCode, Json<SubjectResponse>), ApiErr> {
    let fields = validate_subject(&body).map_err(|e| ApiErr::unprocessable(e.to_string()))?;

    let college = college::Entity::find_by_id(body.college_id)
        .one(&state.db)
        .await
        .map_err(ApiErr::internal)?
        .ok_or_else(|| ApiErr::unprocessable("college: Select a valid college."))?;

    if let Some(professor_id) = body.professor_id {
        let exists = professor::Entity::find_by_id(professor_id)
            .one(&state.db)
            .await
            .map_err(ApiErr::internal)?
            .is_some();
        if !exists {
            return Err(ApiErr::unprocessable("professor: Select a valid professor."));
        }
    }

    let model = subject::ActiveModel {
        id: Set(Uuid::now_v7()),
        name: Set(fields.name),
        code: Set(fields.code),
        professor_id: Set(body.professor_id),
        credits: Set(fields.credits),
        college_id: Set(college.id),
    }
    .insert(&state.db)
    .await
    .map_err(|e| ApiErr::from_write(e, DUPLICATE_CODE))?;

    tracing::info!(code = %model.code, college = %college.name, by = %admin.username, "subject created");

    Ok((StatusCode::CREATED, Json(SubjectResponse::new(model, &college))))
}

pub async fn get_subject(
    SuperAdmin(_): SuperAdmin,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<SubjectResponse>, ApiErr> {
    let model = get_or_404::<subject::Entity>(&state.db, id, "Subject").await?;
    let college = get_or_404::<college::Entity>(&state.db, model.college_id, "College").await?;
    Ok(Json(SubjectResponse::new(model, &college)))
}

/// Removes the subject along with its results and attendance.
pub async fn delete_subject(
    SuperAdmin(_): SuperAdmin,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiErr> {
    let model = get_or_404::<subject::Entity>(&state.db, id, "Subject").await?;
    let active: subject::ActiveModel = model.into();
    active.delete(&state.db).await.map_err(ApiErr::internal)?;
    Ok(StatusCode::NO_CONTENT)
}
