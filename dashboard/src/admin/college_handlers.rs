use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::Json,
};
use sea_orm::{ActiveModelTrait, ColumnTrait, EntityTrait, QueryFilter, QueryOrder, Set};
use uuid::Uuid;

use crate::entity::college;
use crate::web::{ApiErr, AppState};

use super::{
    SuperAdmin,
    dto::{
        CollegeResponse, CreateCollegeRequest, ListQuery, PaginatedResponse, UpdateCollegeRequest,
    },
    fetch_page,
    forms::{validate_college_changes, validate_new_college},
    get_or_404, page_params,
};

const DUPLICATE_NAME: &str = "College with this name already exists";

pub async fn list_colleges(
    SuperAdmin(_): SuperAdmin,
    State(state): State<AppState>,
    Query(params): Query<ListQuery>,
) -> Result<Json<PaginatedResponse<CollegeResponse>>, ApiErr> {
    let (page, page_size) = page_params(&params);

    let mut query = college::Entity::find();
    if let Some(ref search) = params.search
        && !search.is_empty()
    {
        query = query.filter(college::Column::Name.contains(search.as_str()));
    }

    let (rows, total) = fetch_page(
        &state.db,
        query.order_by_asc(college::Column::Name),
        page,
        page_size,
    )
    .await?;

    Ok(Json(PaginatedResponse {
        data: rows.into_iter().map(CollegeResponse::from).collect(),
        total,
        page,
        page_size,
    }))
}

pub async fn create_college(
    SuperAdmin(admin): SuperAdmin,
    State(state): State<AppState>,
    Json(body): Json<CreateCollegeRequest>,
) -> Result<(StatusCode, Json<CollegeResponse>), ApiErr> {
    let fields = validate_new_college(&body).map_err(|e| ApiErr::unprocessable(e.to_string()))?;

    let model = college::ActiveModel {
        id: Set(Uuid::now_v7()),
        name: Set(fields.name),
        province: Set(fields.province),
        address: Set(fields.address),
        contact_email: Set(fields.contact_email),
        phone_number: Set(fields.phone_number),
    }
    .insert(&state.db)
    .await
    .map_err(|e| ApiErr::from_write(e, DUPLICATE_NAME))?;

    tracing::info!(college = %model.name, by = %admin.username, "college created");

    Ok((StatusCode::CREATED, Json(CollegeResponse::from(model))))
}

pub async fn get_college(
    SuperAdmin(_): SuperAdmin,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<CollegeResponse>, ApiErr> {
    let model = get_or_404::<college::Entity>(&state.db, id, "College").await?;
    Ok(Json(CollegeResponse::from(model)))
}

fn blank_to_none(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

pub async fn update_college(
    SuperAdmin(_): SuperAdmin,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(body): Json<UpdateCollegeRequest>,
) -> Result<Json<CollegeResponse>, ApiErr> {
    validate_college_changes(&body).map_err(|e| ApiErr::unprocessable(e.to_string()))?;
    let model = get_or_404::<college::Entity>(&state.db, id, "College").await?;

    let mut active: college::ActiveModel = model.into();
    if let Some(name) = body.name {
        active.name = Set(name.trim().to_string());
    }
    if let Some(province) = body.province {
        active.province = Set(province.trim().to_string());
    }
    if let Some(address) = body.address {
        active.address = Set(blank_to_none(address));
    }
    if let Some(email) = body.contact_email {
        active.contact_email = Set(blank_to_none(email));
    }
    if let Some(phone) = body.phone_number {
        active.phone_number = Set(blank_to_none(phone));
    }

    let updated = active
        .update(&state.db)
        .await
        .map_err(|e| ApiErr::from_write(e, DUPLICATE_NAME))?;

    Ok(Json(CollegeResponse::from(updated)))
}

/// Deleting a college removes everything scoped to it.
pub async fn delete_college(
    SuperAdmin(admin): SuperAdmin,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiErr> {
    let model = get_or_404::<college::Entity>(&state.db, id, "College").await?;

    if admin.college_id == Some(id) {
        return Err(ApiErr::conflict(
            "Cannot delete the college your own account belongs to",
        ));
    }

    let name = model.name.clone();
    let active: college::ActiveModel = model.into();
    active.delete(&state.db).await.map_err(ApiErr::internal)?;

    tracing::info!(college = %name, by = %admin.username, "college deleted");

    Ok(StatusCode::NO_CONTENT)
}
