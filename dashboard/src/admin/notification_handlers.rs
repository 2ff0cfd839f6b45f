use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::Json,
};
use chrono::Utc;
use sea_orm::{ActiveModelTrait, ColumnTrait, EntityTrait, QueryFilter, QueryOrder, Set};
use uuid::Uuid;

use crate::entity::{college, notification, user};
use crate::web::{ApiErr, AppState};

use super::{
    SuperAdmin,
    dto::{CreateNotificationRequest, ListQuery, NotificationResponse, PaginatedResponse},
    fetch_page,
    forms::validate_notification,
    get_or_404, load_by_ids, page_params,
};

pub async fn list_notifications(
    SuperAdmin(_): SuperAdmin,
    State(state): State<AppState>,
    Query(params): Query<ListQuery>,
) -> Result<Json<PaginatedResponse<NotificationResponse>>, ApiErr> {
    let (page, page_size) = page_params(&params);

    let mut query = notification::Entity::find();
    if let Some(recipient_id) = params.recipient_id {
        query = query.filter(notification::Column::RecipientId.eq(recipient_id));
    }
    if let Some(college_id) = params.college_id {
        query = query.filter(notification::Column::CollegeId.eq(college_id));
    }

    let (rows, total) = fetch_page(
        &state.db,
        query.order_by_desc(notification::Column::CreatedAt),
        page,
        page_size,
    )
    .await?;

    let recipients = load_by_ids::<user::Entity, _>(
        &state.db,
        user::Column::Id,
        rows.iter().map(|n| n.recipient_id),
        |u| u.id,
    )
    .await?;
    let colleges = load_by_ids::<college::Entity, _>(
        &state.db,
        college::Column::Id,
        rows.iter().filter_map(|n| n.college_id),
        |c| c.id,
    )
    .await?;

    let data = rows
        .into_iter()
        .filter_map(|n| {
            let recipient = recipients.get(&n.recipient_id)?;
            let college = n.college_id.and_then(|id| colleges.get(&id));
            let label = n.display(recipient, college);
            Some(NotificationResponse::new(n, label))
        })
        .collect();

    Ok(Json(PaginatedResponse {
        data,
        total,
        page,
        page_size,
    }))
}

/// The acting admin is recorded as the sender.
pub async fn create_notification(
    SuperAdmin(admin): SuperAdmin,
    State(state): State<AppState>,
    Json(body): Json<CreateNotificationRequest>,
) -> Result<(StatusCode, Json<NotificationResponse>), ApiErr> {
    let (title, message) =
        validate_notification(&body).map_err(|e| ApiErr::unprocessable(e.to_string()))?;

    let recipient = user::Entity::find_by_id(body.recipient_id)
        .one(&state.db)
        .await
        .map_err(ApiErr::internal)?
        .ok_or_else(|| ApiErr::unprocessable("recipient: Select a valid user."))?;

    let college = match body.college_id {
        Some(id) => Some(
            college::Entity::find_by_id(id)
                .one(&state.db)
                .await
                .map_err(ApiErr::internal)?
                .ok_or_else(|| ApiErr::unprocessable("college: Select a valid college."))?,
        ),
        None => None,
    };

    let model = notification::ActiveModel {
        id: Set(Uuid::now_v7()),
        recipient_id: Set(recipient.id),
        sender_id: Set(Some(admin.id)),
        college_id: Set(college.as_ref().map(|c| c.id)),
        title: Set(title),
        message: Set(message),
        is_read: Set(false),
        created_at: Set(Utc::now().naive_utc()),
    }
    .insert(&state.db)
    .await
    .map_err(|e| ApiErr::from_write(e, "Notification already exists"))?;

    tracing::info!(
        recipient = %recipient.username,
        by = %admin.username,
        "notification sent"
    );

    let label = model.display(&recipient, college.as_ref());
    Ok((StatusCode::CREATED, Json(NotificationResponse::new(model, label))))
}

pub async fn mark_read(
    SuperAdmin(_): SuperAdmin,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<NotificationResponse>, ApiErr> {
    let model = get_or_404::<notification::Entity>(&state.db, id, "Notification").await?;
    let recipient = get_or_404::<user::Entity>(&state.db, model.recipient_id, "User").await?;
    let college = match model.college_id {
        Some(cid) => college::Entity::find_by_id(cid)
            .one(&state.db)
            .await
            .map_err(ApiErr::internal)?,
        None => None,
    };

    let mut active: notification::ActiveModel = model.into();
    active.is_read = Set(true);
    let updated = active.update(&state.db).await.map_err(ApiErr::internal)?;

    let label = updated.display(&recipient, college.as_ref());
    Ok(Json(NotificationResponse::new(updated, label)))
}

pub async fn delete_notification(
    SuperAdmin(_): SuperAdmin,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiErr> {
    let model = get_or_404::<notification::Entity>(&state.db, id, "Notification").await?;
    let active: notification::ActiveModel = model.into();
    active.delete(&state.db).await.map_err(ApiErr::internal)?;
    Ok(StatusCode::NO_CONTENT)
}
