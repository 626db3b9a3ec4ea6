//! Announcements and contact messages.

use uuid::Uuid;

use crate::{
    dto::contact::{
        AnnouncementList, ContactMessageList, ContactRequest, CreateAnnouncementRequest,
        UpdateAnnouncementRequest,
    },
    error::{AppError, AppResult},
    middleware::auth::AuthUser,
    models::{Announcement, ContactMessage},
    policy::{Permission, require},
    response::{ApiResponse, Meta},
    routes::params::Pagination,
    state::AppState,
};

/// Active announcements inside their display window, storefront-visible.
pub async fn list_active_announcements(
    state: &AppState,
) -> AppResult<ApiResponse<AnnouncementList>> {
    let items = sqlx::query_as::<_, Announcement>(
        r#"
        SELECT * FROM announcements
        WHERE active = true
          AND starts_at <= now()
          AND (ends_at IS NULL OR ends_at > now())
        ORDER BY created_at DESC
        "#,
    )
    .fetch_all(&state.pool)
    .await?;

    Ok(ApiResponse::success(
        "Announcements",
        AnnouncementList { items },
        None,
    ))
}

pub async fn create_announcement(
    state: &AppState,
    user: &AuthUser,
    payload: CreateAnnouncementRequest,
) -> AppResult<ApiResponse<Announcement>> {
    require(user.role, Permission::ManageStore)?;

    let audience = payload.audience.unwrap_or_else(|| "all".to_string());
    if !matches!(audience.as_str(), "all" | "sellers" | "customers") {
        return Err(AppError::BadRequest("invalid audience".into()));
    }

    let announcement = sqlx::query_as::<_, Announcement>(
        r#"
        INSERT INTO announcements (id, title, body, audience, starts_at, ends_at)
        VALUES ($1, $2, $3, $4, COALESCE($5, now()), $6)
        RETURNING *
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(payload.title)
    .bind(payload.body)
    .bind(audience)
    .bind(payload.starts_at)
    .bind(payload.ends_at)
    .fetch_one(&state.pool)
    .await?;

    Ok(ApiResponse::success(
        "Announcement created",
        announcement,
        None,
    ))
}

pub async fn update_announcement(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
    payload: UpdateAnnouncementRequest,
) -> AppResult<ApiResponse<Announcement>> {
    require(user.role, Permission::ManageStore)?;

    let existing = sqlx::query_as::<_, Announcement>("SELECT * FROM announcements WHERE id = $1")
        .bind(id)
        .fetch_optional(&state.pool)
        .await?;
    let existing = match existing {
        Some(a) => a,
        None => return Err(AppError::NotFound),
    };

    let title = payload.title.unwrap_or(existing.title);
    let body = payload.body.unwrap_or(existing.body);
    let audience = payload.audience.unwrap_or(existing.audience);
    let active = payload.active.unwrap_or(existing.active);
    let ends_at = payload.ends_at.or(existing.ends_at);

    let announcement = sqlx::query_as::<_, Announcement>(
        r#"
        UPDATE announcements
        SET title = $2, body = $3, audience = $4, active = $5, ends_at = $6
        WHERE id = $1
        RETURNING *
        "#,
    )
    .bind(id)
    .bind(title)
    .bind(body)
    .bind(audience)
    .bind(active)
    .bind(ends_at)
    .fetch_one(&state.pool)
    .await?;

    Ok(ApiResponse::success("Announcement updated", announcement, None))
}

pub async fn delete_announcement(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
) -> AppResult<ApiResponse<serde_json::Value>> {
    require(user.role, Permission::ManageStore)?;

    let result = sqlx::query("DELETE FROM announcements WHERE id = $1")
        .bind(id)
        .execute(&state.pool)
        .await?;
    if result.rows_affected() == 0 {
        return Err(AppError::NotFound);
    }

    Ok(ApiResponse::success(
        "Deleted",
        serde_json::json!({}),
        Some(Meta::empty()),
    ))
}

pub async fn submit_contact(
    state: &AppState,
    payload: ContactRequest,
) -> AppResult<ApiResponse<ContactMessage>> {
    if payload.email.trim().is_empty() || !payload.email.contains('@') {
        return Err(AppError::BadRequest("a valid email is required".into()));
    }
    if payload.body.trim().is_empty() {
        return Err(AppError::BadRequest("message body is required".into()));
    }

    let message = sqlx::query_as::<_, ContactMessage>(
        r#"
        INSERT INTO contact_messages (id, name, email, subject, body)
        VALUES ($1, $2, $3, $4, $5)
        RETURNING *
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(payload.name)
    .bind(payload.email)
    .bind(payload.subject)
    .bind(payload.body)
    .fetch_one(&state.pool)
    .await?;

    Ok(ApiResponse::success("Message received", message, None))
}

pub async fn list_contact_messages(
    state: &AppState,
    user: &AuthUser,
    pagination: Pagination,
) -> AppResult<ApiResponse<ContactMessageList>> {
    require(user.role, Permission::ManageStore)?;
    let (page, limit, offset) = pagination.normalize();

    let items = sqlx::query_as::<_, ContactMessage>(
        "SELECT * FROM contact_messages ORDER BY created_at DESC LIMIT $1 OFFSET $2",
    )
    .bind(limit)
    .bind(offset)
    .fetch_all(&state.pool)
    .await?;

    let total: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM contact_messages")
        .fetch_one(&state.pool)
        .await?;

    Ok(ApiResponse::success(
        "Contact messages",
        ContactMessageList { items },
        Some(Meta::new(page, limit, total.0)),
    ))
}

pub async fn close_contact_message(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
) -> AppResult<ApiResponse<ContactMessage>> {
    require(user.role, Permission::ManageStore)?;

    let message: Option<ContactMessage> =
        sqlx::query_as("UPDATE contact_messages SET status = 'closed' WHERE id = $1 RETURNING *")
            .bind(id)
            .fetch_optional(&state.pool)
            .await?;
    match message {
        Some(m) => Ok(ApiResponse::success("Closed", m, None)),
        None => Err(AppError::NotFound),
    }
}
