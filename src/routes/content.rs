use axum::{Json, Router, extract::State, routing::{get, post}};

use crate::{
    dto::contact::{AnnouncementList, ContactRequest},
    error::AppResult,
    models::ContactMessage,
    response::ApiResponse,
    services::content_service,
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/announcements", get(list_announcements))
        .route("/contact", post(submit_contact))
}

#[utoipa::path(
    get,
    path = "/api/announcements",
    responses(
        (status = 200, description = "Active announcements", body = ApiResponse<AnnouncementList>)
    ),
    tag = "Content"
)]
pub async fn list_announcements(
    State(state): State<AppState>,
) -> AppResult<Json<ApiResponse<AnnouncementList>>> {
    let resp = content_service::list_active_announcements(&state).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    post,
    path = "/api/contact",
    request_body = ContactRequest,
    responses(
        (status = 200, description = "Store a contact message", body = ApiResponse<ContactMessage>)
    ),
    tag = "Content"
)]
pub async fn submit_contact(
    State(state): State<AppState>,
    Json(payload): Json<ContactRequest>,
) -> AppResult<Json<ApiResponse<ContactMessage>>> {
    let resp = content_service::submit_contact(&state, payload).await?;
    Ok(Json(resp))
}
