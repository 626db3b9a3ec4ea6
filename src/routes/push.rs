use axum::{
    Json, Router,
    extract::State,
    routing::{delete, post},
};

use crate::{
    dto::push::{
        BroadcastRequest, BroadcastResult, SubscribeRequest, SubscriptionResponse,
        UnsubscribeRequest,
    },
    error::AppResult,
    middleware::auth::AuthUser,
    response::ApiResponse,
    services::push_service,
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/subscribe", post(subscribe).delete(unsubscribe))
        .route("/broadcast", post(broadcast))
}

#[utoipa::path(
    post,
    path = "/api/push/subscribe",
    request_body = SubscribeRequest,
    responses(
        (status = 200, description = "Register browser push subscription", body = ApiResponse<SubscriptionResponse>)
    ),
    security(("bearer_auth" = [])),
    tag = "Push"
)]
pub async fn subscribe(
    State(state): State<AppState>,
    user: AuthUser,
    Json(payload): Json<SubscribeRequest>,
) -> AppResult<Json<ApiResponse<SubscriptionResponse>>> {
    let resp = push_service::subscribe(&state, &user, payload).await?;
    Ok(Json(resp))
}

#[utoipa::path(delete, path = "/api/push/subscribe", tag = "Push")]
pub async fn unsubscribe(
    State(state): State<AppState>,
    user: AuthUser,
    Json(payload): Json<UnsubscribeRequest>,
) -> AppResult<Json<ApiResponse<serde_json::Value>>> {
    let resp = push_service::unsubscribe(&state, &user, payload).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    post,
    path = "/api/push/broadcast",
    request_body = BroadcastRequest,
    responses(
        (status = 200, description = "Broadcast to all active subscriptions (admin)", body = ApiResponse<BroadcastResult>),
        (status = 403, description = "Forbidden"),
    ),
    security(("bearer_auth" = [])),
    tag = "Push"
)]
pub async fn broadcast(
    State(state): State<AppState>,
    user: AuthUser,
    Json(payload): Json<BroadcastRequest>,
) -> AppResult<Json<ApiResponse<BroadcastResult>>> {
    let resp = push_service::broadcast(&state, &user, payload).await?;
    Ok(Json(resp))
}
