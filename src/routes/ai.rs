use axum::{
    Json, Router,
    extract::State,
    routing::{get, post},
};

use crate::{
    dto::ai::{AiFlags, FaqRequest, FraudCheckRequest, GeneratedText, ProductCopyRequest},
    error::AppResult,
    middleware::auth::AuthUser,
    response::ApiResponse,
    services::ai_service,
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/product-copy", post(product_copy))
        .route("/faq", post(product_faq))
        .route("/fraud-check", post(fraud_check))
        .route("/flags", get(get_flags).put(update_flags))
}

#[utoipa::path(
    post,
    path = "/api/ai/product-copy",
    request_body = ProductCopyRequest,
    responses(
        (status = 200, description = "Generated product description", body = ApiResponse<GeneratedText>),
        (status = 400, description = "Feature disabled or not configured"),
    ),
    security(("bearer_auth" = [])),
    tag = "AI"
)]
pub async fn product_copy(
    State(state): State<AppState>,
    user: AuthUser,
    Json(payload): Json<ProductCopyRequest>,
) -> AppResult<Json<ApiResponse<GeneratedText>>> {
    let resp = ai_service::product_copy(&state, &user, payload).await?;
    Ok(Json(resp))
}

#[utoipa::path(post, path = "/api/ai/faq", tag = "AI")]
pub async fn product_faq(
    State(state): State<AppState>,
    user: AuthUser,
    Json(payload): Json<FaqRequest>,
) -> AppResult<Json<ApiResponse<GeneratedText>>> {
    let resp = ai_service::product_faq(&state, &user, payload).await?;
    Ok(Json(resp))
}

#[utoipa::path(post, path = "/api/ai/fraud-check", tag = "AI")]
pub async fn fraud_check(
    State(state): State<AppState>,
    user: AuthUser,
    Json(payload): Json<FraudCheckRequest>,
) -> AppResult<Json<ApiResponse<GeneratedText>>> {
    let resp = ai_service::fraud_check(&state, &user, payload).await?;
    Ok(Json(resp))
}

#[utoipa::path(get, path = "/api/ai/flags", tag = "AI")]
pub async fn get_flags(
    State(state): State<AppState>,
    user: AuthUser,
) -> AppResult<Json<ApiResponse<AiFlags>>> {
    let resp = ai_service::get_flags(&state, &user).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    put,
    path = "/api/ai/flags",
    request_body = AiFlags,
    responses(
        (status = 200, description = "Update AI feature flags (superadmin)", body = ApiResponse<AiFlags>),
        (status = 403, description = "Forbidden"),
    ),
    security(("bearer_auth" = [])),
    tag = "AI"
)]
pub async fn update_flags(
    State(state): State<AppState>,
    user: AuthUser,
    Json(payload): Json<AiFlags>,
) -> AppResult<Json<ApiResponse<AiFlags>>> {
    let resp = ai_service::update_flags(&state, &user, payload).await?;
    Ok(Json(resp))
}
