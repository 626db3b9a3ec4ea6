use axum::{
    Json, Router,
    extract::State,
    routing::{get, post},
};

use crate::{
    dto::sellers::{ApplyRequest, PayoutRequestBody},
    error::AppResult,
    middleware::auth::AuthUser,
    models::{PayoutRequest, SellerApplication},
    response::ApiResponse,
    services::seller_service,
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/apply", post(apply))
        .route("/application", get(my_application))
        .route("/payouts", post(request_payout))
}

#[utoipa::path(
    post,
    path = "/api/sellers/apply",
    request_body = ApplyRequest,
    responses(
        (status = 200, description = "Submit seller application", body = ApiResponse<SellerApplication>),
        (status = 409, description = "Application already pending"),
    ),
    security(("bearer_auth" = [])),
    tag = "Sellers"
)]
pub async fn apply(
    State(state): State<AppState>,
    user: AuthUser,
    Json(payload): Json<ApplyRequest>,
) -> AppResult<Json<ApiResponse<SellerApplication>>> {
    let resp = seller_service::apply(&state, &user, payload).await?;
    Ok(Json(resp))
}

#[utoipa::path(get, path = "/api/sellers/application", tag = "Sellers")]
pub async fn my_application(
    State(state): State<AppState>,
    user: AuthUser,
) -> AppResult<Json<ApiResponse<SellerApplication>>> {
    let resp = seller_service::my_application(&state, &user).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    post,
    path = "/api/sellers/payouts",
    request_body = PayoutRequestBody,
    responses(
        (status = 200, description = "Request payout of earned balance", body = ApiResponse<PayoutRequest>),
        (status = 400, description = "Exceeds available balance"),
    ),
    security(("bearer_auth" = [])),
    tag = "Sellers"
)]
pub async fn request_payout(
    State(state): State<AppState>,
    user: AuthUser,
    Json(payload): Json<PayoutRequestBody>,
) -> AppResult<Json<ApiResponse<PayoutRequest>>> {
    let resp = seller_service::request_payout(&state, &user, payload).await?;
    Ok(Json(resp))
}
