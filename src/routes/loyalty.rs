use axum::{
    Json, Router,
    extract::State,
    routing::{get, post},
};

use crate::{
    dto::loyalty::{LoyaltyOverview, RedeemPointsRequest, RedeemPointsResponse, TierList},
    error::AppResult,
    middleware::auth::AuthUser,
    response::ApiResponse,
    services::loyalty_service,
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(overview))
        .route("/redeem", post(redeem))
        .route("/tiers", get(tiers))
}

#[utoipa::path(
    get,
    path = "/api/loyalty",
    responses(
        (status = 200, description = "Own loyalty account and tier progress", body = ApiResponse<LoyaltyOverview>)
    ),
    security(("bearer_auth" = [])),
    tag = "Loyalty"
)]
pub async fn overview(
    State(state): State<AppState>,
    user: AuthUser,
) -> AppResult<Json<ApiResponse<LoyaltyOverview>>> {
    let resp = loyalty_service::overview(&state, &user).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    post,
    path = "/api/loyalty/redeem",
    request_body = RedeemPointsRequest,
    responses(
        (status = 200, description = "Redeem points for credit", body = ApiResponse<RedeemPointsResponse>),
        (status = 400, description = "Not enough points"),
    ),
    security(("bearer_auth" = [])),
    tag = "Loyalty"
)]
pub async fn redeem(
    State(state): State<AppState>,
    user: AuthUser,
    Json(payload): Json<RedeemPointsRequest>,
) -> AppResult<Json<ApiResponse<RedeemPointsResponse>>> {
    let resp = loyalty_service::redeem(&state, &user, payload).await?;
    Ok(Json(resp))
}

#[utoipa::path(get, path = "/api/loyalty/tiers", tag = "Loyalty")]
pub async fn tiers() -> Json<ApiResponse<TierList>> {
    Json(loyalty_service::tiers())
}
