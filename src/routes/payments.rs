use axum::{
    Json, Router,
    extract::{Path, Query, State},
    routing::{get, post},
};
use uuid::Uuid;

use crate::{
    dto::payments::{InitiatePaymentResponse, IpnPayload, PaymentCallbackQuery},
    error::AppResult,
    middleware::auth::AuthUser,
    models::Payment,
    response::ApiResponse,
    services::payment_service,
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/{order_id}/initiate", post(initiate))
        .route("/callback", get(callback))
        .route("/ipn", post(ipn))
}

#[utoipa::path(
    post,
    path = "/api/payments/{order_id}/initiate",
    params(("order_id" = Uuid, Path, description = "Order ID")),
    responses(
        (status = 200, description = "Gateway redirect URL", body = ApiResponse<InitiatePaymentResponse>),
        (status = 400, description = "Order not payable"),
    ),
    security(("bearer_auth" = [])),
    tag = "Payments"
)]
pub async fn initiate(
    State(state): State<AppState>,
    user: AuthUser,
    Path(order_id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<InitiatePaymentResponse>>> {
    let resp = payment_service::initiate(&state, &user, order_id).await?;
    Ok(Json(resp))
}

/// The gateway redirects the payer's browser here; no session is required
/// because the payment reference is the capability.
#[utoipa::path(
    get,
    path = "/api/payments/callback",
    params(
        ("payment_ref" = String, Query, description = "Gateway payment reference"),
        ("status" = Option<String>, Query, description = "Gateway-reported status"),
    ),
    responses(
        (status = 200, description = "Payment verified or recorded failed", body = ApiResponse<Payment>)
    ),
    tag = "Payments"
)]
pub async fn callback(
    State(state): State<AppState>,
    Query(query): Query<PaymentCallbackQuery>,
) -> AppResult<Json<ApiResponse<Payment>>> {
    let resp = payment_service::handle_callback(&state, query).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    post,
    path = "/api/payments/ipn",
    request_body = IpnPayload,
    responses(
        (status = 200, description = "IPN processed"),
        (status = 401, description = "Bad signature"),
    ),
    tag = "Payments"
)]
pub async fn ipn(
    State(state): State<AppState>,
    Json(payload): Json<IpnPayload>,
) -> AppResult<Json<ApiResponse<serde_json::Value>>> {
    let resp = payment_service::handle_ipn(&state, payload).await?;
    Ok(Json(resp))
}
