use axum::{
    Json, Router,
    extract::{Path, Query, State},
    routing::{delete, get, patch, post, put},
};
use serde::Deserialize;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::{
    dto::admin::{
        ChangeRoleRequest, DecideRequest, InventoryAdjustRequest, RefundList,
        UpdateOrderStatusRequest, UserList,
    },
    dto::contact::{
        ContactMessageList, CreateAnnouncementRequest, UpdateAnnouncementRequest,
    },
    dto::orders::{OrderList, OrderWithItems},
    dto::products::ProductList,
    dto::sellers::{ApplicationList, ApprovalResponse},
    error::AppResult,
    middleware::auth::AuthUser,
    models::{Announcement, ContactMessage, Order, PayoutRequest, Product, Refund, Review, User},
    response::ApiResponse,
    routes::params::{LowStockQuery, OrderListQuery, Pagination},
    services::{admin_service, content_service, review_service, seller_service},
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/orders", get(list_all_orders))
        .route("/orders/{id}", get(get_order_admin))
        .route("/orders/{id}/status", patch(update_order_status))
        .route("/inventory/low-stock", get(list_low_stock))
        .route("/inventory/{id}", patch(adjust_inventory))
        .route("/users", get(list_users))
        .route("/users/{id}/role", patch(change_role))
        .route("/applications", get(list_applications))
        .route("/applications/{id}/decision", post(decide_application))
        .route("/refunds", get(list_refunds))
        .route("/refunds/{id}/decision", post(decide_refund))
        .route("/payouts", get(list_payouts))
        .route("/payouts/{id}/decision", post(decide_payout))
        .route("/reviews/{id}/status", patch(moderate_review))
        .route("/contact-messages", get(list_contact_messages))
        .route("/contact-messages/{id}/close", post(close_contact_message))
        .route("/announcements", post(create_announcement))
        .route("/announcements/{id}", put(update_announcement))
        .route("/announcements/{id}", delete(delete_announcement))
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct ApplicationListQuery {
    #[serde(flatten)]
    pub pagination: Pagination,
    pub status: Option<String>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct ModerateReviewRequest {
    pub status: String,
}

#[utoipa::path(
    get,
    path = "/api/admin/orders",
    params(
        ("page" = Option<i64>, Query, description = "Page number, default 1"),
        ("per_page" = Option<i64>, Query, description = "Items per page, default 20"),
        ("status" = Option<String>, Query, description = "Filter by status"),
        ("sort_order" = Option<String>, Query, description = "Sort order: asc, desc")
    ),
    responses(
        (status = 200, description = "Get all orders (admin only)", body = ApiResponse<OrderList>),
        (status = 403, description = "Forbidden"),
    ),
    security(("bearer_auth" = [])),
    tag = "Admin"
)]
pub async fn list_all_orders(
    State(state): State<AppState>,
    user: AuthUser,
    Query(query): Query<OrderListQuery>,
) -> AppResult<Json<ApiResponse<OrderList>>> {
    let resp = admin_service::list_all_orders(&state, &user, query).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    get,
    path = "/api/admin/orders/{id}",
    params(("id" = Uuid, Path, description = "Order ID")),
    responses(
        (status = 200, description = "Any order with items (admin only)", body = ApiResponse<OrderWithItems>),
        (status = 404, description = "Not Found"),
        (status = 403, description = "Forbidden"),
    ),
    security(("bearer_auth" = [])),
    tag = "Admin"
)]
pub async fn get_order_admin(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<OrderWithItems>>> {
    let resp = admin_service::get_order_admin(&state, &user, id).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    patch,
    path = "/api/admin/orders/{id}/status",
    params(("id" = Uuid, Path, description = "Order ID")),
    request_body = UpdateOrderStatusRequest,
    responses(
        (status = 200, description = "Update order status", body = ApiResponse<Order>),
        (status = 400, description = "Invalid status"),
    ),
    security(("bearer_auth" = [])),
    tag = "Admin"
)]
pub async fn update_order_status(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateOrderStatusRequest>,
) -> AppResult<Json<ApiResponse<Order>>> {
    let resp = admin_service::update_order_status(&state, &user, id, payload).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    get,
    path = "/api/admin/inventory/low-stock",
    params(
        ("threshold" = Option<i32>, Query, description = "Stock threshold, default 5"),
        ("page" = Option<i64>, Query, description = "Page number, default 1"),
        ("per_page" = Option<i64>, Query, description = "Items per page, default 20")
    ),
    responses(
        (status = 200, description = "List low stock products", body = ApiResponse<ProductList>),
        (status = 403, description = "Forbidden")
    ),
    security(("bearer_auth" = [])),
    tag = "Admin"
)]
pub async fn list_low_stock(
    State(state): State<AppState>,
    user: AuthUser,
    Query(query): Query<LowStockQuery>,
) -> AppResult<Json<ApiResponse<ProductList>>> {
    let resp = admin_service::list_low_stock(&state, &user, query).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    patch,
    path = "/api/admin/inventory/{id}",
    params(("id" = Uuid, Path, description = "Product ID")),
    request_body = InventoryAdjustRequest,
    responses(
        (status = 200, description = "Adjust inventory", body = ApiResponse<Product>),
        (status = 400, description = "Invalid adjustment"),
    ),
    security(("bearer_auth" = [])),
    tag = "Admin"
)]
pub async fn adjust_inventory(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<InventoryAdjustRequest>,
) -> AppResult<Json<ApiResponse<Product>>> {
    let resp = admin_service::adjust_inventory(&state, &user, id, payload).await?;
    Ok(Json(resp))
}

#[utoipa::path(get, path = "/api/admin/users", tag = "Admin")]
pub async fn list_users(
    State(state): State<AppState>,
    user: AuthUser,
    Query(pagination): Query<Pagination>,
) -> AppResult<Json<ApiResponse<UserList>>> {
    let resp = admin_service::list_users(&state, &user, pagination).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    patch,
    path = "/api/admin/users/{id}/role",
    params(("id" = Uuid, Path, description = "User ID")),
    request_body = ChangeRoleRequest,
    responses(
        (status = 200, description = "Change a user's role (superadmin)", body = ApiResponse<User>),
        (status = 403, description = "Forbidden"),
    ),
    security(("bearer_auth" = [])),
    tag = "Admin"
)]
pub async fn change_role(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<ChangeRoleRequest>,
) -> AppResult<Json<ApiResponse<User>>> {
    let resp = admin_service::change_role(&state, &user, id, payload).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    get,
    path = "/api/admin/applications",
    params(
        ("status" = Option<String>, Query, description = "pending, approved, rejected"),
        ("page" = Option<i64>, Query, description = "Page number"),
        ("per_page" = Option<i64>, Query, description = "Items per page"),
    ),
    responses(
        (status = 200, description = "Seller applications", body = ApiResponse<ApplicationList>)
    ),
    security(("bearer_auth" = [])),
    tag = "Admin"
)]
pub async fn list_applications(
    State(state): State<AppState>,
    user: AuthUser,
    Query(query): Query<ApplicationListQuery>,
) -> AppResult<Json<ApiResponse<ApplicationList>>> {
    let resp =
        seller_service::list_applications(&state, &user, query.pagination, query.status).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    post,
    path = "/api/admin/applications/{id}/decision",
    params(("id" = Uuid, Path, description = "Application ID")),
    request_body = DecideRequest,
    responses(
        (status = 200, description = "Approve (creates shop, promotes user) or reject", body = ApiResponse<ApprovalResponse>),
    ),
    security(("bearer_auth" = [])),
    tag = "Admin"
)]
pub async fn decide_application(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<DecideRequest>,
) -> AppResult<Json<ApiResponse<ApprovalResponse>>> {
    let resp = seller_service::decide_application(&state, &user, id, payload).await?;
    Ok(Json(resp))
}

#[utoipa::path(get, path = "/api/admin/refunds", tag = "Admin")]
pub async fn list_refunds(
    State(state): State<AppState>,
    user: AuthUser,
    Query(pagination): Query<Pagination>,
) -> AppResult<Json<ApiResponse<RefundList>>> {
    let resp = admin_service::list_refunds(&state, &user, pagination).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    post,
    path = "/api/admin/refunds/{id}/decision",
    params(("id" = Uuid, Path, description = "Refund ID")),
    request_body = DecideRequest,
    responses(
        (status = 200, description = "Approve or reject a refund", body = ApiResponse<Refund>)
    ),
    security(("bearer_auth" = [])),
    tag = "Admin"
)]
pub async fn decide_refund(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<DecideRequest>,
) -> AppResult<Json<ApiResponse<Refund>>> {
    let resp = admin_service::decide_refund(&state, &user, id, payload).await?;
    Ok(Json(resp))
}

#[utoipa::path(get, path = "/api/admin/payouts", tag = "Admin")]
pub async fn list_payouts(
    State(state): State<AppState>,
    user: AuthUser,
    Query(pagination): Query<Pagination>,
) -> AppResult<Json<ApiResponse<crate::dto::admin::PayoutList>>> {
    let resp = seller_service::list_payouts(&state, &user, pagination).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    post,
    path = "/api/admin/payouts/{id}/decision",
    params(("id" = Uuid, Path, description = "Payout request ID")),
    request_body = DecideRequest,
    responses(
        (status = 200, description = "Mark payout paid or rejected", body = ApiResponse<PayoutRequest>)
    ),
    security(("bearer_auth" = [])),
    tag = "Admin"
)]
pub async fn decide_payout(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<DecideRequest>,
) -> AppResult<Json<ApiResponse<PayoutRequest>>> {
    let resp = seller_service::decide_payout(&state, &user, id, payload).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    patch,
    path = "/api/admin/reviews/{id}/status",
    params(("id" = Uuid, Path, description = "Review ID")),
    request_body = ModerateReviewRequest,
    responses(
        (status = 200, description = "Hide or restore a review", body = ApiResponse<Review>)
    ),
    security(("bearer_auth" = [])),
    tag = "Admin"
)]
pub async fn moderate_review(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<ModerateReviewRequest>,
) -> AppResult<Json<ApiResponse<Review>>> {
    let resp = review_service::set_review_status(&state, &user, id, &payload.status).await?;
    Ok(Json(resp))
}

#[utoipa::path(get, path = "/api/admin/contact-messages", tag = "Admin")]
pub async fn list_contact_messages(
    State(state): State<AppState>,
    user: AuthUser,
    Query(pagination): Query<Pagination>,
) -> AppResult<Json<ApiResponse<ContactMessageList>>> {
    let resp = content_service::list_contact_messages(&state, &user, pagination).await?;
    Ok(Json(resp))
}

#[utoipa::path(post, path = "/api/admin/contact-messages/{id}/close", tag = "Admin")]
pub async fn close_contact_message(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<ContactMessage>>> {
    let resp = content_service::close_contact_message(&state, &user, id).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    post,
    path = "/api/admin/announcements",
    request_body = CreateAnnouncementRequest,
    responses(
        (status = 200, description = "Create announcement", body = ApiResponse<Announcement>)
    ),
    security(("bearer_auth" = [])),
    tag = "Admin"
)]
pub async fn create_announcement(
    State(state): State<AppState>,
    user: AuthUser,
    Json(payload): Json<CreateAnnouncementRequest>,
) -> AppResult<Json<ApiResponse<Announcement>>> {
    let resp = content_service::create_announcement(&state, &user, payload).await?;
    Ok(Json(resp))
}

#[utoipa::path(put, path = "/api/admin/announcements/{id}", tag = "Admin")]
pub async fn update_announcement(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateAnnouncementRequest>,
) -> AppResult<Json<ApiResponse<Announcement>>> {
    let resp = content_service::update_announcement(&state, &user, id, payload).await?;
    Ok(Json(resp))
}

#[utoipa::path(delete, path = "/api/admin/announcements/{id}", tag = "Admin")]
pub async fn delete_announcement(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<serde_json::Value>>> {
    let resp = content_service::delete_announcement(&state, &user, id).await?;
    Ok(Json(resp))
}
