use chrono::Utc;
use sea_orm::ActiveValue::NotSet;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder,
    QuerySelect, Set,
};
use uuid::Uuid;

use crate::{
    audit::log_audit,
    dto::coupons::{
        CouponList, CreateCouponRequest, PreviewCouponRequest, PreviewCouponResponse,
        UpdateCouponRequest,
    },
    entity::coupons::{ActiveModel as CouponActive, Column as CouponCol, Entity as Coupons},
    error::{AppError, AppResult},
    middleware::auth::AuthUser,
    models::Coupon,
    policy::{Permission, require},
    pricing::coupon_discount,
    response::{ApiResponse, Meta},
    routes::params::Pagination,
    services::convert::coupon_from_entity,
    state::AppState,
};

pub async fn list_coupons(
    state: &AppState,
    user: &AuthUser,
    pagination: Pagination,
) -> AppResult<ApiResponse<CouponList>> {
    require(user.role, Permission::ManageStore)?;
    let (page, limit, offset) = pagination.normalize();

    let finder = Coupons::find().order_by_desc(CouponCol::CreatedAt);
    let total = finder.clone().count(&state.orm).await? as i64;
    let items = finder
        .limit(limit as u64)
        .offset(offset as u64)
        .all(&state.orm)
        .await?
        .into_iter()
        .map(coupon_from_entity)
        .collect();

    Ok(ApiResponse::success(
        "Coupons",
        CouponList { items },
        Some(Meta::new(page, limit, total)),
    ))
}

pub async fn create_coupon(
    state: &AppState,
    user: &AuthUser,
    payload: CreateCouponRequest,
) -> AppResult<ApiResponse<Coupon>> {
    require(user.role, Permission::ManageStore)?;

    let code = payload.code.trim().to_uppercase();
    if code.is_empty() {
        return Err(AppError::BadRequest("code must not be empty".into()));
    }
    if !matches!(payload.kind.as_str(), "percentage" | "fixed") {
        return Err(AppError::BadRequest(
            "kind must be percentage or fixed".into(),
        ));
    }
    if payload.kind == "percentage" && !(1..=100).contains(&payload.value) {
        return Err(AppError::BadRequest(
            "percentage value must be between 1 and 100".into(),
        ));
    }
    if payload.value <= 0 || payload.usage_limit <= 0 {
        return Err(AppError::BadRequest(
            "value and usage_limit must be positive".into(),
        ));
    }
    if payload.valid_until <= payload.valid_from {
        return Err(AppError::BadRequest(
            "valid_until must be after valid_from".into(),
        ));
    }

    let exists = Coupons::find()
        .filter(CouponCol::Code.eq(code.clone()))
        .one(&state.orm)
        .await?;
    if exists.is_some() {
        return Err(AppError::Conflict("coupon code already exists".into()));
    }

    let coupon = CouponActive {
        id: Set(Uuid::new_v4()),
        code: Set(code),
        kind: Set(payload.kind),
        value: Set(payload.value),
        min_order_value: Set(payload.min_order_value.unwrap_or(0)),
        max_discount: Set(payload.max_discount),
        usage_limit: Set(payload.usage_limit),
        used_count: Set(0),
        valid_from: Set(payload.valid_from.into()),
        valid_until: Set(payload.valid_until.into()),
        active: Set(true),
        created_at: NotSet,
    }
    .insert(&state.orm)
    .await?;

    if let Err(err) = log_audit(
        &state.pool,
        Some(user.user_id),
        "coupon_create",
        Some("coupons"),
        Some(serde_json::json!({ "coupon_id": coupon.id, "code": coupon.code })),
    )
    .await
    {
        tracing::warn!(error = %err, "audit log failed");
    }

    Ok(ApiResponse::success(
        "Coupon created",
        coupon_from_entity(coupon),
        Some(Meta::empty()),
    ))
}

pub async fn update_coupon(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
    payload: UpdateCouponRequest,
) -> AppResult<ApiResponse<Coupon>> {
    require(user.role, Permission::ManageStore)?;

    let existing = Coupons::find_by_id(id).one(&state.orm).await?;
    let existing = match existing {
        Some(c) => c,
        None => return Err(AppError::NotFound),
    };

    let mut active: CouponActive = existing.into();
    if let Some(value) = payload.value {
        if value <= 0 {
            return Err(AppError::BadRequest("value must be positive".into()));
        }
        active.value = Set(value);
    }
    if let Some(min) = payload.min_order_value {
        active.min_order_value = Set(min);
    }
    if payload.max_discount.is_some() {
        active.max_discount = Set(payload.max_discount);
    }
    if let Some(limit) = payload.usage_limit {
        active.usage_limit = Set(limit);
    }
    if let Some(until) = payload.valid_until {
        active.valid_until = Set(until.into());
    }
    if let Some(is_active) = payload.active {
        active.active = Set(is_active);
    }

    let coupon = active.update(&state.orm).await?;
    Ok(ApiResponse::success(
        "Coupon updated",
        coupon_from_entity(coupon),
        Some(Meta::empty()),
    ))
}

/// Dry-run a coupon against a subtotal; nothing is redeemed.
pub async fn preview_coupon(
    state: &AppState,
    payload: PreviewCouponRequest,
) -> AppResult<ApiResponse<PreviewCouponResponse>> {
    let code = payload.code.trim().to_uppercase();
    let coupon = Coupons::find()
        .filter(CouponCol::Code.eq(code.clone()))
        .one(&state.orm)
        .await?
        .ok_or_else(|| AppError::BadRequest("coupon not found".into()))?;

    let discount = coupon_discount(&coupon, payload.subtotal, Utc::now())
        .map_err(|e| AppError::BadRequest(e.to_string()))?;

    Ok(ApiResponse::success(
        "Coupon applies",
        PreviewCouponResponse {
            code,
            discount,
            payable: payload.subtotal - discount,
        },
        Some(Meta::empty()),
    ))
}
