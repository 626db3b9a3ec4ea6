use chrono::Utc;
use sea_orm::ActiveValue::Set;
use sea_orm::sea_query::LockType;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder, QuerySelect, TransactionTrait,
};
use uuid::Uuid;

use crate::{
    audit::log_audit,
    dto::admin::{
        ChangeRoleRequest, DecideRequest, InventoryAdjustRequest, RefundList, RefundRequestBody,
        UpdateOrderStatusRequest, UserList,
    },
    dto::orders::{OrderList, OrderWithItems},
    dto::products::ProductList,
    entity::{
        order_items::{Column as OrderItemCol, Entity as OrderItems},
        orders::{ActiveModel as OrderActive, Column as OrderCol, Entity as Orders},
        payments::{ActiveModel as PaymentActive, Column as PaymentCol, Entity as Payments},
        products::{ActiveModel as ProductActive, Column as ProdCol, Entity as Products},
        refunds::{ActiveModel as RefundActive, Column as RefundCol, Entity as Refunds},
    },
    error::{AppError, AppResult},
    middleware::auth::AuthUser,
    models::{Order, Product, Refund, User},
    policy::{Permission, Role, require},
    response::{ApiResponse, Meta},
    routes::params::{LowStockQuery, OrderListQuery, Pagination, SortOrder},
    services::convert::{
        order_from_entity, order_item_from_entity, product_from_entity, refund_from_entity,
    },
    state::AppState,
};

pub async fn list_all_orders(
    state: &AppState,
    user: &AuthUser,
    query: OrderListQuery,
) -> AppResult<ApiResponse<OrderList>> {
    require(user.role, Permission::ManageStore)?;
    let (page, limit, offset) = query.pagination.normalize();

    let mut condition = Condition::all();
    if let Some(status) = query.status.as_ref().filter(|s| !s.is_empty()) {
        condition = condition.add(OrderCol::Status.eq(status.clone()));
    }

    let mut finder = Orders::find().filter(condition);
    let sort_order = query.sort_order.unwrap_or(SortOrder::Desc);
    finder = match sort_order {
        SortOrder::Asc => finder.order_by_asc(OrderCol::CreatedAt),
        SortOrder::Desc => finder.order_by_desc(OrderCol::CreatedAt),
    };

    let total = finder.clone().count(&state.orm).await? as i64;
    let orders = finder
        .limit(limit as u64)
        .offset(offset as u64)
        .all(&state.orm)
        .await?
        .into_iter()
        .map(order_from_entity)
        .collect();

    let meta = Meta::new(page, limit, total);
    Ok(ApiResponse::success(
        "Orders",
        OrderList { items: orders },
        Some(meta),
    ))
}

pub async fn get_order_admin(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
) -> AppResult<ApiResponse<OrderWithItems>> {
    require(user.role, Permission::ManageStore)?;
    let order = Orders::find_by_id(id)
        .one(&state.orm)
        .await?
        .map(order_from_entity);
    let order = match order {
        Some(o) => o,
        None => return Err(AppError::NotFound),
    };

    let items = OrderItems::find()
        .filter(OrderItemCol::OrderId.eq(order.id))
        .all(&state.orm)
        .await?
        .into_iter()
        .map(order_item_from_entity)
        .collect();

    Ok(ApiResponse::success(
        "Order found",
        OrderWithItems { order, items },
        Some(Meta::empty()),
    ))
}

pub async fn update_order_status(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
    payload: UpdateOrderStatusRequest,
) -> AppResult<ApiResponse<Order>> {
    require(user.role, Permission::ManageStore)?;
    validate_order_status(&payload.status)?;

    let existing = Orders::find_by_id(id).one(&state.orm).await?;
    let existing = match existing {
        Some(o) => o,
        None => return Err(AppError::NotFound),
    };

    let mut active: OrderActive = existing.into();
    active.status = Set(payload.status);
    active.updated_at = Set(Utc::now().into());
    let order = active.update(&state.orm).await?;

    if let Err(err) = log_audit(
        &state.pool,
        Some(user.user_id),
        "order_status_update",
        Some("orders"),
        Some(serde_json::json!({ "order_id": order.id, "status": order.status })),
    )
    .await
    {
        tracing::warn!(error = %err, "audit log failed");
    }

    Ok(ApiResponse::success(
        "Order updated",
        order_from_entity(order),
        Some(Meta::empty()),
    ))
}

pub async fn list_low_stock(
    state: &AppState,
    user: &AuthUser,
    query: LowStockQuery,
) -> AppResult<ApiResponse<ProductList>> {
    require(user.role, Permission::ManageStore)?;
    let threshold = query.threshold.unwrap_or(5);
    let (page, limit, offset) = query.pagination.normalize();

    let finder = Products::find()
        .filter(ProdCol::Stock.lte(threshold))
        .order_by_asc(ProdCol::Stock)
        .order_by_desc(ProdCol::CreatedAt);

    let total = finder.clone().count(&state.orm).await? as i64;
    let items: Vec<Product> = finder
        .limit(limit as u64)
        .offset(offset as u64)
        .all(&state.orm)
        .await?
        .into_iter()
        .map(product_from_entity)
        .collect();

    let meta = Meta::new(page, limit, total);
    Ok(ApiResponse::success("Low stock", ProductList { items }, Some(meta)))
}

pub async fn adjust_inventory(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
    payload: InventoryAdjustRequest,
) -> AppResult<ApiResponse<Product>> {
    require(user.role, Permission::ManageStore)?;
    if payload.delta == 0 {
        return Err(AppError::BadRequest("delta must not be 0".into()));
    }

    let txn = state.orm.begin().await?;
    let product = Products::find_by_id(id)
        .lock(LockType::Update)
        .one(&txn)
        .await?;
    let product = match product {
        Some(p) => p,
        None => return Err(AppError::NotFound),
    };

    let new_stock = product.stock + payload.delta;
    if new_stock < 0 {
        return Err(AppError::BadRequest("stock cannot be negative".into()));
    }

    let mut active: ProductActive = product.into();
    active.stock = Set(new_stock);
    let updated = active.update(&txn).await?;

    txn.commit().await?;
    state.cache.invalidate_all();

    if let Err(err) = log_audit(
        &state.pool,
        Some(user.user_id),
        "inventory_adjust",
        Some("products"),
        Some(serde_json::json!({ "product_id": updated.id, "delta": payload.delta })),
    )
    .await
    {
        tracing::warn!(error = %err, "audit log failed");
    }

    Ok(ApiResponse::success(
        "Inventory updated",
        product_from_entity(updated),
        Some(Meta::empty()),
    ))
}

pub async fn list_users(
    state: &AppState,
    user: &AuthUser,
    pagination: Pagination,
) -> AppResult<ApiResponse<UserList>> {
    require(user.role, Permission::ManageStore)?;
    let (page, limit, offset) = pagination.normalize();

    let items = sqlx::query_as::<_, User>(
        "SELECT * FROM users ORDER BY created_at DESC LIMIT $1 OFFSET $2",
    )
    .bind(limit)
    .bind(offset)
    .fetch_all(&state.pool)
    .await?;

    let total: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM users")
        .fetch_one(&state.pool)
        .await?;

    Ok(ApiResponse::success(
        "Users",
        UserList { items },
        Some(Meta::new(page, limit, total.0)),
    ))
}

/// Role changes are superadmin territory.
pub async fn change_role(
    state: &AppState,
    user: &AuthUser,
    target_id: Uuid,
    payload: ChangeRoleRequest,
) -> AppResult<ApiResponse<User>> {
    require(user.role, Permission::ManagePlatform)?;
    let new_role: Role = payload.role.parse().map_err(|_: AppError| {
        AppError::BadRequest("unknown role".into())
    })?;

    if target_id == user.user_id {
        return Err(AppError::BadRequest("cannot change your own role".into()));
    }

    let updated: Option<User> =
        sqlx::query_as("UPDATE users SET role = $2 WHERE id = $1 RETURNING *")
            .bind(target_id)
            .bind(new_role.as_str())
            .fetch_optional(&state.pool)
            .await?;
    let updated = match updated {
        Some(u) => u,
        None => return Err(AppError::NotFound),
    };

    if let Err(err) = log_audit(
        &state.pool,
        Some(user.user_id),
        "role_change",
        Some("users"),
        Some(serde_json::json!({ "target": target_id, "role": new_role.as_str() })),
    )
    .await
    {
        tracing::warn!(error = %err, "audit log failed");
    }

    Ok(ApiResponse::success("Role updated", updated, None))
}

/// Customer asks for their money back on a paid order.
pub async fn request_refund(
    state: &AppState,
    user: &AuthUser,
    payload: RefundRequestBody,
) -> AppResult<ApiResponse<Refund>> {
    let order = Orders::find()
        .filter(
            Condition::all()
                .add(OrderCol::Id.eq(payload.order_id))
                .add(OrderCol::UserId.eq(user.user_id)),
        )
        .one(&state.orm)
        .await?
        .ok_or(AppError::NotFound)?;

    if order.payment_status != "paid" {
        return Err(AppError::BadRequest("order is not paid".into()));
    }

    let payment = Payments::find()
        .filter(
            Condition::all()
                .add(PaymentCol::OrderId.eq(order.id))
                .add(PaymentCol::Status.eq("completed")),
        )
        .one(&state.orm)
        .await?
        .ok_or_else(|| AppError::BadRequest("no completed payment for order".into()))?;

    let open = Refunds::find()
        .filter(
            Condition::all()
                .add(RefundCol::OrderId.eq(order.id))
                .add(RefundCol::Status.is_in(["requested", "approved"])),
        )
        .one(&state.orm)
        .await?;
    if open.is_some() {
        return Err(AppError::Conflict("a refund is already open for this order".into()));
    }

    let refund = RefundActive {
        id: Set(Uuid::new_v4()),
        order_id: Set(order.id),
        payment_id: Set(payment.id),
        amount: Set(order.total_amount),
        reason: Set(payload.reason),
        status: Set("requested".into()),
        decided_by: Set(None),
        created_at: sea_orm::ActiveValue::NotSet,
    }
    .insert(&state.orm)
    .await?;

    Ok(ApiResponse::success(
        "Refund requested",
        refund_from_entity(refund),
        None,
    ))
}

pub async fn list_refunds(
    state: &AppState,
    user: &AuthUser,
    pagination: Pagination,
) -> AppResult<ApiResponse<RefundList>> {
    require(user.role, Permission::ManageStore)?;
    let (page, limit, offset) = pagination.normalize();

    let finder = Refunds::find().order_by_desc(RefundCol::CreatedAt);
    let total = finder.clone().count(&state.orm).await? as i64;
    let items = finder
        .limit(limit as u64)
        .offset(offset as u64)
        .all(&state.orm)
        .await?
        .into_iter()
        .map(refund_from_entity)
        .collect();

    Ok(ApiResponse::success(
        "Refunds",
        RefundList { items },
        Some(Meta::new(page, limit, total)),
    ))
}

/// Approving a refund flips the payment and order to refunded in the same
/// transaction as the decision.
pub async fn decide_refund(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
    payload: DecideRequest,
) -> AppResult<ApiResponse<Refund>> {
    require(user.role, Permission::ManageStore)?;

    let txn = state.orm.begin().await?;

    let refund = Refunds::find_by_id(id)
        .lock(LockType::Update)
        .one(&txn)
        .await?
        .ok_or(AppError::NotFound)?;
    if refund.status != "requested" {
        return Err(AppError::BadRequest("refund already decided".into()));
    }

    let order_id = refund.order_id;
    let payment_id = refund.payment_id;
    let mut active: RefundActive = refund.into();
    active.status = Set(if payload.approve { "approved" } else { "rejected" }.into());
    active.decided_by = Set(Some(user.user_id));
    let refund = active.update(&txn).await?;

    if payload.approve {
        let payment = Payments::find_by_id(payment_id)
            .lock(LockType::Update)
            .one(&txn)
            .await?
            .ok_or(AppError::NotFound)?;
        let mut payment_active: PaymentActive = payment.into();
        payment_active.status = Set("refunded".into());
        payment_active.update(&txn).await?;

        let order = Orders::find_by_id(order_id)
            .lock(LockType::Update)
            .one(&txn)
            .await?
            .ok_or(AppError::NotFound)?;
        let mut order_active: OrderActive = order.into();
        order_active.payment_status = Set("refunded".into());
        order_active.updated_at = Set(Utc::now().into());
        order_active.update(&txn).await?;
    }

    txn.commit().await?;

    if let Err(err) = log_audit(
        &state.pool,
        Some(user.user_id),
        "refund_decide",
        Some("refunds"),
        Some(serde_json::json!({ "refund_id": refund.id, "status": refund.status })),
    )
    .await
    {
        tracing::warn!(error = %err, "audit log failed");
    }

    Ok(ApiResponse::success(
        "Refund decided",
        refund_from_entity(refund),
        None,
    ))
}

fn validate_order_status(status: &str) -> Result<(), AppError> {
    const VALID: [&str; 5] = ["pending", "paid", "shipped", "completed", "cancelled"];
    if VALID.contains(&status) {
        Ok(())
    } else {
        Err(AppError::BadRequest("Invalid order status".into()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn order_status_whitelist() {
        for status in ["pending", "paid", "shipped", "completed", "cancelled"] {
            assert!(validate_order_status(status).is_ok());
        }
        assert!(validate_order_status("teleported").is_err());
        assert!(validate_order_status("").is_err());
    }
}
