use chrono::Utc;
use sea_orm::ActiveValue::NotSet;
use sea_orm::sea_query::{Expr, LockType};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder, QuerySelect, Set, TransactionTrait,
};
use uuid::Uuid;

use crate::{
    audit::log_audit,
    dto::orders::{CheckoutRequest, OrderList, OrderWithItems},
    entity::{
        coupons::{Column as CouponCol, Entity as Coupons},
        order_items::{ActiveModel as OrderItemActive, Column as OrderItemCol, Entity as OrderItems},
        orders::{ActiveModel as OrderActive, Column as OrderCol, Entity as Orders},
        product_variants::{Column as VariantCol, Entity as ProductVariants},
        products::{Column as ProdCol, Entity as Products},
    },
    error::{AppError, AppResult},
    middleware::auth::AuthUser,
    models::OrderItem,
    pricing::coupon_discount,
    response::{ApiResponse, Meta},
    routes::params::{OrderListQuery, SortOrder},
    services::convert::{order_from_entity, order_item_from_entity},
    state::AppState,
};

pub async fn list_orders(
    state: &AppState,
    user: &AuthUser,
    query: OrderListQuery,
) -> AppResult<ApiResponse<OrderList>> {
    let (page, limit, offset) = query.pagination.normalize();
    let mut condition = Condition::all().add(OrderCol::UserId.eq(user.user_id));
    if let Some(status) = query.status.as_ref().filter(|s| !s.is_empty()) {
        condition = condition.add(OrderCol::Status.eq(status.clone()));
    }

    let sort_order = query.sort_order.unwrap_or(SortOrder::Desc);
    let mut finder = Orders::find().filter(condition);
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
        "Ok",
        OrderList { items: orders },
        Some(meta),
    ))
}

pub async fn checkout(
    state: &AppState,
    user: &AuthUser,
    payload: CheckoutRequest,
) -> AppResult<ApiResponse<OrderWithItems>> {
    if payload.items.is_empty() {
        return Err(AppError::BadRequest("order has no items".into()));
    }
    if payload.shipping_address.trim().is_empty() {
        return Err(AppError::BadRequest("shipping address is required".into()));
    }

    let txn = state.orm.begin().await?;

    // Price every line against locked rows so a concurrent checkout cannot
    // oversell the same stock.
    struct PricedLine {
        product_id: Uuid,
        variant_id: Option<Uuid>,
        quantity: i32,
        unit_price: i64,
    }
    let mut lines: Vec<PricedLine> = Vec::with_capacity(payload.items.len());
    let mut subtotal: i64 = 0;

    for item in &payload.items {
        if item.quantity <= 0 {
            return Err(AppError::BadRequest("quantity must be greater than 0".into()));
        }

        let product = Products::find_by_id(item.product_id)
            .filter(ProdCol::Published.eq(true))
            .lock(LockType::Update)
            .one(&txn)
            .await?;
        let product = match product {
            Some(p) => p,
            None => {
                return Err(AppError::BadRequest(format!(
                    "product {} is not available",
                    item.product_id
                )));
            }
        };

        let unit_price = match item.variant_id {
            Some(variant_id) => {
                let variant = ProductVariants::find_by_id(variant_id)
                    .filter(VariantCol::ProductId.eq(product.id))
                    .lock(LockType::Update)
                    .one(&txn)
                    .await?
                    .ok_or_else(|| {
                        AppError::BadRequest(format!("variant {variant_id} is not available"))
                    })?;
                if variant.stock < item.quantity {
                    return Err(AppError::BadRequest(format!(
                        "Insufficient stock for variant {variant_id}"
                    )));
                }
                product.price + variant.price_delta
            }
            None => {
                if product.stock < item.quantity {
                    return Err(AppError::BadRequest(format!(
                        "Insufficient stock for product {}",
                        product.id
                    )));
                }
                product.price
            }
        };

        subtotal += unit_price * (item.quantity as i64);
        lines.push(PricedLine {
            product_id: product.id,
            variant_id: item.variant_id,
            quantity: item.quantity,
            unit_price,
        });
    }

    // Coupon is locked so used_count cannot race past the usage limit.
    let mut discount: i64 = 0;
    let mut coupon_id: Option<Uuid> = None;
    if let Some(code) = payload.coupon_code.as_ref().filter(|c| !c.is_empty()) {
        let coupon = Coupons::find()
            .filter(CouponCol::Code.eq(code.clone()))
            .lock(LockType::Update)
            .one(&txn)
            .await?
            .ok_or_else(|| AppError::BadRequest("coupon not found".into()))?;

        discount = coupon_discount(&coupon, subtotal, Utc::now())
            .map_err(|e| AppError::BadRequest(e.to_string()))?;
        coupon_id = Some(coupon.id);

        Coupons::update_many()
            .col_expr(
                CouponCol::UsedCount,
                Expr::col(CouponCol::UsedCount).add(1),
            )
            .filter(CouponCol::Id.eq(coupon.id))
            .exec(&txn)
            .await?;
    }

    let total_amount = subtotal - discount;
    let order_id = Uuid::new_v4();
    let invoice_number = build_invoice_number(order_id);

    let order = OrderActive {
        id: Set(order_id),
        user_id: Set(user.user_id),
        total_amount: Set(total_amount),
        discount_amount: Set(discount),
        coupon_id: Set(coupon_id),
        status: Set("pending".into()),
        payment_status: Set("unpaid".into()),
        invoice_number: Set(invoice_number),
        shipping_address: Set(payload.shipping_address.clone()),
        paid_at: Set(None),
        created_at: NotSet,
        updated_at: NotSet,
    }
    .insert(&txn)
    .await?;

    let mut order_items: Vec<OrderItem> = Vec::new();
    for line in &lines {
        let item = OrderItemActive {
            id: Set(Uuid::new_v4()),
            order_id: Set(order.id),
            product_id: Set(line.product_id),
            variant_id: Set(line.variant_id),
            quantity: Set(line.quantity),
            unit_price: Set(line.unit_price),
            created_at: NotSet,
        }
        .insert(&txn)
        .await?;
        order_items.push(order_item_from_entity(item));

        // reduce stock on the variant when one was ordered, else the product
        match line.variant_id {
            Some(variant_id) => {
                ProductVariants::update_many()
                    .col_expr(
                        VariantCol::Stock,
                        Expr::col(VariantCol::Stock).sub(line.quantity),
                    )
                    .filter(VariantCol::Id.eq(variant_id))
                    .exec(&txn)
                    .await?;
            }
            None => {
                Products::update_many()
                    .col_expr(ProdCol::Stock, Expr::col(ProdCol::Stock).sub(line.quantity))
                    .filter(ProdCol::Id.eq(line.product_id))
                    .exec(&txn)
                    .await?;
            }
        }
    }

    txn.commit().await?;
    state.cache.invalidate_all();

    if let Err(err) = log_audit(
        &state.pool,
        Some(user.user_id),
        "checkout",
        Some("orders"),
        Some(serde_json::json!({ "order_id": order.id, "total": total_amount })),
    )
    .await
    {
        tracing::warn!(error = %err, "audit log failed");
    }

    Ok(ApiResponse::success(
        "Checkout success",
        OrderWithItems {
            order: order_from_entity(order),
            items: order_items,
        },
        Some(Meta::empty()),
    ))
}

pub async fn get_order(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
) -> AppResult<ApiResponse<OrderWithItems>> {
    let order = Orders::find()
        .filter(
            Condition::all()
                .add(OrderCol::UserId.eq(user.user_id))
                .add(OrderCol::Id.eq(id)),
        )
        .one(&state.orm)
        .await?;
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
        "OK",
        OrderWithItems {
            order: order_from_entity(order),
            items,
        },
        Some(Meta::empty()),
    ))
}

/// A pending, unpaid order can be cancelled by its owner; stock goes back.
pub async fn cancel_order(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
) -> AppResult<ApiResponse<OrderWithItems>> {
    let txn = state.orm.begin().await?;

    let order = Orders::find()
        .filter(
            Condition::all()
                .add(OrderCol::UserId.eq(user.user_id))
                .add(OrderCol::Id.eq(id)),
        )
        .lock(LockType::Update)
        .one(&txn)
        .await?;
    let order = match order {
        Some(o) => o,
        None => return Err(AppError::NotFound),
    };

    if order.status != "pending" || order.payment_status != "unpaid" {
        return Err(AppError::BadRequest(
            "only pending unpaid orders can be cancelled".into(),
        ));
    }

    let items = OrderItems::find()
        .filter(OrderItemCol::OrderId.eq(order.id))
        .all(&txn)
        .await?;

    for item in &items {
        match item.variant_id {
            Some(variant_id) => {
                ProductVariants::update_many()
                    .col_expr(
                        VariantCol::Stock,
                        Expr::col(VariantCol::Stock).add(item.quantity),
                    )
                    .filter(VariantCol::Id.eq(variant_id))
                    .exec(&txn)
                    .await?;
            }
            None => {
                Products::update_many()
                    .col_expr(ProdCol::Stock, Expr::col(ProdCol::Stock).add(item.quantity))
                    .filter(ProdCol::Id.eq(item.product_id))
                    .exec(&txn)
                    .await?;
            }
        }
    }

    let mut active: OrderActive = order.into();
    active.status = Set("cancelled".into());
    active.updated_at = Set(Utc::now().into());
    let order = active.update(&txn).await?;

    txn.commit().await?;

    if let Err(err) = log_audit(
        &state.pool,
        Some(user.user_id),
        "order_cancel",
        Some("orders"),
        Some(serde_json::json!({ "order_id": order.id })),
    )
    .await
    {
        tracing::warn!(error = %err, "audit log failed");
    }

    let items = items.into_iter().map(order_item_from_entity).collect();
    Ok(ApiResponse::success(
        "Order cancelled",
        OrderWithItems {
            order: order_from_entity(order),
            items,
        },
        Some(Meta::empty()),
    ))
}

pub fn build_invoice_number(order_id: Uuid) -> String {
    let date = Utc::now().format("%Y%m%d");
    let suffix = order_id.to_string();
    let short = &suffix[..8];
    format!("INV-{}-{}", date, short)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn invoice_number_embeds_date_and_order_prefix() {
        let id = Uuid::new_v4();
        let invoice = build_invoice_number(id);
        let date = Utc::now().format("%Y%m%d").to_string();
        assert!(invoice.starts_with(&format!("INV-{date}-")));
        assert!(invoice.ends_with(&id.to_string()[..8]));
    }
}
