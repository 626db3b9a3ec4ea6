use chrono::Utc;
use sea_orm::ActiveValue::NotSet;
use sea_orm::sea_query::LockType;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, EntityTrait, QueryFilter, QuerySelect, Set,
    TransactionTrait,
};
use uuid::Uuid;

use crate::{
    audit::log_audit,
    clients::gateway::{GatewayClient, GatewayStatus},
    dto::payments::{InitiatePaymentResponse, IpnPayload, PaymentCallbackQuery},
    entity::{
        loyalty_accounts::{
            ActiveModel as LoyaltyActive, Column as LoyaltyCol, Entity as LoyaltyAccounts,
        },
        loyalty_transactions::ActiveModel as LoyaltyTxActive,
        order_items::{Column as OrderItemCol, Entity as OrderItems},
        orders::{ActiveModel as OrderActive, Column as OrderCol, Entity as Orders, Model as OrderModel},
        payments::{ActiveModel as PaymentActive, Column as PaymentCol, Entity as Payments, Model as PaymentModel},
    },
    error::{AppError, AppResult},
    loyalty::{Tier, points_earned, tier_for_spend},
    middleware::auth::AuthUser,
    models::Payment,
    response::{ApiResponse, Meta},
    services::convert::{order_item_from_entity, order_from_entity, payment_from_entity},
    state::AppState,
};

fn gateway(state: &AppState) -> AppResult<&GatewayClient> {
    state
        .gateway
        .as_ref()
        .ok_or_else(|| AppError::BadRequest("payments are not configured".into()))
}

pub async fn initiate(
    state: &AppState,
    user: &AuthUser,
    order_id: Uuid,
) -> AppResult<ApiResponse<InitiatePaymentResponse>> {
    let gateway = gateway(state)?;

    let order = Orders::find()
        .filter(
            Condition::all()
                .add(OrderCol::Id.eq(order_id))
                .add(OrderCol::UserId.eq(user.user_id)),
        )
        .one(&state.orm)
        .await?;
    let order = match order {
        Some(o) => o,
        None => return Err(AppError::NotFound),
    };

    if order.payment_status == "paid" {
        return Err(AppError::BadRequest("Order already paid".into()));
    }
    if order.status != "pending" {
        return Err(AppError::BadRequest("Order is not payable".into()));
    }

    let callback_url = format!("{}/api/payments/callback", state.config.public_base_url);
    let created = gateway
        .create_payment(order.total_amount, &order.invoice_number, &callback_url)
        .await?;

    let payment = PaymentActive {
        id: Set(Uuid::new_v4()),
        order_id: Set(order.id),
        gateway_ref: Set(created.payment_ref.clone()),
        amount: Set(order.total_amount),
        status: Set("initiated".into()),
        payer_msisdn: Set(None),
        raw_payload: Set(None),
        verified_at: Set(None),
        created_at: NotSet,
    }
    .insert(&state.orm)
    .await?;

    if let Err(err) = log_audit(
        &state.pool,
        Some(user.user_id),
        "payment_initiate",
        Some("payments"),
        Some(serde_json::json!({ "order_id": order.id, "payment_ref": created.payment_ref })),
    )
    .await
    {
        tracing::warn!(error = %err, "audit log failed");
    }

    Ok(ApiResponse::success(
        "Payment initiated",
        InitiatePaymentResponse {
            payment: payment_from_entity(payment),
            redirect_url: created.redirect_url,
        },
        Some(Meta::empty()),
    ))
}

/// Redirect leg: the payer lands back here after authorizing at the gateway.
pub async fn handle_callback(
    state: &AppState,
    query: PaymentCallbackQuery,
) -> AppResult<ApiResponse<Payment>> {
    let gateway = gateway(state)?;

    let payment = find_by_ref(state, &query.payment_ref).await?;
    if payment.status == "completed" {
        return Ok(ApiResponse::success(
            "Payment already verified",
            payment_from_entity(payment),
            Some(Meta::empty()),
        ));
    }

    let executed = gateway.execute_payment(&query.payment_ref).await?;
    // The execute response alone is not trusted; re-query gateway status
    // before marking anything paid.
    let verified = gateway.verify_payment(&query.payment_ref).await?;
    if !(executed.is_completed() && verified.is_completed()) {
        let failed = mark_failed(state, payment).await?;
        return Ok(ApiResponse::success(
            "Payment not completed",
            payment_from_entity(failed),
            Some(Meta::empty()),
        ));
    }

    let (payment, _order) = complete_payment(state, payment, &verified, None).await?;
    Ok(ApiResponse::success(
        "Payment verified",
        payment_from_entity(payment),
        Some(Meta::empty()),
    ))
}

/// IPN webhook. Signature-checked, idempotent, and re-verified server-side.
pub async fn handle_ipn(
    state: &AppState,
    payload: IpnPayload,
) -> AppResult<ApiResponse<serde_json::Value>> {
    let gateway = gateway(state)?;

    if !gateway.verify_ipn_signature(&payload) {
        return Err(AppError::Unauthorized);
    }

    let payment = find_by_ref(state, &payload.payment_id).await?;
    if payment.status == "completed" {
        return Ok(ApiResponse::success(
            "Already processed",
            serde_json::json!({}),
            Some(Meta::empty()),
        ));
    }

    if payload.trx_status != "Completed" {
        mark_failed(state, payment).await?;
        return Ok(ApiResponse::success(
            "Recorded failure",
            serde_json::json!({}),
            Some(Meta::empty()),
        ));
    }

    let verified = gateway.verify_payment(&payload.payment_id).await?;
    if !verified.is_completed() {
        return Err(AppError::BadRequest(
            "IPN claims completion but gateway disagrees".into(),
        ));
    }

    let raw = serde_json::to_value(&payload).ok();
    complete_payment(state, payment, &verified, raw).await?;

    Ok(ApiResponse::success(
        "Processed",
        serde_json::json!({}),
        Some(Meta::empty()),
    ))
}

async fn find_by_ref(state: &AppState, payment_ref: &str) -> AppResult<PaymentModel> {
    let payment = Payments::find()
        .filter(PaymentCol::GatewayRef.eq(payment_ref))
        .one(&state.orm)
        .await?;
    payment.ok_or(AppError::NotFound)
}

async fn mark_failed(state: &AppState, payment: PaymentModel) -> AppResult<PaymentModel> {
    let mut active: PaymentActive = payment.into();
    active.status = Set("failed".into());
    Ok(active.update(&state.orm).await?)
}

/// Single place a payment becomes money: flips the order to paid, accrues
/// loyalty points, and sends the receipt.
async fn complete_payment(
    state: &AppState,
    payment: PaymentModel,
    verified: &GatewayStatus,
    raw_payload: Option<serde_json::Value>,
) -> AppResult<(PaymentModel, OrderModel)> {
    let txn = state.orm.begin().await?;

    // Re-read under lock so two callback/IPN races settle on one winner.
    let locked = Payments::find_by_id(payment.id)
        .lock(LockType::Update)
        .one(&txn)
        .await?
        .ok_or(AppError::NotFound)?;
    if locked.status == "completed" {
        let order = Orders::find_by_id(locked.order_id)
            .one(&txn)
            .await?
            .ok_or(AppError::NotFound)?;
        txn.commit().await?;
        return Ok((locked, order));
    }

    let now = Utc::now();
    let mut payment_active: PaymentActive = locked.into();
    payment_active.status = Set("completed".into());
    payment_active.payer_msisdn = Set(verified.payer_msisdn.clone());
    payment_active.verified_at = Set(Some(now.into()));
    if raw_payload.is_some() {
        payment_active.raw_payload = Set(raw_payload);
    }
    let payment = payment_active.update(&txn).await?;

    let order = Orders::find_by_id(payment.order_id)
        .lock(LockType::Update)
        .one(&txn)
        .await?
        .ok_or(AppError::NotFound)?;
    let mut order_active: OrderActive = order.into();
    order_active.status = Set("paid".into());
    order_active.payment_status = Set("paid".into());
    order_active.paid_at = Set(Some(now.into()));
    order_active.updated_at = Set(now.into());
    let order = order_active.update(&txn).await?;

    accrue_loyalty(&txn, order.user_id, order.id, order.total_amount).await?;

    txn.commit().await?;

    if let Err(err) = log_audit(
        &state.pool,
        Some(order.user_id),
        "payment_completed",
        Some("payments"),
        Some(serde_json::json!({ "order_id": order.id, "payment_ref": payment.gateway_ref })),
    )
    .await
    {
        tracing::warn!(error = %err, "audit log failed");
    }

    send_receipt(state, &order).await;

    Ok((payment, order))
}

async fn accrue_loyalty(
    txn: &sea_orm::DatabaseTransaction,
    user_id: Uuid,
    order_id: Uuid,
    paid_amount: i64,
) -> AppResult<()> {
    let account = LoyaltyAccounts::find()
        .filter(LoyaltyCol::UserId.eq(user_id))
        .lock(LockType::Update)
        .one(txn)
        .await?;

    let account = match account {
        Some(a) => a,
        // Accounts are created at registration; seeded or migrated users may
        // predate that.
        None => {
            LoyaltyActive {
                id: Set(Uuid::new_v4()),
                user_id: Set(user_id),
                points_balance: Set(0),
                lifetime_spend: Set(0),
                tier: Set(Tier::Bronze.as_str().into()),
                created_at: NotSet,
            }
            .insert(txn)
            .await?
        }
    };

    let tier = account.tier.parse::<Tier>().unwrap_or(Tier::Bronze);
    let earned = points_earned(tier, paid_amount);
    let lifetime = account.lifetime_spend + paid_amount;
    let new_tier = tier_for_spend(lifetime);
    let account_id = account.id;
    let balance = account.points_balance;

    let mut active: LoyaltyActive = account.into();
    active.points_balance = Set(balance + earned);
    active.lifetime_spend = Set(lifetime);
    active.tier = Set(new_tier.as_str().into());
    active.update(txn).await?;

    if earned > 0 {
        LoyaltyTxActive {
            id: Set(Uuid::new_v4()),
            account_id: Set(account_id),
            delta: Set(earned),
            reason: Set("order_paid".into()),
            order_id: Set(Some(order_id)),
            created_at: NotSet,
        }
        .insert(txn)
        .await?;
    }

    Ok(())
}

async fn send_receipt(state: &AppState, order: &OrderModel) {
    let Some(mailer) = state.mailer.as_ref() else {
        return;
    };

    let email: Result<Option<(String,)>, sqlx::Error> =
        sqlx::query_as("SELECT email FROM users WHERE id = $1")
            .bind(order.user_id)
            .fetch_optional(&state.pool)
            .await;
    let Ok(Some((email,))) = email else {
        tracing::warn!(order_id = %order.id, "no recipient for receipt");
        return;
    };

    let items = match OrderItems::find()
        .filter(OrderItemCol::OrderId.eq(order.id))
        .all(&state.orm)
        .await
    {
        Ok(items) => items.into_iter().map(order_item_from_entity).collect::<Vec<_>>(),
        Err(err) => {
            tracing::warn!(error = %err, "failed to load items for receipt");
            Vec::new()
        }
    };

    let order = order_from_entity(order.clone());
    if let Err(err) = mailer.send_receipt(&email, &order, &items).await {
        tracing::warn!(error = %err, order_id = %order.id, "receipt email failed");
    }
}
