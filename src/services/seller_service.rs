use chrono::Utc;
use sea_orm::ActiveValue::NotSet;
use sea_orm::sea_query::LockType;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder, QuerySelect, Set, TransactionTrait,
};
use uuid::Uuid;

use crate::{
    audit::log_audit,
    dto::admin::{DecideRequest, PayoutList},
    dto::sellers::{ApplicationList, ApplyRequest, ApprovalResponse, PayoutRequestBody},
    entity::{
        payout_requests::{ActiveModel as PayoutActive, Column as PayoutCol, Entity as PayoutRequests},
        seller_applications::{
            ActiveModel as ApplicationActive, Column as AppCol, Entity as SellerApplications,
        },
        shops::{ActiveModel as ShopActive, Column as ShopCol, Entity as Shops, Model as ShopModel},
        users::{ActiveModel as UserActive, Entity as Users},
    },
    error::{AppError, AppResult},
    middleware::auth::AuthUser,
    models::{PayoutRequest, SellerApplication},
    policy::{Permission, Role, require},
    response::{ApiResponse, Meta},
    routes::params::Pagination,
    services::convert::{application_from_entity, payout_from_entity, shop_from_entity},
    state::AppState,
};

pub async fn apply(
    state: &AppState,
    user: &AuthUser,
    payload: ApplyRequest,
) -> AppResult<ApiResponse<SellerApplication>> {
    if user.role != Role::Customer {
        return Err(AppError::BadRequest(
            "only customer accounts can apply to sell".into(),
        ));
    }
    let shop_name = payload.shop_name.trim().to_string();
    if shop_name.is_empty() {
        return Err(AppError::BadRequest("shop name is required".into()));
    }

    let open = SellerApplications::find()
        .filter(
            Condition::all()
                .add(AppCol::UserId.eq(user.user_id))
                .add(AppCol::Status.eq("pending")),
        )
        .one(&state.orm)
        .await?;
    if open.is_some() {
        return Err(AppError::Conflict(
            "you already have a pending application".into(),
        ));
    }

    let application = ApplicationActive {
        id: Set(Uuid::new_v4()),
        user_id: Set(user.user_id),
        shop_name: Set(shop_name),
        pitch: Set(payload.pitch),
        status: Set("pending".into()),
        decided_by: Set(None),
        decided_at: Set(None),
        created_at: NotSet,
    }
    .insert(&state.orm)
    .await?;

    if let Err(err) = log_audit(
        &state.pool,
        Some(user.user_id),
        "seller_apply",
        Some("seller_applications"),
        Some(serde_json::json!({ "application_id": application.id })),
    )
    .await
    {
        tracing::warn!(error = %err, "audit log failed");
    }

    Ok(ApiResponse::success(
        "Application submitted",
        application_from_entity(application),
        None,
    ))
}

pub async fn my_application(
    state: &AppState,
    user: &AuthUser,
) -> AppResult<ApiResponse<SellerApplication>> {
    let application = SellerApplications::find()
        .filter(AppCol::UserId.eq(user.user_id))
        .order_by_desc(AppCol::CreatedAt)
        .one(&state.orm)
        .await?;
    match application {
        Some(a) => Ok(ApiResponse::success("Application", application_from_entity(a), None)),
        None => Err(AppError::NotFound),
    }
}

pub async fn list_applications(
    state: &AppState,
    user: &AuthUser,
    pagination: Pagination,
    status: Option<String>,
) -> AppResult<ApiResponse<ApplicationList>> {
    require(user.role, Permission::ManageStore)?;
    let (page, limit, offset) = pagination.normalize();

    let mut condition = Condition::all();
    if let Some(status) = status.as_ref().filter(|s| !s.is_empty()) {
        condition = condition.add(AppCol::Status.eq(status.clone()));
    }

    let finder = SellerApplications::find()
        .filter(condition)
        .order_by_desc(AppCol::CreatedAt);
    let total = finder.clone().count(&state.orm).await? as i64;
    let items = finder
        .limit(limit as u64)
        .offset(offset as u64)
        .all(&state.orm)
        .await?
        .into_iter()
        .map(application_from_entity)
        .collect();

    Ok(ApiResponse::success(
        "Applications",
        ApplicationList { items },
        Some(Meta::new(page, limit, total)),
    ))
}

/// Approval creates the shop and promotes the applicant in one transaction.
pub async fn decide_application(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
    payload: DecideRequest,
) -> AppResult<ApiResponse<ApprovalResponse>> {
    require(user.role, Permission::ManageStore)?;

    let txn = state.orm.begin().await?;

    let application = SellerApplications::find_by_id(id)
        .lock(LockType::Update)
        .one(&txn)
        .await?
        .ok_or(AppError::NotFound)?;
    if application.status != "pending" {
        return Err(AppError::BadRequest("application already decided".into()));
    }

    let applicant = Users::find_by_id(application.user_id)
        .one(&txn)
        .await?
        .ok_or(AppError::NotFound)?;

    let now = Utc::now();
    let status = if payload.approve { "approved" } else { "rejected" };
    let shop_name = application.shop_name.clone();
    let mut application_active: ApplicationActive = application.into();
    application_active.status = Set(status.into());
    application_active.decided_by = Set(Some(user.user_id));
    application_active.decided_at = Set(Some(now.into()));
    let application = application_active.update(&txn).await?;

    let shop: Option<ShopModel> = if payload.approve {
        let shop = ShopActive {
            id: Set(Uuid::new_v4()),
            owner_user_id: Set(application.user_id),
            name: Set(shop_name.clone()),
            slug: Set(unique_slug(&shop_name, application.id)),
            description: Set(None),
            logo_url: Set(None),
            active: Set(true),
            created_at: NotSet,
        }
        .insert(&txn)
        .await?;

        let mut user_active: UserActive = applicant.clone().into();
        user_active.role = Set(Role::Seller.as_str().into());
        user_active.update(&txn).await?;

        Some(shop)
    } else {
        None
    };

    txn.commit().await?;

    if let Err(err) = log_audit(
        &state.pool,
        Some(user.user_id),
        "seller_application_decide",
        Some("seller_applications"),
        Some(serde_json::json!({ "application_id": application.id, "status": status })),
    )
    .await
    {
        tracing::warn!(error = %err, "audit log failed");
    }

    if let Some(mailer) = state.mailer.as_ref() {
        if let Err(err) = mailer
            .send_seller_decision(&applicant.email, &shop_name, payload.approve)
            .await
        {
            tracing::warn!(error = %err, "seller decision email failed");
        }
    }

    let message = if payload.approve {
        "Application approved"
    } else {
        "Application rejected"
    };
    Ok(ApiResponse::success(
        message,
        ApprovalResponse {
            application: application_from_entity(application),
            shop: shop.map(shop_from_entity),
        },
        Some(Meta::empty()),
    ))
}

/// Seller asks to withdraw earned balance.
pub async fn request_payout(
    state: &AppState,
    user: &AuthUser,
    payload: PayoutRequestBody,
) -> AppResult<ApiResponse<PayoutRequest>> {
    require(user.role, Permission::ManageOwnShop)?;
    if payload.amount <= 0 {
        return Err(AppError::BadRequest("amount must be positive".into()));
    }

    let shop = Shops::find()
        .filter(
            Condition::all()
                .add(ShopCol::OwnerUserId.eq(user.user_id))
                .add(ShopCol::Active.eq(true)),
        )
        .one(&state.orm)
        .await?
        .ok_or(AppError::Forbidden)?;

    let available = available_balance(state, shop.id).await?;
    if payload.amount > available {
        return Err(AppError::BadRequest(format!(
            "amount exceeds available balance {available}"
        )));
    }

    let payout = PayoutActive {
        id: Set(Uuid::new_v4()),
        shop_id: Set(shop.id),
        amount: Set(payload.amount),
        status: Set("requested".into()),
        decided_by: Set(None),
        decided_at: Set(None),
        created_at: NotSet,
    }
    .insert(&state.orm)
    .await?;

    Ok(ApiResponse::success(
        "Payout requested",
        payout_from_entity(payout),
        None,
    ))
}

pub async fn list_payouts(
    state: &AppState,
    user: &AuthUser,
    pagination: Pagination,
) -> AppResult<ApiResponse<PayoutList>> {
    require(user.role, Permission::ManageStore)?;
    let (page, limit, offset) = pagination.normalize();

    let finder = PayoutRequests::find().order_by_desc(PayoutCol::CreatedAt);
    let total = finder.clone().count(&state.orm).await? as i64;
    let items = finder
        .limit(limit as u64)
        .offset(offset as u64)
        .all(&state.orm)
        .await?
        .into_iter()
        .map(payout_from_entity)
        .collect();

    Ok(ApiResponse::success(
        "Payouts",
        PayoutList { items },
        Some(Meta::new(page, limit, total)),
    ))
}

pub async fn decide_payout(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
    payload: DecideRequest,
) -> AppResult<ApiResponse<PayoutRequest>> {
    require(user.role, Permission::ManageStore)?;

    let payout = PayoutRequests::find_by_id(id)
        .one(&state.orm)
        .await?
        .ok_or(AppError::NotFound)?;
    if payout.status != "requested" {
        return Err(AppError::BadRequest("payout already decided".into()));
    }

    let mut active: PayoutActive = payout.into();
    active.status = Set(if payload.approve { "paid" } else { "rejected" }.into());
    active.decided_by = Set(Some(user.user_id));
    active.decided_at = Set(Some(Utc::now().into()));
    let payout = active.update(&state.orm).await?;

    if let Err(err) = log_audit(
        &state.pool,
        Some(user.user_id),
        "payout_decide",
        Some("payout_requests"),
        Some(serde_json::json!({ "payout_id": payout.id, "status": payout.status })),
    )
    .await
    {
        tracing::warn!(error = %err, "audit log failed");
    }

    Ok(ApiResponse::success(
        "Payout decided",
        payout_from_entity(payout),
        None,
    ))
}

/// Paid revenue for the shop's products minus payouts already requested or
/// paid out.
async fn available_balance(state: &AppState, shop_id: Uuid) -> AppResult<i64> {
    let earned: (Option<i64>,) = sqlx::query_as(
        r#"
        SELECT SUM(oi.unit_price * oi.quantity)::BIGINT
        FROM order_items oi
        JOIN orders o ON o.id = oi.order_id
        JOIN products p ON p.id = oi.product_id
        WHERE p.shop_id = $1 AND o.payment_status = 'paid'
        "#,
    )
    .bind(shop_id)
    .fetch_one(&state.pool)
    .await?;

    let reserved: (Option<i64>,) = sqlx::query_as(
        r#"
        SELECT SUM(amount)::BIGINT
        FROM payout_requests
        WHERE shop_id = $1 AND status IN ('requested', 'paid')
        "#,
    )
    .bind(shop_id)
    .fetch_one(&state.pool)
    .await?;

    Ok(earned.0.unwrap_or(0) - reserved.0.unwrap_or(0))
}

fn unique_slug(name: &str, seed: Uuid) -> String {
    let base: String = name
        .trim()
        .to_lowercase()
        .chars()
        .map(|c| if c.is_alphanumeric() { c } else { '-' })
        .collect();
    let base = base
        .split('-')
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join("-");
    let suffix = &seed.to_string()[..8];
    format!("{base}-{suffix}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn slug_carries_a_stable_suffix() {
        let seed = Uuid::new_v4();
        let slug = unique_slug("Ferris & Friends", seed);
        assert!(slug.starts_with("ferris-friends-"));
        assert!(slug.ends_with(&seed.to_string()[..8]));
    }
}
