use sea_orm::ActiveValue::NotSet;
use sea_orm::sea_query::LockType;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, EntityTrait, QueryFilter, QuerySelect, Set,
    TransactionTrait,
};
use uuid::Uuid;

use crate::{
    audit::log_audit,
    dto::loyalty::{
        LoyaltyOverview, RedeemPointsRequest, RedeemPointsResponse, TierInfo, TierList,
    },
    entity::loyalty_accounts::{
        ActiveModel as LoyaltyActive, Column as LoyaltyCol, Entity as LoyaltyAccounts,
        Model as AccountModel,
    },
    entity::loyalty_transactions::ActiveModel as LoyaltyTxActive,
    error::{AppError, AppResult},
    loyalty::{GOLD_AT, PLATINUM_AT, SILVER_AT, Tier, redemption_value, tier_for_spend},
    middleware::auth::AuthUser,
    response::{ApiResponse, Meta},
    services::convert::loyalty_account_from_entity,
    state::AppState,
};

pub async fn overview(state: &AppState, user: &AuthUser) -> AppResult<ApiResponse<LoyaltyOverview>> {
    let account = get_or_create_account(&state.orm, user.user_id).await?;

    let (next_tier, spend_to_next_tier) = next_tier_gap(account.lifetime_spend);
    Ok(ApiResponse::success(
        "Loyalty account",
        LoyaltyOverview {
            account: loyalty_account_from_entity(account),
            next_tier,
            spend_to_next_tier,
        },
        None,
    ))
}

pub async fn redeem(
    state: &AppState,
    user: &AuthUser,
    payload: RedeemPointsRequest,
) -> AppResult<ApiResponse<RedeemPointsResponse>> {
    if payload.points <= 0 {
        return Err(AppError::BadRequest("points must be positive".into()));
    }

    let txn = state.orm.begin().await?;

    let account = LoyaltyAccounts::find()
        .filter(LoyaltyCol::UserId.eq(user.user_id))
        .lock(LockType::Update)
        .one(&txn)
        .await?
        .ok_or(AppError::NotFound)?;

    if payload.points > account.points_balance {
        return Err(AppError::BadRequest(
            "not enough points to redeem".into(),
        ));
    }

    let account_id = account.id;
    let remaining = account.points_balance - payload.points;
    let mut active: LoyaltyActive = account.into();
    active.points_balance = Set(remaining);
    let account = active.update(&txn).await?;

    LoyaltyTxActive {
        id: Set(Uuid::new_v4()),
        account_id: Set(account_id),
        delta: Set(-payload.points),
        reason: Set("redeem".into()),
        order_id: Set(None),
        created_at: NotSet,
    }
    .insert(&txn)
    .await?;

    txn.commit().await?;

    if let Err(err) = log_audit(
        &state.pool,
        Some(user.user_id),
        "loyalty_redeem",
        Some("loyalty_accounts"),
        Some(serde_json::json!({ "points": payload.points })),
    )
    .await
    {
        tracing::warn!(error = %err, "audit log failed");
    }

    Ok(ApiResponse::success(
        "Points redeemed",
        RedeemPointsResponse {
            account: loyalty_account_from_entity(account),
            credit: redemption_value(payload.points),
        },
        Some(Meta::empty()),
    ))
}

pub fn tiers() -> ApiResponse<TierList> {
    let items = [
        (Tier::Bronze, 0),
        (Tier::Silver, SILVER_AT),
        (Tier::Gold, GOLD_AT),
        (Tier::Platinum, PLATINUM_AT),
    ]
    .into_iter()
    .map(|(tier, min)| TierInfo {
        tier: tier.as_str().to_string(),
        min_lifetime_spend: min,
        earn_rate: tier.earn_rate(),
    })
    .collect();

    ApiResponse::success("Tiers", TierList { items }, None)
}

async fn get_or_create_account<C: ConnectionTrait>(
    conn: &C,
    user_id: Uuid,
) -> AppResult<AccountModel> {
    let account = LoyaltyAccounts::find()
        .filter(LoyaltyCol::UserId.eq(user_id))
        .one(conn)
        .await?;
    match account {
        Some(a) => Ok(a),
        None => Ok(LoyaltyActive {
            id: Set(Uuid::new_v4()),
            user_id: Set(user_id),
            points_balance: Set(0),
            lifetime_spend: Set(0),
            tier: Set(Tier::Bronze.as_str().into()),
            created_at: NotSet,
        }
        .insert(conn)
        .await?),
    }
}

fn next_tier_gap(lifetime_spend: i64) -> (Option<String>, Option<i64>) {
    match tier_for_spend(lifetime_spend) {
        Tier::Bronze => (
            Some(Tier::Silver.as_str().into()),
            Some(SILVER_AT - lifetime_spend),
        ),
        Tier::Silver => (
            Some(Tier::Gold.as_str().into()),
            Some(GOLD_AT - lifetime_spend),
        ),
        Tier::Gold => (
            Some(Tier::Platinum.as_str().into()),
            Some(PLATINUM_AT - lifetime_spend),
        ),
        Tier::Platinum => (None, None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn gap_reaches_zero_at_threshold() {
        assert_eq!(next_tier_gap(0), (Some("silver".into()), Some(50_000)));
        assert_eq!(next_tier_gap(49_000), (Some("silver".into()), Some(1_000)));
        assert_eq!(next_tier_gap(600_000), (None, None));
    }
}
