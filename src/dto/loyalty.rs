use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::models::LoyaltyAccount;

#[derive(Debug, Serialize, ToSchema)]
pub struct LoyaltyOverview {
    pub account: LoyaltyAccount,
    pub next_tier: Option<String>,
    pub spend_to_next_tier: Option<i64>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct RedeemPointsRequest {
    pub points: i64,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct RedeemPointsResponse {
    pub account: LoyaltyAccount,
    pub credit: i64,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct TierInfo {
    pub tier: String,
    pub min_lifetime_spend: i64,
    pub earn_rate: i64,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct TierList {
    pub items: Vec<TierInfo>,
}
