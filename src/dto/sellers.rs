use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::models::{SellerApplication, Shop};

#[derive(Debug, Deserialize, ToSchema)]
pub struct ApplyRequest {
    pub shop_name: String,
    pub pitch: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ApplicationList {
    pub items: Vec<SellerApplication>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ApprovalResponse {
    pub application: SellerApplication,
    pub shop: Option<Shop>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct PayoutRequestBody {
    pub amount: i64,
}
