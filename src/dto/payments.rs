use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::models::Payment;

#[derive(Debug, Serialize, ToSchema)]
pub struct InitiatePaymentResponse {
    pub payment: Payment,
    pub redirect_url: String,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct PaymentCallbackQuery {
    pub payment_ref: String,
    pub status: Option<String>,
}

/// Gateway webhook body. Field names follow the gateway's wire format.
#[derive(Debug, Deserialize, Serialize, ToSchema)]
pub struct IpnPayload {
    #[serde(rename = "paymentID")]
    pub payment_id: String,
    #[serde(rename = "trxStatus")]
    pub trx_status: String,
    pub amount: String,
    #[serde(rename = "payerMsisdn")]
    pub payer_msisdn: Option<String>,
    pub signature: String,
}
