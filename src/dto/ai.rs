use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

#[derive(Debug, Deserialize, ToSchema)]
pub struct ProductCopyRequest {
    pub name: String,
    pub keywords: Vec<String>,
    pub tone: Option<String>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct FaqRequest {
    pub product_id: Uuid,
    pub question_count: Option<u8>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct FraudCheckRequest {
    pub order_id: Uuid,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct GeneratedText {
    pub text: String,
}

#[derive(Debug, Serialize, Deserialize, Clone, ToSchema)]
pub struct AiFlags {
    pub product_copy: bool,
    pub faq: bool,
    pub fraud_check: bool,
}

impl Default for AiFlags {
    fn default() -> Self {
        Self {
            product_copy: true,
            faq: true,
            fraud_check: false,
        }
    }
}
