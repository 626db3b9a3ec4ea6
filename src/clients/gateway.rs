//! Mobile payment gateway client.
//!
//! The flow is create -> user redirect -> execute/verify, plus an IPN webhook
//! the gateway fires asynchronously. The gateway protocol itself is external;
//! this client only speaks its HTTP surface.

use std::sync::Arc;

use hmac::{Hmac, Mac};
use reqwest::header::{CONTENT_TYPE, HeaderMap, HeaderValue};
use secrecy::ExposeSecret;
use serde::{Deserialize, Serialize};
use sha2::Sha256;

use crate::{
    config::GatewayConfig,
    dto::payments::IpnPayload,
    error::{AppError, AppResult},
};

type HmacSha256 = Hmac<Sha256>;

#[derive(Clone)]
pub struct GatewayClient {
    inner: Arc<GatewayClientInner>,
}

struct GatewayClientInner {
    client: reqwest::Client,
    base_url: String,
    app_secret: String,
}

#[derive(Debug, Serialize)]
struct CreatePaymentRequest<'a> {
    amount: i64,
    currency: &'a str,
    invoice_number: &'a str,
    callback_url: &'a str,
}

#[derive(Debug, Deserialize)]
pub struct CreatedPayment {
    #[serde(rename = "paymentID")]
    pub payment_ref: String,
    #[serde(rename = "bkashURL", alias = "redirectURL")]
    pub redirect_url: String,
}

#[derive(Debug, Deserialize)]
pub struct GatewayStatus {
    #[serde(rename = "paymentID")]
    pub payment_ref: String,
    #[serde(rename = "trxStatus")]
    pub status: String,
    pub amount: String,
    #[serde(rename = "payerMsisdn")]
    pub payer_msisdn: Option<String>,
}

impl GatewayStatus {
    pub fn is_completed(&self) -> bool {
        self.status == "Completed"
    }
}

impl GatewayClient {
    pub fn new(config: &GatewayConfig) -> Self {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        if let Ok(value) = HeaderValue::from_str(&config.app_key) {
            headers.insert("x-app-key", value);
        }

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .build()
            .unwrap_or_default();

        Self {
            inner: Arc::new(GatewayClientInner {
                client,
                base_url: config.base_url.trim_end_matches('/').to_string(),
                app_secret: config.app_secret.expose_secret().to_string(),
            }),
        }
    }

    pub async fn create_payment(
        &self,
        amount: i64,
        invoice_number: &str,
        callback_url: &str,
    ) -> AppResult<CreatedPayment> {
        let url = format!("{}/checkout/create", self.inner.base_url);
        let body = CreatePaymentRequest {
            amount,
            currency: "BDT",
            invoice_number,
            callback_url,
        };
        let response = self.inner.client.post(&url).json(&body).send().await?;
        Self::decode(response).await
    }

    /// Complete the redirect leg after the payer authorizes.
    pub async fn execute_payment(&self, payment_ref: &str) -> AppResult<GatewayStatus> {
        let url = format!("{}/checkout/execute/{payment_ref}", self.inner.base_url);
        let response = self.inner.client.post(&url).send().await?;
        Self::decode(response).await
    }

    /// Server-side status query, used to re-verify before trusting a callback.
    pub async fn verify_payment(&self, payment_ref: &str) -> AppResult<GatewayStatus> {
        let url = format!("{}/checkout/status/{payment_ref}", self.inner.base_url);
        let response = self.inner.client.get(&url).send().await?;
        Self::decode(response).await
    }

    /// Check the keyed digest the gateway attaches to IPN posts.
    pub fn verify_ipn_signature(&self, payload: &IpnPayload) -> bool {
        verify_signature(&self.inner.app_secret, payload)
    }

    async fn decode<T: serde::de::DeserializeOwned>(response: reqwest::Response) -> AppResult<T> {
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(AppError::Upstream(format!(
                "gateway returned {status}: {body}"
            )));
        }
        Ok(response.json::<T>().await?)
    }
}

fn signing_string(payload: &IpnPayload) -> String {
    format!(
        "{}|{}|{}",
        payload.payment_id, payload.trx_status, payload.amount
    )
}

fn verify_signature(secret: &str, payload: &IpnPayload) -> bool {
    let Ok(mut mac) = HmacSha256::new_from_slice(secret.as_bytes()) else {
        return false;
    };
    mac.update(signing_string(payload).as_bytes());
    let Ok(signature) = hex::decode(payload.signature.trim()) else {
        return false;
    };
    mac.verify_slice(&signature).is_ok()
}

/// Test helper mirroring what the gateway computes on its side.
pub fn sign_ipn(secret: &str, payload: &IpnPayload) -> String {
    let mut mac = HmacSha256::new_from_slice(secret.as_bytes()).expect("hmac accepts any key size");
    mac.update(signing_string(payload).as_bytes());
    hex::encode(mac.finalize().into_bytes())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn payload(signature: String) -> IpnPayload {
        IpnPayload {
            payment_id: "TRX123".into(),
            trx_status: "Completed".into(),
            amount: "1500".into(),
            payer_msisdn: Some("01700000000".into()),
            signature,
        }
    }

    #[test]
    fn signature_round_trip() {
        let secret = "gateway-secret";
        let mut p = payload(String::new());
        p.signature = sign_ipn(secret, &p);
        assert!(verify_signature(secret, &p));
    }

    #[test]
    fn tampered_amount_fails_verification() {
        let secret = "gateway-secret";
        let mut p = payload(String::new());
        p.signature = sign_ipn(secret, &p);
        p.amount = "9999999".into();
        assert!(!verify_signature(secret, &p));
    }

    #[test]
    fn wrong_secret_fails_verification() {
        let mut p = payload(String::new());
        p.signature = sign_ipn("secret-a", &p);
        assert!(!verify_signature("secret-b", &p));
    }
}
