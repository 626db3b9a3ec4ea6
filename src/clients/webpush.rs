//! VAPID-authenticated Web Push delivery.
//!
//! Sends notification pings to subscription endpoints with a signed VAPID
//! token. Payload bodies stay server-side (the service worker fetches content
//! on wake), which keeps this client out of the message-encryption business.

use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

use jsonwebtoken::{Algorithm, EncodingKey, Header, encode};
use secrecy::ExposeSecret;
use serde::Serialize;

use crate::{
    config::PushConfig,
    error::{AppError, AppResult},
};

const TOKEN_TTL_SECS: u64 = 12 * 60 * 60;
const PUSH_TTL_SECS: u32 = 60 * 60;

/// Delivery outcome for one subscription.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PushOutcome {
    Sent,
    /// 404/410 from the push service: the subscription no longer exists.
    Gone,
    Failed(String),
}

#[derive(Clone)]
pub struct PushClient {
    inner: Arc<PushClientInner>,
}

struct PushClientInner {
    client: reqwest::Client,
    encoding_key: EncodingKey,
    public_key: String,
    subject: String,
}

#[derive(Debug, Serialize)]
struct VapidClaims<'a> {
    aud: &'a str,
    exp: u64,
    sub: &'a str,
}

impl PushClient {
    pub fn new(config: &PushConfig) -> anyhow::Result<Self> {
        let encoding_key =
            EncodingKey::from_ec_pem(config.vapid_private_key.expose_secret().as_bytes())?;
        Ok(Self {
            inner: Arc::new(PushClientInner {
                client: reqwest::Client::new(),
                encoding_key,
                public_key: config.vapid_public_key.clone(),
                subject: config.subject.clone(),
            }),
        })
    }

    pub async fn send(&self, endpoint: &str) -> AppResult<PushOutcome> {
        let audience = endpoint_origin(endpoint)
            .ok_or_else(|| AppError::BadRequest("invalid push endpoint".into()))?;
        let token = self.vapid_token(&audience)?;

        let response = self
            .inner
            .client
            .post(endpoint)
            .header(
                "Authorization",
                format!("vapid t={token}, k={}", self.inner.public_key),
            )
            .header("TTL", PUSH_TTL_SECS.to_string())
            .send()
            .await;

        let response = match response {
            Ok(r) => r,
            Err(err) => return Ok(PushOutcome::Failed(err.to_string())),
        };

        let status = response.status();
        if status.is_success() {
            Ok(PushOutcome::Sent)
        } else if status.as_u16() == 404 || status.as_u16() == 410 {
            Ok(PushOutcome::Gone)
        } else {
            Ok(PushOutcome::Failed(format!("push service returned {status}")))
        }
    }

    fn vapid_token(&self, audience: &str) -> AppResult<String> {
        let exp = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map_err(|e| AppError::Internal(anyhow::anyhow!(e)))?
            .as_secs()
            + TOKEN_TTL_SECS;
        let claims = VapidClaims {
            aud: audience,
            exp,
            sub: &self.inner.subject,
        };
        encode(
            &Header::new(Algorithm::ES256),
            &claims,
            &self.inner.encoding_key,
        )
        .map_err(|e| AppError::Internal(anyhow::anyhow!(e)))
    }
}

/// VAPID audience is the scheme and host of the push endpoint.
fn endpoint_origin(endpoint: &str) -> Option<String> {
    let (scheme, rest) = endpoint.split_once("://")?;
    let host = rest.split('/').next()?;
    if host.is_empty() {
        return None;
    }
    Some(format!("{scheme}://{host}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn origin_strips_path() {
        assert_eq!(
            endpoint_origin("https://fcm.googleapis.com/fcm/send/abc123").as_deref(),
            Some("https://fcm.googleapis.com")
        );
    }

    #[test]
    fn origin_rejects_garbage() {
        assert_eq!(endpoint_origin("not-a-url"), None);
        assert_eq!(endpoint_origin("https://"), None);
    }
}
