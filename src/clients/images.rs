//! Image CDN upload forwarder.

use std::sync::Arc;

use reqwest::multipart;
use secrecy::ExposeSecret;
use serde::Deserialize;

use crate::{
    config::ImageCdnConfig,
    error::{AppError, AppResult},
};

#[derive(Clone)]
pub struct ImageCdnClient {
    inner: Arc<ImageCdnClientInner>,
}

struct ImageCdnClientInner {
    client: reqwest::Client,
    upload_url: String,
    api_key: String,
}

#[derive(Debug, Deserialize)]
struct UploadResponse {
    url: String,
}

impl ImageCdnClient {
    pub fn new(config: &ImageCdnConfig) -> Self {
        Self {
            inner: Arc::new(ImageCdnClientInner {
                client: reqwest::Client::new(),
                upload_url: config.upload_url.clone(),
                api_key: config.api_key.expose_secret().to_string(),
            }),
        }
    }

    pub async fn upload(&self, file_name: String, bytes: Vec<u8>) -> AppResult<String> {
        let part = multipart::Part::bytes(bytes).file_name(file_name);
        let form = multipart::Form::new().part("image", part);

        let response = self
            .inner
            .client
            .post(&self.inner.upload_url)
            .bearer_auth(&self.inner.api_key)
            .multipart(form)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(AppError::Upstream(format!("image CDN returned {status}")));
        }
        Ok(response.json::<UploadResponse>().await?.url)
    }
}
