use std::sync::Arc;

use crate::{
    cache::ListingCache,
    clients::{ai::AiClient, gateway::GatewayClient, images::ImageCdnClient, webpush::PushClient},
    config::AppConfig,
    db::{DbPool, OrmConn},
    services::email::Mailer,
};

#[derive(Clone)]
pub struct AppState {
    pub pool: DbPool,
    pub orm: OrmConn,
    pub config: Arc<AppConfig>,
    pub cache: ListingCache,
    pub mailer: Option<Mailer>,
    pub gateway: Option<GatewayClient>,
    pub ai: Option<AiClient>,
    pub push: Option<PushClient>,
    pub images: Option<ImageCdnClient>,
}

impl AppState {
    /// Wire optional clients from whichever config sections are present.
    pub fn new(pool: DbPool, orm: OrmConn, config: AppConfig) -> anyhow::Result<Self> {
        let mailer = match &config.smtp {
            Some(smtp) => Some(Mailer::new(smtp)?),
            None => None,
        };
        let gateway = config.gateway.as_ref().map(GatewayClient::new);
        let ai = config.ai.as_ref().map(AiClient::new);
        let push = config.push.as_ref().map(PushClient::new).transpose()?;
        let images = config.image_cdn.as_ref().map(ImageCdnClient::new);

        Ok(Self {
            pool,
            orm,
            config: Arc::new(config),
            cache: ListingCache::new(),
            mailer,
            gateway,
            ai,
            push,
            images,
        })
    }
}
