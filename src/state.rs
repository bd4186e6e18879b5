use anyhow::Result;
use prometheus_client::registry::Registry;

use crate::{client::RegistryClient, config::Configuration, pages::Pages};

pub struct GatewayState {
    pub config: Configuration,
    pub(crate) client: RegistryClient,
    pub(crate) pages: Pages,
    pub(crate) registry: Registry,
}

impl GatewayState {
    pub async fn new(config: Configuration) -> Result<Self> {
        let mut registry = Registry::with_prefix("crane");
        let client = RegistryClient::new(&config.registry, &mut registry)?;
        let pages = Pages::load(&config.public).await;

        Ok(Self {
            config,
            client,
            pages,
            registry,
        })
    }
}
