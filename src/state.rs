use std::sync::Arc;

use crate::config::AppConfig;
use crate::data::DataServiceClient;

#[derive(Clone)]
pub struct AppState {
    pub data: DataServiceClient,
    pub config: Arc<AppConfig>,
}

impl AppState {
    pub fn init() -> anyhow::Result<Self> {
        let config = Arc::new(AppConfig::from_env()?);
        let data = DataServiceClient::new(&config.data_service)?;
        Ok(Self { data, config })
    }

    pub fn from_parts(data: DataServiceClient, config: Arc<AppConfig>) -> Self {
        Self { data, config }
    }
}
