use std::sync::Arc;

use crate::{
    config::AppConfig,
    db::{DbPool, OrmConn},
    notify::Notifier,
};

#[derive(Clone)]
pub struct AppState {
    pub pool: DbPool,
    pub orm: OrmConn,
    pub config: Arc<AppConfig>,
    pub http: reqwest::Client,
    pub notifier: Arc<dyn Notifier>,
}

impl AppState {
    pub fn new(
        pool: DbPool,
        config: AppConfig,
        notifier: Arc<dyn Notifier>,
    ) -> anyhow::Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(config.catalog_fetch_timeout)
            .build()?;
        let orm = crate::db::create_orm_conn(&pool);
        Ok(Self {
            pool,
            orm,
            config: Arc::new(config),
            http,
            notifier,
        })
    }
}
