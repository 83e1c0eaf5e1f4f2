use crate::{
    cache::CatalogCache,
    config::AppConfig,
    db::{DbPool, OrmConn},
};

#[derive(Clone)]
pub struct AppState {
    pub pool: DbPool,
    pub orm: OrmConn,
    pub cache: CatalogCache,
    pub config: AppConfig,
}
