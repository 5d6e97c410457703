use std::sync::Arc;

use sqlx::PgPool;

use crate::auth::repo::{PgUserRepo, UserRepo};
use crate::config::AppConfig;
use crate::mail::{self, Mailer};
use crate::posts::repo::{PgPostRepo, PostRepo};

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub users: Arc<dyn UserRepo>,
    pub posts: Arc<dyn PostRepo>,
    pub mailer: Arc<dyn Mailer>,
}

impl AppState {
    /// Postgres-backed repositories and the mailer selected by config.
    pub fn init(config: AppConfig, db: PgPool) -> anyhow::Result<Self> {
        let mailer = mail::from_config(&config.mail)?;
        Ok(Self::from_parts(
            Arc::new(config),
            Arc::new(PgUserRepo::new(db.clone())),
            Arc::new(PgPostRepo::new(db)),
            mailer,
        ))
    }

    pub fn from_parts(
        config: Arc<AppConfig>,
        users: Arc<dyn UserRepo>,
        posts: Arc<dyn PostRepo>,
        mailer: Arc<dyn Mailer>,
    ) -> Self {
        Self {
            config,
            users,
            posts,
            mailer,
        }
    }
}
