pub mod health;
pub mod metrics;
pub mod swagger;
pub mod users;

use crate::{config::AppConfig, database::UserStore};
use std::sync::Arc;

/// Shared handler state: the injected store plus runtime configuration.
pub struct AppState {
    pub store: Arc<dyn UserStore>,
    pub config: AppConfig,
}
