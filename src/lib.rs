pub mod allocation;
pub mod api;
pub mod config;
pub mod crypto;
pub mod db;
pub mod inference;
pub mod portal;
pub mod ui;

pub use db::DbPool;

use config::Config;
use metrics_exporter_prometheus::PrometheusHandle;
use std::sync::Arc;

use crate::inference::LabelClassifier;
use crate::portal::Portal;

pub struct AppState {
    pub config: Config,
    pub db: DbPool,
    pub portal: Portal,
    pub metrics_handle: Option<PrometheusHandle>,
}

impl AppState {
    pub fn new(config: Config, db: DbPool, classifier: Arc<dyn LabelClassifier>) -> Self {
        let portal = Portal::new(db.clone(), classifier, config.auth.session_ttl_hours);
        Self {
            config,
            db,
            portal,
            metrics_handle: None,
        }
    }

    /// Set the Prometheus metrics handle
    pub fn with_metrics(mut self, handle: PrometheusHandle) -> Self {
        self.metrics_handle = Some(handle);
        self
    }
}
