//! Shared application state

use crate::config::ServerConfig;
use gector_core::{Corrector, Normalizer, ParamsFile};
use metrics_exporter_prometheus::PrometheusHandle;
use std::sync::Arc;
use tracing::info;

/// Application state shared by all handlers
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<ServerConfig>,
    pub corrector: Arc<dyn Corrector>,
    pub normalizer: Arc<Normalizer>,
    pub metrics_handle: Option<PrometheusHandle>,
}

impl AppState {
    /// Build state around an already constructed corrector
    pub fn new(config: ServerConfig, corrector: Arc<dyn Corrector>) -> anyhow::Result<Self> {
        Ok(Self {
            config: Arc::new(config),
            corrector,
            normalizer: Arc::new(Normalizer::new()?),
            metrics_handle: None,
        })
    }

    /// Load the GECToR model named by the params file and build state around it.
    ///
    /// Weight loading is blocking, so it runs off the async executor.
    pub async fn load(config: ServerConfig) -> anyhow::Result<Self> {
        let params = ParamsFile::load(&config.params_path)?;
        let spec = params.model_params.spec;

        info!(
            device = %spec.device,
            "Loading GECToR model from params file {}",
            config.params_path.display()
        );
        let model = tokio::task::spawn_blocking(move || gector_model::load_gector(&spec)).await??;
        info!("Model {} ready", model.name());

        Self::new(config, Arc::new(model))
    }

    pub fn with_metrics(mut self, handle: PrometheusHandle) -> Self {
        self.metrics_handle = Some(handle);
        self
    }

    /// Defaults for the next request, read fresh from the params file
    pub fn defaults(&self) -> gector_core::Result<ParamsFile> {
        ParamsFile::load(&self.config.params_path)
    }
}
