use async_trait::async_trait;
use hn_client::{HnApiClient, HnSource, RateLimitConfig, RetryConfig};
use ingest::{DatasetAssembler, FetchMode, PostCache};
use object_store::ObjectStore;
use publisher::Publisher;
use std::sync::Arc;
use tracing::info;
use trends_core::{AppConfig, CoreError};

/// One full refresh: assemble the dataset, then publish it.
#[async_trait]
pub trait Pipeline: Send + Sync {
    async fn run(&self) -> Result<(), CoreError>;
}

pub struct TrendsPipeline<S> {
    assembler: DatasetAssembler<S>,
    publisher: Publisher,
    mode: FetchMode,
}

impl TrendsPipeline<HnApiClient> {
    pub fn from_config(
        config: &AppConfig,
        mode: FetchMode,
        store: Arc<dyn ObjectStore>,
    ) -> Result<Self, CoreError> {
        let client = HnApiClient::new(&config.hn, RetryConfig::from(&config.retry))?;
        Ok(Self::new(Arc::new(client), config, mode, store))
    }
}

impl<S: HnSource> TrendsPipeline<S> {
    pub fn new(
        source: Arc<S>,
        config: &AppConfig,
        mode: FetchMode,
        store: Arc<dyn ObjectStore>,
    ) -> Self {
        Self {
            assembler: DatasetAssembler::new(
                source,
                PostCache::new(&config.pipeline.cache_dir),
                RateLimitConfig::from_millis(config.pipeline.fetch_delay_ms),
            ),
            publisher: Publisher::new(store, &config.storage),
            mode,
        }
    }
}

#[async_trait]
impl<S: HnSource + 'static> Pipeline for TrendsPipeline<S> {
    async fn run(&self) -> Result<(), CoreError> {
        info!(mode = ?self.mode, "Starting pipeline run");
        let dataset = self.assembler.assemble(self.mode).await?;
        let report = self.publisher.publish(&dataset).await?;
        info!(run_id = %report.run_id, artifacts = report.artifacts.len(), "Pipeline run complete");
        Ok(())
    }
}
