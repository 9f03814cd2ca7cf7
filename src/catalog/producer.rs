// src/catalog/producer.rs

use anyhow::{Context, Result};
use arrow::record_batch::RecordBatch;
use std::future::Future;
use std::sync::Arc;
use tracing::info;

use crate::config::SdmxConfig;
use crate::fetch::PayloadSource;
use crate::sdmx::{self, ExtractedTable};

/// Produces a region table from whatever source a config points at.
pub trait TableProducer: Send + Sync + 'static {
    fn produce(&self, config: &SdmxConfig) -> impl Future<Output = Result<ExtractedTable>> + Send;
}

/// Follow-up step run once a table is in place, e.g. matching region codes
/// against map geometry. Owned by the region-mapping side.
pub trait RegionDetails: Send + Sync + 'static {
    fn load(
        &self,
        table: Arc<RecordBatch>,
        region_type: Option<String>,
    ) -> impl Future<Output = Result<()>> + Send;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct NoRegionDetails;

impl RegionDetails for NoRegionDetails {
    async fn load(&self, _table: Arc<RecordBatch>, _region_type: Option<String>) -> Result<()> {
        Ok(())
    }
}

/// Fetch an SDMX-JSON payload and extract the configured region dimension.
#[derive(Debug, Clone)]
pub struct SdmxProducer<S> {
    source: S,
}

impl<S: PayloadSource> SdmxProducer<S> {
    pub fn new(source: S) -> Self {
        Self { source }
    }

    pub fn source(&self) -> &S {
        &self.source
    }
}

impl<S: PayloadSource> TableProducer for SdmxProducer<S> {
    async fn produce(&self, config: &SdmxConfig) -> Result<ExtractedTable> {
        let url = config.data_url()?;
        let payload = self
            .source
            .fetch(&url)
            .await
            .with_context(|| format!("fetching {}", url))?;

        let mut table = sdmx::extract(&payload, &config.region_dimension_id)
            .with_context(|| format!("extracting `{}` from {}", config.region_dimension_id, url))?;
        table.region_type = sdmx::region_type_code(&payload, &config.region_type_dimension_id);

        info!(
            dataset = %config.dataset_id,
            rows = table.len(),
            region_type = ?table.region_type,
            "extracted region table"
        );
        Ok(table)
    }
}
