// src/catalog/mod.rs

//! Catalog-item host: owns one config, rebuilds the region table from it and
//! tells subscribers what changed.
//!
//! Rebuilds are fire-and-forget tokio tasks. They are neither queued nor
//! deduplicated, so two rebuilds started close together both run to
//! completion and whichever *finishes* last leaves its table in place.

pub mod producer;

pub use producer::{NoRegionDetails, RegionDetails, SdmxProducer, TableProducer};

use anyhow::Result;
use arrow::record_batch::RecordBatch;
use chrono::{DateTime, Utc};
use serde_json::Value;
use std::sync::{
    atomic::{AtomicU64, Ordering},
    Arc, Mutex, PoisonError, RwLock,
};
use tokio::{sync::broadcast, task::JoinHandle};
use tracing::{error, info, info_span, Instrument};

use crate::config::SdmxConfig;
use crate::share;
use crate::table;

const EVENT_CAPACITY: usize = 64;

/// The table currently shown for this item.
#[derive(Debug, Clone)]
pub struct TableSnapshot {
    /// Rebuild that produced this table.
    pub generation: u64,
    pub batch: Arc<RecordBatch>,
    pub region_type: Option<String>,
    /// `false` for an empty table; the renderer hides its output.
    pub show: bool,
    pub built_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub enum CatalogEvent {
    ConfigChanged(Arc<SdmxConfig>),
    TableReplaced {
        generation: u64,
        rows: usize,
        show: bool,
    },
    Failed {
        generation: u64,
        message: String,
    },
}

pub struct CatalogItem<P, R = NoRegionDetails> {
    producer: Arc<P>,
    region_details: Arc<R>,
    config: Arc<RwLock<Arc<SdmxConfig>>>,
    table: Arc<Mutex<Option<TableSnapshot>>>,
    generation: Arc<AtomicU64>,
    events: broadcast::Sender<CatalogEvent>,
}

impl<P: TableProducer> CatalogItem<P, NoRegionDetails> {
    pub fn new(config: SdmxConfig, producer: P) -> Self {
        Self::with_region_details(config, producer, NoRegionDetails)
    }
}

impl<P: TableProducer, R: RegionDetails> CatalogItem<P, R> {
    pub fn with_region_details(config: SdmxConfig, producer: P, region_details: R) -> Self {
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        Self {
            producer: Arc::new(producer),
            region_details: Arc::new(region_details),
            config: Arc::new(RwLock::new(Arc::new(config))),
            table: Arc::new(Mutex::new(None)),
            generation: Arc::new(AtomicU64::new(0)),
            events,
        }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<CatalogEvent> {
        self.events.subscribe()
    }

    pub fn config(&self) -> Arc<SdmxConfig> {
        self.config
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn table(&self) -> Option<TableSnapshot> {
        self.table
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Number of rebuilds started so far.
    pub fn generation(&self) -> u64 {
        self.generation.load(Ordering::SeqCst)
    }

    /// Replace the config. Returns `None` if nothing changed, otherwise the
    /// handle of the single rebuild this change starts.
    pub fn update_config(&self, next: SdmxConfig) -> Option<JoinHandle<Result<u64>>> {
        let next = Arc::new(next);
        {
            let mut current = self.config.write().unwrap_or_else(PoisonError::into_inner);
            if **current == *next {
                return None;
            }
            *current = next.clone();
        }
        info!(dataset = %next.dataset_id, "config changed");
        let _ = self.events.send(CatalogEvent::ConfigChanged(next));
        Some(self.rebuild())
    }

    /// Overlay a share-link payload onto the current config.
    pub fn apply_share(&self, shared: &Value) -> Result<Option<JoinHandle<Result<u64>>>> {
        let next = share::apply_share(&self.config(), shared)?;
        Ok(self.update_config(next))
    }

    /// Start one fetch-and-rebuild cycle against the current config.
    ///
    /// The task resolves to its generation number on success. On failure the
    /// previous table stays in place and a [`CatalogEvent::Failed`] is sent.
    pub fn rebuild(&self) -> JoinHandle<Result<u64>> {
        let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        let config = self.config();
        let producer = Arc::clone(&self.producer);
        let region_details = Arc::clone(&self.region_details);
        let table = Arc::clone(&self.table);
        let events = self.events.clone();

        let span = info_span!("rebuild", generation, dataset = %config.dataset_id);
        tokio::spawn(
            async move {
                let result = run_rebuild(
                    generation,
                    &config,
                    producer.as_ref(),
                    region_details.as_ref(),
                    &table,
                    &events,
                )
                .await;
                if let Err(e) = &result {
                    error!(error = %format!("{e:#}"), "rebuild failed");
                    let _ = events.send(CatalogEvent::Failed {
                        generation,
                        message: format!("{e:#}"),
                    });
                }
                result.map(|_| generation)
            }
            .instrument(span),
        )
    }
}

async fn run_rebuild<P: TableProducer, R: RegionDetails>(
    generation: u64,
    config: &SdmxConfig,
    producer: &P,
    region_details: &R,
    table: &Mutex<Option<TableSnapshot>>,
    events: &broadcast::Sender<CatalogEvent>,
) -> Result<()> {
    let extracted = producer.produce(config).await?;
    let batch = Arc::new(table::to_record_batch(&extracted)?);
    let rows = batch.num_rows();
    let show = rows > 0;

    let snapshot = TableSnapshot {
        generation,
        batch: batch.clone(),
        region_type: extracted.region_type.clone(),
        show,
        built_at: Utc::now(),
    };
    // last completion wins; no generation check
    *table.lock().unwrap_or_else(PoisonError::into_inner) = Some(snapshot);
    info!(rows, show, "table replaced");
    let _ = events.send(CatalogEvent::TableReplaced {
        generation,
        rows,
        show,
    });

    if show {
        region_details.load(batch, extracted.region_type).await?;
    }
    Ok(())
}
