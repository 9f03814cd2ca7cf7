//! Fetch SDMX-JSON datasets and reshape them into region tables for a
//! region-mapping renderer.

pub mod catalog;
pub mod config;
pub mod export;
pub mod fetch;
pub mod sdmx;
pub mod share;
pub mod table;

pub use catalog::{CatalogEvent, CatalogItem, SdmxProducer, TableSnapshot};
pub use config::SdmxConfig;
pub use sdmx::{extract, ExtractError, ExtractedTable, Payload};
