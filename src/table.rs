// src/table.rs

use anyhow::{Context, Result};
use arrow::{
    array::{ArrayRef, Float64Array, StringArray},
    datatypes::{DataType, Field, Schema},
    record_batch::RecordBatch,
};
use std::sync::Arc;

use crate::sdmx::ExtractedTable;

/// Column holding region codes; the region-mapping side matches on this name.
pub const REGION_COLUMN: &str = "region_code";
pub const VALUE_COLUMN: &str = "value";

/// `[region_code: Utf8, value: Float64?]`
pub fn table_schema() -> Arc<Schema> {
    Arc::new(Schema::new(vec![
        Field::new(REGION_COLUMN, DataType::Utf8, false),
        Field::new(VALUE_COLUMN, DataType::Float64, true),
    ]))
}

/// Build the two-column batch handed to the region mapper.
pub fn to_record_batch(table: &ExtractedTable) -> Result<RecordBatch> {
    let codes = StringArray::from_iter_values(table.region_codes.iter());
    let values = Float64Array::from(table.values.clone());

    RecordBatch::try_new(
        table_schema(),
        vec![Arc::new(codes) as ArrayRef, Arc::new(values) as ArrayRef],
    )
    .context("building region table batch")
}

/// Inverse of [`to_record_batch`]; looks columns up by name.
pub fn from_record_batch(batch: &RecordBatch) -> Result<ExtractedTable> {
    let codes = batch
        .column_by_name(REGION_COLUMN)
        .and_then(|c| c.as_any().downcast_ref::<StringArray>())
        .with_context(|| format!("missing Utf8 column `{}`", REGION_COLUMN))?;
    let values = batch
        .column_by_name(VALUE_COLUMN)
        .and_then(|c| c.as_any().downcast_ref::<Float64Array>())
        .with_context(|| format!("missing Float64 column `{}`", VALUE_COLUMN))?;

    Ok(ExtractedTable {
        region_codes: codes
            .iter()
            .map(|c| c.unwrap_or_default().to_string())
            .collect(),
        values: values.iter().collect(),
        region_type: None,
    })
}
