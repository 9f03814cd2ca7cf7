// src/export.rs

use anyhow::{Context, Result};
use arrow::record_batch::RecordBatch;
use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;
use parquet::arrow::ArrowWriter;
use parquet::basic::Compression;
use parquet::file::properties::WriterProperties;
use std::{
    fs::{self, File},
    io::BufWriter,
    path::Path,
};

/// Write `batch` to `path` as Snappy Parquet, via `<path>.tmp` and a rename.
pub fn write_parquet(path: &Path, batch: &RecordBatch) -> Result<()> {
    let tmp_path = path.with_extension("parquet.tmp");

    let tmp_file = File::create(&tmp_path)
        .with_context(|| format!("could not create temporary file `{}`", tmp_path.display()))?;
    let props = WriterProperties::builder()
        .set_compression(Compression::SNAPPY)
        .build();
    let mut writer = ArrowWriter::try_new(BufWriter::new(tmp_file), batch.schema(), Some(props))
        .context("creating ArrowWriter for region table")?;
    writer.write(batch).context("writing region table batch")?;
    writer.close().context("closing ArrowWriter for region table")?;

    fs::rename(&tmp_path, path).with_context(|| {
        format!(
            "failed to rename `{}` to `{}`",
            tmp_path.display(),
            path.display()
        )
    })?;
    Ok(())
}

/// Read every batch back from a Parquet file.
pub fn read_parquet(path: &Path) -> Result<Vec<RecordBatch>> {
    let file = File::open(path).with_context(|| format!("failed to open `{}`", path.display()))?;
    let reader = ParquetRecordBatchReaderBuilder::try_new(file)
        .with_context(|| format!("reading Parquet metadata from `{}`", path.display()))?
        .with_batch_size(1024)
        .build()
        .with_context(|| format!("building RecordBatchReader for `{}`", path.display()))?;

    reader
        .collect::<Result<Vec<_>, _>>()
        .with_context(|| format!("error reading RecordBatch from `{}`", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sdmx::ExtractedTable;
    use crate::table;
    use tempfile::tempdir;

    #[test]
    fn writes_and_reads_region_table() -> Result<()> {
        let tmp = tempdir()?;
        let path = tmp.path().join("ABS_ERP.parquet");
        let extracted = ExtractedTable {
            region_codes: vec!["1".into(), "2".into(), "8".into()],
            values: vec![Some(8_166_369.0), Some(6_680_648.0), None],
            region_type: Some("STE".into()),
        };

        write_parquet(&path, &table::to_record_batch(&extracted)?)?;
        assert!(path.exists());
        assert!(!tmp.path().join("ABS_ERP.parquet.tmp").exists());

        let batches = read_parquet(&path)?;
        let rows: usize = batches.iter().map(|b| b.num_rows()).sum();
        assert_eq!(rows, 3);
        let back = table::from_record_batch(&batches[0])?;
        assert_eq!(back.region_codes, extracted.region_codes);
        assert_eq!(back.values, extracted.values);
        Ok(())
    }

    #[test]
    fn missing_file_names_the_path() {
        let err = read_parquet(Path::new("/nonexistent/table.parquet")).unwrap_err();
        assert!(err.to_string().contains("/nonexistent/table.parquet"));
    }
}
