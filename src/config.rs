// src/config.rs

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use std::{fs, path::Path, time::Duration};
use url::Url;

pub const DEFAULT_BASE_URL: &str = "https://api.data.abs.gov.au";
pub const DEFAULT_REGION_DIMENSION: &str = "REGION";
pub const DEFAULT_REGION_TYPE_DIMENSION: &str = "REGIONTYPE";

/// Everything needed to fetch and reshape one SDMX-JSON dataset.
///
/// Treated as an immutable value: callers build a new config and hand it to
/// [`CatalogItem::update_config`](crate::catalog::CatalogItem::update_config)
/// rather than mutating fields in place.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SdmxConfig {
    #[serde(rename = "url", default = "default_base_url")]
    pub base_url: String,
    pub dataset_id: String,
    #[serde(default = "default_region_dimension")]
    pub region_dimension_id: String,
    #[serde(default = "default_region_type_dimension")]
    pub region_type_dimension_id: String,
    /// Key segments joined with `.` into the data query key.
    #[serde(default)]
    pub filter: Vec<String>,
    #[serde(default)]
    pub display_percent: bool,
    #[serde(default)]
    pub fetch: FetchSettings,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct FetchSettings {
    pub max_retries: u32,
    pub initial_backoff_ms: u64,
    pub timeout_secs: u64,
}

impl Default for FetchSettings {
    fn default() -> Self {
        Self {
            max_retries: 3,
            initial_backoff_ms: 500,
            timeout_secs: 30,
        }
    }
}

impl FetchSettings {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

fn default_base_url() -> String {
    DEFAULT_BASE_URL.to_string()
}

fn default_region_dimension() -> String {
    DEFAULT_REGION_DIMENSION.to_string()
}

fn default_region_type_dimension() -> String {
    DEFAULT_REGION_TYPE_DIMENSION.to_string()
}

impl SdmxConfig {
    /// A config for `dataset_id` with every other field defaulted.
    pub fn new(dataset_id: impl Into<String>) -> Self {
        Self {
            base_url: default_base_url(),
            dataset_id: dataset_id.into(),
            region_dimension_id: default_region_dimension(),
            region_type_dimension_id: default_region_type_dimension(),
            filter: Vec::new(),
            display_percent: false,
            fetch: FetchSettings::default(),
        }
    }

    /// Load and validate a YAML config file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let text = fs::read_to_string(path)
            .with_context(|| format!("reading config {}", path.display()))?;
        let cfg = Self::from_yaml(&text)
            .with_context(|| format!("parsing config {}", path.display()))?;
        Ok(cfg)
    }

    pub fn from_yaml(text: &str) -> Result<Self> {
        let cfg: Self = serde_yaml::from_str(text)?;
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn validate(&self) -> Result<()> {
        if self.dataset_id.trim().is_empty() {
            bail!("datasetId must not be empty");
        }
        if self.region_dimension_id.trim().is_empty() {
            bail!("regionDimensionId must not be empty");
        }
        Ok(())
    }

    pub fn with_display_percent(&self, display_percent: bool) -> Self {
        Self {
            display_percent,
            ..self.clone()
        }
    }

    /// Data query key: filter segments joined by `.`, or `all`.
    pub fn data_key(&self) -> String {
        if self.filter.is_empty() {
            "all".to_string()
        } else {
            self.filter.join(".")
        }
    }

    /// `{base_url}/data/{dataset_id}/{key}`
    pub fn data_url(&self) -> Result<Url> {
        self.validate()?;
        let mut url = Url::parse(&self.base_url)
            .with_context(|| format!("parsing base URL {}", self.base_url))?;
        let key = self.data_key();
        url.path_segments_mut()
            .map_err(|_| anyhow::anyhow!("base URL {} cannot be a base", self.base_url))?
            .pop_if_empty()
            .extend(["data", self.dataset_id.as_str(), key.as_str()]);
        Ok(url)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::tempdir;

    #[test]
    fn yaml_defaults() -> Result<()> {
        let cfg = SdmxConfig::from_yaml("datasetId: ABS_REGIONAL_ASGS2016\n")?;
        assert_eq!(cfg.base_url, DEFAULT_BASE_URL);
        assert_eq!(cfg.region_dimension_id, "REGION");
        assert_eq!(cfg.region_type_dimension_id, "REGIONTYPE");
        assert!(cfg.filter.is_empty());
        assert!(!cfg.display_percent);
        assert_eq!(cfg.fetch, FetchSettings::default());
        assert_eq!(cfg, SdmxConfig::new("ABS_REGIONAL_ASGS2016"));
        Ok(())
    }

    #[test]
    fn yaml_full() -> Result<()> {
        let cfg = SdmxConfig::from_yaml(
            r#"
url: https://stat.example.org/rest/
datasetId: POP
regionDimensionId: ASGS_2016
regionTypeDimensionId: REGION_TYPE
filter: ["ERP", "3", "", "STE"]
displayPercent: true
fetch:
  maxRetries: 1
"#,
        )?;
        assert_eq!(cfg.region_dimension_id, "ASGS_2016");
        assert!(cfg.display_percent);
        assert_eq!(cfg.fetch.max_retries, 1);
        assert_eq!(cfg.fetch.initial_backoff_ms, 500);
        assert_eq!(
            cfg.data_url()?.as_str(),
            "https://stat.example.org/rest/data/POP/ERP.3..STE"
        );
        Ok(())
    }

    #[test]
    fn data_url_without_filter() -> Result<()> {
        let cfg = SdmxConfig::new("RES_DWELL");
        assert_eq!(
            cfg.data_url()?.as_str(),
            "https://api.data.abs.gov.au/data/RES_DWELL/all"
        );
        Ok(())
    }

    #[test]
    fn rejects_missing_dataset() {
        assert!(SdmxConfig::from_yaml("regionDimensionId: REGION\n").is_err());
        assert!(SdmxConfig::from_yaml("datasetId: '  '\n").is_err());
        assert!(SdmxConfig::new("X").with_display_percent(true).validate().is_ok());
    }

    #[test]
    fn load_from_file() -> Result<()> {
        let dir = tempdir()?;
        let path = dir.path().join("abs.yaml");
        let mut f = fs::File::create(&path)?;
        writeln!(f, "datasetId: ABS_CENSUS2016_T02")?;
        writeln!(f, "regionDimensionId: ASGS_2016")?;
        drop(f);

        let cfg = SdmxConfig::load(&path)?;
        assert_eq!(cfg.dataset_id, "ABS_CENSUS2016_T02");
        assert_eq!(cfg.region_dimension_id, "ASGS_2016");

        let missing = SdmxConfig::load(dir.path().join("nope.yaml")).unwrap_err();
        assert!(format!("{missing:#}").contains("reading config"));
        Ok(())
    }
}
