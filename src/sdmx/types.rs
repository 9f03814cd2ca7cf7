// src/sdmx/types.rs

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;

/// An SDMX-JSON data message, reduced to the parts the extractor reads.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Payload {
    pub structure: Structure,
    #[serde(rename = "dataSets", default)]
    pub data_sets: Vec<DataSet>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Structure {
    pub dimensions: Dimensions,
}

/// Series-level dimensions make up the composite key; observation-level
/// dimensions (usually TIME_PERIOD) index the observation map.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct Dimensions {
    #[serde(default)]
    pub series: Vec<Dimension>,
    #[serde(default)]
    pub observation: Vec<Dimension>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Dimension {
    pub id: String,
    #[serde(default)]
    pub name: Option<String>,
    /// Slot of this dimension in the composite key. Some publishers omit it,
    /// in which case the declared order is the key order.
    #[serde(rename = "keyPosition", default)]
    pub key_position: Option<usize>,
    #[serde(default)]
    pub values: Vec<DimensionValue>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DimensionValue {
    pub id: String,
    #[serde(default)]
    pub name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct DataSet {
    #[serde(default)]
    pub series: HashMap<String, Series>,
}

/// `observations` maps a time index ("0", "1", ...) to `[value, attr...]`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct Series {
    #[serde(default)]
    pub observations: HashMap<String, Vec<Value>>,
}

impl Payload {
    /// Parse a payload from raw JSON text.
    pub fn from_json(text: &str) -> serde_json::Result<Self> {
        serde_json::from_str(text)
    }

    pub fn series_dimensions(&self) -> &[Dimension] {
        &self.structure.dimensions.series
    }
}
