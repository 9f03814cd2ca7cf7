// src/sdmx/extract.rs

use serde_json::Value;
use tracing::{debug, trace};

use super::error::ExtractError;
use super::types::{DataSet, Dimension, Payload};

/// Time index read from every series. Only the first period is extracted.
const TIME_INDEX: &str = "0";

/// Two index-aligned columns: region code `i` belongs to value `i`.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ExtractedTable {
    pub region_codes: Vec<String>,
    pub values: Vec<Option<f64>>,
    /// Code of the region-type dimension in the extracted slice, if any.
    pub region_type: Option<String>,
}

impl ExtractedTable {
    pub fn len(&self) -> usize {
        self.region_codes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.region_codes.is_empty()
    }

    /// Iterate `(region_code, value)` pairs in payload order.
    pub fn rows(&self) -> impl Iterator<Item = (&str, Option<f64>)> + '_ {
        self.region_codes
            .iter()
            .map(String::as_str)
            .zip(self.values.iter().copied())
    }
}

/// Pull the region dimension out of `payload` and pair each of its codes
/// with the observation found under the matching composite key.
///
/// Every non-region dimension is pinned to its first code, so the result is
/// a single slice through the cube, in the region dimension's declared order.
pub fn extract(payload: &Payload, region_dimension_id: &str) -> Result<ExtractedTable, ExtractError> {
    let dims = payload.series_dimensions();
    let positions = key_positions(dims)?;

    let (region_idx, region_dim) = dims
        .iter()
        .enumerate()
        .find(|(_, d)| d.id == region_dimension_id)
        .ok_or_else(|| ExtractError::RegionDimensionNotFound {
            id: region_dimension_id.to_string(),
            available: dims.iter().map(|d| d.id.clone()).collect(),
        })?;
    let region_pos = positions[region_idx];
    let region_count = region_dim.values.len();
    debug!(
        dimension = region_dimension_id,
        key_position = region_pos,
        regions = region_count,
        "found region dimension"
    );

    let mut table = ExtractedTable {
        region_codes: Vec::with_capacity(region_count),
        values: Vec::with_capacity(region_count),
        region_type: None,
    };
    if region_count == 0 {
        return Ok(table);
    }

    let data_set = payload
        .data_sets
        .first()
        .ok_or(ExtractError::MissingDataSet)?;

    let mut template = vec![0usize; dims.len()];
    for (i, value) in region_dim.values.iter().enumerate() {
        template[region_pos] = i;
        let key = composite_key(&template);
        let observation = observation_at(data_set, &key)?;
        trace!(%key, region = %value.id, ?observation, "observation");

        table.region_codes.push(value.id.clone());
        table.values.push(observation);
    }

    Ok(table)
}

/// First code of the dimension named `dimension_id`, i.e. the code the fixed
/// all-zero key template selects for it.
pub fn region_type_code(payload: &Payload, dimension_id: &str) -> Option<String> {
    payload
        .series_dimensions()
        .iter()
        .find(|d| d.id == dimension_id)
        .and_then(|d| d.values.first())
        .map(|v| v.id.clone())
}

/// Effective key slot for each declared dimension. Must be a permutation of
/// `0..dims.len()`.
fn key_positions(dims: &[Dimension]) -> Result<Vec<usize>, ExtractError> {
    let positions: Vec<usize> = dims
        .iter()
        .enumerate()
        .map(|(idx, d)| d.key_position.unwrap_or(idx))
        .collect();

    let mut seen = vec![false; dims.len()];
    for &p in &positions {
        match seen.get_mut(p) {
            Some(slot) if !*slot => *slot = true,
            _ => {
                return Err(ExtractError::InvalidKeyPositions {
                    positions,
                    count: dims.len(),
                })
            }
        }
    }
    Ok(positions)
}

fn composite_key(template: &[usize]) -> String {
    template
        .iter()
        .map(|i| i.to_string())
        .collect::<Vec<_>>()
        .join(":")
}

fn observation_at(data_set: &DataSet, key: &str) -> Result<Option<f64>, ExtractError> {
    let series = data_set
        .series
        .get(key)
        .ok_or_else(|| ExtractError::MissingSeries {
            key: key.to_string(),
        })?;

    let first = series
        .observations
        .get(TIME_INDEX)
        .and_then(|obs| obs.first())
        .ok_or_else(|| ExtractError::MissingObservation {
            key: key.to_string(),
        })?;

    let invalid = || ExtractError::InvalidObservation {
        key: key.to_string(),
        value: first.to_string(),
    };
    match first {
        Value::Null => Ok(None),
        Value::Number(n) => n.as_f64().map(Some).ok_or_else(invalid),
        // some publishers quote their numbers
        Value::String(s) => s.trim().parse::<f64>().map(Some).map_err(|_| invalid()),
        _ => Err(invalid()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn payload(v: Value) -> Payload {
        serde_json::from_value(v).unwrap()
    }

    fn region_time_payload() -> Payload {
        payload(json!({
            "structure": { "dimensions": { "series": [
                { "id": "REGION", "keyPosition": 1,
                  "values": [{ "id": "1", "name": "NSW" }, { "id": "2", "name": "VIC" }] },
                { "id": "TIME", "keyPosition": 0, "values": [{ "id": "2020" }] }
            ]}},
            "dataSets": [{ "series": {
                "0:0": { "observations": { "0": [10] } },
                "0:1": { "observations": { "0": [20] } }
            }}]
        }))
    }

    #[test]
    fn extracts_region_codes_and_values() {
        let table = extract(&region_time_payload(), "REGION").unwrap();
        assert_eq!(table.region_codes, vec!["1", "2"]);
        assert_eq!(table.values, vec![Some(10.0), Some(20.0)]);
        assert_eq!(table.region_type, None);
    }

    #[test]
    fn output_length_matches_region_count() {
        let regions: Vec<Value> = (0..7).map(|i| json!({ "id": format!("R{i}") })).collect();
        let mut series = serde_json::Map::new();
        for i in 0..7 {
            series.insert(
                format!("0:0:{i}"),
                json!({ "observations": { "0": [i as f64 * 1.5], "1": [99] } }),
            );
        }
        let p = payload(json!({
            "structure": { "dimensions": { "series": [
                { "id": "MEASURE", "keyPosition": 0, "values": [{ "id": "M1" }, { "id": "M2" }] },
                { "id": "SEX", "keyPosition": 1, "values": [{ "id": "3" }, { "id": "1" }, { "id": "2" }] },
                { "id": "ASGS", "keyPosition": 2, "values": regions }
            ]}},
            "dataSets": [{ "series": series }]
        }));

        let table = extract(&p, "ASGS").unwrap();
        assert_eq!(table.len(), 7);
        assert_eq!(table.values.len(), 7);
        assert_eq!(table.region_codes[6], "R6");
        assert_eq!(table.values[2], Some(3.0));
    }

    #[test]
    fn preserves_declared_region_order() {
        // region codes deliberately unsorted, region dimension declared first
        // but keyed last
        let p = payload(json!({
            "structure": { "dimensions": { "series": [
                { "id": "REGION", "keyPosition": 1,
                  "values": [{ "id": "9" }, { "id": "3" }, { "id": "5" }] },
                { "id": "MEASURE", "keyPosition": 0, "values": [{ "id": "B" }, { "id": "A" }] }
            ]}},
            "dataSets": [{ "series": {
                "0:0": { "observations": { "0": [1] } },
                "0:1": { "observations": { "0": [2] } },
                "0:2": { "observations": { "0": [3] } },
                "1:0": { "observations": { "0": [100] } }
            }}]
        }));

        let table = extract(&p, "REGION").unwrap();
        assert_eq!(table.region_codes, vec!["9", "3", "5"]);
        assert_eq!(table.values, vec![Some(1.0), Some(2.0), Some(3.0)]);
    }

    #[test]
    fn missing_region_dimension_is_an_error() {
        let err = extract(&region_time_payload(), "STATE").unwrap_err();
        assert_eq!(
            err,
            ExtractError::RegionDimensionNotFound {
                id: "STATE".into(),
                available: vec!["REGION".into(), "TIME".into()],
            }
        );
        assert!(err.to_string().contains("REGION, TIME"));
    }

    #[test]
    fn zero_regions_gives_empty_table() {
        let p = payload(json!({
            "structure": { "dimensions": { "series": [
                { "id": "REGION", "keyPosition": 0, "values": [] }
            ]}},
            "dataSets": []
        }));
        let table = extract(&p, "REGION").unwrap();
        assert!(table.is_empty());
        assert!(table.values.is_empty());
    }

    #[test]
    fn missing_series_key_is_reported() {
        let mut p = region_time_payload();
        p.data_sets[0].series.remove("0:1");
        let err = extract(&p, "REGION").unwrap_err();
        assert_eq!(err, ExtractError::MissingSeries { key: "0:1".into() });
    }

    #[test]
    fn missing_data_set_is_reported() {
        let mut p = region_time_payload();
        p.data_sets.clear();
        assert_eq!(extract(&p, "REGION").unwrap_err(), ExtractError::MissingDataSet);
    }

    #[test]
    fn null_and_quoted_observations() {
        let p = payload(json!({
            "structure": { "dimensions": { "series": [
                { "id": "REGION", "values": [{ "id": "A" }, { "id": "B" }, { "id": "C" }] }
            ]}},
            "dataSets": [{ "series": {
                "0": { "observations": { "0": [null, 0] } },
                "1": { "observations": { "0": ["42.5"] } },
                "2": { "observations": { "0": [true] } }
            }}]
        }));

        let err = extract(&p, "REGION").unwrap_err();
        assert_eq!(
            err,
            ExtractError::InvalidObservation {
                key: "2".into(),
                value: "true".into()
            }
        );

        let mut p = p;
        p.structure.dimensions.series[0].values.pop();
        let table = extract(&p, "REGION").unwrap();
        assert_eq!(table.values, vec![None, Some(42.5)]);
    }

    #[test]
    fn series_without_first_period() {
        let mut p = region_time_payload();
        p.data_sets[0]
            .series
            .get_mut("0:0")
            .unwrap()
            .observations
            .clear();
        assert_eq!(
            extract(&p, "REGION").unwrap_err(),
            ExtractError::MissingObservation { key: "0:0".into() }
        );
    }

    #[test]
    fn rejects_duplicate_key_positions() {
        let mut p = region_time_payload();
        p.structure.dimensions.series[1].key_position = Some(1);
        assert!(matches!(
            extract(&p, "REGION"),
            Err(ExtractError::InvalidKeyPositions { count: 2, .. })
        ));
    }

    #[test]
    fn region_type_is_first_code() {
        let p = payload(json!({
            "structure": { "dimensions": { "series": [
                { "id": "REGIONTYPE", "keyPosition": 0, "values": [{ "id": "STE" }, { "id": "SA4" }] },
                { "id": "REGION", "keyPosition": 1, "values": [{ "id": "1" }] }
            ]}},
            "dataSets": [{ "series": { "0:0": { "observations": { "0": [5] } } } }]
        }));
        assert_eq!(region_type_code(&p, "REGIONTYPE").as_deref(), Some("STE"));
        assert_eq!(region_type_code(&p, "NOPE"), None);
    }
}
