// src/share.rs

use anyhow::{bail, Context, Result};
use serde_json::{Map, Value};

use crate::config::SdmxConfig;

/// Config keys that travel in share links. Fetch tuning stays local.
pub const SHARE_KEYS: &[&str] = &[
    "url",
    "datasetId",
    "regionDimensionId",
    "regionTypeDimensionId",
    "filter",
    "displayPercent",
];

/// Serialize the allow-listed part of `config` for a share link.
pub fn to_share_json(config: &SdmxConfig) -> Result<Map<String, Value>> {
    let full = match serde_json::to_value(config).context("serializing config")? {
        Value::Object(map) => map,
        other => bail!("config serialized to a non-object: {}", other),
    };
    Ok(full
        .into_iter()
        .filter(|(k, _)| SHARE_KEYS.contains(&k.as_str()))
        .collect())
}

/// Overlay a share payload onto `base`. Keys outside [`SHARE_KEYS`] are
/// ignored; the result is validated.
pub fn apply_share(base: &SdmxConfig, shared: &Value) -> Result<SdmxConfig> {
    let incoming = shared
        .as_object()
        .with_context(|| format!("share payload must be a JSON object, got {}", shared))?;

    let mut merged = match serde_json::to_value(base).context("serializing config")? {
        Value::Object(map) => map,
        other => bail!("config serialized to a non-object: {}", other),
    };
    for key in SHARE_KEYS {
        if let Some(v) = incoming.get(*key) {
            merged.insert((*key).to_string(), v.clone());
        }
    }

    let next: SdmxConfig =
        serde_json::from_value(Value::Object(merged)).context("share payload has invalid fields")?;
    next.validate()?;
    Ok(next)
}
