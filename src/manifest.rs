/*!
 * Help page manifest.
 *
 * The manifest is a YAML sequence of records; only `id` and `detailUrl` matter
 * for downloading, the remaining fields are used for listing.
 */

use serde::{Deserialize, Deserializer, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

use crate::errors::AppError;

/// One help page record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HelpEntry {
    #[serde(default)]
    pub id: String,

    #[serde(rename = "detailUrl", default)]
    pub detail_url: String,

    #[serde(rename = "helpCategoryId", default)]
    pub help_category_id: String,

    #[serde(default)]
    pub name: String,

    /// Sort key only. Missing or non-numeric values sort as 0.
    #[serde(default, deserialize_with = "lenient_order")]
    pub order: f64,
}

fn lenient_order<'de, D: Deserializer<'de>>(deserializer: D) -> Result<f64, D::Error> {
    let value = serde_yaml::Value::deserialize(deserializer)?;
    let order = match &value {
        serde_yaml::Value::Number(number) => number.as_f64(),
        serde_yaml::Value::String(text) => text.trim().parse().ok(),
        _ => None,
    };
    Ok(order.filter(|order| order.is_finite()).unwrap_or(0.0))
}

impl HelpEntry {
    /// Entries without a URL are skipped by the downloader
    pub fn has_detail_url(&self) -> bool {
        !self.detail_url.trim().is_empty()
    }

    /// Category used for listing; entries without one are grouped as `unknown`
    pub fn category(&self) -> &str {
        if self.help_category_id.is_empty() {
            "unknown"
        } else {
            &self.help_category_id
        }
    }
}

/// Parse manifest text
pub fn parse_manifest(content: &str) -> Result<Vec<HelpEntry>, AppError> {
    // An empty document is an empty manifest
    if content.trim().is_empty() {
        return Ok(Vec::new());
    }
    let entries: Vec<HelpEntry> = serde_yaml::from_str(content)?;
    Ok(entries)
}

/// Load the manifest from a YAML file
pub fn load_manifest<P: AsRef<Path>>(path: P) -> Result<Vec<HelpEntry>, AppError> {
    let path = path.as_ref();
    let content = std::fs::read_to_string(path)
        .map_err(|e| AppError::Manifest(format!("Failed to read {}: {}", path.display(), e)))?;
    parse_manifest(&content)
        .map_err(|e| AppError::Manifest(format!("Failed to parse {}: {}", path.display(), e)))
}

/// First entry with the given id
pub fn find_entry<'a>(entries: &'a [HelpEntry], id: &str) -> Option<&'a HelpEntry> {
    entries.iter().find(|entry| entry.id == id)
}

/// Entries grouped by category (sorted by name), each group sorted by `order`
pub fn group_by_category(entries: &[HelpEntry]) -> BTreeMap<String, Vec<&HelpEntry>> {
    let mut groups: BTreeMap<String, Vec<&HelpEntry>> = BTreeMap::new();
    for entry in entries {
        groups.entry(entry.category().to_string()).or_default().push(entry);
    }
    for items in groups.values_mut() {
        // Stable, so entries with equal order keep manifest order
        items.sort_by(|a, b| a.order.total_cmp(&b.order));
    }
    groups
}
