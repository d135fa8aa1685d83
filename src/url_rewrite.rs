/*!
 * Rewriting `detailUrl` fields of the JSON help manifest so that they point at
 * the published translated pages.
 */

use anyhow::{Context, Result};
use log::{debug, info};
use serde_json::Value;
use std::path::{Path, PathBuf};

use crate::file_utils::FileManager;

/// One rewritten record
#[derive(Debug, Clone, PartialEq)]
pub struct UrlChange {
    pub id: String,
    pub old_url: String,
    pub new_url: String,
}

/// Result of rewriting a manifest file
#[derive(Debug, Clone)]
pub struct RewriteOutcome {
    pub changes: Vec<UrlChange>,
    pub output_path: PathBuf,
}

/// Render the template for one id
pub fn render_url(template: &str, id: &str) -> String {
    template.replace("{id}", id)
}

/// Rewrite `detailUrl` of every record in the top-level `data` array that has
/// both an `id` and a `detailUrl`. Other records and all other keys are left as is.
pub fn rewrite_detail_urls(document: &mut Value, template: &str) -> Vec<UrlChange> {
    let Some(records) = document.get_mut("data").and_then(Value::as_array_mut) else {
        debug!("No data array in manifest, nothing to rewrite");
        return Vec::new();
    };

    let mut changes = Vec::new();
    for record in records.iter_mut().filter_map(Value::as_object_mut) {
        if !record.contains_key("detailUrl") {
            continue;
        }
        let id = match record.get("id") {
            Some(Value::String(id)) => id.clone(),
            Some(Value::Number(id)) => id.to_string(),
            _ => continue,
        };

        let new_url = render_url(template, &id);
        let old_url = match record.insert("detailUrl".to_string(), Value::String(new_url.clone())) {
            Some(Value::String(url)) => url,
            Some(other) => other.to_string(),
            None => String::new(),
        };

        changes.push(UrlChange { id, old_url, new_url });
    }

    changes
}

/// Rewrite a manifest file in place, or into `output` when given
pub fn rewrite_file<P: AsRef<Path>>(input: P, output: Option<&Path>, template: &str) -> Result<RewriteOutcome> {
    let input = input.as_ref();
    let content = FileManager::read_to_string(input)?;
    let mut document: Value = serde_json::from_str(&content)
        .with_context(|| format!("{} is not valid JSON", input.display()))?;

    let changes = rewrite_detail_urls(&mut document, template);
    for change in &changes {
        debug!("Updated {}: {} -> {}", change.id, change.old_url, change.new_url);
    }

    let output_path = output.map(Path::to_path_buf).unwrap_or_else(|| input.to_path_buf());
    let serialized = serde_json::to_string_pretty(&document)
        .context("Failed to serialize manifest")?;
    FileManager::write_to_file(&output_path, &serialized)?;

    info!("Updated {} URLs, saved to {}", changes.len(), output_path.display());

    Ok(RewriteOutcome { changes, output_path })
}
