//! Named-field templates
//!
//! Templates reference fields as `{{.Name}}`. Filling fails when a referenced
//! field has no value, naming every missing field at once.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::LazyLock;

use regex::Regex;
use thiserror::Error;

/// Values available to a template, keyed by field name
pub type TemplateData = BTreeMap<String, String>;

static FIELD_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\{\{\s*\.([A-Za-z_][A-Za-z0-9_]*)\s*\}\}").unwrap());

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TemplateError {
    #[error("template {template:?}: required data for {} not populated: {}", plural(fields.len()), quoted(fields))]
    MissingFields {
        template: String,
        fields: Vec<String>,
    },
}

/// Returns the sorted, de-duplicated field names referenced by a template
pub fn template_fields(template: &str) -> Vec<String> {
    FIELD_RE
        .captures_iter(template)
        .map(|caps| caps[1].to_string())
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

/// Substitute every `{{.Field}}` in `template` with its value from `data`
pub fn fill_template(
    template_name: &str,
    template: &str,
    data: &TemplateData,
) -> Result<String, TemplateError> {
    let missing: Vec<String> = template_fields(template)
        .into_iter()
        .filter(|field| !data.contains_key(field))
        .collect();

    if !missing.is_empty() {
        return Err(TemplateError::MissingFields {
            template: template_name.to_string(),
            fields: missing,
        });
    }

    Ok(FIELD_RE
        .replace_all(template, |caps: &regex::Captures| data[&caps[1]].clone())
        .into_owned())
}

/// Combine two data maps, `extra` winning on conflicts
///
/// Returns the merged map and the keys of `base` that were overwritten, so the
/// caller decides whether a shadowed key matters.
pub fn merge_data(base: &TemplateData, extra: &TemplateData) -> (TemplateData, Vec<String>) {
    let mut merged = base.clone();
    let mut shadowed = Vec::new();
    for (key, value) in extra {
        if merged.insert(key.clone(), value.clone()).is_some() {
            shadowed.push(key.clone());
        }
    }
    (merged, shadowed)
}

fn plural(count: usize) -> String {
    if count == 1 {
        "field".to_string()
    } else {
        format!("{count} fields")
    }
}

fn quoted(fields: &[String]) -> String {
    fields
        .iter()
        .map(|f| format!("{f:?}"))
        .collect::<Vec<_>>()
        .join(", ")
}
