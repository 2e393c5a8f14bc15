//! Exported-fields table rendering.
//!
//! Reads every `*.yml` file under `data_stream/<name>/fields/` and renders a
//! Markdown table of leaf fields, with nested groups flattened to dotted names.

use std::path::Path;

use serde::Deserialize;
use tracing::debug;

use pkgbuild_shared::{PkgBuildError, Result};

/// One entry of a fields definition file.
#[derive(Debug, Clone, Deserialize)]
struct FieldDefinition {
    name: String,
    #[serde(default, rename = "type")]
    field_type: Option<String>,
    #[serde(default)]
    description: Option<String>,
    #[serde(default)]
    fields: Vec<FieldDefinition>,
}

/// A flattened, renderable row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct FieldRow {
    pub name: String,
    pub description: String,
    pub field_type: String,
}

/// Render the exported-fields table for the data stream at `data_stream_dir`.
pub(crate) fn render_fields_table(data_stream_dir: &Path) -> Result<String> {
    let rows = load_field_rows(&data_stream_dir.join("fields"))?;

    let mut out = String::from("**Exported fields**\n\n");
    out.push_str("| Field | Description | Type |\n");
    out.push_str("|---|---|---|\n");
    for row in &rows {
        out.push_str(&format!(
            "| {} | {} | {} |\n",
            row.name,
            escape_cell(&row.description),
            row.field_type
        ));
    }
    Ok(out)
}

/// Load and flatten every field definition file in `fields_dir`, sorted by name.
pub(crate) fn load_field_rows(fields_dir: &Path) -> Result<Vec<FieldRow>> {
    let entries =
        std::fs::read_dir(fields_dir).map_err(|e| PkgBuildError::io(fields_dir, e))?;

    let mut rows = Vec::new();
    for entry in entries {
        let entry = entry.map_err(|e| PkgBuildError::io(fields_dir, e))?;
        let path = entry.path();
        let is_yaml = path
            .extension()
            .is_some_and(|ext| ext == "yml" || ext == "yaml");
        if !path.is_file() || !is_yaml {
            continue;
        }

        let content = std::fs::read_to_string(&path).map_err(|e| PkgBuildError::io(&path, e))?;
        let defs: Vec<FieldDefinition> = serde_yaml::from_str(&content).map_err(|e| {
            PkgBuildError::template(
                path.display().to_string(),
                format!("invalid fields definition: {e}"),
            )
        })?;
        debug!(path = %path.display(), count = defs.len(), "loaded field definitions");

        flatten_into(&defs, "", &mut rows);
    }

    rows.sort_by(|a, b| a.name.cmp(&b.name));
    Ok(rows)
}

fn flatten_into(defs: &[FieldDefinition], prefix: &str, rows: &mut Vec<FieldRow>) {
    for def in defs {
        let name = if prefix.is_empty() {
            def.name.clone()
        } else {
            format!("{prefix}.{}", def.name)
        };

        if !def.fields.is_empty() {
            flatten_into(&def.fields, &name, rows);
            continue;
        }
        // Empty groups carry no data.
        if def.field_type.as_deref() == Some("group") {
            continue;
        }

        rows.push(FieldRow {
            name,
            description: def
                .description
                .as_deref()
                .unwrap_or_default()
                .split_whitespace()
                .collect::<Vec<_>>()
                .join(" "),
            field_type: def.field_type.clone().unwrap_or_default(),
        });
    }
}

fn escape_cell(text: &str) -> String {
    text.replace('|', "\\|")
}
