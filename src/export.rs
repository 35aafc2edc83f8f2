use crate::parse::parse_delimited;
use crate::record::Project;
use crate::schema::ColumnSchema;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Document written by the offline build step and accepted by the JSON
/// source. Re-parsing `projects` must reproduce the exact sequence parsing
/// the delimited file would yield.
#[derive(Debug, Serialize, Deserialize)]
pub struct ExportDocument {
    pub updated: String,
    pub count: usize,
    pub projects: Vec<Project>,
}

/// Pre-convert the local delimited file into the JSON document shape, so
/// deployments can serve a pre-validated static artifact instead of parsing
/// text at load time. Same parsing rules as the live path, same schema.
pub fn build_data(csv_path: &Path, json_path: &Path, schema: &ColumnSchema) -> Result<usize> {
    let raw = std::fs::read_to_string(csv_path)
        .with_context(|| format!("failed to read {}", csv_path.display()))?;
    let projects = parse_delimited(&raw, schema);

    let doc = ExportDocument {
        updated: chrono::Utc::now().to_rfc3339(),
        count: projects.len(),
        projects,
    };
    let json = serde_json::to_string_pretty(&doc).context("failed to serialize export")?;
    std::fs::write(json_path, json)
        .with_context(|| format!("failed to write {}", json_path.display()))?;

    tracing::debug!(count = doc.count, path = %json_path.display(), "wrote export");
    Ok(doc.count)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_build_data_writes_document() {
        let mut csv = tempfile::NamedTempFile::new().unwrap();
        writeln!(csv, "header").unwrap();
        writeln!(csv, "2024-01-01,Study A,abs,Idea").unwrap();
        writeln!(csv, "2024-01-02,,missing title").unwrap();
        let out = tempfile::NamedTempFile::new().unwrap();

        let count = build_data(csv.path(), out.path(), &ColumnSchema::standard()).unwrap();
        assert_eq!(count, 1);

        let doc: ExportDocument =
            serde_json::from_str(&std::fs::read_to_string(out.path()).unwrap()).unwrap();
        assert_eq!(doc.count, 1);
        assert_eq!(doc.projects[0].title, "Study A");
        assert!(!doc.updated.is_empty());
    }

    #[test]
    fn test_missing_input_is_an_error() {
        let out = tempfile::NamedTempFile::new().unwrap();
        let err = build_data(
            Path::new("definitely/not/here.csv"),
            out.path(),
            &ColumnSchema::standard(),
        )
        .unwrap_err();
        assert!(format!("{:#}", err).contains("failed to read"));
    }
}
