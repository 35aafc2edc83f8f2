pub mod transport;

use crate::parse::parse_delimited;
use crate::record::Project;
use crate::schema::ColumnSchema;
use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::PathBuf;
use transport::Transport;

/// Which source satisfied a resolution. Display-only.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceTag {
    Embedded,
    Json,
    Sheet,
    Local,
}

impl SourceTag {
    pub fn label(self) -> &'static str {
        match self {
            SourceTag::Embedded => "embedded",
            SourceTag::Json => "json",
            SourceTag::Sheet => "sheets",
            SourceTag::Local => "local",
        }
    }
}

/// One candidate in the fallback chain, in the order they should be tried:
/// an in-process payload needs no I/O at all, the committed JSON document is
/// the pre-validated artifact, the published sheet export is freshest, and
/// the local delimited file is the offline-safe last resort.
#[derive(Debug, Clone)]
pub enum SourceSpec {
    Embedded(Vec<Project>),
    JsonDocument { url: String },
    PublishedSheet { url: String },
    LocalFile { path: PathBuf },
}

impl SourceSpec {
    pub fn tag(&self) -> SourceTag {
        match self {
            SourceSpec::Embedded(_) => SourceTag::Embedded,
            SourceSpec::JsonDocument { .. } => SourceTag::Json,
            SourceSpec::PublishedSheet { .. } => SourceTag::Sheet,
            SourceSpec::LocalFile { .. } => SourceTag::Local,
        }
    }
}

/// Auto walks the declared order and stops at the first success. Only(tag)
/// is the manual "refresh from source X" action and bypasses the chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SelectionMode {
    Auto,
    Only(SourceTag),
}

#[derive(Debug, Clone)]
pub struct Resolved {
    pub projects: Vec<Project>,
    pub tag: SourceTag,
}

/// Accepted JSON document shapes: `{ "projects": [...] }` or a bare array.
/// Anything else is a shape failure and falls through to the next source.
#[derive(Deserialize)]
#[serde(untagged)]
enum ProjectsDocument {
    Keyed { projects: Vec<Project> },
    Bare(Vec<Project>),
}

impl ProjectsDocument {
    fn into_projects(self) -> Vec<Project> {
        match self {
            ProjectsDocument::Keyed { projects } => projects,
            ProjectsDocument::Bare(projects) => projects,
        }
    }
}

/// Parse a compiled-in payload using the same accepted document shapes as
/// the JSON source. A payload that is not one of them counts as absent.
pub fn parse_embedded(raw: &str) -> Result<Vec<Project>> {
    let doc: ProjectsDocument =
        serde_json::from_str(raw).context("embedded payload is not a projects document")?;
    Ok(doc.into_projects())
}

/// Try the candidate sources strictly in order, one at a time, and return
/// the first that succeeds along with its tag. Each failure is logged and
/// the next candidate attempted; a source is never retried within one pass.
/// Fails only when every attempted candidate has failed, with the last
/// failure as the error.
pub async fn resolve_records(
    sources: &[SourceSpec],
    mode: SelectionMode,
    transport: &dyn Transport,
    schema: &ColumnSchema,
) -> Result<Resolved> {
    let mut last_err: Option<anyhow::Error> = None;
    let mut attempted = 0usize;

    for spec in sources {
        if let SelectionMode::Only(tag) = mode {
            if spec.tag() != tag {
                continue;
            }
        }
        attempted += 1;

        match attempt(spec, transport, schema).await {
            Ok(projects) => {
                tracing::debug!(source = spec.tag().label(), count = projects.len(), "source resolved");
                return Ok(Resolved {
                    projects,
                    tag: spec.tag(),
                });
            }
            Err(e) => {
                tracing::warn!(source = spec.tag().label(), "source failed: {:#}", e);
                last_err = Some(e);
            }
        }
    }

    match last_err {
        Some(e) => Err(e),
        None if attempted == 0 => {
            anyhow::bail!("no matching data source configured for {:?}", mode)
        }
        None => anyhow::bail!("no data sources configured"),
    }
}

async fn attempt(
    spec: &SourceSpec,
    transport: &dyn Transport,
    schema: &ColumnSchema,
) -> Result<Vec<Project>> {
    match spec {
        SourceSpec::Embedded(projects) => Ok(projects.clone()),
        SourceSpec::JsonDocument { url } => {
            let body = transport.fetch_text(url).await?;
            let doc: ProjectsDocument = serde_json::from_str(&body)
                .with_context(|| format!("unexpected JSON shape from {}", url))?;
            Ok(doc.into_projects())
        }
        SourceSpec::PublishedSheet { url } => {
            // Published exports are aggressively cached upstream; a per-request
            // query parameter keeps manual refreshes from being served stale.
            let busted = append_cache_buster(url, chrono::Utc::now().timestamp_millis());
            let body = transport.fetch_text(&busted).await?;
            Ok(parse_delimited(&body, schema))
        }
        SourceSpec::LocalFile { path } => {
            let body = tokio::fs::read_to_string(path)
                .await
                .with_context(|| format!("failed to read {}", path.display()))?;
            Ok(parse_delimited(&body, schema))
        }
    }
}

fn append_cache_buster(url: &str, stamp: i64) -> String {
    let sep = if url.contains('?') { '&' } else { '?' };
    format!("{}{}cachebust={}", url, sep, stamp)
}

#[cfg(test)]
mod tests {
    use super::transport::Transport;
    use super::*;
    use async_trait::async_trait;
    use std::io::Write;
    use std::sync::Mutex;

    /// Records every fetched URL; answers from a canned (prefix, result) list.
    struct StubTransport {
        responses: Vec<(&'static str, Result<String, &'static str>)>,
        calls: Mutex<Vec<String>>,
    }

    impl StubTransport {
        fn new(responses: Vec<(&'static str, Result<String, &'static str>)>) -> Self {
            Self {
                responses,
                calls: Mutex::new(Vec::new()),
            }
        }

        fn call_count(&self) -> usize {
            self.calls.lock().unwrap().len()
        }
    }

    #[async_trait]
    impl Transport for StubTransport {
        async fn fetch_text(&self, url: &str) -> Result<String> {
            self.calls.lock().unwrap().push(url.to_string());
            for (prefix, result) in &self.responses {
                if url.starts_with(prefix) {
                    return match result {
                        Ok(body) => Ok(body.clone()),
                        Err(msg) => Err(anyhow::anyhow!("{}", msg)),
                    };
                }
            }
            Err(anyhow::anyhow!("no stub for {}", url))
        }
    }

    fn sample_project(title: &str) -> Project {
        Project {
            title: title.to_string(),
            ..Default::default()
        }
    }

    const SHEET_CSV: &str = "Timestamp,Title,Abstract\n2024-01-01,From Sheet,abs\n";

    #[test]
    fn test_cache_buster_separator() {
        assert_eq!(append_cache_buster("https://e/x", 7), "https://e/x?cachebust=7");
        assert_eq!(append_cache_buster("https://e/x?a=1", 7), "https://e/x?a=1&cachebust=7");
    }

    #[tokio::test]
    async fn test_embedded_short_circuits_without_transport() {
        let transport = StubTransport::new(vec![]);
        let sources = vec![
            SourceSpec::Embedded(vec![sample_project("Resident")]),
            SourceSpec::JsonDocument { url: "https://e/data.json".to_string() },
        ];
        let resolved = resolve_records(&sources, SelectionMode::Auto, &transport, &ColumnSchema::standard())
            .await
            .unwrap();
        assert_eq!(resolved.tag, SourceTag::Embedded);
        assert_eq!(resolved.projects[0].title, "Resident");
        assert_eq!(transport.call_count(), 0);
    }

    #[tokio::test]
    async fn test_json_keyed_shape_accepted() {
        let transport = StubTransport::new(vec![(
            "https://e/data.json",
            Ok(r#"{"updated":"2024-01-01","count":1,"projects":[{"title":"Keyed"}]}"#.to_string()),
        )]);
        let sources = vec![SourceSpec::JsonDocument { url: "https://e/data.json".to_string() }];
        let resolved = resolve_records(&sources, SelectionMode::Auto, &transport, &ColumnSchema::standard())
            .await
            .unwrap();
        assert_eq!(resolved.tag, SourceTag::Json);
        assert_eq!(resolved.projects[0].title, "Keyed");
    }

    #[tokio::test]
    async fn test_json_bare_array_accepted() {
        let transport = StubTransport::new(vec![(
            "https://e/data.json",
            Ok(r#"[{"title":"Bare"}]"#.to_string()),
        )]);
        let sources = vec![SourceSpec::JsonDocument { url: "https://e/data.json".to_string() }];
        let resolved = resolve_records(&sources, SelectionMode::Auto, &transport, &ColumnSchema::standard())
            .await
            .unwrap();
        assert_eq!(resolved.projects[0].title, "Bare");
    }

    #[tokio::test]
    async fn test_shape_failure_falls_through_to_next_source() {
        let transport = StubTransport::new(vec![
            ("https://e/data.json", Ok(r#"{"rows": 3}"#.to_string())),
            ("https://e/sheet", Ok(SHEET_CSV.to_string())),
        ]);
        let sources = vec![
            SourceSpec::JsonDocument { url: "https://e/data.json".to_string() },
            SourceSpec::PublishedSheet { url: "https://e/sheet".to_string() },
        ];
        let resolved = resolve_records(&sources, SelectionMode::Auto, &transport, &ColumnSchema::standard())
            .await
            .unwrap();
        assert_eq!(resolved.tag, SourceTag::Sheet);
        assert_eq!(resolved.projects[0].title, "From Sheet");
    }

    #[tokio::test]
    async fn test_sheet_url_carries_cache_buster() {
        let transport = StubTransport::new(vec![("https://e/sheet", Ok(SHEET_CSV.to_string()))]);
        let sources = vec![SourceSpec::PublishedSheet { url: "https://e/sheet".to_string() }];
        resolve_records(&sources, SelectionMode::Auto, &transport, &ColumnSchema::standard())
            .await
            .unwrap();
        let calls = transport.calls.lock().unwrap();
        assert!(calls[0].contains("cachebust="), "got {}", calls[0]);
    }

    #[tokio::test]
    async fn test_only_mode_bypasses_chain() {
        let transport = StubTransport::new(vec![("https://e/sheet", Ok(SHEET_CSV.to_string()))]);
        let sources = vec![
            SourceSpec::Embedded(vec![sample_project("Resident")]),
            SourceSpec::JsonDocument { url: "https://e/data.json".to_string() },
            SourceSpec::PublishedSheet { url: "https://e/sheet".to_string() },
        ];
        let resolved = resolve_records(
            &sources,
            SelectionMode::Only(SourceTag::Sheet),
            &transport,
            &ColumnSchema::standard(),
        )
        .await
        .unwrap();
        assert_eq!(resolved.tag, SourceTag::Sheet);
        // Only the sheet was fetched; json was never attempted.
        assert_eq!(transport.call_count(), 1);
    }

    #[tokio::test]
    async fn test_only_mode_unconfigured_source_errors() {
        let transport = StubTransport::new(vec![]);
        let sources = vec![SourceSpec::Embedded(vec![])];
        let err = resolve_records(
            &sources,
            SelectionMode::Only(SourceTag::Json),
            &transport,
            &ColumnSchema::standard(),
        )
        .await
        .unwrap_err();
        assert!(err.to_string().contains("no matching data source"));
    }

    #[tokio::test]
    async fn test_all_sources_fail_reports_last_error() {
        let transport = StubTransport::new(vec![
            ("https://e/data.json", Err("HTTP 404")),
            ("https://e/sheet", Err("connection refused")),
        ]);
        let sources = vec![
            SourceSpec::JsonDocument { url: "https://e/data.json".to_string() },
            SourceSpec::PublishedSheet { url: "https://e/sheet".to_string() },
        ];
        let err = resolve_records(&sources, SelectionMode::Auto, &transport, &ColumnSchema::standard())
            .await
            .unwrap_err();
        assert!(err.to_string().contains("connection refused"));
        assert_eq!(transport.call_count(), 2);
    }

    #[tokio::test]
    async fn test_local_file_parsed_with_schema() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "{}", SHEET_CSV).unwrap();
        let transport = StubTransport::new(vec![]);
        let sources = vec![SourceSpec::LocalFile { path: file.path().to_path_buf() }];
        let resolved = resolve_records(&sources, SelectionMode::Auto, &transport, &ColumnSchema::standard())
            .await
            .unwrap();
        assert_eq!(resolved.tag, SourceTag::Local);
        assert_eq!(resolved.projects[0].title, "From Sheet");
    }
}
