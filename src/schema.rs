use serde::Deserialize;

/// One logical attribute of a project record. The delimited input carries
/// these positionally; the schema says which column holds which field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Field {
    Timestamp,
    Title,
    Abstract,
    Status,
    SubmissionDate,
    TargetJournal,
    Priority,
    Deadline,
    IrbStatus,
    Funding,
    DocsLink,
    Coauthors,
    Collaborator,
    Keywords,
    Notes,
    LastActivity,
}

/// Ordered column-to-field mapping for one deployment. The three deployments
/// we ingest from use different column counts, so the mapping is data, not
/// code: pick a named variant or list the columns explicitly in config.
#[derive(Debug, Clone)]
pub struct ColumnSchema {
    name: String,
    columns: Vec<Field>,
    title_index: usize,
}

impl ColumnSchema {
    pub fn new(name: &str, columns: Vec<Field>) -> anyhow::Result<Self> {
        let title_index = columns
            .iter()
            .position(|f| *f == Field::Title)
            .ok_or_else(|| anyhow::anyhow!("schema '{}' has no title column", name))?;
        Ok(Self {
            name: name.to_string(),
            columns,
            title_index,
        })
    }

    /// The 14-column layout the intake form produces.
    pub fn standard() -> Self {
        Self::new(
            "standard",
            vec![
                Field::Timestamp,
                Field::Title,
                Field::Abstract,
                Field::Status,
                Field::SubmissionDate,
                Field::TargetJournal,
                Field::Priority,
                Field::Deadline,
                Field::IrbStatus,
                Field::Funding,
                Field::DocsLink,
                Field::Coauthors,
                Field::Keywords,
                Field::LastActivity,
            ],
        )
        .expect("standard schema has a title column")
    }

    /// Standard plus a collaborator column after coauthors (15 columns).
    pub fn collaborator() -> Self {
        let mut columns = Self::standard().columns;
        columns.insert(12, Field::Collaborator);
        Self::new("collaborator", columns).expect("collaborator schema has a title column")
    }

    /// Collaborator variant plus a trailing free-text notes column.
    pub fn notes() -> Self {
        let mut columns = Self::collaborator().columns;
        columns.push(Field::Notes);
        Self::new("notes", columns).expect("notes schema has a title column")
    }

    pub fn by_name(name: &str) -> Option<Self> {
        match name {
            "standard" => Some(Self::standard()),
            "collaborator" => Some(Self::collaborator()),
            "notes" => Some(Self::notes()),
            _ => None,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn columns(&self) -> &[Field] {
        &self.columns
    }

    /// Column index the row-acceptance rule checks for a non-empty value.
    pub fn title_index(&self) -> usize {
        self.title_index
    }

    pub fn width(&self) -> usize {
        self.columns.len()
    }
}
