use crate::record::Project;
use crate::schema::{ColumnSchema, Field};

/// Split one line into fields. Two states: inside or outside quotes. A
/// doubled quote while quoted emits a literal quote. Commas only delimit
/// while unquoted. Trim runs over the fully accumulated field, after
/// dequoting, so edge whitespace is stripped whether or not it sat inside
/// quotes. That matches the upstream sheet export consumers; do not make it
/// quote-aware.
pub fn parse_row(line: &str) -> Vec<String> {
    let mut fields = Vec::new();
    let mut current = String::new();
    let mut in_quotes = false;

    let mut chars = line.chars().peekable();
    while let Some(ch) = chars.next() {
        match ch {
            '"' => {
                if in_quotes && chars.peek() == Some(&'"') {
                    current.push('"');
                    chars.next();
                } else {
                    in_quotes = !in_quotes;
                }
            }
            ',' if !in_quotes => {
                fields.push(current.trim().to_string());
                current.clear();
            }
            _ => current.push(ch),
        }
    }
    fields.push(current.trim().to_string());
    fields
}

/// Parse a whole delimited document into project records.
///
/// Lines split on bare `\n`; embedded newlines inside quoted fields are not
/// supported and will split the record. The header line is discarded. A row
/// is kept only when it has more than one field and a non-empty value at the
/// schema's title position; everything else is dropped without complaint.
/// Rows shorter than the schema leave the unmapped attributes empty. Never
/// fails; worst case is an empty vector.
pub fn parse_delimited(text: &str, schema: &ColumnSchema) -> Vec<Project> {
    let mut projects = Vec::new();

    for line in text.split('\n').skip(1) {
        let row = parse_row(line);
        if row.len() <= 1 {
            continue;
        }
        let title_ok = row
            .get(schema.title_index())
            .is_some_and(|t| !t.is_empty());
        if !title_ok {
            continue;
        }
        projects.push(project_from_row(&row, schema));
    }

    projects
}

fn project_from_row(row: &[String], schema: &ColumnSchema) -> Project {
    let mut project = Project::default();
    for (i, field) in schema.columns().iter().enumerate() {
        let value = row.get(i).map(String::as_str).unwrap_or("");
        let slot = match field {
            Field::Timestamp => &mut project.timestamp,
            Field::Title => &mut project.title,
            Field::Abstract => &mut project.r#abstract,
            Field::Status => &mut project.status,
            Field::SubmissionDate => &mut project.submission_date,
            Field::TargetJournal => &mut project.target_journal,
            Field::Priority => &mut project.priority,
            Field::Deadline => &mut project.deadline,
            Field::IrbStatus => &mut project.irb_status,
            Field::Funding => &mut project.funding,
            Field::DocsLink => &mut project.docs_link,
            Field::Coauthors => &mut project.coauthors,
            Field::Collaborator => &mut project.collaborator,
            Field::Keywords => &mut project.keywords,
            Field::Notes => &mut project.notes,
            Field::LastActivity => &mut project.last_activity,
        };
        value.clone_into(slot);
    }
    project
}

#[cfg(test)]
mod tests {
    use super::*;

    const HEADER: &str = "Timestamp,Title,Abstract,Status,Submission,Journal,Priority,Deadline,IRB,Funding,Docs,Coauthors,Keywords,LastActivity";

    fn parse_one(line: &str) -> Vec<Project> {
        parse_delimited(&format!("{HEADER}\n{line}"), &ColumnSchema::standard())
    }

    #[test]
    fn test_quoted_comma_stays_in_field() {
        assert_eq!(parse_row(r#""a,b",c"#), vec!["a,b", "c"]);
    }

    #[test]
    fn test_doubled_quote_is_literal() {
        assert_eq!(parse_row(r#""say ""hi""",x"#), vec![r#"say "hi""#, "x"]);
    }

    #[test]
    fn test_unquoted_whitespace_trimmed() {
        assert_eq!(parse_row("  a  , b ,c"), vec!["a", "b", "c"]);
    }

    #[test]
    fn test_quoted_edge_whitespace_also_trimmed() {
        // Trim runs on the accumulated field after dequoting. Interior
        // whitespace survives, quoted edge whitespace does not.
        assert_eq!(parse_row(r#"" padded ",x"#), vec!["padded", "x"]);
        assert_eq!(parse_row(r#""a  b",x"#), vec!["a  b", "x"]);
    }

    #[test]
    fn test_empty_line_yields_single_empty_field() {
        assert_eq!(parse_row(""), vec![""]);
    }

    #[test]
    fn test_header_discarded() {
        let projects = parse_delimited(HEADER, &ColumnSchema::standard());
        assert!(projects.is_empty());
    }

    #[test]
    fn test_row_maps_positionally() {
        let projects = parse_one(
            "1/2/2024 09:00:00,Turnout Study,Door knocking,Writing,,APSR,High,2024-06-01,Approved,NSF,https://docs.example/t,Smith; Lee,turnout,2024-03-01",
        );
        assert_eq!(projects.len(), 1);
        let p = &projects[0];
        assert_eq!(p.title, "Turnout Study");
        assert_eq!(p.status, "Writing");
        assert_eq!(p.priority, "High");
        assert_eq!(p.target_journal, "APSR");
        assert_eq!(p.keywords, "turnout");
        assert_eq!(p.last_activity, "2024-03-01");
    }

    #[test]
    fn test_empty_title_row_dropped() {
        let projects = parse_one("1/2/2024,,An abstract,Idea,,,High");
        assert!(projects.is_empty());
    }

    #[test]
    fn test_single_field_row_dropped() {
        let projects = parse_one("just one cell");
        assert!(projects.is_empty());
    }

    #[test]
    fn test_short_row_pads_empty_fields() {
        let projects = parse_one("1/2/2024,Short Row Study,Only three fields");
        assert_eq!(projects.len(), 1);
        let p = &projects[0];
        assert_eq!(p.title, "Short Row Study");
        assert_eq!(p.status, "");
        assert_eq!(p.last_activity, "");
    }

    #[test]
    fn test_extra_columns_ignored() {
        let projects = parse_one("t,Wide Row,a,Idea,,,,,,,,,,act,overflow,more");
        assert_eq!(projects.len(), 1);
        assert_eq!(projects[0].last_activity, "act");
    }

    #[test]
    fn test_collaborator_schema_maps_extra_column() {
        let header = "ts,title,abs,status,sub,journal,prio,dl,irb,fund,docs,coauth,collab,kw,act";
        let text = format!("{header}\nt,Collab Study,a,Idea,,,,,,,,Smith,Jones Lab,tags,2024-01-01");
        let projects = parse_delimited(&text, &ColumnSchema::collaborator());
        assert_eq!(projects.len(), 1);
        assert_eq!(projects[0].collaborator, "Jones Lab");
        assert_eq!(projects[0].keywords, "tags");
    }

    #[test]
    fn test_never_errors_on_garbage() {
        let projects = parse_delimited("\"\"\"unbalanced,,,\n\",\n,,\n", &ColumnSchema::standard());
        assert!(projects.iter().all(|p| !p.title.is_empty()));
    }
}
