use crate::record::{IrbClass, Project};
use chrono::NaiveDateTime;

/// Active filter controls. An empty/None control does not participate.
/// Owned by the presentation layer and passed in explicitly so the pipeline
/// is testable against fixed inputs.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FilterSet {
    pub search: String,
    pub status: Option<String>,
    pub priority: Option<String>,
    pub irb: Option<IrbClass>,
    pub collaborator: Option<String>,
}

impl FilterSet {
    pub fn clear(&mut self) {
        *self = FilterSet::default();
    }

    pub fn is_empty(&self) -> bool {
        *self == FilterSet::default()
    }

    fn matches(&self, project: &Project) -> bool {
        if !self.search.is_empty() {
            let needle = self.search.to_lowercase();
            let haystack = format!(
                "{} {} {} {} {}",
                project.title,
                project.r#abstract,
                project.keywords,
                project.coauthors,
                project.collaborator,
            )
            .to_lowercase();
            if !haystack.contains(&needle) {
                return false;
            }
        }
        if let Some(status) = &self.status {
            if project.status != *status {
                return false;
            }
        }
        if let Some(priority) = &self.priority {
            if project.priority != *priority {
                return false;
            }
        }
        if let Some(irb) = self.irb {
            if project.irb_class() != irb {
                return false;
            }
        }
        if let Some(collaborator) = &self.collaborator {
            if project.collaborator != *collaborator {
                return false;
            }
        }
        true
    }
}

/// Conjunction of the active predicates over the full record list.
pub fn apply_filters(projects: &[Project], filters: &FilterSet) -> Vec<Project> {
    projects
        .iter()
        .filter(|p| filters.matches(p))
        .cloned()
        .collect()
}

/// Priority rank ascending (High first), then recency descending. Records
/// with no parsable date carry a MIN sentinel and sort last within their
/// priority band; ties keep their input order (stable sort).
pub fn sort_projects(projects: &mut [Project]) {
    projects.sort_by(|a, b| {
        a.priority_rank().cmp(&b.priority_rank()).then_with(|| {
            let ra = a.recency().unwrap_or(NaiveDateTime::MIN);
            let rb = b.recency().unwrap_or(NaiveDateTime::MIN);
            rb.cmp(&ra)
        })
    });
}

/// Distinct status labels present in the data, in first-seen order. Drives
/// the status filter cycling since the label set is open.
pub fn distinct_statuses(projects: &[Project]) -> Vec<String> {
    let mut seen = Vec::new();
    for p in projects {
        if !p.status.is_empty() && !seen.contains(&p.status) {
            seen.push(p.status.clone());
        }
    }
    seen
}

/// Distinct collaborator values, for deployments whose schema carries one.
pub fn distinct_collaborators(projects: &[Project]) -> Vec<String> {
    let mut seen = Vec::new();
    for p in projects {
        if !p.collaborator.is_empty() && !seen.contains(&p.collaborator) {
            seen.push(p.collaborator.clone());
        }
    }
    seen
}
