use crate::filter::{apply_filters, sort_projects, FilterSet};
use crate::record::{IrbClass, Project};
use std::time::{Duration, Instant};

/// Filter and input state owned by the presentation layer. Kept out of the
/// engine's watch state so the pipeline stays testable against fixed inputs.
pub struct UiState {
    pub filters: FilterSet,
    pub search_input: String,
    pub search_focus: bool,
    /// Set on every search keystroke; the filter pass runs only after the
    /// quiescence delay elapses with no further keys.
    pub search_dirty_since: Option<Instant>,
    pub debounce: Duration,
    pub selected: usize,
    /// Distinct status/collaborator values from the loaded data; the label
    /// sets are open so the cycling options come from the records.
    pub status_options: Vec<String>,
    pub collaborator_options: Vec<String>,
}

const PRIORITY_OPTIONS: &[&str] = &["High", "Medium", "Low"];
const IRB_OPTIONS: &[IrbClass] = &[
    IrbClass::Approved,
    IrbClass::Pending,
    IrbClass::NotNeeded,
    IrbClass::Other,
];

impl UiState {
    pub fn new(debounce: Duration) -> Self {
        Self {
            filters: FilterSet::default(),
            search_input: String::new(),
            search_focus: false,
            search_dirty_since: None,
            debounce,
            selected: 0,
            status_options: Vec::new(),
            collaborator_options: Vec::new(),
        }
    }

    pub fn note_search_keystroke(&mut self, now: Instant) {
        self.search_dirty_since = Some(now);
    }

    /// Commit the pending search text into the filter set once the input has
    /// been quiet for the debounce interval. Returns true when a filter pass
    /// is due.
    pub fn commit_search_if_quiet(&mut self, now: Instant) -> bool {
        match self.search_dirty_since {
            Some(since) if now.duration_since(since) >= self.debounce => {
                self.search_dirty_since = None;
                self.filters.search = self.search_input.clone();
                true
            }
            _ => false,
        }
    }

    /// Filter then sort. The record list is immutable input; this derives
    /// the view subset.
    pub fn refilter(&mut self, projects: &[Project]) -> Vec<Project> {
        let mut filtered = apply_filters(projects, &self.filters);
        sort_projects(&mut filtered);
        if self.selected >= filtered.len() {
            self.selected = filtered.len().saturating_sub(1);
        }
        filtered
    }

    pub fn cycle_status(&mut self) {
        self.filters.status = cycle(self.filters.status.take(), &self.status_options);
    }

    pub fn cycle_priority(&mut self) {
        let options: Vec<String> = PRIORITY_OPTIONS.iter().map(|s| s.to_string()).collect();
        self.filters.priority = cycle(self.filters.priority.take(), &options);
    }

    pub fn cycle_irb(&mut self) {
        self.filters.irb = match self.filters.irb {
            None => IRB_OPTIONS.first().copied(),
            Some(current) => {
                let idx = IRB_OPTIONS.iter().position(|c| *c == current);
                idx.and_then(|i| IRB_OPTIONS.get(i + 1)).copied()
            }
        };
    }

    pub fn cycle_collaborator(&mut self) {
        self.filters.collaborator =
            cycle(self.filters.collaborator.take(), &self.collaborator_options);
    }

    /// Reset every control and the search box in one action.
    pub fn clear_filters(&mut self) {
        self.filters.clear();
        self.search_input.clear();
        self.search_dirty_since = None;
    }

    pub fn select_next(&mut self, len: usize) {
        if len > 0 && self.selected + 1 < len {
            self.selected += 1;
        }
    }

    pub fn select_prev(&mut self) {
        self.selected = self.selected.saturating_sub(1);
    }
}

/// None -> first option -> ... -> last option -> None.
fn cycle(current: Option<String>, options: &[String]) -> Option<String> {
    if options.is_empty() {
        return None;
    }
    match current {
        None => Some(options[0].clone()),
        Some(value) => {
            let idx = options.iter().position(|o| *o == value);
            idx.and_then(|i| options.get(i + 1)).cloned()
        }
    }
}
