use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

/// One project entry. All attributes are plain strings as they arrive from
/// the sheet; classification happens on demand, never at parse time.
/// Serialized as camelCase to match the accepted JSON document shape.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Project {
    pub timestamp: String,
    pub title: String,
    pub r#abstract: String,
    pub status: String,
    pub submission_date: String,
    pub target_journal: String,
    pub priority: String,
    pub deadline: String,
    pub irb_status: String,
    pub funding: String,
    pub docs_link: String,
    pub coauthors: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub collaborator: String,
    pub keywords: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub notes: String,
    pub last_activity: String,
}

/// Sort rank for the priority labels. Lower sorts first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Priority {
    High,
    Medium,
    Low,
    Unset,
}

impl Priority {
    pub fn parse(label: &str) -> Self {
        match label.trim().to_lowercase().as_str() {
            "high" => Priority::High,
            "medium" => Priority::Medium,
            "low" => Priority::Low,
            _ => Priority::Unset,
        }
    }

    pub fn rank(self) -> u8 {
        match self {
            Priority::High => 0,
            Priority::Medium => 1,
            Priority::Low => 2,
            Priority::Unset => 3,
        }
    }
}

/// IRB state classified by substring, since the column is free text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IrbClass {
    Approved,
    Pending,
    NotNeeded,
    Other,
}

impl IrbClass {
    pub fn classify(raw: &str) -> Self {
        let s = raw.trim().to_lowercase();
        if s.contains("approved") {
            IrbClass::Approved
        } else if s.contains("pending") {
            IrbClass::Pending
        } else if s.contains("not needed") || s == "n/a" || s == "na" {
            IrbClass::NotNeeded
        } else {
            IrbClass::Other
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            IrbClass::Approved => "Approved",
            IrbClass::Pending => "Pending",
            IrbClass::NotNeeded => "Not needed",
            IrbClass::Other => "Other",
        }
    }
}

/// The status labels the intake form offers. The set is open: records may
/// carry labels outside this list and they are kept verbatim.
pub const KNOWN_STATUSES: &[&str] = &[
    "Idea",
    "Research Design",
    "Data Collected",
    "Data Analyzed",
    "Writing",
    "Submitted",
];

/// Parse one of the date formats the intake data actually contains.
/// RFC3339, bare dates, and the US locale form the sheet exports.
pub fn parse_date(raw: &str) -> Option<NaiveDateTime> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }
    if let Ok(dt) = chrono::DateTime::parse_from_rfc3339(raw) {
        return Some(dt.naive_utc());
    }
    for fmt in ["%Y-%m-%d %H:%M:%S", "%m/%d/%Y %H:%M:%S"] {
        if let Ok(dt) = NaiveDateTime::parse_from_str(raw, fmt) {
            return Some(dt);
        }
    }
    for fmt in ["%Y-%m-%d", "%m/%d/%Y"] {
        if let Ok(d) = chrono::NaiveDate::parse_from_str(raw, fmt) {
            return Some(d.and_hms_opt(0, 0, 0).unwrap());
        }
    }
    None
}

impl Project {
    pub fn priority_rank(&self) -> u8 {
        Priority::parse(&self.priority).rank()
    }

    pub fn irb_class(&self) -> IrbClass {
        IrbClass::classify(&self.irb_status)
    }

    /// Most recent of last_activity and timestamp. Unparsable dates resolve
    /// to None and sort as oldest.
    pub fn recency(&self) -> Option<NaiveDateTime> {
        match (parse_date(&self.last_activity), parse_date(&self.timestamp)) {
            (Some(a), Some(b)) => Some(a.max(b)),
            (Some(a), None) => Some(a),
            (None, Some(b)) => Some(b),
            (None, None) => None,
        }
    }

    /// Comma-separated keyword column split into trimmed, non-empty tags.
    pub fn keyword_tags(&self) -> Vec<&str> {
        self.keywords
            .split(',')
            .map(str::trim)
            .filter(|k| !k.is_empty())
            .collect()
    }
}
