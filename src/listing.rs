// src/listing.rs
//! Canonical listing and snapshot records.
//!
//! Everything here is produced once by `snapshot::normalize_document` and is
//! read-only afterwards: every field is already resolved to its default, so
//! read sites never need fallback checks.

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::BTreeMap;

pub const DEFAULT_ORGANIZATION: &str = "Unknown University";
pub const DEFAULT_LINK: &str = "#";
pub const DEFAULT_FUNDING: &str = "TBD";
pub const DEFAULT_DEADLINE: &str = "Rolling";
pub const DEFAULT_SOURCE: &str = "source";

/// Substrings that mark a funding text as funded (matched case-insensitively).
pub const FUNDING_MARKERS: [&str; 5] = ["funded", "studentship", "stipend", "scholarship", "full"];

/// True if `funding` mentions any of [`FUNDING_MARKERS`].
pub fn is_funded(funding: &str) -> bool {
    let f = funding.to_lowercase();
    FUNDING_MARKERS.iter().any(|m| f.contains(m))
}

/// One opportunity record after normalization.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Listing {
    pub id: String,
    pub title: String,
    pub organization: String,
    pub link: String,
    pub funding: String,
    pub deadline: String,
    pub source: String,
    pub is_social: bool,
    pub score: f64,
    pub is_new: bool,
    pub ai_summary: Option<String>,
    pub rule_summary: Option<String>,
    pub papers: Vec<String>,
    pub profile_hits: Option<String>,
    pub supervisor: String,
    pub location: String,
    pub keywords: Vec<String>,
    pub collab: Vec<String>,
}

impl Listing {
    /// Listing with every field at its default; `id` is required because the
    /// positional fallback is only known to the loader.
    pub fn with_defaults(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            title: String::new(),
            organization: DEFAULT_ORGANIZATION.to_string(),
            link: DEFAULT_LINK.to_string(),
            funding: DEFAULT_FUNDING.to_string(),
            deadline: DEFAULT_DEADLINE.to_string(),
            source: DEFAULT_SOURCE.to_string(),
            is_social: false,
            score: 0.0,
            is_new: false,
            ai_summary: None,
            rule_summary: None,
            papers: Vec::new(),
            profile_hits: None,
            supervisor: String::new(),
            location: String::new(),
            keywords: Vec::new(),
            collab: Vec::new(),
        }
    }

    /// AI summary wins over the rule-based one.
    pub fn display_summary(&self) -> Option<&str> {
        self.ai_summary
            .as_deref()
            .or(self.rule_summary.as_deref())
    }

    pub fn has_link(&self) -> bool {
        self.link != DEFAULT_LINK
    }

    pub fn is_funded(&self) -> bool {
        is_funded(&self.funding)
    }
}

/// (source name, item count) pair as shown in the snapshot header.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SourceCount {
    pub source: String,
    pub count: u64,
}

/// Immutable batch of listings fetched once per session.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Snapshot {
    pub items: Vec<Listing>,
    pub generated_at: Option<String>,
    pub by_source: BTreeMap<String, u64>,
    pub total_items: usize,
    /// The generator's "top 10 new or updated" shortlist.
    pub top_new: Vec<Listing>,
    pub csv_block: Option<String>,
}

impl Snapshot {
    /// `{items: [], by_source: {}, total_items: 0}`, the render-safe fallback.
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn generated_at_utc(&self) -> Option<DateTime<Utc>> {
        let raw = self.generated_at.as_deref()?;
        DateTime::parse_from_rfc3339(raw.trim())
            .ok()
            .map(|dt| dt.with_timezone(&Utc))
    }

    /// Per-source counts, largest first; ties ordered by name.
    pub fn source_breakdown(&self) -> Vec<SourceCount> {
        let mut out: Vec<SourceCount> = self
            .by_source
            .iter()
            .map(|(source, &count)| SourceCount {
                source: source.clone(),
                count,
            })
            .collect();
        out.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.source.cmp(&b.source)));
        out
    }

    pub fn new_count(&self) -> usize {
        self.items.iter().filter(|l| l.is_new).count()
    }
}
