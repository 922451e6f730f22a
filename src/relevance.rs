// src/relevance.rs
//! Relevance matcher: does a listing's precomputed `profile_hits` overlap the
//! user's profile keywords?
//!
//! `profile_hits` is authoritative. The matcher never re-derives hits from the
//! listing's title or summaries.

use serde::Serialize;

use crate::listing::Listing;
use crate::profile::Profile;

/// Hit tags shown per card.
pub const MAX_HIT_TAGS: usize = 6;

/// Result of matching one listing against the profile.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ProfileMatch {
    pub is_relevant: bool,
    /// Case-folded hit tokens, at most [`MAX_HIT_TAGS`].
    pub hit_keywords: Vec<String>,
    /// Token count before truncation.
    pub total_hits: usize,
}

/// Split a comma-delimited hit string into trimmed, lowercased, non-empty tokens.
pub fn parse_profile_hits(raw: Option<&str>) -> Vec<String> {
    raw.unwrap_or_default()
        .to_lowercase()
        .split(',')
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .map(str::to_string)
        .collect()
}

/// Relevant iff some profile keyword (case-folded) is a substring of some hit
/// token. Blank keywords never match.
pub fn match_profile(listing: &Listing, profile: &Profile) -> ProfileMatch {
    let hits = parse_profile_hits(listing.profile_hits.as_deref());
    if hits.is_empty() {
        return ProfileMatch::default();
    }

    let is_relevant = profile
        .iter()
        .map(|k| k.trim().to_lowercase())
        .filter(|k| !k.is_empty())
        .any(|k| hits.iter().any(|h| h.contains(&k)));

    let total_hits = hits.len();
    let mut hit_keywords = hits;
    hit_keywords.truncate(MAX_HIT_TAGS);

    ProfileMatch {
        is_relevant,
        hit_keywords,
        total_hits,
    }
}

/// Pair every listing with its match, preserving input order.
pub fn annotate<'a, I>(listings: I, profile: &Profile) -> Vec<(&'a Listing, ProfileMatch)>
where
    I: IntoIterator<Item = &'a Listing>,
{
    listings
        .into_iter()
        .map(|l| (l, match_profile(l, profile)))
        .collect()
}
