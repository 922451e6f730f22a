// src/filter.rs
//! Filter engine: a pure function of (listings, parameters).
//!
//! Predicates run in a fixed order (source type, only-new, funding, minimum
//! score) but are independent, so the surviving set does not depend on the
//! order. Survivors keep their snapshot order; nothing is re-sorted.

use serde::{Deserialize, Deserializer};

use crate::listing::Listing;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum FundingFilter {
    #[default]
    Unspecified,
    Required,
    Excluded,
}

impl FundingFilter {
    /// Tolerant parse; unknown values mean "no constraint".
    pub fn parse(raw: &str) -> Self {
        match raw.trim().to_ascii_lowercase().as_str() {
            "1" | "required" | "funded" | "yes" | "true" => Self::Required,
            "0" | "excluded" | "unfunded" | "no" | "false" => Self::Excluded,
            _ => Self::Unspecified,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SourceType {
    #[default]
    All,
    Academic,
    Social,
}

impl SourceType {
    pub fn parse(raw: &str) -> Self {
        match raw.trim().to_ascii_lowercase().as_str() {
            "academic" => Self::Academic,
            "social" => Self::Social,
            _ => Self::All,
        }
    }
}

/// Leading integer of `raw` (`"12.7"` → 12, `"30abc"` → 30). Non-numeric or
/// negative input disables the floor.
pub fn parse_min_score(raw: &str) -> u32 {
    let s = raw.trim();
    let s = s.strip_prefix('+').unwrap_or(s);
    let digits: String = s.chars().take_while(|c| c.is_ascii_digit()).collect();
    if digits.is_empty() {
        return 0;
    }
    // Saturate instead of failing on absurdly long input.
    digits.parse::<u32>().unwrap_or(u32::MAX)
}

pub fn parse_flag(raw: &str) -> bool {
    matches!(
        raw.trim().to_ascii_lowercase().as_str(),
        "1" | "true" | "yes" | "on"
    )
}

/// User-chosen filter values. Passed by value on every recomputation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct FilterParams {
    #[serde(deserialize_with = "de_funding")]
    pub funding: FundingFilter,
    #[serde(deserialize_with = "de_min_score")]
    pub min_score: u32,
    #[serde(deserialize_with = "de_source_type")]
    pub source_type: SourceType,
    #[serde(deserialize_with = "de_flag")]
    pub only_new: bool,
}

impl FilterParams {
    /// Build from raw UI/env strings.
    pub fn from_raw(funding: &str, min_score: &str, source_type: &str, only_new: &str) -> Self {
        Self {
            funding: FundingFilter::parse(funding),
            min_score: parse_min_score(min_score),
            source_type: SourceType::parse(source_type),
            only_new: parse_flag(only_new),
        }
    }

    pub fn is_active(&self) -> bool {
        *self != Self::default()
    }

    /// Whether one listing survives every active predicate.
    pub fn accepts(&self, l: &Listing) -> bool {
        let source_ok = match self.source_type {
            SourceType::All => true,
            SourceType::Academic => !l.is_social,
            SourceType::Social => l.is_social,
        };
        if !source_ok {
            return false;
        }

        if self.only_new && !l.is_new {
            return false;
        }

        let funding_ok = match self.funding {
            FundingFilter::Unspecified => true,
            FundingFilter::Required => l.is_funded(),
            FundingFilter::Excluded => !l.is_funded(),
        };
        if !funding_ok {
            return false;
        }

        self.min_score == 0 || l.score >= f64::from(self.min_score)
    }
}

/// Ordered subsequence of `items` accepted by `params`.
///
/// Takes any iterator of borrowed listings, so the output of one call can be
/// fed straight back in.
pub fn filter<'a, I>(items: I, params: &FilterParams) -> Vec<&'a Listing>
where
    I: IntoIterator<Item = &'a Listing>,
{
    items.into_iter().filter(|l| params.accepts(l)).collect()
}

/* ----------------------------
Tolerant serde adapters
---------------------------- */

// Any JSON scalar is accepted; unknown or mistyped values mean "no constraint".
fn scalar_text<'de, D: Deserializer<'de>>(d: D) -> Result<String, D::Error> {
    let v = serde_json::Value::deserialize(d)?;
    Ok(match v {
        serde_json::Value::String(s) => s,
        serde_json::Value::Number(n) => n.to_string(),
        serde_json::Value::Bool(b) => b.to_string(),
        _ => String::new(),
    })
}

fn de_funding<'de, D: Deserializer<'de>>(d: D) -> Result<FundingFilter, D::Error> {
    scalar_text(d).map(|s| FundingFilter::parse(&s))
}

fn de_min_score<'de, D: Deserializer<'de>>(d: D) -> Result<u32, D::Error> {
    scalar_text(d).map(|s| parse_min_score(&s))
}

fn de_source_type<'de, D: Deserializer<'de>>(d: D) -> Result<SourceType, D::Error> {
    scalar_text(d).map(|s| SourceType::parse(&s))
}

fn de_flag<'de, D: Deserializer<'de>>(d: D) -> Result<bool, D::Error> {
    scalar_text(d).map(|s| parse_flag(&s))
}
