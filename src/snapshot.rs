// src/snapshot.rs
//! Snapshot loader: one fetch per session, tolerant normalization into
//! canonical [`Listing`] records.
//!
//! Failures never reach the caller. A network error, a non-2xx status, a
//! missing file or malformed JSON all degrade to [`Snapshot::empty`], so the
//! view layer always has something to render.

use anyhow::{bail, Context, Result};
use metrics::{counter, gauge};
use once_cell::sync::OnceCell;
use serde::Deserialize;
use serde_json::Value;
use std::collections::BTreeMap;
use std::time::Duration;

use crate::listing::{
    Listing, Snapshot, DEFAULT_DEADLINE, DEFAULT_FUNDING, DEFAULT_LINK, DEFAULT_ORGANIZATION,
    DEFAULT_SOURCE,
};
use crate::telemetry::ensure_metrics_described;

pub const DEFAULT_FETCH_TIMEOUT_SECS: u64 = 15;

/// Decode entities, strip tags, collapse whitespace, trim.
pub fn clean_text(s: &str) -> String {
    let mut out = html_escape::decode_html_entities(s).to_string();

    static RE_TAGS: OnceCell<regex::Regex> = OnceCell::new();
    let re_tags = RE_TAGS.get_or_init(|| regex::Regex::new(r"(?is)</?[^>]+>").unwrap());
    out = re_tags.replace_all(&out, " ").to_string();

    static RE_WS: OnceCell<regex::Regex> = OnceCell::new();
    let re_ws = RE_WS.get_or_init(|| regex::Regex::new(r"\s+").unwrap());
    out = re_ws.replace_all(&out, " ").to_string();
    out.trim().to_string()
}

/* ----------------------------
Raw document shapes
---------------------------- */

// Every field is kept as a raw `Value` so a wrong type in one field never
// fails the whole record.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct RawSnapshot {
    items: Option<Value>,
    generated_at: Option<Value>,
    by_source: Option<Value>,
    total_items: Option<Value>,
    count: Option<Value>,
    top10_new_or_updated: Option<Value>,
    csv_block: Option<Value>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct RawListing {
    id: Option<Value>,
    title: Option<Value>,
    university: Option<Value>,
    org: Option<Value>,
    school: Option<Value>,
    link: Option<Value>,
    url: Option<Value>,
    funding: Option<Value>,
    fund: Option<Value>,
    deadline: Option<Value>,
    source: Option<Value>,
    social: Option<Value>,
    is_social: Option<Value>,
    score: Option<Value>,
    match_score: Option<Value>,
    is_new: Option<Value>,
    ai_summary: Option<Value>,
    summary: Option<Value>,
    rule_summary: Option<Value>,
    papers: Option<Value>,
    profile_hits: Option<Value>,
    supervisor: Option<Value>,
    location: Option<Value>,
    keywords: Option<Value>,
    collab: Option<Value>,
}

/* ----------------------------
Coercions
---------------------------- */

fn text_of(v: &Option<Value>) -> Option<String> {
    match v.as_ref()? {
        Value::String(s) => {
            let t = clean_text(s);
            (!t.is_empty()).then_some(t)
        }
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn first_text(candidates: &[&Option<Value>]) -> Option<String> {
    candidates.iter().find_map(|v| text_of(v))
}

fn truthy(v: &Option<Value>) -> bool {
    match v {
        None | Some(Value::Null) => false,
        Some(Value::Bool(b)) => *b,
        Some(Value::Number(n)) => n.as_f64().is_some_and(|x| x != 0.0),
        Some(Value::String(s)) => !s.is_empty(),
        Some(Value::Array(_)) | Some(Value::Object(_)) => true,
    }
}

fn number_of(v: &Option<Value>) -> Option<f64> {
    let x = match v.as_ref()? {
        Value::Number(n) => n.as_f64()?,
        Value::String(s) => s.trim().parse::<f64>().ok()?,
        _ => return None,
    };
    x.is_finite().then_some(x)
}

fn count_of(v: &Option<Value>) -> Option<u64> {
    match v.as_ref()? {
        Value::Number(n) => n.as_u64(),
        Value::String(s) => s.trim().parse::<u64>().ok(),
        _ => None,
    }
}

fn string_list(v: &Option<Value>) -> Vec<String> {
    match v {
        Some(Value::Array(arr)) => arr
            .iter()
            .filter_map(|x| x.as_str())
            .map(clean_text)
            .filter(|s| !s.is_empty())
            .collect(),
        _ => Vec::new(),
    }
}

fn profile_hits_of(v: &Option<Value>) -> Option<String> {
    let joined = match v.as_ref()? {
        Value::String(s) => s.trim().to_string(),
        Value::Array(arr) => arr
            .iter()
            .filter_map(|x| x.as_str())
            .collect::<Vec<_>>()
            .join(","),
        _ => return None,
    };
    (!joined.is_empty()).then_some(joined)
}

/* ----------------------------
Normalization
---------------------------- */

/// Resolve one raw item into a canonical listing. `index` is the positional
/// id fallback.
pub fn normalize_listing(index: usize, raw: &Value) -> Listing {
    let r: RawListing = serde_json::from_value(raw.clone()).unwrap_or_default();

    Listing {
        id: text_of(&r.id).unwrap_or_else(|| index.to_string()),
        title: text_of(&r.title).unwrap_or_default(),
        organization: first_text(&[&r.university, &r.org, &r.school])
            .unwrap_or_else(|| DEFAULT_ORGANIZATION.to_string()),
        link: first_text(&[&r.link, &r.url]).unwrap_or_else(|| DEFAULT_LINK.to_string()),
        funding: first_text(&[&r.funding, &r.fund]).unwrap_or_else(|| DEFAULT_FUNDING.to_string()),
        deadline: text_of(&r.deadline).unwrap_or_else(|| DEFAULT_DEADLINE.to_string()),
        source: text_of(&r.source).unwrap_or_else(|| DEFAULT_SOURCE.to_string()),
        is_social: truthy(&r.social) || truthy(&r.is_social),
        score: number_of(&r.score)
            .or_else(|| number_of(&r.match_score))
            .unwrap_or(0.0),
        is_new: truthy(&r.is_new),
        ai_summary: text_of(&r.ai_summary),
        rule_summary: first_text(&[&r.summary, &r.rule_summary]),
        papers: string_list(&r.papers),
        profile_hits: profile_hits_of(&r.profile_hits),
        supervisor: text_of(&r.supervisor).unwrap_or_default(),
        location: text_of(&r.location).unwrap_or_default(),
        keywords: string_list(&r.keywords),
        collab: string_list(&r.collab),
    }
}

fn normalize_items(v: &Option<Value>) -> Vec<Listing> {
    match v {
        Some(Value::Array(arr)) => arr
            .iter()
            .enumerate()
            .map(|(i, raw)| normalize_listing(i, raw))
            .collect(),
        _ => Vec::new(),
    }
}

fn normalize_by_source(v: &Option<Value>) -> BTreeMap<String, u64> {
    let mut out = BTreeMap::new();
    if let Some(Value::Object(map)) = v {
        for (k, raw) in map {
            if let Some(n) = raw.as_u64() {
                out.insert(k.clone(), n);
            }
        }
    }
    out
}

/// Normalize a parsed snapshot document. `null` is an empty snapshot; any
/// other non-object is an error.
pub fn normalize_document(doc: Value) -> Result<Snapshot> {
    let raw: RawSnapshot = match doc {
        Value::Null => return Ok(Snapshot::empty()),
        v @ Value::Object(_) => serde_json::from_value(v).context("reading snapshot fields")?,
        other => bail!("snapshot document must be an object, got {}", type_name(&other)),
    };

    let items = normalize_items(&raw.items);
    let total_items = [&raw.total_items, &raw.count]
        .into_iter()
        .filter_map(count_of)
        .find(|&n| n > 0)
        .map(|n| n as usize)
        .unwrap_or(items.len());

    Ok(Snapshot {
        total_items,
        generated_at: text_of(&raw.generated_at),
        by_source: normalize_by_source(&raw.by_source),
        top_new: normalize_items(&raw.top10_new_or_updated),
        csv_block: match raw.csv_block {
            Some(Value::String(s)) if !s.is_empty() => Some(s),
            _ => None,
        },
        items,
    })
}

fn type_name(v: &Value) -> &'static str {
    match v {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

impl Snapshot {
    /// Parse and normalize a snapshot JSON document.
    pub fn from_json_str(s: &str) -> Result<Self> {
        let doc: Value = serde_json::from_str(s).context("parsing snapshot json")?;
        normalize_document(doc)
    }
}

/* ----------------------------
Loader
---------------------------- */

/// Fetches the snapshot from an HTTP(S) URL or a local file path.
#[derive(Clone)]
pub struct SnapshotLoader {
    client: reqwest::Client,
    timeout: Duration,
}

impl Default for SnapshotLoader {
    fn default() -> Self {
        Self::new(Duration::from_secs(DEFAULT_FETCH_TIMEOUT_SECS))
    }
}

impl SnapshotLoader {
    pub fn new(timeout: Duration) -> Self {
        Self {
            client: reqwest::Client::new(),
            timeout,
        }
    }

    pub fn with_client(client: reqwest::Client, timeout: Duration) -> Self {
        Self { client, timeout }
    }

    /// Single attempt, no retry. Any failure yields an empty snapshot.
    pub async fn load(&self, location: &str) -> Snapshot {
        ensure_metrics_described();

        match self.try_load(location).await {
            Ok(snap) => {
                counter!("snapshot_loads_total").increment(1);
                gauge!("snapshot_items").set(snap.items.len() as f64);
                tracing::info!(
                    target: "snapshot",
                    location,
                    items = snap.items.len(),
                    new = snap.new_count(),
                    "snapshot loaded"
                );
                snap
            }
            Err(e) => {
                counter!("snapshot_load_errors_total").increment(1);
                gauge!("snapshot_items").set(0.0);
                tracing::warn!(target: "snapshot", error = ?e, location, "snapshot load failed; using empty snapshot");
                Snapshot::empty()
            }
        }
    }

    async fn try_load(&self, location: &str) -> Result<Snapshot> {
        let body = if is_http(location) {
            self.fetch_text(location).await?
        } else {
            tokio::fs::read_to_string(location)
                .await
                .with_context(|| format!("reading snapshot file {location}"))?
        };
        Snapshot::from_json_str(&body)
    }

    async fn fetch_text(&self, url: &str) -> Result<String> {
        let resp = self
            .client
            .get(url)
            .timeout(self.timeout)
            .send()
            .await
            .context("snapshot http get()")?;
        let resp = resp
            .error_for_status()
            .context("snapshot http status")?;
        resp.text().await.context("snapshot http .text()")
    }
}

fn is_http(location: &str) -> bool {
    let l = location.trim_start().to_ascii_lowercase();
    l.starts_with("http://") || l.starts_with("https://")
}
