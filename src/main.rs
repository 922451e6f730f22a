//! PhD agent binary entrypoint.
//! Loads the daily snapshot once, applies filter parameters from the
//! environment and prints the annotated listing cards.

use chrono::Utc;
use std::fmt::Write as _;
use tracing::{info, warn};

use phd_agent::config::{filter_params_from_env, AppConfig};
use phd_agent::relevance::MAX_HIT_TAGS;
use phd_agent::{
    annotate, filter, FilterParams, JsonFileStore, KeyValueStore, Listing, ProfileMatch,
    ProfileStore, Snapshot, SnapshotLoader,
};

const ENV_PROFILE_ADD: &str = "PHD_PROFILE_ADD";
const ENV_PROFILE_REMOVE: &str = "PHD_PROFILE_REMOVE";

/// One-shot profile edits so the keyword list can be managed without a UI.
fn apply_profile_edits<S: KeyValueStore>(store: &mut ProfileStore<S>) {
    if let Ok(kw) = std::env::var(ENV_PROFILE_ADD) {
        let before = store.get().len();
        let p = store.add(&kw);
        if p.len() > before {
            info!(keyword = %kw.trim(), keywords = p.len(), "profile keyword added");
        }
    }
    if let Ok(raw) = std::env::var(ENV_PROFILE_REMOVE) {
        match raw.trim().parse::<usize>() {
            Ok(idx) => {
                let p = store.remove(idx);
                info!(index = idx, keywords = p.len(), "profile keyword removed");
            }
            Err(_) => warn!(value = %raw, "{ENV_PROFILE_REMOVE} is not an index; ignored"),
        }
    }
}

fn render_header(out: &mut String, snap: &Snapshot, params: &FilterParams, shown: usize) {
    let updated = snap.generated_at.as_deref().unwrap_or("—");
    let _ = write!(out, "Updated: {updated}");
    if let Some(ts) = snap.generated_at_utc() {
        let hours = (Utc::now() - ts).num_hours();
        let _ = write!(out, " ({hours}h ago)");
    }
    let _ = writeln!(out, " · {} items · {} new", snap.total_items, snap.new_count());

    let breakdown = snap.source_breakdown();
    if breakdown.is_empty() {
        let _ = writeln!(out, "Sources: —");
    } else {
        let parts: Vec<String> = breakdown
            .iter()
            .map(|c| format!("{}: {}", c.source, c.count))
            .collect();
        let _ = writeln!(out, "Sources: {}", parts.join(" · "));
    }
    if params.is_active() {
        let _ = writeln!(out, "Filters: {params:?} → {shown} shown");
    }
    let _ = writeln!(out);
}

fn render_card(out: &mut String, l: &Listing, m: &ProfileMatch) {
    let marker = if m.is_relevant { "★" } else { " " };
    let new_tag = if l.is_new { " [NEW]" } else { "" };
    let _ = writeln!(
        out,
        "{marker} {}{new_tag} [{}] Score: {}",
        l.organization, l.source, l.score
    );
    if !l.title.is_empty() {
        let _ = writeln!(out, "  {}", l.title);
    }
    if l.has_link() {
        let _ = writeln!(out, "  {}", l.link);
    }
    let _ = writeln!(out, "  Funding: {} · Deadline: {}", l.funding, l.deadline);
    if let Some(summary) = l.display_summary() {
        let _ = writeln!(out, "  {summary}");
    }
    for paper in &l.papers {
        let _ = writeln!(out, "  - {paper}");
    }
    if !m.hit_keywords.is_empty() {
        let more = m.total_hits.saturating_sub(MAX_HIT_TAGS);
        let _ = write!(out, "  Hits: {}", m.hit_keywords.join(", "));
        if more > 0 {
            let _ = write!(out, " (+{more})");
        }
        let _ = writeln!(out);
    }
    let _ = writeln!(out);
}

#[tokio::main]
async fn main() {
    // Load .env in local/dev; no-op when absent.
    let _ = dotenvy::dotenv();
    phd_agent::telemetry::init_tracing();

    let cfg = AppConfig::load_default().unwrap_or_else(|e| {
        warn!(error = ?e, "config load failed; using defaults");
        let mut cfg = AppConfig::default();
        cfg.apply_env_overrides();
        cfg
    });
    info!(data = %cfg.data_location, profile = %cfg.profile_path.display(), "starting");

    let mut profile_store = ProfileStore::open(JsonFileStore::new(&cfg.profile_path));
    apply_profile_edits(&mut profile_store);
    let profile = profile_store.get();

    let snapshot = SnapshotLoader::new(cfg.fetch_timeout())
        .load(&cfg.data_location)
        .await;

    let params = filter_params_from_env();
    let visible = filter(&snapshot.items, &params);
    let cards = annotate(visible, &profile);

    let mut out = String::new();
    let _ = writeln!(out, "Profile: {}", profile.keywords().join(", "));
    render_header(&mut out, &snapshot, &params, cards.len());
    if cards.is_empty() {
        let _ = writeln!(out, "No listings.");
    }
    for (listing, m) in &cards {
        render_card(&mut out, listing, m);
    }
    print!("{out}");

    info!(
        shown = cards.len(),
        relevant = cards.iter().filter(|(_, m)| m.is_relevant).count(),
        "done"
    );
}
