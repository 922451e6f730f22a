// tests/filter_engine.rs
use phd_agent::{filter, FilterParams, FundingFilter, Listing, Snapshot, SourceType};

fn listing(id: &str) -> Listing {
    Listing::with_defaults(id)
}

fn ids(v: &[&Listing]) -> Vec<String> {
    v.iter().map(|l| l.id.clone()).collect()
}

fn fixture() -> Snapshot {
    let s = std::fs::read_to_string("tests/fixtures/latest.json").expect("fixture");
    Snapshot::from_json_str(&s).expect("fixture parses")
}

/// Every combination of parameter values worth distinguishing.
fn param_grid() -> Vec<FilterParams> {
    let mut out = Vec::new();
    for funding in [
        FundingFilter::Unspecified,
        FundingFilter::Required,
        FundingFilter::Excluded,
    ] {
        for source_type in [SourceType::All, SourceType::Academic, SourceType::Social] {
            for only_new in [false, true] {
                for min_score in [0, 35, 75, 1000] {
                    out.push(FilterParams {
                        funding,
                        min_score,
                        source_type,
                        only_new,
                    });
                }
            }
        }
    }
    out
}

#[test]
fn min_score_keeps_items_at_or_above_floor_in_order() {
    let items: Vec<Listing> = [("low", 10.0), ("mid", 50.0), ("high", 90.0)]
        .into_iter()
        .map(|(id, score)| Listing {
            score,
            ..listing(id)
        })
        .collect();
    let p = FilterParams::from_raw("", "50", "all", "");
    assert_eq!(ids(&filter(&items, &p)), vec!["mid", "high"]);
}

#[test]
fn funding_required_and_excluded() {
    let item = Listing {
        funding: "Fully funded studentship".into(),
        ..listing("f")
    };
    let items = vec![item];

    let req = FilterParams {
        funding: FundingFilter::Required,
        ..FilterParams::default()
    };
    assert_eq!(filter(&items, &req).len(), 1);

    let exc = FilterParams {
        funding: FundingFilter::Excluded,
        ..FilterParams::default()
    };
    assert!(filter(&items, &exc).is_empty());
}

#[test]
fn social_only_picks_the_single_social_item() {
    let items: Vec<Listing> = (0..5)
        .map(|i| Listing {
            is_social: i == 3,
            ..listing(&i.to_string())
        })
        .collect();
    let p = FilterParams::from_raw("", "", "social", "");
    assert_eq!(ids(&filter(&items, &p)), vec!["3"]);

    let p = FilterParams::from_raw("", "", "academic", "");
    assert_eq!(ids(&filter(&items, &p)), vec!["0", "1", "2", "4"]);
}

#[test]
fn only_new_on_fixture() {
    let snap = fixture();
    let p = FilterParams::from_raw("", "0", "all", "true");
    assert_eq!(ids(&filter(&snap.items, &p)), vec!["a1", "c3", "e5"]);
}

#[test]
fn funding_markers_on_fixture() {
    let snap = fixture();
    let req = FilterParams::from_raw("1", "", "", "");
    // "Self-funded" contains "funded" and "Full tuition waiver" contains "full".
    assert_eq!(ids(&filter(&snap.items, &req)), vec!["a1", "c3", "d4"]);
    let exc = FilterParams::from_raw("0", "", "", "");
    assert_eq!(ids(&filter(&snap.items, &exc)), vec!["b2", "e5"]);
}

#[test]
fn malformed_params_mean_no_constraint() {
    let snap = fixture();
    let p = FilterParams::from_raw("perhaps", "-20", "rss", "sometimes");
    assert!(!p.is_active());
    assert_eq!(filter(&snap.items, &p).len(), snap.items.len());
}

#[test]
fn result_is_an_ordered_subsequence() {
    let snap = fixture();
    for p in param_grid() {
        let out = filter(&snap.items, &p);
        let mut pos = 0usize;
        for l in out {
            let found = snap.items[pos..]
                .iter()
                .position(|x| std::ptr::eq(x, l))
                .unwrap_or_else(|| panic!("{} out of order for {p:?}", l.id));
            pos += found + 1;
        }
    }
}

#[test]
fn filtering_is_idempotent() {
    let snap = fixture();
    for p in param_grid() {
        let once = filter(&snap.items, &p);
        let twice = filter(once.iter().copied(), &p);
        assert_eq!(ids(&once), ids(&twice), "{p:?}");
    }
}

#[test]
fn funding_filter_partitions_the_rest() {
    let snap = fixture();
    for p in param_grid()
        .into_iter()
        .filter(|p| p.funding == FundingFilter::Unspecified)
    {
        let all = ids(&filter(&snap.items, &p));
        let req = ids(&filter(
            &snap.items,
            &FilterParams {
                funding: FundingFilter::Required,
                ..p
            },
        ));
        let exc = ids(&filter(
            &snap.items,
            &FilterParams {
                funding: FundingFilter::Excluded,
                ..p
            },
        ));
        assert!(req.iter().all(|id| !exc.contains(id)), "{p:?}");
        let mut union: Vec<_> = req.iter().chain(exc.iter()).cloned().collect();
        union.sort();
        let mut expected = all.clone();
        expected.sort();
        assert_eq!(union, expected, "{p:?}");
    }
}

#[test]
fn empty_snapshot_filters_to_empty() {
    let snap = Snapshot::empty();
    for p in param_grid() {
        assert!(filter(&snap.items, &p).is_empty());
    }
}
