// End-to-end runs over a realistic snapshot: parse, scope, select, derive,
// sort, flatten transfers and aggregate.

use spend_engine::insights::FindingKind;
use spend_engine::sort::{ClubSortField, SortState};
use spend_engine::{
    ClubSelection, ScopeFilter, Snapshot, SnapshotError, TransferDirection, ViewConfig, ViewMode,
    derive_view, findings, quality_ranking, scope_ids, totals, transfer_rows,
};

const FIXTURE: &str = include_str!("fixtures/snapshot.json");

fn snapshot() -> Snapshot {
    Snapshot::from_json(FIXTURE).expect("fixture parses")
}

fn selection_for(snapshot: &Snapshot, config: &ViewConfig) -> ClubSelection {
    let mut selection = ClubSelection::new();
    selection.reconcile(scope_ids(&snapshot.clubs, config), false);
    selection
}

fn close(a: f64, b: f64) -> bool {
    (a - b).abs() < 1e-9 * a.abs().max(b.abs()).max(1.0)
}

#[test]
fn test_fixture_parses_and_skips_malformed_clubs() {
    let snapshot = snapshot();
    assert_eq!(snapshot.clubs.len(), 5);
    assert_eq!(snapshot.leagues(), vec!["Premier League", "La Liga"]);
    assert_eq!(snapshot.seasons(), vec!["2025/26", "2024/25"]);
    assert_eq!(snapshot.currencies(), vec!["EUR", "GBP", "USD"]);
    assert_eq!(snapshot.sources[0].kind, "wages");

    // Numeric string fee is coerced
    let ars = snapshot.club("ars").unwrap();
    assert_eq!(ars.incoming[2].fee, 13.0);
}

#[test]
fn test_missing_clubs_is_rejected() {
    let result = Snapshot::from_json(r#"{"exchange_rates": {"GBP": 1.0}}"#);
    assert!(matches!(result, Err(SnapshotError::MissingClubs)));

    let result = Snapshot::from_json("not json");
    assert!(matches!(result, Err(SnapshotError::Parse(_))));
}

#[test]
fn test_default_view_uses_snapshot_scope() {
    let snapshot = snapshot();
    let config = ViewConfig::for_snapshot(&snapshot);
    let selection = selection_for(&snapshot, &config);

    let view = derive_view(&snapshot, &config, &selection);
    let ids: Vec<_> = view.iter().map(|c| c.id()).collect();
    assert_eq!(ids, vec!["ars", "che", "bre"]);

    // Authoritative amortization, carryover included
    assert_eq!(view[0].amortized_in, 125.0);
    assert_eq!(view[0].amortized_carryover, 95.0);
    assert_eq!(view[0].total_spend, 350.0);

    // Net seller with a total-only summary
    assert_eq!(view[2].amortized_in, 18.0);
    assert_eq!(view[2].total_spend, -22.0);
}

#[test]
fn test_identities_hold_in_every_mode_and_currency() {
    let snapshot = snapshot();

    for mode in [ViewMode::Cash, ViewMode::PnlProxy] {
        for currency in ["GBP", "EUR", "USD", "JPY"] {
            let config = ViewConfig {
                currency: currency.to_string(),
                view_mode: mode,
                ..ViewConfig::default()
            };
            let selection = selection_for(&snapshot, &config);

            for club in derive_view(&snapshot, &config, &selection) {
                assert!(
                    close(club.net_transfer, club.transfer_in - club.transfer_out),
                    "{} {} {}",
                    club.id(),
                    mode,
                    currency
                );
                assert!(close(club.total_spend, club.wage_bill + club.net_transfer));
                assert!(close(
                    club.amortized_in,
                    club.amortized_current + club.amortized_carryover
                ));
                assert!(club.assumed_deals <= club.incoming_count);
                assert!((0.0..=1.0).contains(&club.contract_coverage));
                assert!((0.0..=1.0).contains(&club.wage_share));
            }
        }
    }
}

#[test]
fn test_currency_scales_money_only() {
    let snapshot = snapshot();
    let gbp = ViewConfig::default();
    let eur = ViewConfig {
        currency: "eur".to_string(),
        ..ViewConfig::default()
    };
    let selection = selection_for(&snapshot, &gbp);

    let base = derive_view(&snapshot, &gbp, &selection);
    let converted = derive_view(&snapshot, &eur, &selection);
    assert_eq!(base.len(), converted.len());

    for (b, c) in base.iter().zip(&converted) {
        assert_eq!(b.id(), c.id());
        assert!(close(c.total_spend, b.total_spend * 1.16));
        assert!(close(c.wage_bill, b.wage_bill * 1.16));
        assert_eq!(c.wage_share, b.wage_share);
        assert_eq!(c.contract_coverage, b.contract_coverage);
    }
}

#[test]
fn test_unknown_currency_falls_back_to_base() {
    let snapshot = snapshot();
    let config = ViewConfig {
        currency: "JPY".to_string(),
        ..ViewConfig::default()
    };
    assert_eq!(config.multiplier(&snapshot), 1.0);
}

#[test]
fn test_cash_view_uses_gross_fees() {
    let snapshot = snapshot();
    let config = ViewConfig {
        view_mode: ViewMode::Cash,
        league: ScopeFilter::parse("Premier League"),
        season: ScopeFilter::parse("2025/26"),
        ..ViewConfig::default()
    };
    let selection = selection_for(&snapshot, &config);

    let view = derive_view(&snapshot, &config, &selection);
    let ars = view.iter().find(|c| c.id() == "ars").unwrap();
    assert_eq!(ars.transfer_in, 142.0);
    assert_eq!(ars.net_transfer, 132.0);
    assert_eq!(ars.total_spend, 367.0);
    // Amortization is still reported alongside
    assert_eq!(ars.amortized_in, 125.0);
}

#[test]
fn test_selection_survives_league_switches() {
    let snapshot = snapshot();
    let mut config = ViewConfig::for_snapshot(&snapshot);
    let mut selection = selection_for(&snapshot, &config);
    selection.toggle("bre", scope_ids(&snapshot.clubs, &config));
    assert_eq!(selection.ids().collect::<Vec<_>>(), vec!["ars", "che"]);

    // Disjoint scope: the emptied selection resets to everything in scope
    config.league = ScopeFilter::parse("La Liga");
    selection.reconcile(scope_ids(&snapshot.clubs, &config), false);
    assert_eq!(selection.ids().collect::<Vec<_>>(), vec!["rma"]);

    config.league = ScopeFilter::All;
    selection.reconcile(scope_ids(&snapshot.clubs, &config), false);
    assert_eq!(selection.ids().collect::<Vec<_>>(), vec!["rma"]);

    let view = derive_view(&snapshot, &config, &selection);
    assert_eq!(view.len(), 1);
    assert_eq!(view[0].name(), "Real Madrid");
}

#[test]
fn test_transfer_views_follow_working_set() {
    let snapshot = snapshot();
    let config = ViewConfig::for_snapshot(&snapshot);
    let selection = selection_for(&snapshot, &config);
    let view = derive_view(&snapshot, &config, &selection);

    let incoming = transfer_rows(&view, TransferDirection::Incoming, &config);
    assert_eq!(incoming.len(), 6);
    assert_eq!(incoming[0].player, "Viktor Gyokeres");
    assert!(incoming.windows(2).all(|w| w[0].fee >= w[1].fee));

    let mosquera = incoming
        .iter()
        .find(|r| r.player == "Cristhian Mosquera")
        .unwrap();
    assert_eq!(mosquera.contract_years, Some(4.0));
    assert_eq!(mosquera.annual_cost, Some(3.25));
    assert_eq!(mosquera.reported, Some(false));

    let outgoing = transfer_rows(&view, TransferDirection::Outgoing, &config);
    assert_eq!(outgoing.len(), 6);
    assert_eq!(outgoing[0].player, "Bryan Mbeumo");
    assert!(outgoing.iter().all(|r| r.annual_cost.is_none()));
}

#[test]
fn test_totals_findings_and_quality() {
    let snapshot = snapshot();
    let config = ViewConfig::for_snapshot(&snapshot);
    let selection = selection_for(&snapshot, &config);
    let view = derive_view(&snapshot, &config, &selection);

    let t = totals(&view);
    assert_eq!(t.club_count, 3);
    assert!(close(
        t.total_spend,
        view.iter().map(|c| c.total_spend).sum::<f64>()
    ));
    assert_eq!(t.wage_bill, 520.0);
    assert_eq!(t.incoming, 6);
    assert_eq!(t.reported, 4);
    assert_eq!(t.assumed, 2);

    let found = findings(&view);
    let club_for = |kind| {
        found
            .iter()
            .find(|f| f.kind == kind)
            .map(|f| f.club_id.as_str())
    };
    assert_eq!(club_for(FindingKind::HighestSpend), Some("ars"));
    assert_eq!(club_for(FindingKind::NetBuyer), Some("ars"));
    assert_eq!(club_for(FindingKind::NetSeller), Some("bre"));
    assert_eq!(club_for(FindingKind::LowestCoverage), Some("che"));
    assert_eq!(club_for(FindingKind::HighestWageShare), Some("che"));

    // Equal pressure: lower coverage ranks first
    let ranking = quality_ranking(&view, 5);
    let ids: Vec<_> = ranking.iter().map(|q| q.club_id.as_str()).collect();
    assert_eq!(ids, vec!["che", "ars", "bre"]);
    assert_eq!(ranking[0].pressure, 1.0);
    assert_eq!(ranking[1].pressure, 1.0);
}

#[test]
fn test_sort_is_independent_of_derivation() {
    let snapshot = snapshot();
    let mut config = ViewConfig::for_snapshot(&snapshot);
    let selection = selection_for(&snapshot, &config);
    let by_spend: Vec<_> = derive_view(&snapshot, &config, &selection)
        .iter()
        .map(|c| (c.id().to_string(), c.total_spend))
        .collect();

    config.club_sort = SortState::new(ClubSortField::Name);
    let by_name: Vec<_> = derive_view(&snapshot, &config, &selection)
        .iter()
        .map(|c| (c.id().to_string(), c.total_spend))
        .collect();

    let ids: Vec<_> = by_name.iter().map(|(id, _)| id.as_str()).collect();
    assert_eq!(ids, vec!["ars", "bre", "che"]);

    let mut resorted = by_name.clone();
    resorted.sort_by(|a, b| b.1.total_cmp(&a.1));
    assert_eq!(resorted, by_spend);
}
