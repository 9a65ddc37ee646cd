//! Filter, derive and sort
//!
//! Filters run in a fixed order over the raw club list: league, season,
//! selection membership, then the free-text name search. Survivors are
//! derived with the configured currency and view mode and sorted with the
//! club table's sort state. Everything downstream (transfer views, totals,
//! findings) works from that one ordered set.

use crate::metrics::{DerivedClub, derive_club};
use crate::selection::ClubSelection;
use crate::snapshot::{ClubRecord, Snapshot};
use crate::view::ViewConfig;

/// Ids of the clubs passing the league and season filters, in list order.
/// This is the scope the selection is reconciled against.
pub fn scope_ids<'a>(clubs: &'a [ClubRecord], config: &ViewConfig) -> Vec<&'a str> {
    clubs
        .iter()
        .filter(|c| config.in_scope(c))
        .map(|c| c.id.as_str())
        .collect()
}

/// Apply the four filters, preserving list order
pub fn filter_clubs<'a>(
    clubs: &'a [ClubRecord],
    config: &ViewConfig,
    selection: &ClubSelection,
) -> Vec<&'a ClubRecord> {
    clubs
        .iter()
        .filter(|c| config.league.matches(&c.league))
        .filter(|c| config.season.matches(&c.season))
        .filter(|c| selection.contains(&c.id))
        .filter(|c| config.matches_search(&c.name))
        .collect()
}

/// The ordered working set: filtered, derived and sorted
pub fn derive_view<'a>(
    snapshot: &'a Snapshot,
    config: &ViewConfig,
    selection: &ClubSelection,
) -> Vec<DerivedClub<'a>> {
    let multiplier = config.multiplier(snapshot);

    let mut derived: Vec<DerivedClub> = filter_clubs(&snapshot.clubs, config, selection)
        .into_iter()
        .map(|club| derive_club(club, multiplier, config.view_mode))
        .collect();

    config.club_sort.sort(&mut derived);

    log::debug!(
        "Derived {} of {} clubs ({} {}, x{:.2})",
        derived.len(),
        snapshot.clubs.len(),
        config.currency,
        config.view_mode.label(),
        multiplier
    );

    derived
}

// =============================================================================
// Transfer views
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransferDirection {
    Incoming,
    Outgoing,
}

/// One transfer line in a flattened transfer view, money converted
#[derive(Debug, Clone, PartialEq)]
pub struct TransferRow {
    pub club_id: String,
    pub club_name: String,
    pub player: String,
    pub fee: f64,
    /// Incoming only: resolved contract length
    pub contract_years: Option<f64>,
    /// Incoming only: fee / contract years
    pub annual_cost: Option<f64>,
    /// Incoming only: upstream confidence tag, `assumed` when missing
    pub confidence: Option<String>,
    pub reported: Option<bool>,
    pub contract_note: Option<String>,
    pub window: String,
    pub is_loan: bool,
    pub age: Option<u32>,
    pub position: Option<String>,
}

/// Flatten the working set's transfers in one direction, sorted with that
/// direction's own sort state
pub fn transfer_rows(
    clubs: &[DerivedClub],
    direction: TransferDirection,
    config: &ViewConfig,
) -> Vec<TransferRow> {
    let mut rows: Vec<TransferRow> = Vec::new();

    for club in clubs {
        let record = club.record;
        let m = club.multiplier;

        match direction {
            TransferDirection::Incoming => {
                rows.extend(record.incoming.iter().map(|t| {
                    let confidence = t.confidence();
                    TransferRow {
                        club_id: record.id.clone(),
                        club_name: record.name.clone(),
                        player: t.player.clone(),
                        fee: t.fee * m,
                        contract_years: Some(t.resolved_years()),
                        annual_cost: Some(t.annual_cost() * m),
                        confidence: Some(
                            t.contract_confidence
                                .clone()
                                .unwrap_or_else(|| confidence.label().to_string()),
                        ),
                        reported: Some(confidence.is_reported()),
                        contract_note: t.contract_note.clone(),
                        window: t.window.clone(),
                        is_loan: t.is_loan,
                        age: t.age,
                        position: t.position.clone(),
                    }
                }));
            }
            TransferDirection::Outgoing => {
                rows.extend(record.outgoing.iter().map(|t| TransferRow {
                    club_id: record.id.clone(),
                    club_name: record.name.clone(),
                    player: t.player.clone(),
                    fee: t.fee * m,
                    contract_years: None,
                    annual_cost: None,
                    confidence: None,
                    reported: None,
                    contract_note: None,
                    window: t.window.clone(),
                    is_loan: t.is_loan,
                    age: t.age,
                    position: t.position.clone(),
                }));
            }
        }
    }

    let sort = match direction {
        TransferDirection::Incoming => config.incoming_sort,
        TransferDirection::Outgoing => config.outgoing_sort,
    };
    sort.sort(&mut rows);

    rows
}
