//! Totals, findings and data-quality ranking over the working set
//!
//! All reductions are pure and degrade to neutral values on an empty set:
//! sums are 0, coverage is 1.0 and ranked lists are empty.

use crate::metrics::DerivedClub;

/// Number of clubs kept in the data-quality ranking by default
pub const DEFAULT_QUALITY_LIMIT: usize = 5;

// =============================================================================
// Totals
// =============================================================================

#[derive(Debug, Clone, PartialEq)]
pub struct Totals {
    pub club_count: usize,
    pub total_spend: f64,
    pub wage_bill: f64,
    pub transfer_in: f64,
    pub transfer_out: f64,
    pub net_transfer: f64,
    pub reported: usize,
    pub incoming: usize,
    pub assumed: usize,
    /// reported / incoming across all clubs, 1.0 with no incoming deals
    pub coverage: f64,
}

impl Default for Totals {
    fn default() -> Self {
        Self {
            club_count: 0,
            total_spend: 0.0,
            wage_bill: 0.0,
            transfer_in: 0.0,
            transfer_out: 0.0,
            net_transfer: 0.0,
            reported: 0,
            incoming: 0,
            assumed: 0,
            coverage: 1.0,
        }
    }
}

pub fn totals(clubs: &[DerivedClub]) -> Totals {
    let mut totals = clubs.iter().fold(Totals::default(), |mut t, c| {
        t.club_count += 1;
        t.total_spend += c.total_spend;
        t.wage_bill += c.wage_bill;
        t.transfer_in += c.transfer_in;
        t.transfer_out += c.transfer_out;
        t.net_transfer += c.net_transfer;
        t.reported += c.reported_count;
        t.incoming += c.incoming_count;
        t.assumed += c.assumed_deals;
        t
    });

    if totals.incoming > 0 {
        totals.coverage = totals.reported as f64 / totals.incoming as f64;
    }
    totals
}

// =============================================================================
// Findings
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FindingKind {
    HighestSpend,
    NetBuyer,
    NetSeller,
    LowestCoverage,
    HighestWageShare,
}

impl FindingKind {
    pub fn title(self) -> &'static str {
        match self {
            FindingKind::HighestSpend => "Highest total spend",
            FindingKind::NetBuyer => "Most aggressive net buyer",
            FindingKind::NetSeller => "Largest net seller",
            FindingKind::LowestCoverage => "Lowest contract coverage",
            FindingKind::HighestWageShare => "Highest wage share",
        }
    }

    /// Money findings are in the view currency; the rest are ratios
    pub fn is_money(self) -> bool {
        matches!(
            self,
            FindingKind::HighestSpend | FindingKind::NetBuyer | FindingKind::NetSeller
        )
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Finding {
    pub kind: FindingKind,
    pub club_id: String,
    pub club_name: String,
    pub value: f64,
}

/// The five headline extrema. Ties go to the first club in list order.
pub fn findings(clubs: &[DerivedClub]) -> Vec<Finding> {
    let picks: [(FindingKind, Option<&DerivedClub>, fn(&DerivedClub) -> f64); 5] = [
        (
            FindingKind::HighestSpend,
            first_max_by(clubs, |c| c.total_spend),
            |c| c.total_spend,
        ),
        (
            FindingKind::NetBuyer,
            first_max_by(clubs, |c| c.net_transfer),
            |c| c.net_transfer,
        ),
        (
            FindingKind::NetSeller,
            first_max_by(clubs, |c| -c.net_transfer),
            |c| c.net_transfer,
        ),
        (
            FindingKind::LowestCoverage,
            first_max_by(clubs, |c| -c.contract_coverage),
            |c| c.contract_coverage,
        ),
        (
            FindingKind::HighestWageShare,
            first_max_by(clubs, |c| c.wage_share),
            |c| c.wage_share,
        ),
    ];

    picks
        .into_iter()
        .filter_map(|(kind, club, value)| {
            club.map(|c| Finding {
                kind,
                club_id: c.id().to_string(),
                club_name: c.name().to_string(),
                value: value(c),
            })
        })
        .collect()
}

/// First club with the largest key; later equal keys do not replace it
fn first_max_by<'c, 'a>(
    clubs: &'c [DerivedClub<'a>],
    key: impl Fn(&DerivedClub) -> f64,
) -> Option<&'c DerivedClub<'a>> {
    let mut best: Option<(&DerivedClub, f64)> = None;
    for club in clubs {
        let k = key(club);
        let k = if k.is_finite() { k } else { 0.0 };
        match best {
            Some((_, best_key)) if k <= best_key => {}
            _ => best = Some((club, k)),
        }
    }
    best.map(|(club, _)| club)
}

// =============================================================================
// Data quality
// =============================================================================

#[derive(Debug, Clone, PartialEq)]
pub struct QualityEntry {
    pub club_id: String,
    pub club_name: String,
    /// assumption rate x max(incoming, 1)
    pub pressure: f64,
    pub assumption_rate: f64,
    pub assumed: usize,
    pub incoming: usize,
    pub coverage: f64,
}

/// Clubs whose figures lean hardest on assumed contract lengths, worst first,
/// ties broken by lower coverage, capped at `limit`
pub fn quality_ranking(clubs: &[DerivedClub], limit: usize) -> Vec<QualityEntry> {
    let mut entries: Vec<QualityEntry> = clubs
        .iter()
        .map(|c| {
            let rate = c.assumption_rate();
            QualityEntry {
                club_id: c.id().to_string(),
                club_name: c.name().to_string(),
                pressure: rate * c.incoming_count.max(1) as f64,
                assumption_rate: rate,
                assumed: c.assumed_deals,
                incoming: c.incoming_count,
                coverage: c.contract_coverage,
            }
        })
        .collect();

    entries.sort_by(|a, b| {
        b.pressure
            .total_cmp(&a.pressure)
            .then_with(|| a.coverage.total_cmp(&b.coverage))
    });
    entries.truncate(limit);
    entries
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metrics::{ViewMode, derive_club};
    use crate::snapshot::{ClubRecord, IncomingTransfer, OutgoingTransfer};

    fn signing(fee: f64, tag: Option<&str>) -> IncomingTransfer {
        IncomingTransfer {
            fee,
            contract_years: Some(4.0),
            contract_confidence: tag.map(str::to_string),
            ..Default::default()
        }
    }

    fn club(id: &str, wage: f64, incoming: Vec<IncomingTransfer>, out: f64) -> ClubRecord {
        ClubRecord {
            id: id.to_string(),
            name: id.to_uppercase(),
            wage_bill: wage,
            incoming,
            outgoing: vec![OutgoingTransfer {
                fee: out,
                ..Default::default()
            }],
            ..Default::default()
        }
    }

    fn records() -> Vec<ClubRecord> {
        vec![
            club("a", 100.0, vec![signing(40.0, Some("reported"))], 0.0),
            club(
                "b",
                100.0,
                vec![signing(40.0, None), signing(40.0, Some("reported"))],
                100.0,
            ),
            club("c", 250.0, vec![signing(40.0, None), signing(80.0, None)], 0.0),
        ]
    }

    #[test]
    fn test_empty_set_is_neutral() {
        let t = totals(&[]);
        assert_eq!(t.club_count, 0);
        assert_eq!(t.total_spend, 0.0);
        assert_eq!(t.coverage, 1.0);
        assert!(findings(&[]).is_empty());
        assert!(quality_ranking(&[], 5).is_empty());
    }

    #[test]
    fn test_totals() {
        let records = records();
        let derived: Vec<_> = records
            .iter()
            .map(|r| derive_club(r, 1.0, ViewMode::Cash))
            .collect();

        let t = totals(&derived);
        assert_eq!(t.club_count, 3);
        assert_eq!(t.wage_bill, 450.0);
        assert_eq!(t.transfer_in, 240.0);
        assert_eq!(t.transfer_out, 100.0);
        assert_eq!(t.net_transfer, 140.0);
        assert_eq!(t.total_spend, 590.0);
        assert_eq!(t.incoming, 5);
        assert_eq!(t.reported, 2);
        assert_eq!(t.assumed, 3);
        assert_eq!(t.coverage, 0.4);
    }

    #[test]
    fn test_findings() {
        let records = records();
        let derived: Vec<_> = records
            .iter()
            .map(|r| derive_club(r, 1.0, ViewMode::Cash))
            .collect();

        let found = findings(&derived);
        assert_eq!(found.len(), 5);
        let by_kind = |kind| found.iter().find(|f| f.kind == kind).unwrap();

        assert_eq!(by_kind(FindingKind::HighestSpend).club_id, "c");
        assert_eq!(by_kind(FindingKind::NetBuyer).club_id, "c");
        assert_eq!(by_kind(FindingKind::NetSeller).club_id, "b");
        assert_eq!(by_kind(FindingKind::NetSeller).value, -20.0);
        assert_eq!(by_kind(FindingKind::LowestCoverage).club_id, "c");
        assert_eq!(by_kind(FindingKind::HighestWageShare).club_id, "a");
    }

    #[test]
    fn test_ties_go_to_first_in_list() {
        let records = vec![
            club("x", 100.0, Vec::new(), 0.0),
            club("y", 100.0, Vec::new(), 0.0),
        ];
        let derived: Vec<_> = records
            .iter()
            .map(|r| derive_club(r, 1.0, ViewMode::PnlProxy))
            .collect();

        for finding in findings(&derived) {
            assert_eq!(finding.club_id, "x", "{:?}", finding.kind);
        }
    }

    #[test]
    fn test_quality_ranking() {
        let records = records();
        let derived: Vec<_> = records
            .iter()
            .map(|r| derive_club(r, 1.0, ViewMode::PnlProxy))
            .collect();

        let ranking = quality_ranking(&derived, 2);
        assert_eq!(ranking.len(), 2);
        assert_eq!(ranking[0].club_id, "c");
        assert_eq!(ranking[0].pressure, 2.0);
        assert_eq!(ranking[1].club_id, "b");
        assert_eq!(ranking[1].assumption_rate, 0.5);
    }
}
