//! Amortization and contract-confidence resolution
//!
//! A club's annual transfer cost comes from one of two places:
//! - the upstream amortization summary, which can include assets signed in
//!   earlier seasons (carryover) that this snapshot's transfer list never shows
//! - a fallback sum of fee / contract years over the listed incoming transfers
//!
//! The choice is made here and nowhere else.

use crate::snapshot::{ClubRecord, IncomingTransfer};

/// Contract length used when a transfer carries none
pub const DEFAULT_CONTRACT_YEARS: f64 = 4.0;

// =============================================================================
// Contract confidence
// =============================================================================

/// How much the contract length of a signing can be trusted
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ContractConfidence {
    Reported,
    ReportedFuzzyMatch,
    ReportedLoan,
    Override,
    Assumed,
}

impl ContractConfidence {
    /// Parse an upstream tag; anything unrecognised (or missing) is assumed
    pub fn from_tag(tag: Option<&str>) -> Self {
        match tag.map(|t| t.trim().to_ascii_lowercase()).as_deref() {
            Some("reported") => Self::Reported,
            Some("reported_fuzzy_match") => Self::ReportedFuzzyMatch,
            Some("reported_loan") => Self::ReportedLoan,
            Some("override") => Self::Override,
            _ => Self::Assumed,
        }
    }

    pub fn is_reported(self) -> bool {
        !matches!(self, Self::Assumed)
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Reported => "reported",
            Self::ReportedFuzzyMatch => "reported_fuzzy_match",
            Self::ReportedLoan => "reported_loan",
            Self::Override => "override",
            Self::Assumed => "assumed",
        }
    }
}

impl IncomingTransfer {
    pub fn confidence(&self) -> ContractConfidence {
        ContractConfidence::from_tag(self.contract_confidence.as_deref())
    }

    /// Contract length in years, falling back to [`DEFAULT_CONTRACT_YEARS`]
    pub fn resolved_years(&self) -> f64 {
        match self.contract_years {
            Some(years) if years > 0.0 => years,
            _ => DEFAULT_CONTRACT_YEARS,
        }
    }

    /// Fee spread evenly over the contract, in base currency
    pub fn annual_cost(&self) -> f64 {
        self.fee / self.resolved_years()
    }
}

// =============================================================================
// Amortization
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AmortizationSource {
    /// Upstream summary, may include multi-season carryover
    Authoritative,
    /// Computed from this snapshot's incoming transfers only
    Fallback,
}

/// Active annual amortized transfer cost, base currency.
/// `current + carryover == total` always holds.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AmortizationBreakdown {
    pub current: f64,
    pub carryover: f64,
    pub total: f64,
    pub source: AmortizationSource,
}

/// Sum of fee / years over the incoming transfers
pub fn fallback_amortization(club: &ClubRecord) -> f64 {
    club.incoming.iter().map(IncomingTransfer::annual_cost).sum()
}

/// Resolve a club's annual amortization, preferring the upstream summary
pub fn resolve_amortization(club: &ClubRecord) -> AmortizationBreakdown {
    let Some(summary) = &club.amortization else {
        let total = fallback_amortization(club);
        return AmortizationBreakdown {
            current: total,
            carryover: 0.0,
            total,
            source: AmortizationSource::Fallback,
        };
    };

    let (current, carryover) = match (summary.current_window_annual, summary.prior_window_annual) {
        (None, None) => {
            // Summary without components: explicit total, else the fallback sum
            let total = summary
                .total_annual
                .unwrap_or_else(|| fallback_amortization(club));
            (total, 0.0)
        }
        (current, carryover) => (current.unwrap_or(0.0), carryover.unwrap_or(0.0)),
    };

    log::debug!(
        "{}: authoritative amortization {:.0} current + {:.0} carryover",
        club.id,
        current,
        carryover
    );

    AmortizationBreakdown {
        current,
        carryover,
        total: current + carryover,
        source: AmortizationSource::Authoritative,
    }
}

// =============================================================================
// Confidence
// =============================================================================

/// How many incoming deals rest on reported vs. assumed contract lengths
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ConfidenceBreakdown {
    pub incoming: usize,
    pub reported: usize,
    /// Never below the inferred count, never above `incoming`
    pub assumed: usize,
    /// reported / incoming, 1.0 with no incoming deals
    pub coverage: f64,
}

pub fn resolve_confidence(club: &ClubRecord) -> ConfidenceBreakdown {
    let incoming = club.incoming.len();
    let reported = club
        .incoming
        .iter()
        .filter(|t| t.confidence().is_reported())
        .count();

    let inferred = incoming.saturating_sub(reported);
    let explicit = club
        .confidence_summary
        .as_ref()
        .and_then(|s| s.assumed_contracts)
        .unwrap_or(0);

    // Trust the larger count so assumption risk is never under-reported
    let assumed = explicit.max(inferred).min(incoming);

    let coverage = if incoming == 0 {
        1.0
    } else {
        (reported as f64 / incoming as f64).clamp(0.0, 1.0)
    };

    ConfidenceBreakdown {
        incoming,
        reported,
        assumed,
        coverage,
    }
}

// =============================================================================
// Drill-down
// =============================================================================

/// One row of a club's amortization drill-down, converted to the target currency
#[derive(Debug, Clone, PartialEq)]
pub struct AssetRow {
    pub player: String,
    pub annual_cost: f64,
    pub fee: Option<f64>,
    pub contract_years: Option<f64>,
    pub start_season: Option<String>,
    pub remaining_years: Option<f64>,
    pub window: String,
    pub carryover: bool,
}

/// Per-player annual costs, largest first.
///
/// Uses the club's asset list when present; otherwise rows are built from the
/// incoming transfers so the drill-down still matches the fallback total.
pub fn asset_rows(club: &ClubRecord, multiplier: f64) -> Vec<AssetRow> {
    let mut rows: Vec<AssetRow> = match &club.amortization_assets {
        Some(assets) => assets
            .iter()
            .map(|a| AssetRow {
                player: a.player.clone(),
                annual_cost: a.annual_cost * multiplier,
                fee: a.fee.map(|f| f * multiplier),
                contract_years: a.contract_years,
                start_season: a.start_season.clone(),
                remaining_years: a.remaining_years,
                window: a.window.clone(),
                carryover: a.carryover,
            })
            .collect(),
        None => club
            .incoming
            .iter()
            .map(|t| AssetRow {
                player: t.player.clone(),
                annual_cost: t.annual_cost() * multiplier,
                fee: Some(t.fee * multiplier),
                contract_years: Some(t.resolved_years()),
                start_season: Some(club.season.clone()).filter(|s| !s.is_empty()),
                remaining_years: None,
                window: t.window.clone(),
                carryover: false,
            })
            .collect(),
    };

    rows.sort_by(|a, b| b.annual_cost.total_cmp(&a.annual_cost));
    rows
}
