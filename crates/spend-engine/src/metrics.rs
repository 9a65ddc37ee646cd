//! Per-club metric derivation
//!
//! A derived club is a pure function of (raw record, currency multiplier, view
//! mode). Nothing here is cached: callers derive again whenever any input
//! changes. Conversion happens on the way out, so the raw record always stays
//! in base currency.

use std::fmt;
use std::str::FromStr;

use crate::amortization::{AmortizationSource, resolve_amortization, resolve_confidence};
use crate::error::ConfigError;
use crate::snapshot::ClubRecord;

/// Which transfer-in figure drives the net and total spend metrics
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ViewMode {
    /// Full fees in the season they were paid
    Cash,
    /// Fees spread over contract length, plus prior-window carryover
    #[default]
    PnlProxy,
}

impl ViewMode {
    pub fn label(self) -> &'static str {
        match self {
            ViewMode::Cash => "cash",
            ViewMode::PnlProxy => "pnl_proxy",
        }
    }
}

impl fmt::Display for ViewMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ViewMode::Cash => write!(f, "Cash"),
            ViewMode::PnlProxy => write!(f, "P&L proxy"),
        }
    }
}

impl FromStr for ViewMode {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "cash" => Ok(ViewMode::Cash),
            "pnl_proxy" | "pnl-proxy" | "pnl" => Ok(ViewMode::PnlProxy),
            _ => Err(ConfigError::UnknownViewMode(s.to_string())),
        }
    }
}

/// A club's comparable metrics in the target currency
#[derive(Debug, Clone)]
pub struct DerivedClub<'a> {
    pub record: &'a ClubRecord,
    pub view_mode: ViewMode,
    /// Currency multiplier applied to every money field
    pub multiplier: f64,

    // Money, converted
    pub wage_bill: f64,
    pub gross_in: f64,
    pub amortized_current: f64,
    pub amortized_carryover: f64,
    pub amortized_in: f64,
    pub transfer_out: f64,
    /// gross_in in cash mode, amortized_in in P&L proxy mode
    pub transfer_in: f64,
    pub net_transfer: f64,
    pub total_spend: f64,

    // Counts and ratios, currency independent
    pub incoming_count: usize,
    pub outgoing_count: usize,
    pub reported_count: usize,
    pub assumed_deals: usize,
    pub contract_coverage: f64,
    pub wage_share: f64,
    pub amortization_source: AmortizationSource,
}

impl DerivedClub<'_> {
    pub fn id(&self) -> &str {
        &self.record.id
    }

    pub fn name(&self) -> &str {
        &self.record.name
    }

    /// Share of incoming deals resting on assumed contract lengths
    pub fn assumption_rate(&self) -> f64 {
        self.assumed_deals as f64 / self.incoming_count.max(1) as f64
    }
}

/// Derive one club's metrics
pub fn derive_club(club: &ClubRecord, multiplier: f64, mode: ViewMode) -> DerivedClub<'_> {
    let amortization = resolve_amortization(club);
    let confidence = resolve_confidence(club);

    let gross_in: f64 = club.incoming.iter().map(|t| t.fee).sum();
    let gross_out: f64 = club.outgoing.iter().map(|t| t.fee).sum();

    let transfer_in = match mode {
        ViewMode::Cash => gross_in,
        ViewMode::PnlProxy => amortization.total,
    };
    let net_transfer = transfer_in - gross_out;
    let total_spend = club.wage_bill + net_transfer;

    // Structural cost base: always amortized, whatever the view mode
    let commitment = club.wage_bill + amortization.total;
    let wage_share = if commitment > 0.0 {
        (club.wage_bill / commitment).clamp(0.0, 1.0)
    } else {
        0.0
    };

    DerivedClub {
        record: club,
        view_mode: mode,
        multiplier,
        wage_bill: club.wage_bill * multiplier,
        gross_in: gross_in * multiplier,
        amortized_current: amortization.current * multiplier,
        amortized_carryover: amortization.carryover * multiplier,
        amortized_in: amortization.total * multiplier,
        transfer_out: gross_out * multiplier,
        transfer_in: transfer_in * multiplier,
        net_transfer: net_transfer * multiplier,
        total_spend: total_spend * multiplier,
        incoming_count: confidence.incoming,
        outgoing_count: club.outgoing.len(),
        reported_count: confidence.reported,
        assumed_deals: confidence.assumed,
        contract_coverage: confidence.coverage,
        wage_share,
        amortization_source: amortization.source,
    }
}
