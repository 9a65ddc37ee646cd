//! View configuration
//!
//! Every knob a caller can turn lives in one [`ViewConfig`] value that is
//! passed into each derivation and filter call. Nothing is held globally.

use std::fmt;

use crate::currency::currency_multiplier;
use crate::metrics::ViewMode;
use crate::snapshot::{ClubRecord, DEFAULT_BASE_CURRENCY, Snapshot};
use crate::sort::{ClubSortField, SortState, TransferSortField};

/// League or season filter
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum ScopeFilter {
    /// Pass-through
    #[default]
    All,
    Only(String),
}

impl ScopeFilter {
    /// `All` (any case) or an empty string means no filter
    pub fn parse(value: &str) -> Self {
        let value = value.trim();
        if value.is_empty() || value.eq_ignore_ascii_case("all") {
            ScopeFilter::All
        } else {
            ScopeFilter::Only(value.to_string())
        }
    }

    pub fn matches(&self, value: &str) -> bool {
        match self {
            ScopeFilter::All => true,
            ScopeFilter::Only(wanted) => wanted == value,
        }
    }
}

impl fmt::Display for ScopeFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ScopeFilter::All => write!(f, "All"),
            ScopeFilter::Only(value) => write!(f, "{}", value),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ViewConfig {
    /// Target currency code
    pub currency: String,
    pub view_mode: ViewMode,
    pub league: ScopeFilter,
    pub season: ScopeFilter,
    /// Case-insensitive substring matched against club names; transfer rows
    /// inherit the filtered clubs and are not matched by player
    pub search: String,
    pub club_sort: SortState<ClubSortField>,
    pub incoming_sort: SortState<TransferSortField>,
    pub outgoing_sort: SortState<TransferSortField>,
}

impl Default for ViewConfig {
    fn default() -> Self {
        Self {
            currency: DEFAULT_BASE_CURRENCY.to_string(),
            view_mode: ViewMode::default(),
            league: ScopeFilter::All,
            season: ScopeFilter::All,
            search: String::new(),
            club_sort: SortState::new(ClubSortField::default()),
            incoming_sort: SortState::new(TransferSortField::default()),
            outgoing_sort: SortState::new(TransferSortField::default()),
        }
    }
}

impl ViewConfig {
    /// Defaults for a snapshot: its base currency and its default scope
    pub fn for_snapshot(snapshot: &Snapshot) -> Self {
        let scope = |value: &Option<String>| {
            value
                .as_deref()
                .map(ScopeFilter::parse)
                .unwrap_or_default()
        };

        Self {
            currency: snapshot.base_currency().to_string(),
            league: scope(&snapshot.scope.league),
            season: scope(&snapshot.scope.season),
            ..Self::default()
        }
    }

    /// Multiplier for the configured currency in this snapshot's rate table
    pub fn multiplier(&self, snapshot: &Snapshot) -> f64 {
        currency_multiplier(&self.currency, &snapshot.exchange_rates)
    }

    /// Whether a club passes the league and season filters
    pub fn in_scope(&self, club: &ClubRecord) -> bool {
        self.league.matches(&club.league) && self.season.matches(&club.season)
    }

    /// Case-insensitive substring match; an empty search matches everything
    pub fn matches_search(&self, text: &str) -> bool {
        let needle = self.search.trim();
        needle.is_empty() || text.to_lowercase().contains(&needle.to_lowercase())
    }
}
