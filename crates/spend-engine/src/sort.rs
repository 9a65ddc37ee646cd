//! Sortable fields and comparators
//!
//! Every sortable field declares its [`FieldKind`]; the comparator dispatches
//! on that declaration, never on the runtime shape of the value. Adding a
//! sortable column means adding it to one of the tables below.

use std::borrow::Cow;
use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use unicode_normalization::UnicodeNormalization;
use unicode_normalization::char::is_combining_mark;

use crate::error::ConfigError;
use crate::metrics::DerivedClub;
use crate::pipeline::TransferRow;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    /// Case-insensitive text
    Text,
    /// false < true
    Flag,
    /// Numeric; missing or non-numeric reads as 0
    Number,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortDirection {
    Ascending,
    Descending,
}

impl SortDirection {
    pub fn reversed(self) -> Self {
        match self {
            SortDirection::Ascending => SortDirection::Descending,
            SortDirection::Descending => SortDirection::Ascending,
        }
    }

    fn apply(self, ordering: Ordering) -> Ordering {
        match self {
            SortDirection::Ascending => ordering,
            SortDirection::Descending => ordering.reverse(),
        }
    }
}

impl fmt::Display for SortDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SortDirection::Ascending => write!(f, "asc"),
            SortDirection::Descending => write!(f, "desc"),
        }
    }
}

/// A raw field value handed to the comparator
#[derive(Debug, Clone, PartialEq)]
pub enum SortValue<'a> {
    Text(Cow<'a, str>),
    Flag(bool),
    Number(f64),
    Missing,
}

impl SortValue<'_> {
    fn as_number(&self) -> f64 {
        let n = match self {
            SortValue::Number(n) => *n,
            SortValue::Flag(b) => f64::from(u8::from(*b)),
            SortValue::Text(s) => s.trim().parse().unwrap_or(0.0),
            SortValue::Missing => 0.0,
        };
        if n.is_finite() { n } else { 0.0 }
    }

    fn as_flag(&self) -> bool {
        match self {
            SortValue::Flag(b) => *b,
            SortValue::Number(n) => *n != 0.0 && n.is_finite(),
            SortValue::Text(s) => !s.is_empty(),
            SortValue::Missing => false,
        }
    }

    fn as_text(&self) -> Cow<'_, str> {
        match self {
            SortValue::Text(s) => Cow::Borrowed(s.as_ref()),
            SortValue::Flag(b) => Cow::Owned(b.to_string()),
            SortValue::Number(n) => Cow::Owned(n.to_string()),
            SortValue::Missing => Cow::Borrowed(""),
        }
    }
}

/// Compare two values as the declared kind
pub fn compare_values(kind: FieldKind, a: &SortValue, b: &SortValue) -> Ordering {
    match kind {
        FieldKind::Text => {
            let (a, b) = (a.as_text(), b.as_text());
            folded(&a)
                .cmp(folded(&b))
                .then_with(|| lowercased(&a).cmp(lowercased(&b)))
        }
        FieldKind::Flag => a.as_flag().cmp(&b.as_flag()),
        FieldKind::Number => a.as_number().total_cmp(&b.as_number()),
    }
}

/// Accent-free lowercase form, so "Éibar" files under "e"
fn folded(s: &str) -> impl Iterator<Item = char> + '_ {
    s.nfkd()
        .filter(|c| !is_combining_mark(*c))
        .flat_map(char::to_lowercase)
}

fn lowercased(s: &str) -> impl Iterator<Item = char> + '_ {
    s.chars().flat_map(char::to_lowercase)
}

/// A sortable field's declared type
pub trait FieldSpec: Copy + PartialEq {
    fn kind(self) -> FieldKind;

    /// Identity and categorical (text) fields read best ascending
    fn default_direction(self) -> SortDirection {
        match self.kind() {
            FieldKind::Text => SortDirection::Ascending,
            FieldKind::Flag | FieldKind::Number => SortDirection::Descending,
        }
    }
}

/// A declared field that can be read from rows of type `R`
pub trait SortField<R>: FieldSpec {
    fn value<'r>(self, row: &'r R) -> SortValue<'r>;
}

/// Active field and direction for one sortable region
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SortState<F> {
    pub field: F,
    pub direction: SortDirection,
}

impl<F: FieldSpec> SortState<F> {
    /// Sort by `field` in its default direction
    pub fn new(field: F) -> Self {
        Self {
            field,
            direction: field.default_direction(),
        }
    }

    /// Column-header behaviour: the active field flips, a new field starts at
    /// its default direction
    pub fn select(&mut self, field: F) {
        if self.field == field {
            self.flip();
        } else {
            *self = Self::new(field);
        }
    }

    pub fn flip(&mut self) {
        self.direction = self.direction.reversed();
    }

    pub fn compare<R>(&self, a: &R, b: &R) -> Ordering
    where
        F: SortField<R>,
    {
        let ordering = compare_values(
            self.field.kind(),
            &self.field.value(a),
            &self.field.value(b),
        );
        self.direction.apply(ordering)
    }

    /// Stable sort, so ties keep their incoming order
    pub fn sort<R>(&self, rows: &mut [R])
    where
        F: SortField<R>,
    {
        rows.sort_by(|a, b| self.compare(a, b));
    }
}

// =============================================================================
// Club table fields
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ClubSortField {
    Name,
    League,
    Season,
    WageBill,
    TransferIn,
    GrossIn,
    AmortizedIn,
    Carryover,
    TransferOut,
    NetTransfer,
    #[default]
    TotalSpend,
    IncomingCount,
    OutgoingCount,
    Coverage,
    AssumedDeals,
    WageShare,
}

impl ClubSortField {
    pub const ALL: [ClubSortField; 16] = [
        Self::Name,
        Self::League,
        Self::Season,
        Self::WageBill,
        Self::TransferIn,
        Self::GrossIn,
        Self::AmortizedIn,
        Self::Carryover,
        Self::TransferOut,
        Self::NetTransfer,
        Self::TotalSpend,
        Self::IncomingCount,
        Self::OutgoingCount,
        Self::Coverage,
        Self::AssumedDeals,
        Self::WageShare,
    ];

    pub fn key(self) -> &'static str {
        match self {
            Self::Name => "name",
            Self::League => "league",
            Self::Season => "season",
            Self::WageBill => "wage_bill",
            Self::TransferIn => "transfer_in",
            Self::GrossIn => "gross_in",
            Self::AmortizedIn => "amortized_in",
            Self::Carryover => "carryover",
            Self::TransferOut => "transfer_out",
            Self::NetTransfer => "net_transfer",
            Self::TotalSpend => "total_spend",
            Self::IncomingCount => "incoming",
            Self::OutgoingCount => "outgoing",
            Self::Coverage => "coverage",
            Self::AssumedDeals => "assumed",
            Self::WageShare => "wage_share",
        }
    }
}

impl FieldSpec for ClubSortField {
    fn kind(self) -> FieldKind {
        match self {
            Self::Name | Self::League | Self::Season => FieldKind::Text,
            _ => FieldKind::Number,
        }
    }
}

impl<'a> SortField<DerivedClub<'a>> for ClubSortField {
    fn value<'r>(self, club: &'r DerivedClub<'a>) -> SortValue<'r> {
        match self {
            Self::Name => SortValue::Text(Cow::Borrowed(&club.record.name)),
            Self::League => SortValue::Text(Cow::Borrowed(&club.record.league)),
            Self::Season => SortValue::Text(Cow::Borrowed(&club.record.season)),
            Self::WageBill => SortValue::Number(club.wage_bill),
            Self::TransferIn => SortValue::Number(club.transfer_in),
            Self::GrossIn => SortValue::Number(club.gross_in),
            Self::AmortizedIn => SortValue::Number(club.amortized_in),
            Self::Carryover => SortValue::Number(club.amortized_carryover),
            Self::TransferOut => SortValue::Number(club.transfer_out),
            Self::NetTransfer => SortValue::Number(club.net_transfer),
            Self::TotalSpend => SortValue::Number(club.total_spend),
            Self::IncomingCount => SortValue::Number(club.incoming_count as f64),
            Self::OutgoingCount => SortValue::Number(club.outgoing_count as f64),
            Self::Coverage => SortValue::Number(club.contract_coverage),
            Self::AssumedDeals => SortValue::Number(club.assumed_deals as f64),
            Self::WageShare => SortValue::Number(club.wage_share),
        }
    }
}

impl FromStr for ClubSortField {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let key = s.trim().to_ascii_lowercase().replace('-', "_");
        let alias = match key.as_str() {
            "club" | "team" | "team_name" => Some(Self::Name),
            "wages" => Some(Self::WageBill),
            "net" => Some(Self::NetTransfer),
            "total" | "spend" => Some(Self::TotalSpend),
            "contract_coverage" => Some(Self::Coverage),
            "assumed_deals" => Some(Self::AssumedDeals),
            _ => None,
        };
        alias
            .or_else(|| Self::ALL.into_iter().find(|f| f.key() == key))
            .ok_or_else(|| ConfigError::UnknownSortField(s.to_string()))
    }
}

// =============================================================================
// Transfer view fields (incoming and outgoing)
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TransferSortField {
    Player,
    Club,
    #[default]
    Fee,
    ContractYears,
    AnnualCost,
    Confidence,
    Window,
    Loan,
    Age,
    Position,
}

impl TransferSortField {
    pub const ALL: [TransferSortField; 10] = [
        Self::Player,
        Self::Club,
        Self::Fee,
        Self::ContractYears,
        Self::AnnualCost,
        Self::Confidence,
        Self::Window,
        Self::Loan,
        Self::Age,
        Self::Position,
    ];

    pub fn key(self) -> &'static str {
        match self {
            Self::Player => "player",
            Self::Club => "club",
            Self::Fee => "fee",
            Self::ContractYears => "years",
            Self::AnnualCost => "annual_cost",
            Self::Confidence => "confidence",
            Self::Window => "window",
            Self::Loan => "loan",
            Self::Age => "age",
            Self::Position => "position",
        }
    }
}

impl FieldSpec for TransferSortField {
    fn kind(self) -> FieldKind {
        match self {
            Self::Player | Self::Club | Self::Confidence | Self::Window | Self::Position => {
                FieldKind::Text
            }
            Self::Loan => FieldKind::Flag,
            Self::Fee | Self::ContractYears | Self::AnnualCost | Self::Age => FieldKind::Number,
        }
    }
}

impl SortField<TransferRow> for TransferSortField {
    fn value<'r>(self, row: &'r TransferRow) -> SortValue<'r> {
        let number = |n: Option<f64>| n.map_or(SortValue::Missing, SortValue::Number);
        let text = |s: &'r Option<String>| {
            s.as_deref()
                .map_or(SortValue::Missing, |s| SortValue::Text(Cow::Borrowed(s)))
        };

        match self {
            Self::Player => SortValue::Text(Cow::Borrowed(&row.player)),
            Self::Club => SortValue::Text(Cow::Borrowed(&row.club_name)),
            Self::Fee => SortValue::Number(row.fee),
            Self::ContractYears => number(row.contract_years),
            Self::AnnualCost => number(row.annual_cost),
            Self::Confidence => text(&row.confidence),
            Self::Window => SortValue::Text(Cow::Borrowed(&row.window)),
            Self::Loan => SortValue::Flag(row.is_loan),
            Self::Age => number(row.age.map(f64::from)),
            Self::Position => text(&row.position),
        }
    }
}

impl FromStr for TransferSortField {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let key = s.trim().to_ascii_lowercase().replace('-', "_");
        let alias = match key.as_str() {
            "name" => Some(Self::Player),
            "team" => Some(Self::Club),
            "contract_years" => Some(Self::ContractYears),
            "annual" | "amortized" => Some(Self::AnnualCost),
            "contract_confidence" => Some(Self::Confidence),
            "is_loan" => Some(Self::Loan),
            _ => None,
        };
        alias
            .or_else(|| Self::ALL.into_iter().find(|f| f.key() == key))
            .ok_or_else(|| ConfigError::UnknownSortField(s.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn text(s: &str) -> SortValue<'_> {
        SortValue::Text(Cow::Borrowed(s))
    }

    #[test]
    fn test_text_is_case_insensitive() {
        assert_eq!(
            compare_values(FieldKind::Text, &text("arsenal"), &text("Arsenal")),
            Ordering::Equal
        );
        assert_eq!(
            compare_values(FieldKind::Text, &text("arsenal"), &text("Brentford")),
            Ordering::Less
        );
    }

    #[test]
    fn test_text_folds_accents() {
        assert_eq!(
            compare_values(FieldKind::Text, &text("Éibar"), &text("Fulham")),
            Ordering::Less
        );
        assert_eq!(
            compare_values(FieldKind::Text, &text("Óscar"), &text("Pedro")),
            Ordering::Less
        );
        assert_eq!(
            compare_values(FieldKind::Text, &text("Müller"), &text("Mykolenko")),
            Ordering::Less
        );
        // Accents only break ties between otherwise equal names
        assert_eq!(
            compare_values(FieldKind::Text, &text("Jose"), &text("José")),
            Ordering::Less
        );
        assert_eq!(
            compare_values(FieldKind::Text, &text("josé"), &text("JOSÉ")),
            Ordering::Equal
        );
    }

    #[test]
    fn test_numbers_treat_missing_as_zero() {
        assert_eq!(
            compare_values(FieldKind::Number, &SortValue::Missing, &SortValue::Number(0.0)),
            Ordering::Equal
        );
        assert_eq!(
            compare_values(FieldKind::Number, &SortValue::Number(f64::NAN), &SortValue::Number(1.0)),
            Ordering::Less
        );
        assert_eq!(
            compare_values(FieldKind::Number, &text("n/a"), &SortValue::Number(-1.0)),
            Ordering::Greater
        );
    }

    #[test]
    fn test_flags_order_false_first() {
        assert_eq!(
            compare_values(FieldKind::Flag, &SortValue::Flag(false), &SortValue::Flag(true)),
            Ordering::Less
        );
    }

    #[test]
    fn test_default_directions() {
        assert_eq!(
            SortState::new(ClubSortField::Name).direction,
            SortDirection::Ascending
        );
        assert_eq!(
            SortState::new(ClubSortField::TotalSpend).direction,
            SortDirection::Descending
        );
        for field in [
            TransferSortField::Player,
            TransferSortField::Window,
            TransferSortField::Confidence,
        ] {
            assert_eq!(
                SortState::new(field).direction,
                SortDirection::Ascending
            );
        }
        assert_eq!(
            SortState::new(TransferSortField::Loan).direction,
            SortDirection::Descending
        );
    }

    #[test]
    fn test_select_flips_then_resets() {
        let mut state = SortState::new(TransferSortField::Fee);
        state.select(TransferSortField::Fee);
        assert_eq!(state.direction, SortDirection::Ascending);

        state.select(TransferSortField::Player);
        assert_eq!(state.field, TransferSortField::Player);
        assert_eq!(state.direction, SortDirection::Ascending);
    }

    #[test]
    fn test_parse_fields() {
        assert_eq!("Total".parse::<ClubSortField>(), Ok(ClubSortField::TotalSpend));
        assert_eq!("wage-share".parse::<ClubSortField>(), Ok(ClubSortField::WageShare));
        assert_eq!("annual_cost".parse::<TransferSortField>(), Ok(TransferSortField::AnnualCost));
        assert!("shirt_number".parse::<TransferSortField>().is_err());
    }
}
