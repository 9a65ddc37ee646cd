//! Raw snapshot model
//!
//! The snapshot is produced by an upstream scraping pipeline and is the
//! authority on data validity. Numbers are coerced leniently: anything that is
//! not a finite number (or a string holding one) reads as 0, or as absent for
//! optional fields. Only a document that is not JSON, or has no `clubs` array,
//! is rejected.

use serde::Deserialize;
use serde_json::Value;
use std::collections::BTreeMap;

use crate::error::{SnapshotError, SnapshotResult};

/// Base currency assumed when the snapshot does not name one
pub const DEFAULT_BASE_CURRENCY: &str = "GBP";

// =============================================================================
// Document
// =============================================================================

/// A full data snapshot as published by the upstream pipeline
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Snapshot {
    #[serde(default, deserialize_with = "lenient::text")]
    pub last_updated: String,
    #[serde(default, deserialize_with = "lenient::text")]
    pub generated_at_utc: String,
    #[serde(default, deserialize_with = "lenient::optional_text")]
    pub base_currency: Option<String>,
    /// Currency code -> multiplier from the base currency
    #[serde(default, deserialize_with = "lenient::rates")]
    pub exchange_rates: BTreeMap<String, f64>,
    #[serde(default, deserialize_with = "lenient::or_default")]
    pub scope: ScopeDefaults,
    #[serde(default, deserialize_with = "lenient::or_default")]
    pub methodology: Methodology,
    #[serde(default, deserialize_with = "lenient::list")]
    pub sources: Vec<SourceRef>,
    #[serde(deserialize_with = "lenient::list")]
    pub clubs: Vec<ClubRecord>,
}

/// Default league/season labels the snapshot was built for
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ScopeDefaults {
    #[serde(default, deserialize_with = "lenient::optional_text")]
    pub league: Option<String>,
    #[serde(default, deserialize_with = "lenient::optional_text")]
    pub season: Option<String>,
    #[serde(default, deserialize_with = "lenient::optional_whole")]
    pub season_year: Option<u32>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Methodology {
    #[serde(default, deserialize_with = "lenient::text")]
    pub summary: String,
    #[serde(default, deserialize_with = "lenient::text")]
    pub contract_length_fallback: String,
    #[serde(default, deserialize_with = "lenient::optional_number")]
    pub contract_coverage_reported_percent: Option<f64>,
    #[serde(default, deserialize_with = "lenient::list")]
    pub notes: Vec<String>,
}

/// Attribution for one upstream data source
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SourceRef {
    #[serde(default, deserialize_with = "lenient::text")]
    pub id: String,
    #[serde(default, deserialize_with = "lenient::text")]
    pub name: String,
    #[serde(default, deserialize_with = "lenient::text")]
    pub url: String,
    #[serde(rename = "type", default, deserialize_with = "lenient::text")]
    pub kind: String,
}

// =============================================================================
// Club records
// =============================================================================

/// One club in one league season, in base currency
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ClubRecord {
    #[serde(rename = "team_id", default, deserialize_with = "lenient::text")]
    pub id: String,
    #[serde(rename = "team_name", default, deserialize_with = "lenient::text")]
    pub name: String,
    #[serde(default, deserialize_with = "lenient::text")]
    pub league: String,
    #[serde(default, deserialize_with = "lenient::text")]
    pub season: String,
    /// Annual gross wage bill
    #[serde(default, deserialize_with = "lenient::number")]
    pub wage_bill: f64,
    #[serde(default, deserialize_with = "lenient::optional_text")]
    pub wage_source: Option<String>,
    #[serde(rename = "transfers_in", default, deserialize_with = "lenient::list")]
    pub incoming: Vec<IncomingTransfer>,
    #[serde(rename = "transfers_out", default, deserialize_with = "lenient::list")]
    pub outgoing: Vec<OutgoingTransfer>,
    #[serde(default, deserialize_with = "lenient::optional")]
    pub amortization: Option<AmortizationSummary>,
    #[serde(default, deserialize_with = "lenient::optional")]
    pub confidence_summary: Option<ConfidenceSummary>,
    /// Per-player annualized costs, only used for drill-down
    #[serde(default, deserialize_with = "lenient::optional_list")]
    pub amortization_assets: Option<Vec<AmortizationAsset>>,
}

/// A signing into the club
#[derive(Debug, Clone, Default, Deserialize)]
pub struct IncomingTransfer {
    #[serde(default, deserialize_with = "lenient::text")]
    pub player: String,
    #[serde(default, deserialize_with = "lenient::number")]
    pub fee: f64,
    /// Resolved contract length; loans are already set to 1 upstream
    #[serde(default, deserialize_with = "lenient::optional_number")]
    pub contract_years: Option<f64>,
    #[serde(default, deserialize_with = "lenient::optional_text")]
    pub contract_confidence: Option<String>,
    #[serde(default, deserialize_with = "lenient::optional_text")]
    pub contract_note: Option<String>,
    #[serde(default, deserialize_with = "lenient::optional_whole")]
    pub age: Option<u32>,
    #[serde(default, deserialize_with = "lenient::optional_text")]
    pub position: Option<String>,
    #[serde(default, deserialize_with = "lenient::flag")]
    pub is_loan: bool,
    #[serde(default, deserialize_with = "lenient::text")]
    pub window: String,
    #[serde(default, deserialize_with = "lenient::optional_text")]
    pub source: Option<String>,
}

/// A sale out of the club
#[derive(Debug, Clone, Default, Deserialize)]
pub struct OutgoingTransfer {
    #[serde(default, deserialize_with = "lenient::text")]
    pub player: String,
    #[serde(default, deserialize_with = "lenient::number")]
    pub fee: f64,
    #[serde(default, deserialize_with = "lenient::optional_whole")]
    pub age: Option<u32>,
    #[serde(default, deserialize_with = "lenient::optional_text")]
    pub position: Option<String>,
    #[serde(default, deserialize_with = "lenient::flag")]
    pub is_loan: bool,
    #[serde(default, deserialize_with = "lenient::text")]
    pub window: String,
    #[serde(default, deserialize_with = "lenient::optional_text")]
    pub source: Option<String>,
}

/// Authoritative annual amortization computed upstream.
/// May include assets signed before the transfers listed in this snapshot.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AmortizationSummary {
    #[serde(alias = "current", default, deserialize_with = "lenient::optional_number")]
    pub current_window_annual: Option<f64>,
    #[serde(alias = "carryover", default, deserialize_with = "lenient::optional_number")]
    pub prior_window_annual: Option<f64>,
    #[serde(alias = "total", default, deserialize_with = "lenient::optional_number")]
    pub total_annual: Option<f64>,
}

/// Contract-confidence counts as reported by the upstream pipeline
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ConfidenceSummary {
    #[serde(default, deserialize_with = "lenient::count")]
    pub reported_contracts: usize,
    #[serde(default, deserialize_with = "lenient::count")]
    pub fuzzy_reported_contracts: usize,
    #[serde(default, deserialize_with = "lenient::count")]
    pub override_contracts: usize,
    #[serde(default, deserialize_with = "lenient::optional_count")]
    pub assumed_contracts: Option<usize>,
    #[serde(default, deserialize_with = "lenient::count")]
    pub incoming_count: usize,
}

/// One player's annualized transfer cost
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AmortizationAsset {
    #[serde(default, deserialize_with = "lenient::text")]
    pub player: String,
    #[serde(default, deserialize_with = "lenient::number")]
    pub annual_cost: f64,
    #[serde(default, deserialize_with = "lenient::optional_number")]
    pub fee: Option<f64>,
    #[serde(default, deserialize_with = "lenient::optional_number")]
    pub contract_years: Option<f64>,
    #[serde(default, deserialize_with = "lenient::optional_text")]
    pub start_season: Option<String>,
    #[serde(default, deserialize_with = "lenient::optional_number")]
    pub remaining_years: Option<f64>,
    #[serde(default, deserialize_with = "lenient::text")]
    pub window: String,
    /// Signed in a prior window and still being recognized this season
    #[serde(default, deserialize_with = "lenient::flag")]
    pub carryover: bool,
}

impl Snapshot {
    /// Parse a snapshot document
    pub fn from_json(body: &str) -> SnapshotResult<Self> {
        let value: Value = serde_json::from_str(body)?;
        if !value.get("clubs").is_some_and(Value::is_array) {
            return Err(SnapshotError::MissingClubs);
        }
        let snapshot: Snapshot = serde_json::from_value(value)?;
        log::debug!(
            "Parsed snapshot with {} clubs and {} exchange rates",
            snapshot.clubs.len(),
            snapshot.exchange_rates.len()
        );
        Ok(snapshot)
    }

    /// Look up a club by identifier
    pub fn club(&self, id: &str) -> Option<&ClubRecord> {
        self.clubs.iter().find(|c| c.id == id)
    }

    /// Distinct league labels in first-seen order
    pub fn leagues(&self) -> Vec<&str> {
        distinct(self.clubs.iter().map(|c| c.league.as_str()))
    }

    /// Distinct season labels in first-seen order
    pub fn seasons(&self) -> Vec<&str> {
        distinct(self.clubs.iter().map(|c| c.season.as_str()))
    }

    pub fn base_currency(&self) -> &str {
        self.base_currency
            .as_deref()
            .unwrap_or(DEFAULT_BASE_CURRENCY)
    }

    /// Currency codes offered by the rate table, base currency included
    pub fn currencies(&self) -> Vec<&str> {
        let mut codes: Vec<&str> = self.exchange_rates.keys().map(String::as_str).collect();
        let base = self.base_currency();
        if !codes.iter().any(|c| c.eq_ignore_ascii_case(base)) {
            codes.push(base);
        }
        codes.sort_unstable();
        codes
    }
}

fn distinct<'a>(values: impl Iterator<Item = &'a str>) -> Vec<&'a str> {
    let mut seen: Vec<&str> = Vec::new();
    for value in values {
        if !value.is_empty() && !seen.contains(&value) {
            seen.push(value);
        }
    }
    seen
}

// =============================================================================
// Lenient field coercion
// =============================================================================

mod lenient {
    use serde::de::DeserializeOwned;
    use serde::{Deserialize, Deserializer};
    use serde_json::Value;
    use std::collections::BTreeMap;

    /// Finite number from a JSON number or numeric string
    fn coerce(value: &Value) -> Option<f64> {
        let n = match value {
            Value::Number(n) => n.as_f64(),
            Value::String(s) => s.trim().parse::<f64>().ok(),
            _ => None,
        }?;
        n.is_finite().then_some(n)
    }

    pub fn number<'de, D: Deserializer<'de>>(d: D) -> Result<f64, D::Error> {
        Ok(coerce(&Value::deserialize(d)?).unwrap_or(0.0))
    }

    pub fn optional_number<'de, D: Deserializer<'de>>(d: D) -> Result<Option<f64>, D::Error> {
        Ok(coerce(&Value::deserialize(d)?))
    }

    pub fn count<'de, D: Deserializer<'de>>(d: D) -> Result<usize, D::Error> {
        Ok(number(d)?.max(0.0).floor() as usize)
    }

    pub fn optional_count<'de, D: Deserializer<'de>>(d: D) -> Result<Option<usize>, D::Error> {
        Ok(optional_number(d)?.map(|n| n.max(0.0).floor() as usize))
    }

    pub fn optional_whole<'de, D: Deserializer<'de>>(d: D) -> Result<Option<u32>, D::Error> {
        Ok(optional_number(d)?
            .filter(|n| *n >= 0.0)
            .map(|n| n.round() as u32))
    }

    pub fn flag<'de, D: Deserializer<'de>>(d: D) -> Result<bool, D::Error> {
        Ok(match Value::deserialize(d)? {
            Value::Bool(b) => b,
            Value::Number(n) => n.as_f64().is_some_and(|n| n != 0.0),
            Value::String(s) => matches!(s.trim().to_ascii_lowercase().as_str(), "1" | "true" | "yes"),
            _ => false,
        })
    }

    pub fn text<'de, D: Deserializer<'de>>(d: D) -> Result<String, D::Error> {
        Ok(optional_text(d)?.unwrap_or_default())
    }

    pub fn optional_text<'de, D: Deserializer<'de>>(d: D) -> Result<Option<String>, D::Error> {
        Ok(match Value::deserialize(d)? {
            Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
            Value::Number(n) => Some(n.to_string()),
            _ => None,
        })
    }

    /// Rate table; entries that are not usable numbers are dropped
    pub fn rates<'de, D: Deserializer<'de>>(d: D) -> Result<BTreeMap<String, f64>, D::Error> {
        let Value::Object(map) = Value::deserialize(d)? else {
            return Ok(BTreeMap::new());
        };
        Ok(map
            .iter()
            .filter_map(|(code, rate)| coerce(rate).map(|r| (code.trim().to_ascii_uppercase(), r)))
            .collect())
    }

    /// Nested object that falls back to absent when it has the wrong shape
    pub fn optional<'de, D, T>(d: D) -> Result<Option<T>, D::Error>
    where
        D: Deserializer<'de>,
        T: DeserializeOwned,
    {
        let value = Value::deserialize(d)?;
        if value.is_null() {
            return Ok(None);
        }
        match serde_json::from_value(value) {
            Ok(v) => Ok(Some(v)),
            Err(e) => {
                log::warn!("Ignoring malformed snapshot field: {}", e);
                Ok(None)
            }
        }
    }

    pub fn or_default<'de, D, T>(d: D) -> Result<T, D::Error>
    where
        D: Deserializer<'de>,
        T: DeserializeOwned + Default,
    {
        Ok(optional(d)?.unwrap_or_default())
    }

    /// List whose malformed items are skipped rather than failing the document
    pub fn list<'de, D, T>(d: D) -> Result<Vec<T>, D::Error>
    where
        D: Deserializer<'de>,
        T: DeserializeOwned,
    {
        Ok(optional_list(d)?.unwrap_or_default())
    }

    /// Like [`list`], but a missing or non-array value stays absent
    pub fn optional_list<'de, D, T>(d: D) -> Result<Option<Vec<T>>, D::Error>
    where
        D: Deserializer<'de>,
        T: DeserializeOwned,
    {
        let Value::Array(items) = Value::deserialize(d)? else {
            return Ok(None);
        };
        Ok(Some(
            items
                .into_iter()
                .filter_map(|item| match serde_json::from_value(item) {
                    Ok(v) => Some(v),
                    Err(e) => {
                        log::warn!("Skipping malformed snapshot entry: {}", e);
                        None
                    }
                })
                .collect(),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_clubs_is_rejected() {
        let err = Snapshot::from_json(r#"{"exchange_rates": {"EUR": 1.16}}"#).unwrap_err();
        assert!(matches!(err, SnapshotError::MissingClubs));

        let err = Snapshot::from_json("not json").unwrap_err();
        assert!(matches!(err, SnapshotError::Parse(_)));
    }

    #[test]
    fn test_malformed_numbers_coerce_to_zero() {
        let snapshot = Snapshot::from_json(
            r#"{
                "clubs": [{
                    "team_id": "a", "team_name": "A",
                    "wage_bill": "not a number",
                    "transfers_in": [
                        {"player": "P", "fee": "1200000", "contract_years": null},
                        {"player": "Q", "fee": null, "contract_years": "3"}
                    ],
                    "transfers_out": null
                }]
            }"#,
        )
        .unwrap();

        let club = &snapshot.clubs[0];
        assert_eq!(club.wage_bill, 0.0);
        assert_eq!(club.incoming[0].fee, 1_200_000.0);
        assert_eq!(club.incoming[0].contract_years, None);
        assert_eq!(club.incoming[1].fee, 0.0);
        assert_eq!(club.incoming[1].contract_years, Some(3.0));
        assert!(club.outgoing.is_empty());
        assert!(club.amortization.is_none());
    }

    #[test]
    fn test_rates_and_summaries() {
        let snapshot = Snapshot::from_json(
            r#"{
                "base_currency": "GBP",
                "exchange_rates": {"GBP": 1.0, "eur": "1.16", "XXX": "bad"},
                "clubs": [{
                    "team_id": "a",
                    "amortization": {"current_window_annual": 10, "prior_window_annual": 5},
                    "confidence_summary": {"assumed_contracts": 2, "incoming_count": "3"}
                }]
            }"#,
        )
        .unwrap();

        assert_eq!(snapshot.exchange_rates.get("EUR"), Some(&1.16));
        assert!(!snapshot.exchange_rates.contains_key("XXX"));
        assert_eq!(snapshot.currencies(), vec!["EUR", "GBP"]);

        let club = &snapshot.clubs[0];
        let summary = club.amortization.as_ref().unwrap();
        assert_eq!(summary.current_window_annual, Some(10.0));
        assert_eq!(summary.total_annual, None);
        let confidence = club.confidence_summary.as_ref().unwrap();
        assert_eq!(confidence.assumed_contracts, Some(2));
        assert_eq!(confidence.incoming_count, 3);
    }

    #[test]
    fn test_malformed_list_entries_are_skipped() {
        let snapshot = Snapshot::from_json(
            r#"{"clubs": [{"team_id": "a"}, 42, {"team_id": "b", "transfers_in": [7, {"player": "P"}]}]}"#,
        )
        .unwrap();

        assert_eq!(snapshot.clubs.len(), 2);
        assert_eq!(snapshot.clubs[1].incoming.len(), 1);
    }

    #[test]
    fn test_malformed_asset_keeps_the_rest() {
        let snapshot = Snapshot::from_json(
            r#"{"clubs": [
                {"team_id": "a", "amortization_assets": [
                    {"player": "Old", "annual_cost": 12, "carryover": true}, 7
                ]},
                {"team_id": "b", "amortization_assets": "n/a"},
                {"team_id": "c"}
            ]}"#,
        )
        .unwrap();

        let assets = snapshot.clubs[0].amortization_assets.as_ref().unwrap();
        assert_eq!(assets.len(), 1);
        assert_eq!(assets[0].player, "Old");
        assert!(assets[0].carryover);
        assert!(snapshot.clubs[1].amortization_assets.is_none());
        assert!(snapshot.clubs[2].amortization_assets.is_none());

        let rows = crate::amortization::asset_rows(&snapshot.clubs[0], 1.0);
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].annual_cost, 12.0);
    }

    #[test]
    fn test_leagues_and_seasons_distinct_in_order() {
        let snapshot = Snapshot::from_json(
            r#"{"clubs": [
                {"team_id": "a", "league": "Premier League", "season": "2025/26"},
                {"team_id": "b", "league": "La Liga", "season": "2025/26"},
                {"team_id": "c", "league": "Premier League", "season": "2024/25"}
            ]}"#,
        )
        .unwrap();

        assert_eq!(snapshot.leagues(), vec!["Premier League", "La Liga"]);
        assert_eq!(snapshot.seasons(), vec!["2025/26", "2024/25"]);
        assert_eq!(snapshot.base_currency(), "GBP");
        assert!(snapshot.club("c").is_some());
        assert!(snapshot.club("z").is_none());
    }
}
