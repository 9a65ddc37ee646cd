//! Report generation (CSV outputs and console summary)

use anyhow::Result;
use chrono::Utc;
use csv::Writer;
use spend_engine::amortization::{AmortizationSource, asset_rows};
use spend_engine::currency::format_money;
use spend_engine::insights::{Finding, QualityEntry, Totals};
use spend_engine::{DerivedClub, Snapshot, TransferDirection, TransferRow, ViewConfig};
use std::path::{Path, PathBuf};
use tabled::settings::Style;
use tabled::{Table, Tabled};

use crate::constants;

/// Bundled report data to reduce function argument counts
pub struct ReportData<'a> {
    pub snapshot: &'a Snapshot,
    pub view: &'a ViewConfig,
    pub clubs: &'a [DerivedClub<'a>],
    pub incoming: &'a [TransferRow],
    pub outgoing: &'a [TransferRow],
    pub totals: &'a Totals,
    pub findings: &'a [Finding],
    pub quality: &'a [QualityEntry],
}

impl ReportData<'_> {
    fn money(&self, amount: f64) -> String {
        format_money(amount, &self.view.currency)
    }
}

// =============================================================================
// CSV Reports
// =============================================================================

/// Generate all CSV reports, returning the written paths
pub fn generate_all_reports(output_dir: &Path, data: &ReportData) -> Result<Vec<PathBuf>> {
    Ok(vec![
        generate_club_report(output_dir, data)?,
        generate_transfer_report(output_dir, data.incoming, TransferDirection::Incoming)?,
        generate_transfer_report(output_dir, data.outgoing, TransferDirection::Outgoing)?,
        generate_quality_report(output_dir, data.quality)?,
    ])
}

/// Generate clubs.csv
fn generate_club_report(output_dir: &Path, data: &ReportData) -> Result<PathBuf> {
    let path = output_dir.join(constants::CLUBS_FILENAME);
    let mut wtr = Writer::from_path(&path)?;

    wtr.write_record([
        "Club_ID",
        "Club",
        "League",
        "Season",
        "Currency",
        "View",
        "Wage_Bill",
        "Gross_In",
        "Amortized_Current",
        "Amortized_Carryover",
        "Amortized_Total",
        "Amortization_Source",
        "Transfer_In",
        "Transfer_Out",
        "Net_Transfer",
        "Total_Spend",
        "Incoming",
        "Outgoing",
        "Reported",
        "Assumed",
        "Contract_Coverage",
        "Wage_Share",
    ])?;

    for club in data.clubs {
        wtr.write_record([
            club.id(),
            club.name(),
            &club.record.league,
            &club.record.season,
            &data.view.currency,
            club.view_mode.label(),
            &format!("{:.2}", club.wage_bill),
            &format!("{:.2}", club.gross_in),
            &format!("{:.2}", club.amortized_current),
            &format!("{:.2}", club.amortized_carryover),
            &format!("{:.2}", club.amortized_in),
            source_label(club.amortization_source),
            &format!("{:.2}", club.transfer_in),
            &format!("{:.2}", club.transfer_out),
            &format!("{:.2}", normalize_zero(club.net_transfer)),
            &format!("{:.2}", club.total_spend),
            &club.incoming_count.to_string(),
            &club.outgoing_count.to_string(),
            &club.reported_count.to_string(),
            &club.assumed_deals.to_string(),
            &format!("{:.4}", club.contract_coverage),
            &format!("{:.4}", club.wage_share),
        ])?;
    }

    wtr.flush()?;
    Ok(path)
}

/// Generate transfers_in.csv or transfers_out.csv
fn generate_transfer_report(
    output_dir: &Path,
    rows: &[TransferRow],
    direction: TransferDirection,
) -> Result<PathBuf> {
    let filename = match direction {
        TransferDirection::Incoming => constants::TRANSFERS_IN_FILENAME,
        TransferDirection::Outgoing => constants::TRANSFERS_OUT_FILENAME,
    };
    let path = output_dir.join(filename);
    let mut wtr = Writer::from_path(&path)?;

    wtr.write_record([
        "Club_ID",
        "Club",
        "Player",
        "Fee",
        "Contract_Years",
        "Annual_Cost",
        "Confidence",
        "Window",
        "Loan",
        "Age",
        "Position",
        "Notes",
    ])?;

    for row in rows {
        wtr.write_record([
            row.club_id.as_str(),
            &row.club_name,
            &row.player,
            &format!("{:.2}", row.fee),
            &row.contract_years.map(|y| format!("{:.1}", y)).unwrap_or_default(),
            &row.annual_cost.map(|c| format!("{:.2}", c)).unwrap_or_default(),
            row.confidence.as_deref().unwrap_or(""),
            &row.window,
            if row.is_loan { "yes" } else { "no" },
            &row.age.map(|a| a.to_string()).unwrap_or_default(),
            row.position.as_deref().unwrap_or(""),
            row.contract_note.as_deref().unwrap_or(""),
        ])?;
    }

    wtr.flush()?;
    Ok(path)
}

/// Generate quality.csv
fn generate_quality_report(output_dir: &Path, quality: &[QualityEntry]) -> Result<PathBuf> {
    let path = output_dir.join(constants::QUALITY_FILENAME);
    let mut wtr = Writer::from_path(&path)?;

    wtr.write_record([
        "Rank",
        "Club_ID",
        "Club",
        "Pressure",
        "Assumption_Rate",
        "Assumed",
        "Incoming",
        "Contract_Coverage",
    ])?;

    for (i, entry) in quality.iter().enumerate() {
        wtr.write_record([
            &(i + 1).to_string(),
            &entry.club_id,
            &entry.club_name,
            &format!("{:.4}", entry.pressure),
            &format!("{:.4}", entry.assumption_rate),
            &entry.assumed.to_string(),
            &entry.incoming.to_string(),
            &format!("{:.4}", entry.coverage),
        ])?;
    }

    wtr.flush()?;
    Ok(path)
}

// =============================================================================
// Console Tables
// =============================================================================

#[derive(Tabled)]
struct ClubLine {
    #[tabled(rename = "Club")]
    name: String,
    #[tabled(rename = "Wages")]
    wages: String,
    #[tabled(rename = "In")]
    transfer_in: String,
    #[tabled(rename = "Out")]
    transfer_out: String,
    #[tabled(rename = "Net")]
    net: String,
    #[tabled(rename = "Total")]
    total: String,
    #[tabled(rename = "Coverage")]
    coverage: String,
    #[tabled(rename = "Assumed")]
    assumed: String,
    #[tabled(rename = "Wage share")]
    wage_share: String,
}

#[derive(Tabled)]
struct TransferLine {
    #[tabled(rename = "Player")]
    player: String,
    #[tabled(rename = "Club")]
    club: String,
    #[tabled(rename = "Fee")]
    fee: String,
    #[tabled(rename = "Years")]
    years: String,
    #[tabled(rename = "Per year")]
    annual: String,
    #[tabled(rename = "Confidence")]
    confidence: String,
    #[tabled(rename = "Window")]
    window: String,
}

#[derive(Tabled)]
struct QualityLine {
    #[tabled(rename = "#")]
    rank: usize,
    #[tabled(rename = "Club")]
    name: String,
    #[tabled(rename = "Pressure")]
    pressure: String,
    #[tabled(rename = "Assumed")]
    assumed: String,
    #[tabled(rename = "Coverage")]
    coverage: String,
}

#[derive(Tabled)]
struct AssetLine {
    #[tabled(rename = "Player")]
    player: String,
    #[tabled(rename = "Per year")]
    annual: String,
    #[tabled(rename = "Fee")]
    fee: String,
    #[tabled(rename = "Years")]
    years: String,
    #[tabled(rename = "Signed")]
    signed: String,
    #[tabled(rename = "Left")]
    remaining: String,
}

/// Print the club comparison table
pub fn print_club_table(data: &ReportData) {
    if data.clubs.is_empty() {
        println!("No clubs match the current filters.\n");
        return;
    }

    let lines: Vec<ClubLine> = data
        .clubs
        .iter()
        .map(|c| ClubLine {
            name: truncate(c.name(), constants::MAX_NAME_WIDTH),
            wages: data.money(c.wage_bill),
            transfer_in: data.money(c.transfer_in),
            transfer_out: data.money(c.transfer_out),
            net: data.money(normalize_zero(c.net_transfer)),
            total: data.money(c.total_spend),
            coverage: percent(c.contract_coverage),
            assumed: format!("{}/{}", c.assumed_deals, c.incoming_count),
            wage_share: percent(c.wage_share),
        })
        .collect();

    println!("{}\n", Table::new(lines).with(Style::rounded()));
}

/// Print a transfer view, truncated to `limit` rows
pub fn print_transfers(
    rows: &[TransferRow],
    direction: TransferDirection,
    currency: &str,
    limit: usize,
) {
    let title = match direction {
        TransferDirection::Incoming => "INCOMING TRANSFERS",
        TransferDirection::Outgoing => "OUTGOING TRANSFERS",
    };
    print_banner(title);

    if rows.is_empty() {
        println!("No transfers in the current selection.\n");
        return;
    }

    let lines: Vec<TransferLine> = rows
        .iter()
        .take(limit)
        .map(|r| TransferLine {
            player: truncate(&r.player, constants::MAX_NAME_WIDTH),
            club: truncate(&r.club_name, constants::MAX_NAME_WIDTH),
            fee: if r.is_loan {
                format!("{} (loan)", format_money(r.fee, currency))
            } else {
                format_money(r.fee, currency)
            },
            years: r.contract_years.map(|y| format!("{:.1}", y)).unwrap_or_default(),
            annual: r
                .annual_cost
                .map(|c| format_money(c, currency))
                .unwrap_or_default(),
            confidence: r.confidence.clone().unwrap_or_default(),
            window: r.window.clone(),
        })
        .collect();

    println!("{}", Table::new(lines).with(Style::rounded()));
    if rows.len() > limit {
        println!("  ... and {} more", rows.len() - limit);
    }
    println!();
}

// =============================================================================
// Console Summary
// =============================================================================

/// Print totals, findings and the data-quality ranking
pub fn print_summary(data: &ReportData) {
    let t = data.totals;

    print_banner("SPEND SUMMARY");
    println!(
        "View: {} | Currency: {} | League: {} | Season: {}",
        data.view.view_mode, data.view.currency, data.view.league, data.view.season
    );
    println!(
        "Generated: {}\n",
        Utc::now().format("%Y-%m-%d %H:%M UTC")
    );

    println!("SPEND ({} clubs)", t.club_count);
    println!("  Wage bills:          {:>14}", data.money(t.wage_bill));
    println!("  Transfer in:         {:>14}", data.money(t.transfer_in));
    println!("  Transfer out:        {:>14}", data.money(t.transfer_out));
    println!(
        "  Net transfer:        {:>14}",
        data.money(normalize_zero(t.net_transfer))
    );
    println!("  ------------------------------------");
    println!("  TOTAL SPEND:         {:>14}", data.money(t.total_spend));

    println!("\nCONTRACT DATA");
    println!("  Incoming deals:      {:>14}", t.incoming);
    println!("  Reported lengths:    {:>14}", t.reported);
    println!("  Assumed lengths:     {:>14}", t.assumed);
    println!("  Coverage:            {:>14}", percent(t.coverage));

    if !data.findings.is_empty() {
        println!("\nFINDINGS");
        for finding in data.findings {
            let value = if finding.kind.is_money() {
                data.money(finding.value)
            } else {
                percent(finding.value)
            };
            println!(
                "  {:<28} {} ({})",
                format!("{}:", finding.kind.title()),
                finding.club_name,
                value
            );
        }
    }

    if !data.quality.is_empty() {
        println!("\nDATA QUALITY (most assumed contract lengths)");
        let lines: Vec<QualityLine> = data
            .quality
            .iter()
            .enumerate()
            .map(|(i, q)| QualityLine {
                rank: i + 1,
                name: truncate(&q.club_name, constants::MAX_NAME_WIDTH),
                pressure: format!("{:.2}", q.pressure),
                assumed: format!("{}/{}", q.assumed, q.incoming),
                coverage: percent(q.coverage),
            })
            .collect();
        println!("{}", Table::new(lines).with(Style::rounded()));
    }

    println!("\n============================================================");
}

/// Print one club's drill-down
pub fn print_club_detail(club: &DerivedClub, view: &ViewConfig) {
    let money = |amount: f64| format_money(amount, &view.currency);
    let record = club.record;

    print_banner(&format!("{} ({})", record.name, record.season));
    println!("League: {}", record.league);
    if let Some(source) = &record.wage_source {
        println!("Wage source: {}", source);
    }
    println!("View: {} | Currency: {}\n", club.view_mode, view.currency);

    println!("SPEND");
    println!("  Wage bill:           {:>14}", money(club.wage_bill));
    println!("  Transfer in:         {:>14}", money(club.transfer_in));
    println!("  Transfer out:        {:>14}", money(club.transfer_out));
    println!(
        "  Net transfer:        {:>14}",
        money(normalize_zero(club.net_transfer))
    );
    println!("  TOTAL SPEND:         {:>14}", money(club.total_spend));

    println!("\nAMORTIZATION ({})", source_label(club.amortization_source));
    println!("  This window:         {:>14}", money(club.amortized_current));
    println!("  Prior windows:       {:>14}", money(club.amortized_carryover));
    println!("  Annual total:        {:>14}", money(club.amortized_in));
    println!("  Gross fees paid:     {:>14}", money(club.gross_in));
    println!("  Wage share:          {:>14}", percent(club.wage_share));

    println!("\nCONTRACTS");
    println!(
        "  {} incoming, {} reported, {} assumed ({} coverage)",
        club.incoming_count,
        club.reported_count,
        club.assumed_deals,
        percent(club.contract_coverage)
    );

    let assets = asset_rows(record, club.multiplier);
    if !assets.is_empty() {
        println!("\nANNUAL COST BY PLAYER");
        let lines: Vec<AssetLine> = assets
            .iter()
            .map(|a| AssetLine {
                player: if a.carryover {
                    format!("{} *", truncate(&a.player, constants::MAX_NAME_WIDTH))
                } else {
                    truncate(&a.player, constants::MAX_NAME_WIDTH)
                },
                annual: money(a.annual_cost),
                fee: a.fee.map(money).unwrap_or_default(),
                years: a.contract_years.map(|y| format!("{:.1}", y)).unwrap_or_default(),
                signed: a.start_season.clone().unwrap_or_default(),
                remaining: a
                    .remaining_years
                    .map(|y| format!("{:.1}", y))
                    .unwrap_or_default(),
            })
            .collect();
        println!("{}", Table::new(lines).with(Style::rounded()));
        if assets.iter().any(|a| a.carryover) {
            println!("  * signed in a prior window");
        }
    }

    println!();
}

/// Print methodology, notes and sources
pub fn print_methodology(snapshot: &Snapshot) {
    let methodology = &snapshot.methodology;

    print_banner("METHODOLOGY");
    if !methodology.summary.is_empty() {
        println!("{}\n", methodology.summary);
    }
    if !methodology.contract_length_fallback.is_empty() {
        println!("Contract length fallback: {}", methodology.contract_length_fallback);
    }
    if let Some(pct) = methodology.contract_coverage_reported_percent {
        println!("Reported contract coverage: {:.1}%", pct);
    }

    if !methodology.notes.is_empty() {
        println!("\nNotes:");
        for note in &methodology.notes {
            println!("  - {}", note);
        }
    }

    if !snapshot.sources.is_empty() {
        println!("\nSources:");
        for source in &snapshot.sources {
            println!("  - {} [{}] {}", source.name, source.kind, source.url);
        }
    }

    println!("\nExchange rates (per 1 {}):", snapshot.base_currency());
    for (code, rate) in &snapshot.exchange_rates {
        println!("  {:<4} {:.4}", code, rate);
    }

    if !snapshot.last_updated.is_empty() {
        println!("\nLast updated: {}", snapshot.last_updated);
    }
    if !snapshot.generated_at_utc.is_empty() {
        println!("Generated:    {}", snapshot.generated_at_utc);
    }
    println!();
}

// =============================================================================
// Helpers
// =============================================================================

pub fn print_banner(title: &str) {
    println!("\n============================================================");
    println!("  {}", title);
    println!("============================================================\n");
}

fn source_label(source: AmortizationSource) -> &'static str {
    match source {
        AmortizationSource::Authoritative => "reported",
        AmortizationSource::Fallback => "estimated",
    }
}

fn percent(ratio: f64) -> String {
    format!("{:.0}%", ratio * 100.0)
}

/// Normalize -0.0 to 0.0 for cleaner display
fn normalize_zero(val: f64) -> f64 {
    if val == 0.0 { 0.0 } else { val }
}

/// Truncate a name for display, on a char boundary
fn truncate(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max_len.saturating_sub(3)).collect();
        format!("{}...", kept)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use spend_engine::insights::{findings, quality_ranking, totals};
    use spend_engine::{ClubSelection, derive_view, scope_ids, transfer_rows};

    fn snapshot() -> Snapshot {
        Snapshot::from_json(
            r#"{"exchange_rates": {"GBP": 1.0},
                "clubs": [
                  {"team_id": "ars", "team_name": "Arsenal", "league": "Premier League",
                   "season": "2025/26", "wage_bill": 200,
                   "transfers_in": [{"player": "Signing, Jr.", "fee": 100, "contract_years": 4,
                                     "contract_confidence": "reported"}],
                   "transfers_out": [{"player": "Sold", "fee": 30}]}
                ]}"#,
        )
        .unwrap()
    }

    #[test]
    fn test_truncate() {
        assert_eq!(truncate("Arsenal", 10), "Arsenal");
        assert_eq!(truncate("Wolverhampton Wanderers", 10), "Wolverh...");
        assert_eq!(truncate("Atlético de Madrid", 8), "Atlét...");
    }

    #[test]
    fn test_normalize_zero() {
        assert_eq!(normalize_zero(-0.0).to_string(), "0");
        assert_eq!(normalize_zero(-5.0), -5.0);
    }

    #[test]
    fn test_generate_all_reports() {
        let snapshot = snapshot();
        let view = ViewConfig::for_snapshot(&snapshot);
        let mut selection = ClubSelection::new();
        selection.reconcile(scope_ids(&snapshot.clubs, &view), false);

        let clubs = derive_view(&snapshot, &view, &selection);
        let incoming = transfer_rows(&clubs, TransferDirection::Incoming, &view);
        let outgoing = transfer_rows(&clubs, TransferDirection::Outgoing, &view);
        let totals = totals(&clubs);
        let findings = findings(&clubs);
        let quality = quality_ranking(&clubs, 5);

        let data = ReportData {
            snapshot: &snapshot,
            view: &view,
            clubs: &clubs,
            incoming: &incoming,
            outgoing: &outgoing,
            totals: &totals,
            findings: &findings,
            quality: &quality,
        };

        let dir = std::env::temp_dir().join(format!("club-spend-reports-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();

        let paths = generate_all_reports(&dir, &data).unwrap();
        assert_eq!(paths.len(), 4);

        let clubs_csv = std::fs::read_to_string(dir.join(constants::CLUBS_FILENAME)).unwrap();
        let mut lines = clubs_csv.lines();
        assert!(lines.next().unwrap().starts_with("Club_ID,Club,League"));
        let row = lines.next().unwrap();
        assert!(row.starts_with("ars,Arsenal,Premier League,2025/26,GBP,pnl_proxy,200.00"));
        assert!(row.contains(",195.00,"));

        // Player names with commas are quoted
        let incoming_csv =
            std::fs::read_to_string(dir.join(constants::TRANSFERS_IN_FILENAME)).unwrap();
        assert!(incoming_csv.contains("\"Signing, Jr.\""));
        assert!(incoming_csv.contains("25.00,reported"));

        std::fs::remove_dir_all(&dir).unwrap();
    }
}
