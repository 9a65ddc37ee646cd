//! Club Spend
//!
//! Compares football clubs' wage and transfer spend from a published
//! snapshot: wage bills plus amortized (or cash) transfer fees, net of sales,
//! in the currency of your choice.

mod cache;
mod config;
mod constants;
mod fetch;
mod reports;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use spend_engine::insights::{findings, quality_ranking, totals};
use spend_engine::sort::{ClubSortField, SortState, TransferSortField};
use spend_engine::{
    ClubSelection, Snapshot, TransferDirection, ViewConfig, derive_club, derive_view, scope_ids,
    transfer_rows,
};
use std::path::{Path, PathBuf};

use cache::Cache;
use config::{Config, FileConfig, Overrides, mask_source};

#[derive(Parser, Debug)]
#[command(name = "club-spend")]
#[command(about = "Compare football club wage and transfer spend")]
struct Args {
    /// Data directory for the snapshot cache
    #[arg(short, long, default_value = "./data", global = true)]
    data_dir: PathBuf,

    /// Output directory for generated CSV reports
    #[arg(short, long, default_value = "./output", global = true)]
    output_dir: PathBuf,

    #[command(subcommand)]
    command: Option<Command>,

    /// Snapshot URL or path (default: config.toml, then data/teams.json)
    #[arg(long, global = true)]
    source: Option<String>,

    /// Currency code for all amounts (default: snapshot base currency)
    #[arg(long, global = true)]
    currency: Option<String>,

    /// Spend view: cash or pnl_proxy
    #[arg(long, global = true)]
    view: Option<String>,

    /// League filter ("All" for every league)
    #[arg(long, global = true)]
    league: Option<String>,

    /// Season filter ("All" for every season)
    #[arg(long, global = true)]
    season: Option<String>,

    /// Case-insensitive club name search
    #[arg(long, global = true)]
    search: Option<String>,

    /// Comma-separated club ids to compare (default: every club in scope)
    #[arg(long, global = true, value_delimiter = ',')]
    clubs: Vec<String>,

    /// Sort field for the table being shown
    #[arg(long, global = true)]
    sort: Option<String>,

    /// Flip the sort direction
    #[arg(long, global = true)]
    flip: bool,

    /// Download attempts for remote snapshots
    #[arg(long, global = true)]
    retries: Option<u32>,

    /// Fail instead of falling back to the cached snapshot
    #[arg(long, global = true)]
    no_cache: bool,

    /// Verbose output
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Show incoming or outgoing transfers for the selected clubs
    Transfers {
        #[arg(value_enum)]
        direction: DirectionArg,

        /// Maximum rows to print
        #[arg(long)]
        limit: Option<usize>,
    },

    /// Drill into one club's spend and amortization
    Club {
        /// Club id (team_id in the snapshot)
        id: String,
    },

    /// Show methodology notes, sources and exchange rates
    Methodology,

    /// Manage the cached snapshot
    Cache {
        #[command(subcommand)]
        action: CacheCommand,
    },
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum DirectionArg {
    In,
    Out,
}

impl From<DirectionArg> for TransferDirection {
    fn from(arg: DirectionArg) -> Self {
        match arg {
            DirectionArg::In => TransferDirection::Incoming,
            DirectionArg::Out => TransferDirection::Outgoing,
        }
    }
}

#[derive(Subcommand, Debug)]
enum CacheCommand {
    /// List cached snapshots
    Show,

    /// Delete every cached snapshot
    Clear,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let default_filter = if args.verbose { "debug" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_filter))
        .init();

    std::fs::create_dir_all(&args.data_dir)?;

    let cache_path = args.data_dir.join(constants::CACHE_FILENAME);
    let cache = Cache::open(&cache_path).await?;

    if let Some(Command::Cache { action }) = &args.command {
        return handle_cache_command(action, &cache).await;
    }

    let file_config = FileConfig::load_or_default(Path::new(constants::CONFIG_FILE))?;
    let config = Config::from_file(
        &file_config,
        Overrides {
            source: args.source.clone(),
            currency: args.currency.clone(),
            view: args.view.clone(),
            league: args.league.clone(),
            season: args.season.clone(),
            retries: args.retries,
        },
    )?;

    let snapshot = load_snapshot(&cache, &config, args.no_cache).await?;

    let mut view = config.view_config(&snapshot);
    if let Some(search) = &args.search {
        view.search = search.clone();
    }

    match &args.command {
        Some(Command::Transfers { direction, limit }) => {
            let direction = TransferDirection::from(*direction);
            apply_transfer_sort(&mut view, direction, args.sort.as_deref(), args.flip)?;
            let selection = build_selection(&snapshot, &view, &args.clubs);
            run_transfers(&snapshot, &view, &selection, direction, *limit)
        }
        Some(Command::Club { id }) => run_club(&snapshot, &view, id),
        Some(Command::Methodology) => {
            reports::print_methodology(&snapshot);
            Ok(())
        }
        Some(Command::Cache { .. }) => Ok(()),
        None => {
            apply_club_sort(&mut view, args.sort.as_deref(), args.flip)?;
            let selection = build_selection(&snapshot, &view, &args.clubs);
            run_report_generation(&args.output_dir, &snapshot, &view, &selection, &config)
        }
    }
}

/// Handle cache subcommands
async fn handle_cache_command(action: &CacheCommand, cache: &Cache) -> Result<()> {
    match action {
        CacheCommand::Show => {
            let snapshots = cache.list_snapshots().await?;

            if snapshots.is_empty() {
                println!("No snapshots cached.");
                println!("\nRun 'club-spend' once to fetch and cache a snapshot");
                return Ok(());
            }

            println!(
                "{:<48} {:<12} {:<24} {:>10}",
                "Source", "Updated", "Fetched", "Size"
            );
            println!("{}", "-".repeat(97));
            for snapshot in &snapshots {
                println!(
                    "{:<48} {:<12} {:<24} {:>8.1}KB",
                    mask_source(&snapshot.source),
                    if snapshot.last_updated.is_empty() {
                        "-"
                    } else {
                        snapshot.last_updated.as_str()
                    },
                    snapshot.fetched_at,
                    snapshot.bytes as f64 / 1024.0
                );
            }
            println!("{}", "-".repeat(97));

            if let Some(last) = cache.get_metadata(constants::LAST_SOURCE_KEY).await? {
                println!("Last loaded: {}", mask_source(&last));
            }
            println!("Cache: {}", cache.stats().await?);
            Ok(())
        }

        CacheCommand::Clear => {
            let deleted = cache.clear().await?;
            println!("Deleted {} cached snapshot(s)", deleted);
            Ok(())
        }
    }
}

/// Fetch and parse the snapshot, falling back to the last good copy in the cache
async fn load_snapshot(cache: &Cache, config: &Config, no_cache: bool) -> Result<Snapshot> {
    println!("Loading snapshot from {}...", mask_source(&config.source));

    let fetched = match fetch::fetch_snapshot(&config.source, config.retries).await {
        Ok(body) => Snapshot::from_json(&body)
            .map(|snapshot| (snapshot, body))
            .context("Snapshot could not be parsed"),
        Err(e) => Err(anyhow::Error::from(e)),
    };

    match fetched {
        Ok((snapshot, body)) => {
            cache
                .store_snapshot(&config.source, &body, &snapshot.last_updated)
                .await?;
            cache
                .set_metadata(constants::LAST_SOURCE_KEY, &config.source)
                .await?;
            print_snapshot_line(&snapshot);
            Ok(snapshot)
        }
        Err(e) if no_cache => {
            Err(e).with_context(|| format!("Failed to load {}", mask_source(&config.source)))
        }
        Err(e) => {
            let Some(cached) = cache.load_snapshot(&config.source).await? else {
                return Err(e).with_context(|| {
                    format!(
                        "Failed to load {} and no cached copy exists",
                        mask_source(&config.source)
                    )
                });
            };

            eprintln!("  Warning: {:#}", e);
            eprintln!(
                "  Using cached snapshot fetched {} (data as of {})",
                cached.fetched_at,
                if cached.last_updated.is_empty() { "unknown" } else { cached.last_updated.as_str() }
            );

            let snapshot =
                Snapshot::from_json(&cached.body).context("Cached snapshot is unreadable")?;
            print_snapshot_line(&snapshot);
            Ok(snapshot)
        }
    }
}

fn print_snapshot_line(snapshot: &Snapshot) {
    let updated = if snapshot.last_updated.is_empty() {
        "unknown"
    } else {
        snapshot.last_updated.as_str()
    };
    println!(
        "  {} clubs, {} currencies, last updated {}\n",
        snapshot.clubs.len(),
        snapshot.currencies().len(),
        updated
    );
}

/// Select the requested clubs within scope, or every club in scope
fn build_selection(snapshot: &Snapshot, view: &ViewConfig, requested: &[String]) -> ClubSelection {
    let scope = scope_ids(&snapshot.clubs, view);

    if requested.is_empty() {
        let mut selection = ClubSelection::new();
        selection.reconcile(&scope, false);
        return selection;
    }

    for id in requested {
        if !scope.contains(&id.as_str()) {
            log::warn!("Club '{}' is not in the current league/season scope", id);
        }
    }

    let mut selection = ClubSelection::with_selected(requested.iter().map(|id| id.trim()));
    selection.reconcile(&scope, false);
    selection
}

fn apply_club_sort(view: &mut ViewConfig, sort: Option<&str>, flip: bool) -> Result<()> {
    if let Some(field) = sort {
        let field: ClubSortField = field.parse().with_context(|| {
            format!(
                "Valid club sort fields: {}",
                ClubSortField::ALL.map(|f| f.key()).join(", ")
            )
        })?;
        view.club_sort = SortState::new(field);
    }
    if flip {
        view.club_sort.flip();
    }
    Ok(())
}

fn apply_transfer_sort(
    view: &mut ViewConfig,
    direction: TransferDirection,
    sort: Option<&str>,
    flip: bool,
) -> Result<()> {
    let state = match direction {
        TransferDirection::Incoming => &mut view.incoming_sort,
        TransferDirection::Outgoing => &mut view.outgoing_sort,
    };
    if let Some(field) = sort {
        let field: TransferSortField = field.parse().with_context(|| {
            format!(
                "Valid transfer sort fields: {}",
                TransferSortField::ALL.map(|f| f.key()).join(", ")
            )
        })?;
        *state = SortState::new(field);
    }
    if flip {
        state.flip();
    }
    Ok(())
}

/// Run the main report generation workflow
fn run_report_generation(
    output_dir: &Path,
    snapshot: &Snapshot,
    view: &ViewConfig,
    selection: &ClubSelection,
    config: &Config,
) -> Result<()> {
    println!("Club Spend Comparison");
    println!("=============================================\n");

    let in_scope = scope_ids(&snapshot.clubs, view).len();
    println!(
        "Selected {} of {} clubs in scope (sorted by {} {})\n",
        selection.len(),
        in_scope,
        view.club_sort.field.key(),
        view.club_sort.direction
    );

    let clubs = derive_view(snapshot, view, selection);
    let incoming = transfer_rows(&clubs, TransferDirection::Incoming, view);
    let outgoing = transfer_rows(&clubs, TransferDirection::Outgoing, view);
    let totals = totals(&clubs);
    let findings = findings(&clubs);
    let quality = quality_ranking(&clubs, config.quality_limit);

    let data = reports::ReportData {
        snapshot,
        view,
        clubs: &clubs,
        incoming: &incoming,
        outgoing: &outgoing,
        totals: &totals,
        findings: &findings,
        quality: &quality,
    };

    reports::print_club_table(&data);

    std::fs::create_dir_all(output_dir)
        .with_context(|| format!("Failed to create {}", output_dir.display()))?;
    let written = reports::generate_all_reports(output_dir, &data)?;

    reports::print_summary(&data);

    println!("\nDone! {} reports written to: {}", written.len(), output_dir.display());
    Ok(())
}

/// Print one transfer view
fn run_transfers(
    snapshot: &Snapshot,
    view: &ViewConfig,
    selection: &ClubSelection,
    direction: TransferDirection,
    limit: Option<usize>,
) -> Result<()> {
    let clubs = derive_view(snapshot, view, selection);
    let rows = transfer_rows(&clubs, direction, view);

    reports::print_transfers(
        &rows,
        direction,
        &view.currency,
        limit.unwrap_or(constants::CONSOLE_TRANSFER_ROWS),
    );
    Ok(())
}

/// Print a single club's drill-down, regardless of filters
fn run_club(snapshot: &Snapshot, view: &ViewConfig, id: &str) -> Result<()> {
    let Some(record) = snapshot.club(id) else {
        let known: Vec<&str> = snapshot.clubs.iter().map(|c| c.id.as_str()).collect();
        anyhow::bail!("Unknown club '{}'. Known ids: {}", id, known.join(", "));
    };

    let club = derive_club(record, view.multiplier(snapshot), view.view_mode);
    reports::print_club_detail(&club, view);
    Ok(())
}
