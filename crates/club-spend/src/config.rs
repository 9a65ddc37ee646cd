//! Configuration for the club spend tool

use anyhow::{Context, Result};
use serde::Deserialize;
use spend_engine::insights::DEFAULT_QUALITY_LIMIT;
use spend_engine::{ScopeFilter, Snapshot, ViewConfig, ViewMode};
use std::path::Path;

use crate::constants;

// =============================================================================
// File-based Configuration (config.toml)
// =============================================================================

/// Configuration loaded from config.toml. Every section is optional.
#[derive(Debug, Default, Deserialize)]
pub struct FileConfig {
    #[serde(default)]
    pub source: SourceConfig,
    #[serde(default)]
    pub defaults: DefaultsConfig,
    #[serde(default)]
    pub fetch: FetchConfig,
}

/// Where the snapshot comes from
#[derive(Debug, Default, Deserialize)]
pub struct SourceConfig {
    /// URL or local path of the snapshot JSON
    pub url: Option<String>,
}

/// Initial view settings, overridden by CLI flags
#[derive(Debug, Default, Deserialize)]
pub struct DefaultsConfig {
    pub currency: Option<String>,
    /// `cash` or `pnl_proxy`
    pub view: Option<String>,
    pub league: Option<String>,
    pub season: Option<String>,
    /// Clubs kept in the data-quality ranking
    pub quality_limit: Option<usize>,
}

#[derive(Debug, Default, Deserialize)]
pub struct FetchConfig {
    pub retries: Option<u32>,
}

impl FileConfig {
    /// Load configuration from a TOML file
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        toml::from_str(&content).with_context(|| {
            "Failed to parse config.toml. Check for:\n\
             - Invalid TOML syntax (missing quotes, brackets, etc.)\n\
             - Incorrect data types (retries must be a number)\n\n\
             See config.toml.example for the expected format."
        })
    }

    /// Load config.toml when present, defaults otherwise
    pub fn load_or_default(path: &Path) -> Result<Self> {
        if path.exists() {
            Self::load(path)
        } else {
            log::debug!("No {} found, using defaults", path.display());
            Ok(Self::default())
        }
    }
}

// =============================================================================
// Runtime Configuration
// =============================================================================

/// Values given on the command line; `None` defers to config.toml
#[derive(Debug, Default)]
pub struct Overrides {
    pub source: Option<String>,
    pub currency: Option<String>,
    pub view: Option<String>,
    pub league: Option<String>,
    pub season: Option<String>,
    pub retries: Option<u32>,
}

/// Settings resolved from config.toml and CLI flags, before a snapshot is loaded
#[derive(Debug)]
pub struct Config {
    /// URL or path of the snapshot
    pub source: String,
    /// Download attempts
    pub retries: u32,
    pub currency: Option<String>,
    pub view_mode: ViewMode,
    pub league: Option<String>,
    pub season: Option<String>,
    pub quality_limit: usize,
}

impl Config {
    /// Merge file settings with CLI overrides (CLI wins)
    pub fn from_file(file_config: &FileConfig, overrides: Overrides) -> Result<Self> {
        let defaults = &file_config.defaults;

        let view_mode = match overrides.view.as_deref().or(defaults.view.as_deref()) {
            Some(view) => view
                .parse::<ViewMode>()
                .with_context(|| format!("Invalid view '{}'", view))?,
            None => ViewMode::default(),
        };

        let retries = overrides
            .retries
            .or(file_config.fetch.retries)
            .unwrap_or(constants::DEFAULT_FETCH_RETRIES);
        if retries == 0 {
            anyhow::bail!("retries must be at least 1");
        }

        Ok(Self {
            source: overrides
                .source
                .or_else(|| file_config.source.url.clone())
                .unwrap_or_else(|| constants::DEFAULT_SOURCE.to_string()),
            retries,
            currency: overrides.currency.or_else(|| defaults.currency.clone()),
            view_mode,
            league: overrides.league.or_else(|| defaults.league.clone()),
            season: overrides.season.or_else(|| defaults.season.clone()),
            quality_limit: defaults.quality_limit.unwrap_or(DEFAULT_QUALITY_LIMIT),
        })
    }

    /// Build the view for a loaded snapshot. Unset values fall back to the
    /// snapshot's base currency and default scope.
    pub fn view_config(&self, snapshot: &Snapshot) -> ViewConfig {
        let mut view = ViewConfig::for_snapshot(snapshot);
        view.view_mode = self.view_mode;

        if let Some(currency) = &self.currency {
            view.currency = currency.trim().to_ascii_uppercase();
            if !snapshot
                .currencies()
                .iter()
                .any(|c| c.eq_ignore_ascii_case(&view.currency))
            {
                log::warn!(
                    "No exchange rate for {}, amounts stay in {}",
                    view.currency,
                    snapshot.base_currency()
                );
            }
        }
        if let Some(league) = &self.league {
            view.league = ScopeFilter::parse(league);
        }
        if let Some(season) = &self.season {
            view.season = ScopeFilter::parse(season);
        }

        view
    }
}

/// Hide credentials and query strings (tokens, signed URLs) when printing a source
pub fn mask_source(source: &str) -> String {
    if !crate::fetch::is_remote(source) {
        return source.to_string();
    }
    let Ok(mut url) = reqwest::Url::parse(source) else {
        return "****".to_string();
    };
    if !url.username().is_empty() || url.password().is_some() {
        let _ = url.set_password(None);
        let _ = url.set_username("****");
    }
    if url.query().is_some() {
        url.set_query(Some("****"));
    }
    url.to_string()
}
