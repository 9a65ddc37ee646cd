//! Club spend derivation engine
//!
//! Turns a raw snapshot of club wage bills and transfer line items into
//! currency-converted, view-mode-dependent spend metrics, then filters, sorts
//! and aggregates them. Everything here is pure: callers pass a snapshot and a
//! [`ViewConfig`] and get fresh derived values back on every call.

pub mod amortization;
pub mod currency;
pub mod error;
pub mod insights;
pub mod metrics;
pub mod pipeline;
pub mod selection;
pub mod snapshot;
pub mod sort;
pub mod view;

pub use error::{ConfigError, SnapshotError, SnapshotResult};
pub use insights::{Finding, FindingKind, QualityEntry, Totals, findings, quality_ranking, totals};
pub use metrics::{DerivedClub, ViewMode, derive_club};
pub use pipeline::{TransferDirection, TransferRow, derive_view, scope_ids, transfer_rows};
pub use selection::ClubSelection;
pub use snapshot::{ClubRecord, IncomingTransfer, OutgoingTransfer, Snapshot};
pub use sort::{SortDirection, SortState};
pub use view::{ScopeFilter, ViewConfig};
