use thiserror::Error;

#[derive(Error, Debug)]
pub enum SnapshotError {
    #[error("Snapshot is not valid JSON: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Snapshot has no clubs array")]
    MissingClubs,
}

pub type SnapshotResult<T> = Result<T, SnapshotError>;

/// A caller-supplied view setting that does not name anything known
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Unknown view mode '{0}' (expected cash or pnl_proxy)")]
    UnknownViewMode(String),

    #[error("Unknown sort field '{0}'")]
    UnknownSortField(String),
}
